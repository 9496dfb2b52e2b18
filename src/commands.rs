use std::fmt;
use std::str::FromStr;

use crate::ZidooError;

macro_rules! remote_keys {
    ($($variant:ident => $wire:literal),+ $(,)?) => {
        /// Buttons of the IR remote, as accepted by `RemoteControl/sendkey`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum RemoteKey {
            $($variant),+
        }

        impl RemoteKey {
            pub const ALL: &'static [RemoteKey] = &[$(RemoteKey::$variant),+];

            /// Wire name, e.g. `Key.MediaPlay`.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(RemoteKey::$variant => $wire),+
                }
            }
        }

        impl FromStr for RemoteKey {
            type Err = ZidooError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(RemoteKey::$variant),)+
                    other => Err(ZidooError::UnknownKey(other.to_string())),
                }
            }
        }
    };
}

remote_keys! {
    Back => "Key.Back",
    Cancel => "Key.Cancel",
    Home => "Key.Home",
    Up => "Key.Up",
    Down => "Key.Down",
    Left => "Key.Left",
    Right => "Key.Right",
    Ok => "Key.Ok",
    Select => "Key.Select",
    Star => "Key.Star",
    Pound => "Key.Pound",
    Dash => "Key.Dash",
    Menu => "Key.Menu",
    MediaPlay => "Key.MediaPlay",
    MediaStop => "Key.MediaStop",
    MediaPause => "Key.MediaPause",
    MediaNext => "Key.MediaNext",
    MediaPrevious => "Key.MediaPrev",
    Num0 => "Key.Number_0",
    Num1 => "Key.Number_1",
    Num2 => "Key.Number_2",
    Num3 => "Key.Number_3",
    Num4 => "Key.Number_4",
    Num5 => "Key.Number_5",
    Num6 => "Key.Number_6",
    Num7 => "Key.Number_7",
    Num8 => "Key.Number_8",
    Num9 => "Key.Number_9",
    UserA => "Key.UserDefine_A",
    UserB => "Key.UserDefine_B",
    UserC => "Key.UserDefine_C",
    UserD => "Key.UserDefine_D",
    Mute => "Key.Mute",
    VolumeUp => "Key.VolumeUp",
    VolumeDown => "Key.VolumeDown",
    PowerOn => "Key.PowerOn",
    MediaBackward => "Key.MediaBackward",
    MediaForward => "Key.MediaForward",
    Info => "Key.Info",
    Record => "Key.Record",
    PageUp => "Key.PageUP",
    PageDown => "Key.PageDown",
    Subtitle => "Key.Subtitle",
    Audio => "Key.Audio",
    Repeat => "Key.Repeat",
    Mouse => "Key.Mouse",
    PopupMenu => "Key.PopMenu",
    AppMovie => "Key.movie",
    AppMusic => "Key.music",
    AppPhoto => "Key.photo",
    AppFile => "Key.file",
    Light => "Key.light",
    Resolution => "Key.Resolution",
    PowerReboot => "Key.PowerOn.Reboot",
    PowerOff => "Key.PowerOn.Poweroff",
    PowerStandby => "Key.PowerOn.Standby",
    PictureInPicture => "Key.Pip",
    Screenshot => "Key.Screenshot",
    AppSwitch => "Key.APP.Switch",
}

impl fmt::Display for RemoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_every_key_once() {
        assert_eq!(RemoteKey::ALL.len(), 59);
        let mut names: Vec<&str> = RemoteKey::ALL.iter().map(RemoteKey::as_str).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), RemoteKey::ALL.len());
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!("Key.MediaPrev".parse::<RemoteKey>().unwrap(), RemoteKey::MediaPrevious);
        assert_eq!(RemoteKey::PowerStandby.to_string(), "Key.PowerOn.Standby");
        assert!(matches!(
            "Key.Nope".parse::<RemoteKey>(),
            Err(ZidooError::UnknownKey(k)) if k == "Key.Nope"
        ));
    }
}
