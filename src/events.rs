use chrono::{DateTime, Utc};

use crate::playback::{PlaybackRecord, PlaybackSource};

/// Externally visible player state derived on every poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    #[default]
    Off,
    Idle,
    Paused,
    Playing,
}

impl LifecycleState {
    /// Derives the state of a connected device from its now-playing record.
    pub fn from_record(record: &PlaybackRecord) -> Self {
        match (record.source, record.playing) {
            (PlaybackSource::None, _) => LifecycleState::Idle,
            (_, true) => LifecycleState::Playing,
            (_, false) => LifecycleState::Paused,
        }
    }

    pub fn is_off(&self) -> bool {
        matches!(self, LifecycleState::Off)
    }
}

/// Result of the cheap power probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerState::On => "on",
            PowerState::Off => "off",
        }
    }
}

/// Content category for the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Movie,
    TvShow,
    Music,
    App,
}

impl MediaType {
    pub fn from_record(record: &PlaybackRecord) -> Self {
        match record.source {
            PlaybackSource::None => MediaType::App,
            PlaybackSource::Music => MediaType::Music,
            PlaybackSource::Video => {
                let episodic = record
                    .video()
                    .and_then(|v| v.identity.as_ref())
                    .is_some_and(|i| i.kind.is_episodic());
                if episodic {
                    MediaType::TvShow
                } else {
                    MediaType::Movie
                }
            }
        }
    }
}

/// Everything the coordinator knows after a tick, published over a watch channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerSnapshot {
    pub state: LifecycleState,
    pub record: PlaybackRecord,
    pub media_type: Option<MediaType>,
    pub source: Option<String>,
    pub source_list: Vec<String>,
    pub audio_output: Option<String>,
    pub audio_output_list: Vec<String>,
    /// Set whenever a connected tick produced a record.
    pub last_updated: Option<DateTime<Utc>>,
}

// Event types for subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum ZidooEvent {
    Connected,
    Disconnected,
    StateChanged(LifecycleState),
    MediaChanged(PlaybackRecord),
}

impl ZidooEvent {
    // Get the name of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            ZidooEvent::Connected => "connected",
            ZidooEvent::Disconnected => "disconnected",
            ZidooEvent::StateChanged(_) => "stateChanged",
            ZidooEvent::MediaChanged(_) => "mediaChanged",
        }
    }

    /// If this event is a StateChanged, returns the new state
    pub fn state(&self) -> Option<LifecycleState> {
        match self {
            ZidooEvent::StateChanged(state) => Some(*state),
            _ => None,
        }
    }
}
