use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::utils::{lenient_opt_i64, lenient_opt_string, lenient_string};

pub const STATUS_OK: i64 = 200;
/// In-band "switching media" code on the now-playing endpoints.
pub const STATUS_BUSY: i64 = 804;
/// `video.status` value while the video player is playing.
pub const VIDEO_PLAYING: i64 = 1;
/// Top-level `state` value of the v2 music status while playing.
pub const MUSIC_V2_PLAYING: i64 = 3;

// Generic acknowledgement for control and library calls
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub status: Option<i64>,
}

impl Envelope {
    pub fn is_ok(&self) -> bool {
        self.status == Some(STATUS_OK)
    }
}

// Some v2 endpoints report success as `code: 0` instead of `status: 200`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodeEnvelope {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub code: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub status: Option<i64>,
}

impl CodeEnvelope {
    pub fn is_ok(&self) -> bool {
        self.code == Some(0) || self.status == Some(STATUS_OK)
    }
}

// ZidooControlCenter/getModel
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub status: i64,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub ip: Option<String>,
    #[serde(default, rename = "net_mac", deserialize_with = "lenient_opt_string")]
    pub net_mac: Option<String>,
    #[serde(default, rename = "wif_mac", deserialize_with = "lenient_opt_string")]
    pub wifi_mac: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub firmware: Option<String>,
    #[serde(default, rename = "androidversion", deserialize_with = "lenient_opt_string")]
    pub android_version: Option<String>,
    #[serde(default)]
    pub able_remote_boot: Option<bool>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl SystemInfo {
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

// ZidooVideoPlay/getPlayStatus
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatusResponse {
    pub status: i64,
    #[serde(default)]
    pub video: Option<VideoStatus>,
    #[serde(default)]
    pub subtitle: Option<TrackIndex>,
    #[serde(default)]
    pub audio: Option<TrackIndex>,
    #[serde(default)]
    pub zoom: Option<ZoomInfo>,
    #[serde(default)]
    pub play_mode: Option<TrackIndex>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatus {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub status: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub duration: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub current_position: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub width: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub height: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub fps: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub bitrate: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub audio_info: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackIndex {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub index: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoomInfo {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub index: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub information: Option<String>,
}

// Track object shared by both music status schemas
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicTrack {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub id: Option<i64>,
    #[serde(default, rename = "type", deserialize_with = "lenient_opt_i64")]
    pub music_type: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub artist: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub album: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub number: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub date: Option<String>,
    #[serde(default, alias = "path", deserialize_with = "lenient_opt_string")]
    pub uri: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub bitrate: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub extension: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub channels: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub bits: Option<i64>,
    #[serde(
        default,
        rename = "SampleRate",
        alias = "sampleRate",
        deserialize_with = "lenient_opt_i64"
    )]
    pub sample_rate: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub duration: Option<i64>,
}

impl MusicTrack {
    /// e.g. `flac: 2 channels 24 bits 96000 Hz`
    pub fn channel_description(&self) -> Option<String> {
        if self.extension.is_none() && self.channels.is_none() && self.sample_rate.is_none() {
            return None;
        }
        fn show<T: ToString>(v: &Option<T>) -> String {
            v.as_ref().map_or_else(|| "?".to_string(), ToString::to_string)
        }
        Some(format!(
            "{}: {} channels {} bits {} Hz",
            show(&self.extension),
            show(&self.channels),
            show(&self.bits),
            show(&self.sample_rate)
        ))
    }
}

// ZidooMusicControl/getPlayStatus (firmware without audio output selection)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicStatusV1 {
    pub status: i64,
    #[serde(default)]
    pub is_play: Option<bool>,
    #[serde(default)]
    pub music: Option<MusicTrack>,
    #[serde(default)]
    pub state: Option<MusicStateV1>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MusicStateV1 {
    #[serde(default)]
    pub playing: Option<bool>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub duration: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub position: Option<i64>,
}

// ZidooMusicControl/v2/getState
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicStatusV2 {
    pub status: i64,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub state: Option<i64>,
    #[serde(default)]
    pub is_play: Option<bool>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub duration: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub position: Option<i64>,
    #[serde(default)]
    pub playing_music: Option<MusicTrack>,
}

// ZidooPoster/v2/getAggregationOfFile
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AggregationOfFile {
    #[serde(default, rename = "type", deserialize_with = "lenient_opt_i64")]
    pub kind: Option<i64>,
    #[serde(default)]
    pub movie: Option<CatalogEntry>,
    #[serde(default)]
    pub episode: Option<CatalogEntry>,
    #[serde(default)]
    pub season: Option<CatalogEntry>,
    #[serde(default)]
    pub video: Option<CatalogVideo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogEntry {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub name: Option<String>,
    #[serde(default)]
    pub aggregation: Option<Aggregation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregation {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub tag_line: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub release_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub episode_number: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub season_number: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub tv_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub imdb_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub tmdb_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogVideo {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub parent_id: Option<i64>,
}

// ZidooMusicControl/v2/getOutputList
#[derive(Debug, Clone, Deserialize)]
pub struct OutputListResponse {
    pub status: i64,
    #[serde(default, alias = "data", alias = "outputs")]
    pub list: Vec<OutputOption>,
}

/// An audio output the music player can route to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputOption {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub tag: String,
}

// ZidooFileControl/v2/getSavedSmbDevices
#[derive(Debug, Clone, Deserialize)]
pub struct SavedSharesResponse {
    #[serde(default)]
    pub data: Option<SavedShares>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SavedShares {
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub list: Vec<SavedShare>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavedShare {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub url: Option<String>,
}

// ZidooVideoPlay/getSubtitleList and getAudioList (both use `subtitles`)
#[derive(Debug, Clone, Deserialize)]
pub struct TrackListResponse {
    pub status: i64,
    #[serde(default, alias = "audios")]
    pub subtitles: Vec<TrackEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackEntry {
    pub index: i64,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub title: Option<String>,
}

// ZidooControlCenter/Apps/getApps
#[derive(Debug, Clone, Deserialize)]
pub struct AppListResponse {
    pub status: i64,
    #[serde(default)]
    pub apps: Vec<AppEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppEntry {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub package_name: Option<String>,
    #[serde(default)]
    pub is_can_open: bool,
}

/// Name to code tables accepted by the library calls.
pub const VIDEO_FILTER_TYPES: &[(&str, i64)] = &[
    ("all", 0),
    ("favorite", 1),
    ("watching", 2),
    ("movie", 3),
    ("tvshow", 4),
    ("sd", 5),
    ("bluray", 6),
    ("4k", 7),
    ("3d", 8),
    ("children", 9),
    ("recent", 10),
    ("unwatched", 11),
    ("other", 12),
];

pub const VIDEO_SEARCH_TYPES: &[(&str, i64)] =
    &[("video", 0), ("movie", 1), ("tvshow", 2), ("collection", 3)];

pub const MUSIC_SEARCH_TYPES: &[(&str, i64)] =
    &[("music", 0), ("album", 1), ("artist", 2), ("playlist", 3)];

// Major MIME type to the `type` of a upnp open request
pub const STREAM_MIME_TYPES: &[(&str, i64)] = &[
    ("image", 3),
    ("video", 2),
    ("audio", 2),
    ("other", 0),
    ("default", 4),
    ("application", 4),
];

// Indexed by music type code
pub const MUSIC_IMAGE_TYPE: [i64; 5] = [0, 1, 0, 0, 1];
pub const MUSIC_IMAGE_TARGET: [i64; 5] = [16, 16, 32, 16, 32];

pub fn lookup_code(table: &[(&str, i64)], name: &str) -> Option<i64> {
    table
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, code)| *code)
}
