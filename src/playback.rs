use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, trace};

use crate::executor::{DeviceRequest, RequestExecutor};
use crate::identity::{ExternalIds, IdentityCache, MediaIdentity};
use crate::models::{
    MusicStatusV1, MusicStatusV2, MusicTrack, VideoStatusResponse, MUSIC_V2_PLAYING, STATUS_OK,
    VIDEO_PLAYING,
};
use crate::session::DeviceSession;
use crate::ZidooError;

pub const VIDEO_STATUS_ENDPOINT: &str = "ZidooVideoPlay/getPlayStatus";

/// Which sub-player currently owns the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackSource {
    #[default]
    None,
    Video,
    Music,
}

impl PlaybackSource {
    /// Source name as shown in the host's source list.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            PlaybackSource::None => None,
            PlaybackSource::Video => Some("Video Player"),
            PlaybackSource::Music => Some("Music Player"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoExtensions {
    pub identity: Option<MediaIdentity>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub fps: Option<String>,
    pub bitrate: Option<String>,
    pub audio_format: Option<String>,
    pub video_format: Option<String>,
    pub zoom: Option<String>,
}

impl VideoExtensions {
    pub fn movie_name(&self) -> Option<&str> {
        self.identity.as_ref().and_then(|i| i.title.as_deref())
    }

    pub fn episode_name(&self) -> Option<&str> {
        self.identity.as_ref().and_then(|i| i.episode_name.as_deref())
    }

    pub fn series_name(&self) -> Option<&str> {
        self.identity.as_ref().and_then(|i| i.series_name.as_deref())
    }

    pub fn season(&self) -> Option<i64> {
        self.identity.as_ref().and_then(|i| i.season_number)
    }

    pub fn tagline(&self) -> Option<&str> {
        self.identity.as_ref().and_then(|i| i.tagline.as_deref())
    }

    pub fn release_date(&self) -> Option<NaiveDate> {
        self.identity.as_ref().and_then(|i| i.release_date)
    }

    pub fn external_ids(&self) -> Option<&ExternalIds> {
        self.identity.as_ref().and_then(|i| i.external_ids.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MusicExtensions {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track_number: Option<i64>,
    pub date: Option<String>,
    pub bitrate: Option<String>,
    /// e.g. `flac: 2 channels 24 bits 96000 Hz`
    pub audio_format: Option<String>,
    pub music_id: Option<i64>,
    pub music_type: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Extensions {
    #[default]
    None,
    Video(VideoExtensions),
    Music(MusicExtensions),
}

/// Unified now-playing view across both sub-players. Rebuilt on every poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackRecord {
    pub source: PlaybackSource,
    pub playing: bool,
    pub uri: Option<String>,
    pub title: Option<String>,
    pub duration_ms: Option<i64>,
    pub position_ms: Option<i64>,
    pub extensions: Extensions,
}

impl PlaybackRecord {
    /// Nothing loaded in either sub-player.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.source == PlaybackSource::None
    }

    pub fn video(&self) -> Option<&VideoExtensions> {
        match &self.extensions {
            Extensions::Video(v) => Some(v),
            _ => None,
        }
    }

    pub fn music(&self) -> Option<&MusicExtensions> {
        match &self.extensions {
            Extensions::Music(m) => Some(m),
            _ => None,
        }
    }

    /// Best display title: catalog name over the raw file title.
    pub fn media_title(&self) -> Option<&str> {
        if let Some(video) = self.video() {
            if let Some(name) = video.episode_name().or_else(|| video.movie_name()) {
                return Some(name);
            }
        }
        self.title.as_deref()
    }
}

/// Track indices last reported by the video player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackState {
    pub subtitle: Option<i64>,
    pub audio: Option<i64>,
    pub zoom: Option<i64>,
    pub play_mode: Option<i64>,
}

impl TrackState {
    fn absorb(&mut self, response: &VideoStatusResponse) {
        if let Some(index) = response.subtitle.as_ref().and_then(|t| t.index) {
            self.subtitle = Some(index);
        }
        if let Some(index) = response.audio.as_ref().and_then(|t| t.index) {
            self.audio = Some(index);
        }
        if let Some(index) = response.zoom.as_ref().and_then(|z| z.index) {
            self.zoom = Some(index);
        }
        if let Some(index) = response.play_mode.as_ref().and_then(|t| t.index) {
            self.play_mode = Some(index);
        }
    }
}

/// Music status layout, fixed per device at connect time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MusicSchema {
    #[default]
    V1,
    V2,
}

/// Decoded music sub-player status, schema independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicSnapshot {
    pub playing: bool,
    pub duration_ms: Option<i64>,
    pub position_ms: Option<i64>,
    pub track: MusicTrackInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MusicTrackInfo {
    pub id: Option<i64>,
    pub music_type: Option<i64>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub number: Option<i64>,
    pub date: Option<String>,
    pub uri: Option<String>,
    pub bitrate: Option<String>,
    pub audio_format: Option<String>,
}

impl From<&MusicTrack> for MusicTrackInfo {
    fn from(track: &MusicTrack) -> Self {
        Self {
            id: track.id,
            music_type: track.music_type,
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            number: track.number,
            date: track.date.clone(),
            uri: track.uri.clone(),
            bitrate: track.bitrate.clone(),
            audio_format: track.channel_description(),
        }
    }
}

impl MusicSnapshot {
    /// Something is queued even if not playing.
    pub fn is_loaded(&self) -> bool {
        self.track.uri.as_deref().is_some_and(|u| !u.is_empty())
            || self.track.title.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl MusicSchema {
    pub fn endpoint(&self) -> &'static str {
        match self {
            MusicSchema::V1 => "ZidooMusicControl/getPlayStatus",
            MusicSchema::V2 => "ZidooMusicControl/v2/getState",
        }
    }

    /// Decodes a music status body. `Ok(None)` means the sub-player has
    /// nothing loaded or answered with a non-success status.
    pub fn decode(&self, value: Value) -> Result<Option<MusicSnapshot>, ZidooError> {
        match self {
            MusicSchema::V1 => {
                let status: MusicStatusV1 = serde_json::from_value(value)
                    .map_err(|e| ZidooError::MalformedResponse(e.to_string()))?;
                if status.status != STATUS_OK {
                    return Ok(None);
                }
                let Some(track) = status.music.as_ref() else {
                    return Ok(None);
                };
                let state = status.state.unwrap_or_default();
                // Newer firmware reports the flag inside `state`
                let playing = state.playing.or(status.is_play).unwrap_or(false);
                Ok(Some(MusicSnapshot {
                    playing,
                    duration_ms: state.duration.or(track.duration),
                    position_ms: state.position,
                    track: MusicTrackInfo::from(track),
                }))
            }
            MusicSchema::V2 => {
                let status: MusicStatusV2 = serde_json::from_value(value)
                    .map_err(|e| ZidooError::MalformedResponse(e.to_string()))?;
                if status.status != STATUS_OK {
                    return Ok(None);
                }
                let Some(track) = status.playing_music.as_ref() else {
                    return Ok(None);
                };
                let playing =
                    status.state == Some(MUSIC_V2_PLAYING) || status.is_play == Some(true);
                Ok(Some(MusicSnapshot {
                    playing,
                    duration_ms: status.duration.or(track.duration),
                    position_ms: status.position,
                    track: MusicTrackInfo::from(track),
                }))
            }
        }
    }
}

struct VideoSnapshot {
    playing: bool,
    uri: Option<String>,
    title: Option<String>,
    duration_ms: Option<i64>,
    position_ms: Option<i64>,
    extensions: VideoExtensions,
}

impl VideoSnapshot {
    fn is_loaded(&self) -> bool {
        self.uri.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// Reconciles the two sub-player feeds into one [`PlaybackRecord`].
#[derive(Debug, Default)]
pub struct PlaybackResolver {
    identity: IdentityCache,
    tracks: TrackState,
    current_source: PlaybackSource,
    schema: MusicSchema,
    last_video_path: Option<String>,
    current_video_id: i64,
    current_music: Option<(i64, i64)>,
}

impl PlaybackResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_source(&self) -> PlaybackSource {
        self.current_source
    }

    pub fn tracks(&self) -> TrackState {
        self.tracks
    }

    pub(crate) fn tracks_mut(&mut self) -> &mut TrackState {
        &mut self.tracks
    }

    pub fn schema(&self) -> MusicSchema {
        self.schema
    }

    pub fn set_schema(&mut self, schema: MusicSchema) {
        self.schema = schema;
    }

    pub fn identity_cache(&self) -> &IdentityCache {
        &self.identity
    }

    /// Path of the last video seen playing.
    pub fn last_video_path(&self) -> Option<&str> {
        self.last_video_path.as_deref()
    }

    /// Catalog id of the video on screen, 0 when unknown.
    pub fn current_video_id(&self) -> i64 {
        self.current_video_id
    }

    /// `(id, type)` of the track in the music player.
    pub fn current_music(&self) -> Option<(i64, i64)> {
        self.current_music
    }

    /// Polls both sub-players and returns the record to show.
    ///
    /// Precedence: playing video, playing music, paused music, paused video,
    /// nothing. The music player is not asked while video plays. Errors are
    /// returned only when the session was lost during the poll.
    pub async fn resolve(
        &mut self,
        executor: &RequestExecutor,
        session: &mut DeviceSession,
    ) -> Result<PlaybackRecord, ZidooError> {
        let result = self.resolve_inner(executor, session).await;
        match &result {
            Ok(record) => self.current_source = record.source,
            Err(_) => self.current_source = PlaybackSource::None,
        }
        result
    }

    async fn resolve_inner(
        &mut self,
        executor: &RequestExecutor,
        session: &mut DeviceSession,
    ) -> Result<PlaybackRecord, ZidooError> {
        let video = self.probe_video(executor, session).await?;

        if let Some(video) = video.as_ref().filter(|v| v.playing) {
            if let Some(path) = video.uri.as_deref() {
                self.last_video_path = Some(path.to_string());
            }
            return Ok(self.video_record(executor, session, video).await);
        }

        let music = self.probe_music(executor, session).await?;
        if let Some(music) = music.filter(|m| m.playing || m.is_loaded()) {
            return Ok(self.music_record(music));
        }

        if let Some(video) = video.as_ref().filter(|v| v.is_loaded()) {
            return Ok(self.video_record(executor, session, video).await);
        }

        trace!("Neither sub-player has media loaded");
        Ok(PlaybackRecord::empty())
    }

    async fn probe_video(
        &mut self,
        executor: &RequestExecutor,
        session: &mut DeviceSession,
    ) -> Result<Option<VideoSnapshot>, ZidooError> {
        let request = DeviceRequest::new(VIDEO_STATUS_ENDPOINT)
            .status_probe()
            .quiet();
        let response: VideoStatusResponse = match executor.execute_as(session, &request).await {
            Ok(response) => response,
            Err(e) if e.indicates_session_lost() => return Err(e),
            Err(e) => {
                debug!(error = %e, "Ignoring unreadable video status");
                return Ok(None);
            }
        };
        if response.status != STATUS_OK {
            return Ok(None);
        }

        self.tracks.absorb(&response);

        let zoom = response.zoom.as_ref().and_then(|z| z.information.clone());
        Ok(response.video.map(|video| VideoSnapshot {
            playing: video.status == Some(VIDEO_PLAYING),
            uri: video.path,
            title: video.title,
            duration_ms: video.duration,
            position_ms: video.current_position,
            extensions: VideoExtensions {
                identity: None,
                width: video.width,
                height: video.height,
                fps: video.fps,
                bitrate: video.bitrate,
                audio_format: video.audio_info,
                video_format: video.output,
                zoom,
            },
        }))
    }

    async fn probe_music(
        &mut self,
        executor: &RequestExecutor,
        session: &mut DeviceSession,
    ) -> Result<Option<MusicSnapshot>, ZidooError> {
        let request = DeviceRequest::new(self.schema.endpoint())
            .status_probe()
            .quiet();
        let value = match executor.execute(session, &request).await {
            Ok(value) => value,
            Err(e) if e.indicates_session_lost() => return Err(e),
            Err(e) => {
                debug!(error = %e, "Ignoring unreadable music status");
                return Ok(None);
            }
        };
        match self.schema.decode(value) {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                debug!(error = %e, schema = ?self.schema, "Ignoring unreadable music status");
                Ok(None)
            }
        }
    }

    async fn video_record(
        &mut self,
        executor: &RequestExecutor,
        session: &mut DeviceSession,
        video: &VideoSnapshot,
    ) -> PlaybackRecord {
        let mut extensions = video.extensions.clone();

        if let Some(path) = video.uri.as_deref().filter(|p| !p.is_empty()) {
            match self.identity.resolve(executor, session, path).await {
                Ok(identity) => {
                    self.current_video_id = identity.catalog_id;
                    extensions.identity = Some(identity);
                }
                Err(e) => {
                    debug!(error = %e, path, "Catalog lookup failed");
                    if self.identity.cached_path() != Some(path) {
                        self.current_video_id = 0;
                    }
                }
            }
        }

        PlaybackRecord {
            source: PlaybackSource::Video,
            playing: video.playing,
            uri: video.uri.clone(),
            title: video.title.clone(),
            duration_ms: video.duration_ms,
            position_ms: video.position_ms,
            extensions: Extensions::Video(extensions),
        }
    }

    fn music_record(&mut self, music: MusicSnapshot) -> PlaybackRecord {
        let track = music.track;
        self.current_music = track.id.map(|id| (id, track.music_type.unwrap_or(0)));

        PlaybackRecord {
            source: PlaybackSource::Music,
            playing: music.playing,
            uri: track.uri,
            title: track.title,
            duration_ms: music.duration_ms,
            position_ms: music.position_ms,
            extensions: Extensions::Music(MusicExtensions {
                artist: track.artist,
                album: track.album,
                track_number: track.number,
                date: track.date,
                bitrate: track.bitrate,
                audio_format: track.audio_format,
                music_id: track.id,
                music_type: track.music_type,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn v1_state_flag_overrides_is_play() {
        let body = json!({
            "status": 200,
            "isPlay": true,
            "music": {"id": 5, "type": 0, "title": "Song", "uri": "/m/song.flac",
                      "extension": "flac", "channels": 2, "bits": 24, "SampleRate": 96000},
            "state": {"playing": false, "duration": 1000, "position": 10}
        });
        let snap = MusicSchema::V1.decode(body).unwrap().unwrap();
        assert!(!snap.playing);
        assert!(snap.is_loaded());
        assert_eq!(snap.duration_ms, Some(1000));
        assert_eq!(
            snap.track.audio_format.as_deref(),
            Some("flac: 2 channels 24 bits 96000 Hz")
        );
    }

    #[test]
    fn v2_state_three_is_playing() {
        let body = json!({
            "status": 200,
            "state": 3,
            "duration": 2000,
            "position": 5,
            "playingMusic": {"id": 9, "title": "Track", "uri": "/m/t.mp3"}
        });
        let snap = MusicSchema::V2.decode(body).unwrap().unwrap();
        assert!(snap.playing);
        assert_eq!(snap.track.id, Some(9));
    }

    #[test]
    fn missing_track_means_nothing_loaded() {
        assert_eq!(MusicSchema::V1.decode(json!({"status": 200})).unwrap(), None);
        assert_eq!(
            MusicSchema::V2
                .decode(json!({"status": 500, "playingMusic": {"title": "x"}}))
                .unwrap(),
            None
        );
    }

    #[test]
    fn track_indices_are_absorbed() {
        let response: VideoStatusResponse = serde_json::from_value(json!({
            "status": 200,
            "subtitle": {"index": 2},
            "audio": {"index": 1},
            "zoom": {"index": 3, "information": "Original"}
        }))
        .unwrap();
        let mut tracks = TrackState::default();
        tracks.absorb(&response);
        assert_eq!(tracks.subtitle, Some(2));
        assert_eq!(tracks.audio, Some(1));
        assert_eq!(tracks.zoom, Some(3));
        assert_eq!(tracks.play_mode, None);
    }

    #[test]
    fn source_labels() {
        assert_eq!(PlaybackSource::Video.label(), Some("Video Player"));
        assert_eq!(PlaybackSource::None.label(), None);
        assert!(PlaybackRecord::empty().is_empty());
    }
}
