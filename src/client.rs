use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::commands::RemoteKey;
use crate::config::ZidooConfig;
use crate::events::PowerState;
use crate::executor::{CallClass, DeviceRequest, RequestExecutor, RetryPolicy, Timeouts};
use crate::models::{
    lookup_code, AppListResponse, CodeEnvelope, Envelope, OutputListResponse, OutputOption, SavedSharesResponse,
    SystemInfo, TrackEntry, TrackListResponse, MUSIC_IMAGE_TARGET, MUSIC_IMAGE_TYPE,
    MUSIC_SEARCH_TYPES, STATUS_OK, STREAM_MIME_TYPES, VIDEO_FILTER_TYPES, VIDEO_SEARCH_TYPES,
};
use crate::playback::{MusicSchema, PlaybackRecord, PlaybackResolver, PlaybackSource};
use crate::session::DeviceSession;
use crate::settings::SETTINGS;
use crate::transport::{HttpTransport, Transport};
use crate::utils::zidoo_parse;
use crate::wol;
use crate::ZidooError;

const SHARE_PROBE_COUNT: u32 = 100;
const DEFAULT_HOST_TYPE: i64 = 1005;
const UPNP_SERVER_NAME: &str = "zidoo-rc";

/// Music library categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicCategory {
    Music,
    Album,
    Artist,
    Playlist,
}

impl MusicCategory {
    pub fn from_name(name: &str) -> Option<Self> {
        match lookup_code(MUSIC_SEARCH_TYPES, name)? {
            0 => Some(MusicCategory::Music),
            1 => Some(MusicCategory::Album),
            2 => Some(MusicCategory::Artist),
            3 => Some(MusicCategory::Playlist),
            _ => None,
        }
    }

    // `type` of MusicControl/v2/playMusic
    fn playlist_type(&self) -> Option<i64> {
        match self {
            MusicCategory::Music => None,
            MusicCategory::Artist => Some(3),
            MusicCategory::Album => Some(4),
            MusicCategory::Playlist => Some(5),
        }
    }
}

/// Client for one Zidoo player.
///
/// Every method takes `&mut self`; share it behind a mutex so polling and
/// manual commands never interleave on the same session. Control verbs
/// report success as `bool` and library calls return `None` on failure, so
/// an unreachable device never surfaces as an error to the host.
pub struct ZidooClient {
    session: DeviceSession,
    executor: RequestExecutor,
    playback: PlaybackResolver,
    outputs: Vec<OutputOption>,
    current_output: Option<String>,
    apps: Vec<(String, String)>,
    song_list: Vec<String>,
}

impl ZidooClient {
    /// Creates a client backed by a pooled reqwest transport.
    pub fn new(config: ZidooConfig) -> Result<Self, ZidooError> {
        Ok(Self::with_transport(config, Arc::new(HttpTransport::new()?)))
    }

    /// Creates a client over a custom transport.
    pub fn with_transport(config: ZidooConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            session: DeviceSession::new(config),
            executor: RequestExecutor::new(transport, RetryPolicy::default(), Timeouts::default()),
            playback: PlaybackResolver::new(),
            outputs: Vec::new(),
            current_output: None,
            apps: Vec::new(),
            song_list: Vec::new(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.executor.set_policy(policy);
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.executor.set_timeouts(timeouts);
        self
    }

    pub fn session(&self) -> &DeviceSession {
        &self.session
    }

    pub fn playback(&self) -> &PlaybackResolver {
        &self.playback
    }

    pub fn host(&self) -> &str {
        self.session.host()
    }

    pub fn mac(&self) -> Option<&str> {
        self.session.mac()
    }

    pub fn music_schema(&self) -> MusicSchema {
        self.playback.schema()
    }

    /// The sub-player that answered the last poll.
    pub fn current_source(&self) -> PlaybackSource {
        self.playback.current_source()
    }

    /// Source label as used in the source list.
    pub fn get_source(&self) -> Option<&'static str> {
        self.current_source().label()
    }

    async fn call(&mut self, request: DeviceRequest) -> Result<Value, ZidooError> {
        self.executor.execute(&mut self.session, &request).await
    }

    async fn call_as<T: serde::de::DeserializeOwned>(
        &mut self,
        request: DeviceRequest,
    ) -> Result<T, ZidooError> {
        self.executor.execute_as(&mut self.session, &request).await
    }

    /// Issues a command and reports whether the device acknowledged it.
    async fn command(&mut self, request: DeviceRequest) -> bool {
        let endpoint = request.endpoint().to_string();
        match self.call(request).await {
            Ok(value) => {
                let ok = CodeEnvelope::deserialize(&value)
                    .map(|envelope| envelope.is_ok())
                    .unwrap_or(false);
                if !ok {
                    debug!(endpoint, response = %value, "Command not acknowledged");
                }
                ok
            }
            Err(e) => {
                debug!(endpoint, error = %e, "Command failed");
                false
            }
        }
    }

    /// Library calls: `Some` only for a 200 envelope.
    async fn fetch(&mut self, request: DeviceRequest) -> Option<Value> {
        let endpoint = request.endpoint().to_string();
        match self.call(request).await {
            Ok(value)
                if Envelope::deserialize(&value)
                    .map(|envelope| envelope.is_ok())
                    .unwrap_or(false) =>
            {
                Some(value)
            }
            Ok(value) => {
                debug!(endpoint, response = %value, "Unexpected status");
                None
            }
            Err(e) => {
                debug!(endpoint, error = %e, "Request failed");
                None
            }
        }
    }

    /// Library calls whose endpoints carry no status field.
    async fn fetch_raw(&mut self, request: DeviceRequest) -> Option<Value> {
        let endpoint = request.endpoint().to_string();
        match self.call(request).await {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(endpoint, error = %e, "Request failed");
                None
            }
        }
    }

    // ---- session ------------------------------------------------------

    /// Probes the device and runs post-connect initialization.
    ///
    /// There is no handshake endpoint: any 200 answer to the system info call
    /// carries the session cookie.
    pub async fn connect(&mut self) -> Result<SystemInfo, ZidooError> {
        let info = self.fetch_system_info(false).await?;
        self.session.adopt_mac(info.net_mac.as_deref());
        self.session.set_power_observed(true);
        info!(
            host = %self.session.host(),
            model = info.model.as_deref().unwrap_or("unknown"),
            firmware = info.firmware.as_deref().unwrap_or("unknown"),
            "Connected to player"
        );
        self.initialize().await;
        if !self.session.is_connected() {
            warn!(host = %self.session.host(), "Player went away during initialization");
            return Err(ZidooError::NotConnected);
        }
        Ok(info)
    }

    // Capability probes; older firmware lacks some of these endpoints
    async fn initialize(&mut self) {
        self.prime_network_shares().await;

        let request = DeviceRequest::new("MusicControl/v2/getPlayQueue")
            .param("start", 0)
            .param("count", SETTINGS.list_limit)
            .retries(0)
            .optional()
            .quiet();
        if let Some(queue) = self.fetch_raw(request).await {
            self.song_list = zidoo_parse::music_ids(queue.get("array"), None);
            debug!(songs = self.song_list.len(), "Loaded play queue");
        }

        self.discover_outputs().await;
    }

    // Listing a saved share forces the player to mount it
    async fn prime_network_shares(&mut self) {
        let request = DeviceRequest::new("ZidooFileControl/v2/getSavedSmbDevices")
            .retries(0)
            .optional();
        let shares = match self.call_as::<SavedSharesResponse>(request).await {
            Ok(response) => response.data.unwrap_or_default(),
            Err(e) => {
                debug!(error = %e, "Could not list saved network shares");
                return;
            }
        };
        if shares.count <= 0 {
            return;
        }
        for url in shares.list.into_iter().filter_map(|share| share.url) {
            let request = DeviceRequest::new("ZidooFileControl/v2/getFiles")
                .param("requestCount", SHARE_PROBE_COUNT)
                .param("startIndex", 0)
                .param("sort", 0)
                .param("url", &url)
                .retries(0)
                .optional();
            if let Err(e) = self.call(request).await {
                debug!(url, error = %e, "Network share did not answer");
            }
        }
    }

    async fn discover_outputs(&mut self) {
        let request = DeviceRequest::new("ZidooMusicControl/v2/getOutputList")
            .retries(0)
            .optional()
            .quiet();
        self.outputs = match self.call_as::<OutputListResponse>(request).await {
            Ok(response) if response.status == STATUS_OK => response.list,
            Ok(_) => Vec::new(),
            Err(e) => {
                debug!(error = %e, "Audio output discovery failed");
                Vec::new()
            }
        };
        let schema = if self.outputs.is_empty() {
            MusicSchema::V1
        } else {
            MusicSchema::V2
        };
        debug!(outputs = self.outputs.len(), ?schema, "Music status schema selected");
        self.playback.set_schema(schema);
    }

    /// Releases pooled connections and forgets the session token.
    pub async fn disconnect(&mut self) {
        self.executor.transport().reset();
        if self.session.clear_token() {
            info!(host = %self.session.host(), "Disconnected from player");
        }
    }

    /// True while the device answered the last request. Never pings.
    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    async fn fetch_system_info(&mut self, log_errors: bool) -> Result<SystemInfo, ZidooError> {
        let mut request = DeviceRequest::new("ZidooControlCenter/getModel").retries(0);
        if !log_errors {
            request = request.quiet();
        }
        let info: SystemInfo = self.call_as(request).await?;
        if !info.is_ok() {
            return Err(ZidooError::Rejected {
                endpoint: "ZidooControlCenter/getModel".to_string(),
                status: info.status,
            });
        }
        Ok(info)
    }

    /// Model, firmware and network details.
    pub async fn get_system_info(&mut self) -> Option<SystemInfo> {
        self.fetch_system_info(true).await.ok()
    }

    /// Cheap liveness probe used before reconnecting.
    pub async fn get_power_status(&mut self) -> PowerState {
        self.session.set_power_observed(false);
        if self.fetch_system_info(true).await.is_ok() {
            self.session.set_power_observed(true);
            PowerState::On
        } else {
            PowerState::Off
        }
    }

    /// Unified now-playing record; empty when nothing plays or the poll failed.
    pub async fn get_playing_info(&mut self) -> PlaybackRecord {
        match self.playback.resolve(&self.executor, &mut self.session).await {
            Ok(record) => record,
            Err(e) => {
                debug!(error = %e, "Now-playing poll failed");
                PlaybackRecord::empty()
            }
        }
    }

    // ---- remote keys and transport -----------------------------------

    pub async fn send_key(&mut self, key: RemoteKey) -> bool {
        let request = DeviceRequest::new("ZidooControlCenter/RemoteControl/sendkey")
            .param("key", key.as_str())
            .retries(0)
            .quiet();
        self.command(request).await
    }

    /// Sends a key by its wire name, e.g. `Key.Home`.
    pub async fn send_key_name(&mut self, name: &str) -> bool {
        match name.parse::<RemoteKey>() {
            Ok(key) => self.send_key(key).await,
            Err(e) => {
                warn!(error = %e, "Ignoring key");
                false
            }
        }
    }

    /// Sends `keys` in order, `repeats` times, pausing `delay` after each key.
    pub async fn send_command(&mut self, keys: &[RemoteKey], repeats: u32, delay: Duration) -> bool {
        let mut all_ok = true;
        for _ in 0..repeats {
            for key in keys {
                let ok = self.send_key(*key).await;
                debug!(key = %key, ok, "send_command");
                all_ok &= ok;
                sleep(delay).await;
            }
        }
        all_ok
    }

    /// Wakes the device over the LAN, then sends the power key in case WOL is disabled.
    pub async fn turn_on(&mut self) -> bool {
        if let Some(mac) = self.session.mac().map(str::to_string) {
            if let Err(e) = wol::wake(&mac).await {
                warn!(error = %e, "Wake-on-LAN failed");
            }
        }
        self.send_key(RemoteKey::PowerOn).await
    }

    pub async fn turn_off(&mut self, standby: bool) -> bool {
        let key = if standby {
            RemoteKey::PowerStandby
        } else {
            RemoteKey::PowerOff
        };
        self.send_key(key).await
    }

    pub async fn volume_up(&mut self) -> bool {
        self.send_key(RemoteKey::VolumeUp).await
    }

    pub async fn volume_down(&mut self) -> bool {
        self.send_key(RemoteKey::VolumeDown).await
    }

    pub async fn mute_volume(&mut self) -> bool {
        self.send_key(RemoteKey::Mute).await
    }

    /// Resumes the active sub-player. With nothing active, replays the last video.
    pub async fn media_play(&mut self) -> bool {
        match self.current_source() {
            PlaybackSource::None => {
                if let Some(path) = self.playback.last_video_path().map(str::to_string) {
                    return self.play_file(&path).await;
                }
                self.send_key(RemoteKey::MediaPlay).await
            }
            PlaybackSource::Music => {
                self.command(DeviceRequest::new("MusicControl/v2/playOrPause"))
                    .await
            }
            PlaybackSource::Video => self.send_key(RemoteKey::MediaPlay).await,
        }
    }

    pub async fn media_pause(&mut self) -> bool {
        match self.current_source() {
            PlaybackSource::Music => {
                self.command(DeviceRequest::new("MusicControl/v2/playOrPause"))
                    .await
            }
            _ => self.send_key(RemoteKey::MediaPause).await,
        }
    }

    pub async fn media_stop(&mut self) -> bool {
        self.send_key(RemoteKey::MediaStop).await
    }

    pub async fn media_next_track(&mut self) -> bool {
        match self.current_source() {
            PlaybackSource::Music => {
                self.command(DeviceRequest::new("MusicControl/v2/playNext"))
                    .await
            }
            _ => self.send_key(RemoteKey::MediaNext).await,
        }
    }

    pub async fn media_previous_track(&mut self) -> bool {
        match self.current_source() {
            PlaybackSource::Music => {
                self.command(DeviceRequest::new("MusicControl/v2/playLast"))
                    .await
            }
            _ => self.send_key(RemoteKey::MediaPrevious).await,
        }
    }

    /// Seeks the active sub-player to `position_ms`.
    pub async fn set_media_position(&mut self, position_ms: i64) -> bool {
        let request = match self.current_source() {
            // the device expects this spelling
            PlaybackSource::Video => {
                DeviceRequest::new("ZidooVideoPlay/seekTo").param("positon", position_ms)
            }
            PlaybackSource::Music => {
                DeviceRequest::new("ZidooMusicControl/seekTo").param("time", position_ms)
            }
            PlaybackSource::None => return false,
        };
        self.command(request).await
    }

    // ---- tracks, zoom, outputs ----------------------------------------

    async fn track_list(&mut self, endpoint: &str, log_errors: bool) -> Vec<TrackEntry> {
        let mut request = DeviceRequest::new(endpoint);
        if !log_errors {
            request = request.quiet();
        }
        match self.call_as::<TrackListResponse>(request).await {
            Ok(response) if response.status == STATUS_OK => response.subtitles,
            Ok(_) => Vec::new(),
            Err(e) => {
                debug!(endpoint, error = %e, "Track list unavailable");
                Vec::new()
            }
        }
    }

    pub async fn get_subtitle_list(&mut self) -> Vec<TrackEntry> {
        self.track_list("ZidooVideoPlay/getSubtitleList", true).await
    }

    /// Selects a subtitle track; `None` steps to the one after the current.
    pub async fn set_subtitle(&mut self, index: Option<i64>) -> bool {
        let index = match index {
            Some(index) => index,
            None => {
                let indices: Vec<i64> = self
                    .get_subtitle_list()
                    .await
                    .iter()
                    .map(|t| t.index)
                    .collect();
                zidoo_parse::next_index(&indices, self.playback.tracks().subtitle.unwrap_or(0))
            }
        };
        let request = DeviceRequest::new("ZidooVideoPlay/setSubtitle")
            .param("index", index)
            .quiet();
        let ok = self.command(request).await;
        if ok {
            self.playback.tracks_mut().subtitle = Some(index);
        }
        ok
    }

    pub async fn get_audio_list(&mut self) -> Vec<TrackEntry> {
        self.track_list("ZidooVideoPlay/getAudioList", true).await
    }

    /// Selects an audio track; `None` steps to the one after the current.
    pub async fn set_audio(&mut self, index: Option<i64>) -> bool {
        let index = match index {
            Some(index) => index,
            None => {
                let indices: Vec<i64> = self
                    .get_audio_list()
                    .await
                    .iter()
                    .map(|t| t.index)
                    .collect();
                zidoo_parse::next_index(&indices, self.playback.tracks().audio.unwrap_or(0))
            }
        };
        let request = DeviceRequest::new("ZidooVideoPlay/setAudio")
            .param("index", index)
            .quiet();
        let ok = self.command(request).await;
        if ok {
            self.playback.tracks_mut().audio = Some(index);
        }
        ok
    }

    pub async fn set_zoom(&mut self, index: i64) -> bool {
        let request = DeviceRequest::new("ZidooVideoPlay/setZoom").param("index", index);
        let ok = self.command(request).await;
        if ok {
            self.playback.tracks_mut().zoom = Some(index);
        }
        ok
    }

    /// Raw play-mode list of the video player.
    pub async fn get_play_modes(&mut self) -> Option<Value> {
        self.fetch(DeviceRequest::new("ZidooVideoPlay/getPlayModeList"))
            .await
    }

    pub async fn set_play_mode(&mut self, index: i64) -> bool {
        let request = DeviceRequest::new("ZidooVideoPlay/setPlayMode").param("index", index);
        let ok = self.command(request).await;
        if ok {
            self.playback.tracks_mut().play_mode = Some(index);
        }
        ok
    }

    /// Outputs discovered at connect.
    pub fn audio_outputs(&self) -> &[OutputOption] {
        &self.outputs
    }

    pub fn audio_output_names(&self) -> Vec<String> {
        self.outputs.iter().map(|o| o.name.clone()).collect()
    }

    /// Last output selected through this client.
    pub fn current_audio_output(&self) -> Option<&str> {
        self.current_output.as_deref()
    }

    /// Routes music to the output called `name`.
    pub async fn set_audio_output(&mut self, name: &str) -> bool {
        let Some(tag) = self
            .outputs
            .iter()
            .find(|o| o.name == name)
            .map(|o| o.tag.clone())
        else {
            warn!(error = %ZidooError::UnknownOutput(name.to_string()), "Cannot select output");
            return false;
        };
        let ok = self
            .command(DeviceRequest::new("ZidooMusicControl/v2/setOutInfo").param("tag", &tag))
            .await;
        if ok {
            self.current_output = Some(name.to_string());
        }
        ok
    }

    // ---- apps ------------------------------------------------------------

    /// Launchable apps as `(label, package)` pairs.
    pub async fn get_app_list(&mut self) -> Vec<(String, String)> {
        let request = DeviceRequest::new("ZidooControlCenter/Apps/getApps");
        match self.call_as::<AppListResponse>(request).await {
            Ok(response) if response.status == STATUS_OK => response
                .apps
                .into_iter()
                .filter(|app| app.is_can_open)
                .filter_map(|app| Some((app.label?, app.package_name?)))
                .collect(),
            Ok(_) => Vec::new(),
            Err(e) => {
                debug!(error = %e, "App list unavailable");
                Vec::new()
            }
        }
    }

    /// Launches an app by its label.
    pub async fn start_app(&mut self, name: &str) -> bool {
        if self.apps.is_empty() {
            self.apps = self.get_app_list().await;
        }
        let Some(package) = self
            .apps
            .iter()
            .find(|(label, _)| label == name)
            .map(|(_, package)| package.clone())
        else {
            return false;
        };
        let request =
            DeviceRequest::new("ZidooControlCenter/Apps/openApp").param("packageName", package);
        self.fetch(request).await.is_some()
    }

    /// Both sub-players followed by every launchable app.
    pub async fn load_source_list(&mut self) -> Vec<String> {
        if self.apps.is_empty() {
            self.apps = self.get_app_list().await;
        }
        let mut sources: Vec<String> = [PlaybackSource::Video, PlaybackSource::Music]
            .iter()
            .filter_map(PlaybackSource::label)
            .map(str::to_string)
            .collect();
        sources.extend(self.apps.iter().map(|(label, _)| label.clone()));
        sources
    }

    // ---- library pass-through ------------------------------------------

    /// Root file system devices.
    pub async fn get_device_list(&mut self) -> Option<Value> {
        let response = self
            .fetch(DeviceRequest::new("ZidooFileControl/getDevices"))
            .await?;
        response.get("devices").cloned()
    }

    pub async fn get_file_list(&mut self, path: &str, file_type: i64) -> Option<Value> {
        let request = DeviceRequest::new("ZidooFileControl/getFileList")
            .param("path", path)
            .param("type", file_type);
        self.fetch(request).await
    }

    /// Shares of every known host, each named `host/share`.
    pub async fn get_host_list(&mut self, path: &str, host_type: Option<i64>) -> Option<Value> {
        let request = DeviceRequest::new("ZidooFileControl/getHost")
            .param("path", path)
            .param("type", host_type.unwrap_or(DEFAULT_HOST_TYPE));
        let response = self.fetch(request).await?;
        let hosts = response
            .get("hosts")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut shares = Vec::new();
        for host in hosts {
            let ip = host.get("ip").and_then(Value::as_str).unwrap_or_default();
            let kind = host.get("type").and_then(Value::as_i64).unwrap_or(0);
            let host_name = host
                .get("name")
                .and_then(Value::as_str)
                .and_then(|n| n.rsplit('/').next())
                .unwrap_or_default()
                .to_string();
            let Some(listing) = self.get_file_list(ip, kind).await else {
                continue;
            };
            let files = listing
                .get("filelist")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            for mut share in files {
                if let Some(entry) = share.as_object_mut() {
                    let name = entry.get("name").and_then(Value::as_str).unwrap_or_default();
                    let full = format!("{}/{}", host_name, name);
                    entry.insert("name".to_string(), Value::String(full));
                }
                shares.push(share);
            }
        }
        Some(serde_json::json!({ "status": STATUS_OK, "filelist": shares }))
    }

    /// Movie list by filter name (see `VIDEO_FILTER_TYPES`) or numeric code.
    pub async fn get_movie_list(&mut self, filter: &str, max_count: Option<u32>) -> Option<Value> {
        let filter_type = lookup_code(VIDEO_FILTER_TYPES, filter)
            .or_else(|| filter.parse().ok())
            .unwrap_or(0);
        let request = DeviceRequest::new("ZidooPoster/getVideoList")
            .param("page", 1)
            .param("pagesize", max_count.unwrap_or(SETTINGS.list_limit))
            .param("type", filter_type);
        let mut response = self.fetch(request).await?;
        // recent and unwatched come back oldest first
        if matches!(filter_type, 10 | 11) {
            if let Some(items) = response.get_mut("data").and_then(Value::as_array_mut) {
                items.sort_by_key(|item| std::cmp::Reverse(item.get("id").and_then(Value::as_i64)));
            }
        }
        Some(response)
    }

    pub async fn get_collection_list(&mut self, movie_id: i64) -> Option<Value> {
        self.fetch(DeviceRequest::new("ZidooPoster/getCollection").param("id", movie_id))
            .await
    }

    pub async fn get_movie_details(&mut self, movie_id: i64) -> Option<Value> {
        self.fetch_raw(DeviceRequest::new("Poster/v2/getDetail").param("id", movie_id))
            .await
    }

    /// Episodes of a season, ordered by episode number.
    pub async fn get_episode_list(&mut self, season_id: i64) -> Option<Vec<Value>> {
        let details = self.get_movie_details(season_id).await?;
        let mut episodes = details
            .get("aggregations")
            .or_else(|| details.get("aggregation").and_then(|a| a.get("aggregations")))
            .and_then(Value::as_array)
            .cloned()?;
        episodes.sort_by_key(|e| {
            e.get("aggregation")
                .and_then(|a| a.get("episodeNumber"))
                .and_then(Value::as_i64)
        });
        Some(episodes)
    }

    async fn collection_video_id(&mut self, movie_id: i64) -> i64 {
        let Some(collection) = self.get_collection_list(movie_id).await else {
            return movie_id;
        };
        collection
            .get("data")
            .and_then(Value::as_array)
            .and_then(|items| {
                items
                    .iter()
                    .find(|item| item.get("type").and_then(Value::as_i64) == Some(0))
            })
            .and_then(|item| item.get("aggregationId").and_then(Value::as_i64))
            .unwrap_or(movie_id)
    }

    /// Songs, or the albums/artists/playlists of a category. With an `id`,
    /// lists the tracks inside that entry; playlist id `playing` is the queue.
    pub async fn get_music_list(
        &mut self,
        category: MusicCategory,
        id: Option<&str>,
        max_count: Option<u32>,
    ) -> Option<Value> {
        let count = max_count.unwrap_or(SETTINGS.list_limit);
        let request = match (category, id) {
            (MusicCategory::Music, _) => {
                DeviceRequest::new("MusicControl/v2/getSingleMusics")
            }
            (MusicCategory::Album, Some(id)) => {
                DeviceRequest::new("MusicControl/v2/getAlbumMusics").param("id", id)
            }
            (MusicCategory::Album, None) => DeviceRequest::new("MusicControl/v2/getAlbums"),
            (MusicCategory::Artist, Some(id)) => {
                DeviceRequest::new("MusicControl/v2/getArtistMusics").param("id", id)
            }
            (MusicCategory::Artist, None) => DeviceRequest::new("MusicControl/v2/getArtists"),
            (MusicCategory::Playlist, Some("playing")) => {
                return self.get_music_playlist(count).await;
            }
            (MusicCategory::Playlist, Some(id)) => {
                DeviceRequest::new("MusicControl/v2/getSongListMusics").param("id", id)
            }
            (MusicCategory::Playlist, None) => {
                return self
                    .fetch_raw(DeviceRequest::new("MusicControl/v2/getSongLists"))
                    .await;
            }
        };
        let response = self
            .fetch_raw(request.param("start", 0).param("count", count))
            .await?;
        if category == MusicCategory::Music {
            self.song_list = zidoo_parse::music_ids(response.get("array"), None);
        }
        Some(response)
    }

    pub async fn search_movies(
        &mut self,
        query: &str,
        search_type: &str,
        max_count: Option<u32>,
    ) -> Option<Value> {
        let kind = lookup_code(VIDEO_SEARCH_TYPES, search_type).unwrap_or(0);
        let request = DeviceRequest::new("Poster/v2/searchAggregation")
            .param("q", query)
            .param("type", kind)
            .param("start", 0)
            .param("count", max_count.unwrap_or(SETTINGS.list_limit))
            .class(CallClass::Search);
        self.fetch(request).await
    }

    /// Searches songs, albums or artists. With `play`, a song search starts
    /// playing the first hit.
    pub async fn search_music(
        &mut self,
        query: &str,
        category: MusicCategory,
        max_count: Option<u32>,
        play: bool,
    ) -> Option<Value> {
        let endpoint = match category {
            MusicCategory::Album => "MusicControl/v2/searchAlbum",
            MusicCategory::Artist => "MusicControl/v2/searchArtist",
            MusicCategory::Music | MusicCategory::Playlist => "MusicControl/v2/searchMusic",
        };
        let request = DeviceRequest::new(endpoint)
            .param("key", query)
            .param("start", 0)
            .param("count", max_count.unwrap_or(SETTINGS.list_limit))
            .class(CallClass::Search);
        let response = self.fetch_raw(request).await?;

        if matches!(category, MusicCategory::Music | MusicCategory::Playlist) {
            self.song_list = zidoo_parse::music_ids(response.get("array"), Some("result"));
            if play {
                if let Some(first) = self.song_list.first().cloned() {
                    self.play_music(None, MusicCategory::Music, Some(&first)).await;
                }
            }
        }
        Some(response)
    }

    /// Opens a file path in the matching player.
    pub async fn play_file(&mut self, path: &str) -> bool {
        let request = DeviceRequest::new("ZidooFileControl/openFile")
            .param("path", path)
            .param("videoplaymode", 0);
        self.fetch(request).await.is_some()
    }

    /// Plays a URL through the device's upnp open call. `media_type` is a
    /// MIME type or its major part.
    pub async fn play_stream(&mut self, url: &str, media_type: &str) -> bool {
        let major = media_type.split('/').next().unwrap_or(media_type);
        let kind = lookup_code(STREAM_MIME_TYPES, major)
            .or_else(|| lookup_code(STREAM_MIME_TYPES, "default"))
            .unwrap_or(4);
        let query = match serde_urlencoded::to_string([
            ("type", kind.to_string()),
            ("res", url.to_string()),
        ]) {
            Ok(query) => query,
            Err(e) => {
                warn!(error = %e, "Could not encode stream url");
                return false;
            }
        };
        let upnp = format!(
            "upnp://{}/{}?{}",
            UPNP_SERVER_NAME,
            env!("CARGO_PKG_VERSION"),
            query
        );
        debug!(upnp, "Stream command");
        self.command(DeviceRequest::new("ZidooFileControl/v2/openFile").param("url", upnp))
            .await
    }

    /// Plays a catalog entry. Anything but a plain video (`video_type` 0) is
    /// resolved to the first video of its collection.
    pub async fn play_movie(&mut self, movie_id: i64, video_type: Option<i64>) -> bool {
        let video_type = video_type.unwrap_or(-1);
        let id = if video_type != 0 {
            self.collection_video_id(movie_id).await
        } else {
            movie_id
        };
        let request = DeviceRequest::new("ZidooPoster/PlayVideo")
            .param("id", id)
            .param("type", video_type);
        self.fetch(request).await.is_some()
    }

    /// Plays an album, artist or playlist, or the last listed songs for
    /// [`MusicCategory::Music`]. `music_id` picks the starting track.
    pub async fn play_music(
        &mut self,
        media_id: Option<&str>,
        category: MusicCategory,
        music_id: Option<&str>,
    ) -> bool {
        let music_id = music_id.unwrap_or("-1");
        let request = match (category.playlist_type(), media_id) {
            (Some(kind), Some(media_id)) if media_id != "playing" => {
                DeviceRequest::new("MusicControl/v2/playMusic")
                    .param("type", kind)
                    .param("id", media_id)
                    .param("musicId", music_id)
                    .param("music_type", 0)
                    .param("trackIndex", 1)
                    .param("sort", 0)
            }
            _ => DeviceRequest::new("MusicControl/v2/playMusics")
                .param("ids", self.song_list.join(","))
                .param("musicId", music_id)
                .param("trackIndex", -1),
        };
        self.fetch(request).await.is_some()
    }

    pub async fn get_video_playlist(&mut self) -> Option<Value> {
        self.fetch(DeviceRequest::new("VideoPlay/getPlaylist")).await
    }

    /// The music player's queue.
    pub async fn get_music_playlist(&mut self, max_count: u32) -> Option<Value> {
        let request = DeviceRequest::new("MusicControl/v2/getPlayQueue")
            .param("start", 0)
            .param("count", max_count);
        let response = self.fetch_raw(request).await?;
        self.song_list = zidoo_parse::music_ids(response.get("array"), None);
        Some(response)
    }

    // ---- artwork -------------------------------------------------------

    /// Thumbnail URL for a library item. `media_type` is a video search type
    /// (poster, 2:3 by default) or a music search type (square art).
    pub fn generate_image_url(
        &self,
        media_id: i64,
        media_type: &str,
        width: u32,
        height: Option<u32>,
    ) -> Option<String> {
        let authority = self.session.authority();
        if lookup_code(VIDEO_SEARCH_TYPES, media_type).is_some() {
            let height = height.unwrap_or(width.saturating_mul(3) / 2);
            return Some(format!(
                "http://{}/ZidooPoster/getFile/getPoster?id={}&w={}&h={}",
                authority, media_id, width, height
            ));
        }
        let music_type = lookup_code(MUSIC_SEARCH_TYPES, media_type)?;
        let slot = usize::try_from(music_type).ok()?;
        Some(format!(
            "http://{}/ZidooMusicControl/v2/getImage?id={}&music_type={}&type={}&target={}",
            authority,
            media_id,
            MUSIC_IMAGE_TYPE.get(slot)?,
            music_type,
            MUSIC_IMAGE_TARGET.get(slot)?
        ))
    }

    /// Backdrop of the playing video or cover of the playing track.
    pub fn generate_current_image_url(&self, width: u32, height: u32) -> Option<String> {
        let authority = self.session.authority();
        match self.current_source() {
            PlaybackSource::Video if self.playback.current_video_id() > 0 => Some(format!(
                "http://{}/ZidooPoster/getFile/getBackdrop?id={}&w={}&h={}",
                authority,
                self.playback.current_video_id(),
                width,
                height
            )),
            PlaybackSource::Music => {
                let (id, music_type) = self.playback.current_music()?;
                (id > 0).then(|| {
                    format!(
                        "http://{}/ZidooMusicControl/v2/getImage?id={}&music_type={}&type=4&target=16",
                        authority, id, music_type
                    )
                })
            }
            _ => None,
        }
    }
}

impl std::fmt::Debug for ZidooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZidooClient")
            .field("host", &self.session.host())
            .field("connected", &self.session.is_connected())
            .field("source", &self.current_source())
            .field("schema", &self.playback.schema())
            .finish_non_exhaustive()
    }
}
