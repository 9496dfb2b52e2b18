use serde_json::json;

use zidoo_rc::models::{
    lookup_code, AggregationOfFile, CodeEnvelope, Envelope, MusicTrack, OutputListResponse,
    SystemInfo, VideoStatusResponse, VIDEO_FILTER_TYPES,
};
use zidoo_rc::{MediaIdentity, MediaKind};

// Test SystemInfo deserialization with the device's own field names
#[test]
fn test_system_info_model() {
    let json_data = json!({
        "status": 200,
        "model": "Z9X Pro",
        "ip": "192.168.1.50",
        "net_mac": "80:0a:80:12:34:56",
        "wif_mac": "80:0a:80:12:34:57",
        "firmware": "6.4.42",
        "androidversion": 9,
        "ableRemoteBoot": true,
        "language": "en"
    });

    let info: SystemInfo = serde_json::from_value(json_data).unwrap();

    assert!(info.is_ok());
    assert_eq!(info.model.as_deref(), Some("Z9X Pro"));
    assert_eq!(info.wifi_mac.as_deref(), Some("80:0a:80:12:34:57"));
    assert_eq!(info.android_version.as_deref(), Some("9"));
    assert_eq!(info.able_remote_boot, Some(true));
    assert_eq!(info.extra.get("language"), Some(&json!("en")));
}

// Test numbers that arrive quoted still parse
#[test]
fn test_video_status_model() {
    let json_data = json!({
        "status": 200,
        "video": {
            "status": 1,
            "title": "Heat",
            "path": "/mnt/movies/Heat.mkv",
            "duration": "10200000",
            "currentPosition": 61000,
            "width": 3840,
            "height": "2160",
            "fps": 24,
            "bitrate": "",
            "output": "HDR10"
        },
        "subtitle": {"index": "2"},
        "zoom": {"index": 0, "information": "Original"}
    });

    let status: VideoStatusResponse = serde_json::from_value(json_data).unwrap();
    let video = status.video.unwrap();

    assert_eq!(video.duration, Some(10_200_000));
    assert_eq!(video.current_position, Some(61_000));
    assert_eq!(video.height, Some(2160));
    assert_eq!(video.fps.as_deref(), Some("24"));
    assert_eq!(video.bitrate, None);
    assert_eq!(status.subtitle.unwrap().index, Some(2));
    assert_eq!(status.zoom.unwrap().information.as_deref(), Some("Original"));
    assert!(status.audio.is_none());
}

// Test a video object without a usable status still parses as not playing
#[test]
fn test_video_status_without_status_field() {
    let status: VideoStatusResponse = serde_json::from_value(json!({
        "status": 200,
        "video": {"title": "Heat", "path": "/m/heat.mkv"},
        "subtitle": {"index": 3}
    }))
    .unwrap();
    assert_eq!(status.video.unwrap().status, None);
    assert_eq!(status.subtitle.unwrap().index, Some(3));

    let quoted: VideoStatusResponse = serde_json::from_value(json!({
        "status": 200,
        "video": {"status": "1"}
    }))
    .unwrap();
    assert_eq!(quoted.video.unwrap().status, Some(1));
}

#[test]
fn test_envelopes() {
    let envelope: Envelope = serde_json::from_value(json!({"status": "200", "data": []})).unwrap();
    assert!(envelope.is_ok());
    let missing: Envelope = serde_json::from_value(json!({"data": []})).unwrap();
    assert!(!missing.is_ok());

    let v2: CodeEnvelope = serde_json::from_value(json!({"code": 0})).unwrap();
    assert!(v2.is_ok());
    let failed: CodeEnvelope = serde_json::from_value(json!({"code": 1, "msg": "no"})).unwrap();
    assert!(!failed.is_ok());
}

#[test]
fn test_music_track_aliases() {
    let track: MusicTrack = serde_json::from_value(json!({
        "id": 3,
        "title": "Song",
        "path": "/music/song.flac",
        "extension": "flac",
        "channels": 2,
        "bits": 16,
        "sampleRate": 44100
    }))
    .unwrap();

    assert_eq!(track.uri.as_deref(), Some("/music/song.flac"));
    assert_eq!(
        track.channel_description().as_deref(),
        Some("flac: 2 channels 16 bits 44100 Hz")
    );

    let bare: MusicTrack = serde_json::from_value(json!({"title": "x"})).unwrap();
    assert_eq!(bare.channel_description(), None);
}

#[test]
fn test_output_list_aliases() {
    let response: OutputListResponse = serde_json::from_value(json!({
        "status": 200,
        "data": [{"name": "HDMI", "tag": 1}]
    }))
    .unwrap();

    assert_eq!(response.list.len(), 1);
    assert_eq!(response.list[0].tag, "1");

    let empty: OutputListResponse = serde_json::from_value(json!({"status": 200})).unwrap();
    assert!(empty.list.is_empty());
}

// Test episode lookups carry season and series names
#[test]
fn test_episode_identity() {
    let file: AggregationOfFile = serde_json::from_value(json!({
        "type": 5,
        "episode": {"id": 900, "aggregation": {"name": "Pilot", "episodeNumber": 1}},
        "season": {"id": 90, "aggregation": {"name": "Season 1", "seasonNumber": 1, "tvName": "Show"}}
    }))
    .unwrap();

    let identity = MediaIdentity::from_aggregation(&file);

    assert_eq!(identity.catalog_id, 900);
    assert_eq!(identity.kind, MediaKind::TvEpisode);
    assert!(identity.kind.is_episodic());
    assert_eq!(identity.episode_name.as_deref(), Some("Pilot"));
    assert_eq!(identity.season_number, Some(1));
    assert_eq!(identity.series_name.as_deref(), Some("Show"));
}

#[test]
fn test_uncatalogued_file_uses_parent_id() {
    let file: AggregationOfFile =
        serde_json::from_value(json!({"type": 0, "video": {"parentId": 17}})).unwrap();

    let identity = MediaIdentity::from_aggregation(&file);

    assert_eq!(identity.catalog_id, 17);
    assert_eq!(identity.kind, MediaKind::Video);
    assert_eq!(identity.title, None);
}

#[test]
fn test_lookup_code() {
    assert_eq!(lookup_code(VIDEO_FILTER_TYPES, "Recent"), Some(10));
    assert_eq!(lookup_code(VIDEO_FILTER_TYPES, "4K"), Some(7));
    assert_eq!(lookup_code(VIDEO_FILTER_TYPES, "nope"), None);
}
