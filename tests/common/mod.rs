#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use mockall::mock;
use serde_json::{json, Value};

use zidoo_rc::{OutgoingRequest, RawResponse, Transport, ZidooClient, ZidooConfig, ZidooError};

pub const MODEL: &str = "ZidooControlCenter/getModel";
pub const VIDEO_STATUS: &str = "ZidooVideoPlay/getPlayStatus";
pub const MUSIC_STATUS_V1: &str = "ZidooMusicControl/getPlayStatus";
pub const MUSIC_STATUS_V2: &str = "ZidooMusicControl/v2/getState";
pub const AGGREGATION: &str = "ZidooPoster/v2/getAggregationOfFile";
pub const SEND_KEY: &str = "ZidooControlCenter/RemoteControl/sendkey";
pub const OUTPUTS: &str = "ZidooMusicControl/v2/getOutputList";
pub const SAVED_SHARES: &str = "ZidooFileControl/v2/getSavedSmbDevices";

/// One canned answer.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Cookie(Value, &'static str),
    Status(u16),
    Body(&'static str),
    Timeout,
}

impl Reply {
    fn into_result(self, request: &OutgoingRequest) -> Result<RawResponse, ZidooError> {
        match self {
            Reply::Json(body) => Ok(RawResponse::json(&body)),
            Reply::Cookie(body, cookie) => Ok(RawResponse::json(&body).with_cookie(cookie)),
            Reply::Status(status) => Ok(RawResponse {
                status,
                set_cookies: Vec::new(),
                body: bytes::Bytes::new(),
            }),
            Reply::Body(text) => Ok(RawResponse {
                status: 200,
                set_cookies: Vec::new(),
                body: bytes::Bytes::from_static(text.as_bytes()),
            }),
            Reply::Timeout => Err(ZidooError::Timeout(request.timeout)),
        }
    }
}

/// In-memory device: per-endpoint queues of one-shot replies, then a sticky
/// reply, then `{"status": 200}`.
#[derive(Default)]
pub struct ScriptedTransport {
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    sticky: Mutex<HashMap<String, Reply>>,
    delays: Mutex<HashMap<String, VecDeque<Duration>>>,
    log: Mutex<Vec<OutgoingRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, endpoint: &str, reply: Reply) {
        self.queued
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn always(&self, endpoint: &str, reply: Reply) {
        self.sticky
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), reply);
    }

    /// Holds the next reply to `endpoint` back for `delay`.
    pub fn delay_next(&self, endpoint: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(delay);
    }

    pub fn calls_to(&self, endpoint: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .count()
    }

    pub fn requests_to(&self, endpoint: &str) -> Vec<OutgoingRequest> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .cloned()
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    pub fn clear_log(&self) {
        self.log.lock().unwrap().clear();
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: OutgoingRequest) -> BoxFuture<'static, Result<RawResponse, ZidooError>> {
        let reply = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&request.endpoint)
            .and_then(VecDeque::pop_front)
            .or_else(|| self.sticky.lock().unwrap().get(&request.endpoint).cloned())
            .unwrap_or_else(|| Reply::Json(json!({"status": 200})));
        let delay = self
            .delays
            .lock()
            .unwrap()
            .get_mut(&request.endpoint)
            .and_then(VecDeque::pop_front);
        let result = reply.into_result(&request);
        self.log.lock().unwrap().push(request);
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        }
        .boxed()
    }
}

mock! {
    pub Net {}

    impl Transport for Net {
        fn send(&self, request: OutgoingRequest) -> BoxFuture<'static, Result<RawResponse, ZidooError>>;
        fn reset(&self);
    }
}

pub fn ok_future(body: Value) -> BoxFuture<'static, Result<RawResponse, ZidooError>> {
    async move { Ok(RawResponse::json(&body)) }.boxed()
}

pub fn model_info() -> Value {
    json!({
        "status": 200,
        "model": "Z9X",
        "net_mac": "80:0a:80:12:34:56",
        "firmware": "6.4.42",
        "androidversion": "9"
    })
}

pub fn video_playing(path: &str) -> Value {
    json!({
        "status": 200,
        "video": {
            "status": 1,
            "title": "movie.mkv",
            "path": path,
            "duration": 7_200_000,
            "currentPosition": 1000
        },
        "subtitle": {"index": 1},
        "audio": {"index": 0},
        "zoom": {"index": 0, "information": "Original"}
    })
}

pub fn video_paused(path: &str) -> Value {
    json!({
        "status": 200,
        "video": {"status": 0, "title": "movie.mkv", "path": path, "duration": 7_200_000, "currentPosition": 5}
    })
}

pub fn video_idle() -> Value {
    json!({"status": 200})
}

pub fn music_v1(playing: bool) -> Value {
    json!({
        "status": 200,
        "isPlay": playing,
        "music": {"id": 12, "type": 0, "title": "Song", "artist": "Artist", "album": "Album",
                  "number": 3, "uri": "/music/song.flac"},
        "state": {"playing": playing, "duration": 200_000, "position": 1_000}
    })
}

pub fn music_idle() -> Value {
    json!({"status": 200, "isPlay": false})
}

pub fn movie_aggregation(id: i64, name: &str) -> Value {
    json!({
        "type": 1,
        "movie": {"id": id, "name": name, "aggregation": {"tagLine": "Tag", "releaseDate": "2001-02-03"}}
    })
}

pub fn client_for(transport: Arc<ScriptedTransport>) -> ZidooClient {
    ZidooClient::with_transport(ZidooConfig::new("192.168.1.50").with_port(9529), transport)
}

/// A client that already holds a session token.
pub async fn connected_client(transport: Arc<ScriptedTransport>) -> ZidooClient {
    transport.push(MODEL, Reply::Cookie(model_info(), "JSESSIONID=abc; Path=/"));
    let mut client = client_for(transport.clone());
    client.connect().await.expect("connect");
    transport.clear_log();
    client
}
