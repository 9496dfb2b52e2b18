mod common;

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::json;

use common::*;
use zidoo_rc::{
    CallClass, DeviceRequest, DeviceSession, RawResponse, RemoteKey, RequestExecutor, RetryPolicy,
    Timeouts, ZidooConfig, ZidooError,
};

fn executor(transport: Arc<dyn zidoo_rc::Transport>, policy: RetryPolicy) -> RequestExecutor {
    RequestExecutor::new(
        transport,
        policy,
        Timeouts {
            status: Duration::from_secs(1),
            default: Duration::from_secs(5),
            search: Duration::from_secs(10),
        },
    )
}

fn session() -> DeviceSession {
    DeviceSession::new(ZidooConfig::new("10.0.0.9").with_port(9529))
}

#[tokio::test]
async fn test_first_usable_response_returns_without_retry() {
    let transport = ScriptedTransport::new();
    transport.push(MODEL, Reply::Json(model_info()));
    let exec = executor(transport.clone(), RetryPolicy::new(3, 3));
    let mut session = session();

    let value = exec
        .execute(&mut session, &DeviceRequest::new(MODEL))
        .await
        .unwrap();

    assert_eq!(value["model"], "Z9X");
    assert_eq!(transport.calls_to(MODEL), 1);
    assert!(session.is_connected());
}

#[tokio::test]
async fn test_non_200_status_field_is_still_returned() {
    let transport = ScriptedTransport::new();
    transport.push("ZidooVideoPlay/setSubtitle", Reply::Json(json!({"status": 500})));
    let exec = executor(transport.clone(), RetryPolicy::new(3, 3));
    let mut session = session();

    let value = exec
        .execute(&mut session, &DeviceRequest::new("ZidooVideoPlay/setSubtitle"))
        .await
        .unwrap();

    assert_eq!(value["status"], 500);
    assert_eq!(transport.calls_to("ZidooVideoPlay/setSubtitle"), 1);
}

#[tokio::test]
async fn test_busy_status_is_retried_until_usable() {
    let transport = ScriptedTransport::new();
    transport.push(VIDEO_STATUS, Reply::Json(json!({"status": 804})));
    transport.push(VIDEO_STATUS, Reply::Json(json!({"status": 804})));
    transport.push(VIDEO_STATUS, Reply::Json(video_playing("/a/movie.mkv")));
    let exec = executor(transport.clone(), RetryPolicy::new(3, 3));
    let mut session = session();

    let request = DeviceRequest::new(VIDEO_STATUS).status_probe();
    let value = exec.execute(&mut session, &request).await.unwrap();

    assert_eq!(value["video"]["path"], "/a/movie.mkv");
    assert_eq!(transport.calls_to(VIDEO_STATUS), 3);
}

#[tokio::test]
async fn test_busy_code_on_other_endpoints_is_not_special() {
    let transport = ScriptedTransport::new();
    transport.push("ZidooFileControl/getDevices", Reply::Json(json!({"status": 804})));
    let exec = executor(transport.clone(), RetryPolicy::new(3, 3));
    let mut session = session();

    let value = exec
        .execute(&mut session, &DeviceRequest::new("ZidooFileControl/getDevices"))
        .await
        .unwrap();

    assert_eq!(value["status"], 804);
    assert_eq!(transport.total_calls(), 1);
}

#[tokio::test]
async fn test_busy_exhaustion_clears_session() {
    let transport = ScriptedTransport::new();
    transport.always(VIDEO_STATUS, Reply::Json(json!({"status": 804})));
    let exec = executor(transport.clone(), RetryPolicy::new(3, 2));
    let mut session = session();
    session_connect(&exec, &mut session, &transport).await;

    let request = DeviceRequest::new(VIDEO_STATUS).status_probe();
    let err = exec.execute(&mut session, &request).await.unwrap_err();

    assert!(matches!(err, ZidooError::DeviceBusy));
    // first attempt plus two busy retries
    assert_eq!(transport.calls_to(VIDEO_STATUS), 3);
    assert!(!session.is_connected());
}

#[tokio::test]
async fn test_busy_and_transport_budgets_are_independent() {
    let transport = ScriptedTransport::new();
    transport.push(VIDEO_STATUS, Reply::Timeout);
    transport.push(VIDEO_STATUS, Reply::Json(json!({"status": 804})));
    transport.push(VIDEO_STATUS, Reply::Timeout);
    transport.push(VIDEO_STATUS, Reply::Json(json!({"status": 804})));
    transport.push(VIDEO_STATUS, Reply::Json(video_idle()));
    let exec = executor(transport.clone(), RetryPolicy::new(2, 2));
    let mut session = session();

    let request = DeviceRequest::new(VIDEO_STATUS).status_probe();
    let value = exec.execute(&mut session, &request).await.unwrap();

    assert_eq!(value, video_idle());
    assert_eq!(transport.calls_to(VIDEO_STATUS), 5);
}

async fn session_connect(
    exec: &RequestExecutor,
    session: &mut DeviceSession,
    transport: &ScriptedTransport,
) {
    transport.push(MODEL, Reply::Cookie(model_info(), "JSESSIONID=abc"));
    exec.execute(session, &DeviceRequest::new(MODEL)).await.unwrap();
    assert!(session.is_connected());
}

#[tokio::test]
async fn test_transport_exhaustion_marks_disconnected() {
    let transport = ScriptedTransport::new();
    let exec = executor(transport.clone(), RetryPolicy::new(3, 3));
    let mut session = session();
    session_connect(&exec, &mut session, &transport).await;

    transport.always("ZidooFileControl/getDevices", Reply::Timeout);
    let err = exec
        .execute(&mut session, &DeviceRequest::new("ZidooFileControl/getDevices"))
        .await
        .unwrap_err();

    match err {
        ZidooError::DeviceOffline { endpoint, attempts } => {
            assert_eq!(endpoint, "ZidooFileControl/getDevices");
            assert_eq!(attempts, 4);
        }
        other => panic!("Expected DeviceOffline, got {:?}", other),
    }
    assert!(!session.is_connected());
}

#[tokio::test]
async fn test_malformed_and_http_errors_use_transport_budget() {
    let transport = ScriptedTransport::new();
    transport.push("ZidooPoster/getCollection", Reply::Body("<html>oops</html>"));
    transport.push("ZidooPoster/getCollection", Reply::Status(500));
    transport.push("ZidooPoster/getCollection", Reply::Body("[]"));
    transport.push("ZidooPoster/getCollection", Reply::Json(json!({"status": 200, "data": []})));
    let exec = executor(transport.clone(), RetryPolicy::new(3, 0));
    let mut session = session();

    let value = exec
        .execute(&mut session, &DeviceRequest::new("ZidooPoster/getCollection"))
        .await
        .unwrap();

    assert_eq!(value["data"], json!([]));
    assert_eq!(transport.calls_to("ZidooPoster/getCollection"), 4);
}

#[tokio::test]
async fn test_optional_endpoint_failure_keeps_session() {
    let transport = ScriptedTransport::new();
    let exec = executor(transport.clone(), RetryPolicy::new(3, 3));
    let mut session = session();
    session_connect(&exec, &mut session, &transport).await;

    transport.always(OUTPUTS, Reply::Status(404));
    let request = DeviceRequest::new(OUTPUTS).retries(0).optional();
    let err = exec.execute(&mut session, &request).await.unwrap_err();

    assert!(matches!(err, ZidooError::DeviceOffline { attempts: 1, .. }));
    assert_eq!(transport.calls_to(OUTPUTS), 1);
    assert!(session.is_connected());
}

// A key press with zero retries fails on the first timeout
#[tokio::test]
async fn test_zero_retry_call_fails_without_reissue() {
    let mut net = MockNet::new();
    net.expect_send()
        .times(1)
        .returning(|request| {
            let timeout = request.timeout;
            async move { Err::<RawResponse, _>(ZidooError::Timeout(timeout)) }.boxed()
        });
    let exec = executor(Arc::new(net), RetryPolicy::new(3, 3));
    let mut session = session();

    let request = DeviceRequest::new(SEND_KEY)
        .param("key", RemoteKey::Home.as_str())
        .retries(0);
    let err = exec.execute(&mut session, &request).await.unwrap_err();

    assert!(matches!(
        err,
        ZidooError::DeviceOffline { attempts: 1, .. }
    ));
}

#[tokio::test]
async fn test_cookie_is_sent_back_and_psk_replaces_it() {
    let transport = ScriptedTransport::new();
    let exec = executor(transport.clone(), RetryPolicy::default());

    let mut session = session();
    transport.push(MODEL, Reply::Cookie(model_info(), "JSESSIONID=abc; Path=/; HttpOnly"));
    exec.execute(&mut session, &DeviceRequest::new(MODEL)).await.unwrap();
    exec.execute(&mut session, &DeviceRequest::new(MODEL)).await.unwrap();

    let sent = transport.requests_to(MODEL);
    assert_eq!(sent[0].header("Cookie"), None);
    assert_eq!(sent[1].header("Cookie"), Some("JSESSIONID=abc"));
    assert_eq!(sent[1].header("Cache-Control"), Some("no-cache"));
    assert_eq!(sent[1].url, "http://10.0.0.9:9529/ZidooControlCenter/getModel");

    let transport = ScriptedTransport::new();
    let exec = executor(transport.clone(), RetryPolicy::default());
    let mut session = DeviceSession::new(ZidooConfig::new("10.0.0.9").with_psk("hunter2"));
    transport.push(MODEL, Reply::Cookie(model_info(), "JSESSIONID=abc"));
    exec.execute(&mut session, &DeviceRequest::new(MODEL)).await.unwrap();
    exec.execute(&mut session, &DeviceRequest::new(MODEL)).await.unwrap();

    let sent = transport.requests_to(MODEL);
    assert_eq!(sent[1].header("X-Auth-PSK"), Some("hunter2"));
    assert_eq!(sent[1].header("Cookie"), None);
}

#[tokio::test]
async fn test_call_class_selects_timeout() {
    let mut net = MockNet::new();
    net.expect_send()
        .withf(|request| request.timeout == Duration::from_secs(1))
        .times(1)
        .returning(|_| ok_future(video_idle()));
    net.expect_send()
        .withf(|request| request.timeout == Duration::from_secs(10))
        .times(1)
        .returning(|_| ok_future(json!({"array": []})));
    let exec = executor(Arc::new(net), RetryPolicy::default());
    let mut session = session();

    exec.execute(&mut session, &DeviceRequest::new(VIDEO_STATUS).status_probe())
        .await
        .unwrap();
    exec.execute(
        &mut session,
        &DeviceRequest::new("MusicControl/v2/searchMusic")
            .param("key", "abba")
            .class(CallClass::Search),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_query_parameters_are_fresh_per_request() {
    let transport = ScriptedTransport::new();
    let exec = executor(transport.clone(), RetryPolicy::default());
    let mut session = session();

    exec.execute(&mut session, &DeviceRequest::new(SEND_KEY).param("key", "Key.Up"))
        .await
        .unwrap();
    exec.execute(&mut session, &DeviceRequest::new(SEND_KEY).param("key", "Key.Down"))
        .await
        .unwrap();

    let sent = transport.requests_to(SEND_KEY);
    assert_eq!(sent[0].query, vec![("key".to_string(), "Key.Up".to_string())]);
    assert_eq!(sent[1].query, vec![("key".to_string(), "Key.Down".to_string())]);
}
