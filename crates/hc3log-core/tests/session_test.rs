// Integration tests for `LogSession` against a mock controller.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hc3log_core::{ConnectionConfig, ConnectionState, LogSession};

fn session_for(server: &MockServer) -> LogSession {
    let host = server
        .uri()
        .strip_prefix("http://")
        .expect("mock server is plain http")
        .to_owned();
    LogSession::new(ConnectionConfig {
        host,
        username: "admin".into(),
        password: SecretString::from("hunter2".to_string()),
        hold_secs: 1,
        ..ConnectionConfig::default()
    })
}

fn feed_response(delay: Duration) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_json(json!({
            "last": 1,
            "events": [{ "type": "CustomEvent", "data": { "name": "ping" } }]
        }))
        .set_delay(delay)
}

#[tokio::test]
async fn connect_streams_normalized_events() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/refreshStates"))
        .respond_with(feed_response(Duration::ZERO))
        .mount(&server)
        .await;

    let session = session_for(&server);
    let mut events = session.events();
    let handle = session.connect().await.expect("connect");
    assert_eq!(*session.state().borrow(), ConnectionState::Streaming);

    let record = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("stream delivers")
        .expect("event");
    assert_eq!(record.type_tag(), "CustomEvent");
    assert_eq!(record.row.display_type, "Custom");

    session.disconnect(handle).await;
    assert_eq!(*session.state().borrow(), ConnectionState::Idle);
}

#[tokio::test]
async fn stale_disconnect_does_not_kill_the_replacement_stream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/refreshStates"))
        .respond_with(feed_response(Duration::from_millis(200)))
        .mount(&server)
        .await;

    let session = session_for(&server);
    let first = session.connect().await.expect("first connect");

    // Start a replacement connection, then tear the first one down while
    // the replacement's probe is still in flight.
    let replacement = {
        let session = session.clone();
        tokio::spawn(async move { session.connect().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.disconnect(first).await;

    let second = replacement
        .await
        .expect("connect task")
        .expect("second connect");
    assert_eq!(*session.state().borrow(), ConnectionState::Streaming);

    let mut events = session.events();
    let record = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("replacement stream still delivers")
        .expect("event");
    assert_eq!(record.type_tag(), "CustomEvent");

    session.disconnect(second).await;
    assert_eq!(*session.state().borrow(), ConnectionState::Idle);
}
