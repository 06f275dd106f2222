// Integration tests for `Hc3Client` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hc3log_api::{Error, Hc3Client, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Hc3Client) {
    let server = MockServer::start().await;
    let base = server.uri().parse().expect("mock server URL");
    let client = Hc3Client::new(
        base,
        "admin".into(),
        SecretString::from("hunter2".to_string()),
        &TransportConfig::default(),
    )
    .expect("client builds");
    (server, client)
}

// ── refreshStates ───────────────────────────────────────────────────

#[tokio::test]
async fn refresh_states_sends_cursor_and_auth() {
    let (server, client) = setup().await;

    let body = json!({
        "last": 128,
        "events": [
            { "type": "DevicePropertyUpdatedEvent", "id": 5, "timestamp": 1000,
              "data": { "property": "value", "value": true } },
            { "type": "CustomEvent", "data": { "name": "ping" } },
        ]
    });

    Mock::given(method("GET"))
        .and(path("/api/refreshStates"))
        .and(query_param("last", "42"))
        .and(query_param("timeout", "30"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let resp = client.refresh_states(42, Some(30)).await.expect("ok");

    assert_eq!(resp.last, Some(128));
    let events = resp.events.expect("events present");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].type_tag(), "DevicePropertyUpdatedEvent");
    assert_eq!(events[1].type_tag(), "CustomEvent");
}

#[tokio::test]
async fn refresh_states_without_hold_omits_timeout_param() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/refreshStates"))
        .and(query_param("last", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "last": 1 })))
        .mount(&server)
        .await;

    let resp = client.refresh_states(0, None).await.expect("ok");
    assert_eq!(resp.last, Some(1));
    assert!(resp.events.is_none());
}

#[tokio::test]
async fn refresh_states_maps_401_to_auth_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/refreshStates"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.refresh_states(0, None).await.expect_err("must fail");
    assert!(err.is_auth(), "expected auth error, got: {err}");
}

#[tokio::test]
async fn refresh_states_reports_server_errors_with_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/refreshStates"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    match client.refresh_states(0, None).await {
        Err(Error::Status { status, .. }) => assert_eq!(status, 503),
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn refresh_states_surfaces_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/refreshStates"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    match client.refresh_states(0, None).await {
        Err(Error::Deserialization { body, .. }) => assert_eq!(body, "not json"),
        other => panic!("expected deserialization error, got {other:?}"),
    }
}

// ── lookup ──────────────────────────────────────────────────────────

#[tokio::test]
async fn lookup_fetches_resource_json() {
    let (server, client) = setup().await;

    let body = json!({ "id": 57, "name": "Kitchen Lamp", "roomID": 3 });

    Mock::given(method("GET"))
        .and(path("/api/devices/57"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let value = client.lookup("/devices/57").await.expect("ok");
    assert_eq!(value["name"], "Kitchen Lamp");
}
