// Integration tests for `YoLinkClient` and its token cache using wiremock.

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use yolink_bridge::Error;
use yolink_bridge::config::YoLinkConfig;
use yolink_bridge::yolink_api::{YoLinkApiTrait, YoLinkClient};

// ── Helpers ─────────────────────────────────────────────────────────

const TOKEN_PATH: &str = "/open/yolink/token";
const API_PATH: &str = "/open/yolink/v2/api";

fn config(server: &MockServer) -> YoLinkConfig {
    YoLinkConfig {
        client_id: Some("client-id".to_string()),
        client_secret: Some("client-secret".to_string()),
        api_url: format!("{}{}", server.uri(), API_PATH),
        token_url: format!("{}{}", server.uri(), TOKEN_PATH),
        ..YoLinkConfig::default()
    }
}

async fn setup() -> (MockServer, YoLinkClient) {
    let server = MockServer::start().await;
    let client = YoLinkClient::with_client(reqwest::Client::new(), &config(&server));
    (server, client)
}

fn token_body(token: &str, expires_in: i64) -> serde_json::Value {
    json!({
        "access_token": token,
        "token_type": "bearer",
        "expires_in": expires_in,
        "scope": "create"
    })
}

async fn mount_token(server: &MockServer, token: &str, expires_in: i64, times: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(token, expires_in)))
        .expect(times)
        .mount(server)
        .await;
}

fn device_list() -> serde_json::Value {
    json!({
        "code": "000000",
        "time": 1_700_000_000_000_i64,
        "msgid": 1_700_000_000_000_i64,
        "method": "Home.getDeviceList",
        "desc": "Success",
        "data": {
            "devices": [{
                "deviceId": "d1",
                "deviceUDID": "udid-1",
                "name": "Front Door",
                "token": "device-token-1",
                "type": "DoorSensor",
                "parentDeviceId": null,
                "modelName": "YS7704-UC",
                "serviceZone": "us_west_1"
            }]
        }
    })
}

async fn mount_device_list(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_partial_json(json!({ "method": "Home.getDeviceList" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_list()))
        .mount(server)
        .await;
}

// ── Token cache ─────────────────────────────────────────────────────

#[tokio::test]
async fn token_is_reused_until_expiry() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 7200, 1).await;

    let first = client.tokens().get_token().await.unwrap();
    let second = client.tokens().get_token().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.access_token, "tok-1");
}

#[tokio::test]
async fn expired_token_triggers_new_exchange() {
    let (server, client) = setup().await;
    // 1s advertised lifetime, 0.9s usable
    mount_token(&server, "short-lived", 1, 2).await;

    client.tokens().get_token().await.unwrap();
    tokio::time::sleep(Duration::from_millis(950)).await;
    client.tokens().get_token().await.unwrap();
}

#[tokio::test]
async fn rejected_exchange_is_auth_error() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "code": "010101", "msg": "Client invalid" })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let result = client.tokens().get_token().await;
    assert!(
        matches!(result, Err(Error::Auth(ref m)) if m.contains("Client invalid")),
        "expected Auth error, got: {result:?}"
    );
    // nothing was cached, so the next call exchanges again
    assert!(client.tokens().get_token().await.is_err());
}

#[tokio::test]
async fn missing_credentials_fail_without_network() {
    let server = MockServer::start().await;
    let config = YoLinkConfig {
        client_id: None,
        ..config(&server)
    };
    let client = YoLinkClient::with_client(reqwest::Client::new(), &config);

    let result = client.list_devices().await;
    assert!(
        matches!(result, Err(Error::Config(_))),
        "expected Config error, got: {result:?}"
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_token_endpoint_is_auth_error() {
    let server = MockServer::start().await;
    let config = YoLinkConfig {
        token_url: "http://127.0.0.1:1/token".to_string(),
        ..config(&server)
    };
    let client = YoLinkClient::with_client(reqwest::Client::new(), &config);

    let result = client.tokens().get_token().await;
    assert!(
        matches!(result, Err(Error::Auth(_))),
        "expected Auth error, got: {result:?}"
    );
}

#[tokio::test]
async fn non_json_token_body_is_auth_error() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let result = client.tokens().get_token().await;
    assert!(
        matches!(result, Err(Error::Auth(_))),
        "expected Auth error, got: {result:?}"
    );
    assert!(matches!(client.list_devices().await, Err(Error::Auth(_))));
}

// ── Device list ─────────────────────────────────────────────────────

#[tokio::test]
async fn list_devices_sends_bearer_and_decodes_devices() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 7200, 1).await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(header("authorization", "Bearer tok-1"))
        .and(body_partial_json(json!({ "method": "Home.getDeviceList" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_list()))
        .expect(1)
        .mount(&server)
        .await;

    let devices = client.list_devices().await.unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].device_id, "d1");
    assert_eq!(devices[0].name, "Front Door");
    assert_eq!(devices[0].token, "device-token-1");
    assert_eq!(devices[0].r#type, "DoorSensor");
    assert_eq!(devices[0].parent_device_id, None);
    assert_eq!(devices[0].service_zone, "us_west_1");
}

#[tokio::test]
async fn vendor_error_carries_desc() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 7200, 1).await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "010000",
            "desc": "Service not available, try again later",
            "data": { "devices": [{ "deviceId": "ghost" }] }
        })))
        .mount(&server)
        .await;

    let result = client.list_devices().await;

    match result {
        Err(err @ Error::Vendor { .. }) => {
            assert!(err.to_string().contains("Service not available, try again later"));
        }
        other => panic!("expected Vendor error, got: {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_code_forces_new_token_exchange() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 7200, 2).await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "code": "401", "desc": "Unauthorized" })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_device_list(&server).await;

    assert!(matches!(
        client.list_devices().await,
        Err(Error::Vendor { ref code, .. }) if code == "401"
    ));
    // the stale token was dropped, so this call exchanges a fresh one
    assert_eq!(client.list_devices().await.unwrap().len(), 1);
}

#[tokio::test]
async fn unauthorized_status_forces_new_token_exchange() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 7200, 2).await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "code": "010104", "desc": "Token is expired" })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_device_list(&server).await;

    assert!(matches!(
        client.list_devices().await,
        Err(Error::Vendor { ref code, .. }) if code == "010104"
    ));
    assert_eq!(client.list_devices().await.unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_body_is_parse_error() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 7200, 1).await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    match client.list_devices().await {
        Err(Error::Parse { body, .. }) => assert_eq!(body, "Bad Gateway"),
        other => panic!("expected Parse error, got: {other:?}"),
    }
}

// ── Device state ────────────────────────────────────────────────────

#[tokio::test]
async fn device_state_uses_device_token() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 7200, 1).await;
    mount_device_list(&server).await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_partial_json(json!({
            "method": "DoorSensor.getState",
            "targetDevice": "d1",
            "token": "device-token-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "000000",
            "desc": "Success",
            "data": { "state": "closed", "battery": 4 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = client.get_device_state("d1", "DoorSensor").await.unwrap();
    let value: serde_json::Value = serde_json::from_str(state.get()).unwrap();

    assert_eq!(value, json!({ "state": "closed", "battery": 4 }));
}

#[tokio::test]
async fn unknown_device_is_not_found_and_skips_state_call() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 7200, 1).await;
    mount_device_list(&server).await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_string_contains("getState"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "000000" })))
        .expect(0)
        .mount(&server)
        .await;

    let result = client.get_device_state("X", "T").await;
    assert!(
        matches!(result, Err(Error::NotFound(_))),
        "expected NotFound error, got: {result:?}"
    );
}

#[tokio::test]
async fn unauthorized_state_call_forces_new_token_exchange() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 7200, 2).await;
    mount_device_list(&server).await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_partial_json(json!({ "method": "DoorSensor.getState" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "code": "401", "desc": "Unauthorized" })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_partial_json(json!({ "method": "DoorSensor.getState" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "000000",
            "data": { "state": "open" }
        })))
        .mount(&server)
        .await;

    assert!(matches!(
        client.get_device_state("d1", "DoorSensor").await,
        Err(Error::Vendor { ref code, .. }) if code == "401"
    ));
    let state = client.get_device_state("d1", "DoorSensor").await.unwrap();
    let value: serde_json::Value = serde_json::from_str(state.get()).unwrap();
    assert_eq!(value, json!({ "state": "open" }));
}

// ── Home id ─────────────────────────────────────────────────────────

#[tokio::test]
async fn home_id_from_general_info() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 7200, 1).await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_partial_json(json!({ "method": "Home.getGeneralInfo" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "000000",
            "desc": "Success",
            "data": { "id": "home-42" }
        })))
        .mount(&server)
        .await;

    assert_eq!(client.get_home_id().await.unwrap(), "home-42");
}

#[tokio::test]
async fn empty_home_id_is_an_error() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 7200, 1).await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "000000",
            "desc": "Success",
            "data": { "id": "" }
        })))
        .mount(&server)
        .await;

    assert!(client.get_home_id().await.is_err());
}

#[tokio::test]
async fn unauthorized_home_id_call_forces_new_token_exchange() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 7200, 2).await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "code": "401", "desc": "Unauthorized" })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_partial_json(json!({ "method": "Home.getGeneralInfo" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "000000",
            "data": { "id": "home-42" }
        })))
        .mount(&server)
        .await;

    assert!(client.get_home_id().await.is_err());
    assert_eq!(client.get_home_id().await.unwrap(), "home-42");
}
