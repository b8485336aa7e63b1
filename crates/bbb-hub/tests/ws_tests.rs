/*
[INPUT]:  Running hub with a mocked API server
[OUTPUT]: Test results for the persistent WebSocket endpoint
[POS]:    Integration tests - /ws and /health
[UPDATE]: When event tags or connection handling change
*/

mod common;

use std::time::Duration;

use common::{
    API_PATH, connect, next_reply, send_event, setup_mock_api, spawn_hub, wait_for_connections,
    xml_response,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

#[tokio::test]
async fn test_create_success_is_broadcast_without_txid() {
    let api = setup_mock_api().await;
    let hub = spawn_hub(Some(&api)).await;
    let mut alice = connect(&hub).await;
    let mut bob = connect(&hub).await;
    wait_for_connections(&hub, 2).await;

    send_event(
        &mut alice,
        json!({ "event": "create", "data": { "id": "demo", "__txid": "client-supplied" } }),
    )
    .await;

    for client in [&mut alice, &mut bob] {
        let reply = next_reply(client).await;
        assert_eq!(reply["event"], "create.success");
        assert_eq!(reply["data"]["id"], "demo");
        assert_eq!(reply["data"]["moderatorPW"], "mp");
        assert_eq!(reply["data"]["created"], 1_389_000_000);
        assert!(reply["data"].get("__txid").is_none());
    }
}

#[tokio::test]
async fn test_private_reply_reaches_only_requester() {
    let api = setup_mock_api().await;
    let hub = spawn_hub(Some(&api)).await;
    let mut alice = connect(&hub).await;
    let mut bob = connect(&hub).await;
    wait_for_connections(&hub, 2).await;

    send_event(&mut alice, json!({ "event": "running", "data": { "id": "demo" } })).await;
    let reply = next_reply(&mut alice).await;
    assert_eq!(reply, json!({ "event": "running", "data": { "running": true } }));

    let nothing = tokio::time::timeout(Duration::from_millis(200), next_reply(&mut bob)).await;
    assert!(nothing.is_err());
}

#[tokio::test]
async fn test_unknown_event_gets_error_reply() {
    let hub = spawn_hub(None).await;
    let mut client = connect(&hub).await;

    send_event(&mut client, json!({ "event": "bogus", "data": {} })).await;
    let reply = next_reply(&mut client).await;
    assert_eq!(reply["event"], "error");
    assert_eq!(reply["data"]["error"], "Event Handler 'bogus' not found!");

    client
        .send(tokio_tungstenite::tungstenite::Message::Text("not json".into()))
        .await
        .expect("send");
    let reply = next_reply(&mut client).await;
    assert_eq!(reply["event"], "error");
}

#[tokio::test]
async fn test_handlers_without_session_report_not_connected() {
    let hub = spawn_hub(None).await;
    let mut client = connect(&hub).await;

    send_event(&mut client, json!({ "event": "meetings" })).await;
    let reply = next_reply(&mut client).await;
    assert_eq!(reply["event"], "error");
    assert!(
        reply["data"]["error"]
            .as_str()
            .unwrap_or_default()
            .contains("connect")
    );
}

#[tokio::test]
async fn test_disconnect_unregisters() {
    let hub = spawn_hub(None).await;
    let mut first = connect(&hub).await;
    let _second = connect(&hub).await;
    wait_for_connections(&hub, 2).await;

    first.close(None).await.expect("close");
    wait_for_connections(&hub, 1).await;

    let health: Value = reqwest::get(hub.http_url("/health"))
        .await
        .expect("health")
        .json()
        .await
        .expect("body");
    assert_eq!(health["status"], "ok");
    assert!(health["metrics"]["broadcast_drops"].is_u64());
}

#[tokio::test]
async fn test_shutdown_closes_connection_during_slow_handler() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API_PATH}/isMeetingRunning")))
        .respond_with(
            xml_response(
                "<response><returncode>SUCCESS</returncode><running>true</running></response>",
            )
            .set_delay(Duration::from_secs(30)),
        )
        .mount(&api)
        .await;
    let hub = spawn_hub(Some(&api)).await;
    let mut client = connect(&hub).await;
    wait_for_connections(&hub, 1).await;

    send_event(&mut client, json!({ "event": "running", "data": { "id": "slow" } })).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    hub.shutdown.cancel();

    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match client.next().await {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "connection stayed open behind a slow handler");
}
