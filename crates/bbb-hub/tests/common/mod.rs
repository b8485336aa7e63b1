/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Running hub instances, mock API servers and WebSocket clients
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for bbb-hub tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use bbb_hub::config::ServerConfig;
use bbb_hub::{AppState, HubConfig, Reply};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const API_PATH: &str = "/bigbluebutton/api";
pub const SECRET: &str = "secret";

pub struct TestHub {
    pub addr: SocketAddr,
    pub shutdown: CancellationToken,
}

impl TestHub {
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn http_url(&self, route: &str) -> String {
        format!("http://{}{}", self.addr, route)
    }
}

impl Drop for TestHub {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

pub fn xml_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/xml")
}

/// Mock API server answering create for any meeting id
pub async fn setup_mock_api() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API_PATH}/create")))
        .respond_with(xml_response(
            "<response><returncode>SUCCESS</returncode><meetingID>demo</meetingID>\
             <attendeePW>ap</attendeePW><moderatorPW>mp</moderatorPW>\
             <createTime>1389000000000</createTime></response>",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{API_PATH}/isMeetingRunning")))
        .respond_with(xml_response(
            "<response><returncode>SUCCESS</returncode><running>true</running></response>",
        ))
        .mount(&server)
        .await;
    server
}

pub fn api_url(server: &MockServer) -> String {
    format!("{}{API_PATH}", server.uri())
}

/// Start a hub on an ephemeral port with `server` as the default session
pub async fn spawn_hub(server: Option<&MockServer>) -> TestHub {
    let config = HubConfig {
        listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        reply_timeout_secs: 5,
        server: server.map(|server| ServerConfig {
            url: api_url(server),
            secret: SECRET.to_string(),
        }),
        ..HubConfig::default()
    };

    let listener = TcpListener::bind(config.listen_addr).await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let shutdown = CancellationToken::new();
    let state = AppState::from_config(config, shutdown.clone()).expect("hub state");
    tokio::spawn(bbb_hub::server::serve(listener, state));

    TestHub { addr, shutdown }
}

pub async fn connect(hub: &TestHub) -> WsClient {
    let (client, _response) = connect_async(hub.ws_url()).await.expect("ws connect");
    client
}

/// Poll /health until the hub reports `expected` connections
pub async fn wait_for_connections(hub: &TestHub, expected: u64) {
    for _ in 0..100 {
        let health: Value = reqwest::get(hub.http_url("/health"))
            .await
            .expect("health request")
            .json()
            .await
            .expect("health body");
        if health["connections"].as_u64() == Some(expected) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("hub never reached {expected} connections");
}

pub async fn send_event(client: &mut WsClient, event: Value) {
    client
        .send(Message::Text(event.to_string().into()))
        .await
        .expect("ws send");
}

/// Next text frame decoded as a reply; fails after two seconds
pub async fn next_reply(client: &mut WsClient) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("reply in time")
            .expect("stream open")
            .expect("frame");
        if let Message::Text(text) = frame {
            let value: Value = serde_json::from_str(text.as_str()).expect("json reply");
            let _typed: Reply = serde_json::from_value(value.clone()).expect("typed reply");
            return value;
        }
    }
}
