/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for bbb-adapter tests

use std::time::Duration;

use bbb_adapter::{BbbClient, ClientConfig};
use wiremock::{MockServer, ResponseTemplate};

pub const TEST_SECRET: &str = "secret";

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at `{server}/bigbluebutton/api/` with a short end-poll budget
pub fn client_for(server: &MockServer) -> BbbClient {
    let config = ClientConfig {
        end_poll_attempts: 2,
        end_poll_interval: Duration::from_millis(10),
        ..ClientConfig::default()
    };
    BbbClient::with_config(
        &format!("{}/bigbluebutton/api/", server.uri()),
        TEST_SECRET,
        config,
    )
    .expect("client init")
}

/// 200 response carrying an XML body
pub fn xml_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/xml")
}

/// Minimal SUCCESS meeting document
#[allow(dead_code)]
pub fn meeting_xml(meeting_id: &str) -> String {
    format!(
        "<response><returncode>SUCCESS</returncode>\
         <meetingID>{meeting_id}</meetingID><meetingName>Demo</meetingName>\
         <createTime>1389000000999</createTime><voiceBridge>70001</voiceBridge>\
         <attendeePW>ap</attendeePW><moderatorPW>mp</moderatorPW>\
         <running>true</running><participantCount>2</participantCount>\
         <attendees>\
         <attendee><userID>u1</userID><fullName>Alice</fullName><role>MODERATOR</role></attendee>\
         <attendee><userID>u2</userID><fullName>Bob</fullName><role>VIEWER</role></attendee>\
         </attendees></response>"
    )
}
