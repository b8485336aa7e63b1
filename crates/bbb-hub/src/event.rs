/*
[INPUT]:  JSON `{event, data}` frames and typed API results
[OUTPUT]: Typed request payloads per tag and typed replies
[POS]:    Data layer - wire event model shared by all endpoints
[UPDATE]: When adding event tags or changing reply shapes
*/

use bbb_adapter::{Attendee, CreateOptions, JoinOptions, Meeting, Recording};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{HubError, Result};

/// Reserved payload key carrying the transaction id
pub const TXID_KEY: &str = "__txid";

/// Untyped payload as it arrives on the wire
pub type Payload = Map<String, Value>;

/// A tagged message with an open payload.
///
/// Only used at the decoding boundary; handlers see typed requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEvent {
    pub event: String,
    #[serde(default)]
    pub data: Payload,
}

impl WireEvent {
    pub fn new(event: impl Into<String>, data: Payload) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    pub fn txid(&self) -> Option<&str> {
        self.data.get(TXID_KEY).and_then(Value::as_str)
    }

    pub fn set_txid(&mut self, txid: impl Into<String>) {
        self.data.insert(TXID_KEY.to_string(), Value::String(txid.into()));
    }

    /// Decode the payload into the request type registered for the tag
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.data.clone())).map_err(|source| {
            HubError::InvalidPayload {
                tag: self.event.clone(),
                source,
            }
        })
    }
}

// Requests

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConnectRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub secret: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CreateRequest {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub options: CreateOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JoinRequest {
    #[serde(default, alias = "fullName")]
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub password: String,
    #[serde(flatten)]
    pub options: JoinOptions,
}

/// Meeting id plus the password the operation needs
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MeetingAuth {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RunningRequest {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MeetingsRequest {}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecordingsRequest {
    #[serde(default)]
    pub meetings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PublishRecordingsRequest {
    #[serde(default)]
    pub recordings: Vec<String>,
    #[serde(default = "default_publish")]
    pub publish: bool,
}

fn default_publish() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeleteRecordingsRequest {
    #[serde(default)]
    pub recordings: Vec<String>,
}

// Replies

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_FAILURE: &str = "failure";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedReply {
    pub status: String,
    pub version: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReply {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinUrlReply {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndedReply {
    pub ended: bool,
    pub id: String,
    /// Set when the end call itself could not reach the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningReply {
    pub running: bool,
}

/// Short meeting view used by `create.success` and `meetings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingSummary {
    pub id: String,
    /// Unix seconds
    pub created: i64,
    #[serde(rename = "attendeePW")]
    pub attendee_pw: String,
    #[serde(rename = "moderatorPW")]
    pub moderator_pw: String,
    #[serde(rename = "forcedEnd")]
    pub forced_end: bool,
}

impl From<&Meeting> for MeetingSummary {
    fn from(meeting: &Meeting) -> Self {
        Self {
            id: meeting.id.clone(),
            created: meeting.create_time.timestamp(),
            attendee_pw: meeting.attendee_pw.clone(),
            moderator_pw: meeting.moderator_pw.clone(),
            forced_end: meeting.forced_end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendeeSummary {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub name: String,
    pub role: String,
}

impl From<&Attendee> for AttendeeSummary {
    fn from(attendee: &Attendee) -> Self {
        Self {
            user_id: attendee.user_id.clone(),
            name: attendee.name.clone(),
            role: attendee.role.clone(),
        }
    }
}

/// Full meeting view used by `info.success`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingDetails {
    pub id: String,
    pub name: String,
    pub created: i64,
    #[serde(rename = "attendeePW")]
    pub attendee_pw: String,
    #[serde(rename = "moderatorPW")]
    pub moderator_pw: String,
    pub running: bool,
    pub recording: bool,
    pub forced_end: bool,
    pub start_time: i64,
    pub end_time: i64,
    pub num_users: u32,
    pub max_users: u32,
    pub num_mod: u32,
    pub attendees: Vec<AttendeeSummary>,
}

impl From<&Meeting> for MeetingDetails {
    fn from(meeting: &Meeting) -> Self {
        Self {
            id: meeting.id.clone(),
            name: meeting.name.clone(),
            created: meeting.create_time.timestamp(),
            attendee_pw: meeting.attendee_pw.clone(),
            moderator_pw: meeting.moderator_pw.clone(),
            running: meeting.running,
            recording: meeting.recording,
            forced_end: meeting.forced_end,
            start_time: meeting.start_time.timestamp(),
            end_time: meeting.end_time.timestamp(),
            num_users: meeting.participant_count,
            max_users: meeting.max_users,
            num_mod: meeting.moderator_count,
            attendees: meeting.attendees.iter().map(AttendeeSummary::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingsReply {
    pub meetings: Vec<MeetingSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSummary {
    #[serde(rename = "type")]
    pub format: String,
    pub url: String,
    pub len: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingSummary {
    #[serde(rename = "recordId")]
    pub record_id: String,
    #[serde(rename = "meetingId")]
    pub meeting_id: String,
    pub name: String,
    pub published: bool,
    #[serde(rename = "startTime")]
    pub start_time: i64,
    #[serde(rename = "endTime")]
    pub end_time: i64,
    pub playback: PlaybackSummary,
}

impl From<&Recording> for RecordingSummary {
    fn from(recording: &Recording) -> Self {
        Self {
            record_id: recording.record_id.clone(),
            meeting_id: recording.meeting_id.clone(),
            name: recording.name.clone(),
            published: recording.published,
            start_time: recording.start_time.timestamp(),
            end_time: recording.end_time.timestamp(),
            playback: PlaybackSummary {
                format: recording.playback.format.clone(),
                url: recording.playback.url.clone(),
                len: recording.playback.length,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingsReply {
    pub recordings: Vec<RecordingSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedReply {
    pub recordings: Vec<String>,
    pub published: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletedReply {
    pub recordings: Vec<String>,
    pub deleted: bool,
}

/// Every message the hub sends, serialized as `{event, data}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum Reply {
    #[serde(rename = "connected")]
    Connected(ConnectedReply),
    #[serde(rename = "create.success")]
    CreateSuccess(MeetingSummary),
    #[serde(rename = "create.fail")]
    CreateFail(FailureReply),
    #[serde(rename = "joinURL")]
    JoinUrl(JoinUrlReply),
    #[serde(rename = "end")]
    Ended(EndedReply),
    #[serde(rename = "running")]
    Running(RunningReply),
    #[serde(rename = "info.success")]
    InfoSuccess(MeetingDetails),
    #[serde(rename = "info.fail")]
    InfoFail(FailureReply),
    #[serde(rename = "meetings")]
    Meetings(MeetingsReply),
    #[serde(rename = "recordings")]
    Recordings(RecordingsReply),
    #[serde(rename = "recordings.publish")]
    Published(PublishedReply),
    #[serde(rename = "recordings.delete")]
    Deleted(DeletedReply),
    #[serde(rename = "error")]
    Error(FailureReply),
}

impl Reply {
    pub fn error(message: impl Into<String>) -> Self {
        Reply::Error(FailureReply {
            error: message.into(),
        })
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Reply::Connected(_) => "connected",
            Reply::CreateSuccess(_) => "create.success",
            Reply::CreateFail(_) => "create.fail",
            Reply::JoinUrl(_) => "joinURL",
            Reply::Ended(_) => "end",
            Reply::Running(_) => "running",
            Reply::InfoSuccess(_) => "info.success",
            Reply::InfoFail(_) => "info.fail",
            Reply::Meetings(_) => "meetings",
            Reply::Recordings(_) => "recordings",
            Reply::Published(_) => "recordings.publish",
            Reply::Deleted(_) => "recordings.delete",
            Reply::Error(_) => "error",
        }
    }
}

/// A queued reply plus the transaction id of the request that caused it.
///
/// The id stays in-process; serializing an `Outbound` writes only the reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub reply: Reply,
    pub txid: Option<String>,
}

impl Outbound {
    pub fn new(reply: Reply, txid: Option<String>) -> Self {
        Self { reply, txid }
    }

    /// Reply that belongs to no transaction
    pub fn untracked(reply: Reply) -> Self {
        Self { reply, txid: None }
    }

    pub fn matches(&self, txid: &str) -> bool {
        self.txid.as_deref() == Some(txid)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.reply)
    }
}
