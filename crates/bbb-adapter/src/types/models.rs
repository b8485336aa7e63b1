/*
[INPUT]:  Decoded API responses
[OUTPUT]: Meeting, Attendee and Recording value types
[POS]:    Data layer - domain models returned by the API client
[UPDATE]: When the server's response schema changes
*/

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A conference room as reported by create/getMeetingInfo/getMeetings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: String,
    pub name: String,
    pub create_time: DateTime<Utc>,
    pub voice_bridge: i64,
    pub attendee_pw: String,
    pub moderator_pw: String,
    pub running: bool,
    pub recording: bool,
    pub forced_end: bool,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub participant_count: u32,
    pub moderator_count: u32,
    pub max_users: u32,
    /// In server order
    pub attendees: Vec<Attendee>,
}

/// A user currently inside a meeting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub user_id: String,
    pub name: String,
    pub role: String,
}

/// A processed recording of a past meeting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub record_id: String,
    pub meeting_id: String,
    pub name: String,
    pub published: bool,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub metadata: BTreeMap<String, String>,
    pub playback: Playback,
}

/// How a recording can be played back
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playback {
    /// Format tag, e.g. "presentation"
    pub format: String,
    pub url: String,
    /// Length as reported by the server (minutes)
    pub length: u32,
}
