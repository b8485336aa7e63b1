/*
[INPUT]:  Raw XML response bodies from the API
[OUTPUT]: Validated envelopes and typed Meeting/Recording values
[POS]:    XML layer - response decoding and status validation
[UPDATE]: When the server's response schema changes
*/

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::http::{BbbError, Result};
use crate::types::{Attendee, Meeting, Playback, Recording};

/// Return code of a successful call
pub const RETURN_CODE_SUCCESS: &str = "SUCCESS";

/// Server timestamps are divided by this to get whole seconds.
///
/// The server reports epoch values in sub-second ticks; the conversion
/// truncates toward zero and drops the remainder. Recording start and end
/// times use the same unit as meeting times and go through the same
/// conversion rather than being read as plain seconds.
pub const SERVER_TICKS_PER_SECOND: i64 = 1000;

/// Convert a raw server timestamp into a second-precision instant.
///
/// Values outside the representable range fall back to the epoch with a warning.
pub fn server_epoch_to_utc(raw: i64) -> DateTime<Utc> {
    match DateTime::from_timestamp(raw / SERVER_TICKS_PER_SECOND, 0) {
        Some(instant) => instant,
        None => {
            warn!(raw, "server timestamp out of range; using epoch");
            DateTime::<Utc>::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EnvelopeXml {
    returncode: String,
    #[serde(rename = "messageKey")]
    message_key: String,
    message: String,
}

/// Validate the top-level status; non-SUCCESS becomes [`BbbError::Protocol`]
pub fn check_envelope(body: &str) -> Result<()> {
    let envelope: EnvelopeXml = quick_xml::de::from_str(body)?;
    if envelope.returncode == RETURN_CODE_SUCCESS {
        return Ok(());
    }

    debug!(
        return_code = %envelope.returncode,
        message_key = %envelope.message_key,
        "api returned non-success envelope"
    );
    Err(BbbError::protocol(
        envelope.returncode,
        envelope.message_key,
        envelope.message,
    ))
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    check_envelope(body)?;
    Ok(quick_xml::de::from_str(body)?)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AttendeeXml {
    #[serde(rename = "userID")]
    user_id: String,
    #[serde(rename = "fullName")]
    full_name: String,
    role: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AttendeesXml {
    attendee: Vec<AttendeeXml>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MeetingXml {
    #[serde(rename = "meetingID")]
    meeting_id: String,
    #[serde(rename = "meetingName")]
    meeting_name: String,
    #[serde(rename = "createTime")]
    create_time: i64,
    #[serde(rename = "voiceBridge")]
    voice_bridge: i64,
    #[serde(rename = "attendeePW")]
    attendee_pw: String,
    #[serde(rename = "moderatorPW")]
    moderator_pw: String,
    running: bool,
    recording: bool,
    #[serde(rename = "hasBeenForciblyEnded")]
    forced_end: bool,
    #[serde(rename = "startTime")]
    start_time: i64,
    #[serde(rename = "endTime")]
    end_time: i64,
    #[serde(rename = "participantCount")]
    participant_count: u32,
    #[serde(rename = "moderatorCount")]
    moderator_count: u32,
    #[serde(rename = "maxUsers")]
    max_users: u32,
    attendees: AttendeesXml,
}

impl From<MeetingXml> for Meeting {
    fn from(xml: MeetingXml) -> Self {
        Meeting {
            id: xml.meeting_id,
            name: xml.meeting_name,
            create_time: server_epoch_to_utc(xml.create_time),
            voice_bridge: xml.voice_bridge,
            attendee_pw: xml.attendee_pw,
            moderator_pw: xml.moderator_pw,
            running: xml.running,
            recording: xml.recording,
            forced_end: xml.forced_end,
            start_time: server_epoch_to_utc(xml.start_time),
            end_time: server_epoch_to_utc(xml.end_time),
            participant_count: xml.participant_count,
            moderator_count: xml.moderator_count,
            max_users: xml.max_users,
            attendees: xml
                .attendees
                .attendee
                .into_iter()
                .map(|a| Attendee {
                    user_id: a.user_id,
                    name: a.full_name,
                    role: a.role,
                })
                .collect(),
        }
    }
}

/// Decode a `create` response
pub fn decode_create(body: &str) -> Result<Meeting> {
    decode::<MeetingXml>(body).map(Meeting::from)
}

/// Decode a `getMeetingInfo` response, attendees included
pub fn decode_meeting_info(body: &str) -> Result<Meeting> {
    decode::<MeetingXml>(body).map(Meeting::from)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MeetingListXml {
    meeting: Vec<MeetingXml>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MeetingsXml {
    meetings: MeetingListXml,
}

/// Decode a `getMeetings` response; no `<meeting>` elements means an empty list
pub fn decode_meetings(body: &str) -> Result<Vec<Meeting>> {
    let xml: MeetingsXml = decode(body)?;
    Ok(xml.meetings.meeting.into_iter().map(Meeting::from).collect())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FormatXml {
    #[serde(rename = "type")]
    kind: String,
    url: String,
    length: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlaybackXml {
    format: Vec<FormatXml>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RecordingXml {
    #[serde(rename = "recordID", alias = "recordId")]
    record_id: String,
    #[serde(rename = "meetingID", alias = "meetingId")]
    meeting_id: String,
    name: String,
    published: bool,
    #[serde(rename = "startTime")]
    start_time: i64,
    #[serde(rename = "endTime")]
    end_time: i64,
    metadata: BTreeMap<String, String>,
    playback: PlaybackXml,
}

impl From<RecordingXml> for Recording {
    fn from(xml: RecordingXml) -> Self {
        let playback = xml
            .playback
            .format
            .into_iter()
            .next()
            .map(|f| Playback {
                format: f.kind,
                url: f.url,
                length: f.length,
            })
            .unwrap_or_default();

        Recording {
            record_id: xml.record_id,
            meeting_id: xml.meeting_id,
            name: xml.name,
            published: xml.published,
            start_time: server_epoch_to_utc(xml.start_time),
            end_time: server_epoch_to_utc(xml.end_time),
            metadata: xml.metadata,
            playback,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RecordingListXml {
    recording: Vec<RecordingXml>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RecordingsXml {
    recordings: RecordingListXml,
}

/// Decode a `getRecordings` response; no `<recording>` elements means an empty list
pub fn decode_recordings(body: &str) -> Result<Vec<Recording>> {
    let xml: RecordingsXml = decode(body)?;
    Ok(xml
        .recordings
        .recording
        .into_iter()
        .map(Recording::from)
        .collect())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RunningXml {
    running: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PublishedXml {
    published: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DeletedXml {
    deleted: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VersionXml {
    version: String,
}

/// `isMeetingRunning` → `<running>`
pub fn decode_running(body: &str) -> Result<bool> {
    decode::<RunningXml>(body).map(|xml| xml.running)
}

/// `publishRecordings` → `<published>`
pub fn decode_published(body: &str) -> Result<bool> {
    decode::<PublishedXml>(body).map(|xml| xml.published)
}

/// `deleteRecordings` → `<deleted>`
pub fn decode_deleted(body: &str) -> Result<bool> {
    decode::<DeletedXml>(body).map(|xml| xml.deleted)
}

/// API root → `<version>`
pub fn decode_version(body: &str) -> Result<String> {
    decode::<VersionXml>(body).map(|xml| xml.version)
}
