/*
[INPUT]:  Optional per-operation settings (create, join)
[OUTPUT]: Sorted query parameter sets with defaulted fields omitted
[POS]:    Data layer - option structs and their wire field tables
[UPDATE]: When the server adds or renames create/join parameters
*/

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Ordered multi-valued query parameters.
///
/// Keys are kept sorted so the encoded string is deterministic, which
/// matters for the checksum.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: BTreeMap<String, Vec<String>>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Params::append`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(key, value);
        self
    }

    /// Add a value, keeping any existing values for the key
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// Replace all values for the key
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), vec![value.into()]);
    }

    /// Merge another set into this one; duplicate keys accumulate values
    pub fn merge(mut self, other: Params) -> Self {
        for (key, values) in other.values {
            self.values.entry(key).or_default().extend(values);
        }
        self
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// First value for the key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().flat_map(|(key, values)| {
            values
                .iter()
                .map(move |value| (key.as_str(), value.as_str()))
        })
    }

    /// Form-urlencode, keys sorted, values in insertion order
    pub fn encode(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.iter() {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

/// A single option value read out of an options struct
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Unsigned(u64),
    Duration(Duration),
    Timestamp(Option<DateTime<Utc>>),
}

/// When boolean fields are emitted, decided per operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagRule {
    WhenTrue,
    Always,
}

/// One row of an operation's field table
pub struct FieldDescriptor<T> {
    pub key: &'static str,
    pub read: fn(&T) -> FieldValue,
}

/// Fixed, ordered field table for one operation
pub struct OptionSchema<T: 'static> {
    pub flags: FlagRule,
    pub fields: &'static [FieldDescriptor<T>],
}

impl<T> OptionSchema<T> {
    /// Encode `value`, skipping every field whose value is its default
    pub fn encode(&self, value: &T) -> Params {
        let mut params = Params::new();
        for field in self.fields {
            if let Some(encoded) = emit((field.read)(value), self.flags) {
                params.set(field.key, encoded);
            }
        }
        params
    }
}

fn emit(value: FieldValue, flags: FlagRule) -> Option<String> {
    match value {
        FieldValue::Text(text) => (!text.is_empty()).then_some(text),
        FieldValue::Flag(flag) => match flags {
            FlagRule::WhenTrue => flag.then(|| "true".to_string()),
            FlagRule::Always => Some(flag.to_string()),
        },
        FieldValue::Unsigned(n) => (n > 0).then(|| n.to_string()),
        FieldValue::Duration(d) => (d.as_secs() > 0).then(|| d.as_secs().to_string()),
        FieldValue::Timestamp(ts) => ts.map(|ts| ts.timestamp().to_string()),
    }
}

/// A document preloaded into the meeting's presentation module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Presentation {
    pub name: String,
    pub url: String,
    /// Inline document body (base64), used when `url` is empty
    pub content: String,
}

/// Optional parameters for `create`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateOptions {
    pub name: String,
    #[serde(rename = "attendeePW")]
    pub attendee_pw: String,
    #[serde(rename = "moderatorPW")]
    pub moderator_pw: String,
    pub welcome: String,
    #[serde(rename = "dialNumber")]
    pub dial_number: String,
    #[serde(rename = "voiceBridge")]
    pub voice_bridge: String,
    #[serde(rename = "webVoice")]
    pub web_voice: String,
    #[serde(rename = "logoutURL")]
    pub logout_url: String,
    #[serde(rename = "maxParticipants")]
    pub max_participants: u32,
    pub record: bool,
    #[serde(deserialize_with = "duration_from_secs", serialize_with = "duration_to_secs")]
    pub duration: Duration,
    /// Sent as an XML request body, never as query parameters
    pub documents: Vec<Presentation>,
}

impl CreateOptions {
    #[rustfmt::skip]
    pub const SCHEMA: OptionSchema<CreateOptions> = OptionSchema {
        flags: FlagRule::WhenTrue,
        fields: &[
            FieldDescriptor { key: "name", read: |o| FieldValue::Text(o.name.clone()) },
            FieldDescriptor {
                key: "attendeePW",
                read: |o| FieldValue::Text(o.attendee_pw.clone()),
            },
            FieldDescriptor {
                key: "moderatorPW",
                read: |o| FieldValue::Text(o.moderator_pw.clone()),
            },
            FieldDescriptor { key: "welcome", read: |o| FieldValue::Text(o.welcome.clone()) },
            FieldDescriptor {
                key: "dialNumber",
                read: |o| FieldValue::Text(o.dial_number.clone()),
            },
            FieldDescriptor {
                key: "voiceBridge",
                read: |o| FieldValue::Text(o.voice_bridge.clone()),
            },
            FieldDescriptor { key: "webVoice", read: |o| FieldValue::Text(o.web_voice.clone()) },
            FieldDescriptor { key: "logoutURL", read: |o| FieldValue::Text(o.logout_url.clone()) },
            FieldDescriptor {
                key: "maxParticipants",
                read: |o| FieldValue::Unsigned(u64::from(o.max_participants)),
            },
            FieldDescriptor { key: "record", read: |o| FieldValue::Flag(o.record) },
            FieldDescriptor { key: "duration", read: |o| FieldValue::Duration(o.duration) },
        ],
    };

    pub fn encode(&self) -> Params {
        Self::SCHEMA.encode(self)
    }
}

/// Optional parameters for `join`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinOptions {
    #[serde(rename = "createTime", with = "chrono::serde::ts_seconds_option")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "webVoiceConf")]
    pub web_voice_conf: String,
}

impl JoinOptions {
    #[rustfmt::skip]
    pub const SCHEMA: OptionSchema<JoinOptions> = OptionSchema {
        flags: FlagRule::Always,
        fields: &[
            FieldDescriptor { key: "createTime", read: |o| FieldValue::Timestamp(o.create_time) },
            FieldDescriptor { key: "userID", read: |o| FieldValue::Text(o.user_id.clone()) },
            FieldDescriptor {
                key: "webVoiceConf",
                read: |o| FieldValue::Text(o.web_voice_conf.clone()),
            },
        ],
    };

    pub fn encode(&self) -> Params {
        Self::SCHEMA.encode(self)
    }
}

fn duration_from_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_secs)
}

fn duration_to_secs<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_secs())
}
