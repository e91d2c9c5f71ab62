//! Socket frames and per-topic payload schemas
//!
//! Every payload is validated against the schema of its topic before it
//! reaches the controller. Anything that does not fit is rejected with
//! `MalformedPayload` so the caller can drop and log it.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{MultimeterError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Frames
// ─────────────────────────────────────────────────────────────────────────────

/// One text frame received on the socket
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// `auth ok <token>`
    AuthOk,
    /// `auth failed`
    AuthFailed,
    /// `[path, payload]`
    Topic { path: String, payload: Value },
    /// `time`, `protocol`, `package` and anything else
    Other(String),
}

pub fn parse_frame(text: &str) -> Frame {
    if let Some(rest) = text.strip_prefix("auth ") {
        return if rest.starts_with("ok") {
            Frame::AuthOk
        } else {
            Frame::AuthFailed
        };
    }

    if text.starts_with('[') {
        if let Ok((path, payload)) = serde_json::from_str::<(String, Value)>(text) {
            return Frame::Topic { path, payload };
        }
    }

    Frame::Other(text.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Topics
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Console,
    Cpu,
    Code,
}

impl Topic {
    /// Subscribed on every connect, in this order
    pub const ALL: [Topic; 3] = [Topic::Console, Topic::Cpu, Topic::Code];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::Cpu => "cpu",
            Self::Code => "code",
        }
    }

    /// Topic from a full path such as `user:5a1b/console`
    pub fn from_path(path: &str) -> Option<Self> {
        let name = path.rsplit('/').next()?;
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn path_for(&self, user_id: &str) -> String {
        format!("user:{}/{}", user_id, self.name())
    }
}

/// User part of a topic path (`user:5a1b/console` -> `user:5a1b`)
pub fn path_user(path: &str) -> &str {
    path.rsplit_once('/').map(|(user, _)| user).unwrap_or("")
}

// ─────────────────────────────────────────────────────────────────────────────
// Console topic
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConsolePayload {
    #[serde(default)]
    pub messages: Option<ConsoleMessages>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConsoleMessages {
    #[serde(default)]
    pub log: Vec<String>,
    #[serde(default)]
    pub results: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Telemetry topic
// ─────────────────────────────────────────────────────────────────────────────

/// CPU/memory sample. `cpu` is `None` when the server sent something non-numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Telemetry {
    pub cpu: Option<u64>,
    pub memory: u64,
}

/// Integer reading of a JSON value: numbers and numeric strings, truncated
fn integer_reading(value: Option<&Value>) -> Option<u64> {
    let number = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (number.is_finite() && number >= 0.0).then(|| number.trunc() as u64)
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoding
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum TopicMessage {
    Console { user: String, payload: ConsolePayload },
    Telemetry(Telemetry),
    CodeUpdated,
}

fn malformed(topic: Topic, details: impl Into<String>) -> MultimeterError {
    MultimeterError::MalformedPayload {
        topic: topic.name().to_string(),
        details: details.into(),
    }
}

/// Validate a payload against the schema of its topic
pub fn decode(topic: Topic, path: &str, payload: Value) -> Result<TopicMessage> {
    match topic {
        Topic::Console => {
            if !payload.is_object() {
                return Err(malformed(topic, "expected an object"));
            }
            let payload: ConsolePayload =
                serde_json::from_value(payload).map_err(|e| malformed(topic, e.to_string()))?;
            Ok(TopicMessage::Console {
                user: path_user(path).to_string(),
                payload,
            })
        }
        Topic::Cpu => {
            let object = payload
                .as_object()
                .ok_or_else(|| malformed(topic, "expected an object"))?;
            let memory = integer_reading(object.get("memory"))
                .ok_or_else(|| malformed(topic, "missing or non-numeric 'memory'"))?;
            Ok(TopicMessage::Telemetry(Telemetry {
                cpu: integer_reading(object.get("cpu")),
                memory,
            }))
        }
        Topic::Code => Ok(TopicMessage::CodeUpdated),
    }
}
