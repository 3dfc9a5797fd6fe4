//! Data-channel message types.
//!
//! Every payload carried over the agent data channel is a JSON object whose
//! `object` field names the message kind. The union below mirrors the wire
//! protocol one-to-one; anything with an unrecognized `object` fails
//! deserialization and is dropped by the caller.

/// Who produced a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Agent,
}

/// Agent activity reported by the `message.state` channel message.
/// Unrecognized values decode to `Unknown` instead of failing the whole
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "lowercase", from = "String")]
pub enum AgentActivity {
    Silent,
    Listening,
    Thinking,
    Speaking,
    Unknown,
}

impl From<String> for AgentActivity {
    fn from(value: String) -> Self {
        match value.as_str() {
            "silent" => Self::Silent,
            "listening" => Self::Listening,
            "thinking" => Self::Thinking,
            "speaking" => Self::Speaking,
            _ => Self::Unknown,
        }
    }
}

/// Lifecycle of one conversation turn, as encoded in the wire-level
/// `turn_status` integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    InProgress,
    End,
    Interrupted,
    Unknown,
}

impl TurnStatus {
    /// 0 = in progress, 1 = ended gracefully, 2 = interrupted. Anything else
    /// is `Unknown` and the message must be discarded.
    pub fn from_wire(value: i64) -> Self {
        match value {
            0 => Self::InProgress,
            1 => Self::End,
            2 => Self::Interrupted,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(tag = "object")]
pub enum ChannelMessage {
    #[serde(rename = "assistant.transcription")]
    AssistantTranscription {
        turn_id: i64,
        #[serde(default)]
        user_id: Option<String>,
        text: String,
        turn_status: i64,
        #[serde(default)]
        start_ms: i64,
        #[serde(default)]
        send_ts: i64,
    },

    #[serde(rename = "user.transcription")]
    UserTranscription {
        turn_id: i64,
        #[serde(default)]
        user_id: Option<String>,
        text: String,
        #[serde(rename = "final", default)]
        is_final: bool,
        #[serde(default)]
        start_ms: i64,
        #[serde(default)]
        send_ts: i64,
    },

    #[serde(rename = "message.interrupt")]
    Interrupt {
        turn_id: i64,
        #[serde(default)]
        start_ms: i64,
    },

    #[serde(rename = "message.state")]
    State {
        state: AgentActivity,
        #[serde(default)]
        turn_id: i64,
        #[serde(default)]
        ts: i64,
    },

    #[serde(rename = "message.error")]
    ModuleError {
        #[serde(default)]
        module: String,
        code: i64,
        message: String,
        #[serde(default)]
        turn_id: i64,
        #[serde(default)]
        send_ts: i64,
    },

    #[serde(rename = "message.metrics")]
    Metric {
        #[serde(default)]
        module: String,
        metric_name: String,
        #[serde(default)]
        latency_ms: f64,
        #[serde(default)]
        turn_id: i64,
        #[serde(default)]
        send_ts: i64,
    },
}

/// One incremental delivery of a turn's text — the reconciler's sole input.
///
/// Fragments arrive repeatedly for the same `(turn_id, speaker)` pair while
/// a turn is being produced; later arrivals supersede earlier ones.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct TranscriptFragment {
    pub turn_id: i64,
    pub speaker: Speaker,
    pub text: String,
    pub is_final: bool,
    pub is_interrupted: bool,
    pub timestamp_ms: i64,
}
