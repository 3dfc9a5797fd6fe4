use convo_agent_interface::AgentActivity;

use crate::state::ConnectionState;

/// Why a session ended. One session ends exactly once, with one reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub enum EndReason {
    UserStop,
    RemoteQuit,
    JoinTimeout,
    DurationLimit,
    TransportFailure,
    AgentFailure,
}

#[derive(Debug, Clone, serde::Serialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(tag = "type")]
pub enum SessionLifecycleEvent {
    #[serde(rename = "sessionConnecting")]
    Connecting { session_id: String },

    #[serde(rename = "sessionConnected")]
    Connected { session_id: String },

    /// Transport dropped mid-call and is trying to come back.
    #[serde(rename = "sessionInterrupted")]
    Interrupted { session_id: String },

    /// Transport recovered after an interruption.
    #[serde(rename = "sessionResumed")]
    Resumed { session_id: String },

    #[serde(rename = "sessionEnded")]
    Ended {
        session_id: String,
        reason: EndReason,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

/// Connection state and agent activity, published together so observers
/// never see a torn pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct CompositeState {
    pub connection: ConnectionState,
    pub activity: AgentActivity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub enum TimerKind {
    JoinTimeout,
    Ping,
    UsageDuration,
}

/// Display urgency for the usage-duration readout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub enum Urgency {
    Normal,
    Warning,
    Critical,
}

/// One second-granularity timer update. `seconds` is remaining time for a
/// limited session, elapsed time for an unlimited one.
#[derive(Debug, Clone, Copy, serde::Serialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct TimerTick {
    pub kind: TimerKind,
    pub seconds: u64,
    pub urgency: Urgency,
}

/// Non-fatal agent-side reports forwarded to the observer: module errors
/// and performance metrics from the data channel.
#[derive(Debug, Clone, serde::Serialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(tag = "type")]
pub enum AgentNotice {
    #[serde(rename = "moduleError")]
    ModuleError {
        module: String,
        code: i64,
        message: String,
    },

    #[serde(rename = "metric")]
    Metric {
        module: String,
        name: String,
        latency_ms: f64,
    },
}
