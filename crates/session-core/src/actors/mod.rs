mod root;
mod session;

use std::sync::Arc;

use convo_agent_control::AgentControl;
use convo_transcript::RenderMode;

use crate::runtime::SessionRuntime;

pub use root::{RootActor, RootArgs, RootMsg, SessionPhase};
pub use session::{SessionActor, SessionMsg};

/// Everything needed to run one call session.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionParams {
    pub session_id: String,
    /// Transport room both sides join.
    pub channel: String,
    pub app_id: String,
    /// Transport participant id of the local user.
    pub local_participant: String,
    /// Transport participant id the agent joins with.
    pub agent_participant: String,
    /// Present iff the avatar/digital-human feature is enabled; makes the
    /// join barrier require both remote parties.
    #[serde(default)]
    pub avatar_participant: Option<String>,
    #[serde(default)]
    pub preset_name: Option<String>,
    pub render_mode: RenderMode,
    /// `None` runs unlimited with an elapsed-time display.
    #[serde(default)]
    pub duration_limit_secs: Option<u64>,
    #[serde(default = "default_join_timeout_secs")]
    pub join_timeout_secs: u64,
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
}

impl SessionParams {
    pub fn avatar_enabled(&self) -> bool {
        self.avatar_participant.is_some()
    }
}

fn default_join_timeout_secs() -> u64 {
    10
}

fn default_ping_interval_secs() -> u64 {
    10
}

/// Shared dependencies handed to the session actor.
#[derive(Clone)]
pub struct SessionContext {
    pub runtime: Arc<dyn SessionRuntime>,
    pub control: Arc<dyn AgentControl>,
    pub params: SessionParams,
}

pub(crate) fn session_span(session_id: &str) -> tracing::Span {
    tracing::info_span!("session", session_id = %session_id)
}
