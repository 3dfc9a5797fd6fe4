pub mod actors;
mod error;
pub mod events;
pub mod runtime;
pub mod state;
pub mod timers;

use std::sync::Arc;

use convo_agent_control::AgentControl;
use ractor::{Actor, ActorRef};
use tokio::task::JoinHandle;

pub use actors::{
    RootActor, RootArgs, RootMsg, SessionActor, SessionContext, SessionMsg, SessionParams,
    SessionPhase,
};
pub use error::{Error, Result};
pub use events::{
    AgentNotice, CompositeState, EndReason, SessionLifecycleEvent, TimerKind, TimerTick, Urgency,
};
pub use runtime::SessionRuntime;
pub use state::{ConnectionState, ParticipantRole, StateMachine};
pub use timers::{TimerSlot, UsageClock, UsageTick};

/// Spawn the root coordinator. One per process; it owns at most one live
/// session at a time.
pub async fn spawn_root(
    runtime: Arc<dyn SessionRuntime>,
    control: Arc<dyn AgentControl>,
) -> Result<(ActorRef<RootMsg>, JoinHandle<()>)> {
    let (root, handle) = Actor::spawn(
        Some(RootActor::name()),
        RootActor,
        RootArgs { runtime, control },
    )
    .await?;
    Ok((root, handle))
}

/// Start a session through the root coordinator.
pub async fn start_session(root: &ActorRef<RootMsg>, params: SessionParams) -> Result<()> {
    let started = ractor::call!(root, RootMsg::StartSession, params)
        .map_err(|error| Error::Messaging(error.to_string()))?;
    if started {
        Ok(())
    } else {
        Err(Error::SessionAlreadyRunning)
    }
}

/// Ask the live session (if any) to stop and tear down.
pub async fn stop_session(root: &ActorRef<RootMsg>) -> Result<()> {
    ractor::call!(root, RootMsg::StopSession)
        .map_err(|error| Error::Messaging(error.to_string()))
}
