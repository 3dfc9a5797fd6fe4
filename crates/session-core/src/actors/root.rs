use std::sync::Arc;

use convo_agent_control::AgentControl;
use ractor::{Actor, ActorCell, ActorProcessingErr, ActorRef, RpcReplyPort, SupervisionEvent};
use tracing::Instrument;

use crate::actors::{SessionActor, SessionContext, SessionMsg, SessionParams, session_span};
use crate::events::{EndReason, SessionLifecycleEvent};
use crate::runtime::SessionRuntime;

/// Coarse lifecycle phase exposed to the embedding layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    Inactive,
    Active,
}

pub enum RootMsg {
    StartSession(SessionParams, RpcReplyPort<bool>),
    StopSession(RpcReplyPort<()>),
    GetPhase(RpcReplyPort<SessionPhase>),
}

pub struct RootArgs {
    pub runtime: Arc<dyn SessionRuntime>,
    pub control: Arc<dyn AgentControl>,
}

pub struct RootState {
    runtime: Arc<dyn SessionRuntime>,
    control: Arc<dyn AgentControl>,
    session_id: Option<String>,
    session: Option<ActorCell>,
}

/// Owns at most one live session actor and reports its demise through the
/// runtime if it dies without a graceful end.
pub struct RootActor;

impl RootActor {
    pub fn name() -> ractor::ActorName {
        "agent_session_root".into()
    }
}

#[ractor::async_trait]
impl Actor for RootActor {
    type Msg = RootMsg;
    type State = RootState;
    type Arguments = RootArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        Ok(RootState {
            runtime: args.runtime,
            control: args.control,
            session_id: None,
            session: None,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            RootMsg::StartSession(params, reply) => {
                let success = start_session_impl(myself.get_cell(), params, state).await;
                let _ = reply.send(success);
            }
            RootMsg::StopSession(reply) => {
                stop_session_impl(state);
                let _ = reply.send(());
            }
            RootMsg::GetPhase(reply) => {
                let phase = if state.session.is_some() {
                    SessionPhase::Active
                } else {
                    SessionPhase::Inactive
                };
                let _ = reply.send(phase);
            }
        }
        Ok(())
    }

    async fn handle_supervisor_evt(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: SupervisionEvent,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SupervisionEvent::ActorStarted(_) | SupervisionEvent::ProcessGroupChanged(_) => {}
            SupervisionEvent::ActorTerminated(cell, _, reason) => {
                if let Some(session) = &state.session
                    && cell.get_id() == session.get_id()
                {
                    let session_id = state.session_id.take().unwrap_or_default();
                    let span = session_span(&session_id);
                    let _guard = span.enter();
                    tracing::info!(?reason, "session_actor_terminated");
                    state.session = None;
                }
            }
            SupervisionEvent::ActorFailed(cell, error) => {
                if let Some(session) = &state.session
                    && cell.get_id() == session.get_id()
                {
                    let session_id = state.session_id.take().unwrap_or_default();
                    let span = session_span(&session_id);
                    let _guard = span.enter();
                    tracing::warn!(?error, "session_actor_failed");
                    state.session = None;

                    // A panicked session never got to emit its own terminal
                    // event; do it on its behalf.
                    state.runtime.emit_lifecycle(SessionLifecycleEvent::Ended {
                        session_id,
                        reason: EndReason::AgentFailure,
                        error: Some(format!("{error:?}")),
                    });
                }
            }
        }
        Ok(())
    }
}

async fn start_session_impl(root_cell: ActorCell, params: SessionParams, state: &mut RootState) -> bool {
    let session_id = params.session_id.clone();
    let span = session_span(&session_id);

    async {
        if state.session.is_some() {
            tracing::warn!("session_already_running");
            return false;
        }

        let ctx = SessionContext {
            runtime: state.runtime.clone(),
            control: state.control.clone(),
            params,
        };

        match Actor::spawn_linked(None, SessionActor, ctx, root_cell).await {
            Ok((session_ref, _handle)) => {
                state.session_id = Some(session_id);
                state.session = Some(session_ref.get_cell());
                tracing::info!("session_started");
                true
            }
            Err(error) => {
                tracing::error!(?error, "failed_to_start_session");
                false
            }
        }
    }
    .instrument(span)
    .await
}

fn stop_session_impl(state: &mut RootState) {
    if let Some(session) = &state.session {
        let session_ref: ActorRef<SessionMsg> = session.clone().into();
        if let Err(error) = session_ref.cast(SessionMsg::Stop) {
            tracing::warn!(?error, "failed_to_cast_session_stop_falling_back_to_kill");
            session.stop(Some("session_stop_cast_failed".to_string()));
        }
    }
}
