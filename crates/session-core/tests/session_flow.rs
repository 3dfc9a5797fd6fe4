use std::sync::{Arc, Mutex};
use std::time::Duration;

use convo_agent_control::{
    AgentControl, BoxFuture, Error as ControlError, PingRequest, StartAgentData,
    StartAgentRequest, StopAgentRequest,
};
use convo_agent_interface::{ChannelMessage, OfflineReason, TransportEvent};
use convo_transcript::RenderMode;
use ractor::Actor;
use session_core::{
    AgentNotice, CompositeState, ConnectionState, EndReason, RootMsg, SessionActor,
    SessionContext, SessionLifecycleEvent, SessionMsg, SessionParams, SessionPhase,
    SessionRuntime, TimerTick, spawn_root, start_session, stop_session,
};

#[derive(Default)]
struct Recorder {
    lifecycle: Mutex<Vec<SessionLifecycleEvent>>,
    states: Mutex<Vec<CompositeState>>,
    transcripts: Mutex<Vec<convo_transcript::TranscriptEvent>>,
}

impl SessionRuntime for Recorder {
    fn emit_lifecycle(&self, event: SessionLifecycleEvent) {
        self.lifecycle.lock().unwrap().push(event);
    }
    fn emit_state(&self, state: CompositeState) {
        self.states.lock().unwrap().push(state);
    }
    fn emit_transcript(&self, event: convo_transcript::TranscriptEvent) {
        self.transcripts.lock().unwrap().push(event);
    }
    fn emit_timer(&self, _tick: TimerTick) {}
    fn emit_notice(&self, _notice: AgentNotice) {}
}

impl Recorder {
    fn ended_reasons(&self) -> Vec<EndReason> {
        self.lifecycle
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                SessionLifecycleEvent::Ended { reason, .. } => Some(*reason),
                _ => None,
            })
            .collect()
    }
}

#[derive(Default)]
struct StubControl {
    stops: Mutex<u32>,
}

impl AgentControl for StubControl {
    fn start_agent<'a>(
        &'a self,
        _req: &'a StartAgentRequest,
    ) -> BoxFuture<'a, Result<StartAgentData, ControlError>> {
        Box::pin(async {
            Ok(StartAgentData {
                agent_id: "agent-ctrl-1".to_string(),
                agent_url: None,
            })
        })
    }

    fn stop_agent<'a>(
        &'a self,
        _req: &'a StopAgentRequest,
    ) -> BoxFuture<'a, Result<(), ControlError>> {
        *self.stops.lock().unwrap() += 1;
        Box::pin(async { Ok(()) })
    }

    fn ping<'a>(&'a self, _req: &'a PingRequest) -> BoxFuture<'a, Result<(), ControlError>> {
        Box::pin(async { Ok(()) })
    }
}

fn params(avatar: Option<&str>, join_timeout_secs: u64) -> SessionParams {
    SessionParams {
        session_id: "s-1".to_string(),
        channel: "chan-1".to_string(),
        app_id: "app".to_string(),
        local_participant: "1001".to_string(),
        agent_participant: "2001".to_string(),
        avatar_participant: avatar.map(str::to_string),
        preset_name: Some("default".to_string()),
        render_mode: RenderMode::Words,
        duration_limit_secs: None,
        join_timeout_secs,
        ping_interval_secs: 10,
    }
}

fn joined(participant: &str) -> SessionMsg {
    SessionMsg::Transport(TransportEvent::ParticipantJoined {
        participant: participant.to_string(),
    })
}

fn offline(participant: &str) -> SessionMsg {
    SessionMsg::Transport(TransportEvent::ParticipantOffline {
        participant: participant.to_string(),
        reason: OfflineReason::Quit,
    })
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within 2s");
}

#[tokio::test]
async fn avatar_join_barrier_then_remote_quit() {
    let runtime = Arc::new(Recorder::default());
    let control = Arc::new(StubControl::default());
    let ctx = SessionContext {
        runtime: runtime.clone(),
        control,
        params: params(Some("3001"), 30),
    };
    let (actor, handle) = Actor::spawn(None, SessionActor, ctx).await.unwrap();

    // Agent alone must not connect an avatar session.
    actor.cast(joined("2001")).unwrap();
    let state: CompositeState = ractor::call!(actor, SessionMsg::GetState).unwrap();
    assert_eq!(state.connection, ConnectionState::Connecting);

    actor.cast(joined("3001")).unwrap();
    let state: CompositeState = ractor::call!(actor, SessionMsg::GetState).unwrap();
    assert_eq!(state.connection, ConnectionState::Connected);

    // Both parties must leave before the session settles.
    actor.cast(offline("3001")).unwrap();
    let state: CompositeState = ractor::call!(actor, SessionMsg::GetState).unwrap();
    assert_eq!(state.connection, ConnectionState::Connected);

    actor.cast(offline("2001")).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(runtime.ended_reasons(), [EndReason::RemoteQuit]);
}

#[tokio::test]
async fn join_timeout_forces_stop_with_timeout_reason() {
    let runtime = Arc::new(Recorder::default());
    let control = Arc::new(StubControl::default());
    let ctx = SessionContext {
        runtime: runtime.clone(),
        control,
        params: params(None, 0),
    };
    let (_actor, handle) = Actor::spawn(None, SessionActor, ctx).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(runtime.ended_reasons(), [EndReason::JoinTimeout]);
    // Recovery is reset-to-idle, surfaced as the last published state.
    let last = *runtime.states.lock().unwrap().last().unwrap();
    assert_eq!(last.connection, ConnectionState::Idle);
}

#[tokio::test]
async fn transcript_flows_and_user_stop_ends_once() {
    let runtime = Arc::new(Recorder::default());
    let control = Arc::new(StubControl::default());
    let ctx = SessionContext {
        runtime: runtime.clone(),
        control: control.clone(),
        params: params(None, 30),
    };
    let (actor, handle) = Actor::spawn(None, SessionActor, ctx).await.unwrap();

    actor.cast(joined("2001")).unwrap();
    actor
        .cast(SessionMsg::Channel(ChannelMessage::UserTranscription {
            turn_id: 1,
            user_id: None,
            text: "hello agent".to_string(),
            is_final: true,
            start_ms: 0,
            send_ts: 100,
        }))
        .unwrap();

    let frame: convo_transcript::TranscriptFrame =
        ractor::call!(actor, SessionMsg::GetFrame).unwrap();
    assert_eq!(frame.messages.len(), 1);
    assert_eq!(frame.messages[0].content, "hello agent");
    assert_eq!(runtime.transcripts.lock().unwrap().len(), 1);

    actor.cast(SessionMsg::Stop).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(runtime.ended_reasons(), [EndReason::UserStop]);
    // The remote agent is stopped best-effort, exactly once.
    wait_for(|| *control.stops.lock().unwrap() == 1).await;
}

struct RefusingControl;

impl AgentControl for RefusingControl {
    fn start_agent<'a>(
        &'a self,
        _req: &'a StartAgentRequest,
    ) -> BoxFuture<'a, Result<StartAgentData, ControlError>> {
        Box::pin(async {
            Err(ControlError::Api {
                code: 1412,
                message: "resource limit exceeded".to_string(),
            })
        })
    }

    fn stop_agent<'a>(
        &'a self,
        _req: &'a StopAgentRequest,
    ) -> BoxFuture<'a, Result<(), ControlError>> {
        Box::pin(async { Ok(()) })
    }

    fn ping<'a>(&'a self, _req: &'a PingRequest) -> BoxFuture<'a, Result<(), ControlError>> {
        Box::pin(async { Ok(()) })
    }
}

#[tokio::test]
async fn control_plane_refusal_aborts_the_session() {
    let runtime = Arc::new(Recorder::default());
    let ctx = SessionContext {
        runtime: runtime.clone(),
        control: Arc::new(RefusingControl),
        params: params(None, 30),
    };

    let result = Actor::spawn(None, SessionActor, ctx).await;
    assert!(result.is_err());
    assert_eq!(runtime.ended_reasons(), [EndReason::AgentFailure]);
}

#[tokio::test]
async fn root_allows_one_session_at_a_time() {
    let runtime = Arc::new(Recorder::default());
    let control = Arc::new(StubControl::default());
    let (root, _handle) = spawn_root(runtime.clone(), control).await.unwrap();

    start_session(&root, params(None, 30)).await.unwrap();
    let second = start_session(&root, params(None, 30)).await;
    assert!(matches!(
        second,
        Err(session_core::Error::SessionAlreadyRunning)
    ));

    stop_session(&root).await.unwrap();
    let mut phase = SessionPhase::Active;
    for _ in 0..200 {
        phase = ractor::call!(root, RootMsg::GetPhase).unwrap();
        if phase == SessionPhase::Inactive {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(phase, SessionPhase::Inactive);

    root.stop(None);
}
