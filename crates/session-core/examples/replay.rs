//! Replay a scripted conversation through the session core.
//!
//! No transport: a console runtime, with the data channel driven from a
//! canned script. The control plane is a dry-run stub unless
//! `CONVO_API_BASE` (and optionally `CONVO_API_KEY`) point at a real one.
//!
//! ```sh
//! cargo run --example replay
//! ```

use std::sync::Arc;
use std::time::Duration;

use convo_agent_control::{
    AgentControl, BoxFuture, ControlClient, Error as ControlError, PingRequest, StartAgentData,
    StartAgentRequest, StopAgentRequest,
};
use convo_http::ReqwestClient;
use convo_agent_interface::{ChannelMessage, TransportEvent};
use convo_transcript::{RenderMode, TranscriptEvent};
use ractor::Actor;
use session_core::{
    AgentNotice, CompositeState, SessionActor, SessionContext, SessionLifecycleEvent, SessionMsg,
    SessionParams, SessionRuntime, TimerTick,
};

struct ConsoleRuntime;

impl SessionRuntime for ConsoleRuntime {
    fn emit_lifecycle(&self, event: SessionLifecycleEvent) {
        eprintln!("[lifecycle] {event:?}");
    }

    fn emit_state(&self, state: CompositeState) {
        eprintln!("[state] {:?} / {:?}", state.connection, state.activity);
    }

    fn emit_transcript(&self, event: TranscriptEvent) {
        let label = match &event {
            TranscriptEvent::Inserted { .. } => "+",
            TranscriptEvent::Updated { .. } => "~",
            TranscriptEvent::Finalized { .. } => "=",
        };
        let message = event.message();
        println!("{label} [{:?} turn {}] {}", message.speaker, message.turn_id, message.content);
    }

    fn emit_timer(&self, tick: TimerTick) {
        eprintln!("[timer] {:?} {}s ({:?})", tick.kind, tick.seconds, tick.urgency);
    }

    fn emit_notice(&self, notice: AgentNotice) {
        eprintln!("[notice] {notice:?}");
    }
}

struct DryRunControl;

impl AgentControl for DryRunControl {
    fn start_agent<'a>(
        &'a self,
        req: &'a StartAgentRequest,
    ) -> BoxFuture<'a, Result<StartAgentData, ControlError>> {
        eprintln!("[control] start agent on channel {}", req.channel_name);
        Box::pin(async {
            Ok(StartAgentData {
                agent_id: "dry-run-agent".to_string(),
                agent_url: None,
            })
        })
    }

    fn stop_agent<'a>(&'a self, req: &'a StopAgentRequest) -> BoxFuture<'a, Result<(), ControlError>> {
        eprintln!("[control] stop agent {}", req.agent_id);
        Box::pin(async { Ok(()) })
    }

    fn ping<'a>(&'a self, _req: &'a PingRequest) -> BoxFuture<'a, Result<(), ControlError>> {
        Box::pin(async { Ok(()) })
    }
}

fn assistant(turn_id: i64, text: &str, turn_status: i64, send_ts: i64) -> ChannelMessage {
    ChannelMessage::AssistantTranscription {
        turn_id,
        user_id: None,
        text: text.to_string(),
        turn_status,
        start_ms: 0,
        send_ts,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let params = SessionParams {
        session_id: uuid::Uuid::new_v4().to_string(),
        channel: "replay-demo".to_string(),
        app_id: "demo-app".to_string(),
        local_participant: "1001".to_string(),
        agent_participant: "2001".to_string(),
        avatar_participant: None,
        preset_name: Some("demo".to_string()),
        render_mode: RenderMode::Text,
        duration_limit_secs: Some(90),
        join_timeout_secs: 10,
        ping_interval_secs: 10,
    };

    let control: Arc<dyn AgentControl> = match std::env::var("CONVO_API_BASE") {
        Ok(api_base) => {
            let mut http = ReqwestClient::new(api_base);
            if let Ok(api_key) = std::env::var("CONVO_API_KEY") {
                http = http.with_api_key(api_key);
            }
            Arc::new(ControlClient::new(http))
        }
        Err(_) => Arc::new(DryRunControl),
    };

    let ctx = SessionContext {
        runtime: Arc::new(ConsoleRuntime),
        control,
        params,
    };

    let (session, handle) = Actor::spawn(None, SessionActor, ctx)
        .await
        .expect("failed to spawn session actor");

    session
        .cast(SessionMsg::Transport(TransportEvent::ParticipantJoined {
            participant: "2001".to_string(),
        }))
        .unwrap();

    let script = [
        ChannelMessage::UserTranscription {
            turn_id: 1,
            user_id: None,
            text: "hey, tell me a short story".to_string(),
            is_final: true,
            start_ms: 0,
            send_ts: 1000,
        },
        assistant(1, "Once upon", 0, 1500),
        assistant(1, "Once upon a time, a small robot", 0, 2300),
        assistant(1, "Once upon a time, a small robot learned to listen.", 1, 3100),
    ];

    for message in script {
        session.cast(SessionMsg::Channel(message)).unwrap();
        tokio::time::sleep(Duration::from_millis(800)).await;
    }

    // Let the typewriter finish revealing the last turn.
    tokio::time::sleep(Duration::from_secs(5)).await;

    session.cast(SessionMsg::Stop).unwrap();
    let _ = handle.await;
    eprintln!("Done.");
}
