//! The session actor: the single coordination thread.
//!
//! Transport callbacks, data-channel packets and timer fires all arrive as
//! mailbox messages, so reconciler and state machine are only ever touched
//! from one place. The control-plane start call is awaited before the actor
//! begins processing; stop/ping are fire-and-forget tasks. Nothing inside
//! `handle` blocks.

use std::time::Duration;

use convo_agent_control::{PingRequest, StartAgentRequest, StopAgentRequest};
use convo_agent_interface::{ChannelMessage, MessageParser, TransportEvent};
use convo_transcript::{
    REVEAL_TICK, RenderMode, TranscriptFrame, TranscriptReconciler, fragment_from_message,
};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::actors::{SessionContext, SessionParams, session_span};
use crate::events::{
    AgentNotice, CompositeState, EndReason, SessionLifecycleEvent, TimerKind, TimerTick,
};
use crate::state::{ConnectionState, ParticipantRole, StateMachine};
use crate::timers::{TimerSlot, USAGE_TICK, UsageClock};

pub enum SessionMsg {
    Transport(TransportEvent),
    /// Raw data-channel packet, still chunk-framed.
    Packet(String),
    /// Already-decoded channel message (alternate transports, tests).
    Channel(ChannelMessage),
    /// User-initiated stop.
    Stop,
    JoinTimeout { epoch: u64 },
    PingTick { epoch: u64 },
    UsageTick { epoch: u64 },
    RevealTick { epoch: u64 },
    GetFrame(RpcReplyPort<TranscriptFrame>),
    GetState(RpcReplyPort<CompositeState>),
}

pub struct SessionActor;

pub struct SessionState {
    ctx: SessionContext,
    machine: StateMachine,
    reconciler: TranscriptReconciler,
    parser: MessageParser,
    usage: UsageClock,
    join_timer: TimerSlot,
    ping_timer: TimerSlot,
    usage_timer: TimerSlot,
    reveal_timer: TimerSlot,
    /// Control-plane agent id, known once the start call returns.
    agent_id: Option<String>,
    ended: bool,
}

#[ractor::async_trait]
impl Actor for SessionActor {
    type Msg = SessionMsg;
    type State = SessionState;
    type Arguments = SessionContext;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        ctx: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let span = session_span(&ctx.params.session_id);

        async move {
            let mut machine = StateMachine::new(ctx.params.avatar_enabled());
            machine.begin_connecting();
            ctx.runtime
                .emit_lifecycle(SessionLifecycleEvent::Connecting {
                    session_id: ctx.params.session_id.clone(),
                });
            ctx.runtime.emit_state(machine.composite());

            // The join watchdog only makes sense once the control plane has
            // accepted the session, so the start call completes first.
            let request = start_request(&ctx.params);
            let agent_id = match ctx.control.start_agent(&request).await {
                Ok(data) => {
                    tracing::info!(agent_id = %data.agent_id, "agent_started");
                    data.agent_id
                }
                Err(error) => {
                    tracing::error!(%error, "agent_start_failed");
                    ctx.runtime.emit_lifecycle(SessionLifecycleEvent::Ended {
                        session_id: ctx.params.session_id.clone(),
                        reason: EndReason::AgentFailure,
                        error: Some(error.to_string()),
                    });
                    return Err(ActorProcessingErr::from(error));
                }
            };

            let usage = match ctx.params.duration_limit_secs {
                Some(budget) => UsageClock::limited(budget),
                None => UsageClock::unlimited(),
            };
            let mut state = SessionState {
                machine,
                reconciler: TranscriptReconciler::new(ctx.params.render_mode),
                parser: MessageParser::new(),
                usage,
                join_timer: TimerSlot::new(),
                ping_timer: TimerSlot::new(),
                usage_timer: TimerSlot::new(),
                reveal_timer: TimerSlot::new(),
                agent_id: Some(agent_id),
                ended: false,
                ctx,
            };

            let epoch = state.join_timer.arm();
            state.join_timer.attach(spawn_one_shot(
                myself,
                Duration::from_secs(state.ctx.params.join_timeout_secs),
                move || SessionMsg::JoinTimeout { epoch },
            ));

            tracing::info!("session_connecting");
            Ok(state)
        }
        .instrument(span)
        .await
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let span = session_span(&state.ctx.params.session_id);
        let _guard = span.enter();

        // Answers stay valid after teardown; everything else is dropped so
        // late callbacks cannot mutate a dead session.
        if state.ended {
            match message {
                SessionMsg::GetFrame(reply) => {
                    let _ = reply.send(state.reconciler.frame());
                }
                SessionMsg::GetState(reply) => {
                    let _ = reply.send(state.machine.composite());
                }
                _ => {}
            }
            return Ok(());
        }

        match message {
            SessionMsg::Transport(event) => state.on_transport(&myself, event),
            SessionMsg::Packet(raw) => match state.parser.feed(&raw, now_ms()) {
                Ok(Some(decoded)) => state.on_channel_message(decoded),
                Ok(None) => {}
                Err(error) => {
                    tracing::debug!(%error, "dropping_malformed_packet");
                }
            },
            SessionMsg::Channel(decoded) => state.on_channel_message(decoded),
            SessionMsg::Stop => state.end(&myself, EndReason::UserStop, None),
            SessionMsg::JoinTimeout { epoch } => {
                if state.join_timer.accepts(epoch)
                    && state.machine.connection() == ConnectionState::Connecting
                {
                    tracing::warn!("agent_join_timeout");
                    state.end(&myself, EndReason::JoinTimeout, None);
                }
            }
            SessionMsg::PingTick { epoch } => {
                if state.ping_timer.accepts(epoch) {
                    state.send_ping();
                }
            }
            SessionMsg::UsageTick { epoch } => {
                if state.usage_timer.accepts(epoch) {
                    let tick = state.usage.tick();
                    state.ctx.runtime.emit_timer(TimerTick {
                        kind: TimerKind::UsageDuration,
                        seconds: tick.seconds,
                        urgency: tick.urgency,
                    });
                    if tick.expired {
                        tracing::info!("usage_duration_limit_reached");
                        state.end(&myself, EndReason::DurationLimit, None);
                    }
                }
            }
            SessionMsg::RevealTick { epoch } => {
                if state.reveal_timer.accepts(epoch) {
                    for event in state.reconciler.tick_reveal() {
                        state.ctx.runtime.emit_transcript(event);
                    }
                }
            }
            SessionMsg::GetFrame(reply) => {
                let _ = reply.send(state.reconciler.frame());
            }
            SessionMsg::GetState(reply) => {
                let _ = reply.send(state.machine.composite());
            }
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.cancel_timers();
        Ok(())
    }
}

impl SessionState {
    fn on_transport(&mut self, myself: &ActorRef<SessionMsg>, event: TransportEvent) {
        match event {
            TransportEvent::ParticipantJoined { participant } => {
                let role = self.role_of(&participant);
                tracing::debug!(%participant, ?role, "participant_joined");
                if self.machine.participant_joined(role) == Some(ConnectionState::Connected) {
                    self.on_connected(myself);
                }
            }
            TransportEvent::ParticipantOffline {
                participant,
                reason,
            } => {
                let role = self.role_of(&participant);
                tracing::debug!(%participant, ?role, ?reason, "participant_offline");
                match self.machine.participant_offline(role, reason) {
                    Some(ConnectionState::Idle) => {
                        self.end(myself, EndReason::RemoteQuit, None);
                    }
                    Some(ConnectionState::Error) => {
                        self.end(
                            myself,
                            EndReason::TransportFailure,
                            Some("remote party dropped abnormally".to_string()),
                        );
                    }
                    _ => {}
                }
            }
            TransportEvent::ConnectionChanged { state, reason } => {
                match self.machine.link_changed(state, reason) {
                    Some(ConnectionState::ConnectedInterrupted) => {
                        self.ctx.runtime.emit_state(self.machine.composite());
                        self.ctx
                            .runtime
                            .emit_lifecycle(SessionLifecycleEvent::Interrupted {
                                session_id: self.ctx.params.session_id.clone(),
                            });
                    }
                    Some(ConnectionState::Connected) => {
                        self.ctx.runtime.emit_state(self.machine.composite());
                        self.ctx
                            .runtime
                            .emit_lifecycle(SessionLifecycleEvent::Resumed {
                                session_id: self.ctx.params.session_id.clone(),
                            });
                    }
                    Some(ConnectionState::Idle) => {
                        self.end(myself, EndReason::UserStop, None);
                    }
                    Some(ConnectionState::Error) => {
                        self.end(
                            myself,
                            EndReason::TransportFailure,
                            Some("transport join failed".to_string()),
                        );
                    }
                    _ => {}
                }
            }
            TransportEvent::AudioVolume {
                participant,
                volume,
            } => {
                let role = self.role_of(&participant);
                if self.machine.volume_hint(role, volume).is_some() {
                    self.ctx.runtime.emit_state(self.machine.composite());
                }
            }
        }
    }

    fn on_channel_message(&mut self, message: ChannelMessage) {
        match &message {
            ChannelMessage::State { state, turn_id, ts } => {
                if self.machine.activity_event(*state, *turn_id, *ts).is_some() {
                    self.ctx.runtime.emit_state(self.machine.composite());
                }
            }
            ChannelMessage::ModuleError {
                module,
                code,
                message: text,
                ..
            } => {
                tracing::warn!(%module, code = *code, "agent_module_error");
                self.ctx.runtime.emit_notice(AgentNotice::ModuleError {
                    module: module.clone(),
                    code: *code,
                    message: text.clone(),
                });
            }
            ChannelMessage::Metric {
                module,
                metric_name,
                latency_ms,
                ..
            } => {
                self.ctx.runtime.emit_notice(AgentNotice::Metric {
                    module: module.clone(),
                    name: metric_name.clone(),
                    latency_ms: *latency_ms,
                });
            }
            _ => {
                if let Some(fragment) = fragment_from_message(&message) {
                    for event in self.reconciler.apply(&fragment) {
                        self.ctx.runtime.emit_transcript(event);
                    }
                }
            }
        }
    }

    fn on_connected(&mut self, myself: &ActorRef<SessionMsg>) {
        tracing::info!("session_connected");
        self.join_timer.cancel();
        self.ctx.runtime.emit_state(self.machine.composite());
        self.ctx
            .runtime
            .emit_lifecycle(SessionLifecycleEvent::Connected {
                session_id: self.ctx.params.session_id.clone(),
            });

        let ping_epoch = self.ping_timer.arm();
        self.ping_timer.attach(spawn_interval(
            myself.clone(),
            Duration::from_secs(self.ctx.params.ping_interval_secs),
            move || SessionMsg::PingTick { epoch: ping_epoch },
        ));

        let usage_epoch = self.usage_timer.arm();
        self.usage_timer.attach(spawn_interval(
            myself.clone(),
            USAGE_TICK,
            move || SessionMsg::UsageTick { epoch: usage_epoch },
        ));

        if self.ctx.params.render_mode == RenderMode::Text {
            let reveal_epoch = self.reveal_timer.arm();
            self.reveal_timer.attach(spawn_interval(
                myself.clone(),
                REVEAL_TICK,
                move || SessionMsg::RevealTick {
                    epoch: reveal_epoch,
                },
            ));
        }
    }

    /// Best-effort liveness signal; a failed ping is logged, never fatal.
    fn send_ping(&self) {
        let Some(preset_name) = self.ctx.params.preset_name.clone() else {
            return;
        };
        let control = self.ctx.control.clone();
        let request = PingRequest {
            app_id: self.ctx.params.app_id.clone(),
            channel_name: self.ctx.params.channel.clone(),
            preset_name,
        };
        tokio::spawn(async move {
            if let Err(error) = control.ping(&request).await {
                tracing::warn!(%error, "agent_ping_failed");
            }
        });
    }

    /// One atomic teardown: timers, reveal, reconciler, parser, state — then
    /// the terminal lifecycle event and actor stop. Idempotent.
    fn end(&mut self, myself: &ActorRef<SessionMsg>, reason: EndReason, error: Option<String>) {
        if self.ended {
            return;
        }
        self.ended = true;
        tracing::info!(?reason, "session_ended");

        self.cancel_timers();
        self.machine.reset();
        self.reconciler.reset();
        self.parser.clear();
        self.ctx.runtime.emit_state(self.machine.composite());

        if let Some(agent_id) = self.agent_id.take() {
            let control = self.ctx.control.clone();
            let request = StopAgentRequest {
                app_id: self.ctx.params.app_id.clone(),
                channel_name: self.ctx.params.channel.clone(),
                agent_id,
                preset_name: self.ctx.params.preset_name.clone(),
            };
            tokio::spawn(async move {
                if let Err(error) = control.stop_agent(&request).await {
                    tracing::warn!(%error, "agent_stop_request_failed");
                }
            });
        }

        self.ctx
            .runtime
            .emit_lifecycle(SessionLifecycleEvent::Ended {
                session_id: self.ctx.params.session_id.clone(),
                reason,
                error,
            });
        myself.stop(None);
    }

    fn cancel_timers(&mut self) {
        self.join_timer.cancel();
        self.ping_timer.cancel();
        self.usage_timer.cancel();
        self.reveal_timer.cancel();
    }

    fn role_of(&self, participant: &str) -> ParticipantRole {
        if participant == self.ctx.params.agent_participant {
            ParticipantRole::Agent
        } else if self.ctx.params.avatar_participant.as_deref() == Some(participant) {
            ParticipantRole::Avatar
        } else {
            ParticipantRole::Other
        }
    }
}

fn start_request(params: &SessionParams) -> StartAgentRequest {
    StartAgentRequest {
        app_id: params.app_id.clone(),
        channel_name: params.channel.clone(),
        agent_rtc_uid: params.agent_participant.clone(),
        remote_rtc_uid: params.local_participant.clone(),
        preset_name: params.preset_name.clone(),
        avatar: params
            .avatar_participant
            .as_ref()
            .map(|avatar_uid| convo_agent_control::AvatarConfig {
                enable: true,
                rtc_uid: Some(avatar_uid.clone()),
                ..Default::default()
            }),
        ..Default::default()
    }
}

fn spawn_one_shot<F>(cell: ActorRef<SessionMsg>, delay: Duration, make: F) -> JoinHandle<()>
where
    F: Fn() -> SessionMsg + Send + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = cell.cast(make());
    })
}

fn spawn_interval<F>(cell: ActorRef<SessionMsg>, period: Duration, make: F) -> JoinHandle<()>
where
    F: Fn() -> SessionMsg + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick of a tokio interval fires immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            if cell.cast(make()).is_err() {
                break;
            }
        }
    })
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .min(i64::MAX as u128) as i64
}
