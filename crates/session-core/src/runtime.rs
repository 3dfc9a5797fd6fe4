use convo_transcript::TranscriptEvent;

use crate::events::{AgentNotice, CompositeState, SessionLifecycleEvent, TimerTick};

/// Embedding surface: everything the session core tells the outside world.
///
/// Implementations forward to whatever event bus the host UI uses. Emissions
/// happen on the session actor's processing loop, so implementations must be
/// cheap and non-blocking; anything heavier belongs behind a channel.
pub trait SessionRuntime: Send + Sync + 'static {
    fn emit_lifecycle(&self, event: SessionLifecycleEvent);
    fn emit_state(&self, state: CompositeState);
    fn emit_transcript(&self, event: TranscriptEvent);
    fn emit_timer(&self, tick: TimerTick);
    fn emit_notice(&self, notice: AgentNotice);
}
