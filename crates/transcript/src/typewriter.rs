//! Per-turn character-reveal driver for `Text` mode.
//!
//! The typewriter owns *which* turn is being revealed and how far a reveal
//! advances per tick; the clock itself lives with the session owner, which
//! calls [`crate::reconciler::TranscriptReconciler::tick_reveal`] every
//! [`REVEAL_TICK`]. Splitting the bookkeeping from the clock keeps every
//! reveal rule testable without time.

use std::time::Duration;

use crate::types::MessageKey;

/// Tick cadence for the reveal clock. One char per tick ⇒ 10 chars/sec.
pub const REVEAL_TICK: Duration = Duration::from_millis(100);
pub const CHARS_PER_TICK: usize = 1;

/// Result of advancing one reveal step over an authoritative transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealStep {
    /// Characters revealed after this step.
    pub index: usize,
    /// Visible prefix after this step.
    pub content: String,
    /// The whole transcript is now visible.
    pub complete: bool,
}

/// Advance a reveal by `step` characters. Indexes count characters, never
/// bytes, so multi-byte text cannot be split mid-character.
pub fn advance(transcript: &str, index: usize, step: usize) -> RevealStep {
    let total = transcript.chars().count();
    let next = (index + step).min(total);
    RevealStep {
        index: next,
        content: transcript.chars().take(next).collect(),
        complete: next >= total,
    }
}

/// Tracks the single active reveal. Only one reveal may run at a time per
/// reconciler; activating a new turn implicitly replaces the previous one.
#[derive(Debug, Default)]
pub struct Typewriter {
    active: Option<MessageKey>,
}

impl Typewriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin (or continue) revealing the given turn, superseding any
    /// previous reveal. Returns the superseded key, if any.
    pub fn activate(&mut self, key: MessageKey) -> Option<MessageKey> {
        let previous = self.active.filter(|active| *active != key);
        self.active = Some(key);
        previous
    }

    pub fn active(&self) -> Option<MessageKey> {
        self.active
    }

    pub fn is_active_for(&self, key: MessageKey) -> bool {
        self.active == Some(key)
    }

    /// Idempotent: cancelling an inactive typewriter is a no-op.
    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// Cancel only if the given turn is the active one.
    pub fn cancel_for(&mut self, key: MessageKey) {
        if self.active == Some(key) {
            self.active = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convo_agent_interface::Speaker;

    fn key(turn_id: i64) -> MessageKey {
        MessageKey {
            turn_id,
            speaker: Speaker::Agent,
        }
    }

    #[test]
    fn advance_reveals_one_char_per_step() {
        let step = advance("hello", 0, 1);
        assert_eq!(step.index, 1);
        assert_eq!(step.content, "h");
        assert!(!step.complete);
    }

    #[test]
    fn advance_clamps_at_transcript_end() {
        let step = advance("hi", 1, 5);
        assert_eq!(step.index, 2);
        assert_eq!(step.content, "hi");
        assert!(step.complete);
    }

    #[test]
    fn advance_counts_chars_not_bytes() {
        let step = advance("héllo", 0, 2);
        assert_eq!(step.content, "hé");

        let cjk = advance("你好吗", 0, 2);
        assert_eq!(cjk.content, "你好");
        assert!(!cjk.complete);
    }

    #[test]
    fn advance_on_empty_transcript_is_complete() {
        let step = advance("", 0, 1);
        assert_eq!(step.index, 0);
        assert!(step.complete);
    }

    #[test]
    fn activate_supersedes_previous_reveal() {
        let mut tw = Typewriter::new();
        assert_eq!(tw.activate(key(1)), None);
        assert_eq!(tw.activate(key(2)), Some(key(1)));
        assert!(tw.is_active_for(key(2)));
    }

    #[test]
    fn activating_same_key_reports_no_superseded_reveal() {
        let mut tw = Typewriter::new();
        tw.activate(key(1));
        assert_eq!(tw.activate(key(1)), None);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut tw = Typewriter::new();
        tw.activate(key(1));
        tw.cancel();
        tw.cancel();
        assert_eq!(tw.active(), None);
    }

    #[test]
    fn cancel_for_only_touches_matching_key() {
        let mut tw = Typewriter::new();
        tw.activate(key(1));
        tw.cancel_for(key(2));
        assert!(tw.is_active_for(key(1)));
        tw.cancel_for(key(1));
        assert_eq!(tw.active(), None);
    }
}
