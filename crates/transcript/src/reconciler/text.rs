//! `Text` mode: typewriter reveal over an authoritative transcript.
//!
//! The upsert still runs by key to keep the authoritative `transcript`
//! current, but visible `content` only advances on reveal ticks. Two rules
//! keep the animation honest:
//!
//! - never rewind: a fragment that is a strict prefix of the already
//!   revealed content (truncated re-send) is ignored;
//! - interruption truncates: the message finalizes with whatever had been
//!   revealed, not the full authoritative text.
//!
//! User rows don't animate; they take the standard-mode path.

use convo_agent_interface::{Speaker, TranscriptFragment};

use super::TranscriptReconciler;
use crate::typewriter::{self, CHARS_PER_TICK};
use crate::types::{MessageKey, RenderMode, TranscriptEvent};

impl TranscriptReconciler {
    pub(super) fn apply_text(&mut self, fragment: &TranscriptFragment) -> Vec<TranscriptEvent> {
        if fragment.speaker == Speaker::User {
            return self.apply_standard(fragment);
        }

        let key = MessageKey {
            turn_id: fragment.turn_id,
            speaker: fragment.speaker,
        };

        let Some(index) = self.index_of(key) else {
            if fragment.is_interrupted && fragment.text.is_empty() {
                tracing::debug!(turn_id = fragment.turn_id, "interrupt_for_unknown_turn");
                return Vec::new();
            }
            // Finality is earned by the reveal catching up, not by the
            // fragment flag; the turn starts with nothing visible.
            let message = self.make_message(fragment, String::new(), false);
            self.insert_sorted(message.clone());
            if let Some(previous) = self.reveal.activate(key) {
                tracing::debug!(
                    superseded_turn = previous.turn_id,
                    "reveal_superseded_by_new_turn"
                );
            }
            return vec![TranscriptEvent::Inserted { message }];
        };

        let message = &mut self.messages[index];

        if fragment.is_interrupted {
            if message.is_final {
                return Vec::new();
            }
            // Leave the content truncated exactly where the reveal stopped.
            message.is_final = true;
            message.is_interrupted = true;
            let event = TranscriptEvent::Finalized {
                message: message.clone(),
            };
            self.reveal.cancel_for(key);
            return vec![event];
        }

        let incoming_chars = fragment.text.chars().count();
        if incoming_chars < message.reveal_index && message.content.starts_with(&fragment.text) {
            tracing::debug!(
                turn_id = fragment.turn_id,
                revealed = message.reveal_index,
                incoming = incoming_chars,
                "ignoring_prefix_resend"
            );
            return Vec::new();
        }

        message.transcript = fragment.text.clone();
        if incoming_chars < message.reveal_index {
            // Replacement shorter than what is visible: clamp so the reveal
            // index never exceeds the transcript length.
            message.reveal_index = incoming_chars;
            message.content = fragment.text.clone();
        }
        message.timestamp_ms = fragment.timestamp_ms;
        // Turn reopened until the reveal catches up again.
        message.is_final = false;
        if !self.reveal.is_active_for(key) {
            self.reveal.activate(key);
        }

        // Visible content is unchanged here; ticks carry the notifications.
        Vec::new()
    }

    /// Advance the active reveal by one step. Call every
    /// [`crate::typewriter::REVEAL_TICK`]; a no-op in other modes and when
    /// nothing is revealing.
    pub fn tick_reveal(&mut self) -> Vec<TranscriptEvent> {
        if self.mode != RenderMode::Text {
            return Vec::new();
        }
        let Some(key) = self.reveal.active() else {
            return Vec::new();
        };
        let Some(index) = self.index_of(key) else {
            self.reveal.cancel();
            return Vec::new();
        };

        let message = &mut self.messages[index];
        let step = typewriter::advance(&message.transcript, message.reveal_index, CHARS_PER_TICK);
        let moved = step.index != message.reveal_index;
        message.reveal_index = step.index;
        message.content = step.content;

        if step.complete {
            let event = if message.is_final {
                None
            } else {
                message.is_final = true;
                Some(TranscriptEvent::Finalized {
                    message: message.clone(),
                })
            };
            self.reveal.cancel();
            return event.into_iter().collect();
        }

        if moved {
            vec![TranscriptEvent::Updated {
                message: self.messages[index].clone(),
            }]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use convo_agent_interface::Speaker;

    use crate::reconciler::test_support::{fragment, interrupt, reconciler};
    use crate::types::{RenderMode, TranscriptEvent};

    #[test]
    fn agent_text_reveals_one_char_per_tick() {
        let mut rec = reconciler(RenderMode::Text);
        rec.apply(&fragment(1, Speaker::Agent, "hey", false));
        assert_eq!(rec.messages()[0].content, "");

        assert!(matches!(
            rec.tick_reveal()[0],
            TranscriptEvent::Updated { .. }
        ));
        assert_eq!(rec.messages()[0].content, "h");
        rec.tick_reveal();
        assert_eq!(rec.messages()[0].content, "he");

        // Last char: completion finalizes the message.
        let events = rec.tick_reveal();
        assert_eq!(rec.messages()[0].content, "hey");
        assert!(matches!(events[0], TranscriptEvent::Finalized { .. }));
        assert!(rec.messages()[0].is_final);

        // Nothing left to reveal.
        assert!(rec.tick_reveal().is_empty());
    }

    #[test]
    fn user_rows_do_not_animate() {
        let mut rec = reconciler(RenderMode::Text);
        rec.apply(&fragment(1, Speaker::User, "hi there", true));
        assert_eq!(rec.messages()[0].content, "hi there");
        assert!(rec.messages()[0].is_final);
        assert!(rec.tick_reveal().is_empty());
    }

    #[test]
    fn prefix_resend_never_rewinds() {
        let mut rec = reconciler(RenderMode::Text);
        rec.apply(&fragment(1, Speaker::Agent, "hello world", false));
        for _ in 0..5 {
            rec.tick_reveal();
        }
        assert_eq!(rec.messages()[0].content, "hello");

        // A truncated re-send that is a strict prefix of what is visible.
        assert!(rec.apply(&fragment(1, Speaker::Agent, "hel", false)).is_empty());
        assert_eq!(rec.messages()[0].content, "hello");
        assert_eq!(rec.messages()[0].transcript, "hello world");

        // Reveal continues forward from the current position.
        rec.tick_reveal();
        assert_eq!(rec.messages()[0].content, "hello ");
    }

    #[test]
    fn replacement_beyond_reveal_point_continues_forward() {
        let mut rec = reconciler(RenderMode::Text);
        rec.apply(&fragment(1, Speaker::Agent, "hello world", false));
        for _ in 0..5 {
            rec.tick_reveal();
        }

        // Same visible prefix, different tail: authoritative text replaced.
        rec.apply(&fragment(1, Speaker::Agent, "hello there, friend", true));
        assert_eq!(rec.messages()[0].content, "hello");
        rec.tick_reveal();
        assert_eq!(rec.messages()[0].content, "hello ");
        for _ in 0..20 {
            rec.tick_reveal();
        }
        assert_eq!(rec.messages()[0].content, "hello there, friend");
        assert!(rec.messages()[0].is_final);
    }

    #[test]
    fn interruption_truncates_at_revealed_prefix() {
        let mut rec = reconciler(RenderMode::Text);
        rec.apply(&fragment(2, Speaker::Agent, "a very long explanation", false));
        for _ in 0..6 {
            rec.tick_reveal();
        }
        assert_eq!(rec.messages()[0].content, "a very");

        let events = rec.apply(&interrupt(2));
        match &events[0] {
            TranscriptEvent::Finalized { message } => {
                assert_eq!(message.content, "a very");
                assert!(message.is_interrupted);
            }
            other => panic!("expected Finalized, got {other:?}"),
        }

        // Reveal is dead; content stays truncated.
        assert!(rec.tick_reveal().is_empty());
        assert_eq!(rec.messages()[0].content, "a very");
    }

    #[test]
    fn new_turn_supersedes_previous_reveal() {
        let mut rec = reconciler(RenderMode::Text);
        rec.apply(&fragment(1, Speaker::Agent, "first turn", false));
        for _ in 0..3 {
            rec.tick_reveal();
        }
        rec.apply(&fragment(2, Speaker::Agent, "second", false));

        // Only the new turn advances now.
        rec.tick_reveal();
        let first = &rec.messages()[0];
        let second = &rec.messages()[1];
        assert_eq!(first.content, "fir");
        assert_eq!(second.content, "s");
    }

    #[test]
    fn reveal_catch_up_then_extension_reopens_turn() {
        let mut rec = reconciler(RenderMode::Text);
        rec.apply(&fragment(1, Speaker::Agent, "hi", false));
        rec.tick_reveal();
        let events = rec.tick_reveal();
        assert!(matches!(events[0], TranscriptEvent::Finalized { .. }));

        // The turn grows after the reveal caught up.
        rec.apply(&fragment(1, Speaker::Agent, "hi there", true));
        assert!(!rec.messages()[0].is_final);
        for _ in 0..6 {
            rec.tick_reveal();
        }
        assert_eq!(rec.messages()[0].content, "hi there");
        assert!(rec.messages()[0].is_final);
    }
}
