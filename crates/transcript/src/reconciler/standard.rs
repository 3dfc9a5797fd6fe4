//! `Words` and `Chunk` mode merge.
//!
//! Both modes share one algorithm: key-based upsert where each fragment
//! replaces the message content atomically. The chunk/words distinction is
//! purely render cadence (per-word paint vs one coalesced paint per frame)
//! and belongs to the renderer, not here.

use convo_agent_interface::TranscriptFragment;

use super::TranscriptReconciler;
use crate::types::{MessageKey, TranscriptEvent};

impl TranscriptReconciler {
    pub(super) fn apply_standard(&mut self, fragment: &TranscriptFragment) -> Vec<TranscriptEvent> {
        let key = MessageKey {
            turn_id: fragment.turn_id,
            speaker: fragment.speaker,
        };

        let Some(index) = self.index_of(key) else {
            if fragment.is_interrupted && fragment.text.is_empty() {
                tracing::debug!(turn_id = fragment.turn_id, "interrupt_for_unknown_turn");
                return Vec::new();
            }
            let message = self.make_message(fragment, fragment.text.clone(), fragment.is_final);
            self.insert_sorted(message.clone());
            return vec![TranscriptEvent::Inserted { message }];
        };

        let message = &mut self.messages[index];
        if message.is_final {
            // Finalized turns never reopen; a replayed final fragment is a no-op.
            return Vec::new();
        }

        if fragment.is_interrupted {
            if !fragment.text.is_empty() {
                message.content = fragment.text.clone();
                message.transcript = fragment.text.clone();
            }
            message.is_interrupted = true;
            message.is_final = true;
            return vec![TranscriptEvent::Finalized {
                message: message.clone(),
            }];
        }

        message.content = fragment.text.clone();
        message.transcript = fragment.text.clone();
        message.reveal_index = message.content.chars().count();
        message.timestamp_ms = fragment.timestamp_ms;

        if fragment.is_final {
            message.is_final = true;
            vec![TranscriptEvent::Finalized {
                message: message.clone(),
            }]
        } else {
            vec![TranscriptEvent::Updated {
                message: message.clone(),
            }]
        }
    }
}

#[cfg(test)]
mod tests {
    use convo_agent_interface::Speaker;

    use crate::reconciler::test_support::{fragment, interrupt, reconciler};
    use crate::types::{RenderMode, TranscriptEvent};

    #[test]
    fn upsert_is_idempotent_for_final_fragments() {
        let mut rec = reconciler(RenderMode::Words);
        let done = fragment(1, Speaker::Agent, "hello there", true);

        let first = rec.apply(&done);
        assert_eq!(first.len(), 1);
        assert!(matches!(first[0], TranscriptEvent::Inserted { .. }));

        let before = rec.frame();
        let second = rec.apply(&done);
        assert!(second.is_empty());
        assert_eq!(rec.messages().len(), 1);
        assert_eq!(before.messages[0].content, rec.messages()[0].content);
    }

    #[test]
    fn partial_fragments_mutate_in_place() {
        let mut rec = reconciler(RenderMode::Words);
        rec.apply(&fragment(1, Speaker::Agent, "hel", false));
        let events = rec.apply(&fragment(1, Speaker::Agent, "hello", false));

        assert!(matches!(events[0], TranscriptEvent::Updated { .. }));
        assert_eq!(rec.messages().len(), 1);
        assert_eq!(rec.messages()[0].content, "hello");
        assert!(!rec.messages()[0].is_final);
    }

    #[test]
    fn finalizing_fragment_emits_finalized_not_updated() {
        let mut rec = reconciler(RenderMode::Words);
        rec.apply(&fragment(1, Speaker::Agent, "hello", false));
        let events = rec.apply(&fragment(1, Speaker::Agent, "hello there", true));

        assert_eq!(events.len(), 1);
        match &events[0] {
            TranscriptEvent::Finalized { message } => {
                assert_eq!(message.content, "hello there");
                assert!(message.is_final);
            }
            other => panic!("expected Finalized, got {other:?}"),
        }
    }

    #[test]
    fn interrupt_finalizes_live_message_in_place() {
        let mut rec = reconciler(RenderMode::Words);
        rec.apply(&fragment(3, Speaker::Agent, "as I was say", false));
        let events = rec.apply(&interrupt(3));

        assert_eq!(events.len(), 1);
        match &events[0] {
            TranscriptEvent::Finalized { message } => {
                assert!(message.is_interrupted && message.is_final);
                assert_eq!(message.content, "as I was say");
            }
            other => panic!("expected Finalized, got {other:?}"),
        }
    }

    #[test]
    fn interrupt_does_not_reopen_finalized_message() {
        let mut rec = reconciler(RenderMode::Words);
        rec.apply(&fragment(3, Speaker::Agent, "done", true));
        assert!(rec.apply(&interrupt(3)).is_empty());
        assert!(!rec.messages()[0].is_interrupted);
    }

    #[test]
    fn interrupt_for_unknown_turn_without_text_is_dropped() {
        let mut rec = reconciler(RenderMode::Words);
        assert!(rec.apply(&interrupt(9)).is_empty());
        assert!(rec.messages().is_empty());
    }

    #[test]
    fn new_turn_after_final_starts_a_new_message() {
        let mut rec = reconciler(RenderMode::Words);
        rec.apply(&fragment(1, Speaker::Agent, "first", true));
        rec.apply(&fragment(2, Speaker::Agent, "second", false));

        assert_eq!(rec.messages().len(), 2);
        assert!(rec.messages()[0].is_final);
        assert!(!rec.messages()[1].is_final);
    }

    #[test]
    fn chunk_mode_shares_the_same_merge() {
        let mut rec = reconciler(RenderMode::Chunk);
        rec.apply(&fragment(1, Speaker::Agent, "a", false));
        rec.apply(&fragment(1, Speaker::Agent, "ab", true));
        assert_eq!(rec.messages().len(), 1);
        assert_eq!(rec.messages()[0].content, "ab");
        assert!(rec.messages()[0].is_final);
    }
}
