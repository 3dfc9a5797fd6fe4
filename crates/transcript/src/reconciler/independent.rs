//! Independent mode: a single continuous micro-turn stream with no turn ids.
//!
//! Turn boundaries are inferred: a fragment starts a new message when the
//! list is empty, the tail belongs to the other speaker, or the tail was
//! already finalized. Otherwise it mutates the tail in place. Ordering is
//! plain arrival time.

use convo_agent_interface::TranscriptFragment;

use super::TranscriptReconciler;
use crate::types::{Message, MessageKind, TranscriptEvent};

impl TranscriptReconciler {
    pub(super) fn apply_independent(
        &mut self,
        fragment: &TranscriptFragment,
    ) -> Vec<TranscriptEvent> {
        if fragment.is_interrupted {
            // Without keys an interruption can only cut the live tail.
            if let Some(last) = self.messages.last_mut() {
                if last.speaker == fragment.speaker && !last.is_final {
                    last.is_final = true;
                    last.is_interrupted = true;
                    return vec![TranscriptEvent::Finalized {
                        message: last.clone(),
                    }];
                }
            }
            return Vec::new();
        }

        let start_new = match self.messages.last() {
            None => true,
            Some(last) => last.speaker != fragment.speaker || last.is_final,
        };

        if start_new {
            let message = Message {
                id: self.ids.next_id(),
                turn_id: 0,
                local_turn: 0,
                speaker: fragment.speaker,
                kind: MessageKind::Text,
                content: fragment.text.clone(),
                transcript: fragment.text.clone(),
                reveal_index: fragment.text.chars().count(),
                is_final: fragment.is_final,
                is_interrupted: false,
                timestamp_ms: fragment.timestamp_ms,
            };
            self.messages.push(message.clone());
            self.sort_by_timestamp();
            return vec![TranscriptEvent::Inserted { message }];
        }

        let Some(last) = self.messages.last_mut() else {
            return Vec::new();
        };
        last.content = fragment.text.clone();
        last.transcript = fragment.text.clone();
        last.reveal_index = last.content.chars().count();
        last.timestamp_ms = fragment.timestamp_ms;

        if fragment.is_final {
            last.is_final = true;
            vec![TranscriptEvent::Finalized {
                message: last.clone(),
            }]
        } else {
            vec![TranscriptEvent::Updated {
                message: last.clone(),
            }]
        }
    }
}

#[cfg(test)]
mod tests {
    use convo_agent_interface::{Speaker, TranscriptFragment};

    use crate::reconciler::test_support::reconciler;
    use crate::types::{RenderMode, TranscriptEvent};

    fn frag(speaker: Speaker, text: &str, is_final: bool, timestamp_ms: i64) -> TranscriptFragment {
        TranscriptFragment {
            turn_id: 0,
            speaker,
            text: text.to_string(),
            is_final,
            is_interrupted: false,
            timestamp_ms,
        }
    }

    #[test]
    fn finality_starts_a_new_message_for_same_speaker() {
        let mut rec = reconciler(RenderMode::Independent);
        rec.apply(&frag(Speaker::Agent, "a", false, 1));
        rec.apply(&frag(Speaker::Agent, "ab", true, 2));
        rec.apply(&frag(Speaker::Agent, "c", false, 3));

        let rows: Vec<_> = rec
            .messages()
            .iter()
            .map(|m| (m.content.as_str(), m.is_final))
            .collect();
        assert_eq!(rows, [("ab", true), ("c", false)]);
    }

    #[test]
    fn speaker_change_starts_a_new_message() {
        let mut rec = reconciler(RenderMode::Independent);
        rec.apply(&frag(Speaker::User, "hello", false, 1));
        let events = rec.apply(&frag(Speaker::Agent, "hi", false, 2));

        assert!(matches!(events[0], TranscriptEvent::Inserted { .. }));
        assert_eq!(rec.messages().len(), 2);
        // The user's message stays live; only the tail mutates.
        rec.apply(&frag(Speaker::Agent, "hi there", false, 3));
        assert_eq!(rec.messages()[0].content, "hello");
        assert_eq!(rec.messages()[1].content, "hi there");
    }

    #[test]
    fn live_tail_mutates_in_place() {
        let mut rec = reconciler(RenderMode::Independent);
        rec.apply(&frag(Speaker::User, "h", false, 1));
        let events = rec.apply(&frag(Speaker::User, "hey", false, 2));

        assert!(matches!(events[0], TranscriptEvent::Updated { .. }));
        assert_eq!(rec.messages().len(), 1);
        assert_eq!(rec.messages()[0].content, "hey");
    }

    #[test]
    fn messages_order_by_timestamp() {
        let mut rec = reconciler(RenderMode::Independent);
        rec.apply(&frag(Speaker::User, "one", true, 10));
        rec.apply(&frag(Speaker::Agent, "two", true, 20));
        rec.apply(&frag(Speaker::User, "three", true, 30));

        let times: Vec<_> = rec.messages().iter().map(|m| m.timestamp_ms).collect();
        assert_eq!(times, [10, 20, 30]);
    }

    #[test]
    fn interrupt_cuts_only_a_live_same_speaker_tail() {
        let mut rec = reconciler(RenderMode::Independent);
        rec.apply(&frag(Speaker::Agent, "talking", false, 1));

        let cut = TranscriptFragment {
            turn_id: 0,
            speaker: Speaker::Agent,
            text: String::new(),
            is_final: true,
            is_interrupted: true,
            timestamp_ms: 2,
        };
        let events = rec.apply(&cut);
        assert!(matches!(events[0], TranscriptEvent::Finalized { .. }));
        assert!(rec.messages()[0].is_interrupted);

        // Second interrupt is a no-op.
        assert!(rec.apply(&cut).is_empty());
    }
}
