//! # Turn-keyed transcript reconciliation
//!
//! Fragments for one turn arrive repeatedly, out of order across turns, and
//! may be cut short by an interruption. The reconciler folds that stream
//! into one ordered message list under the session's [`RenderMode`]:
//!
//! **Keyed modes** (`Words`, `Chunk`, `Text`) — upsert by
//! `(turn_id, speaker)`. A finalized turn never reopens; a fragment with a
//! different turn id starts a new message. The list re-sorts on every
//! insert because turn ids are not monotone on arrival.
//!
//! **Independent mode** — the wire carries no turn ids; a new message
//! starts when the list is empty, the speaker changes, or the previous
//! message was already final.
//!
//! Observers receive [`TranscriptEvent`] clones; the backing list is never
//! exposed mutably.

mod independent;
mod standard;
mod text;

use std::cmp::Ordering;

use convo_agent_interface::{Speaker, TranscriptFragment};

use crate::id::{IdGenerator, UuidIdGen};
use crate::typewriter::Typewriter;
use crate::types::{Message, MessageKey, MessageKind, RenderMode, TranscriptEvent, TranscriptFrame};

pub struct TranscriptReconciler {
    mode: RenderMode,
    messages: Vec<Message>,
    ids: Box<dyn IdGenerator>,
    reveal: Typewriter,
}

impl TranscriptReconciler {
    pub fn new(mode: RenderMode) -> Self {
        Self::with_id_gen(mode, UuidIdGen)
    }

    pub fn with_id_gen(mode: RenderMode, ids: impl IdGenerator + 'static) -> Self {
        Self {
            mode,
            messages: Vec::new(),
            ids: Box::new(ids),
            reveal: Typewriter::new(),
        }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Merge one fragment. Returns the notifications the observer must see,
    /// in order. Fragments with nothing to say (empty text, not an
    /// interruption) are dropped.
    pub fn apply(&mut self, fragment: &TranscriptFragment) -> Vec<TranscriptEvent> {
        if fragment.text.is_empty() && !fragment.is_interrupted {
            tracing::debug!(
                turn_id = fragment.turn_id,
                "dropping_empty_transcript_fragment"
            );
            return Vec::new();
        }

        match self.mode {
            RenderMode::Words | RenderMode::Chunk => self.apply_standard(fragment),
            RenderMode::Text => self.apply_text(fragment),
            RenderMode::Independent => self.apply_independent(fragment),
        }
    }

    /// Insert a locally originated attachment message. It has no server turn
    /// yet, so it gets a synthetic negative turn id scoped to the greatest
    /// server turn seen so far and interleaves after that turn.
    pub fn push_local_attachment(
        &mut self,
        uri: impl Into<String>,
        timestamp_ms: i64,
    ) -> Vec<TranscriptEvent> {
        let last_turn = self
            .messages
            .iter()
            .filter(|m| m.turn_id >= 0)
            .map(|m| m.turn_id)
            .max()
            .unwrap_or(0);
        let local_count = self
            .messages
            .iter()
            .filter(|m| m.turn_id < 0 && m.local_turn == last_turn)
            .count() as i64;

        let message = Message {
            id: self.ids.next_id(),
            turn_id: -(local_count + 1),
            local_turn: last_turn,
            speaker: Speaker::User,
            kind: MessageKind::Attachment,
            content: uri.into(),
            transcript: String::new(),
            reveal_index: 0,
            is_final: true,
            is_interrupted: false,
            timestamp_ms,
        };
        self.messages.push(message.clone());
        self.sort_standard();
        vec![TranscriptEvent::Inserted { message }]
    }

    /// Immutable snapshot for renderers.
    pub fn frame(&self) -> TranscriptFrame {
        TranscriptFrame {
            messages: self.messages.clone(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Session teardown: drop every message and cancel any in-flight reveal
    /// in one step so no stale tick can touch dead state.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.reveal.cancel();
    }

    // ── Internal ────────────────────────────────────────────────────────────

    fn index_of(&self, key: MessageKey) -> Option<usize> {
        self.messages.iter().position(|m| m.key() == key)
    }

    fn make_message(
        &mut self,
        fragment: &TranscriptFragment,
        content: String,
        is_final: bool,
    ) -> Message {
        Message {
            id: self.ids.next_id(),
            turn_id: fragment.turn_id,
            local_turn: fragment.turn_id,
            speaker: fragment.speaker,
            kind: MessageKind::Text,
            reveal_index: content.chars().count(),
            content,
            transcript: fragment.text.clone(),
            is_final,
            is_interrupted: fragment.is_interrupted,
            timestamp_ms: fragment.timestamp_ms,
        }
    }

    fn insert_sorted(&mut self, message: Message) {
        self.messages.push(message);
        self.sort_standard();
    }

    /// Stable sort for keyed modes. Server messages order by
    /// `(turn_id asc, user before agent)`; local attachment messages
    /// interleave after the server turn they were created under, newest
    /// synthetic id last (-1 before -2).
    fn sort_standard(&mut self) {
        self.messages.sort_by(standard_order);
    }

    fn sort_by_timestamp(&mut self) {
        self.messages.sort_by_key(|m| m.timestamp_ms);
    }
}

fn effective_turn(m: &Message) -> i64 {
    if m.turn_id >= 0 { m.turn_id } else { m.local_turn }
}

fn speaker_rank(speaker: Speaker) -> u8 {
    match speaker {
        Speaker::User => 0,
        Speaker::Agent => 1,
    }
}

fn standard_order(a: &Message, b: &Message) -> Ordering {
    effective_turn(a).cmp(&effective_turn(b)).then_with(|| {
        match (a.turn_id >= 0, b.turn_id >= 0) {
            (true, true) => speaker_rank(a.speaker).cmp(&speaker_rank(b.speaker)),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => b.turn_id.cmp(&a.turn_id),
        }
    })
}
