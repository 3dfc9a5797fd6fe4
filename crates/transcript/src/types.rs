use convo_agent_interface::Speaker;

/// Upsert key for keyed render modes: one live message per
/// `(turn_id, speaker)` at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageKey {
    pub turn_id: i64,
    pub speaker: Speaker,
}

/// How incoming fragments are merged and revealed. Selected once at session
/// start; modes are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Fragments overwrite message content directly, synchronized with the
    /// audio word stream. Default, lowest latency.
    Words,
    /// Same merge algorithm as `Words`; intermediate partials are coalesced
    /// to one visual update per frame by the renderer, not by us.
    Chunk,
    /// Visible content lags the authoritative transcript and is advanced by
    /// the typewriter at a fixed reveal rate.
    Text,
    /// No turn ids on the wire; turn boundaries are inferred from finality
    /// and speaker changes alone.
    Independent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    /// Locally originated attachment (no server turn yet); `content` holds
    /// the resource identifier.
    Attachment,
}

/// One row of the conversation. Owned exclusively by the reconciler;
/// observers only ever see clones.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct Message {
    pub id: String,
    /// Server turn id; negative for local attachment messages.
    pub turn_id: i64,
    /// For local messages, the server turn they interleave after. Equals
    /// `turn_id` for server messages.
    pub local_turn: i64,
    pub speaker: Speaker,
    pub kind: MessageKind,
    /// Visible text. In `Text` mode this lags `transcript` until revealed.
    pub content: String,
    /// Authoritative full text for the turn.
    pub transcript: String,
    /// Characters of `transcript` revealed so far (`Text` mode bookkeeping).
    pub reveal_index: usize,
    pub is_final: bool,
    pub is_interrupted: bool,
    pub timestamp_ms: i64,
}

impl Message {
    pub fn key(&self) -> MessageKey {
        MessageKey {
            turn_id: self.turn_id,
            speaker: self.speaker,
        }
    }
}

/// Reconciler output signals. Observers apply different behaviors per kind
/// (auto-scroll on insert/finalize, never on every content tick), so the
/// three are distinct variants rather than one "changed" event.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(tag = "type")]
pub enum TranscriptEvent {
    #[serde(rename = "messageInserted")]
    Inserted { message: Message },
    #[serde(rename = "messageContentUpdated")]
    Updated { message: Message },
    #[serde(rename = "messageFinalized")]
    Finalized { message: Message },
}

impl TranscriptEvent {
    pub fn message(&self) -> &Message {
        match self {
            Self::Inserted { message } | Self::Updated { message } | Self::Finalized { message } => {
                message
            }
        }
    }
}

/// Complete snapshot of the conversation at a point in time — the rendering
/// contract. Renderers receive this (or event clones), never references into
/// the reconciler's own list.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct TranscriptFrame {
    pub messages: Vec<Message>,
}
