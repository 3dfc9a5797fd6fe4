pub mod id;
pub mod input;
pub mod reconciler;
pub mod typewriter;
pub mod types;

pub use id::{IdGenerator, SequentialIdGen, UuidIdGen};
pub use input::fragment_from_message;
pub use reconciler::TranscriptReconciler;
pub use typewriter::{CHARS_PER_TICK, REVEAL_TICK, Typewriter};
pub use types::{Message, MessageKey, MessageKind, RenderMode, TranscriptEvent, TranscriptFrame};
