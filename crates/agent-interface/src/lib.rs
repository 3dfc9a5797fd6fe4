pub mod message;
pub mod parser;
pub mod transport;

pub use message::{
    AgentActivity, ChannelMessage, Speaker, TranscriptFragment, TurnStatus,
};
pub use parser::{MessageParser, ParseError};
pub use transport::{LinkChangeReason, LinkState, OfflineReason, TransportEvent};
