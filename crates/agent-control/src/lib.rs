mod client;
mod error;
mod types;

pub use client::{AgentControl, BoxFuture, ControlClient};
pub use error::Error;
pub use types::{
    AdvancedFeatures, AsrConfig, AvatarConfig, ERROR_AVATAR_LIMIT_EXCEEDED,
    ERROR_RESOURCE_LIMIT_EXCEEDED, LlmConfig, PingRequest, StartAgentData, StartAgentRequest,
    StopAgentRequest, TtsConfig, VadConfig,
};
