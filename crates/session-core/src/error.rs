#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("a session is already running")]
    SessionAlreadyRunning,

    #[error("failed to spawn actor: {0}")]
    Spawn(#[from] ractor::SpawnErr),

    #[error("actor messaging failed: {0}")]
    Messaging(String),

    #[error(transparent)]
    Control(#[from] convo_agent_control::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
