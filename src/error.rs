use thiserror::Error;

use crate::types::CommandId;

#[derive(Debug, Error)]
pub enum DialerError {
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("DTMF transmit failed: {0}")]
    Transmit(String),

    #[error("Presence change failed: {0}")]
    Presence(String),

    #[error("Component registration failed: {0}")]
    Registration(String),

    #[error("Lifecycle subscription failed: {0}")]
    Subscription(String),

    #[error("No handler registered for command {0}")]
    MissingHandler(CommandId),

    #[error("Unknown command key: {0}")]
    UnknownCommand(String),

    #[error("Session closed")]
    SessionClosed,

    #[error("Config error: {0}")]
    Config(String),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DialerError>;
