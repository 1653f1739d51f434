use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Link errors
    #[error("Link error: {0}")]
    Link(String),

    #[error("No configuration resolved for reader: {0}")]
    NoConfiguration(String),

    #[error("No open link handle available")]
    NoHandle,

    // Read errors
    #[error("Frame read failed: {0}")]
    FrameRead(String),

    // Dispatch errors
    #[error("Handler failed in {stage}: {message}")]
    Handler { stage: String, message: String },

    #[error("Validator failed: {0}")]
    Validator(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a handler error for a named dispatch stage.
    pub fn handler(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Handler {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
