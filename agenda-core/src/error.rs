//! Error types for the agenda core.
//!
//! Recognition misses are never errors: the extractors report them through
//! `ParsedMeeting::missing`. These variants cover configuration, the remote
//! model boundary, the scheduling sink and conversation misuse.

use thiserror::Error;

/// Errors that can occur in agenda operations.
#[derive(Error, Debug)]
pub enum AgendaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Remote model request failed: {0}")]
    Remote(String),

    #[error("Remote model returned HTTP {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    #[error("Remote model returned an empty reply")]
    RemoteEmpty,

    #[error("Remote model unavailable, retrying in {0}s")]
    RemoteUnavailable(u64),

    #[error("No remote model configured")]
    RemoteNotConfigured,

    #[error("Scheduling failed: {0}")]
    Sink(String),

    #[error("Cannot {action} while conversation is {state}")]
    InvalidTransition { action: &'static str, state: String },

    #[error("A turn is already being processed")]
    TurnInFlight,

    #[error("Conversation was reset before the reply arrived")]
    StaleTurn,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AgendaError {
    /// Whether this error came from the remote model boundary and should
    /// send the turn to the local pipeline instead of the user.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            AgendaError::Remote(_)
                | AgendaError::RemoteStatus { .. }
                | AgendaError::RemoteEmpty
                | AgendaError::RemoteUnavailable(_)
                | AgendaError::RemoteNotConfigured
        )
    }
}

impl From<serde_json::Error> for AgendaError {
    fn from(e: serde_json::Error) -> Self {
        AgendaError::Serialization(e.to_string())
    }
}

/// Result type alias for agenda operations.
pub type AgendaResult<T> = Result<T, AgendaError>;
