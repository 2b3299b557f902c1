//! Player error types.

use thiserror::Error;

/// Top-level error type shared by the player and its adapters.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// A manifest, story or asset could not be fetched.
    #[error("transport error: {0}")]
    Transport(String),

    /// A project or asset does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The compiled story payload could not be parsed by the engine.
    #[error("story payload rejected: {0}")]
    StoryPayload(String),

    /// No narrative engine is available to run the story.
    #[error("narrative engine unavailable: {0}")]
    EngineUnavailable(String),

    /// A save payload could not be restored.
    #[error("malformed save payload: {0}")]
    MalformedSave(String),

    /// The narrative engine failed while running the story.
    #[error("narrative engine error: {0}")]
    Engine(String),

    /// An operation needed a running session but none is active.
    #[error("no active session")]
    NoActiveSession,

    /// The operation is not valid in the session's current phase.
    #[error("cannot {action} while {phase}")]
    UnexpectedAction {
        /// The attempted action.
        action: &'static str,
        /// The phase the session was in.
        phase: &'static str,
    },

    /// The selected choice is not among the presented ones.
    #[error("choice {index} is not available ({available} presented)")]
    InvalidChoice {
        /// The requested choice index.
        index: usize,
        /// How many choices are presented.
        available: usize,
    },

    /// The project has no saved progress to resume.
    #[error("no saved progress for project {0}")]
    NoSavedProgress(String),

    /// The key-value store failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Input failed validation.
    #[error("validation error: {0}")]
    Validation(String),
}
