//! Narrative engine capability.
//!
//! The engine is a black box: it evaluates the compiled story, hands out text
//! segments with their tags one at a time, exposes the current choices, and
//! serializes its own state as an opaque string.

use serde::{Deserialize, Serialize};

use crate::error::PlayerError;

/// One piece of story text together with the tags attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorySegment {
    /// The text as emitted by the engine (may be blank).
    pub text: String,
    /// Tags attached to this segment, in authoring order.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl StorySegment {
    /// Creates a segment from text and tags.
    #[must_use]
    pub fn new(text: impl Into<String>, tags: &[&str]) -> Self {
        Self {
            text: text.into(),
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
        }
    }
}

/// A choice offered by the engine at a branch point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Display text.
    pub text: String,
    /// Index to pass back to [`NarrativeEngine::choose_choice`].
    pub index: usize,
    /// Tags attached to the choice.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A running story instance.
///
/// Implementations are not re-entrant; the controller holds the only handle
/// and drives it from one pull loop at a time.
pub trait NarrativeEngine: Send {
    /// Returns whether another text segment is available.
    fn can_continue(&self) -> bool;

    /// Pulls the next text segment and its tags.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Engine` if the story cannot continue.
    fn continue_step(&mut self) -> Result<StorySegment, PlayerError>;

    /// Returns the choices currently on offer. Empty when the story has ended
    /// or when more text is pending.
    fn current_choices(&self) -> Vec<Choice>;

    /// Selects a choice by its engine index.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Engine` if the index is not selectable.
    fn choose_choice(&mut self, index: usize) -> Result<(), PlayerError>;

    /// Serializes the engine state as an opaque string.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Engine` if the state cannot be serialized.
    fn serialize_state(&self) -> Result<String, PlayerError>;

    /// Restores the engine state from a string produced by
    /// [`NarrativeEngine::serialize_state`].
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::MalformedSave` if the payload is not a valid state.
    fn restore_state(&mut self, state: &str) -> Result<(), PlayerError>;
}

/// Builds engine instances from compiled story payloads.
pub trait EngineFactory: Send + Sync {
    /// Creates a fresh engine for the given compiled story.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::StoryPayload` if the payload cannot be parsed, or
    /// `PlayerError::EngineUnavailable` if no engine can be constructed.
    fn create(&self, payload: &str) -> Result<Box<dyn NarrativeEngine>, PlayerError>;
}
