//! The play-through session.

use std::fmt;

use storyloom_core::engine::NarrativeEngine;
use storyloom_core::surface::{ContinuationControl, ParagraphId, PresentedChoice};
use uuid::Uuid;

/// Segments whose text contains this phrase (any case) are never shown.
pub const SUPPRESSED_PHRASE: &str = "fate frowns";

/// Whether a segment must be dropped from the transcript.
#[must_use]
pub fn is_suppressed_text(text: &str) -> bool {
    text.to_lowercase().contains(SUPPRESSED_PHRASE)
}

/// The first segment of the next scene, held back until the player continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransition {
    /// Opening text of the new scene (may be blank).
    pub text: String,
    /// Tags to dispatch when the new scene is shown.
    pub tags: Vec<String>,
}

/// Where the session is in the advance / present / commit loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Created, nothing pulled yet.
    Started,
    /// Choices are on screen.
    AwaitingChoice(Vec<PresentedChoice>),
    /// A choice was applied to the engine but its outcome was not pulled.
    Resolving,
    /// A choice was committed; the continuation control is on screen.
    AwaitingContinuation(ContinuationControl),
    /// The story has no more choices.
    Ended,
}

impl Phase {
    /// Short description used in error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started => "starting",
            Self::AwaitingChoice(_) => "awaiting a choice",
            Self::Resolving => "resolving a choice",
            Self::AwaitingContinuation(_) => "awaiting continuation",
            Self::Ended => "ended",
        }
    }
}

/// One active play-through of a project.
///
/// Owns the only engine handle, so pull loops cannot overlap.
pub struct Session {
    /// Session identifier, used for tracing.
    pub id: Uuid,
    project_id: String,
    pub(crate) engine: Box<dyn NarrativeEngine>,
    pub(crate) pending: Option<PendingTransition>,
    pub(crate) phase: Phase,
    next_paragraph: u64,
}

impl Session {
    /// Wraps a freshly created (and possibly restored) engine.
    #[must_use]
    pub fn new(project_id: impl Into<String>, engine: Box<dyn NarrativeEngine>) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id: project_id.into(),
            engine,
            pending: None,
            phase: Phase::Started,
            next_paragraph: 0,
        }
    }

    /// The project being played.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The buffered scene transition, if one is waiting.
    #[must_use]
    pub fn pending_transition(&self) -> Option<&PendingTransition> {
        self.pending.as_ref()
    }

    /// Allocates the next paragraph id.
    pub(crate) fn next_paragraph_id(&mut self) -> ParagraphId {
        self.next_paragraph += 1;
        ParagraphId(self.next_paragraph)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("project_id", &self.project_id)
            .field("pending", &self.pending)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}
