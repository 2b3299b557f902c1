//! Render surface abstraction and the values drawn on it.
//!
//! The controller never touches a UI toolkit directly; it calls through a
//! [`RenderSurface`]. Surfaces treat missing targets as no-ops, so every
//! method is infallible.

use std::time::Duration;

use serde::Serialize;

use crate::effects::{FadePlan, RevealPlan};

/// Identifier of a rendered paragraph, unique within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ParagraphId(pub u64);

/// How a paragraph is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphStyle {
    /// Regular scene narration.
    Narration,
    /// Text shown between a choice and the next scene boundary.
    Outcome,
}

/// A paragraph appended to the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    /// Session-unique identifier, targeted by reveal steps.
    pub id: ParagraphId,
    /// Paragraph text.
    pub text: String,
    /// Tags of the segment the text came from.
    pub tags: Vec<String>,
    /// Styling.
    pub style: ParagraphStyle,
    /// Letter-by-letter reveal; `None` shows the text at once.
    pub reveal: Option<RevealPlan>,
}

/// Classification of a choice from its tags or text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChoiceMood {
    /// Leads to a bad or deadly outcome.
    pub bad: bool,
    /// Leads to an exquisite or rewarding outcome.
    pub exquisite: bool,
}

impl ChoiceMood {
    /// The continuation shown after committing a choice of this mood.
    /// A bad outcome outranks an exquisite one.
    #[must_use]
    pub fn continuation_kind(self) -> ContinuationKind {
        if self.bad {
            ContinuationKind::Bad
        } else if self.exquisite {
            ContinuationKind::Exquisite
        } else {
            ContinuationKind::Proceed
        }
    }
}

/// A choice as rendered for the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresentedChoice {
    /// Engine index of the choice.
    pub index: usize,
    /// Display text.
    pub text: String,
    /// Tags attached to the choice.
    pub tags: Vec<String>,
    /// Pre-computed classification.
    pub mood: ChoiceMood,
}

/// Flavor of the continuation control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuationKind {
    /// Ordinary continuation.
    Proceed,
    /// The choice was marked exquisite; styled gold.
    Exquisite,
    /// The choice was marked bad; styled red.
    Bad,
    /// The story has ended; activating it restarts.
    EndOfStory,
}

impl ContinuationKind {
    /// Button label for this kind.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Proceed => "Proceed to next scene",
            Self::Exquisite => "Excellent choice - proceed to next scene",
            Self::Bad => "Your fate is unknown to the author - choose another outcome",
            Self::EndOfStory => "End of Story. Restart?",
        }
    }
}

/// The manual gate shown after a choice or at the end of the story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContinuationControl {
    /// Flavor of the control.
    pub kind: ContinuationKind,
    /// Button label.
    pub label: String,
    /// Tags of the choice that led here.
    pub choice_tags: Vec<String>,
}

impl ContinuationControl {
    /// Builds a control of the given kind.
    #[must_use]
    pub fn new(kind: ContinuationKind, choice_tags: Vec<String>) -> Self {
        Self {
            kind,
            label: kind.label().to_owned(),
            choice_tags,
        }
    }
}

/// Background image change.
///
/// Surfaces preload `path`, then fade out, swap after `swap_delay`, and fade
/// back in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCue {
    /// File name as authored.
    pub file: String,
    /// Resolved path.
    pub path: String,
    /// Reward images pulse and show the reward banner; others clear both.
    pub reward: bool,
    /// Delay between fading out and swapping the source.
    pub swap_delay: Duration,
}

/// Ambient track change.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioCue {
    /// Track file name (with extension).
    pub track: String,
    /// Resolved path.
    pub path: String,
    /// Fade-in from silence.
    pub fade: FadePlan,
}

/// The UI the controller draws on.
pub trait RenderSurface: Send + Sync {
    /// Removes every paragraph from the transcript.
    fn clear_transcript(&self);

    /// Appends a paragraph to the transcript.
    fn render_text(&self, paragraph: &Paragraph);

    /// Replaces the choice area with the given choices.
    fn render_choices(&self, choices: &[PresentedChoice]);

    /// Replaces the choice area with a single continuation control.
    fn render_continuation(&self, control: &ContinuationControl);

    /// Changes the background image.
    fn show_image(&self, cue: &ImageCue);

    /// Starts an ambient track.
    fn play_audio(&self, cue: &AudioCue);

    /// Stops ambient audio immediately.
    fn stop_audio(&self);

    /// Shows an inline error message.
    fn report_error(&self, message: &str);
}
