//! Choice classification.
//!
//! Tags are checked first: a lowercased tag containing `bad` or `death` marks
//! the choice BAD, one containing `exquisite` or `reward` marks it EXQUISITE.
//! Only when no tag matched either family is the display text scanned for
//! `bad` / `exquisite`. Both flags may be set; see
//! [`ChoiceMood::continuation_kind`] for how they combine.

use storyloom_core::engine::Choice;
use storyloom_core::surface::{ChoiceMood, PresentedChoice};

const BAD_TAG_KEYWORDS: [&str; 2] = ["bad", "death"];
const EXQUISITE_TAG_KEYWORDS: [&str; 2] = ["exquisite", "reward"];

/// Classifies a choice from its tags, falling back to its text.
#[must_use]
pub fn classify_choice(choice: &Choice) -> ChoiceMood {
    let lowered: Vec<String> = choice.tags.iter().map(|t| t.to_lowercase()).collect();
    let mentions = |keywords: &[&str]| {
        lowered
            .iter()
            .any(|tag| keywords.iter().any(|keyword| tag.contains(keyword)))
    };

    let mood = ChoiceMood {
        bad: mentions(&BAD_TAG_KEYWORDS),
        exquisite: mentions(&EXQUISITE_TAG_KEYWORDS),
    };
    if mood.bad || mood.exquisite {
        return mood;
    }

    let text = choice.text.to_lowercase();
    ChoiceMood {
        bad: text.contains("bad"),
        exquisite: text.contains("exquisite"),
    }
}

/// Classifies a choice and wraps it for rendering.
#[must_use]
pub fn present_choice(choice: &Choice) -> PresentedChoice {
    PresentedChoice {
        index: choice.index,
        text: choice.text.clone(),
        tags: choice.tags.clone(),
        mood: classify_choice(choice),
    }
}
