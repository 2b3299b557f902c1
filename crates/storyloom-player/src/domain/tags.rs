//! Tag parsing and the scene-transition classifier.
//!
//! Tags are free-form authoring annotations of the form `KEY:VALUE` or a bare
//! keyword. Each tag is parsed once into a [`ParsedTag`]; unrecognized tags
//! parse to [`TagCue::Unknown`] and are ignored by dispatch.

/// The side effect a tag asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagCue {
    /// `IMAGE:<file>`: swap the background image.
    Image(String),
    /// `AMBIENCE:<name>` or `AUDIO:<name>`: switch the ambient track.
    Audio(String),
    /// `SILENCE` or `STOP_AUDIO`: stop the ambient track.
    Silence,
    /// Anything else.
    Unknown,
}

/// A tag together with its transition classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTag {
    /// Dispatch cue.
    pub cue: TagCue,
    /// Whether this tag marks the start of a new image-backed scene.
    pub transition: bool,
}

impl ParsedTag {
    /// Parses a single tag.
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        Self {
            cue: parse_cue(tag),
            transition: marks_scene_transition(tag),
        }
    }
}

fn parse_cue(tag: &str) -> TagCue {
    let tag = tag.trim();
    if let Some(file) = value_after(tag, "IMAGE:") {
        return TagCue::Image(file);
    }
    if let Some(name) = value_after(tag, "AMBIENCE:").or_else(|| value_after(tag, "AUDIO:")) {
        return TagCue::Audio(name);
    }
    if tag.eq_ignore_ascii_case("SILENCE") || tag.eq_ignore_ascii_case("STOP_AUDIO") {
        return TagCue::Silence;
    }
    TagCue::Unknown
}

fn value_after(tag: &str, prefix: &str) -> Option<String> {
    let value = tag.strip_prefix(prefix)?.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

/// Whether one tag, uppercased, mentions `IMAGE` without `REWARD` or `ITEM`.
#[must_use]
pub fn marks_scene_transition(tag: &str) -> bool {
    let tag = tag.to_uppercase();
    tag.contains("IMAGE") && !tag.contains("REWARD") && !tag.contains("ITEM")
}

/// Parses a tag list, keeping its order.
#[must_use]
pub fn parse_tags(tags: &[String]) -> Vec<ParsedTag> {
    tags.iter().map(|tag| ParsedTag::parse(tag)).collect()
}

/// Whether a parsed tag list signals a scene transition.
#[must_use]
pub fn is_scene_transition(tags: &[ParsedTag]) -> bool {
    tags.iter().any(|tag| tag.transition)
}
