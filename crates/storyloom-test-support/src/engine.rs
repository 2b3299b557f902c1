//! Scripted narrative engine — a deterministic `NarrativeEngine` for tests.
//!
//! A [`Script`] is a set of named knots. Each knot emits its lines in order
//! and then offers its choices; choosing one jumps to the first line of the
//! target knot. A knot without choices ends the story. Scripts serialize to
//! JSON, which doubles as the "compiled story payload" handed to
//! [`ScriptedEngineFactory`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use storyloom_core::engine::{Choice, EngineFactory, NarrativeEngine, StorySegment};
use storyloom_core::error::PlayerError;

/// A choice within a knot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptChoice {
    /// Display text.
    pub text: String,
    /// Choice tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Knot to jump to.
    pub target: String,
}

/// A named run of lines followed by choices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Knot {
    /// Lines emitted in order.
    #[serde(default)]
    pub lines: Vec<StorySegment>,
    /// Choices offered once every line has been emitted.
    #[serde(default)]
    pub choices: Vec<ScriptChoice>,
}

impl Knot {
    /// Create an empty knot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line.
    #[must_use]
    pub fn line(mut self, text: &str, tags: &[&str]) -> Self {
        self.lines.push(StorySegment::new(text, tags));
        self
    }

    /// Append a choice.
    #[must_use]
    pub fn choice(mut self, text: &str, tags: &[&str], target: &str) -> Self {
        self.choices.push(ScriptChoice {
            text: text.to_owned(),
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
            target: target.to_owned(),
        });
        self
    }
}

/// A complete scripted story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    /// Name of the first knot.
    pub start: String,
    /// Knots by name.
    pub knots: BTreeMap<String, Knot>,
}

impl Script {
    /// Create a script starting at `start`.
    #[must_use]
    pub fn new(start: &str) -> Self {
        Self {
            start: start.to_owned(),
            knots: BTreeMap::new(),
        }
    }

    /// Add a knot.
    #[must_use]
    pub fn knot(mut self, name: &str, knot: Knot) -> Self {
        self.knots.insert(name.to_owned(), knot);
        self
    }

    /// Serialize to the payload accepted by [`ScriptedEngineFactory`].
    ///
    /// # Panics
    ///
    /// Panics if serialization fails, which cannot happen for this type.
    #[must_use]
    pub fn to_payload(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Cursor {
    knot: String,
    line: usize,
}

/// Engine that walks a [`Script`].
#[derive(Debug, Clone)]
pub struct ScriptedEngine {
    script: Script,
    cursor: Cursor,
}

impl ScriptedEngine {
    /// Create an engine positioned at the script's start knot.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::StoryPayload` if the start knot is missing.
    pub fn new(script: Script) -> Result<Self, PlayerError> {
        if !script.knots.contains_key(&script.start) {
            return Err(PlayerError::StoryPayload(format!(
                "start knot {} is not defined",
                script.start
            )));
        }
        let cursor = Cursor {
            knot: script.start.clone(),
            line: 0,
        };
        Ok(Self { script, cursor })
    }

    fn knot(&self) -> Option<&Knot> {
        self.script.knots.get(&self.cursor.knot)
    }
}

impl NarrativeEngine for ScriptedEngine {
    fn can_continue(&self) -> bool {
        self.knot()
            .is_some_and(|knot| self.cursor.line < knot.lines.len())
    }

    fn continue_step(&mut self) -> Result<StorySegment, PlayerError> {
        let segment = self
            .knot()
            .and_then(|knot| knot.lines.get(self.cursor.line))
            .cloned()
            .ok_or_else(|| PlayerError::Engine("cannot continue: no more content".into()))?;
        self.cursor.line += 1;
        Ok(segment)
    }

    fn current_choices(&self) -> Vec<Choice> {
        if self.can_continue() {
            return Vec::new();
        }
        self.knot()
            .map(|knot| {
                knot.choices
                    .iter()
                    .enumerate()
                    .map(|(index, choice)| Choice {
                        text: choice.text.clone(),
                        index,
                        tags: choice.tags.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn choose_choice(&mut self, index: usize) -> Result<(), PlayerError> {
        if self.can_continue() {
            return Err(PlayerError::Engine("choices are not available yet".into()));
        }
        let target = self
            .knot()
            .and_then(|knot| knot.choices.get(index))
            .map(|choice| choice.target.clone())
            .ok_or_else(|| PlayerError::Engine(format!("choice index {index} out of range")))?;
        if !self.script.knots.contains_key(&target) {
            return Err(PlayerError::Engine(format!("knot {target} is not defined")));
        }
        self.cursor = Cursor {
            knot: target,
            line: 0,
        };
        Ok(())
    }

    fn serialize_state(&self) -> Result<String, PlayerError> {
        serde_json::to_string(&self.cursor)
            .map_err(|e| PlayerError::Engine(format!("state serialization failed: {e}")))
    }

    fn restore_state(&mut self, state: &str) -> Result<(), PlayerError> {
        let cursor: Cursor = serde_json::from_str(state)
            .map_err(|e| PlayerError::MalformedSave(format!("invalid state JSON: {e}")))?;
        let knot = self
            .script
            .knots
            .get(&cursor.knot)
            .ok_or_else(|| PlayerError::MalformedSave(format!("unknown knot {}", cursor.knot)))?;
        if cursor.line > knot.lines.len() {
            return Err(PlayerError::MalformedSave(format!(
                "line {} is past the end of knot {}",
                cursor.line, cursor.knot
            )));
        }
        self.cursor = cursor;
        Ok(())
    }
}

/// Factory that parses [`Script`] payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedEngineFactory;

impl EngineFactory for ScriptedEngineFactory {
    fn create(&self, payload: &str) -> Result<Box<dyn NarrativeEngine>, PlayerError> {
        let script: Script = serde_json::from_str(payload)
            .map_err(|e| PlayerError::StoryPayload(format!("invalid story JSON: {e}")))?;
        Ok(Box::new(ScriptedEngine::new(script)?))
    }
}

/// Factory that reports the engine as unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableEngineFactory;

impl EngineFactory for UnavailableEngineFactory {
    fn create(&self, _payload: &str) -> Result<Box<dyn NarrativeEngine>, PlayerError> {
        Err(PlayerError::EngineUnavailable("engine runtime not loaded".into()))
    }
}
