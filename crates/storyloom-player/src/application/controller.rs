//! Session controller.
//!
//! Owns the active play-through and drives it through four phases:
//! *advance* pulls text until a branch point, *present* renders the choices,
//! *commit* applies a choice and buffers the next scene behind a
//! continuation control, and *proceed* applies the buffered scene and
//! advances again.

use std::sync::Arc;
use std::time::Duration;

use storyloom_core::assets::AssetTransport;
use storyloom_core::clock::Clock;
use storyloom_core::effects::{EffectGeneration, RevealPlan};
use storyloom_core::engine::{EngineFactory, NarrativeEngine, StorySegment};
use storyloom_core::error::PlayerError;
use storyloom_core::storage::{KeyValueStore, TYPEWRITER_PREFERENCE_KEY, save_state_key};
use storyloom_core::surface::{
    ContinuationControl, ContinuationKind, Paragraph, ParagraphStyle, RenderSurface,
};
use tracing::{debug, info, instrument, warn};

use crate::application::config::PlayerConfig;
use crate::application::tag_handler::TagHandler;
use crate::domain::choices::present_choice;
use crate::domain::gallery::UnlockedImageSet;
use crate::domain::session::{Phase, PendingTransition, Session, is_suppressed_text};
use crate::domain::tags::{is_scene_transition, parse_tags};

/// How a session was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStart {
    /// From the beginning of the story.
    Fresh,
    /// From a save payload.
    Restored,
    /// The save payload was rejected; started from the beginning instead.
    FellBack,
}

/// A save payload ready to be offered as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveExport {
    /// Suggested file name, `<project>_save_<unix-millis>.json`.
    pub file_name: String,
    /// Serialized engine state.
    pub contents: String,
}

#[derive(Debug)]
struct Typewriter {
    enabled: bool,
    speed: Duration,
    reveals: EffectGeneration,
}

impl Typewriter {
    fn plan(&self, text: &str) -> Option<RevealPlan> {
        self.enabled.then(|| RevealPlan {
            text: text.to_owned(),
            step: self.speed,
            token: self.reveals.token(),
        })
    }
}

struct ActiveSession {
    session: Session,
    tags: TagHandler,
}

/// Presentation controller for one player.
pub struct SessionController {
    config: PlayerConfig,
    engines: Arc<dyn EngineFactory>,
    assets: Arc<dyn AssetTransport>,
    store: Arc<dyn KeyValueStore>,
    surface: Arc<dyn RenderSurface>,
    clock: Arc<dyn Clock>,
    typewriter: Typewriter,
    active: Option<ActiveSession>,
}

impl SessionController {
    /// Creates a controller with no active session. The typewriter
    /// preference is read from the store, falling back to the configured
    /// default.
    pub fn new(
        config: PlayerConfig,
        engines: Arc<dyn EngineFactory>,
        assets: Arc<dyn AssetTransport>,
        store: Arc<dyn KeyValueStore>,
        surface: Arc<dyn RenderSurface>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let enabled = match store.get(TYPEWRITER_PREFERENCE_KEY) {
            Ok(Some(value)) => value == "true",
            Ok(None) => config.typewriter_default,
            Err(e) => {
                warn!(error = %e, "failed to read typewriter preference");
                config.typewriter_default
            }
        };
        let typewriter = Typewriter {
            enabled,
            speed: config.typewriter_speed(),
            reveals: EffectGeneration::new(),
        };
        Self {
            config,
            engines,
            assets,
            store,
            surface,
            clock,
            typewriter,
            active: None,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// The active session, if any.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.active.as_ref().map(|active| &active.session)
    }

    /// The unlock set of the active project.
    #[must_use]
    pub fn gallery(&self) -> Option<&UnlockedImageSet> {
        self.active.as_ref().map(|active| active.tags.gallery())
    }

    /// The ambient track currently playing.
    #[must_use]
    pub fn current_track(&self) -> Option<&str> {
        self.active
            .as_ref()
            .and_then(|active| active.tags.current_track())
    }

    /// Whether new narration is revealed letter by letter.
    #[must_use]
    pub fn typewriter_enabled(&self) -> bool {
        self.typewriter.enabled
    }

    /// Flips the typewriter preference and persists it. Returns the new
    /// state.
    pub fn toggle_typewriter(&mut self) -> bool {
        self.typewriter.enabled = !self.typewriter.enabled;
        let value = if self.typewriter.enabled { "true" } else { "false" };
        if let Err(e) = self.store.set(TYPEWRITER_PREFERENCE_KEY, value) {
            warn!(error = %e, "failed to persist typewriter preference");
        }
        self.typewriter.enabled
    }

    /// Starts a new session of `project_id`, optionally restoring a save,
    /// then advances to the first branch point. Failures are reported on the
    /// surface and returned; a failed start leaves any previous session in
    /// place.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Transport` / `NotFound` if the story cannot be
    /// fetched, `StoryPayload` or `EngineUnavailable` if no engine can be
    /// built, and `MalformedSave` if the save is rejected.
    #[instrument(skip(self, save), fields(restoring = save.is_some()))]
    pub async fn start_session(
        &mut self,
        project_id: &str,
        save: Option<&str>,
    ) -> Result<SessionStart, PlayerError> {
        self.open_session(project_id, save)
            .await
            .inspect_err(|e| self.surface.report_error(&e.to_string()))
    }

    /// Resumes the project's saved progress, falling back to a fresh session
    /// if the save is malformed.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::NoSavedProgress` if nothing is saved, or any
    /// error from starting the session.
    #[instrument(skip(self))]
    pub async fn resume_session(&mut self, project_id: &str) -> Result<SessionStart, PlayerError> {
        let saved = self
            .store
            .get(&save_state_key(project_id))
            .and_then(|saved| saved.ok_or_else(|| PlayerError::NoSavedProgress(project_id.to_owned())))
            .inspect_err(|e| self.surface.report_error(&e.to_string()))?;
        self.start_with_fallback(project_id, &saved).await
    }

    /// Starts a session from a user-supplied save payload, falling back to a
    /// fresh session if the payload is malformed.
    ///
    /// # Errors
    ///
    /// Returns any error from starting the session other than
    /// `MalformedSave`.
    #[instrument(skip(self, payload))]
    pub async fn import_save(
        &mut self,
        project_id: &str,
        payload: &str,
    ) -> Result<SessionStart, PlayerError> {
        self.start_with_fallback(project_id, payload).await
    }

    /// Starts the active project again from the beginning.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::NoActiveSession` without a session, or any error
    /// from starting the session.
    pub async fn restart(&mut self) -> Result<SessionStart, PlayerError> {
        let project_id = self
            .session()
            .map(|session| session.project_id().to_owned())
            .ok_or(PlayerError::NoActiveSession)?;
        self.start_session(&project_id, None).await
    }

    /// Pulls text until the engine stops, then presents the choices.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::NoActiveSession` without a session,
    /// `UnexpectedAction` while a continuation is pending, or any engine
    /// error.
    #[instrument(skip(self))]
    pub fn advance(&mut self) -> Result<(), PlayerError> {
        let active = self.active.as_mut().ok_or(PlayerError::NoActiveSession)?;
        if matches!(active.session.phase, Phase::AwaitingContinuation(_)) {
            return Err(PlayerError::UnexpectedAction {
                action: "advance",
                phase: active.session.phase.name(),
            });
        }
        pull_scene(active, self.surface.as_ref(), &self.typewriter)?;
        present(active, self.surface.as_ref());
        Ok(())
    }

    /// Re-renders the engine's current choices.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::NoActiveSession` without a session, or
    /// `UnexpectedAction` while a continuation is pending.
    pub fn present(&mut self) -> Result<(), PlayerError> {
        let active = self.active.as_mut().ok_or(PlayerError::NoActiveSession)?;
        if matches!(active.session.phase, Phase::AwaitingContinuation(_)) {
            return Err(PlayerError::UnexpectedAction {
                action: "present choices",
                phase: active.session.phase.name(),
            });
        }
        present(active, self.surface.as_ref());
        Ok(())
    }

    /// Applies a presented choice. Outcome text is pulled up to the next
    /// scene boundary, which is buffered until [`SessionController::proceed`].
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::NoActiveSession` without a session,
    /// `UnexpectedAction` when no choices are presented, `InvalidChoice` for
    /// an index that was not presented, or any engine error.
    #[instrument(skip(self))]
    pub fn commit(&mut self, choice_index: usize) -> Result<(), PlayerError> {
        let active = self.active.as_mut().ok_or(PlayerError::NoActiveSession)?;
        let chosen = match &active.session.phase {
            Phase::AwaitingChoice(choices) => choices
                .iter()
                .find(|choice| choice.index == choice_index)
                .cloned()
                .ok_or(PlayerError::InvalidChoice {
                    index: choice_index,
                    available: choices.len(),
                })?,
            phase => {
                return Err(PlayerError::UnexpectedAction {
                    action: "commit a choice",
                    phase: phase.name(),
                });
            }
        };

        active.session.engine.choose_choice(chosen.index)?;
        // The presented choices are stale from here on.
        active.session.phase = Phase::Resolving;
        if self.config.autosave {
            autosave(&active.session, self.store.as_ref());
        }
        active.tags.dispatch(&chosen.tags);

        let (outcome, pending) = pull_outcome(&mut active.session, &mut active.tags)?;
        if let Some(transition) = &pending {
            active.tags.record_unlocks(&transition.tags);
        }
        for paragraph in &outcome {
            self.surface.render_text(paragraph);
        }

        let control = ContinuationControl::new(chosen.mood.continuation_kind(), chosen.tags);
        self.surface.render_continuation(&control);
        debug!(
            outcome = outcome.len(),
            transition = pending.is_some(),
            kind = ?control.kind,
            "choice committed"
        );
        active.session.pending = pending;
        active.session.phase = Phase::AwaitingContinuation(control);
        Ok(())
    }

    /// Activates the continuation control. A buffered scene replaces the
    /// transcript; otherwise the outcome stays and the story advances below
    /// it.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::NoActiveSession` without a session,
    /// `UnexpectedAction` when no continuation is shown (use
    /// [`SessionController::restart`] once the story has ended), or any
    /// engine error.
    #[instrument(skip(self))]
    pub fn proceed(&mut self) -> Result<(), PlayerError> {
        let active = self.active.as_mut().ok_or(PlayerError::NoActiveSession)?;
        if !matches!(active.session.phase, Phase::AwaitingContinuation(_)) {
            return Err(PlayerError::UnexpectedAction {
                action: "proceed",
                phase: active.session.phase.name(),
            });
        }

        if let Some(transition) = active.session.pending.take() {
            self.typewriter.reveals.cancel();
            self.surface.clear_transcript();
            if !transition.text.trim().is_empty() {
                let paragraph = Paragraph {
                    id: active.session.next_paragraph_id(),
                    text: transition.text,
                    tags: transition.tags.clone(),
                    style: ParagraphStyle::Narration,
                    reveal: None,
                };
                self.surface.render_text(&paragraph);
            }
            active.tags.dispatch(&transition.tags);
            info!(session_id = %active.session.id, "entered new scene");
        }

        pull_scene(active, self.surface.as_ref(), &self.typewriter)?;
        present(active, self.surface.as_ref());
        Ok(())
    }

    /// Writes the engine state to the project's save slot.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::NoActiveSession` without a session, or any
    /// engine or storage error.
    pub fn save_progress(&self) -> Result<(), PlayerError> {
        let session = self.session().ok_or(PlayerError::NoActiveSession)?;
        let state = session.engine.serialize_state()?;
        self.store.set(&save_state_key(session.project_id()), &state)
    }

    /// Serializes the engine state for download.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::NoActiveSession` without a session, or any
    /// engine error.
    pub fn export_save(&self) -> Result<SaveExport, PlayerError> {
        let session = self.session().ok_or(PlayerError::NoActiveSession)?;
        let contents = session.engine.serialize_state()?;
        let file_name = format!(
            "{}_save_{}.json",
            session.project_id(),
            self.clock.unix_millis()
        );
        Ok(SaveExport {
            file_name,
            contents,
        })
    }

    async fn start_with_fallback(
        &mut self,
        project_id: &str,
        save: &str,
    ) -> Result<SessionStart, PlayerError> {
        match self.open_session(project_id, Some(save)).await {
            Err(PlayerError::MalformedSave(reason)) => {
                warn!(project_id, reason = %reason, "save rejected, starting fresh");
                self.surface.report_error(&format!(
                    "Saved progress could not be restored ({reason}); starting a new journey."
                ));
                self.open_session(project_id, None)
                    .await
                    .map(|_| SessionStart::FellBack)
                    .inspect_err(|e| self.surface.report_error(&e.to_string()))
            }
            result => result.inspect_err(|e| self.surface.report_error(&e.to_string())),
        }
    }

    async fn open_session(
        &mut self,
        project_id: &str,
        save: Option<&str>,
    ) -> Result<SessionStart, PlayerError> {
        if project_id.trim().is_empty() {
            return Err(PlayerError::Validation(
                "select an adventure from the list first".into(),
            ));
        }

        let payload = self.assets.fetch_story(project_id).await?;
        let mut engine = self.engines.create(&payload)?;
        if let Some(state) = save {
            info!(project_id, "restoring save state");
            engine.restore_state(state)?;
        }

        self.replace_session(project_id, engine);
        self.advance()?;
        Ok(if save.is_some() {
            SessionStart::Restored
        } else {
            SessionStart::Fresh
        })
    }

    fn replace_session(&mut self, project_id: &str, engine: Box<dyn NarrativeEngine>) {
        if let Some(mut previous) = self.active.take() {
            previous.tags.shutdown();
        }
        self.typewriter.reveals.cancel();
        self.surface.clear_transcript();

        let tags = TagHandler::load(
            project_id,
            &self.config,
            Arc::clone(&self.store),
            Arc::clone(&self.surface),
        );
        let session = Session::new(project_id, engine);
        info!(session_id = %session.id, project_id, "session started");
        self.active = Some(ActiveSession { session, tags });
    }
}

/// Pulls and renders narration until the engine stops.
fn pull_scene(
    active: &mut ActiveSession,
    surface: &dyn RenderSurface,
    typewriter: &Typewriter,
) -> Result<(), PlayerError> {
    while active.session.engine.can_continue() {
        let segment = active.session.engine.continue_step()?;
        if is_suppressed_text(&segment.text) {
            continue;
        }
        if !segment.text.trim().is_empty() {
            let paragraph = Paragraph {
                id: active.session.next_paragraph_id(),
                reveal: typewriter.plan(&segment.text),
                text: segment.text,
                tags: segment.tags.clone(),
                style: ParagraphStyle::Narration,
            };
            surface.render_text(&paragraph);
        }
        active.tags.dispatch(&segment.tags);
    }
    Ok(())
}

/// Renders the engine's choices, or the end-of-story control when there are
/// none.
fn present(active: &mut ActiveSession, surface: &dyn RenderSurface) {
    let choices = active.session.engine.current_choices();
    if choices.is_empty() {
        let control = ContinuationControl::new(ContinuationKind::EndOfStory, Vec::new());
        surface.render_continuation(&control);
        info!(session_id = %active.session.id, "story ended");
        active.session.phase = Phase::Ended;
        return;
    }
    let presented: Vec<_> = choices.iter().map(present_choice).collect();
    surface.render_choices(&presented);
    active.session.phase = Phase::AwaitingChoice(presented);
}

/// Pulls the text that follows a choice. Stops at the first scene
/// transition, which is returned instead of rendered.
fn pull_outcome(
    session: &mut Session,
    tags: &mut TagHandler,
) -> Result<(Vec<Paragraph>, Option<PendingTransition>), PlayerError> {
    let mut outcome = Vec::new();
    let mut pending = None;

    while session.engine.can_continue() {
        let segment = session.engine.continue_step()?;
        if is_suppressed_text(&segment.text) {
            debug!("suppressed segment dropped");
            continue;
        }
        let parsed = parse_tags(&segment.tags);
        if is_scene_transition(&parsed) {
            pending = Some(buffer_transition(session.engine.as_mut(), segment)?);
            break;
        }
        tags.dispatch_parsed(&parsed);
        if !segment.text.trim().is_empty() {
            outcome.push(Paragraph {
                id: session.next_paragraph_id(),
                text: segment.text,
                tags: segment.tags,
                style: ParagraphStyle::Outcome,
                reveal: None,
            });
        }
    }

    // The new scene should open with a line of text: borrow the last outcome
    // paragraph when the transition itself had none.
    if let Some(transition) = pending.as_mut()
        && transition.text.trim().is_empty()
        && let Some(last) = outcome.pop()
    {
        transition.text = last.text;
        transition.tags.extend(last.tags);
    }

    Ok((outcome, pending))
}

/// Builds the pending transition from a transition-tagged segment, pulling
/// the following segment when the tagged one carries no text.
fn buffer_transition(
    engine: &mut dyn NarrativeEngine,
    segment: StorySegment,
) -> Result<PendingTransition, PlayerError> {
    if !segment.text.trim().is_empty() || !engine.can_continue() {
        return Ok(PendingTransition {
            text: segment.text,
            tags: segment.tags,
        });
    }

    let next = engine.continue_step()?;
    let mut tags = segment.tags;
    if is_suppressed_text(&next.text) {
        return Ok(PendingTransition {
            text: segment.text,
            tags,
        });
    }
    tags.extend(next.tags);
    let text = if next.text.trim().is_empty() {
        segment.text
    } else {
        next.text
    };
    Ok(PendingTransition { text, tags })
}

fn autosave(session: &Session, store: &dyn KeyValueStore) {
    match session.engine.serialize_state() {
        Ok(state) => {
            if let Err(e) = store.set(&save_state_key(session.project_id()), &state) {
                warn!(project_id = session.project_id(), error = %e, "autosave failed");
            }
        }
        Err(e) => warn!(project_id = session.project_id(), error = %e, "autosave failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storyloom_test_support::{
        FailingTransport, FixedClock, Knot, MemoryAssets, MemoryStore, RecordingSurface, Script,
        ScriptedEngineFactory, SurfaceEvent, UnavailableEngineFactory,
    };

    fn cave_script() -> Script {
        Script::new("entrance")
            .knot(
                "entrance",
                Knot::new()
                    .line("You enter the cave.", &["IMAGE:cave.png"])
                    .choice("Go deeper", &["exquisite"], "deeper")
                    .choice("Turn back", &[], "outside"),
            )
            .knot(
                "deeper",
                Knot::new()
                    .line("Deeper now.", &["IMAGE:cave2.png"])
                    .line("Water drips somewhere.", &["AUDIO:drip"])
                    .choice("Light a torch", &[], "end"),
            )
            .knot(
                "outside",
                Knot::new()
                    .line("You leave.", &[])
                    .line("The Fate Frowns upon you", &["IMAGE:never.png"])
                    .line("Sunlight.", &[])
                    .choice("Return", &["bad"], "entrance"),
            )
            .knot("end", Knot::new().line("The torch flares.", &[]))
    }

    struct Harness {
        controller: SessionController,
        store: Arc<MemoryStore>,
        surface: Arc<RecordingSurface>,
    }

    fn quiet_config() -> PlayerConfig {
        PlayerConfig {
            typewriter_default: false,
            ..PlayerConfig::default()
        }
    }

    fn build(
        config: PlayerConfig,
        engines: Arc<dyn EngineFactory>,
        assets: Arc<dyn AssetTransport>,
        store: MemoryStore,
    ) -> Harness {
        let store = Arc::new(store);
        let surface = Arc::new(RecordingSurface::new());
        let clock = FixedClock::at_utc(2026, 1, 15, 10, 0, 0);
        let controller = SessionController::new(
            config,
            engines,
            assets,
            store.clone(),
            surface.clone(),
            Arc::new(clock),
        );
        Harness {
            controller,
            store,
            surface,
        }
    }

    fn harness_for(script: &Script) -> Harness {
        let assets = MemoryAssets::new().with_story("cave", script.to_payload());
        build(
            quiet_config(),
            Arc::new(ScriptedEngineFactory),
            Arc::new(assets),
            MemoryStore::new(),
        )
    }

    fn harness() -> Harness {
        harness_for(&cave_script())
    }

    fn choice_texts(surface: &RecordingSurface) -> Vec<String> {
        surface
            .last_choices()
            .unwrap_or_default()
            .into_iter()
            .map(|choice| choice.text)
            .collect()
    }

    #[tokio::test]
    async fn test_start_session_advances_to_first_choices() {
        // Arrange
        let mut h = harness();

        // Act
        let start = h.controller.start_session("cave", None).await.unwrap();

        // Assert
        assert_eq!(start, SessionStart::Fresh);
        assert_eq!(h.surface.transcript(), ["You enter the cave."]);
        assert_eq!(h.surface.images()[0].path, "/data/output/cave/assets/cave.png");
        assert_eq!(choice_texts(&h.surface), ["Go deeper", "Turn back"]);
        assert!(matches!(
            h.controller.session().unwrap().phase(),
            Phase::AwaitingChoice(choices) if choices.len() == 2
        ));
        assert!(h.controller.gallery().unwrap().contains("cave.png"));
    }

    #[tokio::test]
    async fn test_commit_holds_scene_transition_until_proceed() {
        // Arrange
        let mut h = harness();
        h.controller.start_session("cave", None).await.unwrap();
        h.surface.reset();

        // Act
        h.controller.commit(0).unwrap();

        // Assert
        assert!(h.surface.transcript().is_empty());
        assert!(h.surface.images().is_empty());
        let control = h.surface.last_continuation().unwrap();
        assert_eq!(control.kind, ContinuationKind::Exquisite);
        assert_eq!(control.label, "Excellent choice - proceed to next scene");
        assert_eq!(control.choice_tags, ["exquisite"]);
        let pending = h.controller.session().unwrap().pending_transition().unwrap();
        assert_eq!(pending.text, "Deeper now.");
        assert!(h.controller.gallery().unwrap().contains("cave2.png"));
    }

    #[tokio::test]
    async fn test_proceed_replaces_transcript_with_new_scene() {
        // Arrange
        let mut h = harness();
        h.controller.start_session("cave", None).await.unwrap();
        h.controller.commit(0).unwrap();
        h.surface.reset();

        // Act
        h.controller.proceed().unwrap();

        // Assert
        assert_eq!(h.surface.events()[0], SurfaceEvent::ClearTranscript);
        assert_eq!(
            h.surface.transcript(),
            ["Deeper now.", "Water drips somewhere."]
        );
        assert_eq!(h.surface.images()[0].file, "cave2.png");
        assert_eq!(h.surface.audio()[0].track, "drip.mp3");
        assert_eq!(h.controller.current_track(), Some("drip.mp3"));
        assert_eq!(choice_texts(&h.surface), ["Light a torch"]);
        assert!(h.controller.session().unwrap().pending_transition().is_none());
    }

    #[tokio::test]
    async fn test_suppressed_segment_is_dropped_with_its_tags() {
        // Arrange
        let mut h = harness();
        h.controller.start_session("cave", None).await.unwrap();

        // Act
        h.controller.commit(1).unwrap();

        // Assert
        assert_eq!(
            h.surface.transcript(),
            ["You enter the cave.", "You leave.", "Sunlight."]
        );
        let outcome: Vec<_> = h.surface.paragraphs()[1..]
            .iter()
            .map(|paragraph| paragraph.style)
            .collect();
        assert_eq!(outcome, [ParagraphStyle::Outcome, ParagraphStyle::Outcome]);
        assert!(!h.controller.gallery().unwrap().contains("never.png"));
        assert_eq!(
            h.surface.last_continuation().unwrap().kind,
            ContinuationKind::Proceed
        );
    }

    #[tokio::test]
    async fn test_suppressed_segment_is_skipped_while_advancing() {
        // Arrange
        let script = Script::new("start").knot(
            "start",
            Knot::new()
                .line("Hello.", &[])
                .line("THE FATE FROWNS upon you", &["IMAGE:x.png", "AUDIO:y"])
                .choice("Wave", &[], "start"),
        );
        let mut h = harness_for(&script);

        // Act
        h.controller.start_session("cave", None).await.unwrap();

        // Assert
        assert_eq!(h.surface.transcript(), ["Hello."]);
        assert!(h.surface.images().is_empty());
        assert!(h.surface.audio().is_empty());
        assert!(!h.controller.gallery().unwrap().contains("x.png"));
        assert_eq!(choice_texts(&h.surface), ["Wave"]);
    }

    #[tokio::test]
    async fn test_proceed_without_transition_keeps_outcome() {
        // Arrange
        let mut h = harness();
        h.controller.start_session("cave", None).await.unwrap();
        h.controller.commit(1).unwrap();

        // Act
        h.controller.proceed().unwrap();

        // Assert
        assert_eq!(h.surface.transcript().len(), 3);
        let choices = h.surface.last_choices().unwrap();
        assert_eq!(choices[0].text, "Return");
        assert!(choices[0].mood.bad);
    }

    #[tokio::test]
    async fn test_bad_choice_labels_continuation() {
        // Arrange
        let mut h = harness();
        h.controller.start_session("cave", None).await.unwrap();
        h.controller.commit(1).unwrap();
        h.controller.proceed().unwrap();

        // Act
        h.controller.commit(0).unwrap();

        // Assert
        let control = h.surface.last_continuation().unwrap();
        assert_eq!(control.kind, ContinuationKind::Bad);
        assert_eq!(
            control.label,
            "Your fate is unknown to the author - choose another outcome"
        );
        h.controller.proceed().unwrap();
        assert_eq!(h.surface.transcript(), ["You enter the cave."]);
        assert_eq!(choice_texts(&h.surface), ["Go deeper", "Turn back"]);
    }

    #[tokio::test]
    async fn test_story_end_offers_restart() {
        // Arrange
        let mut h = harness();
        h.controller.start_session("cave", None).await.unwrap();
        h.controller.commit(0).unwrap();
        h.controller.proceed().unwrap();
        h.controller.commit(0).unwrap();

        // Act
        h.controller.proceed().unwrap();

        // Assert
        let control = h.surface.last_continuation().unwrap();
        assert_eq!(control.kind, ContinuationKind::EndOfStory);
        assert_eq!(control.label, "End of Story. Restart?");
        assert_eq!(h.controller.session().unwrap().phase(), &Phase::Ended);
        assert!(matches!(
            h.controller.proceed(),
            Err(PlayerError::UnexpectedAction { action: "proceed", .. })
        ));

        let start = h.controller.restart().await.unwrap();
        assert_eq!(start, SessionStart::Fresh);
        assert_eq!(h.surface.transcript(), ["You enter the cave."]);
        assert!(h.surface.events().contains(&SurfaceEvent::StopAudio));
        assert_eq!(h.controller.current_track(), None);
    }

    #[tokio::test]
    async fn test_blank_transition_takes_following_text() {
        // Arrange
        let script = Script::new("start")
            .knot("start", Knot::new().line("Pick.", &[]).choice("Jump", &[], "pit"))
            .knot(
                "pit",
                Knot::new()
                    .line("", &["IMAGE:pit.png"])
                    .line("You land hard.", &["AUDIO:thud"])
                    .choice("Climb", &[], "start"),
            );
        let mut h = harness_for(&script);
        h.controller.start_session("cave", None).await.unwrap();

        // Act
        h.controller.commit(0).unwrap();

        // Assert
        let pending = h.controller.session().unwrap().pending_transition().unwrap();
        assert_eq!(pending.text, "You land hard.");
        assert_eq!(pending.tags, ["IMAGE:pit.png", "AUDIO:thud"]);
        assert!(h.surface.audio().is_empty());

        h.controller.proceed().unwrap();
        assert_eq!(h.surface.transcript(), ["You land hard."]);
        assert_eq!(h.surface.audio()[0].track, "thud.mp3");
        assert_eq!(choice_texts(&h.surface), ["Climb"]);
    }

    #[tokio::test]
    async fn test_blank_transition_borrows_last_outcome_paragraph() {
        // Arrange
        let script = Script::new("start")
            .knot("start", Knot::new().line("Pick.", &[]).choice("Jump", &[], "ledge"))
            .knot(
                "ledge",
                Knot::new()
                    .line("You slip.", &["mood:grim"])
                    .line("", &["IMAGE:pit.png"])
                    .line("The fate frowns on the careless.", &[])
                    .choice("Climb", &[], "start"),
            );
        let mut h = harness_for(&script);
        h.controller.start_session("cave", None).await.unwrap();
        h.surface.reset();

        // Act
        h.controller.commit(0).unwrap();

        // Assert
        assert!(h.surface.transcript().is_empty());
        let pending = h.controller.session().unwrap().pending_transition().unwrap();
        assert_eq!(pending.text, "You slip.");
        assert_eq!(pending.tags, ["IMAGE:pit.png", "mood:grim"]);

        h.controller.proceed().unwrap();
        assert_eq!(h.surface.transcript(), ["You slip."]);
    }

    #[tokio::test]
    async fn test_typewriter_plans_reveal_and_toggle_persists() {
        // Arrange
        let assets = MemoryAssets::new().with_story("cave", cave_script().to_payload());
        let mut h = build(
            PlayerConfig::default(),
            Arc::new(ScriptedEngineFactory),
            Arc::new(assets),
            MemoryStore::new(),
        );

        // Act
        h.controller.start_session("cave", None).await.unwrap();

        // Assert
        let reveal = h.surface.paragraphs()[0].reveal.clone().unwrap();
        assert_eq!(reveal.text, "You enter the cave.");
        assert_eq!(reveal.step, Duration::from_millis(50));
        assert!(reveal.token.is_current());

        assert!(!h.controller.toggle_typewriter());
        assert_eq!(h.store.value(TYPEWRITER_PREFERENCE_KEY).as_deref(), Some("false"));
        h.controller.restart().await.unwrap();
        assert!(!reveal.token.is_current());
        assert!(h.surface.paragraphs().last().unwrap().reveal.is_none());
    }

    #[test]
    fn test_stored_typewriter_preference_overrides_default() {
        let h = build(
            PlayerConfig::default(),
            Arc::new(ScriptedEngineFactory),
            Arc::new(MemoryAssets::new()),
            MemoryStore::with_entries(&[(TYPEWRITER_PREFERENCE_KEY, "false")]),
        );

        assert!(!h.controller.typewriter_enabled());
    }

    #[tokio::test]
    async fn test_commit_autosaves_engine_state() {
        // Arrange
        let mut h = harness();
        h.controller.start_session("cave", None).await.unwrap();

        // Act
        h.controller.commit(1).unwrap();

        // Assert
        assert_eq!(
            h.store.value("save_state_cave").as_deref(),
            Some(r#"{"knot":"outside","line":0}"#)
        );
    }

    #[tokio::test]
    async fn test_restored_session_matches_original_play_through() {
        // Arrange
        let mut original = harness();
        original.controller.start_session("cave", None).await.unwrap();
        original.controller.commit(1).unwrap();
        let save = original.store.value("save_state_cave").unwrap();
        let outcome: Vec<_> = original.surface.transcript()[1..].to_vec();
        original.controller.proceed().unwrap();
        let mut restored = harness();

        // Act
        let start = restored.controller.import_save("cave", &save).await.unwrap();

        // Assert
        assert_eq!(start, SessionStart::Restored);
        assert_eq!(restored.surface.transcript(), outcome);
        assert_eq!(
            choice_texts(&restored.surface),
            choice_texts(&original.surface)
        );
    }

    #[tokio::test]
    async fn test_resume_uses_stored_save() {
        let assets = MemoryAssets::new().with_story("cave", cave_script().to_payload());
        let mut h = build(
            quiet_config(),
            Arc::new(ScriptedEngineFactory),
            Arc::new(assets),
            MemoryStore::with_entries(&[("save_state_cave", r#"{"knot":"deeper","line":1}"#)]),
        );

        let start = h.controller.resume_session("cave").await.unwrap();

        assert_eq!(start, SessionStart::Restored);
        assert_eq!(h.surface.transcript(), ["Water drips somewhere."]);
    }

    #[tokio::test]
    async fn test_resume_without_save_is_rejected() {
        let mut h = harness();

        let result = h.controller.resume_session("cave").await;

        assert!(matches!(result, Err(PlayerError::NoSavedProgress(p)) if p == "cave"));
        assert_eq!(h.surface.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_import_falls_back_to_fresh_start() {
        // Arrange
        let mut h = harness();

        // Act
        let start = h.controller.import_save("cave", "{not a save").await.unwrap();

        // Assert
        assert_eq!(start, SessionStart::FellBack);
        assert!(h.surface.errors()[0].contains("could not be restored"));
        assert_eq!(h.surface.transcript(), ["You enter the cave."]);
    }

    #[tokio::test]
    async fn test_malformed_save_on_start_leaves_no_session() {
        let mut h = harness();

        let result = h
            .controller
            .start_session("cave", Some(r#"{"knot":"attic","line":0}"#))
            .await;

        assert!(matches!(result, Err(PlayerError::MalformedSave(_))));
        assert!(h.controller.session().is_none());
        assert_eq!(h.surface.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_start_failures_are_reported() {
        let mut blank = harness();
        assert!(matches!(
            blank.controller.start_session("  ", None).await,
            Err(PlayerError::Validation(_))
        ));

        let mut missing = harness();
        assert!(matches!(
            missing.controller.start_session("forest", None).await,
            Err(PlayerError::NotFound(_))
        ));

        let mut offline = build(
            quiet_config(),
            Arc::new(ScriptedEngineFactory),
            Arc::new(FailingTransport),
            MemoryStore::new(),
        );
        assert!(matches!(
            offline.controller.start_session("cave", None).await,
            Err(PlayerError::Transport(_))
        ));
        assert_eq!(offline.surface.errors().len(), 1);

        let mut garbled = build(
            quiet_config(),
            Arc::new(ScriptedEngineFactory),
            Arc::new(MemoryAssets::new().with_story("cave", "<html>")),
            MemoryStore::new(),
        );
        assert!(matches!(
            garbled.controller.start_session("cave", None).await,
            Err(PlayerError::StoryPayload(_))
        ));

        let mut no_engine = build(
            quiet_config(),
            Arc::new(UnavailableEngineFactory),
            Arc::new(MemoryAssets::new().with_story("cave", cave_script().to_payload())),
            MemoryStore::new(),
        );
        assert!(matches!(
            no_engine.controller.start_session("cave", None).await,
            Err(PlayerError::EngineUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_actions_out_of_phase_are_rejected() {
        // Arrange
        let mut h = harness();
        assert!(matches!(h.controller.advance(), Err(PlayerError::NoActiveSession)));
        h.controller.start_session("cave", None).await.unwrap();

        // Act
        let invalid = h.controller.commit(5);
        h.controller.commit(0).unwrap();
        let second_commit = h.controller.commit(0);
        let advance = h.controller.advance();

        // Assert
        assert!(matches!(
            invalid,
            Err(PlayerError::InvalidChoice {
                index: 5,
                available: 2
            })
        ));
        assert!(matches!(
            second_commit,
            Err(PlayerError::UnexpectedAction {
                action: "commit a choice",
                phase: "awaiting continuation"
            })
        ));
        assert!(matches!(advance, Err(PlayerError::UnexpectedAction { .. })));
    }

    /// Runs the scripted story but breaks on the first pull after a choice.
    struct BrokenOutcomeEngine {
        inner: Box<dyn NarrativeEngine>,
        chosen: bool,
    }

    impl NarrativeEngine for BrokenOutcomeEngine {
        fn can_continue(&self) -> bool {
            self.chosen || self.inner.can_continue()
        }

        fn continue_step(&mut self) -> Result<StorySegment, PlayerError> {
            if self.chosen {
                return Err(PlayerError::Engine("divert target missing".into()));
            }
            self.inner.continue_step()
        }

        fn current_choices(&self) -> Vec<storyloom_core::engine::Choice> {
            self.inner.current_choices()
        }

        fn choose_choice(&mut self, index: usize) -> Result<(), PlayerError> {
            self.inner.choose_choice(index)?;
            self.chosen = true;
            Ok(())
        }

        fn serialize_state(&self) -> Result<String, PlayerError> {
            self.inner.serialize_state()
        }

        fn restore_state(&mut self, state: &str) -> Result<(), PlayerError> {
            self.inner.restore_state(state)
        }
    }

    struct BrokenOutcomeFactory;

    impl EngineFactory for BrokenOutcomeFactory {
        fn create(&self, payload: &str) -> Result<Box<dyn NarrativeEngine>, PlayerError> {
            Ok(Box::new(BrokenOutcomeEngine {
                inner: ScriptedEngineFactory.create(payload)?,
                chosen: false,
            }))
        }
    }

    #[tokio::test]
    async fn test_failed_outcome_pull_discards_presented_choices() {
        // Arrange
        let assets = MemoryAssets::new().with_story("cave", cave_script().to_payload());
        let mut h = build(
            quiet_config(),
            Arc::new(BrokenOutcomeFactory),
            Arc::new(assets),
            MemoryStore::new(),
        );
        h.controller.start_session("cave", None).await.unwrap();

        // Act
        let failed = h.controller.commit(0);
        let retried = h.controller.commit(0);

        // Assert
        assert!(matches!(failed, Err(PlayerError::Engine(_))));
        assert_eq!(h.controller.session().unwrap().phase(), &Phase::Resolving);
        assert!(matches!(
            retried,
            Err(PlayerError::UnexpectedAction {
                action: "commit a choice",
                phase: "resolving a choice"
            })
        ));
    }

    #[tokio::test]
    async fn test_export_names_file_after_project_and_time() {
        let mut h = harness();
        assert!(matches!(
            h.controller.export_save(),
            Err(PlayerError::NoActiveSession)
        ));
        h.controller.start_session("cave", None).await.unwrap();

        let export = h.controller.export_save().unwrap();

        assert_eq!(export.file_name, "cave_save_1768471200000.json");
        assert_eq!(export.contents, r#"{"knot":"entrance","line":1}"#);
    }

    #[tokio::test]
    async fn test_save_progress_writes_save_slot() {
        let mut h = harness();
        h.controller.start_session("cave", None).await.unwrap();

        h.controller.save_progress().unwrap();

        assert_eq!(
            h.store.value("save_state_cave").as_deref(),
            Some(r#"{"knot":"entrance","line":1}"#)
        );
    }
}
