//! Test surface — a `RenderSurface` that records every call.

use std::sync::Mutex;

use storyloom_core::surface::{
    AudioCue, ContinuationControl, ImageCue, Paragraph, PresentedChoice, RenderSurface,
};

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// `clear_transcript`
    ClearTranscript,
    /// `render_text`
    Text(Paragraph),
    /// `render_choices`
    Choices(Vec<PresentedChoice>),
    /// `render_continuation`
    Continuation(ContinuationControl),
    /// `show_image`
    Image(ImageCue),
    /// `play_audio`
    PlayAudio(AudioCue),
    /// `stop_audio`
    StopAudio,
    /// `report_error`
    Error(String),
}

/// A surface that records calls for later assertions.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    events: Mutex<Vec<SurfaceEvent>>,
}

impl RecordingSurface {
    /// Create an empty recording surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every recorded call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Forget everything recorded so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn reset(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Text of the paragraphs rendered since the last transcript clear.
    pub fn transcript(&self) -> Vec<String> {
        let events = self.events();
        let start = events
            .iter()
            .rposition(|e| matches!(e, SurfaceEvent::ClearTranscript))
            .map_or(0, |i| i + 1);
        events[start..]
            .iter()
            .filter_map(|e| match e {
                SurfaceEvent::Text(p) => Some(p.text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every paragraph ever rendered.
    pub fn paragraphs(&self) -> Vec<Paragraph> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SurfaceEvent::Text(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    /// The most recently rendered choice list.
    pub fn last_choices(&self) -> Option<Vec<PresentedChoice>> {
        self.events().into_iter().rev().find_map(|e| match e {
            SurfaceEvent::Choices(c) => Some(c),
            _ => None,
        })
    }

    /// The most recently rendered continuation control.
    pub fn last_continuation(&self) -> Option<ContinuationControl> {
        self.events().into_iter().rev().find_map(|e| match e {
            SurfaceEvent::Continuation(c) => Some(c),
            _ => None,
        })
    }

    /// Every image cue shown.
    pub fn images(&self) -> Vec<ImageCue> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SurfaceEvent::Image(cue) => Some(cue),
                _ => None,
            })
            .collect()
    }

    /// Every audio cue played.
    pub fn audio(&self) -> Vec<AudioCue> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SurfaceEvent::PlayAudio(cue) => Some(cue),
                _ => None,
            })
            .collect()
    }

    /// Every reported error message.
    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SurfaceEvent::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: SurfaceEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl RenderSurface for RecordingSurface {
    fn clear_transcript(&self) {
        self.record(SurfaceEvent::ClearTranscript);
    }

    fn render_text(&self, paragraph: &Paragraph) {
        self.record(SurfaceEvent::Text(paragraph.clone()));
    }

    fn render_choices(&self, choices: &[PresentedChoice]) {
        self.record(SurfaceEvent::Choices(choices.to_vec()));
    }

    fn render_continuation(&self, control: &ContinuationControl) {
        self.record(SurfaceEvent::Continuation(control.clone()));
    }

    fn show_image(&self, cue: &ImageCue) {
        self.record(SurfaceEvent::Image(cue.clone()));
    }

    fn play_audio(&self, cue: &AudioCue) {
        self.record(SurfaceEvent::PlayAudio(cue.clone()));
    }

    fn stop_audio(&self) {
        self.record(SurfaceEvent::StopAudio);
    }

    fn report_error(&self, message: &str) {
        self.record(SurfaceEvent::Error(message.to_owned()));
    }
}
