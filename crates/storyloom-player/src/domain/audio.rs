//! Ambient audio deck: which track is playing and the fade generation.

use storyloom_core::effects::{EffectGeneration, EffectToken};

/// What the deck decided for a requested track.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackChange {
    /// The track is already playing; nothing to do.
    Unchanged,
    /// A new track starts; its fade-in must carry this token.
    Start(EffectToken),
}

/// Tracks the current ambient track.
#[derive(Debug, Clone, Default)]
pub struct AudioDeck {
    current: Option<String>,
    fades: EffectGeneration,
}

impl AudioDeck {
    /// Creates a silent deck.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The track currently playing, if any.
    #[must_use]
    pub fn current_track(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Requests a track. Starting a different track supersedes any fade in
    /// progress.
    pub fn request(&mut self, track: &str) -> TrackChange {
        if self.current.as_deref() == Some(track) {
            return TrackChange::Unchanged;
        }
        self.current = Some(track.to_owned());
        TrackChange::Start(self.fades.advance())
    }

    /// Stops playback and clears the current track. Returns whether a track
    /// was playing.
    pub fn stop(&mut self) -> bool {
        self.fades.cancel();
        self.current.take().is_some()
    }
}

/// Appends `.<extension>` to a track name without one.
#[must_use]
pub fn with_default_extension(name: &str, extension: &str) -> String {
    if name.contains('.') {
        name.to_owned()
    } else {
        format!("{name}.{}", extension.trim_start_matches('.'))
    }
}
