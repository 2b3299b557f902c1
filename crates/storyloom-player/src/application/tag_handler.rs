//! Tag handler: turns parsed tags into image, audio and gallery side effects.

use std::sync::Arc;
use std::time::Duration;

use storyloom_core::assets::{AssetKind, AssetLayout};
use storyloom_core::effects::FadePlan;
use storyloom_core::storage::{KeyValueStore, unlocked_art_key};
use storyloom_core::surface::{AudioCue, ImageCue, RenderSurface};
use tracing::{debug, warn};

use crate::application::config::PlayerConfig;
use crate::domain::audio::{AudioDeck, TrackChange, with_default_extension};
use crate::domain::gallery::{ImageBucket, UnlockedImageSet};
use crate::domain::tags::{ParsedTag, TagCue, parse_tags};

/// Dispatches tags for one project.
pub struct TagHandler {
    project_id: String,
    layout: AssetLayout,
    gallery: UnlockedImageSet,
    audio: AudioDeck,
    store: Arc<dyn KeyValueStore>,
    surface: Arc<dyn RenderSurface>,
    image_swap_delay: Duration,
    fade_target: f64,
    fade_step: f64,
    fade_interval: Duration,
    default_audio_extension: String,
}

impl TagHandler {
    /// Creates a handler for `project_id`, loading its unlock set from the
    /// store. An unreadable or corrupt set starts empty.
    pub fn load(
        project_id: &str,
        config: &PlayerConfig,
        store: Arc<dyn KeyValueStore>,
        surface: Arc<dyn RenderSurface>,
    ) -> Self {
        let gallery = load_gallery(store.as_ref(), project_id);
        Self {
            project_id: project_id.to_owned(),
            layout: config.layout(),
            gallery,
            audio: AudioDeck::new(),
            store,
            surface,
            image_swap_delay: config.image_swap_delay(),
            fade_target: config.audio_target_volume,
            fade_step: config.audio_fade_step,
            fade_interval: config.audio_fade_interval(),
            default_audio_extension: config.default_audio_extension.clone(),
        }
    }

    /// The unlock set as currently known.
    #[must_use]
    pub fn gallery(&self) -> &UnlockedImageSet {
        &self.gallery
    }

    /// The track currently playing, if any.
    #[must_use]
    pub fn current_track(&self) -> Option<&str> {
        self.audio.current_track()
    }

    /// Applies every tag in order.
    pub fn dispatch(&mut self, tags: &[String]) {
        self.dispatch_parsed(&parse_tags(tags));
    }

    /// Applies already parsed tags in order.
    pub fn dispatch_parsed(&mut self, tags: &[ParsedTag]) {
        for tag in tags {
            match &tag.cue {
                TagCue::Image(file) => self.show_image(file),
                TagCue::Audio(name) => self.play_audio(name),
                TagCue::Silence => self.stop_audio(),
                TagCue::Unknown => {}
            }
        }
    }

    /// Records the images named by `tags` in the unlock set without showing
    /// them.
    pub fn record_unlocks(&mut self, tags: &[String]) {
        for tag in tags {
            if let TagCue::Image(file) = ParsedTag::parse(tag).cue {
                self.unlock(&file);
            }
        }
    }

    /// Stops any ambient audio; used when the session is replaced.
    pub fn shutdown(&mut self) {
        if self.audio.stop() {
            self.surface.stop_audio();
        }
    }

    fn show_image(&mut self, file: &str) {
        let reward = ImageBucket::for_file(file) == ImageBucket::Rewards;
        let cue = ImageCue {
            file: file.to_owned(),
            path: self
                .layout
                .asset_path(&self.project_id, AssetKind::Image, file),
            reward,
            swap_delay: self.image_swap_delay,
        };
        debug!(file, reward, "showing image");
        self.surface.show_image(&cue);
        self.unlock(file);
    }

    fn play_audio(&mut self, name: &str) {
        let track = with_default_extension(name, &self.default_audio_extension);
        match self.audio.request(&track) {
            TrackChange::Unchanged => debug!(track = %track, "track already playing"),
            TrackChange::Start(token) => {
                let cue = AudioCue {
                    path: self
                        .layout
                        .asset_path(&self.project_id, AssetKind::Audio, &track),
                    track,
                    fade: FadePlan {
                        target_volume: self.fade_target,
                        step: self.fade_step,
                        interval: self.fade_interval,
                        token,
                    },
                };
                debug!(track = %cue.track, "starting ambient track");
                self.surface.play_audio(&cue);
            }
        }
    }

    fn stop_audio(&mut self) {
        self.audio.stop();
        self.surface.stop_audio();
    }

    fn unlock(&mut self, file: &str) {
        let Some(bucket) = self.gallery.unlock(file) else {
            return;
        };
        debug!(file, bucket = bucket.name(), "image unlocked");
        match self.gallery.to_json() {
            Ok(json) => {
                if let Err(e) = self.store.set(&unlocked_art_key(&self.project_id), &json) {
                    warn!(project_id = %self.project_id, error = %e, "failed to persist unlocked images");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize unlocked images"),
        }
    }
}

/// Reads a project's unlock set, treating a missing or unreadable record as
/// empty.
pub(crate) fn load_gallery(store: &dyn KeyValueStore, project_id: &str) -> UnlockedImageSet {
    match store.get(&unlocked_art_key(project_id)) {
        Ok(Some(json)) => UnlockedImageSet::from_json(&json).unwrap_or_else(|e| {
            warn!(project_id, error = %e, "discarding corrupt unlocked image record");
            UnlockedImageSet::new()
        }),
        Ok(None) => UnlockedImageSet::new(),
        Err(e) => {
            warn!(project_id, error = %e, "failed to read unlocked images");
            UnlockedImageSet::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storyloom_test_support::{FailingStore, MemoryStore, RecordingSurface, SurfaceEvent};

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| (*t).to_owned()).collect()
    }

    fn handler(store: Arc<dyn KeyValueStore>, surface: Arc<RecordingSurface>) -> TagHandler {
        TagHandler::load("cave", &PlayerConfig::default(), store, surface)
    }

    #[test]
    fn test_image_tag_shows_resolved_path_and_unlocks() {
        // Arrange
        let store = Arc::new(MemoryStore::new());
        let surface = Arc::new(RecordingSurface::new());
        let mut handler = handler(store.clone(), surface.clone());

        // Act
        handler.dispatch(&tags(&["IMAGE:cave.png"]));

        // Assert
        let images = surface.images();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].path, "/data/output/cave/assets/cave.png");
        assert!(!images[0].reward);
        assert_eq!(images[0].swap_delay, Duration::from_millis(300));
        assert_eq!(
            store.value("unlocked_art_cave").as_deref(),
            Some(r#"{"scenes":["cave.png"],"rewards":[]}"#)
        );
    }

    #[test]
    fn test_reward_image_is_flagged_and_bucketed() {
        let store = Arc::new(MemoryStore::new());
        let surface = Arc::new(RecordingSurface::new());
        let mut handler = handler(store.clone(), surface.clone());

        handler.dispatch(&tags(&["IMAGE:chalice_reward.png"]));

        assert!(surface.images()[0].reward);
        assert_eq!(
            handler.gallery().images(ImageBucket::Rewards),
            ["chalice_reward.png"]
        );
    }

    #[test]
    fn test_seen_image_is_not_persisted_again() {
        let store = Arc::new(MemoryStore::new());
        let surface = Arc::new(RecordingSurface::new());
        let mut handler = handler(store.clone(), surface.clone());

        handler.dispatch(&tags(&["IMAGE:cave.png"]));
        handler.dispatch(&tags(&["IMAGE:cave.png"]));

        assert_eq!(surface.images().len(), 2);
        assert_eq!(store.writes().len(), 1);
    }

    #[test]
    fn test_existing_unlocks_are_loaded_and_extended() {
        let store = Arc::new(MemoryStore::with_entries(&[(
            "unlocked_art_cave",
            r#"{"scenes":["old.png"],"rewards":[]}"#,
        )]));
        let surface = Arc::new(RecordingSurface::new());
        let mut handler = handler(store.clone(), surface);

        handler.dispatch(&tags(&["IMAGE:new.png"]));

        assert_eq!(
            store.value("unlocked_art_cave").as_deref(),
            Some(r#"{"scenes":["old.png","new.png"],"rewards":[]}"#)
        );
    }

    #[test]
    fn test_same_audio_tag_twice_starts_playback_once() {
        let store = Arc::new(MemoryStore::new());
        let surface = Arc::new(RecordingSurface::new());
        let mut handler = handler(store, surface.clone());

        handler.dispatch(&tags(&["AUDIO:drip"]));
        handler.dispatch(&tags(&["AUDIO:drip"]));

        let audio = surface.audio();
        assert_eq!(audio.len(), 1);
        assert_eq!(audio[0].track, "drip.mp3");
        assert_eq!(audio[0].path, "/data/output/cave/audio/drip.mp3");
        assert!((audio[0].fade.target_volume - 0.6).abs() < f64::EPSILON);
        assert_eq!(handler.current_track(), Some("drip.mp3"));
    }

    #[test]
    fn test_ambience_with_extension_is_kept() {
        let store = Arc::new(MemoryStore::new());
        let surface = Arc::new(RecordingSurface::new());
        let mut handler = handler(store, surface.clone());

        handler.dispatch(&tags(&["AMBIENCE: rain.ogg"]));

        assert_eq!(surface.audio()[0].track, "rain.ogg");
    }

    #[test]
    fn test_silence_stops_and_allows_restart() {
        let store = Arc::new(MemoryStore::new());
        let surface = Arc::new(RecordingSurface::new());
        let mut handler = handler(store, surface.clone());

        handler.dispatch(&tags(&["AUDIO:drip", "stop_audio", "AUDIO:drip"]));

        let events = surface.events();
        assert!(events.contains(&SurfaceEvent::StopAudio));
        assert_eq!(surface.audio().len(), 2);
        assert!(!surface.audio()[0].fade.token.is_current());
        assert!(surface.audio()[1].fade.token.is_current());
    }

    #[test]
    fn test_unknown_tags_are_ignored() {
        let store = Arc::new(MemoryStore::new());
        let surface = Arc::new(RecordingSurface::new());
        let mut handler = handler(store.clone(), surface.clone());

        handler.dispatch(&tags(&["exquisite", "SPEAKER:owl"]));

        assert!(surface.events().is_empty());
        assert!(store.writes().is_empty());
    }

    #[test]
    fn test_record_unlocks_does_not_touch_the_surface() {
        let store = Arc::new(MemoryStore::new());
        let surface = Arc::new(RecordingSurface::new());
        let mut handler = handler(store, surface.clone());

        handler.record_unlocks(&tags(&["IMAGE:hall.png", "AUDIO:echo"]));

        assert!(surface.events().is_empty());
        assert!(handler.gallery().contains("hall.png"));
    }

    #[test]
    fn test_store_failures_do_not_interrupt_dispatch() {
        let surface = Arc::new(RecordingSurface::new());
        let mut handler = handler(Arc::new(FailingStore), surface.clone());

        handler.dispatch(&tags(&["IMAGE:cave.png", "AUDIO:drip"]));

        assert_eq!(surface.images().len(), 1);
        assert_eq!(surface.audio().len(), 1);
        assert!(handler.gallery().contains("cave.png"));
    }

    #[test]
    fn test_corrupt_gallery_record_starts_empty() {
        let store = Arc::new(MemoryStore::with_entries(&[("unlocked_art_cave", "{oops")]));
        let surface = Arc::new(RecordingSurface::new());

        let handler = handler(store, surface);

        assert!(handler.gallery().is_empty());
    }
}
