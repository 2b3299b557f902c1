//! Player configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use storyloom_core::assets::AssetLayout;
use storyloom_core::error::PlayerError;

/// Tunables for the session controller. Every field has a default, so a host
/// may pass a partial JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Typewriter state used when no preference has been stored.
    pub typewriter_default: bool,
    /// Delay between revealed characters, in milliseconds.
    pub typewriter_speed_ms: u64,
    /// Delay between fading out the old image and swapping in the new one.
    pub image_swap_delay_ms: u64,
    /// Volume an ambient track fades in to.
    pub audio_target_volume: f64,
    /// Volume added per fade step.
    pub audio_fade_step: f64,
    /// Delay between fade steps, in milliseconds.
    pub audio_fade_interval_ms: u64,
    /// Extension appended to audio tags that have none.
    pub default_audio_extension: String,
    /// Base path or URL that project assets are resolved against.
    pub asset_base: String,
    /// Save the engine state after every committed choice.
    pub autosave: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            typewriter_default: true,
            typewriter_speed_ms: 50,
            image_swap_delay_ms: 300,
            audio_target_volume: 0.6,
            audio_fade_step: 0.1,
            audio_fade_interval_ms: 200,
            default_audio_extension: "mp3".to_owned(),
            asset_base: "/data/output".to_owned(),
            autosave: true,
        }
    }
}

impl PlayerConfig {
    /// Parses a JSON configuration object; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Validation` if the JSON is malformed or a value
    /// is out of range.
    pub fn from_json(json: &str) -> Result<Self, PlayerError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PlayerError::Validation(format!("invalid player config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Validation` naming the first offending field.
    pub fn validate(&self) -> Result<(), PlayerError> {
        if !(0.0..=1.0).contains(&self.audio_target_volume) {
            return Err(PlayerError::Validation(
                "audio_target_volume must be within 0.0..=1.0".into(),
            ));
        }
        if self.audio_fade_step <= 0.0 {
            return Err(PlayerError::Validation(
                "audio_fade_step must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Asset layout rooted at `asset_base`.
    #[must_use]
    pub fn layout(&self) -> AssetLayout {
        AssetLayout::new(self.asset_base.clone())
    }

    /// Typewriter delay per character.
    #[must_use]
    pub fn typewriter_speed(&self) -> Duration {
        Duration::from_millis(self.typewriter_speed_ms)
    }

    /// Image swap delay.
    #[must_use]
    pub fn image_swap_delay(&self) -> Duration {
        Duration::from_millis(self.image_swap_delay_ms)
    }

    /// Fade step interval.
    #[must_use]
    pub fn audio_fade_interval(&self) -> Duration {
        Duration::from_millis(self.audio_fade_interval_ms)
    }
}
