//! Per-project record of unlocked images.
//!
//! The set only grows: file names are appended the first time an `IMAGE` tag
//! shows them and are never removed. The serialized form is
//! `{"scenes": [...], "rewards": [...]}`.

use serde::{Deserialize, Serialize};

/// Which gallery tab an image belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageBucket {
    /// Ordinary scene art.
    Scenes,
    /// Reward art, marked by `_reward` in the file name.
    Rewards,
}

impl ImageBucket {
    /// Classifies an image file name.
    #[must_use]
    pub fn for_file(file: &str) -> Self {
        if file.contains("_reward") {
            Self::Rewards
        } else {
            Self::Scenes
        }
    }

    /// Lowercase plural name, as shown on the gallery tab.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Scenes => "scenes",
            Self::Rewards => "rewards",
        }
    }
}

/// Unlocked scene and reward images in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockedImageSet {
    #[serde(default)]
    scenes: Vec<String>,
    #[serde(default)]
    rewards: Vec<String>,
}

impl UnlockedImageSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the stored JSON form, dropping duplicate entries.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the payload is not a valid set.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let parsed: Self = serde_json::from_str(json)?;
        let mut set = Self::new();
        for file in parsed.scenes.into_iter().chain(parsed.rewards) {
            set.unlock(&file);
        }
        Ok(set)
    }

    /// Serializes the set to its stored JSON form.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Records an image. Returns the bucket it was added to, or `None` if it
    /// was already unlocked.
    pub fn unlock(&mut self, file: &str) -> Option<ImageBucket> {
        let bucket = ImageBucket::for_file(file);
        let list = self.bucket_mut(bucket);
        if list.iter().any(|existing| existing == file) {
            return None;
        }
        list.push(file.to_owned());
        Some(bucket)
    }

    /// Whether an image has been unlocked.
    #[must_use]
    pub fn contains(&self, file: &str) -> bool {
        self.images(ImageBucket::for_file(file))
            .iter()
            .any(|existing| existing == file)
    }

    /// Images of one bucket in unlock order.
    #[must_use]
    pub fn images(&self, bucket: ImageBucket) -> &[String] {
        match bucket {
            ImageBucket::Scenes => &self.scenes,
            ImageBucket::Rewards => &self.rewards,
        }
    }

    /// Total number of unlocked images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenes.len() + self.rewards.len()
    }

    /// Whether nothing has been unlocked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bucket_mut(&mut self, bucket: ImageBucket) -> &mut Vec<String> {
        match bucket {
            ImageBucket::Scenes => &mut self.scenes,
            ImageBucket::Rewards => &mut self.rewards,
        }
    }
}
