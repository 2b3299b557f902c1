//! Timed presentation effects: letter-by-letter reveal and audio fade-in.
//!
//! Both effects run as a series of timed steps. Each plan carries an
//! [`EffectToken`] taken from an [`EffectGeneration`]; advancing the
//! generation invalidates every token handed out before, so steps scheduled by
//! a superseded effect see `is_current() == false` and stop.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Monotonically increasing generation counter shared with its tokens.
#[derive(Debug, Clone, Default)]
pub struct EffectGeneration {
    current: Arc<AtomicU64>,
}

impl EffectGeneration {
    /// Creates a counter at generation zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a token for the current generation.
    #[must_use]
    pub fn token(&self) -> EffectToken {
        EffectToken {
            id: self.current.load(Ordering::SeqCst),
            current: Arc::clone(&self.current),
        }
    }

    /// Starts a new generation, invalidating all earlier tokens, and returns
    /// a token for it.
    #[must_use]
    pub fn advance(&self) -> EffectToken {
        let id = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        EffectToken {
            id,
            current: Arc::clone(&self.current),
        }
    }

    /// Invalidates all outstanding tokens.
    pub fn cancel(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }

    /// The current generation number.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }
}

/// Handle held by an in-flight effect.
#[derive(Debug, Clone)]
pub struct EffectToken {
    id: u64,
    current: Arc<AtomicU64>,
}

impl EffectToken {
    /// The generation this token belongs to.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether no newer generation has started since this token was issued.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.id
    }
}

impl PartialEq for EffectToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.current, &other.current)
    }
}

/// Letter-by-letter reveal of one paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealPlan {
    /// Full text to reveal.
    pub text: String,
    /// Delay between characters.
    pub step: Duration,
    /// Cancellation token.
    pub token: EffectToken,
}

impl RevealPlan {
    /// Successively longer prefixes of the text, one per character.
    pub fn frames(&self) -> impl Iterator<Item = &str> + '_ {
        self.text
            .char_indices()
            .map(|(i, c)| &self.text[..i + c.len_utf8()])
    }
}

/// Linear volume ramp from silence to a target volume.
#[derive(Debug, Clone, PartialEq)]
pub struct FadePlan {
    /// Final volume in `[0.0, 1.0]`.
    pub target_volume: f64,
    /// Volume added per step.
    pub step: f64,
    /// Delay between steps.
    pub interval: Duration,
    /// Cancellation token.
    pub token: EffectToken,
}

impl FadePlan {
    /// Volumes to apply after each interval, ending exactly at the target.
    #[must_use]
    pub fn volumes(&self) -> Vec<f64> {
        let target = self.target_volume.clamp(0.0, 1.0);
        if self.step <= 0.0 || target == 0.0 {
            return vec![target];
        }
        // Tolerance keeps 0.6 / 0.1 at six steps despite rounding.
        let steps = ((target / self.step) - 1e-9).ceil().max(1.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let steps = steps as u32;
        (1..=steps)
            .map(|i| (f64::from(i) * self.step).min(target))
            .collect()
    }

    /// Total time the ramp takes.
    #[must_use]
    pub fn duration(&self) -> Duration {
        let steps = u32::try_from(self.volumes().len()).unwrap_or(u32::MAX);
        self.interval * steps
    }
}
