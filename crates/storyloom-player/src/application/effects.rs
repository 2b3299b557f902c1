//! Runners for timed presentation effects.
//!
//! Hosts spawn these on their event loop after the surface receives a
//! [`Paragraph`](storyloom_core::surface::Paragraph) with a reveal plan or an
//! [`AudioCue`](storyloom_core::surface::AudioCue). Each step re-checks the
//! plan's token, so a runner belonging to a superseded generation stops
//! without touching the UI again.

use storyloom_core::effects::{FadePlan, RevealPlan};
use storyloom_core::surface::ParagraphId;
use tokio::time::sleep;

/// How a runner finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectOutcome {
    /// Every step was applied.
    Completed,
    /// A newer generation started; remaining steps were skipped.
    Superseded,
}

/// Receives reveal steps.
pub trait RevealSink {
    /// Shows `visible` as the current content of the paragraph.
    fn show_prefix(&self, paragraph: ParagraphId, visible: &str);
}

/// Receives volume steps.
pub trait VolumeSink {
    /// Sets the playback volume.
    fn set_volume(&self, volume: f64);
}

/// Reveals a paragraph one character per step.
pub async fn run_reveal(
    paragraph: ParagraphId,
    plan: &RevealPlan,
    sink: &dyn RevealSink,
) -> EffectOutcome {
    for frame in plan.frames() {
        if !plan.token.is_current() {
            return EffectOutcome::Superseded;
        }
        sink.show_prefix(paragraph, frame);
        sleep(plan.step).await;
    }
    EffectOutcome::Completed
}

/// Ramps the volume from silence to the plan's target.
pub async fn run_fade(plan: &FadePlan, sink: &dyn VolumeSink) -> EffectOutcome {
    if !plan.token.is_current() {
        return EffectOutcome::Superseded;
    }
    sink.set_volume(0.0);
    for volume in plan.volumes() {
        sleep(plan.interval).await;
        if !plan.token.is_current() {
            return EffectOutcome::Superseded;
        }
        sink.set_volume(volume);
    }
    EffectOutcome::Completed
}
