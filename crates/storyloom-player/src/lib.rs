//! Storyloom Player — presentation session controller.
//!
//! Drives a narrative engine through the advance / present / commit loop,
//! interprets authoring tags as image and audio side effects, gates scene
//! transitions behind a manual continuation, and keeps the per-project
//! unlock gallery.

pub mod application;
pub mod domain;
