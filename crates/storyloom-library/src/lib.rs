//! Storyloom Library — filesystem adapters.
//!
//! A story library is a directory of project folders, each holding a compiled
//! `adventure.json` plus `assets/` and `audio/` sub-directories, indexed by a
//! `manifest.json` at the root.

pub mod directory;
pub mod file_store;
pub mod manifest;
