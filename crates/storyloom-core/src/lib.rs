//! Storyloom Core — shared ports and value types.
//!
//! This crate defines the capabilities the presentation controller talks
//! through (narrative engine, key-value store, render surface, manifest
//! source, asset transport) and the values passed across them. It contains
//! no infrastructure code.

pub mod assets;
pub mod clock;
pub mod effects;
pub mod engine;
pub mod error;
pub mod manifest;
pub mod storage;
pub mod surface;
