//! Storyloom API — serves story libraries to the browser player.
//!
//! The server is the player's manifest source and asset transport: it lists
//! projects, regenerates the manifest, and streams compiled stories, images
//! and audio from a library directory.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
