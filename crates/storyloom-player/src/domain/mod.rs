//! Domain model: tags, choice classification, unlock gallery, audio deck and
//! the play-through session.

pub mod audio;
pub mod choices;
pub mod gallery;
pub mod session;
pub mod tags;
