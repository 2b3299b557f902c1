//! Application layer: the session controller and its collaborators.

pub mod config;
pub mod controller;
pub mod effects;
pub mod query_handlers;
pub mod tag_handler;
