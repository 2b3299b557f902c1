//! Shared test mocks and utilities for the Storyloom story player.

mod assets;
mod clock;
mod engine;
mod store;
mod surface;

pub use assets::{FailingManifest, FailingTransport, MemoryAssets, StaticManifest};
pub use clock::FixedClock;
pub use engine::{Knot, Script, ScriptChoice, ScriptedEngine, ScriptedEngineFactory, UnavailableEngineFactory};
pub use store::{FailingStore, MemoryStore};
pub use surface::{RecordingSurface, SurfaceEvent};
