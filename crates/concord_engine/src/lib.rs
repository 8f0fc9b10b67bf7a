//! # CONCORD Engine
//!
//! Module lifecycle on top of [`concord_core`]. Subsystems are modules that
//! name the modules they depend on; the engine initializes them dependencies
//! first, runs frames, and shuts them down dependents first.
//!
//! ## Example
//!
//! ```rust
//! use concord_engine::{module_deps, Engine, EngineConfig, EngineResult, Hooks, Module, Update};
//!
//! struct Window;
//! impl Module for Window {
//!     const NAME: &'static str = "Window";
//! }
//!
//! #[derive(Default)]
//! struct Game {
//!     frames: u64,
//! }
//! impl Module for Game {
//!     const NAME: &'static str = "Game";
//!
//!     fn dependencies(&self) -> Vec<&'static str> {
//!         module_deps![Window]
//!     }
//!
//!     fn register(hooks: &mut Hooks<'_, Self>) -> EngineResult<()> {
//!         hooks.on(module_deps![], |game: &mut Game, _: &Update| game.frames += 1)?;
//!         Ok(())
//!     }
//! }
//!
//! let mut engine = Engine::new(EngineConfig {
//!     max_frames: Some(10),
//!     ..EngineConfig::default()
//! })?;
//! let game = engine.create(Game::default())?;
//! engine.create(Window)?;
//!
//! assert_eq!(engine.run()?, 10);
//! assert_eq!(game.lock().frames, 10);
//! # Ok::<(), concord_engine::EngineError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod module;

pub use clock::{FrameClock, FrameTiming};
pub use config::EngineConfig;
pub use engine::{Engine, EngineHandle, EnginePhase, ENGINE_SUBSCRIBER};
pub use error::{ConfigError, EngineError, EngineResult};
pub use events::{
    Draw, EndFrame, Initialize, LogMessage, Shutdown, ShutdownRequested, StartFrame, Update,
};
pub use module::{Hooks, Module, ModuleManager, Shared};
