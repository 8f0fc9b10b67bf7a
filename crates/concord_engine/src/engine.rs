//! # Engine
//!
//! ```text
//! startup
//!   ├─ pending Initialize subscribers?  → log each, fail if strict
//!   └─ Initialize                       dependencies first
//! frame (Running only; until ShutdownRequested or max_frames)
//!   ├─ Update { dt, fps, frame }
//!   ├─ buffered drains                  Hooks::on_buffered
//!   ├─ StartFrame
//!   ├─ Draw
//!   └─ EndFrame
//! shutdown
//!   └─ Shutdown                         dependents first, once
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use concord_core::Dispatcher;

use crate::clock::{FrameClock, FrameTiming};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::events::{Draw, EndFrame, Initialize, Shutdown, ShutdownRequested, StartFrame, Update};
use crate::module::{Module, ModuleManager, Shared};

/// Subscriber name the engine uses for its own handlers.
pub const ENGINE_SUBSCRIBER: &str = "Engine";

/// Requests shutdown from any thread.
#[derive(Clone, Debug)]
pub struct EngineHandle {
    shutdown: Arc<AtomicBool>,
}

impl EngineHandle {
    /// Makes the frame loop stop after the current frame.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    /// Returns true once shutdown was requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

/// Lifecycle phase of an [`Engine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnginePhase {
    /// Modules may be created; nothing initialized yet.
    Created,
    /// Initialize was dispatched; frames may run.
    Running,
    /// Shutdown was dispatched.
    Stopped,
}

/// Drives modules through startup, frames and shutdown.
pub struct Engine {
    config: Arc<EngineConfig>,
    dispatcher: Arc<Dispatcher>,
    modules: ModuleManager,
    clock: FrameClock,
    handle: EngineHandle,
    phase: EnginePhase,
}

impl Engine {
    /// Creates an engine with a fresh dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if `config` fails validation.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        Self::with_dispatcher(config, Arc::new(Dispatcher::new()))
    }

    /// Creates an engine on an existing dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if `config` fails validation, or
    /// [`EngineError::Registry`] if the dispatcher already has a
    /// `ShutdownRequested` subscriber named [`ENGINE_SUBSCRIBER`].
    pub fn with_dispatcher(config: EngineConfig, dispatcher: Arc<Dispatcher>) -> EngineResult<Self> {
        config.validate()?;
        let config = Arc::new(config);

        let handle = EngineHandle {
            shutdown: Arc::new(AtomicBool::new(false)),
        };
        let on_request = handle.clone();
        dispatcher.subscribe(
            ENGINE_SUBSCRIBER,
            Vec::<&str>::new(),
            move |_: &ShutdownRequested| {
                tracing::debug!("shutdown requested");
                on_request.request_shutdown();
            },
        )?;

        let modules = ModuleManager::new(Arc::clone(&dispatcher), Arc::clone(&config));
        let clock = FrameClock::new(config.fps_window, config.max_delta_seconds);

        Ok(Self {
            config,
            dispatcher,
            modules,
            clock,
            handle,
            phase: EnginePhase::Created,
        })
    }

    /// Creates a module. See [`ModuleManager::create`].
    ///
    /// # Errors
    ///
    /// As [`ModuleManager::create`].
    pub fn create<M: Module>(&mut self, module: M) -> EngineResult<Shared<M>> {
        self.modules.create(module)
    }

    /// Checks that every module can initialize, then dispatches
    /// [`Initialize`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnresolvedDependencies`] if some module waits
    /// on a dependency that was never created and strict mode is on. The
    /// engine stays in the created phase.
    pub fn startup(&mut self) -> EngineResult<()> {
        if self.phase != EnginePhase::Created {
            return Ok(());
        }

        if self.dispatcher.has_pending::<Initialize>() {
            let report = self.dispatcher.pending_report::<Initialize>();
            for pending in &report {
                tracing::error!(module = %pending.name, unmet = ?pending.unmet, "unresolved dependency");
            }
            for cycle in self.dispatcher.find_cycles::<Initialize>() {
                tracing::error!(%cycle, "dependency cycle");
            }
            if self.config.strict_dependencies {
                return Err(EngineError::UnresolvedDependencies(report));
            }
        }

        self.dispatcher.dispatch_now(&Initialize {
            config: Arc::clone(&self.config),
        });
        self.phase = EnginePhase::Running;
        tracing::info!(
            app = %self.config.name,
            order = ?self.modules.initialization_order(),
            "engine started"
        );
        Ok(())
    }

    /// Runs one frame and returns its timing.
    ///
    /// Returns `None` without dispatching anything unless the engine is
    /// running, so modules never see frame events before [`Initialize`] or
    /// after [`Shutdown`].
    pub fn frame(&mut self) -> Option<FrameTiming> {
        if self.phase != EnginePhase::Running {
            tracing::debug!(phase = ?self.phase, "frame skipped");
            return None;
        }

        let timing = self.clock.tick();
        let frame = timing.frame;

        self.dispatcher.dispatch_now(&Update {
            dt: timing.dt,
            fps: timing.fps,
            frame,
        });
        self.modules.drain_buffered();
        self.dispatcher.dispatch_now(&StartFrame { frame });
        self.dispatcher.dispatch_now(&Draw { frame });
        self.dispatcher.dispatch_now(&EndFrame { frame });

        Some(timing)
    }

    /// Starts up, runs frames until shutdown is requested or `max_frames`
    /// is reached, then shuts down.
    ///
    /// Returns the number of frames run.
    ///
    /// # Errors
    ///
    /// As [`startup`](Self::startup). Nothing runs if startup fails.
    pub fn run(&mut self) -> EngineResult<u64> {
        self.startup()?;

        let mut frames = 0;
        while !self.should_stop(frames) {
            self.frame();
            frames += 1;
        }

        self.shutdown();
        Ok(frames)
    }

    fn should_stop(&self, frames: u64) -> bool {
        self.handle.is_shutdown_requested()
            || self.config.max_frames.is_some_and(|max| frames >= max)
    }

    /// Dispatches [`Shutdown`], dependents first. Only the first call after
    /// a successful startup does anything.
    pub fn shutdown(&mut self) {
        if self.phase != EnginePhase::Running {
            return;
        }
        self.phase = EnginePhase::Stopped;
        self.dispatcher.dispatch_now_reverse(&Shutdown);
        tracing::info!(app = %self.config.name, frames = self.clock.frames(), "engine stopped");
    }

    /// Handle for requesting shutdown from elsewhere.
    #[must_use]
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// The modules.
    #[must_use]
    pub fn modules(&self) -> &ModuleManager {
        &self.modules
    }

    /// The dispatcher every module lives on.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// The validated configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("name", &self.config.name)
            .field("phase", &self.phase)
            .field("frames", &self.clock.frames())
            .field("modules", &self.modules)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            fps_window: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(Engine::new(config), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_empty_engine_runs_max_frames() {
        let mut engine = Engine::new(EngineConfig {
            max_frames: Some(3),
            ..EngineConfig::default()
        })
        .unwrap();
        assert_eq!(engine.run().unwrap(), 3);
        assert_eq!(engine.phase(), EnginePhase::Stopped);
    }

    #[test]
    fn test_handle_stops_loop_before_first_frame() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.handle().request_shutdown();
        assert_eq!(engine.run().unwrap(), 0);
    }

    #[test]
    fn test_frame_outside_running_phase_is_skipped() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let updates = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&updates);
        engine
            .dispatcher()
            .subscribe("watcher", Vec::<&str>::new(), move |_: &Update| {
                seen.store(true, Ordering::Relaxed);
            })
            .unwrap();

        assert!(engine.frame().is_none());
        assert!(!updates.load(Ordering::Relaxed));

        engine.startup().unwrap();
        assert_eq!(engine.frame().map(|timing| timing.frame), Some(0));
        assert!(updates.load(Ordering::Relaxed));

        engine.shutdown();
        updates.store(false, Ordering::Relaxed);
        assert!(engine.frame().is_none());
        assert!(!updates.load(Ordering::Relaxed));
    }

    #[test]
    fn test_shutdown_requested_event_sets_handle() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let handle = engine.handle();
        assert!(!handle.is_shutdown_requested());
        engine.dispatcher().dispatch_now(&ShutdownRequested);
        assert!(handle.is_shutdown_requested());
    }

    #[test]
    fn test_second_engine_on_shared_dispatcher_rejected() {
        let dispatcher = Arc::new(Dispatcher::new());
        let _first = Engine::with_dispatcher(EngineConfig::default(), Arc::clone(&dispatcher)).unwrap();
        let second = Engine::with_dispatcher(EngineConfig::default(), dispatcher);
        assert!(matches!(second, Err(EngineError::Registry(_))));
    }
}
