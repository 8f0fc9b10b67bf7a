//! # Module Lifecycle
//!
//! A module is a subsystem (window, input, graphics context, audio, the
//! application itself) that declares which other modules must come before
//! it. Creating a module subscribes it to [`Initialize`] and [`Shutdown`]
//! under its own name with those dependencies, so initialization runs
//! dependencies first and shutdown runs dependents first, regardless of the
//! order modules were created in.
//!
//! ```rust
//! use concord_engine::{module_deps, Module};
//!
//! struct Window;
//! impl Module for Window {
//!     const NAME: &'static str = "Window";
//! }
//!
//! struct Renderer;
//! impl Module for Renderer {
//!     const NAME: &'static str = "Renderer";
//!
//!     fn dependencies(&self) -> Vec<&'static str> {
//!         module_deps![Window]
//!     }
//! }
//! ```
//!
//! ## Locking
//!
//! Module state lives behind a `parking_lot::Mutex` that is held while a
//! handler runs. A handler must not synchronously dispatch an event its own
//! module handles; `enqueue` it instead.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use concord_core::{Dispatcher, Event, Placement};
use parking_lot::{Mutex, Once};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::events::{Initialize, Shutdown};

/// Shared handle to a module's state.
pub type Shared<M> = Arc<Mutex<M>>;

type BufferedDrain = Box<dyn Fn(&Dispatcher) -> usize + Send + Sync>;

/// A subsystem with a lifecycle.
pub trait Module: Send + Sized + 'static {
    /// Unique, stable name. Conventionally the type name.
    const NAME: &'static str;

    /// Names of modules that must initialize before this one.
    ///
    /// Build it with [`module_deps!`](crate::module_deps).
    fn dependencies(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Runs once, after every dependency has initialized.
    fn initialize(&mut self, _event: &Initialize) {}

    /// Runs once, before any dependency shuts down.
    fn shutdown(&mut self) {}

    /// Attaches handlers for further channels (`Update`, `Draw`, ...).
    ///
    /// Called once, before the lifecycle subscriptions are made.
    ///
    /// # Errors
    ///
    /// Propagate any error from [`Hooks::on`].
    fn register(_hooks: &mut Hooks<'_, Self>) -> EngineResult<()> {
        Ok(())
    }
}

/// Names of the given module types, for [`Module::dependencies`].
#[macro_export]
macro_rules! module_deps {
    ($($module:ty),* $(,)?) => {
        ::std::vec::Vec::<&'static str>::from([$(<$module as $crate::Module>::NAME),*])
    };
}

/// Subscription helper handed to [`Module::register`].
///
/// Every handler is subscribed under the module's name.
pub struct Hooks<'a, M: Module> {
    module: &'a Shared<M>,
    dispatcher: &'a Arc<Dispatcher>,
    dependencies: &'a [&'static str],
    drains: &'a mut Vec<BufferedDrain>,
}

impl<M: Module> Hooks<'_, M> {
    /// Calls `handler` with the module locked for every `E` dispatched
    /// immediately, ordered after the subscribers named in `deps`.
    ///
    /// `deps` applies to this channel only; it usually names other modules
    /// that also handle `E`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Registry`] if the module already handles `E`.
    pub fn on<E, I, S, F>(&mut self, deps: I, handler: F) -> EngineResult<Placement>
    where
        E: Event,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&mut M, &E) + Send + Sync + 'static,
    {
        let module = Arc::clone(self.module);
        let placement = self.dispatcher.subscribe(M::NAME, deps, move |event: &E| {
            handler(&mut *module.lock(), event);
        })?;
        Ok(placement)
    }

    /// Like [`on`](Self::on), and also drains the module's `E` buffer once
    /// per frame.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Registry`] if the module already handles `E`.
    pub fn on_buffered<E, I, S, F>(&mut self, deps: I, handler: F) -> EngineResult<Placement>
    where
        E: Event,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&mut M, &E) + Send + Sync + 'static,
    {
        let placement = self.on(deps, handler)?;
        self.drains
            .push(Box::new(|dispatcher: &Dispatcher| dispatcher.drain::<E>(M::NAME)));
        Ok(placement)
    }

    /// The dispatcher the module lives on, for handlers that send events.
    ///
    /// A handler holding a strong clone keeps the dispatcher alive through
    /// its own subscription; capture [`Arc::downgrade`] of it if the
    /// dispatcher is meant to be dropped.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        self.dispatcher
    }

    /// The module's own shared state.
    #[must_use]
    pub fn module(&self) -> &Shared<M> {
        self.module
    }

    /// The module's lifecycle dependencies.
    #[must_use]
    pub fn dependencies(&self) -> &[&'static str] {
        self.dependencies
    }
}

/// Owns every module and wires it into a [`Dispatcher`].
pub struct ModuleManager {
    dispatcher: Arc<Dispatcher>,
    config: Arc<EngineConfig>,
    modules: HashMap<&'static str, Arc<dyn Any + Send + Sync>>,
    claimed: HashSet<&'static str>,
    created: Vec<&'static str>,
    drains: Vec<BufferedDrain>,
}

impl ModuleManager {
    /// Creates a manager with no modules.
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>, config: Arc<EngineConfig>) -> Self {
        Self {
            dispatcher,
            config,
            modules: HashMap::new(),
            claimed: HashSet::new(),
            created: Vec::new(),
            drains: Vec::new(),
        }
    }

    /// Takes ownership of `module`, lets it register its handlers, then
    /// subscribes it to the lifecycle channels.
    ///
    /// Nothing is initialized here; see [`create_and_init`](Self::create_and_init).
    ///
    /// The name is claimed before anything is subscribed. If `register`
    /// fails, the module never initializes or shuts down and its buffered
    /// handlers are never drained, but subscriptions it made before the
    /// failure stay on the dispatcher. Creating the same module again is
    /// then rejected as a duplicate.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateModule`] if a module with the same
    /// name was created before (successfully or not), or
    /// [`EngineError::Registry`] if a subscription under the module's name
    /// is rejected.
    pub fn create<M: Module>(&mut self, module: M) -> EngineResult<Shared<M>> {
        if !self.claimed.insert(M::NAME) {
            tracing::warn!(module = M::NAME, "duplicate module rejected");
            return Err(EngineError::DuplicateModule(M::NAME));
        }

        let dependencies = module.dependencies();
        let shared = Arc::new(Mutex::new(module));

        let mut drains = Vec::new();
        let mut hooks = Hooks {
            module: &shared,
            dispatcher: &self.dispatcher,
            dependencies: &dependencies,
            drains: &mut drains,
        };
        if let Err(err) = M::register(&mut hooks) {
            tracing::warn!(module = M::NAME, %err, "module registration failed");
            return Err(err);
        }
        self.subscribe_lifecycle(&shared, &dependencies)?;

        self.drains.append(&mut drains);
        let erased: Arc<dyn Any + Send + Sync> = shared.clone();
        self.modules.insert(M::NAME, erased);
        self.created.push(M::NAME);
        tracing::debug!(module = M::NAME, ?dependencies, "module created");

        Ok(shared)
    }

    /// [`create`](Self::create), then dispatches [`Initialize`] right away.
    ///
    /// Modules that already initialized are not initialized again.
    ///
    /// # Errors
    ///
    /// As [`create`](Self::create).
    pub fn create_and_init<M: Module>(&mut self, module: M) -> EngineResult<Shared<M>> {
        let shared = self.create(module)?;
        self.dispatcher.dispatch_now(&Initialize {
            config: Arc::clone(&self.config),
        });
        Ok(shared)
    }

    fn subscribe_lifecycle<M: Module>(
        &self,
        shared: &Shared<M>,
        dependencies: &[&'static str],
    ) -> EngineResult<()> {
        let target = Arc::clone(shared);
        let once = Once::new();
        self.dispatcher.subscribe(
            M::NAME,
            dependencies.iter().copied(),
            move |event: &Initialize| {
                once.call_once(|| {
                    target.lock().initialize(event);
                    tracing::debug!(module = M::NAME, "module initialized");
                });
            },
        )?;

        let target = Arc::clone(shared);
        let once = Once::new();
        self.dispatcher.subscribe(
            M::NAME,
            dependencies.iter().copied(),
            move |_: &Shutdown| {
                once.call_once(|| {
                    target.lock().shutdown();
                    tracing::debug!(module = M::NAME, "module shut down");
                });
            },
        )?;

        Ok(())
    }

    /// The module of type `M`, if it was created.
    #[must_use]
    pub fn get<M: Module>(&self) -> Option<Shared<M>> {
        let erased = Arc::clone(self.modules.get(M::NAME)?);
        erased.downcast::<Mutex<M>>().ok()
    }

    /// Returns true if a module named `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Module names in creation order.
    #[must_use]
    pub fn names(&self) -> &[&'static str] {
        &self.created
    }

    /// Module names in initialization order. Modules still waiting on
    /// dependencies are left out.
    #[must_use]
    pub fn initialization_order(&self) -> Vec<String> {
        self.dispatcher.order_names::<Initialize>()
    }

    /// Number of modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.created.len()
    }

    /// Returns true if no module was created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
    }

    /// Drains every buffer registered through [`Hooks::on_buffered`].
    ///
    /// Returns the number of payloads delivered.
    pub fn drain_buffered(&self) -> usize {
        self.drains.iter().map(|drain| drain(&self.dispatcher)).sum()
    }

    /// The dispatcher modules are subscribed on.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Configuration handed out with [`Initialize`].
    #[must_use]
    pub fn config(&self) -> &Arc<EngineConfig> {
        &self.config
    }
}

impl std::fmt::Debug for ModuleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleManager")
            .field("modules", &self.created)
            .field("buffered_drains", &self.drains.len())
            .finish_non_exhaustive()
    }
}
