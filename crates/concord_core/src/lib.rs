//! # CONCORD Core
//!
//! Decides in what order independently written subsystems hear about
//! things, given only the names each one depends on.
//!
//! ## Design Principles
//!
//! 1. **Register in any order** - Dependencies may be named before they exist
//! 2. **Linear registration** - Pending entries are resolved by cascade, never by rescanning
//! 3. **Typed channels** - Each payload type owns its own subscriber order
//! 4. **No globals** - Every [`Dispatcher`] is an independent value
//!
//! ## Thread Safety
//!
//! [`Dispatcher`] is `Send + Sync`. Callbacks run on the thread that
//! dispatches or drains, and may re-enter the dispatcher on that thread.
//!
//! ## Example
//!
//! ```rust
//! use concord_core::{Dispatcher, Event};
//!
//! #[derive(Clone)]
//! struct Initialize;
//! impl Event for Initialize {
//!     const CHANNEL: &'static str = "initialize";
//! }
//!
//! let dispatcher = Dispatcher::new();
//! dispatcher.subscribe("Renderer", ["Window"], |_: &Initialize| {}).unwrap();
//! dispatcher.subscribe("Window", Vec::<&str>::new(), |_: &Initialize| {}).unwrap();
//!
//! assert_eq!(dispatcher.order_names::<Initialize>(), vec!["Window", "Renderer"]);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod registry;

pub use diagnostics::{CycleReport, PendingReport};
pub use dispatch::{Callback, Dispatcher, Event};
pub use error::{RegistryError, RegistryResult};
pub use registry::{Order, Placement, Registry, SubscriberId, SubscriberState};
