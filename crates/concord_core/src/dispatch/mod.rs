//! # Typed Dispatch
//!
//! Every [`Event`] type is its own channel: an independent dependency-ordered
//! registry of callbacks plus a map of per-subscriber buffers.
//!
//! ## Delivery Modes
//!
//! | Mode                   | When callbacks run        | Order               |
//! |------------------------|---------------------------|---------------------|
//! | `dispatch_now`         | immediately, caller thread | dependencies first |
//! | `dispatch_now_reverse` | immediately, caller thread | dependents first   |
//! | `enqueue` + `drain`    | when the subscriber drains | FIFO per subscriber |

mod buffers;
mod dispatcher;
mod event;
mod type_map;

pub use dispatcher::Dispatcher;
pub use event::{Callback, Event};
