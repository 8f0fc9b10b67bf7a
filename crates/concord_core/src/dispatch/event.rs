//! # Event Payloads

use std::sync::Arc;

/// A payload type that owns its own dispatch channel.
///
/// Every type implementing `Event` gets an independent channel inside a
/// [`Dispatcher`](super::Dispatcher): its own subscriber order and its own
/// buffers. The channel is keyed by the type itself, so two distinct types
/// never share one even if `CHANNEL` collides.
///
/// ```rust
/// use concord_core::Event;
///
/// #[derive(Clone, Debug)]
/// struct Resized {
///     width: u32,
///     height: u32,
/// }
///
/// impl Event for Resized {
///     const CHANNEL: &'static str = "resized";
/// }
/// ```
pub trait Event: Send + Sync + 'static {
    /// Human-readable channel name, used in logs.
    const CHANNEL: &'static str;
}

/// A subscriber callback for payloads of type `E`.
///
/// Shared so that dispatch can snapshot the delivery order and release
/// every internal borrow before running user code.
pub type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;
