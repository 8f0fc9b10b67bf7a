//! # Dispatcher
//!
//! One [`Registry`] of callbacks and one set of buffers per event type.
//!
//! ## Locking
//!
//! ```text
//! receivers: ReentrantMutex  ── subscribe, dispatch_now, drain, diagnostics
//! buffers:   ReentrantMutex  ── enqueue, drain (queue take only), precreate
//! ```
//!
//! Lock order is always receivers then buffers. Both locks are re-entrant,
//! so a callback may subscribe, enqueue or dispatch on the thread that is
//! delivering to it. Delivery snapshots the callback handles first and holds
//! no interior borrow while user code runs.

use std::cell::RefCell;
use std::sync::Arc;

use parking_lot::ReentrantMutex;

use super::buffers::Buffers;
use super::event::{Callback, Event};
use super::type_map::TypeMap;
use crate::diagnostics::{CycleReport, PendingReport};
use crate::error::RegistryResult;
use crate::registry::{Placement, Registry, SubscriberState};

type Channel<E> = Registry<Callback<E>>;

/// Typed publish/dispatch hub.
///
/// Independent instances never share state. `Dispatcher` is `Send + Sync`;
/// wrap it in an `Arc` to share it between threads.
///
/// # Example
///
/// ```rust
/// use concord_core::{Dispatcher, Event};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
///
/// struct Tick(u32);
/// impl Event for Tick {
///     const CHANNEL: &'static str = "tick";
/// }
///
/// let dispatcher = Dispatcher::new();
/// let total = Arc::new(AtomicU32::new(0));
/// let sink = Arc::clone(&total);
/// dispatcher
///     .subscribe("counter", Vec::<&str>::new(), move |tick: &Tick| {
///         sink.fetch_add(tick.0, Ordering::Relaxed);
///     })
///     .unwrap();
///
/// assert_eq!(dispatcher.dispatch_now(&Tick(5)), 1);
/// assert_eq!(total.load(Ordering::Relaxed), 5);
/// ```
pub struct Dispatcher {
    receivers: ReentrantMutex<RefCell<TypeMap>>,
    buffers: ReentrantMutex<RefCell<TypeMap>>,
}

impl Dispatcher {
    /// Creates a dispatcher with no channels.
    #[must_use]
    pub fn new() -> Self {
        Self {
            receivers: ReentrantMutex::new(RefCell::new(TypeMap::default())),
            buffers: ReentrantMutex::new(RefCell::new(TypeMap::default())),
        }
    }

    /// Subscribes `callback` to `E` under `name`, ordered after `deps`.
    ///
    /// Also creates `name`'s buffer on this channel if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateSubscriber`](crate::RegistryError::DuplicateSubscriber)
    /// if `name` already subscribed to `E`.
    pub fn subscribe<E, I, S, F>(&self, name: &str, deps: I, callback: F) -> RegistryResult<Placement>
    where
        E: Event,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&E) + Send + Sync + 'static,
    {
        // Collected up front: the iterator is caller code.
        let deps: Vec<S> = deps.into_iter().collect();
        let callback: Callback<E> = Arc::new(callback);

        let added = {
            let receivers = self.receivers.lock();
            let mut map = receivers.borrow_mut();
            map.get_or_default::<Channel<E>>()
                .add(name, deps, Arc::clone(&callback))
        };
        // Released outside the borrow: a rejected callback's captures may
        // re-enter the dispatcher from their destructors.
        drop(callback);
        let placement = added?;
        self.precreate_buffer::<E>(name);

        tracing::debug!(channel = E::CHANNEL, name, ?placement, "subscribed");
        Ok(placement)
    }

    /// Delivers `event` to every finalized subscriber of `E`, dependencies
    /// first, on the calling thread.
    ///
    /// Returns the number of callbacks invoked. Subscribers added during the
    /// delivery do not receive this event. A panicking callback propagates
    /// and the remaining subscribers are skipped.
    pub fn dispatch_now<E: Event>(&self, event: &E) -> usize {
        self.deliver(event, false)
    }

    /// Like [`dispatch_now`](Self::dispatch_now), dependents first.
    pub fn dispatch_now_reverse<E: Event>(&self, event: &E) -> usize {
        self.deliver(event, true)
    }

    fn deliver<E: Event>(&self, event: &E, reverse: bool) -> usize {
        let receivers = self.receivers.lock();
        let callbacks: Vec<Callback<E>> = {
            let map = receivers.borrow();
            match map.get::<Channel<E>>() {
                Some(channel) if reverse => channel.order_reverse().cloned().collect(),
                Some(channel) => channel.order().cloned().collect(),
                None => return 0,
            }
        };

        tracing::trace!(
            channel = E::CHANNEL,
            subscribers = callbacks.len(),
            reverse,
            "dispatch"
        );
        for callback in &callbacks {
            callback(event);
        }

        drop(receivers);
        callbacks.len()
    }

    /// Appends a copy of `event` to every buffer of `E`, including buffers
    /// whose owner has not subscribed yet.
    ///
    /// Every subscriber of `E` owns a buffer, so a subscriber that is only
    /// ever reached through [`dispatch_now`](Self::dispatch_now) still
    /// collects enqueued payloads that nothing drains. Only enqueue on
    /// channels whose subscribers are all drained.
    ///
    /// Returns the number of buffers that received it.
    pub fn enqueue<E: Event + Clone>(&self, event: E) -> usize {
        let buffers = self.buffers.lock();
        let mut map = buffers.borrow_mut();
        let reached = map
            .get_mut::<Buffers<E>>()
            .map_or(0, |buffers| buffers.push_all(event));

        tracing::trace!(channel = E::CHANNEL, buffers = reached, "enqueued");
        reached
    }

    /// Delivers every payload queued for `name` to `name`'s callback, in
    /// FIFO order, and empties the queue.
    ///
    /// Returns the number of payloads delivered. Payloads enqueued while the
    /// drain runs stay queued for the next drain. If `name` has no finalized
    /// callback on `E` yet, the queue is left intact and 0 is returned. A
    /// panicking callback drops the payloads queued behind it.
    pub fn drain<E: Event>(&self, name: &str) -> usize {
        let receivers = self.receivers.lock();
        let callback = {
            let map = receivers.borrow();
            map.get::<Channel<E>>()
                .and_then(|channel| channel.get(name))
                .cloned()
        };
        let Some(callback) = callback else {
            return 0;
        };

        let queued = {
            let buffers = self.buffers.lock();
            let mut map = buffers.borrow_mut();
            map.get_mut::<Buffers<E>>()
                .map(|buffers| buffers.take(name))
                .unwrap_or_default()
        };

        for event in &queued {
            callback(event);
        }

        drop(receivers);
        queued.len()
    }

    /// Creates `name`'s buffer on `E` so it collects payloads before `name`
    /// subscribes. Idempotent.
    pub fn precreate_buffer<E: Event>(&self, name: &str) {
        let buffers = self.buffers.lock();
        buffers.borrow_mut().get_or_default::<Buffers<E>>().ensure(name);
    }

    /// Number of payloads waiting in `name`'s buffer on `E`.
    #[must_use]
    pub fn buffered_len<E: Event>(&self, name: &str) -> usize {
        let buffers = self.buffers.lock();
        let map = buffers.borrow();
        map.get::<Buffers<E>>()
            .map_or(0, |buffers| buffers.queued(name))
    }

    /// Number of buffers on `E`.
    #[must_use]
    pub fn buffer_count<E: Event>(&self) -> usize {
        let buffers = self.buffers.lock();
        let map = buffers.borrow();
        map.get::<Buffers<E>>().map_or(0, Buffers::len)
    }

    /// Returns true if some subscriber of `E` still waits on dependencies.
    #[must_use]
    pub fn has_pending<E: Event>(&self) -> bool {
        self.inspect::<E, _>(Registry::has_pending).unwrap_or(false)
    }

    /// Pending subscribers of `E` and what each still waits on.
    #[must_use]
    pub fn pending_report<E: Event>(&self) -> Vec<PendingReport> {
        self.inspect::<E, _>(Registry::pending_report)
            .unwrap_or_default()
    }

    /// Dependency cycles among pending subscribers of `E`.
    #[must_use]
    pub fn find_cycles<E: Event>(&self) -> Vec<CycleReport> {
        self.inspect::<E, _>(Registry::find_cycles)
            .unwrap_or_default()
    }

    /// Finalized subscriber names of `E` in delivery order.
    #[must_use]
    pub fn order_names<E: Event>(&self) -> Vec<String> {
        self.inspect::<E, _>(Registry::names).unwrap_or_default()
    }

    /// State of `name` on `E`.
    #[must_use]
    pub fn state<E: Event>(&self, name: &str) -> SubscriberState {
        self.inspect::<E, _>(|channel| channel.state(name))
            .unwrap_or(SubscriberState::Unregistered)
    }

    /// Number of finalized subscribers of `E`.
    #[must_use]
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.inspect::<E, _>(Registry::len).unwrap_or(0)
    }

    /// Number of event types with at least one subscription attempt.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        let receivers = self.receivers.lock();
        let count = receivers.borrow().len();
        count
    }

    /// Runs `f` against `E`'s registry. Never runs user callbacks.
    fn inspect<E: Event, R>(&self, f: impl FnOnce(&Channel<E>) -> R) -> Option<R> {
        let receivers = self.receivers.lock();
        let map = receivers.borrow();
        map.get::<Channel<E>>().map(f)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("channels", &self.channel_count())
            .finish_non_exhaustive()
    }
}
