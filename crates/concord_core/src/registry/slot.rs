//! # Arena Slots
//!
//! Every interned name owns exactly one slot in the registry arena. The slot
//! records where the subscriber currently lives (nowhere, the pending set, or
//! the finalized order) so no numeric index can ever go stale.

use std::fmt;

/// Opaque handle for an interned subscriber name.
///
/// Handles are minted only by the registry that interned the name, are never
/// reused, and stay valid for the registry's whole lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SubscriberId(usize);

impl SubscriberId {
    #[inline]
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the arena index of this handle.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Where a subscriber currently lives inside a registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubscriberState {
    /// The name is known (possibly only as someone's dependency) but was
    /// never added.
    Unregistered,
    /// Added, waiting on at least one dependency.
    Pending,
    /// Placed in the finalized order. Terminal.
    Finalized {
        /// Position in the finalized order.
        position: usize,
    },
}

impl fmt::Display for SubscriberState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unregistered => f.write_str("unregistered"),
            Self::Pending => f.write_str("pending"),
            Self::Finalized { position } => write!(f, "finalized at position {position}"),
        }
    }
}

/// A subscriber that is still waiting on dependencies.
pub(crate) struct PendingEntry<T> {
    pub(crate) value: T,
    /// Dependencies that were not finalized when the entry was added.
    pub(crate) unmet: Vec<SubscriberId>,
    /// How many of `unmet` are still not finalized.
    pub(crate) remaining: usize,
}

pub(crate) enum SlotState<T> {
    Unregistered,
    Pending(PendingEntry<T>),
    Finalized(usize),
}

/// One arena slot per interned name.
pub(crate) struct Slot<T> {
    pub(crate) name: Box<str>,
    pub(crate) state: SlotState<T>,
    /// Dependencies as declared on `add` (deduplicated, declaration order).
    pub(crate) declared: Vec<SubscriberId>,
    /// Pending subscribers waiting on this slot to be finalized.
    /// Emptied the moment this slot is finalized.
    pub(crate) waiters: Vec<SubscriberId>,
}

impl<T> Slot<T> {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            state: SlotState::Unregistered,
            declared: Vec::new(),
            waiters: Vec::new(),
        }
    }

    #[inline]
    pub(crate) const fn is_finalized(&self) -> bool {
        matches!(self.state, SlotState::Finalized(_))
    }

    #[inline]
    pub(crate) const fn is_pending(&self) -> bool {
        matches!(self.state, SlotState::Pending(_))
    }

    pub(crate) fn public_state(&self) -> SubscriberState {
        match self.state {
            SlotState::Unregistered => SubscriberState::Unregistered,
            SlotState::Pending(_) => SubscriberState::Pending,
            SlotState::Finalized(position) => SubscriberState::Finalized { position },
        }
    }
}
