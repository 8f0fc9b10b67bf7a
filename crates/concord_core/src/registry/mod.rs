//! # Dependency-Ordered Registry
//!
//! An incremental topological order. Items arrive one at a time, in any
//! order, each with a set of named dependencies that may not exist yet.
//! The registry keeps an append-only *finalized* order in which every
//! dependency precedes its dependents, plus a *pending* set of items still
//! waiting on something.
//!
//! ## Algorithm
//!
//! ```text
//! add(name, deps, value)
//!   ├─ intern name + deps            (ids are arena handles, never freed)
//!   ├─ drop deps already finalized   (they are satisfied)
//!   ├─ unmet empty?
//!   │    yes → append to finalized, cascade:
//!   │          work-list = [name]
//!   │          pop id → for each waiter in reverse_index[id]:
//!   │                     countdown -= 1
//!   │                     countdown == 0 → append, push waiter
//!   │    no  → store pending, reverse_index[dep] += name for each unmet dep
//! ```
//!
//! Cascade resolution only follows the reverse index of ids that were just
//! finalized. The pending set is never rescanned, so N registrations with
//! bounded out-degree cost O(N + edges).

mod cycle;
mod order;
mod slot;

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;

use crate::diagnostics::{CycleReport, PendingReport};
use crate::error::{RegistryError, RegistryResult};

pub use order::Order;
pub use slot::{SubscriberId, SubscriberState};

use order::Finalized;
use slot::{PendingEntry, Slot, SlotState};

/// Where [`Registry::add`] placed a new subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Appended to the finalized order.
    Finalized {
        /// Position of the new subscriber.
        position: usize,
        /// Pending subscribers finalized as a consequence (cascade).
        cascaded: usize,
    },
    /// Stored as pending until its dependencies are finalized.
    Pending {
        /// Number of dependencies still unmet.
        unmet: usize,
        /// Every unmet dependency is itself already waiting on this
        /// subscriber. Narrow heuristic: longer cycles are not flagged here,
        /// use [`Registry::find_cycles`] for those.
        suspected_cycle: bool,
    },
}

impl Placement {
    /// Returns true if the subscriber landed in the finalized order.
    #[inline]
    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        matches!(self, Self::Finalized { .. })
    }
}

/// Dependency-ordered container of named values.
///
/// # Example
///
/// ```rust
/// use concord_core::Registry;
///
/// let mut registry = Registry::new();
/// registry.add("renderer", ["window"], 2).unwrap();
/// registry.add("window", Vec::<&str>::new(), 1).unwrap();
///
/// let order: Vec<_> = registry.order().copied().collect();
/// assert_eq!(order, vec![1, 2]);
/// ```
pub struct Registry<T> {
    /// Name to arena handle.
    ids: HashMap<Box<str>, SubscriberId>,
    /// The arena. Indexed by `SubscriberId`.
    slots: Vec<Slot<T>>,
    /// Append-only finalized order.
    finalized: Vec<Finalized<T>>,
    /// Number of slots in the pending state.
    pending: usize,
}

impl<T> Registry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            slots: Vec::new(),
            finalized: Vec::new(),
            pending: 0,
        }
    }

    /// Creates an empty registry with room for `capacity` names.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: HashMap::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            finalized: Vec::with_capacity(capacity),
            pending: 0,
        }
    }

    /// Returns the handle for `name`, allocating the next one if needed.
    ///
    /// Idempotent. Handles are never reused or freed.
    pub fn intern(&mut self, name: &str) -> SubscriberId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }

        let id = SubscriberId::new(self.slots.len());
        self.slots.push(Slot::new(name));
        self.ids.insert(name.into(), id);
        id
    }

    /// Looks up the handle for `name` without interning it.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<SubscriberId> {
        self.ids.get(name).copied()
    }

    /// Returns the name behind a handle.
    #[must_use]
    pub fn name_of(&self, id: SubscriberId) -> Option<&str> {
        self.slots.get(id.index()).map(|slot| &*slot.name)
    }

    /// Adds `value` under `name`, to be ordered after every name in `deps`.
    ///
    /// Dependencies may name subscribers that do not exist yet. Repeated
    /// dependencies count once.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateSubscriber`] if `name` was already
    /// added (pending or finalized). The existing entry is left untouched;
    /// only newly seen dependency names are interned.
    pub fn add<I, S>(&mut self, name: &str, deps: I, value: T) -> RegistryResult<Placement>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let id = self.intern(name);
        let declared = self.intern_deps(deps);

        let slot = &self.slots[id.index()];
        if !matches!(slot.state, SlotState::Unregistered) {
            let state = slot.public_state();
            tracing::warn!(name, %state, "duplicate subscriber rejected");
            return Err(RegistryError::DuplicateSubscriber {
                name: name.to_string(),
                state,
            });
        }

        let unmet: Vec<SubscriberId> = declared
            .iter()
            .copied()
            .filter(|dep| !self.slots[dep.index()].is_finalized())
            .collect();
        self.slots[id.index()].declared = declared;

        if unmet.is_empty() {
            let position = self.finalize(id, value);
            let cascaded = self.cascade(id);
            tracing::debug!(name, position, cascaded, "subscriber finalized");
            return Ok(Placement::Finalized { position, cascaded });
        }

        for dep in &unmet {
            self.slots[dep.index()].waiters.push(id);
        }

        let waiters = &self.slots[id.index()].waiters;
        let suspected_cycle = unmet.iter().all(|dep| waiters.contains(dep));
        if suspected_cycle {
            tracing::warn!(name, "subscriber depends on subscribers that wait on it");
        }

        let count = unmet.len();
        self.slots[id.index()].state = SlotState::Pending(PendingEntry {
            value,
            unmet,
            remaining: count,
        });
        self.pending += 1;
        tracing::debug!(name, unmet = count, "subscriber pending");

        Ok(Placement::Pending {
            unmet: count,
            suspected_cycle,
        })
    }

    /// Interns every dependency, keeping the first occurrence of repeats.
    fn intern_deps<I, S>(&mut self, deps: I) -> Vec<SubscriberId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut declared = Vec::new();
        let mut seen = HashSet::new();
        for dep in deps {
            let dep = self.intern(dep.as_ref());
            if seen.insert(dep) {
                declared.push(dep);
            }
        }
        declared
    }

    /// Appends to the finalized order. Returns the new position.
    fn finalize(&mut self, id: SubscriberId, value: T) -> usize {
        let position = self.finalized.len();
        self.finalized.push(Finalized { id, value });
        self.slots[id.index()].state = SlotState::Finalized(position);
        position
    }

    /// Finalizes every waiter whose countdown reaches zero, transitively.
    ///
    /// Returns how many pending subscribers were finalized.
    fn cascade(&mut self, root: SubscriberId) -> usize {
        let mut work = vec![root];
        let mut cascaded = 0;

        while let Some(resolved) = work.pop() {
            let waiters = std::mem::take(&mut self.slots[resolved.index()].waiters);

            for waiter in waiters {
                let slot = &mut self.slots[waiter.index()];
                let ready = match &mut slot.state {
                    SlotState::Pending(entry) => {
                        entry.remaining -= 1;
                        entry.remaining == 0
                    }
                    _ => false,
                };
                if !ready {
                    continue;
                }

                if let SlotState::Pending(entry) =
                    std::mem::replace(&mut slot.state, SlotState::Unregistered)
                {
                    self.pending -= 1;
                    self.finalize(waiter, entry.value);
                    cascaded += 1;
                    work.push(waiter);
                }
            }
        }

        cascaded
    }

    /// Finalized values in ascending position order.
    ///
    /// Lazy and restartable: call again for a fresh traversal.
    #[must_use]
    pub fn order(&self) -> Order<'_, T> {
        Order::new(&self.finalized)
    }

    /// Finalized values in descending position order.
    #[must_use]
    pub fn order_reverse(&self) -> std::iter::Rev<Order<'_, T>> {
        self.order().rev()
    }

    /// Finalized `(name, value)` pairs in ascending position order.
    pub fn named(&self) -> impl DoubleEndedIterator<Item = (&str, &T)> + ExactSizeIterator {
        self.finalized
            .iter()
            .map(|entry| (&*self.slots[entry.id.index()].name, &entry.value))
    }

    /// Finalized names in ascending position order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.named().map(|(name, _)| name.to_string()).collect()
    }

    /// The finalized value registered under `name`.
    ///
    /// Pending and unknown names return `None`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&T> {
        let position = self.position(name)?;
        self.finalized.get(position).map(|entry| &entry.value)
    }

    /// Mutable access to the finalized value registered under `name`.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        let position = self.position(name)?;
        self.finalized.get_mut(position).map(|entry| &mut entry.value)
    }

    /// Position of `name` in the finalized order.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        match self.slots[self.id_of(name)?.index()].state {
            SlotState::Finalized(position) => Some(position),
            _ => None,
        }
    }

    /// Current state of `name`. Unknown names are `Unregistered`.
    #[must_use]
    pub fn state(&self, name: &str) -> SubscriberState {
        self.id_of(name).map_or(SubscriberState::Unregistered, |id| {
            self.slots[id.index()].public_state()
        })
    }

    /// Dependencies `name` was added with, in declaration order.
    ///
    /// Returns `None` if `name` was never added.
    #[must_use]
    pub fn dependencies(&self, name: &str) -> Option<Vec<&str>> {
        let slot = &self.slots[self.id_of(name)?.index()];
        if matches!(slot.state, SlotState::Unregistered) {
            return None;
        }
        Some(
            slot.declared
                .iter()
                .map(|dep| &*self.slots[dep.index()].name)
                .collect(),
        )
    }

    /// Number of finalized subscribers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.finalized.len()
    }

    /// Returns true if nothing has been finalized.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.finalized.is_empty()
    }

    /// Number of pending subscribers.
    #[inline]
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending
    }

    /// Number of interned names, including names only seen as dependencies.
    #[inline]
    #[must_use]
    pub fn interned_len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if any subscriber is still waiting on dependencies.
    #[inline]
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending > 0
    }

    /// Every pending subscriber with the dependencies it still waits on.
    ///
    /// Reported in interning order.
    #[must_use]
    pub fn pending_report(&self) -> Vec<PendingReport> {
        self.slots
            .iter()
            .filter_map(|slot| match &slot.state {
                SlotState::Pending(entry) => Some(PendingReport {
                    name: slot.name.to_string(),
                    unmet: entry
                        .unmet
                        .iter()
                        .filter(|dep| !self.slots[dep.index()].is_finalized())
                        .map(|dep| self.slots[dep.index()].name.to_string())
                        .collect(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Dependency cycles among pending subscribers.
    ///
    /// Full detection, unlike the heuristic flag returned by
    /// [`add`](Self::add). Every pending subscriber that sits on a cycle
    /// appears in at least one report.
    #[must_use]
    pub fn find_cycles(&self) -> Vec<CycleReport> {
        cycle::find_cycles(&self.slots)
            .into_iter()
            .map(|ids| CycleReport {
                names: ids
                    .into_iter()
                    .map(|id| self.slots[id.index()].name.to_string())
                    .collect(),
            })
            .collect()
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("order", &self.names())
            .field("pending", &self.pending)
            .field("interned", &self.slots.len())
            .finish()
    }
}

/// Renders the finalized order as `[a, b, c]`.
impl<T> fmt::Display for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (name, _)) in self.named().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_DEPS: [&str; 0] = [];

    fn order_of<T: Copy>(registry: &Registry<T>) -> Vec<T> {
        registry.order().copied().collect()
    }

    #[test]
    fn test_intern_is_idempotent() {
        let mut registry: Registry<()> = Registry::new();
        let a = registry.intern("a");
        let b = registry.intern("b");
        assert_ne!(a, b);
        assert_eq!(registry.intern("a"), a);
        assert_eq!(registry.name_of(b), Some("b"));
        assert_eq!(registry.interned_len(), 2);
    }

    #[test]
    fn test_no_deps_appends_in_arrival_order() {
        let mut registry = Registry::new();
        registry.add("a", NO_DEPS, 'a').unwrap();
        registry.add("b", NO_DEPS, 'b').unwrap();
        registry.add("c", NO_DEPS, 'c').unwrap();
        assert_eq!(order_of(&registry), vec!['a', 'b', 'c']);
        assert_eq!(registry.to_string(), "[a, b, c]");
    }

    #[test]
    fn test_dependency_before_dependent() {
        let mut registry = Registry::new();
        let placement = registry.add("renderer", ["window"], 2).unwrap();
        assert_eq!(
            placement,
            Placement::Pending {
                unmet: 1,
                suspected_cycle: false
            }
        );
        assert!(registry.has_pending());

        let placement = registry.add("window", NO_DEPS, 1).unwrap();
        assert_eq!(
            placement,
            Placement::Finalized {
                position: 0,
                cascaded: 1
            }
        );
        assert_eq!(order_of(&registry), vec![1, 2]);
        assert!(!registry.has_pending());
    }

    #[test]
    fn test_already_finalized_dependency_is_satisfied() {
        let mut registry = Registry::new();
        registry.add("window", NO_DEPS, 1).unwrap();
        let placement = registry.add("input", ["window"], 2).unwrap();
        assert_eq!(
            placement,
            Placement::Finalized {
                position: 1,
                cascaded: 0
            }
        );
    }

    #[test]
    fn test_diamond_reverse_insertion() {
        let mut registry = Registry::new();
        registry.add("d", ["b", "c"], 'd').unwrap();
        registry.add("b", ["a"], 'b').unwrap();
        registry.add("c", ["a"], 'c').unwrap();
        let placement = registry.add("a", NO_DEPS, 'a').unwrap();

        assert_eq!(
            placement,
            Placement::Finalized {
                position: 0,
                cascaded: 3
            }
        );
        let order = order_of(&registry);
        assert_eq!(order.first(), Some(&'a'));
        assert_eq!(order.last(), Some(&'d'));
        assert_eq!(order.len(), 4);
    }

    #[test]
    fn test_deep_cascade() {
        let mut registry = Registry::new();
        // n9 -> n8 -> ... -> n0, registered dependents first.
        for i in (1..10).rev() {
            registry
                .add(&format!("n{i}"), [format!("n{}", i - 1)], i)
                .unwrap();
        }
        assert_eq!(registry.pending_len(), 9);

        let placement = registry.add("n0", NO_DEPS, 0).unwrap();
        assert_eq!(
            placement,
            Placement::Finalized {
                position: 0,
                cascaded: 9
            }
        );
        assert_eq!(order_of(&registry), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_duplicate_rejected_first_wins() {
        let mut registry = Registry::new();
        registry.add("a", NO_DEPS, 1).unwrap();
        registry.add("b", ["a"], 2).unwrap();

        let err = registry.add("a", ["zzz"], 99).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateSubscriber {
                name: "a".to_string(),
                state: SubscriberState::Finalized { position: 0 },
            }
        );
        assert_eq!(registry.get("a"), Some(&1));
        assert_eq!(registry.position("a"), Some(0));
        assert_eq!(order_of(&registry), vec![1, 2]);
        // The new dependency name was interned, nothing else changed.
        assert!(registry.id_of("zzz").is_some());
        assert_eq!(registry.state("zzz"), SubscriberState::Unregistered);
    }

    #[test]
    fn test_duplicate_pending_rejected() {
        let mut registry = Registry::new();
        registry.add("b", ["a"], 1).unwrap();
        let err = registry.add("b", NO_DEPS, 2).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::DuplicateSubscriber {
                state: SubscriberState::Pending,
                ..
            }
        ));

        registry.add("a", NO_DEPS, 0).unwrap();
        assert_eq!(order_of(&registry), vec![0, 1]);
    }

    #[test]
    fn test_repeated_dependency_counts_once() {
        let mut registry = Registry::new();
        let placement = registry.add("b", ["a", "a", "a"], 1).unwrap();
        assert_eq!(
            placement,
            Placement::Pending {
                unmet: 1,
                suspected_cycle: false
            }
        );
        registry.add("a", NO_DEPS, 0).unwrap();
        assert_eq!(order_of(&registry), vec![0, 1]);
        assert_eq!(registry.dependencies("b"), Some(vec!["a"]));
    }

    #[test]
    fn test_never_satisfied_dependency_stays_pending() {
        let mut registry = Registry::new();
        registry.add("x", ["y"], 1).unwrap();
        registry.add("other", NO_DEPS, 2).unwrap();

        assert!(registry.has_pending());
        assert_eq!(
            registry.pending_report(),
            vec![PendingReport {
                name: "x".to_string(),
                unmet: vec!["y".to_string()],
            }]
        );
        assert_eq!(order_of(&registry), vec![2]);
        assert!(registry.get("x").is_none());
    }

    #[test]
    fn test_pending_report_lists_only_unmet() {
        let mut registry = Registry::new();
        registry.add("c", ["a", "b"], 3).unwrap();
        registry.add("a", NO_DEPS, 1).unwrap();

        let report = registry.pending_report();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].name, "c");
        assert_eq!(report[0].unmet, vec!["b".to_string()]);
    }

    #[test]
    fn test_two_cycle_heuristic_flags() {
        let mut registry = Registry::new();
        let first = registry.add("a", ["b"], 1).unwrap();
        let second = registry.add("b", ["a"], 2).unwrap();
        assert_eq!(
            first,
            Placement::Pending {
                unmet: 1,
                suspected_cycle: false
            }
        );
        assert_eq!(
            second,
            Placement::Pending {
                unmet: 1,
                suspected_cycle: true
            }
        );
    }

    #[test]
    fn test_three_cycle_missed_by_heuristic_found_by_detection() {
        let mut registry = Registry::new();
        let placements = [
            registry.add("a", ["c"], 1).unwrap(),
            registry.add("b", ["a"], 2).unwrap(),
            registry.add("c", ["b"], 3).unwrap(),
        ];
        assert!(placements
            .iter()
            .all(|p| matches!(p, Placement::Pending { suspected_cycle: false, .. })));

        let cycles = registry.find_cycles();
        assert_eq!(cycles.len(), 1);
        let cycle = &cycles[0];
        assert_eq!(cycle.len(), 3);
        assert_eq!(cycle.names.first(), cycle.names.last());
        assert!(cycle.contains("a") && cycle.contains("b") && cycle.contains("c"));
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let mut registry = Registry::new();
        let placement = registry.add("loop", ["loop"], 1).unwrap();
        assert_eq!(
            placement,
            Placement::Pending {
                unmet: 1,
                suspected_cycle: true
            }
        );
        let cycles = registry.find_cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].names, vec!["loop".to_string(), "loop".to_string()]);
    }

    #[test]
    fn test_missing_dependency_is_not_a_cycle() {
        let mut registry = Registry::new();
        registry.add("a", ["b"], 1).unwrap();
        registry.add("b", ["missing"], 2).unwrap();
        assert!(registry.find_cycles().is_empty());
        assert_eq!(registry.pending_len(), 2);
    }

    #[test]
    fn test_reverse_matches_forward() {
        let mut registry = Registry::new();
        registry.add("c", ["b"], 'c').unwrap();
        registry.add("a", NO_DEPS, 'a').unwrap();
        registry.add("b", ["a"], 'b').unwrap();

        let forward = order_of(&registry);
        let mut reverse: Vec<char> = registry.order_reverse().copied().collect();
        reverse.reverse();
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_order_is_restartable() {
        let mut registry = Registry::new();
        registry.add("a", NO_DEPS, 1).unwrap();
        registry.add("b", NO_DEPS, 2).unwrap();

        let order = registry.order();
        assert_eq!(order.len(), 2);
        let first: Vec<_> = order.clone().collect();
        let second: Vec<_> = order.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_get_mut_and_dependencies() {
        let mut registry = Registry::new();
        registry.add("a", NO_DEPS, 1).unwrap();
        registry.add("b", ["a"], 2).unwrap();

        if let Some(value) = registry.get_mut("b") {
            *value = 20;
        }
        assert_eq!(registry.get("b"), Some(&20));
        assert_eq!(registry.dependencies("b"), Some(vec!["a"]));
        assert_eq!(registry.dependencies("nope"), None);
    }
}
