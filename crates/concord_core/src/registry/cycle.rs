//! # Cycle Detection
//!
//! Full cycle detection over the pending wait graph. Runs on demand only,
//! so registration cost is unaffected.
//!
//! An edge `A -> B` exists when pending subscriber `A` still waits on `B`
//! and `B` is itself pending. Unregistered dependencies cannot be part of a
//! cycle (they may still arrive), and finalized ones are already satisfied.
//!
//! The graph is split into strongly connected components (iterative
//! Tarjan). Each component with more than one member, or with a self-loop,
//! is then covered by shortest cycles until every member appears in one.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};

use super::slot::{Slot, SlotState, SubscriberId};

const UNVISITED: usize = usize::MAX;

/// Returns cycles (as arena handles, first element repeated at the end)
/// among pending subscribers.
///
/// Every pending subscriber that lies on a cycle appears in at least one of
/// the returned cycles. This is not an enumeration of all elementary cycles.
pub(crate) fn find_cycles<T>(slots: &[Slot<T>]) -> Vec<Vec<SubscriberId>> {
    let mut in_component = vec![false; slots.len()];
    let mut covered = vec![false; slots.len()];
    let mut cycles = Vec::new();

    for mut component in strongly_connected(slots) {
        let first = component[0];
        if component.len() == 1 && !unmet(slots, first.index()).contains(&first) {
            continue;
        }

        component.sort_unstable();
        for id in &component {
            in_component[id.index()] = true;
        }

        for &start in &component {
            if covered[start.index()] {
                continue;
            }
            if let Some(cycle) = shortest_cycle(slots, start, &in_component) {
                for id in &cycle {
                    covered[id.index()] = true;
                }
                cycles.push(cycle);
            }
        }

        for id in &component {
            in_component[id.index()] = false;
        }
    }

    cycles
}

/// Strongly connected components of the pending wait graph.
fn strongly_connected<T>(slots: &[Slot<T>]) -> Vec<Vec<SubscriberId>> {
    let mut index = vec![UNVISITED; slots.len()];
    let mut low = vec![0; slots.len()];
    let mut on_stack = vec![false; slots.len()];
    let mut stack: Vec<usize> = Vec::new();
    // (node, next position in its unmet list)
    let mut call: Vec<(usize, usize)> = Vec::new();
    let mut next_index = 0;
    let mut components = Vec::new();

    for (root, slot) in slots.iter().enumerate() {
        if !slot.is_pending() || index[root] != UNVISITED {
            continue;
        }

        index[root] = next_index;
        low[root] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root] = true;
        call.push((root, 0));

        while let Some(frame) = call.last_mut() {
            let node = frame.0;
            if let Some(dep) = unmet(slots, node).get(frame.1) {
                frame.1 += 1;
                let dep = dep.index();
                if !slots[dep].is_pending() {
                    continue;
                }
                if index[dep] == UNVISITED {
                    index[dep] = next_index;
                    low[dep] = next_index;
                    next_index += 1;
                    stack.push(dep);
                    on_stack[dep] = true;
                    call.push((dep, 0));
                } else if on_stack[dep] {
                    low[node] = low[node].min(index[dep]);
                }
                continue;
            }

            call.pop();
            if let Some(&(parent, _)) = call.last() {
                low[parent] = low[parent].min(low[node]);
            }
            if low[node] == index[node] {
                let mut component = Vec::new();
                while let Some(member) = stack.pop() {
                    on_stack[member] = false;
                    component.push(SubscriberId::new(member));
                    if member == node {
                        break;
                    }
                }
                components.push(component);
            }
        }
    }

    components
}

/// Shortest cycle through `start` that stays inside its component.
fn shortest_cycle<T>(
    slots: &[Slot<T>],
    start: SubscriberId,
    in_component: &[bool],
) -> Option<Vec<SubscriberId>> {
    let mut parent: HashMap<usize, usize> = HashMap::new();
    let mut queue = VecDeque::from([start.index()]);

    while let Some(node) = queue.pop_front() {
        for dep in unmet(slots, node) {
            let dep = dep.index();
            if !in_component[dep] {
                continue;
            }
            if dep == start.index() {
                let mut cycle = vec![start];
                let mut at = node;
                loop {
                    cycle.push(SubscriberId::new(at));
                    match parent.get(&at) {
                        Some(&previous) if at != start.index() => at = previous,
                        _ => break,
                    }
                }
                cycle.reverse();
                return Some(cycle);
            }
            if let Entry::Vacant(slot) = parent.entry(dep) {
                slot.insert(node);
                queue.push_back(dep);
            }
        }
    }

    None
}

/// Dependencies `id` still waits on. Only pending slots have any.
fn unmet<T>(slots: &[Slot<T>], id: usize) -> &[SubscriberId] {
    match &slots[id].state {
        SlotState::Pending(entry) => &entry.unmet,
        _ => &[],
    }
}
