//! Per-subscriber FIFO queues for one channel.

use std::collections::{HashMap, VecDeque};

/// One queue per subscriber name. A queue may exist before its owner
/// subscribes and keeps collecting payloads until it is drained.
pub(crate) struct Buffers<E> {
    queues: HashMap<String, VecDeque<E>>,
}

impl<E> Default for Buffers<E> {
    fn default() -> Self {
        Self {
            queues: HashMap::new(),
        }
    }
}

impl<E> Buffers<E> {
    /// Creates an empty queue for `name` unless one exists.
    pub(crate) fn ensure(&mut self, name: &str) {
        if !self.queues.contains_key(name) {
            self.queues.insert(name.to_string(), VecDeque::new());
        }
    }

    /// Takes every queued payload for `name`, leaving the queue empty but in
    /// place.
    pub(crate) fn take(&mut self, name: &str) -> VecDeque<E> {
        self.queues
            .get_mut(name)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    pub(crate) fn queued(&self, name: &str) -> usize {
        self.queues.get(name).map_or(0, VecDeque::len)
    }

    pub(crate) fn len(&self) -> usize {
        self.queues.len()
    }
}

impl<E: Clone> Buffers<E> {
    /// Appends `event` to every queue. Returns how many queues received it.
    pub(crate) fn push_all(&mut self, event: E) -> usize {
        let reached = self.queues.len();
        let mut queues = self.queues.values_mut();
        let Some(first) = queues.next() else {
            return 0;
        };
        for queue in queues {
            queue.push_back(event.clone());
        }
        first.push_back(event);
        reached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_reaches_every_queue() {
        let mut buffers = Buffers::default();
        buffers.ensure("a");
        buffers.ensure("b");
        buffers.ensure("a");
        assert_eq!(buffers.len(), 2);

        assert_eq!(buffers.push_all(1), 2);
        assert_eq!(buffers.push_all(2), 2);
        assert_eq!(buffers.queued("a"), 2);
        assert_eq!(buffers.queued("missing"), 0);

        let taken: Vec<i32> = buffers.take("a").into_iter().collect();
        assert_eq!(taken, vec![1, 2]);
        assert_eq!(buffers.queued("a"), 0);
        assert_eq!(buffers.queued("b"), 2);
        assert_eq!(buffers.len(), 2);
    }

    #[test]
    fn test_take_missing_is_empty() {
        let mut buffers: Buffers<u8> = Buffers::default();
        assert!(buffers.take("nobody").is_empty());
        assert_eq!(buffers.len(), 0);
    }
}
