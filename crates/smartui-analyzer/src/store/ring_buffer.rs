//! Fixed-capacity FIFO buffer

use std::collections::VecDeque;

/// Ring buffer that evicts its oldest element on overflow
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create a buffer holding at most `capacity` items (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Append an item, returning the evicted oldest item if full
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }
}

impl<T: Clone> RingBuffer<T> {
    /// The newest `n` items, oldest first
    pub fn tail(&self, n: usize) -> Vec<T> {
        let skip = self.items.len().saturating_sub(n);
        self.items.iter().skip(skip).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_overflow_keeps_most_recent() {
        let mut buffer = RingBuffer::new(1000);
        for i in 0..1500 {
            buffer.push(i);
        }

        assert_eq!(buffer.len(), 1000);
        let items: Vec<_> = buffer.iter().copied().collect();
        assert_eq!(items, (500..1500).collect::<Vec<_>>());
    }

    #[test]
    fn test_push_returns_evicted() {
        let mut buffer = RingBuffer::new(2);
        assert_eq!(buffer.push("a"), None);
        assert_eq!(buffer.push("b"), None);
        assert_eq!(buffer.push("c"), Some("a"));
        assert_eq!(buffer.last(), Some(&"c"));
    }

    #[test]
    fn test_tail() {
        let mut buffer = RingBuffer::new(5);
        for i in 0..5 {
            buffer.push(i);
        }
        assert_eq!(buffer.tail(2), vec![3, 4]);
        assert_eq!(buffer.tail(10), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut buffer = RingBuffer::new(0);
        buffer.push(1);
        buffer.push(2);
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.tail(1), vec![2]);
    }

    proptest! {
        #[test]
        fn prop_len_bounded_and_suffix_preserved(capacity in 1usize..64, extra in 0usize..200) {
            let mut buffer = RingBuffer::new(capacity);
            let total = capacity + extra;
            for i in 0..total {
                buffer.push(i);
                prop_assert!(buffer.len() <= capacity);
            }
            let items: Vec<_> = buffer.iter().copied().collect();
            prop_assert_eq!(items, (total - capacity..total).collect::<Vec<_>>());
        }
    }
}
