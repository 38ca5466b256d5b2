//! Thread-safe FIFO hand-off queue.

use parking_lot::Mutex;
use std::collections::VecDeque;

use super::Buffer;
use crate::domain::BufferError;

/// Unbounded FIFO queue.
///
/// Push never rejects. Under concurrent producers and consumers the only
/// guarantee is that every pushed value is pulled exactly once.
#[derive(Debug)]
pub struct FifoBuffer<T> {
    queue: Mutex<VecDeque<T>>,
}

impl<T> FifoBuffer<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    /// Number of values waiting to be pulled.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl<T> Default for FifoBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> Buffer<T> for FifoBuffer<T> {
    fn push(&self, value: T) -> Result<(), BufferError> {
        self.queue.lock().push_back(value);
        Ok(())
    }

    fn try_pull(&self) -> Option<T> {
        self.queue.lock().pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_pull_returns_earliest_pushed() {
        let buffer = FifoBuffer::new();
        buffer.push(3).unwrap();
        buffer.push(1).unwrap();
        buffer.push(2).unwrap();

        assert_eq!(buffer.try_pull(), Some(3));
        assert_eq!(buffer.try_pull(), Some(1));
        assert_eq!(buffer.try_pull(), Some(2));
    }

    #[test]
    fn test_pull_on_empty_reports_not_found() {
        let buffer: FifoBuffer<i64> = FifoBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.try_pull(), None);
    }

    #[test]
    fn test_concurrent_push_pull_delivers_each_value_once() {
        const PRODUCERS: i64 = 4;
        const PER_PRODUCER: i64 = 2_500;
        let total = (PRODUCERS * PER_PRODUCER) as usize;

        let buffer = Arc::new(FifoBuffer::new());
        let pulled = Arc::new(parking_lot::Mutex::new(Vec::with_capacity(total)));
        let pulled_count = Arc::new(AtomicUsize::new(0));

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let buffer = Arc::clone(&buffer);
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        buffer.push(p * PER_PRODUCER + i).unwrap();
                    }
                })
            })
            .collect();

        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let buffer = Arc::clone(&buffer);
                let pulled = Arc::clone(&pulled);
                let pulled_count = Arc::clone(&pulled_count);
                thread::spawn(move || {
                    while pulled_count.load(Ordering::SeqCst) < total {
                        if let Some(value) = buffer.try_pull() {
                            pulled.lock().push(value);
                            pulled_count.fetch_add(1, Ordering::SeqCst);
                        } else {
                            thread::yield_now();
                        }
                    }
                })
            })
            .collect();

        for handle in producers.into_iter().chain(consumers) {
            handle.join().unwrap();
        }

        let pulled = pulled.lock();
        assert_eq!(pulled.len(), total);
        let unique: HashSet<_> = pulled.iter().copied().collect();
        assert_eq!(unique.len(), total);
        assert!(buffer.is_empty());
    }
}
