//! Pull-only generator of consecutive values.

use std::sync::atomic::{AtomicI64, Ordering};

use super::Buffer;
use crate::domain::{BufferError, NumericValue};

/// Generates `1, 2, 3, …` for whoever pulls.
///
/// Concurrent pullers together receive consecutive values with no repeats and
/// no gaps. Pushing is a wiring mistake and is rejected.
#[derive(Debug)]
pub struct SequenceBuffer {
    last: AtomicI64,
    limit: Option<NumericValue>,
}

impl SequenceBuffer {
    /// Unbounded generator; `try_pull` always yields a value.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
            limit: None,
        }
    }

    /// Generator that stops after `limit`; further pulls report not-found.
    #[must_use]
    pub fn with_limit(limit: NumericValue) -> Self {
        Self {
            last: AtomicI64::new(0),
            limit: Some(limit),
        }
    }

    /// Largest value handed out so far (0 before the first pull).
    pub fn issued(&self) -> NumericValue {
        self.last.load(Ordering::SeqCst)
    }

    pub fn limit(&self) -> Option<NumericValue> {
        self.limit
    }
}

impl Default for SequenceBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buffer<NumericValue> for SequenceBuffer {
    fn push(&self, _value: NumericValue) -> Result<(), BufferError> {
        Err(BufferError::PushRejected {
            buffer: "SequenceBuffer",
        })
    }

    fn try_pull(&self) -> Option<NumericValue> {
        match self.limit {
            None => Some(self.last.fetch_add(1, Ordering::SeqCst) + 1),
            Some(limit) => self
                .last
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                    (n < limit).then_some(n + 1)
                })
                .ok()
                .map(|previous| previous + 1),
        }
    }
}
