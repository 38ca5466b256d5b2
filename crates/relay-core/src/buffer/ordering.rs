//! Reordering window that persists values in ascending order.
//!
//! Values arrive out of order because they travel over independent
//! connections. The buffer keeps a working set of up to `threshold - 1`
//! values; once a push brings the set to `threshold`, the minimum is taken out
//! and appended to the output file. [`OrderingOutputBuffer::flush`] drains the
//! remainder in ascending order and is meant to run once, after every producer
//! has stopped.
//!
//! A value that arrives after a larger one was already written is still
//! written when it is evicted, so it lands out of order in the file. The
//! window size trades memory against how late a value may arrive.

use parking_lot::Mutex;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Ordering output buffer bound to one file.
#[derive(Debug)]
pub struct OrderingOutputBuffer<T> {
    path: PathBuf,
    threshold: usize,
    state: Mutex<WorkingSet<T>>,
}

#[derive(Debug)]
struct WorkingSet<T> {
    pending: BinaryHeap<Reverse<T>>,
    pushed: u64,
    written: u64,
}

impl<T: Ord + Display> OrderingOutputBuffer<T> {
    /// Create a buffer writing to `path`.
    ///
    /// A `threshold` of 0 behaves like 1: every push is written immediately.
    pub fn new(path: impl Into<PathBuf>, threshold: usize) -> Self {
        Self {
            path: path.into(),
            threshold: threshold.max(1),
            state: Mutex::new(WorkingSet {
                pending: BinaryHeap::new(),
                pushed: 0,
                written: 0,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Values waiting in the working set.
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Total values pushed since creation.
    pub fn pushed(&self) -> u64 {
        self.state.lock().pushed
    }

    /// Total values appended to the file since creation.
    pub fn written(&self) -> u64 {
        self.state.lock().written
    }

    /// Add a value; write the minimum if the window is full.
    ///
    /// The lock covers both taking the minimum and writing it, so concurrent
    /// pushers never interleave lines or write out of order.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file could not be appended to. The value
    /// that was about to be written stays in the working set.
    pub fn push(&self, value: T) -> io::Result<()> {
        let mut state = self.state.lock();
        state.pending.push(Reverse(value));
        state.pushed += 1;

        if state.pending.len() < self.threshold {
            return Ok(());
        }

        let Some(Reverse(min)) = state.pending.pop() else {
            return Ok(());
        };
        match append_lines(&self.path, std::slice::from_ref(&min)) {
            Ok(()) => {
                state.written += 1;
                Ok(())
            }
            Err(e) => {
                state.pending.push(Reverse(min));
                Err(e)
            }
        }
    }

    /// Drain the whole working set to the file in ascending order.
    ///
    /// Returns the number of values written. The file is created even when the
    /// working set is empty.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file could not be appended to; the drained
    /// values are put back.
    pub fn flush(&self) -> io::Result<usize> {
        let mut state = self.state.lock();
        let mut drained = Vec::with_capacity(state.pending.len());
        while let Some(Reverse(value)) = state.pending.pop() {
            drained.push(value);
        }

        match append_lines(&self.path, &drained) {
            Ok(()) => {
                state.written += drained.len() as u64;
                Ok(drained.len())
            }
            Err(e) => {
                state.pending.extend(drained.into_iter().map(Reverse));
                Err(e)
            }
        }
    }
}

/// Append one decimal line per value. The file is opened per call.
fn append_lines<T: Display>(path: &Path, values: &[T]) -> io::Result<()> {
    let mut text = String::with_capacity(values.len() * 8);
    for value in values {
        text.push_str(&value.to_string());
        text.push('\n');
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(text.as_bytes())
}
