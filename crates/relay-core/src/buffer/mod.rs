//! # Buffers
//!
//! Hand-off containers between handlers that do not otherwise synchronize.
//!
//! - [`FifoBuffer`]: thread-safe queue, the usual receiver → sender link
//! - [`SequenceBuffer`]: pull-only generator of `1, 2, 3, …`
//! - [`OrderingOutputBuffer`]: bounded reordering window that appends the
//!   current minimum to an output file
//!
//! A buffer is shared by exactly the handlers wired to it. Nothing iterates or
//! inspects a buffer outside `push`/`try_pull`.

mod fifo;
mod ordering;
mod sequence;

pub use fifo::FifoBuffer;
pub use ordering::OrderingOutputBuffer;
pub use sequence::SequenceBuffer;

use crate::domain::BufferError;

/// Port between a producing and a consuming handler.
pub trait Buffer<T>: Send + Sync {
    /// Append a value. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::PushRejected`] for pull-only buffers.
    fn push(&self, value: T) -> Result<(), BufferError>;

    /// Remove and return the next value, or `None` if there is none right
    /// now. Never blocks.
    fn try_pull(&self) -> Option<T>;
}
