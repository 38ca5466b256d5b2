//! # Worker Lifecycle
//!
//! - [`BackgroundWorker`]: start a body under a linked cancellation token,
//!   stop it and wait for it to finish
//! - [`Completion`] / [`CompletionSignal`]: one-shot "end of work"
//!   notification that fires exactly once

mod completion;
mod lifecycle;

pub use completion::{Completion, CompletionSignal};
pub use lifecycle::BackgroundWorker;
