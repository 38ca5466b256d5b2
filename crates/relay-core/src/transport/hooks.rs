//! Extension points called by the handlers for every value.

use std::sync::Arc;

use tracing::error;

use crate::buffer::OrderingOutputBuffer;
use crate::domain::NumericValue;

/// Called with each value: after a receive, or before a send.
pub type ValueHook = Arc<dyn Fn(NumericValue) + Send + Sync>;

/// Hook that records every value into an ordering output buffer.
///
/// Write failures are logged and the value stays in the buffer's working set;
/// the handler keeps running.
pub fn record_into(output: Arc<OrderingOutputBuffer<NumericValue>>) -> ValueHook {
    Arc::new(move |value| {
        if let Err(e) = output.push(value) {
            error!(path = %output.path().display(), error = %e, "Failed to record value");
        }
    })
}
