//! Cross-role scenarios.

mod round_trip;
mod routing;
