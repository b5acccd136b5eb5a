//! Stored-example expansion
//!
//! A stored example is plain JSON in which any object key `k` may carry a
//! sibling annotation `k[]` saying how many values to draw from `k`.
//! Lists are drawn round-robin through a [`CursorRegistry`] held by the
//! caller, so repeated requests walk through the list in order.

mod cursor;
mod errors;
mod expander;

pub use cursor::CursorRegistry;
pub use errors::{ExampleError, ExampleResult};
pub use expander::{ExampleExpander, CHAIN_KEY, MAX_REPEAT, UNWRAP_KEY};
