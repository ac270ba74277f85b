//! Fine-grained reactive primitives.
//!
//! - Signals: reactive cells, optionally split into read and write halves
//! - Memos: cached derived values
//! - Effects: side effects that react to changes

mod effect;
mod memo;
mod signal;

pub use effect::{create_effect, Effect};
pub use memo::{create_memo, Memo};
pub use signal::{create_signal, ReadSignal, Signal, WatchGuard, WriteSignal};
