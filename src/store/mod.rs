//! Snapshot-based state containers.
//!
//! A [`Store`] owns one state value and pushes a snapshot of it to every
//! subscriber after each change.

mod store;

pub use store::{Store, SubscriptionId};
