//! Errors raised by auth backends.
//!
//! Store actions never surface these to callers: they are logged and folded
//! into an [`ActionResult`](crate::stores::ActionResult).

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("auth backend unavailable: {0}")]
    Unavailable(String),
    #[error("auth request rejected: {0}")]
    Rejected(String),
}
