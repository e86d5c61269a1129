//! Error types raised while rewriting a plan.
//!
//! Rewriters themselves never fail: a [`crate::rule::Rule`] either produces a
//! replacement subtree or declines. The only place an error can surface is the
//! post-condition verifier (see [`crate::verify`]), which distinguishes a
//! user-facing "your query isn't supported" condition from a bug in the
//! rewrite passes that ran before it.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    /// A correlated subquery reached the verifier without having been
    /// rewritten away. `message` is the offending node's
    /// `origin_subquery_error` template with the standard suffix applied.
    #[error("{0}")]
    UnsupportedCorrelatedSubquery(String),

    /// An invariant that earlier passes are supposed to guarantee did not
    /// hold. This is a programming error, not something a user query can
    /// trigger.
    #[error("internal consistency violation: {0}")]
    InternalConsistency(String),

    /// Planning was cancelled between rewrite passes. No finalization is
    /// needed: plan nodes are immutable values, so every allocation made so
    /// far is simply discarded along with this error.
    #[error("query planning was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, RewriteError>;
