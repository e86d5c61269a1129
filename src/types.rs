//! The closed set of types the plan layer understands.
//!
//! Expressions are otherwise opaque to this crate; we only need to tell
//! `BIGINT` and `BOOLEAN` apart because the rewriters in this crate
//! synthesize columns of those two types (markers, counts, unique ids).
//! Everything else is carried as [`Type::Other`] and never inspected.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    BigInt,
    Boolean,
    /// A type outside the closed set above, carried for display purposes
    /// only. Never matched on by a rewriter.
    Other(String),
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::BigInt => write!(f, "BIGINT"),
            Type::Boolean => write!(f, "BOOLEAN"),
            Type::Other(name) => write!(f, "{name}"),
        }
    }
}
