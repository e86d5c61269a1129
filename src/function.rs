//! A read-only handle onto the function catalog.
//!
//! The real catalog (name resolution, overload selection, signature
//! checking) lives in the analyzer, upstream of this crate. Rewriters only
//! ever need two things from it: a handle for `count`, and a way to
//! recognize one when an existing aggregation already uses it.

use std::fmt;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionHandle(Rc<str>);

impl FunctionHandle {
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        FunctionHandle(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FunctionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read-only: the same instance is shared by every rule invoked for a given
/// query, and nothing about it changes over the course of a rewrite.
#[derive(Debug, Clone)]
pub struct FunctionResolution {
    count: FunctionHandle,
}

impl Default for FunctionResolution {
    fn default() -> Self {
        FunctionResolution {
            count: FunctionHandle::new("count"),
        }
    }
}

impl FunctionResolution {
    pub fn new() -> Self {
        Self::default()
    }

    /// `count(*)`.
    pub fn count_function(&self) -> FunctionHandle {
        self.count.clone()
    }

    /// `count(arg)` over a single argument of any type; presto-style
    /// `count` is overloaded per argument type but resolves to the same
    /// underlying handle for every type we care about here.
    pub fn count_function_over_arg(&self) -> FunctionHandle {
        self.count.clone()
    }

    pub fn is_count_function(&self, handle: &FunctionHandle) -> bool {
        *handle == self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_its_own_count_handle() {
        let functions = FunctionResolution::new();
        assert!(functions.is_count_function(&functions.count_function()));
        assert!(functions.is_count_function(&functions.count_function_over_arg()));
        assert!(!functions.is_count_function(&FunctionHandle::new("sum")));
    }
}
