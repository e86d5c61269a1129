//! The concrete rewriters, each a [`crate::rule::Rule`] built on the
//! pattern engine, decorrelator and allocators.

mod correlated_in_to_join;
mod intersect_except_as_union;
mod remove_unreferenced_scalar_lateral;
mod simplify_count_over_constant;

pub use correlated_in_to_join::TransformCorrelatedInPredicateToJoin;
pub use intersect_except_as_union::ImplementIntersectAndExceptAsUnion;
pub use remove_unreferenced_scalar_lateral::RemoveUnreferencedScalarLateralNodes;
pub use simplify_count_over_constant::SimplifyCountOverConstant;
