//! The declarative matcher every [`crate::rule::Rule`] is built on.
//!
//! A full term-rewriting pattern language isn't needed here: the closed set
//! of ten plan-node variants and the handful of rules in this crate only
//! ever need (a) a tag test selecting one variant, and (b) structural
//! predicates refining it further. `Pattern<T>` captures exactly that: `T`
//! is the owned, cloned shape the rule wants to work with (e.g. `Apply`),
//! and matching binds it whole rather than through a string-keyed capture
//! map — the struct's own fields *are* the captures.

use std::rc::Rc;

use crate::plan_node::PlanNode;

type Extractor<T> = Rc<dyn Fn(&PlanNode) -> Option<T>>;
type Predicate<T> = Rc<dyn Fn(&T) -> bool>;

#[derive(Clone)]
pub struct Pattern<T> {
    extract: Extractor<T>,
    predicates: Vec<Predicate<T>>,
}

impl<T: Clone + 'static> Pattern<T> {
    /// A pattern that matches whenever `extract` returns `Some`, e.g.
    /// `Pattern::new(|node| match node { PlanNode::Apply(a) => Some(a.clone()), _ => None })`.
    pub fn new(extract: impl Fn(&PlanNode) -> Option<T> + 'static) -> Self {
        Pattern {
            extract: Rc::new(extract),
            predicates: Vec::new(),
        }
    }

    /// Narrow the pattern with a structural predicate over the captured
    /// value. All predicates must hold for the match to succeed.
    pub fn matching(mut self, predicate: impl Fn(&T) -> bool + 'static) -> Self {
        self.predicates.push(Rc::new(predicate));
        self
    }

    pub fn try_match(&self, node: &PlanNode) -> Option<T> {
        let captured = (self.extract)(node)?;
        if self.predicates.iter().all(|p| p(&captured)) {
            Some(captured)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Assignments;
    use crate::id::PlanNodeId;
    use crate::plan_node::{Project, SetOperation};

    fn leaf() -> crate::plan_node::PlanRef {
        SetOperation::new(PlanNodeId(0), vec![], vec![]).into_union()
    }

    #[test]
    fn matches_tag_and_predicate() {
        let pattern = Pattern::<Project>::new(|node| match node {
            PlanNode::Project(p) => Some(p.clone()),
            _ => None,
        })
        .matching(|p| p.assignments.is_empty());

        let empty_project = Project::new(PlanNodeId(1), leaf(), Assignments::identity(vec![]));
        assert!(pattern.try_match(&PlanNode::Project(empty_project)).is_some());

        let non_empty = Project::new(
            PlanNodeId(2),
            leaf(),
            Assignments::identity(vec![crate::variable::Variable::new(
                "x",
                crate::types::Type::BigInt,
            )]),
        );
        assert!(pattern.try_match(&PlanNode::Project(non_empty)).is_none());
    }

    #[test]
    fn wrong_variant_never_matches() {
        let pattern = Pattern::<Project>::new(|node| match node {
            PlanNode::Project(p) => Some(p.clone()),
            _ => None,
        });
        assert!(pattern.try_match(&*leaf()).is_none());
    }
}
