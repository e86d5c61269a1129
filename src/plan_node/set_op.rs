use super::{PlanBase, PlanNode, PlanRef};
use crate::id::PlanNodeId;
use crate::variable::Variable;

/// The shared shape of `Union`, `Intersect` and `Except`: each reads `n`
/// sources and maps one variable per source position to a single output
/// variable. Which one of the three relational operators this is lives
/// purely in which `PlanNode` variant wraps it — the struct itself doesn't
/// need to know.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetOperation {
    pub base: PlanBase,
    pub sources: Vec<PlanRef>,
    /// One entry per output variable; the `Vec<Variable>` gives, in source
    /// order, which variable of each source feeds that output column.
    pub mapping: Vec<(Variable, Vec<Variable>)>,
}

impl SetOperation {
    pub fn new(id: PlanNodeId, sources: Vec<PlanRef>, mapping: Vec<(Variable, Vec<Variable>)>) -> Self {
        let outputs = mapping.iter().map(|(v, _)| v.clone()).collect();
        SetOperation {
            base: PlanBase::new(id, outputs),
            sources,
            mapping,
        }
    }

    pub fn into_union(self) -> PlanRef {
        PlanRef::from(PlanNode::Union(self))
    }

    pub fn into_intersect(self) -> PlanRef {
        PlanRef::from(PlanNode::Intersect(self))
    }

    pub fn into_except(self) -> PlanRef {
        PlanRef::from(PlanNode::Except(self))
    }
}
