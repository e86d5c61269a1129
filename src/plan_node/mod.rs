//! The plan tree data model.
//!
//! Plan nodes are immutable values arranged in a rooted DAG; "mutating" a
//! node means building a new one that shares its unchanged children by
//! cloning the `Rc`. There are no parent pointers: rewrites work top-down
//! with captured context, never by walking back up the tree.
//!
//! Unlike a full optimizer's plan node model (trait objects registered
//! through a macro, one struct per physical/logical/streaming convention),
//! this crate only ever has one convention and a fixed, closed set of ten
//! variants, so a plain sum type is the right shape: a `match` on
//! `PlanNode` is exhaustive and the compiler tells us when a new variant
//! needs handling everywhere, instead of us having to remember to register
//! it in half a dozen macros.

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use smallvec::{smallvec, SmallVec};

use crate::expr::{Assignments, Expression};
use crate::id::PlanNodeId;
use crate::variable::Variable;

mod aggregation;
mod join;
mod set_op;

pub use aggregation::{AggregationCall, AggregationStep};
pub use join::JoinKind;
pub use set_op::SetOperation;

/// Fields every plan node carries regardless of variant. Per the module
/// convention: every field is set once at construction time, so a node's
/// derived properties (here, its output schema) can never drift out of
/// sync with its content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanBase {
    pub id: PlanNodeId,
    pub outputs: Vec<Variable>,
}

impl PlanBase {
    pub fn new(id: PlanNodeId, outputs: Vec<Variable>) -> Self {
        PlanBase { id, outputs }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Project {
    pub base: PlanBase,
    pub source: PlanRef,
    pub assignments: Assignments,
}

impl Project {
    pub fn new(id: PlanNodeId, source: PlanRef, assignments: Assignments) -> Self {
        let outputs = assignments.keys().cloned().collect();
        Project {
            base: PlanBase::new(id, outputs),
            source,
            assignments,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    pub base: PlanBase,
    pub source: PlanRef,
    pub predicate: Expression,
}

impl Filter {
    pub fn new(id: PlanNodeId, source: PlanRef, predicate: Expression) -> Self {
        let outputs = source.outputs().to_vec();
        Filter {
            base: PlanBase::new(id, outputs),
            source,
            predicate,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Aggregation {
    pub base: PlanBase,
    pub source: PlanRef,
    pub aggregations: Vec<(Variable, AggregationCall)>,
    pub grouping_set: Vec<Variable>,
    pub step: AggregationStep,
    pub hash_var: Option<Variable>,
    pub group_id_var: Option<Variable>,
}

impl Aggregation {
    pub fn new(
        id: PlanNodeId,
        source: PlanRef,
        aggregations: Vec<(Variable, AggregationCall)>,
        grouping_set: Vec<Variable>,
    ) -> Self {
        let outputs = grouping_set
            .iter()
            .cloned()
            .chain(aggregations.iter().map(|(v, _)| v.clone()))
            .collect();
        Aggregation {
            base: PlanBase::new(id, outputs),
            source,
            aggregations,
            grouping_set,
            step: AggregationStep::Single,
            hash_var: None,
            group_id_var: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Join {
    pub base: PlanBase,
    pub kind: JoinKind,
    pub left: PlanRef,
    pub right: PlanRef,
    pub criteria: Vec<(Variable, Variable)>,
    pub filter: Option<Expression>,
}

impl Join {
    pub fn new(
        id: PlanNodeId,
        kind: JoinKind,
        left: PlanRef,
        right: PlanRef,
        criteria: Vec<(Variable, Variable)>,
        outputs: Vec<Variable>,
        filter: Option<Expression>,
    ) -> Self {
        Join {
            base: PlanBase::new(id, outputs),
            kind,
            left,
            right,
            criteria,
            filter,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssignUniqueId {
    pub base: PlanBase,
    pub source: PlanRef,
    pub id_var: Variable,
}

impl AssignUniqueId {
    pub fn new(id: PlanNodeId, source: PlanRef, id_var: Variable) -> Self {
        let outputs = source
            .outputs()
            .iter()
            .cloned()
            .chain(std::iter::once(id_var.clone()))
            .collect();
        AssignUniqueId {
            base: PlanBase::new(id, outputs),
            source,
            id_var,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Apply {
    pub base: PlanBase,
    pub input: PlanRef,
    pub subquery: PlanRef,
    pub subquery_assignments: Assignments,
    pub correlation: Vec<Variable>,
    pub origin_subquery_error: String,
}

impl Apply {
    pub fn new(
        id: PlanNodeId,
        input: PlanRef,
        subquery: PlanRef,
        subquery_assignments: Assignments,
        correlation: Vec<Variable>,
        origin_subquery_error: String,
    ) -> Self {
        let outputs = input
            .outputs()
            .iter()
            .cloned()
            .chain(subquery_assignments.keys().cloned())
            .collect();
        Apply {
            base: PlanBase::new(id, outputs),
            input,
            subquery,
            subquery_assignments,
            correlation,
            origin_subquery_error,
        }
    }

    pub fn is_correlated(&self) -> bool {
        !self.correlation.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LateralJoin {
    pub base: PlanBase,
    pub input: PlanRef,
    pub subquery: PlanRef,
    pub correlation: Vec<Variable>,
    pub origin_subquery_error: String,
}

impl LateralJoin {
    pub fn new(
        id: PlanNodeId,
        input: PlanRef,
        subquery: PlanRef,
        correlation: Vec<Variable>,
        origin_subquery_error: String,
    ) -> Self {
        let outputs = input
            .outputs()
            .iter()
            .cloned()
            .chain(subquery.outputs().iter().cloned())
            .collect();
        LateralJoin {
            base: PlanBase::new(id, outputs),
            input,
            subquery,
            correlation,
            origin_subquery_error,
        }
    }

    pub fn is_correlated(&self) -> bool {
        !self.correlation.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlanNode {
    Project(Project),
    Filter(Filter),
    Aggregation(Aggregation),
    Union(SetOperation),
    Intersect(SetOperation),
    Except(SetOperation),
    Join(Join),
    AssignUniqueId(AssignUniqueId),
    Apply(Apply),
    LateralJoin(LateralJoin),
}

impl PlanNode {
    pub fn base(&self) -> &PlanBase {
        match self {
            PlanNode::Project(n) => &n.base,
            PlanNode::Filter(n) => &n.base,
            PlanNode::Aggregation(n) => &n.base,
            PlanNode::Union(n) | PlanNode::Intersect(n) | PlanNode::Except(n) => &n.base,
            PlanNode::Join(n) => &n.base,
            PlanNode::AssignUniqueId(n) => &n.base,
            PlanNode::Apply(n) => &n.base,
            PlanNode::LateralJoin(n) => &n.base,
        }
    }

    pub fn id(&self) -> PlanNodeId {
        self.base().id
    }

    pub fn outputs(&self) -> &[Variable] {
        &self.base().outputs
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlanNode::Project(_) => "Project",
            PlanNode::Filter(_) => "Filter",
            PlanNode::Aggregation(_) => "Aggregation",
            PlanNode::Union(_) => "Union",
            PlanNode::Intersect(_) => "Intersect",
            PlanNode::Except(_) => "Except",
            PlanNode::Join(_) => "Join",
            PlanNode::AssignUniqueId(_) => "AssignUniqueId",
            PlanNode::Apply(_) => "Apply",
            PlanNode::LateralJoin(_) => "LateralJoin",
        }
    }

    /// Expressions owned directly by this node (not by its children). Used
    /// by the decorrelator's shallow-correlation test.
    pub fn own_expressions(&self) -> Vec<&Expression> {
        match self {
            PlanNode::Project(n) => n.assignments.iter().map(|(_, e)| e).collect(),
            PlanNode::Filter(n) => vec![&n.predicate],
            PlanNode::Aggregation(n) => n
                .aggregations
                .iter()
                .flat_map(|(_, call)| call.arguments.iter().chain(call.filter.iter()))
                .collect(),
            PlanNode::Union(n) | PlanNode::Intersect(n) | PlanNode::Except(n) => {
                let _ = n;
                vec![]
            }
            PlanNode::Join(n) => n.filter.iter().collect(),
            PlanNode::AssignUniqueId(_) => vec![],
            PlanNode::Apply(n) => n.subquery_assignments.iter().map(|(_, e)| e).collect(),
            PlanNode::LateralJoin(_) => vec![],
        }
    }

    pub fn children(&self) -> SmallVec<[PlanRef; 2]> {
        match self {
            PlanNode::Project(n) => smallvec![n.source.clone()],
            PlanNode::Filter(n) => smallvec![n.source.clone()],
            PlanNode::Aggregation(n) => smallvec![n.source.clone()],
            PlanNode::Union(n) | PlanNode::Intersect(n) | PlanNode::Except(n) => {
                n.sources.iter().cloned().collect()
            }
            PlanNode::Join(n) => smallvec![n.left.clone(), n.right.clone()],
            PlanNode::AssignUniqueId(n) => smallvec![n.source.clone()],
            PlanNode::Apply(n) => smallvec![n.input.clone(), n.subquery.clone()],
            PlanNode::LateralJoin(n) => smallvec![n.input.clone(), n.subquery.clone()],
        }
    }

    /// Rebuild this node with `children` substituted for its current
    /// sources, keeping this node's own id and its own expressions
    /// untouched. Used by the rewrite driver to thread rewritten subtrees
    /// back up without otherwise touching the node above them.
    pub fn with_children(&self, children: &[PlanRef]) -> PlanNode {
        match self {
            PlanNode::Project(n) => {
                assert_eq!(children.len(), 1);
                PlanNode::Project(Project::new(
                    n.base.id,
                    children[0].clone(),
                    n.assignments.clone(),
                ))
            }
            PlanNode::Filter(n) => {
                assert_eq!(children.len(), 1);
                PlanNode::Filter(Filter::new(
                    n.base.id,
                    children[0].clone(),
                    n.predicate.clone(),
                ))
            }
            PlanNode::Aggregation(n) => {
                assert_eq!(children.len(), 1);
                let mut new_node = Aggregation::new(
                    n.base.id,
                    children[0].clone(),
                    n.aggregations.clone(),
                    n.grouping_set.clone(),
                );
                new_node.step = n.step;
                new_node.hash_var = n.hash_var.clone();
                new_node.group_id_var = n.group_id_var.clone();
                PlanNode::Aggregation(new_node)
            }
            PlanNode::Union(n) => {
                PlanNode::Union(SetOperation::new(n.base.id, children.to_vec(), n.mapping.clone()))
            }
            PlanNode::Intersect(n) => PlanNode::Intersect(SetOperation::new(
                n.base.id,
                children.to_vec(),
                n.mapping.clone(),
            )),
            PlanNode::Except(n) => {
                PlanNode::Except(SetOperation::new(n.base.id, children.to_vec(), n.mapping.clone()))
            }
            PlanNode::Join(n) => {
                assert_eq!(children.len(), 2);
                PlanNode::Join(Join::new(
                    n.base.id,
                    n.kind,
                    children[0].clone(),
                    children[1].clone(),
                    n.criteria.clone(),
                    n.base.outputs.clone(),
                    n.filter.clone(),
                ))
            }
            PlanNode::AssignUniqueId(n) => {
                assert_eq!(children.len(), 1);
                PlanNode::AssignUniqueId(AssignUniqueId::new(
                    n.base.id,
                    children[0].clone(),
                    n.id_var.clone(),
                ))
            }
            PlanNode::Apply(n) => {
                assert_eq!(children.len(), 2);
                PlanNode::Apply(Apply::new(
                    n.base.id,
                    children[0].clone(),
                    children[1].clone(),
                    n.subquery_assignments.clone(),
                    n.correlation.clone(),
                    n.origin_subquery_error.clone(),
                ))
            }
            PlanNode::LateralJoin(n) => {
                assert_eq!(children.len(), 2);
                PlanNode::LateralJoin(LateralJoin::new(
                    n.base.id,
                    children[0].clone(),
                    children[1].clone(),
                    n.correlation.clone(),
                    n.origin_subquery_error.clone(),
                ))
            }
        }
    }
}

impl fmt::Display for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{} [{}]",
            self.name(),
            self.id(),
            self.outputs()
                .iter()
                .map(|v| v.name())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

/// A reference-counted handle to an immutable plan node. Cloning a
/// `PlanRef` is an `Rc::clone`, not a deep copy: sharing unchanged
/// substructure across a rewrite is exactly the point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanRef(Rc<PlanNode>);

impl Deref for PlanRef {
    type Target = PlanNode;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for PlanRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl From<PlanNode> for PlanRef {
    fn from(value: PlanNode) -> Self {
        PlanRef(Rc::new(value))
    }
}

macro_rules! impl_into_plan_ref {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for PlanNode {
                fn from(value: $ty) -> Self {
                    PlanNode::$ty(value)
                }
            }

            impl From<$ty> for PlanRef {
                fn from(value: $ty) -> Self {
                    PlanRef::from(PlanNode::$ty(value))
                }
            }
        )*
    };
}

impl_into_plan_ref!(Project, Filter, Aggregation, Join, AssignUniqueId, Apply, LateralJoin);

impl PlanRef {
    pub fn explain_to_string(&self) -> String {
        let mut out = String::new();
        self.explain_into(&mut out, 0);
        out
    }

    fn explain_into(&self, out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&self.to_string());
        out.push('\n');
        for child in self.children() {
            child.explain_into(out, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionHandle;
    use crate::types::Type;

    fn var(name: &str, ty: Type) -> Variable {
        Variable::new(name, ty)
    }

    /// A source with no children at all, just so tests have something to
    /// build on top of.
    fn leaf() -> PlanRef {
        SetOperation::new(PlanNodeId(0), vec![], vec![]).into_union()
    }

    #[test]
    fn project_outputs_follow_assignment_order() {
        let a = var("a", Type::BigInt);
        let b = var("b", Type::Boolean);
        let assignments = Assignments::new(vec![
            (b.clone(), Expression::sym(b.clone())),
            (a.clone(), Expression::sym(a.clone())),
        ]);
        let project = Project::new(PlanNodeId(1), leaf(), assignments);
        assert_eq!(project.base.outputs, vec![b, a]);
    }

    #[test]
    fn assign_unique_id_appends_id_column() {
        let rid = var("rid", Type::BigInt);
        let node = AssignUniqueId::new(PlanNodeId(1), leaf(), rid.clone());
        assert_eq!(node.base.outputs, vec![rid]);
    }

    #[test]
    fn with_children_keeps_id_and_expressions() {
        let count = FunctionHandle::new("count");
        let agg = Aggregation::new(
            PlanNodeId(1),
            leaf(),
            vec![(var("c", Type::BigInt), AggregationCall::new(count, vec![]))],
            vec![],
        );
        let agg_ref: PlanRef = agg.clone().into();
        let rebuilt = agg_ref.with_children(&[leaf()]);
        match rebuilt {
            PlanNode::Aggregation(rebuilt_agg) => {
                assert_eq!(rebuilt_agg.base.id, agg.base.id);
                assert_eq!(rebuilt_agg.aggregations, agg.aggregations);
            }
            _ => panic!("expected Aggregation"),
        }
    }

    #[test]
    fn explain_renders_nested_shape() {
        let rid = var("rid", Type::BigInt);
        let node: PlanRef = AssignUniqueId::new(PlanNodeId(1), leaf(), rid).into();
        let text = node.explain_to_string();
        pretty_assertions::assert_eq!(text, "AssignUniqueId#1 [rid]\n  Union#0 []\n");
    }
}
