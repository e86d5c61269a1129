//! Pulling correlation out of a subplan.

use crate::expr::Expression;
use crate::id::PlanNodeIdAllocator;
use crate::lookup::Lookup;
use crate::plan_node::{PlanNode, PlanRef, Project};
use crate::variable::Variable;

/// The result of successfully decorrelating a subplan: a core that no
/// longer references the outer query, plus the predicates that had to be
/// lifted out of it to make that true.
pub struct Decorrelated {
    pub decorrelated_node: PlanRef,
    pub correlated_predicates: Vec<Expression>,
}

/// Attempt to decorrelate `subquery` with respect to the outer-scope
/// variables in `correlation`. Replacement nodes built here always get a
/// fresh id rather than reusing the node they stood in for.
pub fn decorrelate(
    subquery: &PlanRef,
    correlation: &[Variable],
    lookup: &dyn Lookup,
    id_allocator: &PlanNodeIdAllocator,
) -> Option<Decorrelated> {
    let resolved = lookup.resolve(subquery);
    match &*resolved {
        PlanNode::Project(project) => {
            if is_shallow_correlated(&resolved, correlation) {
                return None;
            }
            let inner = decorrelate(&project.source, correlation, lookup, id_allocator)?;
            let mut assignments = project.assignments.clone();
            let extra_vars: Vec<Variable> = inner
                .correlated_predicates
                .iter()
                .flat_map(Expression::symbols)
                .filter(|v| !correlation.contains(v))
                .collect();
            assignments.extend_with_identities(extra_vars);
            let new_project = Project::new(id_allocator.next_id(), inner.decorrelated_node, assignments);
            Some(Decorrelated {
                decorrelated_node: new_project.into(),
                correlated_predicates: inner.correlated_predicates,
            })
        }
        PlanNode::Filter(filter) => {
            let inner = decorrelate(&filter.source, correlation, lookup, id_allocator)?;
            let mut correlated_predicates = inner.correlated_predicates;
            correlated_predicates.push(filter.predicate.clone());
            Some(Decorrelated {
                decorrelated_node: inner.decorrelated_node,
                correlated_predicates,
            })
        }
        _ => {
            if is_recursive_correlated(&resolved, correlation, lookup) {
                None
            } else {
                Some(Decorrelated {
                    decorrelated_node: subquery.clone(),
                    correlated_predicates: Vec::new(),
                })
            }
        }
    }
}

/// `true` iff `node`'s own expressions (not its children's) reference any
/// variable in `correlation`.
fn is_shallow_correlated(node: &PlanNode, correlation: &[Variable]) -> bool {
    node.own_expressions()
        .iter()
        .any(|expr| expr.references_any(correlation))
}

/// `true` iff `node` is shallow-correlated, or any child resolved through
/// `lookup` is recursively correlated.
fn is_recursive_correlated(node: &PlanNode, correlation: &[Variable], lookup: &dyn Lookup) -> bool {
    if is_shallow_correlated(node, correlation) {
        return true;
    }
    node.children().iter().any(|child| {
        let resolved_child = lookup.resolve(child);
        is_recursive_correlated(&resolved_child, correlation, lookup)
    })
}
