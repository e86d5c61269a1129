//! `INTERSECT` / `EXCEPT` via marker columns and counting.

use crate::expr::{Assignments, CompareOp, Expression};
use crate::pattern::Pattern;
use crate::plan_node::{Aggregation, AggregationCall, PlanNode, PlanRef, Project, SetOperation};
use crate::rule::{Context, Rule, RuleResult};
use crate::types::Type;
use crate::variable::Variable;

#[derive(Clone)]
pub enum MatchedSetOp {
    Intersect(SetOperation),
    Except(SetOperation),
}

impl MatchedSetOp {
    fn inner(&self) -> &SetOperation {
        match self {
            MatchedSetOp::Intersect(s) | MatchedSetOp::Except(s) => s,
        }
    }

    fn is_except(&self) -> bool {
        matches!(self, MatchedSetOp::Except(_))
    }
}

pub struct ImplementIntersectAndExceptAsUnion {
    pattern: Pattern<MatchedSetOp>,
}

impl Default for ImplementIntersectAndExceptAsUnion {
    fn default() -> Self {
        let pattern = Pattern::new(|node| match node {
            PlanNode::Intersect(s) => Some(MatchedSetOp::Intersect(s.clone())),
            PlanNode::Except(s) => Some(MatchedSetOp::Except(s.clone())),
            _ => None,
        });
        ImplementIntersectAndExceptAsUnion { pattern }
    }
}

impl Rule for ImplementIntersectAndExceptAsUnion {
    type Match = MatchedSetOp;

    fn name(&self) -> &'static str {
        "ImplementIntersectAndExceptAsUnion"
    }

    fn pattern(&self) -> &Pattern<MatchedSetOp> {
        &self.pattern
    }

    fn apply(&self, matched: MatchedSetOp, _node: &PlanRef, ctx: &Context) -> RuleResult {
        let is_except = matched.is_except();
        let op = matched.inner();
        let n = op.sources.len();
        let markers: Vec<Variable> = (0..n)
            .map(|i| ctx.symbol_allocator.new_variable(&format!("m{}", i + 1), Type::Boolean))
            .collect();

        let branches: Vec<PlanRef> = op
            .sources
            .iter()
            .enumerate()
            .map(|(i, source)| {
                let mut assignments = Assignments::identity(source.outputs().to_vec());
                for (j, marker) in markers.iter().enumerate() {
                    let value = if i == j {
                        Expression::BoolLit(true)
                    } else {
                        Expression::NullLit.cast(Type::Boolean)
                    };
                    assignments.push(marker.clone(), value);
                }
                Project::new(ctx.id_allocator.next_id(), source.clone(), assignments).into()
            })
            .collect();

        let mut mapping = op.mapping.clone();
        for marker in &markers {
            mapping.push((marker.clone(), vec![marker.clone(); n]));
        }
        let union: PlanRef = SetOperation::new(ctx.id_allocator.next_id(), branches, mapping).into_union();

        let counts: Vec<Variable> = (0..n)
            .map(|i| ctx.symbol_allocator.new_variable(&format!("c{}", i + 1), Type::BigInt))
            .collect();
        let aggregations: Vec<(Variable, AggregationCall)> = counts
            .iter()
            .zip(&markers)
            .map(|(count_var, marker)| {
                (
                    count_var.clone(),
                    AggregationCall::new(
                        ctx.functions.count_function_over_arg(),
                        vec![Expression::sym(marker.clone())],
                    ),
                )
            })
            .collect();
        let grouping_set = op.base.outputs.clone();
        let aggregation: PlanRef =
            Aggregation::new(ctx.id_allocator.next_id(), union, aggregations, grouping_set).into();

        let at_least_one = |c: &Variable| {
            Expression::compare(CompareOp::Ge, Expression::sym(c.clone()), Expression::LongLit(1))
        };
        let filter_predicate = if is_except {
            let mut terms = vec![at_least_one(&counts[0])];
            terms.extend(counts[1..].iter().map(|c| {
                Expression::compare(CompareOp::Eq, Expression::sym(c.clone()), Expression::LongLit(0))
            }));
            Expression::and(terms)
        } else {
            Expression::and(counts.iter().map(at_least_one))
        };
        let filtered: PlanRef =
            crate::plan_node::Filter::new(ctx.id_allocator.next_id(), aggregation, filter_predicate).into();

        let result: PlanRef = Project::new(
            ctx.id_allocator.next_id(),
            filtered,
            Assignments::identity(op.base.outputs.clone()),
        )
        .into();

        RuleResult::of_plan_node(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{PlanNodeId, PlanNodeIdAllocator};
    use crate::lookup::IdentityLookup;
    use crate::function::FunctionResolution;
    use crate::rule::DynRule;
    use crate::variable::SymbolAllocator;

    fn one_col_source(id: i32, var: Variable) -> PlanRef {
        SetOperation::new(PlanNodeId(id), vec![], vec![(var.clone(), vec![var])]).into_union()
    }

    fn ctx<'a>(
        id_allocator: &'a PlanNodeIdAllocator,
        symbol_allocator: &'a SymbolAllocator,
        functions: &'a FunctionResolution,
    ) -> Context<'a> {
        Context {
            lookup: &IdentityLookup,
            id_allocator,
            symbol_allocator,
            functions,
        }
    }

    #[test]
    fn intersect_produces_union_count_filter_project_shape() {
        let a = Variable::new("a", Type::BigInt);
        let s1 = one_col_source(1, a.clone());
        let s2 = one_col_source(2, a.clone());
        let set_op = SetOperation::new(PlanNodeId(3), vec![s1, s2], vec![(a.clone(), vec![a.clone(), a.clone()])]);
        let node: PlanRef = set_op.into_intersect();

        let id_allocator = PlanNodeIdAllocator::new();
        let symbol_allocator = SymbolAllocator::new();
        let functions = FunctionResolution::new();
        let context = ctx(&id_allocator, &symbol_allocator, &functions);

        let rule = ImplementIntersectAndExceptAsUnion::default();
        let replacement = rule.try_apply(&node, &context).expect("rule should fire");

        match &*replacement {
            PlanNode::Project(p) => match &*p.source {
                PlanNode::Filter(f) => match &*f.source {
                    PlanNode::Aggregation(agg) => {
                        assert_eq!(agg.aggregations.len(), 2);
                        assert!(matches!(&*agg.source, PlanNode::Union(_)));
                    }
                    other => panic!("expected aggregation, got {other}"),
                },
                other => panic!("expected filter, got {other}"),
            },
            other => panic!("expected project at root, got {other}"),
        }
    }
}
