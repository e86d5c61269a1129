//! `x IN (subquery)` → left join + case analysis.

use crate::decorrelate::decorrelate;
use crate::expr::{Assignments, CompareOp, Expression};
use crate::pattern::Pattern;
use crate::plan_node::{
    Aggregation, AggregationCall, Apply, AssignUniqueId, Join, JoinKind, PlanNode, PlanRef, Project,
};
use crate::rule::{Context, Rule, RuleResult};
use crate::types::Type;
use crate::variable::Variable;

/// Pulls `(o, value, list)` out of an `Apply` whose `subqueryAssignments`
/// bind exactly one variable to `value IN list`, both `SymRef`s. Shared
/// between the pattern predicate and `apply` so the two never disagree
/// about what shape counts as a match.
fn in_predicate_shape(apply: &Apply) -> Option<(Variable, Variable, Variable)> {
    if apply.subquery_assignments.len() != 1 {
        return None;
    }
    let (o, expr) = apply.subquery_assignments.iter().next()?;
    match expr {
        Expression::In(value, list) => match (value.as_ref(), list.as_ref()) {
            (Expression::SymRef(v), Expression::SymRef(b)) => {
                Some((o.clone(), v.clone(), b.clone()))
            }
            _ => None,
        },
        _ => None,
    }
}

pub struct TransformCorrelatedInPredicateToJoin {
    pattern: Pattern<Apply>,
}

impl Default for TransformCorrelatedInPredicateToJoin {
    fn default() -> Self {
        let pattern = Pattern::new(|node| match node {
            PlanNode::Apply(a) => Some(a.clone()),
            _ => None,
        })
        .matching(|a| a.is_correlated() && in_predicate_shape(a).is_some());
        TransformCorrelatedInPredicateToJoin { pattern }
    }
}

impl Rule for TransformCorrelatedInPredicateToJoin {
    type Match = Apply;

    fn name(&self) -> &'static str {
        "TransformCorrelatedInPredicateToJoin"
    }

    fn pattern(&self) -> &Pattern<Apply> {
        &self.pattern
    }

    fn apply(&self, apply: Apply, _node: &PlanRef, ctx: &Context) -> RuleResult {
        // Rejects whenever `subquery_assignments` is anything other than
        // exactly one `value IN list` binding; the pattern already enforced
        // that.
        let (o, v, b) = in_predicate_shape(&apply).expect("pattern guarantees this shape");

        let Some(decorrelated) =
            decorrelate(&apply.subquery, &apply.correlation, ctx.lookup, ctx.id_allocator)
        else {
            // Leave the Apply in place; the post-condition verifier raises
            // the user-facing error for whatever correlation survives here.
            return RuleResult::empty();
        };

        let a = apply.input;
        let build_core = decorrelated.decorrelated_node;
        let pulled_up_predicates = decorrelated.correlated_predicates;

        let unique_var = ctx.symbol_allocator.new_variable("unique", Type::BigInt);
        let probe_side: PlanRef =
            AssignUniqueId::new(ctx.id_allocator.next_id(), a.clone(), unique_var).into();

        let build_known_non_null_var = ctx
            .symbol_allocator
            .new_variable("build_side_known_non_null", Type::BigInt);
        let mut build_assignments = Assignments::identity(build_core.outputs().to_vec());
        build_assignments.push(
            build_known_non_null_var.clone(),
            Expression::LongLit(0).cast(Type::BigInt),
        );
        let build_side: PlanRef =
            Project::new(ctx.id_allocator.next_id(), build_core, build_assignments).into();

        let join_filter = Expression::and(vec![
            Expression::or(vec![
                Expression::sym(v.clone()).is_null(),
                Expression::eq(Expression::sym(v.clone()), Expression::sym(b.clone())),
                Expression::sym(b.clone()).is_null(),
            ]),
            Expression::and(pulled_up_predicates),
        ]);
        let join_outputs: Vec<Variable> = probe_side
            .outputs()
            .iter()
            .chain(build_side.outputs())
            .cloned()
            .collect();
        let join: PlanRef = Join::new(
            ctx.id_allocator.next_id(),
            JoinKind::Left,
            probe_side.clone(),
            build_side,
            Vec::new(),
            join_outputs,
            Some(join_filter),
        )
        .into();

        let matched = Expression::and(vec![
            Expression::sym(v.clone()).is_not_null(),
            Expression::sym(b.clone()).is_not_null(),
        ]);
        let count_matches_var = ctx.symbol_allocator.new_variable("count_matches", Type::BigInt);
        let count_matches_call =
            AggregationCall::new(ctx.functions.count_function(), Vec::new()).with_filter(matched.clone());

        let count_null_matches_var =
            ctx.symbol_allocator.new_variable("count_null_matches", Type::BigInt);
        let count_null_matches_call = AggregationCall::new(ctx.functions.count_function(), Vec::new())
            .with_filter(Expression::and(vec![
                Expression::sym(build_known_non_null_var).is_not_null(),
                matched.not(),
            ]));

        let aggregation: PlanRef = Aggregation::new(
            ctx.id_allocator.next_id(),
            join,
            vec![
                (count_matches_var.clone(), count_matches_call),
                (count_null_matches_var.clone(), count_null_matches_call),
            ],
            probe_side.outputs().to_vec(),
        )
        .into();

        let mut result_assignments = Assignments::identity(a.outputs().to_vec());
        result_assignments.push(
            o,
            Expression::searched_case(
                vec![
                    (
                        Expression::compare(CompareOp::Gt, Expression::sym(count_matches_var), Expression::LongLit(0)),
                        Expression::BoolLit(true),
                    ),
                    (
                        Expression::compare(
                            CompareOp::Gt,
                            Expression::sym(count_null_matches_var),
                            Expression::LongLit(0),
                        ),
                        Expression::NullLit,
                    ),
                ],
                Expression::BoolLit(false),
            ),
        );
        let result: PlanRef =
            Project::new(ctx.id_allocator.next_id(), aggregation, result_assignments).into();

        RuleResult::of_plan_node(result)
    }
}
