//! `count(c)` over a projected constant → `count(*)`.

use crate::expr::Expression;
use crate::pattern::Pattern;
use crate::plan_node::{Aggregation, PlanBase, PlanNode, PlanRef};
use crate::rule::{Context, Rule, RuleResult};

pub struct SimplifyCountOverConstant {
    pattern: Pattern<Aggregation>,
}

impl Default for SimplifyCountOverConstant {
    fn default() -> Self {
        let pattern = Pattern::new(|node| match node {
            PlanNode::Aggregation(agg) if matches!(&*agg.source, PlanNode::Project(_)) => {
                Some(agg.clone())
            }
            _ => None,
        });
        SimplifyCountOverConstant { pattern }
    }
}

impl Rule for SimplifyCountOverConstant {
    type Match = Aggregation;

    fn name(&self) -> &'static str {
        "SimplifyCountOverConstant"
    }

    fn pattern(&self) -> &Pattern<Aggregation> {
        &self.pattern
    }

    fn apply(&self, agg: Aggregation, _node: &PlanRef, ctx: &Context) -> RuleResult {
        let resolved_source = ctx.lookup.resolve(&agg.source);
        let PlanNode::Project(project) = &*resolved_source else {
            return RuleResult::empty();
        };

        let mut new_aggregations = agg.aggregations.clone();
        let mut changed = false;
        for (_, call) in new_aggregations.iter_mut() {
            if !ctx.functions.is_count_function(&call.function) || call.arguments.len() != 1 {
                continue;
            }
            let arg = &call.arguments[0];
            let arg_is_constant = arg.is_non_null_literal()
                || matches!(arg, Expression::SymRef(var) if project
                    .assignments
                    .get(var)
                    .is_some_and(Expression::is_non_null_literal));
            if arg_is_constant {
                call.arguments.clear();
                changed = true;
            }
        }

        if !changed {
            return RuleResult::empty();
        }

        let new_agg = Aggregation {
            base: PlanBase::new(ctx.id_allocator.next_id(), agg.base.outputs.clone()),
            source: agg.source,
            aggregations: new_aggregations,
            grouping_set: agg.grouping_set,
            step: agg.step,
            hash_var: agg.hash_var,
            group_id_var: agg.group_id_var,
        };
        RuleResult::of_plan_node(new_agg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Assignments;
    use crate::function::FunctionHandle;
    use crate::function::FunctionResolution;
    use crate::id::{PlanNodeId, PlanNodeIdAllocator};
    use crate::lookup::IdentityLookup;
    use crate::plan_node::{AggregationCall, Project, SetOperation};
    use crate::rule::DynRule;
    use crate::types::Type;
    use crate::variable::{SymbolAllocator, Variable};

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

    fn scan() -> PlanRef {
        SetOperation::new(PlanNodeId(0), vec![], vec![]).into_union()
    }

    #[test]
    fn count_over_non_null_literal_drops_its_argument() {
        let s = Variable::new("s", Type::BigInt);
        let c = Variable::new("c", Type::BigInt);
        let project: PlanRef = Project::new(
            PlanNodeId(1),
            scan(),
            Assignments::new(vec![(s.clone(), Expression::LongLit(7))]),
        )
        .into();
        let agg = Aggregation::new(
            PlanNodeId(2),
            project,
            vec![(
                c,
                AggregationCall::new(FunctionHandle::new("count"), vec![Expression::sym(s)]),
            )],
            vec![],
        );
        let node: PlanRef = agg.into();

        let id_allocator = PlanNodeIdAllocator::new();
        let symbol_allocator = SymbolAllocator::new();
        let functions = FunctionResolution::new();
        let context = ctx(&id_allocator, &symbol_allocator, &functions);

        let rule = SimplifyCountOverConstant::default();
        let replacement = rule.try_apply(&node, &context).expect("rule should fire");
        match &*replacement {
            PlanNode::Aggregation(agg) => assert!(agg.aggregations[0].1.arguments.is_empty()),
            other => panic!("expected aggregation, got {other}"),
        }
    }

    #[test]
    fn count_over_null_literal_is_left_untouched() {
        let s = Variable::new("s", Type::BigInt);
        let c = Variable::new("c", Type::BigInt);
        let project: PlanRef = Project::new(
            PlanNodeId(1),
            scan(),
            Assignments::new(vec![(s.clone(), Expression::NullLit)]),
        )
        .into();
        let agg = Aggregation::new(
            PlanNodeId(2),
            project,
            vec![(
                c,
                AggregationCall::new(FunctionHandle::new("count"), vec![Expression::sym(s)]),
            )],
            vec![],
        );
        let node: PlanRef = agg.into();

        let id_allocator = PlanNodeIdAllocator::new();
        let symbol_allocator = SymbolAllocator::new();
        let functions = FunctionResolution::new();
        let context = ctx(&id_allocator, &symbol_allocator, &functions);

        let rule = SimplifyCountOverConstant::default();
        assert!(rule.try_apply(&node, &context).is_none());
    }
}
