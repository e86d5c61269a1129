//! Elide a lateral join whose one side is scalar and contributes no
//! referenced columns.

use crate::cardinality::QueryCardinalityUtil;
use crate::pattern::Pattern;
use crate::plan_node::{LateralJoin, PlanNode, PlanRef};
use crate::rule::{Context, Rule, RuleResult};

pub struct RemoveUnreferencedScalarLateralNodes {
    pattern: Pattern<LateralJoin>,
}

impl Default for RemoveUnreferencedScalarLateralNodes {
    fn default() -> Self {
        let pattern = Pattern::new(|node| match node {
            PlanNode::LateralJoin(lj) => Some(lj.clone()),
            _ => None,
        });
        RemoveUnreferencedScalarLateralNodes { pattern }
    }
}

impl Rule for RemoveUnreferencedScalarLateralNodes {
    type Match = LateralJoin;

    fn name(&self) -> &'static str {
        "RemoveUnreferencedScalarLateralNodes"
    }

    fn pattern(&self) -> &Pattern<LateralJoin> {
        &self.pattern
    }

    fn apply(&self, lateral_join: LateralJoin, _node: &PlanRef, ctx: &Context) -> RuleResult {
        if lateral_join.input.outputs().is_empty()
            && QueryCardinalityUtil::is_scalar(&lateral_join.input, ctx.lookup)
        {
            return RuleResult::Replace(lateral_join.subquery);
        }
        if lateral_join.subquery.outputs().is_empty()
            && QueryCardinalityUtil::is_scalar(&lateral_join.subquery, ctx.lookup)
        {
            return RuleResult::Replace(lateral_join.input);
        }
        RuleResult::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionResolution;
    use crate::id::{PlanNodeId, PlanNodeIdAllocator};
    use crate::lookup::IdentityLookup;
    use crate::plan_node::{Aggregation, SetOperation};
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

    fn scan(vars: Vec<Variable>) -> PlanRef {
        let mapping = vars.into_iter().map(|v| (v.clone(), vec![v])).collect();
        SetOperation::new(PlanNodeId(0), vec![], mapping).into_union()
    }

    #[test]
    fn scalar_empty_input_is_replaced_by_subquery() {
        let scalar_input: PlanRef = Aggregation::new(PlanNodeId(1), scan(vec![]), vec![], vec![]).into();
        let q = scan(vec![Variable::new("b", Type::BigInt)]);
        let lateral = LateralJoin::new(PlanNodeId(2), scalar_input, q.clone(), vec![], String::new());

        let id_allocator = PlanNodeIdAllocator::new();
        let symbol_allocator = SymbolAllocator::new();
        let functions = FunctionResolution::new();
        let context = ctx(&id_allocator, &symbol_allocator, &functions);

        let rule = RemoveUnreferencedScalarLateralNodes::default();
        let node: PlanRef = lateral.into();
        let replacement = rule.try_apply(&node, &context).expect("rule should fire");
        assert_eq!(replacement, q);
    }

    #[test]
    fn non_scalar_input_is_left_untouched() {
        let non_scalar_input = scan(vec![]);
        let q = scan(vec![Variable::new("b", Type::BigInt)]);
        let lateral = LateralJoin::new(PlanNodeId(2), non_scalar_input, q, vec![], String::new());

        let id_allocator = PlanNodeIdAllocator::new();
        let symbol_allocator = SymbolAllocator::new();
        let functions = FunctionResolution::new();
        let context = ctx(&id_allocator, &symbol_allocator, &functions);

        let rule = RemoveUnreferencedScalarLateralNodes::default();
        let node: PlanRef = lateral.into();
        assert!(rule.try_apply(&node, &context).is_none());
    }
}
