//! The rule contract and the per-query capabilities every rule gets.

use crate::function::FunctionResolution;
use crate::id::PlanNodeIdAllocator;
use crate::lookup::Lookup;
use crate::pattern::Pattern;
use crate::plan_node::PlanRef;
use crate::variable::SymbolAllocator;

/// Everything a rule needs beyond the node it was matched against. Passed
/// explicitly rather than reached for through process-global state, so two
/// queries planning concurrently never share an allocator.
pub struct Context<'a> {
    pub lookup: &'a dyn Lookup,
    pub id_allocator: &'a PlanNodeIdAllocator,
    pub symbol_allocator: &'a SymbolAllocator,
    pub functions: &'a FunctionResolution,
}

pub enum RuleResult {
    /// The rule declined; the driver tries the next rule at this position.
    Unchanged,
    Replace(PlanRef),
}

impl RuleResult {
    pub fn empty() -> Self {
        RuleResult::Unchanged
    }

    pub fn of_plan_node(node: impl Into<PlanRef>) -> Self {
        RuleResult::Replace(node.into())
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, RuleResult::Unchanged)
    }
}

/// One optimizer rule: a [`Pattern`] selecting candidate nodes, plus the
/// construction logic that turns a match into a replacement subtree.
///
/// `Match` is the owned, structurally-validated capture the rule's pattern
/// produces — usually a cloned plan-node variant struct such as `Apply`.
pub trait Rule {
    type Match: Clone;

    fn name(&self) -> &'static str;
    fn pattern(&self) -> &Pattern<Self::Match>;
    fn apply(&self, matched: Self::Match, node: &PlanRef, ctx: &Context) -> RuleResult;
}

/// Type-erased view of a [`Rule`], so the driver can hold a single
/// `Vec<Box<dyn DynRule>>` across rules with unrelated `Match` types.
pub trait DynRule {
    fn name(&self) -> &'static str;
    fn try_apply(&self, node: &PlanRef, ctx: &Context) -> Option<PlanRef>;
}

impl<R: Rule> DynRule for R {
    fn name(&self) -> &'static str {
        Rule::name(self)
    }

    fn try_apply(&self, node: &PlanRef, ctx: &Context) -> Option<PlanRef> {
        let matched = self.pattern().try_match(node)?;
        match self.apply(matched, node, ctx) {
            RuleResult::Unchanged => None,
            RuleResult::Replace(replacement) => Some(replacement),
        }
    }
}
