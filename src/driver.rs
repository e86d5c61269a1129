//! Fixed-point rule application over the plan tree.

use tracing::debug;

use crate::error::{RewriteError, Result};
use crate::plan_node::PlanRef;
use crate::rule::{Context, DynRule};

/// Applies a fixed, ordered list of rules to a plan until no rule matches
/// anywhere in the tree. Rule order is part of the driver's identity: the
/// first matching rule at a position wins, and that choice must be
/// reproducible given identical inputs.
pub struct RewriteDriver {
    rules: Vec<Box<dyn DynRule>>,
}

impl RewriteDriver {
    pub fn new(rules: Vec<Box<dyn DynRule>>) -> Self {
        RewriteDriver { rules }
    }

    /// Rewrite `root` to a fixed point. Never cancelled.
    pub fn rewrite(&self, root: &PlanRef, ctx: &Context) -> PlanRef {
        self.rewrite_with_cancellation(root, ctx, &|| false)
            .expect("cancellation predicate never returns true")
    }

    /// Rewrite `root` to a fixed point, checking `is_cancelled` between
    /// top-level passes.
    pub fn rewrite_with_cancellation(
        &self,
        root: &PlanRef,
        ctx: &Context,
        is_cancelled: &dyn Fn() -> bool,
    ) -> Result<PlanRef> {
        let mut current = root.clone();
        loop {
            if is_cancelled() {
                return Err(RewriteError::Cancelled);
            }
            let (next, changed) = self.rewrite_once(&current, ctx);
            if !changed {
                return Ok(next);
            }
            current = next;
        }
    }

    /// One bottom-up pass: rewrite every child first, rebuild this node
    /// over the rewritten children if any of them changed, then try each
    /// rule against the (possibly rebuilt) node in order. The first rule
    /// that fires wins, and its replacement is itself re-visited before
    /// the result is handed back up, so a single call to `rewrite_once`
    /// already drives a whole subtree as far toward its local fixed point
    /// as one descent can reach.
    fn rewrite_once(&self, node: &PlanRef, ctx: &Context) -> (PlanRef, bool) {
        let children = node.children();
        let mut new_children = Vec::with_capacity(children.len());
        let mut any_child_changed = false;
        for child in &children {
            let (new_child, child_changed) = self.rewrite_once(child, ctx);
            any_child_changed |= child_changed;
            new_children.push(new_child);
        }

        let rebuilt = if any_child_changed {
            PlanRef::from(node.with_children(&new_children))
        } else {
            node.clone()
        };

        for rule in &self.rules {
            if let Some(replacement) = rule.try_apply(&rebuilt, ctx) {
                debug!(rule = rule.name(), node = %rebuilt, "rule applied");
                let (settled, _) = self.rewrite_once(&replacement, ctx);
                return (settled, true);
            }
        }

        (rebuilt, any_child_changed)
    }
}
