//! Post-condition check that the driver reached a fully rewritten plan.

use crate::error::{RewriteError, Result};
use crate::plan_node::{PlanNode, PlanRef};

const UNSUPPORTED_MESSAGE: &str = "Given correlated subquery is not supported";

/// Walk `root` and fail if any `Apply` or `LateralJoin` remains. A
/// zero-correlation survivor is an internal-consistency bug: earlier passes
/// in the parser layer are supposed to have rewritten those away before
/// this crate ever sees the plan.
pub fn check_subquery_nodes_are_rewritten(root: &PlanRef) -> Result<()> {
    match &**root {
        PlanNode::Apply(apply) => {
            if apply.is_correlated() {
                Err(unsupported(&apply.origin_subquery_error))
            } else {
                Err(RewriteError::InternalConsistency(format!(
                    "uncorrelated Apply#{} reached the verifier",
                    apply.base.id
                )))
            }
        }
        PlanNode::LateralJoin(lateral_join) => {
            if lateral_join.is_correlated() {
                Err(unsupported(&lateral_join.origin_subquery_error))
            } else {
                Err(RewriteError::InternalConsistency(format!(
                    "uncorrelated LateralJoin#{} reached the verifier",
                    lateral_join.base.id
                )))
            }
        }
        _ => {
            for child in root.children() {
                check_subquery_nodes_are_rewritten(&child)?;
            }
            Ok(())
        }
    }
}

fn unsupported(origin_subquery_error: &str) -> RewriteError {
    let message = if origin_subquery_error.contains("%s") {
        origin_subquery_error.replacen("%s", UNSUPPORTED_MESSAGE, 1)
    } else {
        format!("{origin_subquery_error}{UNSUPPORTED_MESSAGE}")
    };
    RewriteError::UnsupportedCorrelatedSubquery(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Assignments;
    use crate::id::PlanNodeId;
    use crate::plan_node::{Apply, Project, SetOperation};
    use crate::types::Type;
    use crate::variable::Variable;
    use assert_matches::assert_matches;

    fn leaf() -> PlanRef {
        SetOperation::new(PlanNodeId(0), vec![], vec![]).into_union()
    }

    #[test]
    fn accepts_a_plan_with_no_apply_or_lateral_join() {
        let project: PlanRef =
            Project::new(PlanNodeId(1), leaf(), Assignments::identity(vec![])).into();
        assert!(check_subquery_nodes_are_rewritten(&project).is_ok());
    }

    #[test]
    fn rejects_a_correlated_apply_with_its_template_filled_in() {
        let k = Variable::new("k", Type::BigInt);
        let apply: PlanRef = Apply::new(
            PlanNodeId(1),
            leaf(),
            leaf(),
            Assignments::identity(vec![]),
            vec![k],
            "subquery on line 3: %s".to_string(),
        )
        .into();
        let err = check_subquery_nodes_are_rewritten(&apply).unwrap_err();
        assert_matches!(err.clone(), RewriteError::UnsupportedCorrelatedSubquery(_));
        assert_eq!(
            err.to_string(),
            "subquery on line 3: Given correlated subquery is not supported"
        );
    }

    #[test]
    fn rejects_an_uncorrelated_apply_as_an_internal_bug() {
        let apply: PlanRef = Apply::new(
            PlanNodeId(1),
            leaf(),
            leaf(),
            Assignments::identity(vec![]),
            vec![],
            "subquery on line 3: %s".to_string(),
        )
        .into();
        let err = check_subquery_nodes_are_rewritten(&apply).unwrap_err();
        assert_matches!(err, RewriteError::InternalConsistency(_));
    }
}
