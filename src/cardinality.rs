//! Static scalar-cardinality analysis: whether a plan node is known, by
//! its shape alone, to produce exactly one row.

use crate::lookup::Lookup;
use crate::plan_node::{PlanNode, PlanRef};

pub struct QueryCardinalityUtil;

impl QueryCardinalityUtil {
    /// `true` iff `node` is provably known to produce exactly one row for
    /// any input. Only the shapes the rewriters in this crate actually
    /// synthesize or see are recognized; anything else is conservatively
    /// treated as non-scalar.
    pub fn is_scalar(node: &PlanRef, lookup: &dyn Lookup) -> bool {
        let resolved = lookup.resolve(node);
        match &*resolved {
            PlanNode::Aggregation(agg) => agg.grouping_set.is_empty(),
            // A projection neither adds nor removes rows.
            PlanNode::Project(project) => QueryCardinalityUtil::is_scalar(&project.source, lookup),
            _ => false,
        }
    }
}
