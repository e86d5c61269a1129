use crate::expr::Expression;
use crate::function::FunctionHandle;
use crate::variable::Variable;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggregationStep {
    Single,
    Partial,
    Final,
}

/// One entry of an `Aggregation` node's `aggregations` map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregationCall {
    pub function: FunctionHandle,
    pub arguments: Vec<Expression>,
    pub filter: Option<Expression>,
    pub order_by: Option<Vec<Variable>>,
    pub distinct: bool,
    pub mask: Option<Variable>,
}

impl AggregationCall {
    pub fn new(function: FunctionHandle, arguments: Vec<Expression>) -> Self {
        AggregationCall {
            function,
            arguments,
            filter: None,
            order_by: None,
            distinct: false,
            mask: None,
        }
    }

    pub fn with_filter(mut self, filter: Expression) -> Self {
        self.filter = Some(filter);
        self
    }
}
