//! The expression AST.
//!
//! Expressions are treated as opaque values by the plan layer: plan nodes
//! hold them, substitute them, and walk them for referenced symbols, but
//! never evaluate them. The constructors below are the only vocabulary the
//! rewriters in this crate need; there is deliberately no general-purpose
//! expression evaluator here.

use std::fmt;
use std::rc::Rc;

use itertools::Itertools;

use crate::function::FunctionHandle;
use crate::types::Type;
use crate::variable::Variable;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "=",
            CompareOp::Neq => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        };
        write!(f, "{s}")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expression {
    BoolLit(bool),
    NullLit,
    LongLit(i64),
    StringLit(Rc<str>),
    SymRef(Variable),
    Cast(Box<Expression>, Type),
    Compare(CompareOp, Box<Expression>, Box<Expression>),
    And(Vec<Expression>),
    Or(Vec<Expression>),
    Not(Box<Expression>),
    IsNull(Box<Expression>),
    IsNotNull(Box<Expression>),
    SearchedCase(Vec<(Expression, Expression)>, Box<Expression>),
    In(Box<Expression>, Box<Expression>),
    FunctionCall(FunctionHandle, Vec<Expression>),
}

impl Expression {
    pub fn sym(var: Variable) -> Expression {
        Expression::SymRef(var)
    }

    pub fn cast(self, ty: Type) -> Expression {
        Expression::Cast(Box::new(self), ty)
    }

    pub fn compare(op: CompareOp, lhs: Expression, rhs: Expression) -> Expression {
        Expression::Compare(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn eq(lhs: Expression, rhs: Expression) -> Expression {
        Expression::compare(CompareOp::Eq, lhs, rhs)
    }

    pub fn and(args: impl IntoIterator<Item = Expression>) -> Expression {
        let args: Vec<_> = args.into_iter().collect();
        match args.len() {
            0 => Expression::BoolLit(true),
            1 => args.into_iter().next().unwrap(),
            _ => Expression::And(args),
        }
    }

    pub fn or(args: impl IntoIterator<Item = Expression>) -> Expression {
        let args: Vec<_> = args.into_iter().collect();
        match args.len() {
            0 => Expression::BoolLit(false),
            1 => args.into_iter().next().unwrap(),
            _ => Expression::Or(args),
        }
    }

    pub fn not(self) -> Expression {
        Expression::Not(Box::new(self))
    }

    pub fn is_null(self) -> Expression {
        Expression::IsNull(Box::new(self))
    }

    pub fn is_not_null(self) -> Expression {
        Expression::IsNotNull(Box::new(self))
    }

    pub fn searched_case(whens: Vec<(Expression, Expression)>, else_: Expression) -> Expression {
        Expression::SearchedCase(whens, Box::new(else_))
    }

    pub fn in_list(value: Expression, list: Expression) -> Expression {
        Expression::In(Box::new(value), Box::new(list))
    }

    /// `true` iff this expression is a non-null literal: `BoolLit`, `LongLit`
    /// or `StringLit`. Used by `SimplifyCountOverConstant` to decide whether
    /// `count(arg)` can be downgraded to `count(*)`.
    pub fn is_non_null_literal(&self) -> bool {
        matches!(
            self,
            Expression::BoolLit(_) | Expression::LongLit(_) | Expression::StringLit(_)
        )
    }

    /// All variables referenced anywhere inside this expression, including
    /// nested sub-expressions. Does not descend into plan nodes (expressions
    /// never directly embed a `PlanRef`; an `In`'s value list is always a
    /// `SymRef` after sub-query extraction, never the subquery itself).
    pub fn collect_symbols(&self, out: &mut Vec<Variable>) {
        match self {
            Expression::BoolLit(_) | Expression::NullLit | Expression::LongLit(_) => {}
            Expression::StringLit(_) => {}
            Expression::SymRef(var) => out.push(var.clone()),
            Expression::Cast(inner, _) => inner.collect_symbols(out),
            Expression::Compare(_, lhs, rhs) => {
                lhs.collect_symbols(out);
                rhs.collect_symbols(out);
            }
            Expression::And(args) | Expression::Or(args) => {
                for arg in args {
                    arg.collect_symbols(out);
                }
            }
            Expression::Not(inner) | Expression::IsNull(inner) | Expression::IsNotNull(inner) => {
                inner.collect_symbols(out)
            }
            Expression::SearchedCase(whens, else_) => {
                for (cond, result) in whens {
                    cond.collect_symbols(out);
                    result.collect_symbols(out);
                }
                else_.collect_symbols(out);
            }
            Expression::In(value, list) => {
                value.collect_symbols(out);
                list.collect_symbols(out);
            }
            Expression::FunctionCall(_, args) => {
                for arg in args {
                    arg.collect_symbols(out);
                }
            }
        }
    }

    pub fn symbols(&self) -> Vec<Variable> {
        let mut out = Vec::new();
        self.collect_symbols(&mut out);
        out
    }

    /// `true` iff any symbol in this expression is a member of `vars`.
    pub fn references_any(&self, vars: &[Variable]) -> bool {
        self.symbols().iter().any(|s| vars.contains(s))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::BoolLit(v) => write!(f, "{v}"),
            Expression::NullLit => write!(f, "null"),
            Expression::LongLit(v) => write!(f, "{v}"),
            Expression::StringLit(v) => write!(f, "'{v}'"),
            Expression::SymRef(var) => write!(f, "{var}"),
            Expression::Cast(e, ty) => write!(f, "CAST({e} AS {ty})"),
            Expression::Compare(op, l, r) => write!(f, "({l} {op} {r})"),
            Expression::And(args) => write!(f, "({})", args.iter().format(" AND ")),
            Expression::Or(args) => write!(f, "({})", args.iter().format(" OR ")),
            Expression::Not(e) => write!(f, "(NOT {e})"),
            Expression::IsNull(e) => write!(f, "({e} IS NULL)"),
            Expression::IsNotNull(e) => write!(f, "({e} IS NOT NULL)"),
            Expression::SearchedCase(whens, else_) => {
                write!(f, "CASE")?;
                for (cond, result) in whens {
                    write!(f, " WHEN {cond} THEN {result}")?;
                }
                write!(f, " ELSE {else_} END")
            }
            Expression::In(value, list) => write!(f, "({value} IN {list})"),
            Expression::FunctionCall(handle, args) => {
                write!(f, "{handle}({})", args.iter().format(", "))
            }
        }
    }
}

mod assignments;
pub use assignments::Assignments;
