//! Ordered `Variable -> Expression` mappings, used by `Project` and by the
//! correlated-subquery rewrite to describe what a node binds.

use itertools::Itertools;

use super::Expression;
use crate::variable::Variable;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assignments {
    entries: Vec<(Variable, Expression)>,
}

impl Assignments {
    pub fn new(entries: Vec<(Variable, Expression)>) -> Self {
        Assignments { entries }
    }

    /// Identity assignments: `v -> SymRef(v)` for each variable, in order.
    pub fn identity(vars: impl IntoIterator<Item = Variable>) -> Self {
        Assignments::new(
            vars.into_iter()
                .map(|v| {
                    let expr = Expression::sym(v.clone());
                    (v, expr)
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, var: &Variable) -> Option<&Expression> {
        self.entries.iter().find(|(v, _)| v == var).map(|(_, e)| e)
    }

    pub fn contains_key(&self, var: &Variable) -> bool {
        self.entries.iter().any(|(v, _)| v == var)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Variable> {
        self.entries.iter().map(|(v, _)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Variable, Expression)> {
        self.entries.iter()
    }

    pub fn push(&mut self, var: Variable, expr: Expression) {
        self.entries.push((var, expr));
    }

    /// Append an identity binding for every `var` not already present.
    pub fn extend_with_identities(&mut self, vars: impl IntoIterator<Item = Variable>) {
        for var in vars {
            if !self.contains_key(&var) {
                let expr = Expression::sym(var.clone());
                self.push(var, expr);
            }
        }
    }

    pub fn into_inner(self) -> Vec<(Variable, Expression)> {
        self.entries
    }
}

impl std::fmt::Display for Assignments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.entries
                .iter()
                .map(|(v, e)| format!("{v} := {e}"))
                .format(", ")
        )
    }
}

impl FromIterator<(Variable, Expression)> for Assignments {
    fn from_iter<T: IntoIterator<Item = (Variable, Expression)>>(iter: T) -> Self {
        Assignments::new(iter.into_iter().collect())
    }
}
