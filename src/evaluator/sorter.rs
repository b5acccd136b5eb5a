//! Row ordering for phase 4
//!
//! `__sort__` sorts ascending by a per-row key. `__reverse__` turns that
//! into a descending sort, or reverses the rows when there is no sort key.
//! Both orderings are stable.

use std::cmp::Ordering;

use serde_json::Value;

use crate::expr::compare;

use super::env::{DetachedScope, Environment, RowScope};
use super::errors::{EvalError, EvalResult};
use super::planner::{NodePlan, Reverse, REVERSE_KEY, SORT_KEY};

/// Orders filtered rows
pub struct RowSorter;

impl RowSorter {
    pub fn order(rows: &mut Vec<Value>, env: &Environment, plan: &NodePlan) -> EvalResult<()> {
        let descending = Self::descending(env, plan)?;

        let Some(sort) = &plan.sort else {
            if descending {
                rows.reverse();
            }
            return Ok(());
        };

        let mut keyed = rows
            .drain(..)
            .map(|row| -> EvalResult<(Value, Value)> {
                let key = sort
                    .evaluate(&RowScope::new(env, &row, plan.alias()))
                    .map_err(|e| EvalError::expression(SORT_KEY, e))?;
                Ok((key, row))
            })
            .collect::<EvalResult<Vec<_>>>()?;

        let mut failure = None;
        keyed.sort_by(|(a, _), (b, _)| match compare(a, b) {
            Ok(ordering) if descending => ordering.reverse(),
            Ok(ordering) => ordering,
            Err(e) => {
                failure.get_or_insert(e);
                Ordering::Equal
            }
        });
        if let Some(e) = failure {
            return Err(EvalError::expression(SORT_KEY, e));
        }

        rows.extend(keyed.into_iter().map(|(_, row)| row));
        Ok(())
    }

    /// `__reverse__` sees the environment without `it`.
    fn descending(env: &Environment, plan: &NodePlan) -> EvalResult<bool> {
        match &plan.reverse {
            None => Ok(false),
            Some(Reverse::Literal(flag)) => Ok(*flag),
            Some(Reverse::Expr(expr)) => expr
                .test(&DetachedScope::new(env))
                .map_err(|e| EvalError::expression(REVERSE_KEY, e)),
        }
    }
}
