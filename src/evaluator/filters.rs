//! Row filtering for phase 3

use serde_json::Value;

use crate::expr::Expression;

use super::env::{Environment, RowScope};
use super::errors::{EvalError, EvalResult};
use super::planner::FILTER_KEY;

/// Evaluates `__filter__` against mapped rows
pub struct RowFilter;

impl RowFilter {
    /// Keeps the row when there is no filter or the filter is truthy.
    ///
    /// The filter sees the row as built by the field mapping.
    pub fn keep(
        filter: Option<&Expression>,
        env: &Environment,
        row: &Value,
        alias: Option<&str>,
    ) -> EvalResult<bool> {
        match filter {
            None => Ok(true),
            Some(filter) => filter
                .test(&RowScope::new(env, row, alias))
                .map_err(|e| EvalError::expression(FILTER_KEY, e)),
        }
    }
}
