//! Schema node executor
//!
//! Runs a [`NodePlan`] against an environment. Phases, in order:
//! 1. Bind candidate rows (`__name__`, `__from__`, or one empty row)
//! 2. Map declared fields into each row
//! 3. Filter rows (`__filter__`)
//! 4. Order rows (`__sort__`, `__reverse__`)
//! 5. Project and rename (`__only__`, `__except__`, `__rename__`)
//! 6. Select the result (`__item__`)

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::expr::{type_name, ExpressionCache};
use crate::store::SourceStore;

use super::env::{Environment, RowScope, IT};
use super::errors::{EvalError, EvalResult};
use super::filters::RowFilter;
use super::indexing::select;
use super::mapper::merge_field;
use super::planner::{Binding, FieldPlan, NodePlan, NodePlanner, Rule, FROM_KEY, NAME_KEY};
use super::projection::project;
use super::sorter::RowSorter;

/// Evaluates schema nodes against a source store.
///
/// Holds the expression cache for its lifetime; create one per request or
/// per session, never share one across threads.
pub struct SchemaEvaluator<'s, S: SourceStore + ?Sized> {
    store: &'s S,
    cache: ExpressionCache,
}

impl<'s, S: SourceStore + ?Sized> SchemaEvaluator<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            cache: ExpressionCache::new(),
        }
    }

    pub fn store(&self) -> &S {
        self.store
    }

    /// Expressions compiled so far
    pub fn cache(&self) -> &ExpressionCache {
        &self.cache
    }

    /// Validates `node` and compiles it into a plan.
    pub fn plan(&mut self, node: &Value) -> EvalResult<NodePlan> {
        NodePlanner::new(self.store, &mut self.cache).plan(node)
    }

    /// Evaluates `node` against `env`.
    ///
    /// Returns a list of rows, or a single row (possibly `null`) or a slice
    /// when the node selects with `__item__`.
    pub fn apply(&mut self, env: &Environment, node: &Value) -> EvalResult<Value> {
        let plan = self.plan(node)?;
        self.execute(env, &plan)
    }

    /// Runs an already planned node.
    pub fn execute(&self, env: &Environment, plan: &NodePlan) -> EvalResult<Value> {
        let candidates = self.candidates(env, plan)?;
        let scanned = candidates.len();

        let mut rows = Vec::with_capacity(scanned);
        for candidate in candidates {
            let row = self.map_row(env, plan, candidate)?;
            if RowFilter::keep(plan.filter.as_deref(), env, &row, plan.alias())? {
                rows.push(row);
            }
        }
        let kept = rows.len();

        RowSorter::order(&mut rows, env, plan)?;

        let projected = rows
            .into_iter()
            .map(|row| project(row, &plan.projection))
            .collect();

        trace!(scanned, kept, fields = plan.fields.len(), "node evaluated");
        Ok(select(projected, plan.item))
    }

    fn candidates(&self, env: &Environment, plan: &NodePlan) -> EvalResult<Vec<Value>> {
        match &plan.binding {
            Binding::Fresh => Ok(vec![Value::Object(Map::new())]),
            Binding::Name(_) => match env.get(IT) {
                None | Some(Value::Null) => Ok(vec![Value::Object(Map::new())]),
                Some(row @ Value::Object(_)) => Ok(vec![row.clone()]),
                Some(other) => Err(EvalError::structure(
                    NAME_KEY,
                    format!("current row must be an object, got {}", type_name(other)),
                )),
            },
            Binding::From { entity, .. } => {
                let rows = self
                    .store
                    .query_entity(entity)
                    .map_err(|e| EvalError::store(FROM_KEY, e))?;
                debug!(entity = %entity, rows = rows.len(), "queried entity");
                Ok(rows.into_iter().map(Value::Object).collect())
            }
        }
    }

    /// Evaluates every field in declaration order, merging each into the row
    /// before the next one runs.
    fn map_row(&self, env: &Environment, plan: &NodePlan, mut row: Value) -> EvalResult<Value> {
        for field in &plan.fields {
            let value = self.field_value(env, plan.alias(), &row, field)?;
            if let Value::Object(map) = &mut row {
                merge_field(map, &field.target, value)
                    .map_err(|reason| EvalError::structure(field.key.as_str(), reason))?;
            }
        }
        Ok(row)
    }

    /// Runs each rule of a field; the last one's value wins.
    fn field_value(
        &self,
        env: &Environment,
        alias: Option<&str>,
        row: &Value,
        field: &FieldPlan,
    ) -> EvalResult<Value> {
        let mut value = Value::Null;
        for rule in &field.rules {
            value = match rule {
                Rule::Expr(expr) => expr
                    .evaluate(&RowScope::new(env, row, alias))
                    .map_err(|e| EvalError::expression(field.key.as_str(), e))?,
                Rule::Node(child) => {
                    let mut child_env = env.clone();
                    child_env.bind(IT, row.clone());
                    if let Some(alias) = alias {
                        child_env.bind(alias, row.clone());
                    }
                    self.execute(&child_env, child)
                        .map_err(|e| e.with_prefix(&field.key))?
                }
            };
        }
        Ok(value)
    }
}

/// Plans and evaluates `node` once with a fresh evaluator.
pub fn apply_schema<S: SourceStore + ?Sized>(
    store: &S,
    env: &Environment,
    node: &Value,
) -> EvalResult<Value> {
    SchemaEvaluator::new(store).apply(env, node)
}
