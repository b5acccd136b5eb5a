//! Schema node planner
//!
//! Validates a schema node and compiles every expression it holds into an
//! immutable [`NodePlan`] before any row is touched, so a malformed node
//! fails the same way whatever the data.
//!
//! Helper references are resolved here: the helper is loaded, the caller's
//! keys are laid over it and the merged node is planned in its place.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::expr::{Expression, ExpressionCache};
use crate::patterns;
use crate::store::{helper_schema, SourceStore, HELPER_KEY};

use super::errors::{EvalError, EvalResult};

pub const NAME_KEY: &str = "__name__";
pub const FROM_KEY: &str = "__from__";
pub const FILTER_KEY: &str = "__filter__";
pub const SORT_KEY: &str = "__sort__";
pub const REVERSE_KEY: &str = "__reverse__";
pub const ONLY_KEY: &str = "__only__";
pub const EXCEPT_KEY: &str = "__except__";
pub const RENAME_KEY: &str = "__rename__";
pub const ITEM_KEY: &str = "__item__";

/// Reserved keys governing evaluation; they never produce output fields.
pub const KEYWORDS: [&str; 10] = [
    HELPER_KEY,
    FROM_KEY,
    NAME_KEY,
    FILTER_KEY,
    SORT_KEY,
    REVERSE_KEY,
    ONLY_KEY,
    EXCEPT_KEY,
    RENAME_KEY,
    ITEM_KEY,
];

pub fn is_keyword(key: &str) -> bool {
    KEYWORDS.contains(&key)
}

/// Where candidate rows come from
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// One empty row
    Fresh,
    /// The caller's `it`, also bound under the given name
    Name(String),
    /// Every row of an entity, optionally bound under an alias
    From {
        alias: Option<String>,
        entity: String,
    },
}

/// How a field's value lands in the row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKey {
    /// Stored under the key verbatim
    Plain(String),
    /// Object value spliced into the row with prefixed keys (`**prefix`)
    Splice(String),
}

/// One rule of a field
#[derive(Debug, Clone)]
pub enum Rule {
    Expr(Arc<Expression>),
    Node(Box<NodePlan>),
}

/// A field and its rules, in declaration order
#[derive(Debug, Clone)]
pub struct FieldPlan {
    /// Key as written in the node, used in error paths
    pub key: String,
    pub target: FieldKey,
    pub rules: Vec<Rule>,
}

/// `__reverse__` as written
#[derive(Debug, Clone)]
pub enum Reverse {
    Literal(bool),
    Expr(Arc<Expression>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Only(Vec<String>),
    Except(Vec<String>),
}

/// Projection and rename applied to each output row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub selection: Selection,
    /// `(inner, outer)` pairs
    pub renames: Vec<(String, String)>,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            selection: Selection::All,
            renames: Vec::new(),
        }
    }
}

/// `__item__` as written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSelector {
    Index(i64),
    Slice {
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    },
}

/// Immutable plan for one schema node (no runtime state)
#[derive(Debug, Clone)]
pub struct NodePlan {
    pub binding: Binding,
    pub fields: Vec<FieldPlan>,
    pub filter: Option<Arc<Expression>>,
    pub sort: Option<Arc<Expression>>,
    pub reverse: Option<Reverse>,
    pub projection: Projection,
    pub item: Option<ItemSelector>,
}

impl NodePlan {
    /// Name the current row is bound to besides `it`
    pub fn alias(&self) -> Option<&str> {
        match &self.binding {
            Binding::Name(name) => Some(name),
            Binding::From { alias, .. } => alias.as_deref(),
            Binding::Fresh => None,
        }
    }
}

/// Planner producing [`NodePlan`]s
pub struct NodePlanner<'a, S: SourceStore + ?Sized> {
    store: &'a S,
    cache: &'a mut ExpressionCache,
    /// Helpers being expanded on the current path, outermost first
    helpers: Vec<String>,
}

impl<'a, S: SourceStore + ?Sized> NodePlanner<'a, S> {
    pub fn new(store: &'a S, cache: &'a mut ExpressionCache) -> Self {
        Self {
            store,
            cache,
            helpers: Vec::new(),
        }
    }

    /// Plans a schema node, nested nodes included.
    pub fn plan(&mut self, node: &Value) -> EvalResult<NodePlan> {
        match node {
            Value::Object(node) => self.plan_node(node),
            _ => Err(EvalError::structure("", "schema node must be an object")),
        }
    }

    fn plan_node(&mut self, node: &Map<String, Value>) -> EvalResult<NodePlan> {
        if let Some(helper) = node.get(HELPER_KEY) {
            return self.expand_helper(helper, node);
        }

        let binding = binding(node)?;

        let mut fields = Vec::new();
        for (key, rule) in node {
            if is_keyword(key) {
                continue;
            }
            fields.push(self.plan_field(key, rule)?);
        }

        let filter = self.optional_expression(node, FILTER_KEY)?;
        let sort = self.optional_expression(node, SORT_KEY)?;
        let reverse = match node.get(REVERSE_KEY) {
            None => None,
            Some(Value::Bool(flag)) => Some(Reverse::Literal(*flag)),
            Some(source @ Value::String(_)) => {
                Some(Reverse::Expr(self.expression(REVERSE_KEY, source)?))
            }
            Some(_) => {
                return Err(EvalError::structure(
                    REVERSE_KEY,
                    "expected a boolean or an expression string",
                ))
            }
        };
        let projection = projection(node)?;
        let item = node.get(ITEM_KEY).map(item_selector).transpose()?;

        Ok(NodePlan {
            binding,
            fields,
            filter,
            sort,
            reverse,
            projection,
            item,
        })
    }

    fn expand_helper(
        &mut self,
        helper: &Value,
        node: &Map<String, Value>,
    ) -> EvalResult<NodePlan> {
        let Value::String(name) = helper else {
            return Err(EvalError::structure(HELPER_KEY, "expected a helper name"));
        };
        if self.helpers.iter().any(|h| h == name) {
            let mut chain = self.helpers.join(" -> ");
            chain.push_str(" -> ");
            chain.push_str(name);
            return Err(EvalError::structure(
                HELPER_KEY,
                format!("helper cycle ({})", chain),
            ));
        }

        let merged = helper_schema(self.store, name, node)
            .map_err(|e| EvalError::store(HELPER_KEY, e))?;
        debug!(helper = %name, keys = merged.len(), "expanded helper");

        self.helpers.push(name.clone());
        let plan = self.plan_node(&merged);
        self.helpers.pop();
        plan
    }

    fn plan_field(&mut self, key: &str, rule: &Value) -> EvalResult<FieldPlan> {
        let target = field_key(key)?;
        let rules = match rule {
            Value::Array(items) => {
                if items.is_empty() {
                    return Err(EvalError::structure(key, "rule list must not be empty"));
                }
                items
                    .iter()
                    .map(|item| self.plan_rule(key, item))
                    .collect::<EvalResult<Vec<_>>>()?
            }
            single => vec![self.plan_rule(key, single)?],
        };
        Ok(FieldPlan {
            key: key.to_string(),
            target,
            rules,
        })
    }

    fn plan_rule(&mut self, key: &str, rule: &Value) -> EvalResult<Rule> {
        match rule {
            Value::String(_) => Ok(Rule::Expr(self.expression(key, rule)?)),
            Value::Object(node) => self
                .plan_node(node)
                .map(|plan| Rule::Node(Box::new(plan)))
                .map_err(|e| e.with_prefix(key)),
            _ => Err(EvalError::structure(
                key,
                "rule must be an expression string or a schema node",
            )),
        }
    }

    fn optional_expression(
        &mut self,
        node: &Map<String, Value>,
        key: &str,
    ) -> EvalResult<Option<Arc<Expression>>> {
        node.get(key)
            .map(|source| self.expression(key, source))
            .transpose()
    }

    fn expression(&mut self, path: &str, source: &Value) -> EvalResult<Arc<Expression>> {
        let Value::String(text) = source else {
            return Err(EvalError::structure(path, "expected an expression string"));
        };
        if text.trim().is_empty() {
            return Err(EvalError::structure(path, "empty expression"));
        }
        self.cache
            .get_or_compile(text)
            .map_err(|e| EvalError::expression(path, e))
    }
}

fn binding(node: &Map<String, Value>) -> EvalResult<Binding> {
    match (node.get(NAME_KEY), node.get(FROM_KEY)) {
        (Some(_), Some(_)) => Err(EvalError::structure(
            NAME_KEY,
            "__name__ and __from__ cannot both be defined",
        )),
        (Some(name), None) => match name {
            Value::String(name) if is_identifier(name) => Ok(Binding::Name(name.clone())),
            _ => Err(EvalError::structure(NAME_KEY, "expected an identifier")),
        },
        (None, Some(from)) => {
            let parsed = match from {
                Value::String(text) => name_pair(text),
                _ => None,
            };
            let (alias, entity) = parsed.ok_or_else(|| {
                EvalError::structure(FROM_KEY, "expected \"alias:Entity\" or \"Entity\"")
            })?;
            Ok(Binding::From { alias, entity })
        }
        (None, None) => Ok(Binding::Fresh),
    }
}

fn projection(node: &Map<String, Value>) -> EvalResult<Projection> {
    let only = string_list(node, ONLY_KEY)?;
    let except = string_list(node, EXCEPT_KEY)?;
    let rename = string_list(node, RENAME_KEY)?;

    if let Some(only) = only {
        if except.is_some() {
            return Err(EvalError::structure(
                ONLY_KEY,
                "__only__ and __except__ cannot both be defined",
            ));
        }
        if rename.is_some() {
            return Err(EvalError::structure(
                ONLY_KEY,
                "__only__ and __rename__ cannot both be defined",
            ));
        }
        let mut keep = Vec::with_capacity(only.len());
        let mut renames = Vec::new();
        for entry in only {
            let (outer, inner) = name_pair(entry)
                .ok_or_else(|| EvalError::structure(ONLY_KEY, format!("invalid name '{}'", entry)))?;
            if let Some(outer) = outer {
                renames.push((inner.clone(), outer));
            }
            keep.push(inner);
        }
        return Ok(Projection {
            selection: Selection::Only(keep),
            renames,
        });
    }

    let selection = match except {
        Some(names) => {
            if let Some(bad) = names.iter().find(|name| !is_identifier(name)) {
                return Err(EvalError::structure(
                    EXCEPT_KEY,
                    format!("invalid name '{}'", bad),
                ));
            }
            Selection::Except(names.iter().map(|name| name.to_string()).collect())
        }
        None => Selection::All,
    };

    let mut renames = Vec::new();
    for entry in rename.unwrap_or_default() {
        match name_pair(entry) {
            Some((Some(outer), inner)) => renames.push((inner, outer)),
            _ => {
                return Err(EvalError::structure(
                    RENAME_KEY,
                    format!("expected \"outer:inner\", got '{}'", entry),
                ))
            }
        }
    }

    Ok(Projection { selection, renames })
}

fn string_list<'n>(node: &'n Map<String, Value>, key: &str) -> EvalResult<Option<Vec<&'n str>>> {
    let Some(value) = node.get(key) else {
        return Ok(None);
    };
    let invalid = || EvalError::structure(key, "expected a list of strings");
    let Value::Array(items) = value else {
        return Err(invalid());
    };
    items
        .iter()
        .map(|item| item.as_str().ok_or_else(invalid))
        .collect::<EvalResult<Vec<_>>>()
        .map(Some)
}

fn item_selector(value: &Value) -> EvalResult<ItemSelector> {
    let invalid = || EvalError::structure(ITEM_KEY, "expected a list of integers or nulls");
    let Value::Array(parts) = value else {
        return Err(invalid());
    };
    let bounds = parts
        .iter()
        .map(|part| match part {
            Value::Null => Ok(None),
            Value::Number(n) => n.as_i64().map(Some).ok_or_else(invalid),
            _ => Err(invalid()),
        })
        .collect::<EvalResult<Vec<_>>>()?;

    match bounds.as_slice() {
        [Some(index)] => Ok(ItemSelector::Index(*index)),
        [None] => Err(EvalError::structure(ITEM_KEY, "a single index cannot be null")),
        [start, stop] => Ok(ItemSelector::Slice {
            start: *start,
            stop: *stop,
            step: None,
        }),
        [start, stop, step] => Ok(ItemSelector::Slice {
            start: *start,
            stop: *stop,
            step: *step,
        }),
        _ => Err(EvalError::structure(
            ITEM_KEY,
            format!("expected 1 to 3 indices, got {}", bounds.len()),
        )),
    }
}

fn field_key(key: &str) -> EvalResult<FieldKey> {
    let captures = patterns::field_key()
        .captures(key)
        .ok_or_else(|| EvalError::structure(key, "invalid field key"))?;
    let name = captures[2].to_string();
    if captures.get(1).is_some() {
        Ok(FieldKey::Splice(name))
    } else {
        Ok(FieldKey::Plain(name))
    }
}

fn is_identifier(text: &str) -> bool {
    patterns::identifier().is_match(text)
}

/// Splits `"outer:inner"` or `"inner"`.
fn name_pair(text: &str) -> Option<(Option<String>, String)> {
    let captures = patterns::name_pair().captures(text)?;
    Some((
        captures.get(1).map(|m| m.as_str().to_string()),
        captures[2].to_string(),
    ))
}
