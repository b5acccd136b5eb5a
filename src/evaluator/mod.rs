//! Schema Evaluator
//!
//! Turns a schema node (field rules plus control keywords) into JSON output.
//! The node is first planned (validated and compiled as a whole), then
//! executed through six phases per node: bind, map, filter, order,
//! project/rename, index. Nested nodes recurse with a copy of the
//! environment.
//!
//! # Usage
//!
//! ```ignore
//! use pqlmock::evaluator::{Environment, SchemaEvaluator};
//! use pqlmock::store::FileStore;
//!
//! let store = FileStore::new(Path::new("./data"));
//! let env = Environment::new().with("page", json!(1));
//! let rows = SchemaEvaluator::new(&store).apply(&env, &node)?;
//! ```

mod env;
mod errors;
mod executor;
mod filters;
mod indexing;
mod mapper;
mod planner;
mod projection;
mod sorter;

pub use env::{Environment, IT};
pub use errors::{EvalError, EvalErrorCode, EvalResult};
pub use executor::{apply_schema, SchemaEvaluator};
pub use mapper::splice_key;
pub use planner::{
    is_keyword, Binding, FieldKey, FieldPlan, ItemSelector, NodePlan, NodePlanner, Projection,
    Reverse, Rule, Selection, KEYWORDS,
};
