//! pqlmock - declarative mock-API schema evaluator
//!
//! A schema is a JSON tree of field rules. Each rule is a restricted
//! expression or a nested schema node; nodes may draw rows from JSON
//! entity files, filter, sort, project and index them. Responses are
//! built by applying a schema to a request environment.
//!
//! - [`expr`]: the expression language
//! - [`store`]: entity and helper sources
//! - [`evaluator`]: node planning and execution
//! - [`example`]: repeat-annotated example expansion
//! - [`request`]: request environment assembly
//! - [`observability`]: structured logging
//! - [`cli`]: `init`, `eval` and `start`

pub mod cli;
pub mod evaluator;
pub mod example;
pub mod expr;
pub mod observability;
mod patterns;
pub mod request;
pub mod store;
