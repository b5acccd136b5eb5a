//! Request handling shared by `eval` and `start`
//!
//! Request line:
//! - `{"op": "render", "schema": {...}, "request": {...}, "env": {...}}`
//!   (`op` defaults to `render`)
//! - `{"op": "example", "example": <json>}`
//!
//! Every request gets exactly one response; failures are reported in the
//! response, never by ending the session.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::evaluator::{EvalError, SchemaEvaluator};
use crate::example::{CursorRegistry, ExampleError, ExampleExpander};
use crate::observability::{log_event, log_event_with_fields, Event};
use crate::request::RequestData;
use crate::store::SourceStore;

use super::errors::CliError;

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum Request {
    Render {
        schema: Value,
        #[serde(default)]
        request: RequestData,
        #[serde(default)]
        env: Map<String, Value>,
    },
    Example {
        example: Value,
    },
}

/// One response line
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Ok(Value),
    Error {
        code: String,
        path: String,
        message: String,
    },
}

impl Response {
    pub fn to_json(&self) -> Value {
        match self {
            Response::Ok(data) => json!({"status": "ok", "data": data}),
            Response::Error {
                code,
                path,
                message,
            } => json!({
                "status": "error",
                "code": code,
                "path": path,
                "message": message
            }),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok(_))
    }
}

impl From<EvalError> for Response {
    fn from(e: EvalError) -> Self {
        Response::Error {
            code: e.code().code().to_string(),
            path: e.path().to_string(),
            message: e.to_string(),
        }
    }
}

impl From<ExampleError> for Response {
    fn from(e: ExampleError) -> Self {
        Response::Error {
            code: e.code().to_string(),
            path: e.location().to_string(),
            message: e.to_string(),
        }
    }
}

impl From<CliError> for Response {
    fn from(e: CliError) -> Self {
        Response::Error {
            code: e.code_str().to_string(),
            path: String::new(),
            message: e.message().to_string(),
        }
    }
}

/// Session state: the store plus the example cursors that persist
/// across requests.
pub struct Session<S: SourceStore> {
    store: S,
    cursors: CursorRegistry,
    coerce_params: bool,
}

impl<S: SourceStore> Session<S> {
    pub fn new(store: S, coerce_params: bool) -> Self {
        Self {
            store,
            cursors: CursorRegistry::new(),
            coerce_params,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handles one decoded request line.
    pub fn handle(&mut self, request: Value) -> Response {
        let request = match decode(request) {
            Ok(request) => request,
            Err(e) => {
                log_event_with_fields(Event::RequestRejected, &[("reason", e.message())]);
                return e.into();
            }
        };

        match request {
            Request::Render {
                schema,
                request,
                env,
            } => self.render(&schema, request, env),
            Request::Example { example } => self.example(&example),
        }
    }

    fn render(&mut self, schema: &Value, request: RequestData, extra: Map<String, Value>) -> Response {
        let mut env = request.into_environment(self.coerce_params);
        for (name, value) in extra {
            env.bind(name, value);
        }

        match SchemaEvaluator::new(&self.store).apply(&env, schema) {
            Ok(data) => {
                log_event(Event::RenderComplete);
                Response::Ok(data)
            }
            Err(e) => {
                log_event_with_fields(
                    Event::RenderFailed,
                    &[("code", e.code().code()), ("path", e.path())],
                );
                e.into()
            }
        }
    }

    fn example(&mut self, example: &Value) -> Response {
        match ExampleExpander::new(&mut self.cursors).expand(example) {
            Ok(data) => {
                log_event(Event::ExampleExpanded);
                Response::Ok(data)
            }
            Err(e) => {
                log_event_with_fields(Event::RenderFailed, &[("code", e.code())]);
                e.into()
            }
        }
    }
}

/// Decodes a request, defaulting `op` to `render`.
fn decode(mut request: Value) -> Result<Request, CliError> {
    let Some(obj) = request.as_object_mut() else {
        return Err(CliError::bad_request("request must be a JSON object"));
    };
    if !obj.contains_key("op") {
        obj.insert("op".to_string(), json!("render"));
    }
    serde_json::from_value(request)
        .map_err(|e| CliError::bad_request(format!("invalid request: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn session() -> Session<MemoryStore> {
        let store = MemoryStore::new().with_entity(
            "Person",
            json!([{"id": 1, "name": "Ann"}, {"id": 2, "name": "Bob"}]),
        );
        Session::new(store, true)
    }

    #[test]
    fn test_render_defaults_op() {
        let response = session().handle(json!({
            "schema": {"__from__": "Person", "__filter__": "it['id'] == query['id']", "__only__": ["name"]},
            "request": {"query": {"id": "2"}}
        }));
        assert_eq!(response, Response::Ok(json!([{"name": "Bob"}])));
    }

    #[test]
    fn test_render_extra_env() {
        let response = session().handle(json!({
            "op": "render",
            "schema": {"n": "page * 2", "__item__": [0]},
            "env": {"page": 4}
        }));
        assert_eq!(response, Response::Ok(json!({"n": 8})));
    }

    #[test]
    fn test_render_error_response() {
        let response = session().handle(json!({"schema": {"__from__": "Ghost"}}));
        assert_eq!(
            response.to_json(),
            json!({
                "status": "error",
                "code": "PQL_NOT_FOUND",
                "path": "__from__",
                "message": "__from__: entity not found (Ghost)"
            })
        );
    }

    #[test]
    fn test_example_cursors_persist_in_session() {
        let mut session = session();
        let request = json!({"op": "example", "example": {"name": ["a", "b"]}});
        assert_eq!(session.handle(request.clone()), Response::Ok(json!({"name": "a"})));
        assert_eq!(session.handle(request), Response::Ok(json!({"name": "b"})));
    }

    #[test]
    fn test_bad_requests() {
        let mut session = session();
        let response = session.handle(json!([1]));
        assert_eq!(response.to_json()["code"], json!("CLI_BAD_REQUEST"));

        let response = session.handle(json!({"op": "delete"}));
        assert_eq!(response.to_json()["code"], json!("CLI_BAD_REQUEST"));

        let response = session.handle(json!({"op": "render"}));
        assert_eq!(response.to_json()["code"], json!("CLI_BAD_REQUEST"));
    }
}
