//! Request handler for the filter debug page.
//!
//! Takes a JSON request body and produces a status code plus JSON body, independent of
//! any HTTP server:
//!
//! ```json
//! {"mode": "text", "filter": "'cat'", "input": "a kitty"}        -> {"result": true}
//! {"mode": "records", "filter": "age>=3", "records": [{"age": 4}]}
//!                                 -> {"results": [{"age": 4, "result": true}]}
//! ```

use anyhow::{Context, anyhow};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use std::path::PathBuf;
use thiserror::Error;

use crate::dsl::AstNode;
use crate::engine::Engine;

#[derive(Debug, Error)]
pub enum DebugError {
    /// The request is missing something it needs (400).
    #[error("{0}")]
    BadRequest(&'static str),

    /// Anything else that went wrong while serving the request (500).
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl DebugError {
    pub fn status(&self) -> u16 {
        match self {
            DebugError::BadRequest(_) => 400,
            DebugError::Internal(_) => 500,
        }
    }
}

/// Status code and JSON body for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugResponse {
    pub status: u16,
    pub body: JsonValue,
}

#[derive(Debug, Clone, Default)]
pub struct DebugHandler {
    synonyms: Option<PathBuf>,
}

impl DebugHandler {
    /// The synonym file is read again for every request.
    pub fn new(synonyms: Option<PathBuf>) -> Self {
        Self { synonyms }
    }

    pub fn handle(&self, body: &str) -> DebugResponse {
        match self.respond(body) {
            Ok(body) => DebugResponse { status: 200, body },
            Err(err) => {
                if err.status() >= 500 {
                    tracing::warn!("Debug request failed: {}", err);
                }
                DebugResponse {
                    status: err.status(),
                    body: json!({ "error": err.to_string() }),
                }
            }
        }
    }

    fn respond(&self, body: &str) -> Result<JsonValue, DebugError> {
        let request: JsonValue =
            serde_json::from_str(body).context("Debug: request body is not valid JSON")?;

        let (Some(mode), Some(filter)) = (field(&request, "mode"), field(&request, "filter"))
        else {
            return Err(DebugError::BadRequest("Invalid request"));
        };
        let filter = filter
            .as_str()
            .ok_or_else(|| anyhow!("Debug: filter must be a string"))?;

        let engine = Engine::try_new(self.synonyms.as_deref())?;
        let tree = engine.parse(filter);

        match mode.as_str() {
            Some("text") => {
                let input =
                    field(&request, "input").ok_or(DebugError::BadRequest("No input text provided"))?;
                Ok(json!({ "result": engine.check(input, &tree) }))
            }
            Some("records") => {
                let Some(JsonValue::Array(records)) = field(&request, "records") else {
                    return Err(DebugError::BadRequest("No records provided"));
                };
                let results = records
                    .iter()
                    .map(|record| annotate(&engine, &tree, record))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(json!({ "results": results }))
            }
            _ => Err(DebugError::BadRequest("Invalid mode")),
        }
    }
}

/// Copy of `record` with a `result` field holding the match outcome.
///
/// Field order is kept; an existing `result` field is overwritten in place.
pub fn annotate(engine: &Engine, tree: &AstNode, record: &JsonValue) -> Result<JsonValue, DebugError> {
    let JsonValue::Object(fields) = record else {
        return Err(anyhow!("Debug: record is not an object: {}", record).into());
    };

    let mut fields = fields.clone();
    fields.insert("result".to_string(), JsonValue::Bool(engine.check(record, tree)));
    Ok(JsonValue::Object(fields))
}

/// A request field that is present and not null.
fn field<'a>(request: &'a JsonValue, name: &str) -> Option<&'a JsonValue> {
    request.get(name).filter(|value| !value.is_null())
}
