//! graphql types
//!
//! a graphql response may carry `data` and `errors` at the same time. neither
//! field is promoted to an error here; [`GraphQlResponse::into_strict`] is the
//! one place that turns operation errors into [`Error::GraphQl`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// graphql response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlResponse<T> {
    /// response data; may be partial when `errors` is non-empty
    pub data: Option<T>,
    /// operation-level errors, in server order
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
    /// top-level extensions (cost accounting and similar)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

impl<T> GraphQlResponse<T> {
    /// true if the response contains graphql errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// true if the response carries both data and errors
    pub fn is_partial(&self) -> bool {
        self.data.is_some() && self.has_errors()
    }

    /// first request id found in the error extensions
    pub fn request_id(&self) -> Option<&str> {
        self.errors.iter().find_map(GraphQlError::request_id)
    }

    /// data, or the error that explains its absence
    ///
    /// a response without data but with errors becomes [`Error::GraphQl`];
    /// one with neither becomes [`Error::MissingData`] naming `operation`.
    pub fn require_data(self, operation: &str) -> Result<T> {
        match self.data {
            Some(data) => Ok(data),
            None if !self.errors.is_empty() => Err(operation_error(self.errors, None, None, "")),
            None => Err(Error::MissingData {
                operation: operation.to_string(),
            }),
        }
    }
}

impl GraphQlResponse<serde_json::Value> {
    /// promote operation errors to [`Error::GraphQl`], keeping partial data
    pub fn into_strict(self, status: Option<u16>, body: &str) -> Result<Self> {
        if self.errors.is_empty() {
            return Ok(self);
        }
        Err(operation_error(self.errors, self.data, status, body))
    }
}

pub(crate) fn operation_error(
    errors: Vec<GraphQlError>,
    partial_data: Option<serde_json::Value>,
    status: Option<u16>,
    body: &str,
) -> Error {
    let message = errors
        .first()
        .map(|err| err.message.clone())
        .unwrap_or_else(|| "graphql operation failed".to_string());
    Error::GraphQl {
        status,
        errors,
        body: body.to_string(),
        message,
        partial_data: partial_data.filter(|data| !data.is_null()),
    }
}

/// graphql error entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlError {
    /// error message
    pub message: String,
    /// error locations in the query
    #[serde(default)]
    pub locations: Vec<GraphQlLocation>,
    /// response path
    #[serde(default)]
    pub path: Vec<serde_json::Value>,
    /// optional extensions payload
    #[serde(default)]
    pub extensions: Option<serde_json::Value>,
}

impl GraphQlError {
    /// status code reported in the extensions, if any
    pub fn status_code(&self) -> Option<u16> {
        let extensions = self.extensions.as_ref()?;
        ["statusCode", "status_code", "status"]
            .iter()
            .find_map(|key| extensions.get(*key)?.as_u64())
            .and_then(|code| u16::try_from(code).ok())
    }

    /// request id reported in the extensions, if any
    pub fn request_id(&self) -> Option<&str> {
        let extensions = self.extensions.as_ref()?;
        ["requestId", "request_id", "traceId"]
            .iter()
            .find_map(|key| extensions.get(*key)?.as_str())
    }
}

/// graphql error location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlLocation {
    /// line number (1-based)
    pub line: i64,
    /// column number (1-based)
    pub column: i64,
}

/// pull a request id out of an error body without caring about its shape
pub(crate) fn request_id_from_body(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorsOnly {
        #[serde(default)]
        errors: Vec<GraphQlError>,
    }

    let parsed: ErrorsOnly = serde_json::from_str(body).ok()?;
    parsed
        .errors
        .iter()
        .find_map(GraphQlError::request_id)
        .map(str::to_string)
}
