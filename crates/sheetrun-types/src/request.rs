//! Inbound execution requests and their identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SheetrunError;

/// Opaque, unique token identifying one inbound execution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a fresh random request id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// JSON body accepted by `POST /execute`.
///
/// `script` is optional at the serde level so that a missing field is
/// reported as a validation error rather than a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteRequestBody {
    /// Untrusted script text.
    #[serde(default)]
    pub script: Option<String>,
}

impl ExecuteRequestBody {
    /// Parses a raw request body.
    ///
    /// # Errors
    ///
    /// Returns a `ClientInput` error if the body is not a JSON object with
    /// an optional string `script` field.
    pub fn from_json(body: &str) -> Result<Self, SheetrunError> {
        Self::from_slice(body.as_bytes())
    }

    /// Parses raw request bytes; invalid UTF-8 is a client error like any
    /// other malformed body.
    ///
    /// # Errors
    ///
    /// See [`ExecuteRequestBody::from_json`].
    pub fn from_slice(body: &[u8]) -> Result<Self, SheetrunError> {
        serde_json::from_slice(body)
            .map_err(|e| SheetrunError::client_input(format!("invalid request body: {e}")))
    }

    /// Validates the body and turns it into an [`ExecutionRequest`].
    ///
    /// # Errors
    ///
    /// Returns a `ClientInput` error if `script` is absent or blank.
    pub fn into_request(self) -> Result<ExecutionRequest, SheetrunError> {
        match self.script {
            Some(script) if !script.trim().is_empty() => Ok(ExecutionRequest::new(script)),
            Some(_) => Err(SheetrunError::client_input("the 'script' field is empty")),
            None => Err(SheetrunError::client_input("no 'script' was provided")),
        }
    }
}

/// One validated execution request. Immutable once created.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    script: String,
    request_id: RequestId,
}

impl ExecutionRequest {
    /// Creates a request with a freshly generated id.
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            request_id: RequestId::new(),
        }
    }

    /// The untrusted script body.
    pub fn script(&self) -> &str {
        &self.script
    }

    /// The request's unique id.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }
}
