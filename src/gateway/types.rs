// gateway/types.rs - Request shapes and error taxonomy for backend calls

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// A single file sent as one multipart field.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    File(FilePart),
}

/// A root-relative API call. The gateway resolves `path` against its base.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: RequestBody::Empty,
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            body: RequestBody::Empty,
        }
    }

    pub fn post_json(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: RequestBody::Json(body),
        }
    }

    pub fn post_file(path: impl Into<String>, part: FilePart) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: RequestBody::File(part),
        }
    }

    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            RequestBody::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Gateway failures. Every one of them is recovered by the calling store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// The request never reached the server or the response never arrived.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The server answered outside 2xx. The body is not inspected.
    #[error("HTTP error: status {status}")]
    HttpError { status: u16 },

    /// A 2xx response whose body is not valid JSON.
    #[error("Decode error: {0}")]
    DecodeError(String),
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::HttpError { status: 404 })
    }
}
