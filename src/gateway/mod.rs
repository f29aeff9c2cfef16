// gateway/mod.rs - HTTP gateway trait + URL resolution

mod http;
mod types;

pub use http::HttpGateway;
pub use types::{ApiRequest, FilePart, GatewayError, Method, RequestBody};

use async_trait::async_trait;
use serde_json::Value;

/// Transport seam between the stores and the backend API.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Issue one request and return the decoded JSON body.
    ///
    /// An empty 2xx body decodes to `Value::Null`.
    async fn request(&self, request: ApiRequest) -> Result<Value, GatewayError>;

    /// Gateway name, used in logs
    fn name(&self) -> &str;
}

/// Join `path` onto `base` with exactly one slash between them.
pub fn api_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}

pub(crate) fn decode_body(bytes: &[u8]) -> Result<Value, GatewayError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| GatewayError::DecodeError(e.to_string()))
}
