// gateway/http.rs - reqwest-backed gateway

use super::{api_url, decode_body, ApiRequest, Gateway, GatewayError, Method, RequestBody};
use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde_json::Value;

pub struct HttpGateway {
    client: Client,
    base_url: String,
    origin: String,
}

impl HttpGateway {
    pub fn new(config: &ClientConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("HTTP gateway initialized: base={}", config.api_base_url);

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            origin: config.api_origin.clone(),
        })
    }

    /// Absolute URL for `path`. A relative base such as `/api` is served from
    /// the configured origin.
    pub fn resolve(&self, path: &str) -> String {
        let url = api_url(&self.base_url, path);
        if url.starts_with("http://") || url.starts_with("https://") {
            url
        } else {
            format!("{}{}", self.origin.trim_end_matches('/'), url)
        }
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn request(&self, request: ApiRequest) -> Result<Value, GatewayError> {
        let url = self.resolve(&request.path);
        tracing::debug!("{:?} {}", request.method, url);

        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Delete => self.client.delete(&url),
        };

        let builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::File(file) => {
                let part = multipart::Part::bytes(file.bytes).file_name(file.file_name);
                let part = match file.mime {
                    Some(mime) => part.mime_str(&mime).map_err(|e| {
                        GatewayError::NetworkError(format!("Invalid MIME type '{}': {}", mime, e))
                    })?,
                    None => part,
                };
                builder.multipart(multipart::Form::new().part(file.field, part))
            }
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::NetworkError(format!("Request to {} timed out", url))
            } else {
                GatewayError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("{:?} {} failed: HTTP {}", request.method, url, status);
            return Err(GatewayError::HttpError {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::NetworkError(e.to_string()))?;
        decode_body(&bytes)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(base: &str) -> HttpGateway {
        let config = ClientConfig {
            api_base_url: base.to_string(),
            ..ClientConfig::default()
        };
        HttpGateway::new(&config).unwrap()
    }

    #[test]
    fn relative_base_uses_origin() {
        assert_eq!(gateway("/api").resolve("jobs"), "http://localhost/api/jobs");
    }

    #[test]
    fn absolute_base_is_used_as_is() {
        assert_eq!(
            gateway("https://calls.example.com/api").resolve("/precall-plans/p1"),
            "https://calls.example.com/api/precall-plans/p1"
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let config = ClientConfig {
            api_base_url: "http://127.0.0.1:9/api".to_string(),
            request_timeout: std::time::Duration::from_secs(2),
            ..ClientConfig::default()
        };
        let gateway = HttpGateway::new(&config).unwrap();
        let err = gateway.request(ApiRequest::get("/jobs")).await.unwrap_err();
        assert!(matches!(err, GatewayError::NetworkError(_)));
    }
}
