//! HTTP transport backed by reqwest.

use crate::descriptor::{RequestDescriptor, TransportResponse};
use crate::error::{StoreError, StoreResult};
use crate::query::query_params;
use crate::transport::Transport;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

/// Sends descriptors over HTTP relative to a base URL.
///
/// `GET` and `DELETE` carry their data as query parameters; other methods
/// send the serialized payload as the body.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Uses a preconfigured client (timeouts, proxies, TLS).
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URLs pass through; relative ones are joined to the base.
    pub fn url_for(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn dispatch(&self, descriptor: RequestDescriptor) -> StoreResult<Value> {
        let mut headers = HeaderMap::new();
        descriptor.configure(&mut headers);

        let url = self.url_for(&descriptor.url);
        debug!(method = %descriptor.method, %url, background = descriptor.background, "sending request");

        let mut request = self
            .client
            .request(descriptor.method.clone(), &url)
            .headers(headers);

        if descriptor.method == Method::GET || descriptor.method == Method::DELETE {
            let params = query_params(&descriptor.wire_data());
            if !params.is_empty() {
                request = request.query(&params);
            }
        } else {
            request = request.body(descriptor.serialize());
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        descriptor.extract(&TransportResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}
