use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::ExtractionError;

/// Status and body of an upstream response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outbound HTTP used by every strategy and the caption fetcher
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue a GET, following redirects
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<HttpResponse, ExtractionError>;

    /// POST a JSON body
    async fn post_json(
        &self,
        url: &str,
        headers: &HeaderMap,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, ExtractionError>;
}

/// Transport backed by a shared reqwest client
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &HttpConfig) -> crate::Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(proxy) = &config.proxy {
            tracing::debug!("Routing upstream requests through proxy: {}", proxy);
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    async fn read_response(
        result: reqwest::Result<reqwest::Response>,
    ) -> Result<HttpResponse, ExtractionError> {
        let response = result.map_err(|e| ExtractionError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ExtractionError::Network(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<HttpResponse, ExtractionError> {
        tracing::debug!("GET {}", url);
        let result = self.client.get(url).headers(headers.clone()).send().await;
        Self::read_response(result).await
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &HeaderMap,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, ExtractionError> {
        tracing::debug!("POST {}", url);
        let result = self
            .client
            .post(url)
            .headers(headers.clone())
            .json(body)
            .send()
            .await;
        Self::read_response(result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(302, "").is_success());
        assert!(!HttpResponse::new(429, "").is_success());
    }

    #[test]
    fn test_transport_builds_with_proxy() {
        let config = HttpConfig {
            proxy: Some("http://127.0.0.1:8080".to_string()),
            ..HttpConfig::default()
        };
        assert!(ReqwestTransport::new(&config).is_ok());
    }
}
