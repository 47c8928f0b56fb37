//! HTTP transport over reqwest.
//!
//! Builds one client from the connection settings: basic auth, proxy,
//! optional trust for self-signed certificates, and a request timeout.
//! The first configured host is used as the base URL; the full host list
//! stays available for operator diagnostics.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use export_types::ConnectConfig;

use crate::error::TransportError;
use crate::request::{ApiRequest, ApiResponse, Method, SearchTransport};

/// Production transport for Elasticsearch/OpenSearch-compatible backends.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl HttpTransport {
    /// Build a transport from the connection settings.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Connect` if no host is configured or the
    /// underlying client cannot be constructed.
    pub fn new(config: &ConnectConfig) -> Result<Self, TransportError> {
        let hosts = config.hosts();
        let base_url = hosts
            .first()
            .cloned()
            .ok_or_else(|| TransportError::Connect("no connection URL configured".to_string()))?;
        if hosts.len() > 1 {
            debug!(hosts = hosts.len(), "Multiple hosts configured, using the first");
        }
        if config.aws_enabled {
            // Signing happens in the host process plumbing; carried settings
            // are surfaced so a misconfiguration is visible in the logs.
            warn!(
                region = config.aws_region.as_deref().unwrap_or(""),
                "AWS request signing configured; delegated to the host transport"
            );
        }

        let mut builder = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .danger_accept_invalid_certs(config.accept_self_signed_certificates);

        if let Some(host) = &config.proxy_host {
            let port = config.proxy_port.unwrap_or(80);
            let mut proxy = reqwest::Proxy::all(format!("http://{}:{}", host, port))
                .map_err(|e| TransportError::Connect(format!("invalid proxy: {}", e)))?;
            if let (Some(user), Some(pass)) = (&config.proxy_username, &config.proxy_password) {
                proxy = proxy.basic_auth(user, pass);
            }
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Connect(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Base URL requests are issued against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl SearchTransport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(method = request.method.as_str(), url = %url, "Executing backend request");

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Put => self.client.put(&url),
            Method::Post => self.client.post(&url),
            Method::Delete => self.client.delete(&url),
        };

        if let Some(user) = &self.username {
            builder = builder.basic_auth(user, self.password.as_deref());
        }
        if let Some(body) = request.body {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, request.content_type)
                .body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(ApiResponse::new(status, body))
    }
}
