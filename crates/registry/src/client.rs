//! Land registry client

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::RegistryError;
use crate::types::RegistryRecord;

/// Endpoint and credential of one jurisdiction's registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEndpoint {
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
}

impl RegistryEndpoint {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

/// Ownership registry interface
///
/// Implementations:
/// - HttpRegistryClient: REST registries keyed by jurisdiction
/// - MockRegistry: fixed records for testing
#[async_trait]
pub trait OwnershipRegistry: Send + Sync {
    /// Whether a registry exists for the jurisdiction
    fn is_configured(&self, jurisdiction: &str) -> bool;

    /// Fetch the current ownership record for a registry reference
    async fn fetch_record(
        &self,
        jurisdiction: &str,
        registry_reference: &str,
    ) -> Result<RegistryRecord, RegistryError>;
}

/// HTTP client for jurisdiction registries
///
/// `GET {endpoint}/{registry_reference}` with bearer auth.
pub struct HttpRegistryClient {
    http: Client,
    endpoints: HashMap<String, RegistryEndpoint>,
    timeout: Duration,
}

impl HttpRegistryClient {
    pub fn new(
        endpoints: HashMap<String, RegistryEndpoint>,
        timeout: Duration,
    ) -> Result<Self, RegistryError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RegistryError::Request)?;

        Ok(Self {
            http,
            endpoints,
            timeout,
        })
    }

    /// Jurisdictions with a configured endpoint
    pub fn jurisdictions(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    fn record_url(endpoint: &str, reference: &str) -> Result<Url, RegistryError> {
        let invalid = |reason: String| RegistryError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        let mut url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot be a base URL".to_string()))?
            .pop_if_empty()
            .push(reference);
        Ok(url)
    }

    fn map_send_error(&self, error: reqwest::Error) -> RegistryError {
        if error.is_timeout() {
            RegistryError::Timeout(self.timeout.as_millis() as u64)
        } else {
            RegistryError::Request(error)
        }
    }
}

#[async_trait]
impl OwnershipRegistry for HttpRegistryClient {
    fn is_configured(&self, jurisdiction: &str) -> bool {
        self.endpoints.contains_key(jurisdiction)
    }

    async fn fetch_record(
        &self,
        jurisdiction: &str,
        registry_reference: &str,
    ) -> Result<RegistryRecord, RegistryError> {
        let config = self
            .endpoints
            .get(jurisdiction)
            .ok_or_else(|| RegistryError::NotConfigured(jurisdiction.to_string()))?;
        let url = Self::record_url(&config.endpoint, registry_reference)?;

        tracing::debug!(jurisdiction, %url, "Querying land registry");

        let response = self
            .http
            .get(url)
            .bearer_auth(&config.api_key)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RegistryError::Status {
                status: status.as_u16(),
                reference: registry_reference.to_string(),
            });
        }

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        serde_json::from_str(&body).map_err(|e| RegistryError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, timeout: Duration) -> HttpRegistryClient {
        let mut endpoints = HashMap::new();
        endpoints.insert(
            "UK".to_string(),
            RegistryEndpoint::new(format!("{}/titles", server.uri()), "secret-key"),
        );
        HttpRegistryClient::new(endpoints, timeout).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_record_with_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/titles/TITLE-123"))
            .and(header("authorization", "Bearer secret-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "current_owner_name": "Harbour SPV Ltd",
                "current_owner_id": "SPV-LTD-42",
                "last_modified_date": "2023-11-05",
                "status": "registered"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let record = client.fetch_record("UK", "TITLE-123").await.unwrap();

        assert_eq!(record.current_owner_id.as_deref(), Some("SPV-LTD-42"));
        assert_eq!(record.status.as_deref(), Some("registered"));
        assert!(record.last_modified_date.is_some());
    }

    #[tokio::test]
    async fn test_unconfigured_jurisdiction() {
        let server = MockServer::start().await;
        let client = client_for(&server, Duration::from_secs(5));

        assert!(client.is_configured("UK"));
        assert!(!client.is_configured("FR"));
        let result = client.fetch_record("FR", "X").await;
        assert!(matches!(result, Err(RegistryError::NotConfigured(j)) if j == "FR"));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let result = client.fetch_record("UK", "MISSING").await;

        assert!(matches!(result, Err(RegistryError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "current_owner_id": "SPV" }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_millis(50));
        let result = client.fetch_record("UK", "SLOW").await;

        assert!(matches!(result, Err(RegistryError::Timeout(50))));
    }

    #[tokio::test]
    async fn test_garbage_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let result = client.fetch_record("UK", "TITLE-123").await;

        assert!(matches!(result, Err(RegistryError::Decode(_))));
    }

    #[test]
    fn test_record_url_encodes_reference() {
        let url = HttpRegistryClient::record_url("https://registry.example/api/", "LOT 7/B").unwrap();
        assert_eq!(url.as_str(), "https://registry.example/api/LOT%207%2FB");
    }
}
