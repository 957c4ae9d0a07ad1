//! Main API client implementation

use crate::config::ClientConfig;
use crate::endpoints::{ComposersApi, WorksApi};
use crate::error::{ApiError, ApiResult, ErrorContext};
use catalog_core::retry::{CircuitBreaker, CircuitBreakerConfig, CircuitState, retry_async};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// Catalog API client with built-in resilience patterns
///
/// This client wraps `reqwest` and adds:
/// - Automatic retry with exponential backoff
/// - Circuit breaker to prevent cascading failures
/// - Request correlation IDs for tracing
#[derive(Clone)]
pub struct CatalogClient {
    inner: Client,
    config: Arc<ClientConfig>,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl CatalogClient {
    /// Create a new client with default configuration from environment
    pub fn new() -> ApiResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::with_config(config)
    }

    /// Create a new client with specific configuration
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        default_headers.insert(USER_AGENT, HeaderValue::from_static("catalog-api-client/0.3"));

        if let Some(ref token) = config.api_token {
            let value = HeaderValue::from_str(&format!("Token {token}"))
                .map_err(|_| ApiError::config("api_token contains invalid header characters"))?;
            default_headers.insert(AUTHORIZATION, value);
        }

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(ApiError::Request)?;

        Ok(Self {
            inner,
            config: Arc::new(config),
            circuit_breaker: Arc::new(CircuitBreaker::new(CircuitBreakerConfig::default())),
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Get circuit breaker state
    #[must_use]
    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    /// Reset the circuit breaker
    pub fn reset_circuit(&self) {
        self.circuit_breaker.reset();
    }

    // -------------------------------------------------------------------------
    // Endpoint API accessors
    // -------------------------------------------------------------------------

    /// Access composer list endpoints
    #[must_use]
    pub fn composers(&self) -> ComposersApi {
        ComposersApi::new(self.clone())
    }

    /// Access work list endpoints
    #[must_use]
    pub fn works(&self) -> WorksApi {
        WorksApi::new(self.clone())
    }

    // -------------------------------------------------------------------------
    // Low-level HTTP methods with resilience
    // -------------------------------------------------------------------------

    /// Perform a GET request with query parameters
    #[instrument(skip(self, query), fields(params = query.len()))]
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let url = self.endpoint_url(path);
        self.request_url(Method::GET, &url, query).await
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Execute a request to an absolute URL with full resilience patterns
    async fn request_url<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let request_id = Uuid::new_v4().to_string();

        if !self.circuit_breaker.can_execute() {
            warn!(
                request_id = %request_id,
                url = %url,
                "Circuit breaker is open, rejecting request"
            );
            return Err(ApiError::CircuitOpen);
        }

        let outcome = retry_async(&self.config.retry, ApiError::is_retryable, || {
            self.execute_single_request(&request_id, method.clone(), url, query)
        })
        .await;

        match outcome {
            Ok(done) => {
                debug!(
                    request_id = %request_id,
                    attempts = done.attempts,
                    elapsed_ms = done.total_duration.as_millis(),
                    "Request succeeded"
                );
                Ok(done.value)
            }
            Err(failure) => {
                let context = ErrorContext {
                    request_id: Some(request_id.clone()),
                    endpoint: url.to_string(),
                    method: method.to_string(),
                };
                debug!(context = %context, attempts = failure.attempts, error = %failure.last_error, "Request failed");

                if failure.attempts > 1 && failure.last_error.is_retryable() {
                    Err(ApiError::RetriesExhausted {
                        attempts: failure.attempts,
                        last_error: failure.last_error.to_string(),
                    })
                } else {
                    Err(failure.last_error)
                }
            }
        }
    }

    /// Execute a single request without retry
    async fn execute_single_request<T: DeserializeOwned>(
        &self,
        request_id: &str,
        method: Method,
        url: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let result = async {
            let response = self
                .inner
                .request(method, url)
                .header(X_REQUEST_ID, request_id)
                .query(query)
                .send()
                .await?;
            Self::handle_response(response).await
        }
        .await;

        match &result {
            Ok(_) => self.circuit_breaker.record_success(),
            // Client errors say nothing about backend health
            Err(e) if e.is_client_error() => {}
            Err(_) => self.circuit_breaker.record_failure(),
        }
        result
    }

    /// Handle HTTP response and deserialize
    async fn handle_response<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await?;
            Ok(serde_json::from_slice(&bytes)?)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(ApiError::api_response(status.as_u16(), message))
        }
    }
}
