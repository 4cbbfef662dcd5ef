//! HTTP transport to a VROOM server.
//!
//! [`OptimizationEngine`](fieldroute_core::OptimizationEngine) is
//! synchronous so the core stays embeddable in blocking callers. The
//! client bridges to `reqwest` by blocking on a Tokio runtime it owns.
//!
//! # Example
//!
//! ```no_run
//! use fieldroute_vroom::{SolverTransport, VroomClient, VroomRequest};
//!
//! let client = VroomClient::new("http://localhost:3000")?;
//! let request = VroomRequest { vehicles: Vec::new(), jobs: Vec::new(), options: None };
//! let response = client.solve(&request)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::Duration;

use fieldroute_core::OptimizationError;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

use crate::wire::{VroomRequest, VroomResponse};

/// Sends a request to the solver and returns its answer.
///
/// Implementations must report a body with a non-zero `code` as
/// [`OptimizationError::ServiceError`].
pub trait SolverTransport: Send + Sync {
    /// Solve `request`.
    ///
    /// # Errors
    ///
    /// Returns an upstream error when the solver cannot be reached, times
    /// out, answers with a failure status or sends an undecodable body.
    fn solve(&self, request: &VroomRequest) -> Result<VroomResponse, OptimizationError>;
}

impl<T: SolverTransport + ?Sized> SolverTransport for &T {
    fn solve(&self, request: &VroomRequest) -> Result<VroomResponse, OptimizationError> {
        (**self).solve(request)
    }
}

/// Error building a [`VroomClient`].
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Default user agent for solver requests.
pub const DEFAULT_USER_AGENT: &str = "fieldroute-vroom/0.1";

/// Default solver address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`VroomClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VroomClientConfig {
    /// Solver address, e.g. `"http://localhost:3000"`.
    pub base_url: String,
    /// Connect and request timeout.
    pub timeout: Duration,
    /// User agent sent with each request.
    pub user_agent: String,
}

impl Default for VroomClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl VroomClientConfig {
    /// Configuration for the solver at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Blocking VROOM client.
///
/// # Runtime behaviour
///
/// Outside any Tokio runtime the client drives requests on its own
/// current-thread runtime. Inside a multi-threaded runtime it borrows the
/// caller's handle through [`tokio::task::block_in_place`]. Inside a
/// `current_thread` runtime it falls back to its own runtime, which blocks
/// the caller's executor for the duration of the request.
pub struct VroomClient {
    client: Client,
    config: VroomClientConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for VroomClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VroomClient")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl VroomClient {
    /// Client for the solver at `base_url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientBuildError> {
        Self::with_config(VroomClientConfig::new(base_url))
    }

    /// Client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: VroomClientConfig) -> Result<Self, ClientBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ClientBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ClientBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &VroomClientConfig {
        &self.config
    }

    /// The solver accepts requests at its root path.
    fn endpoint(&self) -> String {
        format!("{}/", self.config.base_url.trim_end_matches('/'))
    }

    async fn solve_async(&self, request: &VroomRequest) -> Result<VroomResponse, OptimizationError> {
        let url = self.endpoint();
        log::debug!(
            "posting {} vehicles and {} jobs to {url}",
            request.vehicles.len(),
            request.jobs.len()
        );
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;
        decode_response(&url, status, &body)
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> OptimizationError {
        if error.is_timeout() {
            return OptimizationError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return OptimizationError::HttpError {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        OptimizationError::NetworkError {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

/// Interpret a solver answer.
///
/// VROOM reports input errors with a 4xx status and a JSON body carrying a
/// non-zero `code`; those become service errors rather than HTTP errors.
fn decode_response(
    url: &str,
    status: StatusCode,
    body: &str,
) -> Result<VroomResponse, OptimizationError> {
    let parsed = serde_json::from_str::<VroomResponse>(body);
    if !status.is_success() {
        return Err(match parsed {
            Ok(response) if !response.is_ok() => service_error(response),
            _ => OptimizationError::HttpError {
                url: url.to_owned(),
                status: status.as_u16(),
                message: body.to_owned(),
            },
        });
    }
    let response = parsed.map_err(|err| OptimizationError::ParseError {
        message: err.to_string(),
    })?;
    if !response.is_ok() {
        return Err(service_error(response));
    }
    Ok(response)
}

fn service_error(response: VroomResponse) -> OptimizationError {
    OptimizationError::ServiceError {
        code: response.code,
        message: response.error.unwrap_or_default(),
    }
}

impl SolverTransport for VroomClient {
    /// # Runtime requirements
    ///
    /// Inside a Tokio runtime the runtime must be multi-threaded; a
    /// `current_thread` caller is blocked until the request completes.
    fn solve(&self, request: &VroomRequest) -> Result<VroomResponse, OptimizationError> {
        let future = self.solve_async(request);
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const URL: &str = "http://vroom.example.com/";

    #[rstest]
    #[case("http://vroom.example.com", "http://vroom.example.com/")]
    #[case("http://vroom.example.com/", "http://vroom.example.com/")]
    #[case("http://vroom.example.com/solve//", "http://vroom.example.com/solve/")]
    fn endpoint_has_single_trailing_slash(#[case] base: &str, #[case] expected: &str) {
        let client = VroomClient::new(base).expect("client should build");

        assert_eq!(client.endpoint(), expected);
    }

    #[rstest]
    fn success_body_is_decoded() {
        let body = r#"{"code": 0, "routes": [], "unassigned": [{"id": 4}]}"#;

        let response = decode_response(URL, StatusCode::OK, body).expect("should decode");

        assert_eq!(response.unassigned.len(), 1);
    }

    #[rstest]
    #[case(StatusCode::OK)]
    #[case(StatusCode::BAD_REQUEST)]
    fn solver_codes_become_service_errors(#[case] status: StatusCode) {
        let body = r#"{"code": 2, "error": "Invalid shape for vehicle start"}"#;

        let err = decode_response(URL, status, body).expect_err("should fail");

        assert_eq!(
            err,
            OptimizationError::ServiceError {
                code: 2,
                message: "Invalid shape for vehicle start".to_owned(),
            }
        );
    }

    #[rstest]
    fn opaque_failures_keep_the_status() {
        let err = decode_response(URL, StatusCode::BAD_GATEWAY, "upstream down")
            .expect_err("should fail");

        assert_eq!(
            err,
            OptimizationError::HttpError {
                url: URL.to_owned(),
                status: 502,
                message: "upstream down".to_owned(),
            }
        );
    }

    #[rstest]
    fn malformed_success_body_is_a_parse_error() {
        let err = decode_response(URL, StatusCode::OK, "{").expect_err("should fail");

        assert!(matches!(err, OptimizationError::ParseError { .. }));
    }

    #[rstest]
    fn unreachable_solver_is_a_network_error() {
        let config = VroomClientConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_secs(2));
        let client = VroomClient::with_config(config).expect("client should build");
        let request = VroomRequest {
            vehicles: Vec::new(),
            jobs: Vec::new(),
            options: None,
        };

        let err = client.solve(&request).expect_err("nothing listens on port 9");

        assert!(matches!(
            err,
            OptimizationError::NetworkError { .. } | OptimizationError::Timeout { .. }
        ));
    }

    #[rstest]
    fn config_builder_pattern() {
        let config = VroomClientConfig::new("http://example.com")
            .with_timeout(Duration::from_secs(60))
            .with_user_agent("test-agent/1.0");

        assert_eq!(config.base_url, "http://example.com");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, "test-agent/1.0");
    }
}
