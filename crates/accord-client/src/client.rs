//! The contract client.

use std::sync::Arc;
use std::time::Duration;

use accord_config::ClientConfig;
use accord_core::{Route, Router};
use accord_telemetry::metrics;
use tracing::{debug, warn};

use crate::args::{HeaderLayer, RequestArgs};
use crate::builder::{prepare_request, BuildSettings, PreparedRequest};
use crate::classify::{classify, ClassifyOptions, ClientResponse};
use crate::error::{ClientError, ClientResult};
use crate::transport::{RawResponse, ReqwestTransport, Transport};

/// Client settings.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Base URL every route path is appended to.
    pub base_url: String,
    /// Encode query values as JSON texts.
    pub json_query: bool,
    /// Return undeclared statuses as errors.
    pub throw_on_unknown_status: bool,
    /// Validate declared responses against their schemas.
    pub validate_response: bool,
    /// Per-call timeout.
    pub timeout: Option<Duration>,
    /// Headers sent with every call; the lowest-precedence layer.
    pub headers: HeaderLayer,
}

impl ClientOptions {
    /// Creates options for `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl From<&ClientConfig> for ClientOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            json_query: config.json_query,
            throw_on_unknown_status: config.throw_on_unknown_status,
            validate_response: config.validate_response,
            timeout: config.timeout_ms.map(Duration::from_millis),
            headers: config
                .headers
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str()))
                .collect(),
        }
    }
}

/// Calls routes of a contract and classifies the answers.
///
/// # Example
///
/// ```no_run
/// use accord_client::{ContractClient, RequestArgs};
/// use accord_core::{ResponseSpec, Route};
///
/// # async fn run() -> Result<(), accord_client::ClientError> {
/// let route = Route::get("/posts/:id")
///     .response(200, ResponseSpec::json_unchecked())
///     .build()
///     .expect("valid route");
///
/// let client = ContractClient::builder("https://api.example.com").build();
/// let response = client.call(&route, RequestArgs::new().param("id", 1)).await?;
/// println!("{} {:?}", response.status, response.body);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ContractClient {
    transport: Arc<dyn Transport>,
    options: ClientOptions,
}

impl ContractClient {
    /// Creates a client over `transport`.
    pub fn new(transport: impl Transport + 'static, options: ClientOptions) -> Self {
        Self {
            transport: Arc::new(transport),
            options,
        }
    }

    /// Starts a builder using the `reqwest` transport.
    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            transport: None,
            options: ClientOptions::new(base_url),
        }
    }

    /// Returns the client's options.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Builds the request for a call without sending it.
    pub fn prepare(&self, route: &Route, args: &RequestArgs) -> ClientResult<PreparedRequest> {
        prepare_request(
            route,
            args,
            BuildSettings {
                base_url: &self.options.base_url,
                json_query: self.options.json_query,
                base_headers: &self.options.headers,
            },
        )
    }

    /// Calls `route`.
    ///
    /// The call is aborted with [`ClientError::Cancelled`] when the
    /// arguments' cancellation token fires, and with
    /// [`ClientError::Timeout`] when the configured timeout elapses. It is
    /// never retried.
    pub async fn call(&self, route: &Route, args: RequestArgs) -> ClientResult<ClientResponse> {
        let prepared = self.prepare(route, &args)?;
        let label = format!("{} {}", route.method(), route.path());
        debug!(route = %label, url = %prepared.url, "sending request");

        let raw = match args.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    () = token.cancelled() => {
                        debug!(route = %label, "request cancelled");
                        return Err(ClientError::Cancelled);
                    }
                    result = self.send(prepared) => result?,
                }
            }
            None => self.send(prepared).await?,
        };

        let status = raw.status;
        let options = ClassifyOptions {
            validate_response: self.options.validate_response,
            throw_on_unknown_status: self.options.throw_on_unknown_status,
        };
        let result = classify(route, raw, options).await;

        match &result {
            Ok(response) => {
                metrics::record_client_request(&label, status, response.kind.is_declared());
            }
            Err(error) => {
                metrics::record_client_request(&label, status, false);
                warn!(route = %label, status, error = %error, "response rejected");
            }
        }
        result
    }

    /// Calls the route at dotted `key_path` in `contract`.
    pub async fn call_path(
        &self,
        contract: &Router,
        key_path: &str,
        args: RequestArgs,
    ) -> ClientResult<ClientResponse> {
        let keys: Vec<&str> = key_path.split('.').collect();
        let route = contract
            .route(&keys)
            .ok_or_else(|| ClientError::UnknownRoute {
                path: key_path.to_string(),
            })?;
        self.call(route, args).await
    }

    async fn send(&self, prepared: PreparedRequest) -> ClientResult<RawResponse> {
        match self.options.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.transport.send(prepared))
                .await
                .map_err(|_| ClientError::Timeout {
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                })?,
            None => self.transport.send(prepared).await,
        }
    }
}

/// Builder for [`ContractClient`].
#[derive(Debug)]
pub struct ClientBuilder {
    transport: Option<Arc<dyn Transport>>,
    options: ClientOptions,
}

impl ClientBuilder {
    /// Uses `transport` instead of `reqwest`.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Replaces every option except the base URL.
    pub fn options(mut self, options: ClientOptions) -> Self {
        let base_url = std::mem::take(&mut self.options.base_url);
        self.options = ClientOptions { base_url, ..options };
        self
    }

    /// Encodes query values as JSON texts.
    pub fn json_query(mut self, enabled: bool) -> Self {
        self.options.json_query = enabled;
        self
    }

    /// Returns undeclared statuses as errors.
    pub fn throw_on_unknown_status(mut self, enabled: bool) -> Self {
        self.options.throw_on_unknown_status = enabled;
        self
    }

    /// Validates declared responses.
    pub fn validate_response(mut self, enabled: bool) -> Self {
        self.options.validate_response = enabled;
        self
    }

    /// Sets the per-call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Adds a base header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.headers.set(name, value.into());
        self
    }

    /// Builds the client.
    pub fn build(self) -> ContractClient {
        ContractClient {
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(ReqwestTransport::default())),
            options: self.options,
        }
    }
}
