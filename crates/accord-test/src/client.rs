//! Test client for in-memory dispatch.

use accord_client::{ClientOptions, ContractClient};
use accord_server::Dispatcher;
use bytes::Bytes;
use http::Method;

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;
use crate::transport::InMemoryTransport;

/// Base URL used by contract clients built from a [`TestClient`].
pub const TEST_BASE_URL: &str = "http://accord.test";

/// A client that sends requests straight to a [`Dispatcher`].
///
/// Requests go through route matching, validation, middleware, the handler
/// and the response pipeline exactly as they would behind a server, without
/// binding a port.
///
/// # Example
///
/// ```ignore
/// use accord_test::TestClient;
///
/// let client = TestClient::new(dispatcher);
/// let response = client.get("/posts/1").send().await;
/// response.assert_status(200).assert_json_field("id", &json!("1"));
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestClient {
    dispatcher: Dispatcher,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a test client over `dispatcher`.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            default_headers: Vec::new(),
        }
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Returns the wrapped dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Creates a GET request builder.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Creates a POST request builder.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Creates a PUT request builder.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Creates a PATCH request builder.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Creates a HEAD request builder.
    pub fn head(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::HEAD, uri)
    }

    /// Creates a request builder with a custom method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequestBuilder::new(method, uri))
    }

    /// Returns a [`ContractClient`] whose calls are dispatched in memory.
    ///
    /// Default headers of this test client become the contract client's
    /// base headers.
    pub fn contract_client(&self) -> ContractClient {
        self.contract_client_with(ClientOptions::new(TEST_BASE_URL))
    }

    /// Like [`TestClient::contract_client`], with explicit options.
    pub fn contract_client_with(&self, mut options: ClientOptions) -> ContractClient {
        for (name, value) in &self.default_headers {
            options.headers.set(name, value.as_str());
        }
        ContractClient::new(InMemoryTransport::new(self.dispatcher.clone()), options)
    }

    async fn send_internal(&self, builder: TestRequestBuilder) -> Result<TestResponse, TestError> {
        let request = builder.build()?;
        let response = self.dispatcher.dispatch(request).await?;
        TestResponse::from_universal(response).await
    }
}

/// A request builder bound to a test client.
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl<'a> TestClientRequest<'a> {
    fn new(client: &'a TestClient, builder: TestRequestBuilder) -> Self {
        let builder = client
            .default_headers
            .iter()
            .fold(builder, |builder, (name, value)| builder.header(name, value));
        Self { client, builder }
    }

    /// Sets a header on the request.
    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the Content-Type header.
    #[must_use]
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Sets the Authorization header with a Bearer token.
    #[must_use]
    pub fn bearer_token(mut self, token: impl AsRef<str>) -> Self {
        self.builder = self.builder.bearer_token(token);
        self
    }

    /// Sets the raw request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets the request body as JSON.
    #[must_use]
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sets the request body as a URL-encoded form.
    #[must_use]
    pub fn form<T: serde::Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.form(value);
        self
    }

    /// Sends the request and returns the response.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the dispatcher fails; use
    /// [`TestClientRequest::try_send`] to inspect those errors.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(err) => panic!("request should succeed: {err}"),
        }
    }

    /// Sends the request and returns a Result.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        self.client.send_internal(self.builder).await
    }
}
