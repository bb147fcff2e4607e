//! # Accord Test
//!
//! In-memory testing for Accord services: requests reach a
//! [`Dispatcher`](accord_server::Dispatcher) without a socket, and run
//! through matching, validation, middleware, the handler and the response
//! pipeline exactly as they would in production.
//!
//! - [`TestClient`] - raw requests with fluent builders
//! - [`TestResponse`] - the collected response, with assertions
//! - [`InMemoryTransport`] - plugs a [`ContractClient`](accord_client::ContractClient)
//!   into a dispatcher, so both halves of a contract can be exercised in
//!   one test
//!
//! ## Example
//!
//! ```ignore
//! use accord_client::RequestArgs;
//! use accord_test::TestClient;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_get_post() {
//!     let client = TestClient::new(dispatcher());
//!
//!     client
//!         .get("/posts/1")
//!         .send()
//!         .await
//!         .assert_status(200)
//!         .assert_json_field("id", &json!("1"));
//!
//!     let api = client.contract_client();
//!     let response = api
//!         .call_path(&contract(), "posts.getPost", RequestArgs::new().param("id", "1"))
//!         .await
//!         .unwrap();
//!     assert_eq!(response.status, 200);
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/accord-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;
mod transport;

pub use client::{TestClient, TestClientRequest, TEST_BASE_URL};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
pub use transport::InMemoryTransport;
