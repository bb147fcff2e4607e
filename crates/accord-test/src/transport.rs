//! An in-process [`Transport`] that hands requests straight to a
//! [`Dispatcher`].

use accord_client::{ClientError, ClientResult, PreparedRequest, RawResponse, Transport};
use accord_server::Dispatcher;
use async_trait::async_trait;
use uuid::Uuid;

/// Sends contract client calls to a dispatcher without a socket.
///
/// Requests go through the same encoding as over the network: multipart
/// bodies are serialized with a boundary and bodies are carried as bytes,
/// so the dispatcher sees exactly what a server would.
#[derive(Debug, Clone)]
pub struct InMemoryTransport {
    dispatcher: Dispatcher,
    boundary: String,
}

impl InMemoryTransport {
    /// Wraps a dispatcher.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            boundary: format!("accord-{}", Uuid::now_v7().simple()),
        }
    }

    /// Uses a fixed multipart boundary.
    #[must_use]
    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = boundary.into();
        self
    }

    /// Returns the wrapped dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn send(&self, request: PreparedRequest) -> ClientResult<RawResponse> {
        let request = request.into_universal(&self.boundary)?;
        let response = self
            .dispatcher
            .dispatch(request)
            .await
            .map_err(ClientError::transport)?;

        let (status, headers, body) = response.into_parts();
        let body = body.collect().await.map_err(ClientError::transport)?;
        Ok(RawResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}
