//! Message bodies.
//!
//! A [`Body`] is absent, UTF-8 text, raw bytes, or a stream of byte chunks.
//! Streams are pulled by whoever consumes the body, so a slow transport
//! naturally slows the producer down.

use std::fmt;
use std::io;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, Stream, StreamExt};

use crate::{PlatformError, PlatformResult};

/// A boxed stream of body chunks.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, io::Error>> + Send + 'static>>;

/// The body of a universal request or response.
#[derive(Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Binary(Bytes),
    /// Chunks produced lazily.
    Stream(BodyStream),
}

impl Body {
    /// Creates a text body.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Creates a binary body.
    #[must_use]
    pub fn binary(bytes: impl Into<Bytes>) -> Self {
        Self::Binary(bytes.into())
    }

    /// Wraps a chunk stream.
    #[must_use]
    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, io::Error>> + Send + 'static,
    {
        Self::Stream(Box::pin(stream))
    }

    /// Creates a stream body from already available chunks.
    #[must_use]
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
        I::IntoIter: Send + 'static,
    {
        Self::stream(stream::iter(chunks.into_iter().map(Ok)))
    }

    /// Returns true for [`Body::Empty`] and zero-length text or bytes.
    ///
    /// Streams are never considered empty because their length is unknown.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.is_empty(),
            Self::Binary(bytes) => bytes.is_empty(),
            Self::Stream(_) => false,
        }
    }

    /// Returns true if the body is a stream.
    #[must_use]
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }

    /// Returns the length of a buffered body.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Empty => Some(0),
            Self::Text(text) => Some(text.len()),
            Self::Binary(bytes) => Some(bytes.len()),
            Self::Stream(_) => None,
        }
    }

    /// Returns the buffered bytes without consuming a stream.
    #[must_use]
    pub fn as_bytes(&self) -> Option<Bytes> {
        match self {
            Self::Empty => Some(Bytes::new()),
            Self::Text(text) => Some(Bytes::copy_from_slice(text.as_bytes())),
            Self::Binary(bytes) => Some(bytes.clone()),
            Self::Stream(_) => None,
        }
    }

    /// Clones a buffered body. Streams cannot be cloned.
    pub fn try_clone(&self) -> PlatformResult<Self> {
        match self {
            Self::Empty => Ok(Self::Empty),
            Self::Text(text) => Ok(Self::Text(text.clone())),
            Self::Binary(bytes) => Ok(Self::Binary(bytes.clone())),
            Self::Stream(_) => Err(PlatformError::StreamNotCloneable),
        }
    }

    /// Reads the whole body into memory.
    pub async fn collect(self) -> PlatformResult<Bytes> {
        match self {
            Self::Empty => Ok(Bytes::new()),
            Self::Text(text) => Ok(Bytes::from(text)),
            Self::Binary(bytes) => Ok(bytes),
            Self::Stream(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(buf.freeze())
            }
        }
    }

    /// Reads the whole body as UTF-8 text.
    pub async fn collect_text(self) -> PlatformResult<String> {
        match self {
            Self::Text(text) => Ok(text),
            other => {
                let bytes = other.collect().await?;
                String::from_utf8(bytes.to_vec()).map_err(|_| PlatformError::NotUtf8)
            }
        }
    }

    /// Buffers a streaming body, leaving other bodies untouched.
    pub async fn materialize(self) -> PlatformResult<Self> {
        if self.is_stream() {
            Ok(Self::Binary(self.collect().await?))
        } else {
            Ok(self)
        }
    }

    /// Converts the body into a chunk stream.
    #[must_use]
    pub fn into_stream(self) -> BodyStream {
        match self {
            Self::Empty => Box::pin(stream::empty()),
            Self::Text(text) => Box::pin(stream::once(async move { Ok(Bytes::from(text)) })),
            Self::Binary(bytes) => Box::pin(stream::once(async move { Ok(bytes) })),
            Self::Stream(stream) => stream,
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Body::Empty"),
            Self::Text(text) => f.debug_tuple("Body::Text").field(text).finish(),
            Self::Binary(bytes) => f.debug_tuple("Body::Binary").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Body::Stream(..)"),
        }
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Binary(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(Bytes::from(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_stream() {
        let body = Body::from_chunks(vec![Bytes::from_static(b"ab"), Bytes::from_static(b"cd")]);
        assert!(body.is_stream());
        assert_eq!(body.len(), None);
        assert_eq!(body.collect().await.unwrap(), Bytes::from_static(b"abcd"));
    }

    #[tokio::test]
    async fn test_collect_text_rejects_invalid_utf8() {
        let body = Body::binary(vec![0xff, 0xfe]);
        assert!(matches!(body.collect_text().await, Err(PlatformError::NotUtf8)));
    }

    #[tokio::test]
    async fn test_stream_error_propagates() {
        let body = Body::stream(stream::iter(vec![
            Ok(Bytes::from_static(b"a")),
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone")),
        ]));
        assert!(matches!(body.collect().await, Err(PlatformError::Body(_))));
    }

    #[tokio::test]
    async fn test_materialize_buffers_streams_only() {
        let text = Body::text("hello").materialize().await.unwrap();
        assert!(matches!(text, Body::Text(ref t) if t == "hello"));

        let streamed = Body::from_chunks(vec![Bytes::from_static(b"x")])
            .materialize()
            .await
            .unwrap();
        assert!(matches!(streamed, Body::Binary(ref b) if b.as_ref() == b"x"));
    }

    #[test]
    fn test_try_clone() {
        assert!(Body::text("a").try_clone().is_ok());
        assert!(matches!(
            Body::from_chunks(Vec::new()).try_clone(),
            Err(PlatformError::StreamNotCloneable)
        ));
    }

    #[test]
    fn test_is_empty() {
        assert!(Body::Empty.is_empty());
        assert!(Body::text("").is_empty());
        assert!(!Body::binary(vec![1]).is_empty());
        assert!(!Body::from_chunks(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn test_into_stream_round_trip() {
        let stream = Body::text("chunk").into_stream();
        let body = Body::Stream(stream);
        assert_eq!(body.collect_text().await.unwrap(), "chunk");
    }
}
