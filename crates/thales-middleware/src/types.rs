//! Common types used throughout the middleware pipeline.
//!
//! Requests arrive fully buffered. Responses carry a boxed body so the
//! same type can hold a rendered document or a streamed reader.

use std::io;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use http::StatusCode;
use http_body::Frame;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};

/// HTTP request type processed by the pipeline.
pub type Request = http::Request<Full<Bytes>>;

/// Response body type.
pub type Body = UnsyncBoxBody<Bytes, io::Error>;

/// HTTP response type produced by the pipeline.
pub type Response = http::Response<Body>;

/// A stream of body chunks, used for streamed fetch results.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, io::Error>> + Send + 'static>>;

/// Creates a body holding `bytes`.
pub fn full_body(bytes: impl Into<Bytes>) -> Body {
    Full::new(bytes.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Creates an empty body.
pub fn empty_body() -> Body {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Creates a body that forwards `stream` chunk by chunk.
pub fn stream_body(stream: ByteStream) -> Body {
    StreamBody::new(stream.map_ok(Frame::data)).boxed_unsync()
}

/// Buffers the request body.
pub async fn body_bytes(request: Request) -> Bytes {
    match request.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(never) => match never {},
    }
}

/// Constructors for common responses.
pub trait ResponseExt {
    /// A response with `status` and no body.
    fn empty(status: StatusCode) -> Response;

    /// `304 Not Modified` with no body.
    fn not_modified() -> Response;
}

impl ResponseExt for Response {
    fn empty(status: StatusCode) -> Response {
        let mut response = http::Response::new(empty_body());
        *response.status_mut() = status;
        response
    }

    fn not_modified() -> Response {
        Self::empty(StatusCode::NOT_MODIFIED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[tokio::test]
    async fn test_full_body_collects() {
        let body = full_body("hello");
        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(bytes, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_stream_body_concatenates_chunks() {
        let chunks: ByteStream = Box::pin(stream::iter(vec![
            Ok(Bytes::from_static(b"ab")),
            Ok(Bytes::from_static(b"cd")),
        ]));
        let bytes = stream_body(chunks).collect().await.unwrap().to_bytes();
        assert_eq!(bytes, Bytes::from_static(b"abcd"));
    }

    #[tokio::test]
    async fn test_body_bytes() {
        let request = http::Request::new(Full::new(Bytes::from_static(b"{}")));
        assert_eq!(body_bytes(request).await, Bytes::from_static(b"{}"));
    }

    #[test]
    fn test_not_modified_is_empty() {
        use http_body::Body as _;
        let response = Response::not_modified();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert!(response.body().is_end_stream());
    }
}
