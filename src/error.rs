//! Unified error type.

/// Boxed error cause, as produced by the body decoders.
pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type carried by twine's fallible operations.
///
/// A missing route is not an `Error` — the router answers it with a 404
/// directly. Everything here propagates out of dispatch and crosses the
/// server's error boundary exactly once, where it becomes a 500 response
/// with body `"Error: " + <message>`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request body could not be decoded as the declared content type.
    #[error("decode {content_type}: {source}")]
    Decode {
        content_type: String,
        #[source]
        source: BoxError,
    },

    /// A failure raised by application logic.
    ///
    /// `From<&str>` and `From<String>` make the handler side read naturally:
    ///
    /// ```rust
    /// use twine::{Error, Request, Response};
    ///
    /// async fn flaky(_req: Request) -> Result<Response, Error> {
    ///     Err("Ups".into())
    /// }
    /// ```
    #[error("{0}")]
    Handler(String),

    /// Transport-level read or write failure mid-request.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn decode(content_type: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Decode { content_type: content_type.into(), source: source.into() }
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Self::Handler(msg.to_owned())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Self::Handler(msg)
    }
}
