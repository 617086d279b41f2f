//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: structured tracing, request-id injection, and
//! authentication-header inspection.
//!
//! Composition is the classic onion: for a matched route the applicable
//! links wrap the handler in registration order, so the first-registered
//! link's before-logic runs first and its after-logic runs last.
//!
//! ```rust
//! use twine::middleware::{Middleware, Next};
//! use twine::{Error, Request, Response, Router};
//!
//! struct RequireToken;
//!
//! #[async_trait::async_trait]
//! impl Middleware for RequireToken {
//!     async fn handle(&self, req: Request, next: Next) -> Result<Response, Error> {
//!         if req.header("x-token").is_none() {
//!             // Short-circuit: the rest of the chain and the handler never run.
//!             return Ok(Response::status(twine::StatusCode::UNAUTHORIZED));
//!         }
//!         let mut res = next.run(req).await?;
//!         res.set_header("x-checked", "1");
//!         Ok(res)
//!     }
//! }
//!
//! # async fn hello(_req: Request) -> Response { Response::text("hi") }
//! let app = Router::new()
//!     .layer_at("/api", RequireToken)
//!     .get("/api/hello", hello);
//! ```
//!
//! Closures work too — anything `Fn(Request, Next) -> impl Future`:
//!
//! ```rust
//! # use twine::{Request, Router};
//! # use twine::middleware::Next;
//! let app = Router::new().layer(|req: Request, next: Next| async move {
//!     tracing::info!(path = req.path(), "before");
//!     let res = next.run(req).await;
//!     tracing::info!("after");
//!     res
//! });
//! ```

mod trace;

pub use trace::Trace;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Error;
use crate::handler::{BoxedHandler, Outcome};
use crate::request::Request;
use crate::response::Response;

/// One interceptor in the chain.
///
/// A link either consumes [`Next`] to proceed — and may inspect or modify
/// the response that comes back — or returns its own response without
/// calling it, short-circuiting everything downstream. Propagating an error
/// with `?` unwinds the chain straight to the server's error boundary; no
/// after-logic runs past the point of failure.
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    async fn handle(&self, req: Request, next: Next) -> Result<Response, Error>;
}

/// Blanket impl so plain async closures can act as middleware.
#[async_trait]
impl<F, Fut> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    async fn handle(&self, req: Request, next: Next) -> Result<Response, Error> {
        (self)(req, next).await
    }
}

/// The continuation: the links remaining after the current one, terminated
/// by the route handler.
///
/// Consumed by value — a link can invoke its continuation at most once, so
/// "exactly one response per request" holds by construction.
pub struct Next {
    chain: Arc<[Arc<dyn Middleware>]>,
    index: usize,
    handler: BoxedHandler,
}

impl Next {
    pub(crate) fn new(chain: Arc<[Arc<dyn Middleware>]>, handler: BoxedHandler) -> Self {
        Self { chain, index: 0, handler }
    }

    /// Runs the rest of the chain and the handler, yielding the response.
    pub async fn run(mut self, req: Request) -> Outcome {
        match self.chain.get(self.index).cloned() {
            Some(link) => {
                self.index += 1;
                link.handle(req, self).await
            }
            None => self.handler.call(req).await,
        }
    }
}
