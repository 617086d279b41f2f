//! Built-in request-tracing middleware.

use std::time::Instant;

use async_trait::async_trait;
use tracing::info;

use crate::error::Error;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// Logs one line per request: method, path, response status, latency.
///
/// ```rust,no_run
/// use twine::{Router, middleware::Trace};
///
/// # async fn hello(_req: twine::Request) -> twine::Response { twine::Response::text("hi") }
/// let app = Router::new()
///     .layer(Trace)
///     .get("/hello", hello);
/// ```
///
/// Errors are not logged here — the server's error boundary owns that, and
/// logging them twice would double-report.
pub struct Trace;

#[async_trait]
impl Middleware for Trace {
    async fn handle(&self, req: Request, next: Next) -> Result<Response, Error> {
        let method = req.method();
        let path = req.path().to_owned();
        let start = Instant::now();

        let response = next.run(req).await?;

        info!(
            %method,
            path,
            status = response.status_code().as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "request",
        );
        Ok(response)
    }
}
