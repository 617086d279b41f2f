//! HTTP server frontend: accept loop, error boundary, graceful shutdown.
//!
//! # The error boundary
//!
//! Every failure that escapes [`Router::dispatch`] — a decode failure, a
//! handler error, a mid-request transport error — is caught here exactly
//! once, logged, and turned into a `500` whose body is `"Error: "` plus the
//! error's message. Nothing else in the crate formats error responses, so
//! an error can never be double-reported or answered twice.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** (what an orchestrator sends) or **Ctrl-C** the server:
//! 1. Immediately stops `listener.accept()` — no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.
//!
//! # Running several frontends on one socket
//!
//! [`Server::from_listener`] accepts a pre-bound listener, so a supervisor
//! can bind once and hand the inherited socket to N identical worker
//! processes. The frontend keeps no cross-instance state — each worker
//! routes with its own `Router` and nothing is shared.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::Error;
use crate::request::{self, Request};
use crate::response::Response;
use crate::router::Router;

/// The HTTP server.
pub struct Server {
    bind: Bind,
    read_timeout: Option<Duration>,
}

enum Bind {
    Addr(SocketAddr),
    Listener(std::net::TcpListener),
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use twine::Server;
    /// let server = Server::bind("0.0.0.0:3000");
    /// ```
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { bind: Bind::Addr(addr), read_timeout: None }
    }

    /// Configures the server to accept on an already-bound listener — the
    /// shape a prefork supervisor hands its workers.
    pub fn from_listener(listener: std::net::TcpListener) -> Self {
        Self { bind: Bind::Listener(listener), read_timeout: None }
    }

    /// Bounds how long a connection may sit waiting for request headers,
    /// covering both the first request and keep-alive gaps. Unset by
    /// default.
    ///
    /// Write-side slow-client protection is the fronting proxy's job, not
    /// the framework's.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = match self.bind {
            Bind::Addr(addr) => TcpListener::bind(addr).await?,
            Bind::Listener(listener) => {
                listener.set_nonblocking(true)?;
                TcpListener::from_std(listener)?
            }
        };
        let read_timeout = self.read_timeout;

        // Wrap router in Arc so it can be shared across concurrent connection
        // tasks without copying the entire route table.
        let router = Arc::new(router);

        info!(addr = %listener.local_addr()?, "twine listening");

        // JoinSet tracks every spawned connection task so we can wait for
        // them all to finish during graceful shutdown.
        let mut tasks = tokio::task::JoinSet::new();

        // Pin the shutdown future so we can poll it in a loop.
        // Futures in Rust must not move in memory after the first poll — that
        // is what `Pin` enforces. `tokio::pin!` pins the future on the stack.
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // `biased` makes select! check arms top-to-bottom instead of
                // randomly. We check shutdown first so a SIGTERM immediately
                // stops accepting new connections, even if more are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    // TokioIo adapts tokio's AsyncRead/AsyncWrite to the hyper
                    // IO traits.
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // `service_fn` turns a plain async function into a
                        // hyper `Service`. The closure is called once per
                        // request on the connection, not once per connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { serve_request(router, req).await }
                        });

                        // `auto::Builder` transparently handles both HTTP/1.1
                        // and HTTP/2 — whatever the client negotiates.
                        let mut builder = ConnBuilder::new(TokioExecutor::new());
                        if let Some(timeout) = read_timeout {
                            builder
                                .http1()
                                .timer(TokioTimer::new())
                                .header_read_timeout(timeout);
                        }
                        if let Err(e) = builder.serve_connection(io, svc).await {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Drain: wait for every in-flight connection to finish before we return.
        while tasks.join_next().await.is_some() {}

        info!("twine stopped");
        Ok(())
    }

    /// Runs one request through `router` and the global error boundary,
    /// always yielding exactly one response.
    ///
    /// This is the same path live connections take; tests drive it directly
    /// instead of opening a socket:
    ///
    /// ```rust
    /// use twine::{Request, Response, Router, Server};
    ///
    /// # async fn hello(_req: Request) -> Response { Response::text("Hello World") }
    /// # async fn demo() {
    /// let app = Router::new().get("/", hello);
    /// let res = Server::respond(&app, Request::get("/").build()).await;
    /// assert_eq!(res.body(), b"Hello World");
    /// # }
    /// ```
    pub async fn respond(router: &Router, req: Request) -> Response {
        match router.dispatch(req).await {
            Ok(response) => response,
            Err(err) => error_response(&err),
        }
    }
}

/// The single point where errors become user-visible bodies.
fn error_response(err: &Error) -> Response {
    error!(%err, "request failed");
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .text(format!("Error: {err}"))
}

// ── Request glue ──────────────────────────────────────────────────────────────

/// Hot path for one request on a live connection.
///
/// The error type is [`Infallible`] — we handle all failures internally
/// (404, 405, 500) so hyper never sees an error.
async fn serve_request(
    router: Arc<Router>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    // The body is read in full before dispatch: decoding and handlers never
    // observe a partial body.
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            let err = Error::Io(std::io::Error::other(e));
            return Ok(error_response(&err).into_http());
        }
    };

    let Some(request) = request::from_hyper(&parts, body) else {
        return Ok(Response::status(StatusCode::METHOD_NOT_ALLOWED).into_http());
    };

    Ok(Server::respond(&router, request).await.into_http())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** (sent by process supervisors
/// and orchestrators) and **SIGINT** (Ctrl-C, for local dev). On Windows
/// only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    // `pending()` is a future that never resolves — on non-Unix platforms
    // the SIGTERM arm is effectively disabled.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
