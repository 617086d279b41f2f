//! Minimal twine example — grouped routes, middleware, and a read timeout.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/api/hello
//!   curl http://localhost:3000/hello?name=roni
//!   curl http://localhost:3000/error

use std::time::Duration;

use twine::middleware::Next;
use twine::{Error, Request, Response, Router, Server};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let app = Router::new()
        .layer_at("/api", logging)
        .group("/api", |api| api.get("/hello", api_hello))
        .get("/hello", hello)
        .get("/error", always_fails);

    Server::bind("127.0.0.1:3000")
        .read_timeout(Duration::from_secs(5))
        .serve(app)
        .await
        .expect("server error");
}

// Before/after logic around every /api route.
async fn logging(req: Request, next: Next) -> Result<Response, Error> {
    tracing::info!(path = req.path(), "before processing request");
    let res = next.run(req).await;
    tracing::info!("after processing request");
    res
}

async fn api_hello(_req: Request) -> Response {
    Response::text("Hello world")
}

// GET /hello?name=roni — a missing query parameter falls back to a default.
async fn hello(req: Request) -> Response {
    let name = req.query_or("name", "Guest");
    Response::text(format!("Hello {name}"))
}

// GET /error — exercises the error boundary: 500, body "Error: Ups".
async fn always_fails(_req: Request) -> Result<Response, Error> {
    Err("Ups".into())
}
