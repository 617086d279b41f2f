//! # twine
//!
//! A small HTTP framework: first-match routing, onion middleware, and
//! content-negotiated body decoding. Nothing more. Nothing less.
//!
//! ## The contract
//!
//! Routing is a flat list scanned in registration order — what you register
//! first answers first, and `:name` segments bind path parameters. Around
//! the matched handler twine wraps the middleware you installed, globally
//! or under a path prefix, in registration order: classic onion, before
//! logic outermost-first, after logic outermost-last.
//!
//! Bodies decode by declared content type — JSON, urlencoded forms,
//! multipart uploads, XML — into one structured shape, so a single typed
//! target (with serde aliases where the formats disagree on names) covers
//! all four.
//!
//! Failures have exactly one exit: the server's error boundary. A handler
//! or decoder error becomes one `500` response with body `"Error: "` plus
//! the message, logged once, never retried, never doubled.
//!
//! What twine leaves to others, deliberately: TLS, rate limiting and
//! slow-client protection (the fronting proxy's job), template engines and
//! serializers (bring your own bytes), process supervision (hand
//! [`Server::from_listener`] an inherited socket and run as many workers
//! as you like).
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use twine::{Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .get("/hello", hello)
//!         .get("/user/:userId/orders/:orderId", get_order);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn hello(req: Request) -> Response {
//!     let name = req.query_or("name", "Guest");
//!     Response::text(format!("Hello {name}"))
//! }
//!
//! async fn get_order(req: Request) -> Response {
//!     let user = req.param("userId").unwrap_or("unknown");
//!     let order = req.param("orderId").unwrap_or("unknown");
//!     Response::text(format!("Get Order {order} From {user}"))
//! }
//! ```
//!
//! Handlers that can fail return `Result` — the error crosses the boundary
//! and comes back as a 500:
//!
//! ```rust
//! use serde::Deserialize;
//! use twine::{Error, Request, Response};
//!
//! #[derive(Deserialize)]
//! struct Login {
//!     username: String,
//!     password: String,
//! }
//!
//! async fn login(req: Request) -> Result<Response, Error> {
//!     let login: Login = req.parse().await?;
//!     Ok(Response::text(format!("Login {} success", login.username)))
//! }
//! ```

mod body;
mod error;
mod handler;
mod method;
mod pattern;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use body::{DecodedBody, FilePart};
pub use error::Error;
pub use handler::{Handler, IntoOutcome, Outcome};
pub use http::StatusCode;
pub use method::Method;
pub use request::{Request, RequestBuilder};
pub use response::{ContentType, IntoResponse, Response};
pub use router::{RouteGroup, Router};
pub use server::Server;
