//! Request router.
//!
//! A flat route list scanned in registration order — the first route whose
//! method and pattern both match wins. No trie, no precedence rules: what
//! you register first is what answers first. Build it once at startup; pass
//! it to [`Server::serve`](crate::Server::serve). Each registration call
//! returns `self` so the whole table chains.

use std::sync::Arc;

use http::StatusCode;

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{Middleware, Next};
use crate::pattern::Pattern;
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// ```rust
/// use twine::{Method, Request, Response, Router};
///
/// # async fn get_user(_: Request) -> Response { Response::text("") }
/// # async fn create_user(_: Request) -> Response { Response::text("") }
/// # async fn hello(_: Request) -> Response { Response::text("") }
/// let app = Router::new()
///     .on(Method::Get, "/user/:userId/orders/:orderId", get_user)
///     .post("/users", create_user)
///     .group("/api", |api| api.get("/hello", hello));
/// ```
pub struct Router {
    routes: Vec<Route>,
    layers: Vec<Layer>,
}

struct Route {
    method: Method,
    pattern: Pattern,
    handler: BoxedHandler,
}

/// A middleware registration; an empty prefix means global.
struct Layer {
    prefix: String,
    link: Arc<dyn Middleware>,
}

impl Layer {
    /// A scoped layer applies when its prefix is a path-prefix of the
    /// route's registered pattern, on segment boundaries — `/api` covers
    /// `/api` and `/api/hello`, never `/apifoo`.
    fn applies_to(&self, route_path: &str) -> bool {
        if self.prefix.is_empty() {
            return true;
        }
        route_path == self.prefix
            || route_path
                .strip_prefix(self.prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new(), layers: Vec::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `:name` syntax — `req.param("name")` retrieves them.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes.push(Route {
            method,
            pattern: Pattern::parse(path),
            handler: handler.into_boxed_handler(),
        });
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Get, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Post, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Put, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Delete, path, handler)
    }

    pub fn patch(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Patch, path, handler)
    }

    pub fn head(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Head, path, handler)
    }

    /// Install middleware for every route.
    pub fn layer(self, link: impl Middleware) -> Self {
        self.layer_at("", link)
    }

    /// Install middleware for routes under `prefix`.
    ///
    /// Links run in registration order regardless of scope: a global link
    /// registered before a scoped one wraps it.
    pub fn layer_at(mut self, prefix: &str, link: impl Middleware) -> Self {
        self.layers.push(Layer {
            prefix: normalize_prefix(prefix),
            link: Arc::new(link),
        });
        self
    }

    /// Register a block of routes under a shared path prefix.
    ///
    /// ```rust
    /// use twine::{Request, Response, Router};
    ///
    /// # async fn hello(_: Request) -> Response { Response::text("Hello World") }
    /// let app = Router::new().group("/api", |api| {
    ///     api.get("/hello", hello)
    ///        .get("/world", hello)
    /// });
    /// ```
    pub fn group(self, prefix: &str, configure: impl FnOnce(RouteGroup) -> RouteGroup) -> Self {
        let group = RouteGroup { prefix: normalize_prefix(prefix), router: self };
        configure(group).router
    }

    /// Routes one request: finds the first matching route, binds its path
    /// parameters, and runs the applicable middleware chain with the
    /// handler as terminus.
    ///
    /// A miss is a normal outcome — `Ok` with a bare 404. Errors out of the
    /// chain or handler propagate untouched; formatting them into responses
    /// is the server frontend's job, not ours.
    pub async fn dispatch(&self, mut req: Request) -> Result<Response, Error> {
        let method = req.method();
        let matched = self.routes.iter().find_map(|route| {
            if route.method != method {
                return None;
            }
            route.pattern.matches(req.path()).map(|params| (route, params))
        });

        let Some((route, params)) = matched else {
            return Ok(Response::status(StatusCode::NOT_FOUND));
        };
        req.set_params(params);

        let chain: Arc<[Arc<dyn Middleware>]> = self
            .layers
            .iter()
            .filter(|layer| layer.applies_to(route.pattern.raw()))
            .map(|layer| Arc::clone(&layer.link))
            .collect();

        Next::new(chain, Arc::clone(&route.handler)).run(req).await
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

// ── RouteGroup ────────────────────────────────────────────────────────────────

/// Registration scoped under a path prefix. Exists only while the group
/// closure runs; every call delegates to the owning [`Router`] with the
/// prefix prepended.
pub struct RouteGroup {
    prefix: String,
    router: Router,
}

impl RouteGroup {
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        let full = join(&self.prefix, path);
        self.router = self.router.on(method, &full, handler);
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Get, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Post, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Put, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Delete, path, handler)
    }

    /// Install middleware scoped to this group's prefix.
    pub fn layer(mut self, link: impl Middleware) -> Self {
        let prefix = self.prefix.clone();
        self.router = self.router.layer_at(&prefix, link);
        self
    }
}

fn normalize_prefix(prefix: &str) -> String {
    prefix.trim_end_matches('/').to_owned()
}

fn join(prefix: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        prefix.to_owned()
    } else {
        format!("{prefix}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn text(_req: Request) -> Response {
        Response::text("ok")
    }

    #[tokio::test]
    async fn first_registered_route_wins() {
        async fn param_route(req: Request) -> Response {
            Response::text(format!("param:{}", req.param("which").unwrap_or("")))
        }
        async fn literal_route(_req: Request) -> Response {
            Response::text("literal")
        }

        let app = Router::new()
            .get("/pick/:which", param_route)
            .get("/pick/literal", literal_route);

        let res = app.dispatch(Request::get("/pick/literal").build()).await.unwrap();
        assert_eq!(res.body(), b"param:literal");
    }

    #[tokio::test]
    async fn method_must_match_exactly() {
        let app = Router::new().get("/hello", text);

        let res = app.dispatch(Request::post("/hello").build()).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert!(res.body().is_empty());
    }

    #[tokio::test]
    async fn group_prefixes_every_registration() {
        let app = Router::new().group("/api", |api| api.get("/hello", text));

        let hit = app.dispatch(Request::get("/api/hello").build()).await.unwrap();
        assert_eq!(hit.status_code(), StatusCode::OK);

        let miss = app.dispatch(Request::get("/hello").build()).await.unwrap();
        assert_eq!(miss.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn scoped_layers_respect_segment_boundaries() {
        let layer = Layer {
            prefix: "/api".to_owned(),
            link: Arc::new(|req: Request, next: Next| async move { next.run(req).await }),
        };
        assert!(layer.applies_to("/api"));
        assert!(layer.applies_to("/api/hello"));
        assert!(!layer.applies_to("/apifoo"));
        assert!(!layer.applies_to("/web/hello"));
    }
}
