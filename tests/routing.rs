//! Routing, parameter extraction, and the error boundary, driven in-process
//! through the same path live connections take.

use std::collections::BTreeMap;

use twine::{Error, Request, Response, Router, Server, StatusCode};

async fn root(_req: Request) -> Response {
    Response::text("Hello World")
}

async fn hello(req: Request) -> Response {
    let name = req.query_or("name", "Guest");
    Response::text(format!("Hello {name}"))
}

async fn request_info(req: Request) -> Response {
    let first = req.header("firstname").unwrap_or_default();
    let last = req.cookie("lastname").unwrap_or_default();
    Response::text(format!("Hello {first} {last}"))
}

async fn get_order(req: Request) -> Response {
    let user = req.param("userId").unwrap_or_default();
    let order = req.param("orderId").unwrap_or_default();
    Response::text(format!("Get Order {order} From {user}"))
}

async fn user_json(_req: Request) -> Response {
    let mut user = BTreeMap::new();
    user.insert("username", "roni");
    user.insert("name", "Roni Purwanto");
    Response::json(serde_json::to_vec(&user).unwrap())
}

async fn always_fails(_req: Request) -> Result<Response, Error> {
    Err("Ups".into())
}

#[tokio::test]
async fn routes_to_the_registered_handler() {
    let app = Router::new().get("/", root);

    let res = Server::respond(&app, Request::get("/").build()).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.body(), b"Hello World");
}

#[tokio::test]
async fn query_parameter_with_default() {
    let app = Router::new().get("/hello", hello);

    let res = Server::respond(&app, Request::get("/hello?name=roni").build()).await;
    assert_eq!(res.body(), b"Hello roni");

    let res = Server::respond(&app, Request::get("/hello").build()).await;
    assert_eq!(res.body(), b"Hello Guest");
}

#[tokio::test]
async fn headers_and_cookies_reach_the_handler() {
    let app = Router::new().get("/request", request_info);

    let req = Request::get("/request")
        .header("firstname", "Roni")
        .header("cookie", "lastname=Purwanto")
        .build();
    let res = Server::respond(&app, req).await;
    assert_eq!(res.body(), b"Hello Roni Purwanto");
}

#[tokio::test]
async fn path_parameters_bind_by_position() {
    let app = Router::new().get("/user/:userId/orders/:orderId", get_order);

    let res =
        Server::respond(&app, Request::get("/user/1/orders/12345").build()).await;
    assert_eq!(res.body(), b"Get Order 12345 From 1");
}

#[tokio::test]
async fn whitespace_stays_inside_one_segment() {
    let app = Router::new().get("/user/:userId/orders/:orderId", get_order);

    let res = Server::respond(
        &app,
        Request::get("/user/roni purwanto/orders/12345").build(),
    )
    .await;
    assert_eq!(res.body(), b"Get Order 12345 From roni purwanto");
}

#[tokio::test]
async fn unmatched_requests_get_a_plain_404() {
    let app = Router::new().get("/hello", hello);

    // Unknown path.
    let res = Server::respond(&app, Request::get("/nope").build()).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert!(res.body().is_empty());

    // Known path, wrong method — still a routing miss, and never the
    // "Error: " shape the boundary produces.
    let res = Server::respond(&app, Request::post("/hello").build()).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert!(res.body().is_empty());
}

#[tokio::test]
async fn groups_share_a_prefix() {
    let app = Router::new()
        .group("/api", |api| api.get("/hello", root).get("/world", root))
        .group("/web", |web| web.get("/hello", root).get("/world", root));

    for path in ["/api/hello", "/api/world", "/web/hello", "/web/world"] {
        let res = Server::respond(&app, Request::get(path).build()).await;
        assert_eq!(res.status_code(), StatusCode::OK, "{path}");
        assert_eq!(res.body(), b"Hello World", "{path}");
    }

    let res = Server::respond(&app, Request::get("/hello").build()).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn json_response_field_order_is_deterministic() {
    let app = Router::new().get("/user", user_json);

    let res = Server::respond(&app, Request::get("/user").build()).await;
    assert_eq!(res.header("content-type"), Some("application/json"));
    assert_eq!(res.body(), br#"{"name":"Roni Purwanto","username":"roni"}"#);
}

#[tokio::test]
async fn handler_errors_become_one_500_response() {
    let app = Router::new().get("/error", always_fails);

    let res = Server::respond(&app, Request::get("/error").build()).await;
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body(), b"Error: Ups");
}
