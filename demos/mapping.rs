//! Request mapping tour: every way a route can narrow what it accepts.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example mapping
//!
//! Try:
//!   curl http://localhost:8080/hello-basic
//!   curl -X POST http://localhost:8080/hello-basic-post
//!   curl http://localhost:8080/mapping/users/7/orders/99
//!   curl 'http://localhost:8080/mapping-param?mode=debug'
//!   curl -H 'mode: debug' http://localhost:8080/mapping-header
//!   curl -X POST -H 'content-type: application/json' -d '{}' http://localhost:8080/mapping-consume
//!   curl -X POST -H 'accept: text/html' http://localhost:8080/mapping-produce

use reqmap::{Request, Route, Router, Server};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), reqmap::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let app = Router::new()
        .on(Route::get("/hello-basic"), "helloBasic", hello_basic)
        // Method shortcuts.
        .on(Route::get("/hello-basic-get"), "helloBasicGet", hello_basic_get)
        .on(Route::post("/hello-basic-post"), "helloBasicPost", hello_basic_post)
        // Path variables.
        .on(Route::get("/mapping/{userId}"), "mappingPath", mapping_path)
        .on(Route::get("/mapping2/{userId}"), "mappingPath2", mapping_path)
        .on(Route::get("/mapping/users/{userId}/orders/{orderId}"), "mappingOrder", mapping_order)
        // `mode`, `!mode`, `mode=debug`, `mode!=debug`; several combine with AND.
        .on(Route::get("/mapping-param").param("mode=debug"), "mappingParam", mapping_param)
        .on(Route::get("/mapping-header").header("mode=debug"), "mappingHeader", mapping_header)
        // Content-Type: `application/json`, `!application/json`, `application/*`, `*/*`.
        .on(
            Route::post("/mapping-consume").consumes("application/json"),
            "mappingConsumes",
            mapping_consumes,
        )
        // Accept: `text/html`, `!text/html`, `text/*`, `*/*`.
        .on(
            Route::post("/mapping-produce").produces("text/html"),
            "mappingProduces",
            mapping_produces,
        );

    Server::bind("0.0.0.0:8080")?.serve(app).await
}

async fn hello_basic(_req: Request) -> &'static str {
    info!("helloBasic");
    "ok"
}

async fn hello_basic_get(_req: Request) -> &'static str {
    info!("helloBasicGet");
    "get"
}

async fn hello_basic_post(_req: Request) -> &'static str {
    info!("helloBasicPost");
    "post"
}

async fn mapping_path(req: Request) -> &'static str {
    info!(user_id = req.param("userId"), "mappingPath");
    "ok"
}

// The matcher binds strings; typing the order id is the handler's job.
async fn mapping_order(req: Request) -> Result<&'static str, http::StatusCode> {
    let user_id = req.param("userId").unwrap_or_default();
    let order_id: u64 = req
        .param("orderId")
        .and_then(|v| v.parse().ok())
        .ok_or(http::StatusCode::BAD_REQUEST)?;
    info!(user_id, order_id, "mappingOrder");
    Ok("ok")
}

async fn mapping_param(_req: Request) -> &'static str {
    info!("mappingParam");
    "ok"
}

async fn mapping_header(_req: Request) -> &'static str {
    info!("mappingHeader");
    "ok"
}

async fn mapping_consumes(req: Request) -> &'static str {
    info!(bytes = req.body().len(), "mappingConsumes");
    "ok"
}

async fn mapping_produces(req: Request) -> &'static str {
    info!(response_type = ?req.response_type(), "mappingProduces");
    "ok"
}
