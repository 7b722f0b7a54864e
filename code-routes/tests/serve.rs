#![allow(dead_code, unused_variables)]

use axum::{
    body::{self, Body},
    extract::Request,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use code_routes::*;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

mod store {
    use code_routes::*;

    #[derive(Controller)]
    pub struct StoreController;

    #[actions]
    impl StoreController {
        pub fn index(&self) {}
    }

    pub mod order {
        use code_routes::*;

        #[derive(Controller)]
        pub struct OrderController {
            #[from_route(constraint = "[a-z]+")]
            pub region: String,
        }

        #[actions]
        impl OrderController {
            #[action(verbs(get))]
            pub fn show(&self, id: u32) {}

            #[action(name = "Show", custom_route = "{id}", verbs(put, delete))]
            pub fn update(&self, id: u32, #[from_body] order: String) {}

            pub fn list(&self, #[from_route(default = 1)] page: Option<u16>) {}
        }
    }
}

async fn dispatch(matched: RouteMatch, _request: Request) -> Response {
    let values = matched
        .values()
        .iter()
        .map(|value| (value.name().to_owned(), Value::from(value.text())))
        .collect::<serde_json::Map<_, _>>();
    let body = json!({
        "controller": matched.controller_name(),
        "action": matched.action(),
        "method": matched.method_name(),
        "values": values,
    });

    (
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}

fn router() -> Result<axum::Router, Error> {
    let catalog = Catalog::new()
        .controller::<store::StoreController>()
        .controller::<store::order::OrderController>();
    let settings = RouteSettings::new().with_route_formatter(format::lower_case());
    let table = RouteTable::build::<store::StoreController>(&catalog, &settings)?;

    Ok(into_router(Arc::new(table), dispatch))
}

async fn send(method: &str, uri: &str) -> Result<(StatusCode, Option<Value>), Box<dyn std::error::Error>> {
    let request = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())?;
    let response = router()?.oneshot(request).await?;

    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await?;
    let json = (!bytes.is_empty())
        .then(|| serde_json::from_slice(&bytes))
        .transpose()?;

    Ok((status, json))
}

#[tokio::test]
async fn dispatches_matched_routes() -> Result<(), Box<dyn std::error::Error>> {
    let (status, body) = send("GET", "/").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_ref().map(|body| &body["controller"]), Some(&json!("StoreController")));

    let (status, body) = send("GET", "/order/eu/show/7").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        Some(json!({
            "controller": "OrderController",
            "action": "Show",
            "method": "show",
            "values": { "region": "eu", "id": "7" },
        }))
    );

    let (status, body) = send("DELETE", "/order/eu/7").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_ref().map(|body| &body["method"]), Some(&json!("update")));

    Ok(())
}

#[tokio::test]
async fn defaults_are_bound() -> Result<(), Box<dyn std::error::Error>> {
    let (status, body) = send("GET", "/order/us/list").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body.as_ref().map(|body| &body["values"]),
        Some(&json!({ "region": "us", "page": "1" }))
    );

    Ok(())
}

#[tokio::test]
async fn rejected_requests() -> Result<(), Box<dyn std::error::Error>> {
    // path known, verb not accepted
    assert_eq!(send("POST", "/order/eu/show/7").await?.0, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(send("POST", "/order/eu/7").await?.0, StatusCode::METHOD_NOT_ALLOWED);

    // constraints
    assert_eq!(send("GET", "/order/EU/show/7").await?.0, StatusCode::NOT_FOUND);
    assert_eq!(send("GET", "/order/eu/show/seven").await?.0, StatusCode::NOT_FOUND);
    assert_eq!(send("GET", "/order/eu/show/-7").await?.0, StatusCode::NOT_FOUND);

    assert_eq!(send("GET", "/missing").await?.0, StatusCode::NOT_FOUND);

    Ok(())
}
