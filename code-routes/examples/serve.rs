//! Serves a route table with axum, without binding a socket.

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use code_routes::*;
use std::sync::Arc;
use tower::ServiceExt;

mod shop {
    use code_routes::*;

    #[derive(Controller)]
    pub struct ShopController;

    #[actions]
    impl ShopController {
        pub fn index(&self) -> String {
            String::from("welcome")
        }
    }

    pub mod product {
        use code_routes::*;

        #[derive(Controller)]
        pub struct ProductController;

        #[actions]
        impl ProductController {
            #[action(verbs(get))]
            pub fn show(&self, id: u32) -> String {
                format!("product #{id}")
            }
        }
    }
}

async fn dispatch(matched: RouteMatch, _request: Request) -> Response {
    if matched.is_controller::<shop::ShopController>() {
        return shop::ShopController.index().into_response();
    }
    match matched.get::<u32>("id") {
        Some(id) => shop::product::ProductController.show(*id).into_response(),
        None => StatusCode::BAD_REQUEST.into_response(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::new()
        .controller::<shop::ShopController>()
        .controller::<shop::product::ProductController>();
    let table = Arc::new(RouteTable::build::<shop::ShopController>(
        &catalog,
        &RouteSettings::default(),
    )?);
    let router: axum::Router = into_router(table, dispatch);

    let requests = [
        ("GET", "/"),
        ("GET", "/Product/Show/7"),
        ("POST", "/Product/Show/7"),
        ("GET", "/Product/Show/x"),
    ];
    for (method, uri) in requests {
        let request = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())?;
        let response = router.clone().oneshot(request).await?;
        println!("{method} {uri} -> {}", response.status());
    }

    Ok(())
}
