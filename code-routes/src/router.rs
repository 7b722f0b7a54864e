//! Serving a [`RouteTable`] with axum.
//!
//! The host router cannot express the per-token constraints, so the whole
//! table is installed as a single fallback that matches requests in route
//! order.

use crate::{
    table::{RouteMatch, RouteTable},
    verb::Verb,
};
use axum::{
    Router,
    extract::Request,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use std::{future::Future, sync::Arc};
use tracing::{debug, trace};

impl Verb {
    /// `None` for extension methods.
    pub fn from_method(method: &Method) -> Option<Self> {
        method.as_str().parse().ok()
    }
}

impl From<Verb> for Method {
    fn from(verb: Verb) -> Self {
        match verb {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Delete => Method::DELETE,
            Verb::Head => Method::HEAD,
            Verb::Options => Method::OPTIONS,
            Verb::Trace => Method::TRACE,
            Verb::Patch => Method::PATCH,
        }
    }
}

/// Creates an [`axum::Router`] serving every route of `table`.
///
/// Matched requests are handed to `dispatch` along with the bound route
/// values. A path matching some route under another verb is answered
/// `405 Method Not Allowed`, anything else `404 Not Found`.
pub fn into_router<S, F, Fut>(table: Arc<RouteTable>, dispatch: F) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    F: Fn(RouteMatch, Request) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Router::new().fallback(move |request: Request| {
        let table = Arc::clone(&table);
        let dispatch = dispatch.clone();

        async move {
            let path = request.uri().path().to_owned();
            let matched = Verb::from_method(request.method())
                .and_then(|verb| table.recognize(verb, &path));

            match matched {
                Some(matched) => {
                    debug!(
                        route = matched.order(),
                        controller = matched.controller_name(),
                        action = matched.method_name(),
                        %path,
                        "dispatching request"
                    );
                    dispatch(matched, request).await
                }
                None if table.matches_path(&path) => {
                    trace!(%path, method = %request.method(), "no route for method");
                    StatusCode::METHOD_NOT_ALLOWED.into_response()
                }
                None => {
                    trace!(%path, "no route");
                    StatusCode::NOT_FOUND.into_response()
                }
            }
        }
    })
}
