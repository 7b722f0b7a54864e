//! Errors raised while deriving the route table, and while resolving URLs
//! from it.
//!
//! Every error returned by [`RouteTable::build`](crate::RouteTable::build)
//! is a configuration error: it is detected once, before any route is
//! handed to the host router, and the whole registration fails with it.

use crate::route::ParseRouteError;

/// Failure to derive the route table for a root controller.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The controller tree could not be discovered.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// Overloads with different route parameter counts that are not
    /// explicitly marked for disambiguation.
    #[error(
        "the following action methods must be marked `require_route_parameters` for disambiguation: {}",
        .methods.join(", ")
    )]
    AmbiguousOverload { methods: Vec<String> },
    /// Overloads with the same route parameter count whose parameters
    /// differ in name, position or constraint.
    #[error(
        "overloaded action methods must have parameters that are equal in name, position and constraint ({controller}::{method})"
    )]
    IncompatibleOverload { controller: String, method: String },
    /// One custom route resolving to more than one action.
    #[error(
        "action methods sharing the custom route `{route}` must have the same name: {}",
        .methods.join(", ")
    )]
    CustomRouteConflict { route: String, methods: Vec<String> },
}

/// Problems found while walking the registered controller types.
#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("root controller `{root}` is not registered in the catalog")]
    RootNotRegistered { root: &'static str },
    #[error("duplicate controller `{name}` in namespace `{namespace}`")]
    DuplicateController { namespace: String, name: String },
    #[error("no parameter binder registered for route property `{controller}.{property}` of type `{type_name}`")]
    MissingBinder {
        controller: String,
        property: String,
        type_name: &'static str,
    },
    #[error("controller `{controller}` has no eligible actions")]
    NoActions { controller: String },
    #[error("optional route parameter `{parameter}` of `{action}` is followed by a required one")]
    OptionalBeforeRequired { action: String, parameter: String },
    #[error("token `{token}` appears more than once in the routes of `{action}`")]
    DuplicateToken { action: String, token: String },
    #[error("invalid custom route `{route}` on `{action}`")]
    InvalidCustomRoute {
        action: String,
        route: String,
        #[source]
        source: ParseRouteError,
    },
    #[error("custom route `{route}` on `{action}` has a token that does not fill a whole segment")]
    ComplexSegment { action: String, route: String },
    #[error("custom route `{route}` on `{action}` uses token `{token}`, which names no route parameter")]
    UnknownRouteToken {
        action: String,
        route: String,
        token: String,
    },
    #[error("custom route `{route}` on `{action}` does not bind required parameter `{parameter}`")]
    MissingRouteToken {
        action: String,
        route: String,
        parameter: String,
    },
    #[error("invalid constraint `{constraint}` for token `{token}`")]
    InvalidConstraint {
        token: String,
        constraint: String,
        #[source]
        source: regex::Error,
    },
    #[error("default value `{value}` of `{action}({parameter})` is rejected by its binder")]
    InvalidDefault {
        action: String,
        parameter: String,
        value: String,
    },
}

/// Failure to generate a URL for an action.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UrlError {
    #[error("no route for action `{controller}::{action}`")]
    UnknownAction { controller: String, action: String },
    #[error("parameter mismatch")]
    ParametersMismatch,
    #[error("value `{value}` is not accepted for `{name}`")]
    InvalidValue { name: String, value: String },
}
