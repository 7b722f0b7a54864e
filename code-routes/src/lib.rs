//! # Code Routes
//!
//! Derive the routes of an application from the way its controllers are
//! laid out in modules, instead of declaring every route by hand.
//!
//! ```ignore,rust
//! mod app {
//!     #[derive(Controller)]
//!     pub struct HomeController;
//!
//!     #[actions]
//!     impl HomeController {
//!         pub fn index(&self) {}            // ""
//!         pub fn about(&self) {}            // "About"
//!     }
//!
//!     pub mod admin {
//!         pub mod user {
//!             #[derive(Controller)]
//!             pub struct UserController;
//!
//!             #[actions]
//!             impl UserController {
//!                 pub fn index(&self) {}    // "admin/User"
//!                 #[action(custom_route = "{id}")]
//!                 pub fn edit(&self, id: i32) {} // "admin/User/{id}"
//!             }
//!         }
//!     }
//! }
//!
//! let catalog = Catalog::new()
//!     .controller::<app::HomeController>()
//!     .controller::<app::admin::user::UserController>();
//! let table = RouteTable::build::<app::HomeController>(&catalog, &RouteSettings::default())?;
//! ```
//!
//! The root controller (`HomeController` above) is the only one whose
//! segment is left out of its URLs. Every other controller registered in
//! the catalog under the root's module gets:
//!
//! - one segment per module below the root, except a last module named
//!   after the controller itself (`admin::user::UserController` is
//!   `admin/User`)
//! - its name, without the `Controller` suffix
//! - its route properties, as tokens
//!
//! Each action then gets its name followed by one token per route
//! parameter. Trailing optional parameters produce one route per number
//! of parameters supplied, the longest first. An action named `Index`
//! has no segment when its route carries no parameter.
//!
//! ## Overloads
//!
//! Actions may share a name. When their route parameter counts differ,
//! each of them must be marked `require_route_parameters`, otherwise
//! [`RouteTable::build`] fails with [`Error::AmbiguousOverload`]. When the
//! counts are the same, parameters must match in name, position and
//! constraint.
//!
//! ## Serving
//!
//! The table only describes routes. [`into_router`] turns it into an
//! [`axum::Router`] that recognizes requests and hands them to the
//! application.

extern crate self as code_routes;

pub mod binder;
mod descriptor;
mod error;
pub mod format;
mod model;
mod route;
mod router;
mod settings;
mod table;
mod template;
mod validate;
mod verb;

pub use binder::{BinderRegistry, BoundValue, NumberFormat, ParameterBinder};
pub use descriptor::{
    ActionDescriptor, Actions, Catalog, Controller, ControllerDeclaration, ControllerDescriptor,
    ParameterDescriptor, ParameterSource,
};
pub use error::{Error, ModelError, UrlError};
pub use format::{FormatterArgs, RouteFormatter, SegmentType};
pub use model::{
    ACTION_TOKEN, ActionNode, CONTROLLER_SUFFIX, ControllerNode, ControllerTree, CustomRoute,
    RouteToken,
};
pub use route::{ParseRouteError, RouteComponent, parse_route_into_components};
pub use router::into_router;
pub use settings::RouteSettings;
pub use table::{ControllerRoute, RouteMatch, RouteTable, RouteValue};
pub use template::{RouteTemplate, Segment};
pub use verb::{UnknownVerb, Verb};

/// Declares a controller.
///
/// `#[controller(extends = path::ToBase)]` inherits the route properties
/// of another controller. Fields marked `#[from_route]` are route
/// properties: `#[from_route(name = "tenant", constraint = "[a-z]+")]`
/// overrides the token name and its constraint.
#[doc(inline)]
pub use code_routes_macros::Controller;

/// Declares the actions of a controller, from the public `&self` methods
/// of an inherent `impl` block.
///
/// - `#[action(name = "...", custom_route = "...", absolute, verbs(get, post), require_route_parameters)]`
/// - `#[non_action]` skips a method
/// - on parameters: `#[from_route(name = "...", constraint = "...", default = ...)]`,
///   `#[from_body]` and `#[from_query]`; `Option<T>` parameters are
///   optional
#[doc(inline)]
pub use code_routes_macros::actions;
