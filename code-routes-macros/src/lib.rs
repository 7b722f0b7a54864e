mod actions;
mod controller;

mod method;
mod param;
mod punctuated_attrs;
mod route;
mod util;

// ----------------------------------------------------------------------------

use proc_macro::TokenStream;

/// Declares a controller: implements `code_routes::Controller` for a
/// struct, with its route properties (fields marked `#[from_route]`) and
/// its base controller (`#[controller(extends = path::To::Base)]`).
#[proc_macro_derive(Controller, attributes(controller, from_route))]
pub fn derive_controller(item: TokenStream) -> TokenStream {
    match controller::try_expand(item) {
        Ok(expanded) => expanded,
        Err(err) => err.into_compile_error().into(),
    }
}

// ----------------------------------------------------------------------------

/// Declares the actions of a controller: implements
/// `code_routes::Actions` from the public methods taking `self` of an
/// inherent `impl` block.
#[proc_macro_attribute]
pub fn actions(attr: TokenStream, item: TokenStream) -> TokenStream {
    match actions::try_expand(attr, item) {
        Ok(expanded) => expanded,
        Err(err) => err.into_compile_error().into(),
    }
}
