use quote::ToTokens;
use syn::{
    LitStr,
    parse::{Parse, ParseStream},
};

/// A custom route, checked at compile time.
#[derive(Debug)]
pub(crate) struct Route {
    /// The route as written
    pub(crate) route: LitStr,
}

impl Parse for Route {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let route: LitStr = input.parse()?;
        let components = parse_route_into_components(&route.value()).map_err(|err| {
            syn::Error::new(route.span(), format!("invalid route: {}", err.message()))
        })?;

        let mut tokens: Vec<String> = Vec::new();
        for component in components {
            match component {
                RouteComponent::Parameter(token)
                    if tokens.iter().any(|known| known.eq_ignore_ascii_case(&token)) =>
                {
                    return Err(syn::Error::new(
                        route.span(),
                        format!("token `{token}` is used more than once"),
                    ));
                }
                RouteComponent::Parameter(token) => tokens.push(token),
                RouteComponent::Path(_) => {}
            }
        }

        Ok(Route { route })
    }
}

impl ToTokens for Route {
    fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
        let route = &self.route;
        tokens.extend(quote::quote! { #route });
    }
}

// ----------------------------------------------------------------------------

use monch::*;

#[derive(thiserror::Error, Debug, Clone)]
#[error("Invalid route")]
pub struct ParseRouteError {
    #[source]
    pub(crate) source: ParseErrorFailureError,
}

impl ParseRouteError {
    pub fn message(&self) -> &str {
        &self.source.message
    }
}

/// Parses a custom route into its components. An empty route has none.
///
/// Grammar:
///
/// route        ::= ( path | parameter )*
/// path         ::= [^{}]+
/// parameter    ::= ( '{' [^{}]+ '}' )
pub fn parse_route_into_components(input: &str) -> Result<Vec<RouteComponent>, ParseRouteError> {
    if input.is_empty() {
        return Ok(Vec::new());
    }

    with_failure_handling(|input| many1(or(path, parameter))(input))(input)
        .map_err(|err| ParseRouteError { source: err })
}

fn path(input: &str) -> ParseResult<RouteComponent> {
    map(if_not_empty(take_while(|c| c != '{' && c != '}')), |text| {
        RouteComponent::Path(text.to_string())
    })(input)
}

fn parameter(input: &str) -> ParseResult<RouteComponent> {
    terminated(
        preceded(
            ch('{'),
            map(if_not_empty(take_while(|c| c != '{' && c != '}')), |text| {
                RouteComponent::Parameter(text.to_string())
            }),
        ),
        ch('}'),
    )(input)
}

/// A run of literal text, or a `{token}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteComponent {
    /// Literal text, slashes included
    Path(String),
    /// Token name, without braces
    Parameter(String),
}
