//! Parsing of custom route templates, ie `{id}/history`.

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

/// Splits a custom route into literal text and tokens. An empty route has
/// no component.
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
        RouteComponent::Path(text.to_owned())
    })(input)
}

fn parameter(input: &str) -> ParseResult<RouteComponent> {
    terminated(
        preceded(
            ch('{'),
            map(if_not_empty(take_while(|c| c != '{' && c != '}')), |text| {
                RouteComponent::Parameter(text.to_owned())
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

// ----------------------------------------------------------------------------

/// One `/` separated piece of a custom route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum CustomSegment {
    Literal(String),
    Token(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ComplexSegment;

/// Groups components into segments. Empty segments are dropped, and a
/// parameter must be the only thing in its segment.
pub(crate) fn into_segments(
    components: Vec<RouteComponent>,
) -> Result<Vec<CustomSegment>, ComplexSegment> {
    let mut grouped: Vec<Vec<RouteComponent>> = vec![Vec::new()];

    for component in components {
        match component {
            RouteComponent::Path(text) => {
                for (i, piece) in text.split('/').enumerate() {
                    if i > 0 {
                        grouped.push(Vec::new());
                    }
                    if !piece.is_empty() {
                        if let Some(current) = grouped.last_mut() {
                            current.push(RouteComponent::Path(piece.to_owned()));
                        }
                    }
                }
            }
            parameter @ RouteComponent::Parameter(_) => {
                if let Some(current) = grouped.last_mut() {
                    current.push(parameter);
                }
            }
        }
    }

    grouped
        .into_iter()
        .filter(|segment| !segment.is_empty())
        .map(|mut segment| match (segment.pop(), segment.is_empty()) {
            (Some(RouteComponent::Path(text)), true) => Ok(CustomSegment::Literal(text)),
            (Some(RouteComponent::Parameter(name)), true) => Ok(CustomSegment::Token(name)),
            _ => Err(ComplexSegment),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbalanced_braces() {
        let ret = parse_route_into_components("{id");
        assert!(ret.is_err());
        assert!(parse_route_into_components("id}").is_err());
        assert!(parse_route_into_components("{}").is_err());
    }

    #[test]
    fn parsing() -> Result<(), ParseRouteError> {
        assert_eq!(
            parse_route_into_components("segment{param}/")?,
            Vec::from([
                RouteComponent::Path("segment".into()),
                RouteComponent::Parameter("param".into()),
                RouteComponent::Path("/".into()),
            ])
        );
        assert_eq!(
            parse_route_into_components("company/{company_id}/users/{user_id}/list")?,
            Vec::from([
                RouteComponent::Path("company/".into()),
                RouteComponent::Parameter("company_id".into()),
                RouteComponent::Path("/users/".into()),
                RouteComponent::Parameter("user_id".into()),
                RouteComponent::Path("/list".into()),
            ])
        );
        assert_eq!(parse_route_into_components("")?, Vec::new());

        Ok(())
    }

    #[test]
    fn segments() -> Result<(), ParseRouteError> {
        assert_eq!(
            into_segments(parse_route_into_components("/{id}/history/")?),
            Ok(Vec::from([
                CustomSegment::Token("id".into()),
                CustomSegment::Literal("history".into()),
            ]))
        );
        assert_eq!(
            into_segments(parse_route_into_components("{action}/{id}")?),
            Ok(Vec::from([
                CustomSegment::Token("action".into()),
                CustomSegment::Token("id".into()),
            ]))
        );
        assert_eq!(
            into_segments(parse_route_into_components("item-{id}")?),
            Err(ComplexSegment)
        );

        Ok(())
    }
}
