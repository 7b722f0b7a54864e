//! Route templates derived from the controller tree.

use crate::{
    model::{ACTION_TOKEN, ActionNode, ControllerNode, ControllerTree, CustomRoute, RouteToken, name_equals},
    route::CustomSegment,
    settings::RouteSettings,
    verb::Verb,
};
use std::{any::TypeId, collections::BTreeSet, fmt};
use tracing::debug;

/// One `/` separated piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// Token name, without braces.
    Token(String),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(text) => f.write_str(text),
            Segment::Token(token) => write!(f, "{{{token}}}"),
        }
    }
}

pub(crate) fn render(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(Segment::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

/// A route to register with the host, for one action.
#[derive(Debug, Clone)]
pub struct RouteTemplate {
    order: usize,
    controller: TypeId,
    controller_name: String,
    action: String,
    method_name: String,
    segments: Vec<Segment>,
    tokens: Vec<RouteToken>,
    // optional action parameters this template leaves out
    omitted: Vec<RouteToken>,
    verbs: Option<BTreeSet<Verb>>,
    custom: bool,
}

impl RouteTemplate {
    /// Position in the table, starting at 1.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Unique name to register the route under.
    pub fn name(&self) -> String {
        self.order.to_string()
    }

    /// The template, ie `admin/User/{id}`.
    pub fn template(&self) -> String {
        render(&self.segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Tokens appearing in the template, route properties first.
    pub fn tokens(&self) -> &[RouteToken] {
        &self.tokens
    }

    pub fn token(&self, token: &str) -> Option<&RouteToken> {
        self.tokens.iter().find(|t| name_equals(t.token(), token))
    }

    /// `(token, constraint)` for each constrained token.
    pub fn constraints(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tokens
            .iter()
            .filter_map(|t| t.constraint().map(|constraint| (t.token(), constraint)))
    }

    /// `(token, default)` for each optional parameter left out of the
    /// template.
    pub fn defaults(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.omitted.iter().map(|t| (t.token(), t.default_value()))
    }

    pub(crate) fn omitted(&self) -> &[RouteToken] {
        &self.omitted
    }

    /// `None` accepts every verb.
    pub fn verbs(&self) -> Option<&BTreeSet<Verb>> {
        self.verbs.as_ref()
    }

    pub fn allows(&self, verb: Verb) -> bool {
        self.verbs.as_ref().is_none_or(|verbs| verbs.contains(&verb))
    }

    pub fn controller(&self) -> TypeId {
        self.controller
    }

    pub fn controller_name(&self) -> &str {
        &self.controller_name
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// True for templates coming from a custom route.
    pub fn is_custom(&self) -> bool {
        self.custom
    }
}

impl fmt::Display for RouteTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.template())?;
        if let Some(verbs) = &self.verbs {
            let verbs = verbs.iter().map(Verb::as_str).collect::<Vec<_>>();
            write!(f, " [{}]", verbs.join(", "))?;
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------

fn controller_prefix(controller: &ControllerNode) -> Vec<Segment> {
    let mut segments = controller
        .base_route()
        .iter()
        .chain(controller.namespace_segments())
        .map(|segment| Segment::Literal(segment.clone()))
        .collect::<Vec<_>>();
    if !controller.is_root() {
        segments.push(Segment::Literal(controller.controller_segment().to_owned()));
    }
    segments.extend(
        controller
            .route_properties()
            .iter()
            .map(|property| Segment::Token(property.token().to_owned())),
    );
    segments
}

fn find_token<'a>(
    controller: &'a ControllerNode,
    action: &'a ActionNode,
    name: &str,
) -> Option<&'a RouteToken> {
    action
        .route_parameters()
        .iter()
        .chain(controller.route_properties())
        .find(|token| token.matches_name(name))
}

/// Segments of a custom route, resolved against its controller.
pub(crate) fn custom_segments(
    controller: &ControllerNode,
    action: &ActionNode,
    custom: &CustomRoute,
) -> Vec<Segment> {
    let mut segments = if custom.is_absolute() {
        Vec::new()
    } else {
        controller_prefix(controller)
    };

    segments.extend(custom.segments().iter().map(|segment| match segment {
        CustomSegment::Literal(text) => Segment::Literal(text.clone()),
        CustomSegment::Token(token) if name_equals(token, ACTION_TOKEN) => {
            Segment::Literal(action.action_segment().to_owned())
        }
        CustomSegment::Token(token) => Segment::Token(
            find_token(controller, action, token)
                .map_or_else(|| token.clone(), |t| t.token().to_owned()),
        ),
    }));

    segments
}

fn custom_template(controller: &ControllerNode, action: &ActionNode, custom: &CustomRoute) -> RouteTemplate {
    let segments = custom_segments(controller, action, custom);
    let tokens = segments
        .iter()
        .filter_map(|segment| match segment {
            Segment::Token(token) => find_token(controller, action, token).cloned(),
            Segment::Literal(_) => None,
        })
        .collect::<Vec<_>>();
    let omitted = action
        .route_parameters()
        .iter()
        .filter(|parameter| {
            parameter.is_optional() && !tokens.iter().any(|t| name_equals(t.token(), parameter.token()))
        })
        .cloned()
        .collect();

    RouteTemplate::new(controller, action, segments, tokens, omitted, true)
}

/// One template per number of trailing optional parameters, the longest
/// first.
fn generated_templates(
    controller: &ControllerNode,
    action: &ActionNode,
    settings: &RouteSettings,
) -> Vec<RouteTemplate> {
    let prefix = controller_prefix(controller);
    let parameters = action.route_parameters();
    let required = parameters.iter().take_while(|p| !p.is_optional()).count();
    let is_default = name_equals(action.name(), settings.default_action());

    (required..=parameters.len())
        .rev()
        .map(|take| {
            let mut segments = prefix.clone();
            if !(is_default && take == 0) {
                segments.push(Segment::Literal(action.action_segment().to_owned()));
            }
            segments.extend(
                parameters[..take]
                    .iter()
                    .map(|parameter| Segment::Token(parameter.token().to_owned())),
            );
            let tokens = controller
                .route_properties()
                .iter()
                .chain(&parameters[..take])
                .cloned()
                .collect();

            RouteTemplate::new(controller, action, segments, tokens, parameters[take..].to_vec(), false)
        })
        .collect()
}

impl RouteTemplate {
    fn new(
        controller: &ControllerNode,
        action: &ActionNode,
        segments: Vec<Segment>,
        tokens: Vec<RouteToken>,
        omitted: Vec<RouteToken>,
        custom: bool,
    ) -> Self {
        Self {
            order: 0,
            controller: controller.type_id(),
            controller_name: controller.type_name().to_owned(),
            action: action.name().to_owned(),
            method_name: action.method_name().to_owned(),
            segments,
            tokens,
            omitted,
            verbs: action.verbs().cloned(),
            custom,
        }
    }
}

/// Custom routes of a controller come before its generated routes; both
/// keep declaration order.
pub(crate) fn build_templates(tree: &ControllerTree, settings: &RouteSettings) -> Vec<RouteTemplate> {
    let mut templates = Vec::new();

    for controller in tree.controllers() {
        for action in controller.actions() {
            if let Some(custom) = action.custom_route() {
                templates.push(custom_template(controller, action, custom));
            }
        }
        for action in controller.actions() {
            if action.custom_route().is_none() {
                templates.extend(generated_templates(controller, action, settings));
            }
        }
    }

    for (i, template) in templates.iter_mut().enumerate() {
        template.order = i + 1;
        debug!(
            route = template.order,
            template = %template,
            controller = template.controller_name(),
            action = template.method_name(),
            "generated route"
        );
    }

    templates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        descriptor::{ActionDescriptor, Catalog, ControllerDeclaration, ParameterDescriptor},
        error::ModelError,
        format,
    };

    struct HomeController;
    struct UserController;

    fn catalog() -> Catalog {
        Catalog::new()
            .descriptor(
                ControllerDeclaration::new::<HomeController>("HomeController", "site")
                    .with_actions([ActionDescriptor::new("Index"), ActionDescriptor::new("About")]),
            )
            .descriptor(
                ControllerDeclaration::new::<UserController>("UserController", "site::account::user")
                    .with_actions([
                        ActionDescriptor::new("Index"),
                        ActionDescriptor::new("Search")
                            .parameter(ParameterDescriptor::new::<String>("q").optional())
                            .parameter(ParameterDescriptor::new::<i32>("page").default_value("1")),
                        ActionDescriptor::new("Edit")
                            .parameter(ParameterDescriptor::new::<i32>("id"))
                            .custom_route("{id}/edit")
                            .verbs([Verb::Get, Verb::Post]),
                        ActionDescriptor::new("Details")
                            .parameter(ParameterDescriptor::new::<i32>("id"))
                            .custom_route("/people/{id}")
                            .absolute(),
                    ]),
            )
    }

    fn templates(settings: &RouteSettings) -> Result<Vec<RouteTemplate>, ModelError> {
        let tree = ControllerTree::build::<HomeController>(&catalog(), settings)?;
        Ok(build_templates(&tree, settings))
    }

    #[test]
    fn ordering() -> Result<(), ModelError> {
        let templates = templates(&RouteSettings::default())?;
        let rendered = templates.iter().map(RouteTemplate::template).collect::<Vec<_>>();

        assert_eq!(
            rendered,
            [
                "",
                "About",
                "account/User/{id}/edit",
                "people/{id}",
                "account/User",
                "account/User/Search/{q}/{page}",
                "account/User/Search/{q}",
                "account/User/Search",
            ]
        );
        assert_eq!(
            templates.iter().map(RouteTemplate::order).collect::<Vec<_>>(),
            (1..=8).collect::<Vec<_>>()
        );
        assert_eq!(templates[3].name(), "4");
        assert!(templates[2].is_custom());
        assert!(!templates[4].is_custom());

        Ok(())
    }

    #[test]
    fn defaults_and_constraints() -> Result<(), ModelError> {
        let templates = templates(&RouteSettings::default())?;

        assert_eq!(templates[5].defaults().count(), 0);
        assert_eq!(templates[6].defaults().collect::<Vec<_>>(), [("page", Some("1"))]);
        assert_eq!(
            templates[7].defaults().collect::<Vec<_>>(),
            [("q", None), ("page", Some("1"))]
        );
        let signed = format!("0|{}?[1-9][0-9]*", regex::escape("-"));
        assert_eq!(
            templates[5].constraints().collect::<Vec<_>>(),
            [("page", signed.as_str())]
        );

        Ok(())
    }

    #[test]
    fn verbs() -> Result<(), ModelError> {
        let templates = templates(&RouteSettings::default())?;

        assert_eq!(templates[2].to_string(), "account/User/{id}/edit [GET, POST]");
        assert!(templates[2].allows(Verb::Post));
        assert!(!templates[2].allows(Verb::Delete));
        assert!(templates[4].allows(Verb::Delete));

        Ok(())
    }

    #[test]
    fn formatted_segments() -> Result<(), ModelError> {
        let settings = RouteSettings::default()
            .with_base_route("api")
            .with_route_formatter(format::hyphenate());
        let templates = templates(&settings)?;

        assert_eq!(templates[0].template(), "api");
        assert_eq!(templates[2].template(), "api/account/user/{id}/edit");
        // literals of absolute routes are kept as written
        assert_eq!(templates[3].template(), "people/{id}");
        assert_eq!(templates[7].template(), "api/account/user/search");

        Ok(())
    }
}
