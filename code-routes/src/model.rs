//! The controller tree: every controller under the root namespace, with
//! its URL segments, route properties and actions.
//!
//! The tree is descriptive only. It is immutable once built, and route
//! templates are derived from it by [`crate::template`].

use crate::{
    binder::{BoundValue, NumberFormat, ParameterBinder},
    descriptor::{ActionDescriptor, Catalog, ControllerDescriptor, ParameterDescriptor},
    error::ModelError,
    format::SegmentType,
    route::{self, CustomSegment},
    settings::RouteSettings,
    verb::Verb,
};
use regex::Regex;
use std::{
    any::{Any, TypeId},
    collections::{BTreeSet, HashSet},
    sync::Arc,
};
use tracing::debug;

/// Stripped from controller type names, ie `UserController` is `User`.
pub const CONTROLLER_SUFFIX: &str = "Controller";

/// Token of a custom route replaced by the action segment.
pub const ACTION_TOKEN: &str = "action";

pub(crate) fn name_equals(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn folded(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
}

/// `user_profile` (a module) names the same thing as `UserProfile` (a
/// controller).
fn namespace_equals(segment: &str, name: &str) -> bool {
    folded(segment).eq(folded(name))
}

fn controller_name(type_name: &str) -> &str {
    match type_name.strip_suffix(CONTROLLER_SUFFIX) {
        Some(name) if !name.is_empty() => name,
        _ => type_name,
    }
}

fn in_namespace(namespace: &str, root: &str) -> bool {
    namespace == root
        || namespace
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with("::"))
}

// ----------------------------------------------------------------------------

/// A typed URL token, either an action parameter or a route property.
#[derive(Debug, Clone)]
pub struct RouteToken {
    name: String,
    token: String,
    type_name: &'static str,
    optional: bool,
    default_value: Option<String>,
    constraint: Option<String>,
    binder: Option<Arc<dyn ParameterBinder>>,
    // anchored, only for explicit constraints
    pattern: Option<Regex>,
}

impl RouteToken {
    fn new(
        parameter: &ParameterDescriptor,
        controller: &str,
        settings: &RouteSettings,
    ) -> Result<Self, ModelError> {
        let binder = settings.binders().get(parameter.type_id()).cloned();
        let token = settings.format_segment(parameter.route_token(), SegmentType::Token, controller);

        let pattern = parameter
            .get_constraint()
            .map(|constraint| {
                Regex::new(&format!("^(?:{constraint})$")).map_err(|source| {
                    ModelError::InvalidConstraint {
                        token: token.clone(),
                        constraint: constraint.to_owned(),
                        source,
                    }
                })
            })
            .transpose()?;
        let constraint = parameter.get_constraint().map(str::to_owned).or_else(|| {
            binder
                .as_ref()
                .and_then(|binder| binder.constraint(settings.number_format()))
        });

        Ok(Self {
            name: parameter.name().to_owned(),
            token,
            type_name: parameter.type_name(),
            optional: parameter.is_optional(),
            default_value: parameter.get_default_value().map(str::to_owned),
            constraint,
            binder,
            pattern,
        })
    }

    /// The parameter or property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The token as written in templates, without braces.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    /// Regex fragment restricting the segment, if any.
    pub fn constraint(&self) -> Option<&str> {
        self.constraint.as_deref()
    }

    pub fn binder(&self) -> Option<&Arc<dyn ParameterBinder>> {
        self.binder.as_ref()
    }

    /// `{token}`
    pub fn route_segment(&self) -> String {
        format!("{{{}}}", self.token)
    }

    /// True when `name` is either the parameter name or the token.
    pub fn matches_name(&self, name: &str) -> bool {
        name_equals(&self.name, name) || name_equals(&self.token, name)
    }

    /// Binds a URL segment. Tokens without binder keep the text.
    pub fn bind(&self, text: &str, format: &NumberFormat) -> Option<BoundValue> {
        if text.is_empty() {
            return None;
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(text) {
                return None;
            }
        }
        match &self.binder {
            Some(binder) => binder.try_bind(text, format),
            None => Some(BoundValue::new(text.to_owned())),
        }
    }

    /// Same token name and constraint.
    pub(crate) fn same_shape(&self, other: &RouteToken) -> bool {
        name_equals(&self.token, &other.token) && self.constraint == other.constraint
    }
}

// ----------------------------------------------------------------------------

/// A custom route declared on an action.
#[derive(Debug, Clone)]
pub struct CustomRoute {
    literal: String,
    segments: Vec<CustomSegment>,
    absolute: bool,
    has_action_token: bool,
}

impl CustomRoute {
    fn parse(
        literal: &str,
        absolute: bool,
        action: &str,
        route_properties: &[RouteToken],
        route_parameters: &[RouteToken],
    ) -> Result<Self, ModelError> {
        let components = route::parse_route_into_components(literal).map_err(|source| {
            ModelError::InvalidCustomRoute {
                action: action.to_owned(),
                route: literal.to_owned(),
                source,
            }
        })?;
        let segments =
            route::into_segments(components).map_err(|_| ModelError::ComplexSegment {
                action: action.to_owned(),
                route: literal.to_owned(),
            })?;

        // route properties are already in the controller prefix, unless the
        // route is absolute
        let mut bindable: Vec<&RouteToken> = route_parameters.iter().collect();
        if absolute {
            bindable.extend(route_properties);
        }

        let mut has_action_token = false;
        let mut bound: Vec<&str> = Vec::new();
        for segment in &segments {
            let CustomSegment::Token(token) = segment else {
                continue;
            };
            if name_equals(token, ACTION_TOKEN) {
                has_action_token = true;
                continue;
            }
            match bindable.iter().find(|candidate| candidate.matches_name(token)) {
                Some(candidate) if bound.contains(&candidate.name()) => {
                    return Err(ModelError::DuplicateToken {
                        action: action.to_owned(),
                        token: token.clone(),
                    });
                }
                Some(candidate) => bound.push(candidate.name()),
                None if route_properties.iter().any(|p| p.matches_name(token)) => {
                    return Err(ModelError::DuplicateToken {
                        action: action.to_owned(),
                        token: token.clone(),
                    });
                }
                None => {
                    return Err(ModelError::UnknownRouteToken {
                        action: action.to_owned(),
                        route: literal.to_owned(),
                        token: token.clone(),
                    });
                }
            }
        }

        if let Some(missing) =
            bindable.iter().find(|token| !token.is_optional() && !bound.contains(&token.name()))
        {
            return Err(ModelError::MissingRouteToken {
                action: action.to_owned(),
                route: literal.to_owned(),
                parameter: missing.name().to_owned(),
            });
        }

        Ok(Self {
            literal: literal.to_owned(),
            segments,
            absolute,
            has_action_token,
        })
    }

    /// The route as declared.
    pub fn literal(&self) -> &str {
        &self.literal
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn has_action_token(&self) -> bool {
        self.has_action_token
    }

    pub(crate) fn segments(&self) -> &[CustomSegment] {
        &self.segments
    }
}

// ----------------------------------------------------------------------------

/// An action of a controller.
#[derive(Debug, Clone)]
pub struct ActionNode {
    method_name: String,
    name: String,
    action_segment: String,
    controller_type: String,
    parameter_types: Vec<&'static str>,
    route_parameters: Vec<RouteToken>,
    custom_route: Option<CustomRoute>,
    verbs: Option<BTreeSet<Verb>>,
    require_route_parameters: bool,
}

impl ActionNode {
    fn build(
        action: &ActionDescriptor,
        controller_type: &str,
        route_properties: &[RouteToken],
        settings: &RouteSettings,
    ) -> Result<Self, ModelError> {
        let method = format!("{controller_type}::{}", action.method_name());

        let route_parameters = action
            .parameters()
            .iter()
            .filter(|parameter| parameter.is_route())
            .map(|parameter| RouteToken::new(parameter, controller_type, settings))
            .collect::<Result<Vec<_>, _>>()?;

        // only a trailing run of parameters may be optional
        if let Some(first_optional) = route_parameters.iter().position(RouteToken::is_optional) {
            if route_parameters[first_optional..]
                .iter()
                .any(|parameter| !parameter.is_optional())
            {
                return Err(ModelError::OptionalBeforeRequired {
                    action: method,
                    parameter: route_parameters[first_optional].name().to_owned(),
                });
            }
        }

        let mut tokens: Vec<&str> = route_properties.iter().map(RouteToken::token).collect();
        for parameter in &route_parameters {
            if tokens.iter().any(|token| name_equals(token, parameter.token())) {
                return Err(ModelError::DuplicateToken {
                    action: method,
                    token: parameter.token().to_owned(),
                });
            }
            tokens.push(parameter.token());

            if let Some(value) = parameter.default_value() {
                if parameter.bind(value, settings.number_format()).is_none() {
                    return Err(ModelError::InvalidDefault {
                        action: method,
                        parameter: parameter.name().to_owned(),
                        value: value.to_owned(),
                    });
                }
            }
        }

        let custom_route = action
            .get_custom_route()
            .map(|literal| {
                CustomRoute::parse(
                    literal,
                    action.is_absolute(),
                    &method,
                    route_properties,
                    &route_parameters,
                )
            })
            .transpose()?;

        let name = action.action_name().to_owned();
        let action_segment = settings.format_segment(&name, SegmentType::Action, controller_type);

        Ok(Self {
            method_name: action.method_name().to_owned(),
            name,
            action_segment,
            controller_type: controller_type.to_owned(),
            parameter_types: action
                .parameters()
                .iter()
                .map(ParameterDescriptor::short_type_name)
                .collect(),
            route_parameters,
            custom_route,
            verbs: action.get_verbs().cloned(),
            require_route_parameters: action.requires_route_parameters(),
        })
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Normalized action name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action_segment(&self) -> &str {
        &self.action_segment
    }

    /// Route-bound parameters, in declaration order.
    pub fn route_parameters(&self) -> &[RouteToken] {
        &self.route_parameters
    }

    pub fn custom_route(&self) -> Option<&CustomRoute> {
        self.custom_route.as_ref()
    }

    pub fn verbs(&self) -> Option<&BTreeSet<Verb>> {
        self.verbs.as_ref()
    }

    pub fn requires_route_parameters(&self) -> bool {
        self.require_route_parameters
    }

    /// `UserController::edit(i32)`, for diagnostics.
    pub fn signature(&self) -> String {
        format!(
            "{}::{}({})",
            self.controller_type,
            self.method_name,
            self.parameter_types.join(", ")
        )
    }
}

// ----------------------------------------------------------------------------

/// A controller and its place in the tree.
#[derive(Debug, Clone)]
pub struct ControllerNode {
    type_id: TypeId,
    type_name: String,
    name: String,
    namespace: String,
    is_root: bool,
    code_routing_namespace: Vec<String>,
    base_route: Vec<String>,
    namespace_segments: Vec<String>,
    controller_segment: String,
    route_properties: Vec<RouteToken>,
    actions: Vec<ActionNode>,
}

impl ControllerNode {
    fn build(
        descriptor: &ControllerDescriptor,
        is_root: bool,
        root_namespace: &str,
        settings: &RouteSettings,
    ) -> Result<Self, ModelError> {
        let declaration = descriptor.declaration();
        let type_name = declaration.type_name();
        let name = controller_name(type_name);
        let namespace = declaration.namespace();

        let mut code_routing_namespace = match namespace
            .strip_prefix(root_namespace)
            .and_then(|rest| rest.strip_prefix("::"))
        {
            Some(rest) if !rest.is_empty() => rest.split("::").map(str::to_owned).collect(),
            _ => Vec::new(),
        };
        // folder per controller, ie `admin::user::UserController`
        if code_routing_namespace
            .last()
            .is_some_and(|last: &String| namespace_equals(last, name))
        {
            code_routing_namespace.pop();
        }

        let namespace_segments = code_routing_namespace
            .iter()
            .map(|segment| settings.format_segment(segment, SegmentType::Namespace, type_name))
            .collect();
        let controller_segment = settings.format_segment(name, SegmentType::Controller, type_name);

        let route_properties = declaration
            .resolved_route_properties()
            .into_iter()
            .map(|property| {
                if settings.binders().get(property.type_id()).is_none() {
                    return Err(ModelError::MissingBinder {
                        controller: type_name.to_owned(),
                        property: property.name().to_owned(),
                        type_name: property.type_name(),
                    });
                }
                RouteToken::new(property, type_name, settings)
            })
            .collect::<Result<Vec<_>, _>>()?;

        // the formatter may fold distinct names into one token
        for (i, property) in route_properties.iter().enumerate() {
            if route_properties[..i]
                .iter()
                .any(|known| name_equals(known.token(), property.token()))
            {
                return Err(ModelError::DuplicateToken {
                    action: type_name.to_owned(),
                    token: property.token().to_owned(),
                });
            }
        }

        let actions = descriptor
            .actions()
            .iter()
            .filter(|action| !action.is_non_action())
            .map(|action| ActionNode::build(action, type_name, &route_properties, settings))
            .collect::<Result<Vec<_>, _>>()?;

        if actions.is_empty() {
            return Err(ModelError::NoActions {
                controller: type_name.to_owned(),
            });
        }

        Ok(Self {
            type_id: declaration.type_id(),
            type_name: type_name.to_owned(),
            name: name.to_owned(),
            namespace: namespace.to_owned(),
            is_root,
            code_routing_namespace,
            base_route: settings.base_route().to_vec(),
            namespace_segments,
            controller_segment,
            route_properties,
            actions,
        })
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Type name without the `Controller` suffix.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// Namespace segments relative to the root, unformatted.
    pub fn code_routing_namespace(&self) -> &[String] {
        &self.code_routing_namespace
    }

    pub fn base_route(&self) -> &[String] {
        &self.base_route
    }

    /// Formatted namespace segments.
    pub fn namespace_segments(&self) -> &[String] {
        &self.namespace_segments
    }

    pub fn controller_segment(&self) -> &str {
        &self.controller_segment
    }

    pub fn route_properties(&self) -> &[RouteToken] {
        &self.route_properties
    }

    pub fn actions(&self) -> &[ActionNode] {
        &self.actions
    }

    /// The URL pattern of the controller, ie `admin/{controller}/{tenant}`.
    pub fn url_template(&self) -> String {
        self.join_prefix((!self.is_root).then_some("{controller}"))
    }

    /// The URL every action route of the controller starts with, ie
    /// `admin/User/{tenant}`.
    pub fn controller_url(&self) -> String {
        self.join_prefix((!self.is_root).then_some(self.controller_segment.as_str()))
    }

    /// Formatted controller path without route properties, lowercased.
    fn url_key(&self) -> String {
        self.namespace_segments
            .iter()
            .map(String::as_str)
            .chain((!self.is_root).then_some(self.controller_segment.as_str()))
            .collect::<Vec<_>>()
            .join("/")
            .to_lowercase()
    }

    fn join_prefix(&self, controller: Option<&str>) -> String {
        let properties = self
            .route_properties
            .iter()
            .map(RouteToken::route_segment)
            .collect::<Vec<_>>();

        self.base_route
            .iter()
            .chain(&self.namespace_segments)
            .map(String::as_str)
            .chain(controller)
            .chain(properties.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("/")
    }
}

// ----------------------------------------------------------------------------

/// Every controller under a root controller's namespace.
#[derive(Debug, Clone)]
pub struct ControllerTree {
    controllers: Vec<ControllerNode>,
    root: usize,
}

impl ControllerTree {
    pub fn build<R: Any>(catalog: &Catalog, settings: &RouteSettings) -> Result<Self, ModelError> {
        let root_id = TypeId::of::<R>();
        let root_error = || ModelError::RootNotRegistered {
            root: std::any::type_name::<R>(),
        };

        let root = catalog.get(root_id).ok_or_else(root_error)?;
        let root_namespace = settings
            .root_namespace()
            .unwrap_or(root.declaration().namespace())
            .to_owned();

        let mut seen = HashSet::new();
        let mut controllers = Vec::new();
        let mut root_index = None;

        for descriptor in catalog.iter() {
            let declaration = descriptor.declaration();
            let is_root = declaration.type_id() == root_id;

            if !is_root && !in_namespace(declaration.namespace(), &root_namespace) {
                debug!(
                    controller = declaration.type_name(),
                    namespace = declaration.namespace(),
                    "skipping controller outside of the root namespace"
                );
                continue;
            }

            let node = ControllerNode::build(descriptor, is_root, &root_namespace, settings)?;
            // `admin::UserController` and `admin::user::UserController` share a url
            if !seen.insert(node.url_key()) {
                return Err(ModelError::DuplicateController {
                    namespace: node.namespace().to_owned(),
                    name: node.name().to_owned(),
                });
            }
            debug!(
                controller = node.type_name(),
                url = %node.controller_url(),
                actions = node.actions().len(),
                "discovered controller"
            );

            if is_root {
                root_index = Some(controllers.len());
            }
            controllers.push(node);
        }

        let root = root_index.ok_or_else(root_error)?;

        Ok(Self { controllers, root })
    }

    pub fn root(&self) -> &ControllerNode {
        &self.controllers[self.root]
    }

    /// Controllers in registration order.
    pub fn controllers(&self) -> &[ControllerNode] {
        &self.controllers
    }

    pub fn get(&self, type_id: TypeId) -> Option<&ControllerNode> {
        self.controllers
            .iter()
            .find(|controller| ControllerNode::type_id(controller) == type_id)
    }
}
