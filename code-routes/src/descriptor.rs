//! Static registration of controllers, actions and parameters.
//!
//! These descriptors stand in for runtime type discovery: a controller
//! type tells the engine its name, the module it lives in, the route
//! properties it carries and the actions it exposes. The
//! [`Controller`](macro@crate::Controller) derive and the
//! [`actions`](macro@crate::actions) attribute write them for you, but they
//! can be assembled by hand as well.

use crate::verb::Verb;
use std::{
    any::{Any, TypeId},
    collections::BTreeSet,
};

/// A type usable as a controller.
pub trait Controller: Any {
    fn declaration() -> ControllerDeclaration;
}

/// The actions exposed by a controller type.
pub trait Actions {
    fn actions() -> Vec<ActionDescriptor>;
}

// ----------------------------------------------------------------------------

/// Where the value of an action parameter comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterSource {
    /// A URL segment.
    Route,
    Body,
    Query,
    /// Not bound by routing at all.
    Excluded,
}

/// An action parameter or a controller route property.
#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    name: String,
    type_id: TypeId,
    type_name: &'static str,
    source: ParameterSource,
    optional: bool,
    default_value: Option<String>,
    token_name: Option<String>,
    constraint: Option<String>,
}

impl ParameterDescriptor {
    pub fn new<T: Any>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            source: ParameterSource::Route,
            optional: false,
            default_value: None,
            token_name: None,
            constraint: None,
        }
    }

    /// The parameter may be left out of the URL.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Value used when the parameter is left out of the URL. Implies
    /// [`optional`](Self::optional).
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.optional = true;
        self.default_value = Some(value.into());
        self
    }

    /// Name of the URL token, when it differs from the parameter name.
    pub fn token_name(mut self, token: impl Into<String>) -> Self {
        self.token_name = Some(token.into());
        self
    }

    /// Regex constraint used instead of the one of the type binder.
    pub fn constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    pub fn from_body(mut self) -> Self {
        self.source = ParameterSource::Body;
        self
    }

    pub fn from_query(mut self) -> Self {
        self.source = ParameterSource::Query;
        self
    }

    pub fn excluded(mut self) -> Self {
        self.source = ParameterSource::Excluded;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Last path segment of the type name, ie `i32` or `String`.
    pub fn short_type_name(&self) -> &'static str {
        short_name(self.type_name)
    }

    pub fn source(&self) -> ParameterSource {
        self.source
    }

    pub fn is_route(&self) -> bool {
        self.source == ParameterSource::Route
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn get_default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    pub fn get_token_name(&self) -> Option<&str> {
        self.token_name.as_deref()
    }

    /// Name of the token in templates, before formatting
    pub fn route_token(&self) -> &str {
        self.get_token_name().unwrap_or(self.name())
    }

    pub fn get_constraint(&self) -> Option<&str> {
        self.constraint.as_deref()
    }
}

pub(crate) fn short_name(type_name: &str) -> &str {
    // generic arguments may contain `::` too
    let head = type_name.split('<').next().unwrap_or(type_name);
    match head.rfind("::") {
        Some(idx) => &type_name[idx + 2..],
        None => type_name,
    }
}

// ----------------------------------------------------------------------------

/// One action of a controller.
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    method_name: String,
    name: Option<String>,
    parameters: Vec<ParameterDescriptor>,
    custom_route: Option<String>,
    absolute: bool,
    verbs: Option<BTreeSet<Verb>>,
    require_route_parameters: bool,
    non_action: bool,
}

impl ActionDescriptor {
    pub fn new(method_name: impl Into<String>) -> Self {
        Self {
            method_name: method_name.into(),
            name: None,
            parameters: Vec::new(),
            custom_route: None,
            absolute: false,
            verbs: None,
            require_route_parameters: false,
            non_action: false,
        }
    }

    /// Action name, when it differs from the method name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Route template relative to the controller, used instead of the
    /// generated ones. `{action}` is replaced by the action segment.
    pub fn custom_route(mut self, route: impl Into<String>) -> Self {
        self.custom_route = Some(route.into());
        self
    }

    /// The custom route does not hang from the controller URL.
    pub fn absolute(mut self) -> Self {
        self.absolute = true;
        self
    }

    pub fn verb(mut self, verb: Verb) -> Self {
        self.verbs.get_or_insert_with(BTreeSet::new).insert(verb);
        self
    }

    pub fn verbs(mut self, verbs: impl IntoIterator<Item = Verb>) -> Self {
        self.verbs.get_or_insert_with(BTreeSet::new).extend(verbs);
        self
    }

    /// Marks an overload as intentionally disambiguated by its route
    /// parameters.
    pub fn require_route_parameters(mut self) -> Self {
        self.require_route_parameters = true;
        self
    }

    /// The method is not an action.
    pub fn non_action(mut self) -> Self {
        self.non_action = true;
        self
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// The action name, defaulting to the method name.
    pub fn action_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.method_name)
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    pub fn get_custom_route(&self) -> Option<&str> {
        self.custom_route.as_deref()
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn get_verbs(&self) -> Option<&BTreeSet<Verb>> {
        self.verbs.as_ref()
    }

    pub fn requires_route_parameters(&self) -> bool {
        self.require_route_parameters
    }

    pub fn is_non_action(&self) -> bool {
        self.non_action
    }
}

// ----------------------------------------------------------------------------

/// A controller type, without its actions.
#[derive(Debug, Clone)]
pub struct ControllerDeclaration {
    type_id: TypeId,
    type_name: String,
    namespace: String,
    route_properties: Vec<ParameterDescriptor>,
    base: Option<Box<ControllerDeclaration>>,
}

impl ControllerDeclaration {
    /// `namespace` is the module path of the type, ie `module_path!()`.
    pub fn new<T: Any>(type_name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name.into(),
            namespace: namespace.into(),
            route_properties: Vec::new(),
            base: None,
        }
    }

    /// A token every route of this controller carries.
    pub fn route_property(mut self, property: ParameterDescriptor) -> Self {
        self.route_properties.push(property);
        self
    }

    /// Controller whose route properties come before this one's.
    pub fn extends(mut self, base: ControllerDeclaration) -> Self {
        self.base = Some(Box::new(base));
        self
    }

    pub fn with_actions(
        self,
        actions: impl IntoIterator<Item = ActionDescriptor>,
    ) -> ControllerDescriptor {
        ControllerDescriptor {
            declaration: self,
            actions: actions.into_iter().collect(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn base(&self) -> Option<&ControllerDeclaration> {
        self.base.as_deref()
    }

    /// Route properties from the farthest base to this type. A property
    /// whose token is redeclared by a derived type is kept at its first
    /// position.
    pub fn resolved_route_properties(&self) -> Vec<&ParameterDescriptor> {
        let mut chain = Vec::new();
        let mut current = Some(self);
        while let Some(declaration) = current {
            chain.push(declaration);
            current = declaration.base();
        }

        let mut properties: Vec<&ParameterDescriptor> = Vec::new();
        for declaration in chain.into_iter().rev() {
            for property in &declaration.route_properties {
                if !properties
                    .iter()
                    .any(|known| known.route_token().eq_ignore_ascii_case(property.route_token()))
                {
                    properties.push(property);
                }
            }
        }
        properties
    }
}

/// A controller type and its actions.
#[derive(Debug, Clone)]
pub struct ControllerDescriptor {
    declaration: ControllerDeclaration,
    actions: Vec<ActionDescriptor>,
}

impl ControllerDescriptor {
    pub fn of<T: Controller + Actions>() -> Self {
        T::declaration().with_actions(T::actions())
    }

    pub fn action(mut self, action: ActionDescriptor) -> Self {
        self.actions.push(action);
        self
    }

    pub fn declaration(&self) -> &ControllerDeclaration {
        &self.declaration
    }

    pub fn actions(&self) -> &[ActionDescriptor] {
        &self.actions
    }
}

// ----------------------------------------------------------------------------

/// The set of controller types routes are derived from, in registration
/// order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    controllers: Vec<ControllerDescriptor>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn controller<T: Controller + Actions>(self) -> Self {
        self.descriptor(ControllerDescriptor::of::<T>())
    }

    pub fn descriptor(mut self, descriptor: ControllerDescriptor) -> Self {
        self.controllers.push(descriptor);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &ControllerDescriptor> {
        self.controllers.iter()
    }

    pub fn get(&self, type_id: TypeId) -> Option<&ControllerDescriptor> {
        self.controllers
            .iter()
            .find(|descriptor| descriptor.declaration().type_id() == type_id)
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}
