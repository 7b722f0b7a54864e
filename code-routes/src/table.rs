use crate::{
    binder::{BoundValue, NumberFormat},
    descriptor::Catalog,
    error::{Error, UrlError},
    model::{ControllerTree, name_equals},
    settings::RouteSettings,
    template::{self, RouteTemplate, Segment},
    validate,
    verb::Verb,
};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use std::{
    any::{Any, TypeId},
    borrow::Cow,
};
use tracing::{info, warn};

/// Escaped in a path segment: the URL path set plus `/` and `%`.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%');

/// URL pattern of a registered controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerRoute {
    type_id: TypeId,
    type_name: String,
    url_template: String,
    controller_url: String,
}

impl ControllerRoute {
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// ie `admin/{controller}`
    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    /// ie `admin/User`
    pub fn controller_url(&self) -> &str {
        &self.controller_url
    }
}

/// A route parameter bound from a request path, or from a default.
#[derive(Debug)]
pub struct RouteValue {
    name: String,
    text: String,
    value: BoundValue,
}

impl RouteValue {
    /// Parameter (or route property) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The segment as it was matched, percent-decoded.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn value(&self) -> &BoundValue {
        &self.value
    }
}

/// Result of matching a request against the table.
#[derive(Debug)]
pub struct RouteMatch {
    order: usize,
    controller: TypeId,
    controller_name: String,
    action: String,
    method_name: String,
    values: Vec<RouteValue>,
}

impl RouteMatch {
    /// Order of the matched route.
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn controller(&self) -> TypeId {
        self.controller
    }

    pub fn is_controller<C: Any>(&self) -> bool {
        self.controller == TypeId::of::<C>()
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

    pub fn values(&self) -> &[RouteValue] {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&RouteValue> {
        self.values.iter().find(|value| name_equals(value.name(), name))
    }

    /// Typed value of a parameter, `None` when absent or of another type.
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.value(name).and_then(|value| value.value().downcast_ref())
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.value(name).map(RouteValue::text)
    }
}

// ----------------------------------------------------------------------------

/// Every route of a root controller's tree, in registration order.
///
/// ```
/// # use code_routes::{Catalog, ControllerDeclaration, ActionDescriptor, RouteSettings, RouteTable};
/// struct HomeController;
///
/// let catalog = Catalog::new().descriptor(
///     ControllerDeclaration::new::<HomeController>("HomeController", "app")
///         .with_actions([ActionDescriptor::new("Index"), ActionDescriptor::new("About")]),
/// );
/// let table = RouteTable::build::<HomeController>(&catalog, &RouteSettings::default())?;
///
/// assert_eq!(table.url_for::<HomeController>("About", &[])?, "/About");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<RouteTemplate>,
    controllers: Vec<ControllerRoute>,
    number_format: NumberFormat,
}

impl RouteTable {
    /// Discovers the controllers under `R`, validates them and derives
    /// their routes. Nothing is returned unless the whole tree is valid.
    pub fn build<R: Any>(catalog: &Catalog, settings: &RouteSettings) -> Result<Self, Error> {
        let tree = ControllerTree::build::<R>(catalog, settings)
            .inspect_err(|err| warn!(%err, "invalid controller tree"))?;
        validate::validate(&tree)?;

        let routes = template::build_templates(&tree, settings);
        let controllers = tree
            .controllers()
            .iter()
            .map(|controller| ControllerRoute {
                type_id: controller.type_id(),
                type_name: controller.type_name().to_owned(),
                url_template: controller.url_template(),
                controller_url: controller.controller_url(),
            })
            .collect::<Vec<_>>();

        info!(
            root = tree.root().type_name(),
            controllers = controllers.len(),
            routes = routes.len(),
            "built route table"
        );

        Ok(Self {
            routes,
            controllers,
            number_format: settings.number_format().clone(),
        })
    }

    pub fn routes(&self) -> &[RouteTemplate] {
        &self.routes
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteTemplate> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn controllers(&self) -> &[ControllerRoute] {
        &self.controllers
    }

    pub fn controller<C: Any>(&self) -> Option<&ControllerRoute> {
        self.controllers
            .iter()
            .find(|controller| controller.type_id == TypeId::of::<C>())
    }

    /// Generates the URL of an action, ie `/admin/User/Edit/5`.
    ///
    /// The route chosen is the first one of the action whose tokens are
    /// exactly the given names. Values are percent-encoded, and must not be
    /// empty.
    pub fn url_for<C: Any>(&self, action: &str, values: &[(&str, &str)]) -> Result<String, UrlError> {
        self.url_for_type(TypeId::of::<C>(), action, values)
    }

    pub fn url_for_type(
        &self,
        controller: TypeId,
        action: &str,
        values: &[(&str, &str)],
    ) -> Result<String, UrlError> {
        let mut candidates = self
            .routes
            .iter()
            .filter(|route| route.controller() == controller && name_equals(route.action(), action))
            .peekable();

        if candidates.peek().is_none() {
            let controller = self
                .controllers
                .iter()
                .find(|c| c.type_id == controller)
                .map_or_else(|| format!("{controller:?}"), |c| c.type_name.clone());
            return Err(UrlError::UnknownAction {
                controller,
                action: action.to_owned(),
            });
        }

        let route = candidates
            .find(|route| {
                route.tokens().len() == values.len()
                    && route
                        .tokens()
                        .iter()
                        .all(|token| values.iter().any(|(name, _)| token.matches_name(name)))
            })
            .ok_or(UrlError::ParametersMismatch)?;

        let mut url = String::new();
        for segment in route.segments() {
            url.push('/');
            match segment {
                Segment::Literal(text) => url.push_str(text),
                Segment::Token(token) => {
                    let token = route.token(token).ok_or(UrlError::ParametersMismatch)?;
                    let (_, value) = values
                        .iter()
                        .find(|(name, _)| token.matches_name(name))
                        .ok_or(UrlError::ParametersMismatch)?;

                    if token.bind(value, &self.number_format).is_none() {
                        return Err(UrlError::InvalidValue {
                            name: token.name().to_owned(),
                            value: (*value).to_owned(),
                        });
                    }
                    url.extend(utf8_percent_encode(value, SEGMENT));
                }
            }
        }
        if url.is_empty() {
            url.push('/');
        }

        Ok(url)
    }

    /// Finds the first route accepting `verb` whose template matches `path`.
    /// Segments are percent-decoded before matching.
    pub fn recognize(&self, verb: Verb, path: &str) -> Option<RouteMatch> {
        let segments = split_path(path)?;
        self.routes
            .iter()
            .filter(|route| route.allows(verb))
            .find_map(|route| self.bind(route, &segments))
    }

    /// True when some route matches `path`, whatever its verbs.
    pub fn matches_path(&self, path: &str) -> bool {
        let Some(segments) = split_path(path) else {
            return false;
        };
        self.routes
            .iter()
            .any(|route| self.bind(route, &segments).is_some())
    }

    fn bind(&self, route: &RouteTemplate, segments: &[Cow<'_, str>]) -> Option<RouteMatch> {
        if route.segments().len() != segments.len() {
            return None;
        }

        let mut values = Vec::new();
        for (segment, text) in route.segments().iter().zip(segments) {
            match segment {
                Segment::Literal(literal) => {
                    if !literal.eq_ignore_ascii_case(text) {
                        return None;
                    }
                }
                Segment::Token(token) => {
                    let token = route.token(token)?;
                    values.push(RouteValue {
                        name: token.name().to_owned(),
                        text: text.clone().into_owned(),
                        value: token.bind(text, &self.number_format)?,
                    });
                }
            }
        }

        for token in route.omitted() {
            let Some(default) = token.default_value() else {
                continue;
            };
            if let Some(value) = token.bind(default, &self.number_format) {
                values.push(RouteValue {
                    name: token.name().to_owned(),
                    text: default.to_owned(),
                    value,
                });
            }
        }

        Some(RouteMatch {
            order: route.order(),
            controller: route.controller(),
            controller_name: route.controller_name().to_owned(),
            action: route.action().to_owned(),
            method_name: route.method_name().to_owned(),
            values,
        })
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a RouteTemplate;
    type IntoIter = std::slice::Iter<'a, RouteTemplate>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}

/// Non-empty segments of `path`, decoded. `None` when a segment is not
/// valid UTF-8 once decoded.
fn split_path(path: &str) -> Option<Vec<Cow<'_, str>>> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| percent_decode_str(segment).decode_utf8().ok())
        .collect()
}
