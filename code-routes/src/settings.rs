use crate::{
    binder::{BinderRegistry, NumberFormat, ParameterBinder},
    format::{self, FormatterArgs, RouteFormatter, SegmentType},
};
use std::{any::Any, fmt, sync::Arc};

/// Options for one route table build.
///
/// Settings are immutable once handed to
/// [`RouteTable::build`](crate::RouteTable::build); build the value with the
/// `with_*` methods.
#[derive(Clone)]
pub struct RouteSettings {
    base_route: Vec<String>,
    formatter: RouteFormatter,
    binders: BinderRegistry,
    number_format: NumberFormat,
    root_namespace: Option<String>,
    default_action: String,
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            base_route: Vec::new(),
            formatter: format::identity(),
            binders: BinderRegistry::default(),
            number_format: NumberFormat::invariant(),
            root_namespace: None,
            default_action: String::from("Index"),
        }
    }
}

impl RouteSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix prepended to every generated route, ie `api/v1`.
    pub fn with_base_route(mut self, base_route: impl AsRef<str>) -> Self {
        self.base_route = base_route
            .as_ref()
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .collect();
        self
    }

    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&FormatterArgs<'_>) -> String + Send + Sync + 'static,
    {
        self.formatter = Arc::new(formatter);
        self
    }

    pub fn with_route_formatter(mut self, formatter: RouteFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_binders(mut self, binders: BinderRegistry) -> Self {
        self.binders = binders;
        self
    }

    /// Adds a binder, or replaces the one registered for `T`.
    pub fn with_binder<T: Any>(mut self, binder: impl ParameterBinder + 'static) -> Self {
        self.binders.register::<T>(binder);
        self
    }

    pub fn with_number_format(mut self, number_format: NumberFormat) -> Self {
        self.number_format = number_format;
        self
    }

    /// Namespace the controller tree hangs from, instead of the root
    /// controller's own module path.
    pub fn with_root_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.root_namespace = Some(namespace.into());
        self
    }

    /// Action whose segment is omitted from its parameterless routes.
    pub fn with_default_action(mut self, action: impl Into<String>) -> Self {
        self.default_action = action.into();
        self
    }

    pub fn base_route(&self) -> &[String] {
        &self.base_route
    }

    pub fn binders(&self) -> &BinderRegistry {
        &self.binders
    }

    pub fn number_format(&self) -> &NumberFormat {
        &self.number_format
    }

    pub fn root_namespace(&self) -> Option<&str> {
        self.root_namespace.as_deref()
    }

    pub fn default_action(&self) -> &str {
        &self.default_action
    }

    pub(crate) fn format_segment(
        &self,
        original_segment: &str,
        segment_type: SegmentType,
        controller: &str,
    ) -> String {
        (self.formatter)(&FormatterArgs {
            original_segment,
            segment_type,
            controller,
        })
    }
}

impl fmt::Debug for RouteSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteSettings")
            .field("base_route", &self.base_route)
            .field("binders", &self.binders)
            .field("number_format", &self.number_format)
            .field("root_namespace", &self.root_namespace)
            .field("default_action", &self.default_action)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_route_is_split() {
        let settings = RouteSettings::new().with_base_route("/api//v1/");
        assert_eq!(settings.base_route(), ["api", "v1"]);
    }

    #[test]
    fn formatter_is_applied() {
        let settings = RouteSettings::new().with_formatter(|args| {
            format!("{}-{:?}", args.original_segment, args.segment_type)
        });
        assert_eq!(
            settings.format_segment("User", SegmentType::Controller, "UserController"),
            "User-Controller"
        );
    }
}
