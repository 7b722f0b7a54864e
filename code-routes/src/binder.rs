//! Parameter binders: convert a URL segment into a typed value, and
//! describe the literal forms they accept as a regex constraint.
//!
//! Numeric binders only accept the canonical spelling of a value: no
//! leading `+`, no leading zero (except for `0` itself), no negative zero
//! for integers. For every accepted text, formatting the bound value gives
//! back the very same text, so one resource has exactly one URL.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    marker::PhantomData,
    str::FromStr,
    sync::Arc,
};

// ----------------------------------------------------------------------------

/// Culture-dependent symbols used when parsing numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFormat {
    negative_sign: String,
    decimal_separator: String,
}

impl NumberFormat {
    /// `-` and `.`
    pub fn invariant() -> Self {
        Self::new("-", ".")
    }

    pub fn new(negative_sign: impl Into<String>, decimal_separator: impl Into<String>) -> Self {
        Self {
            negative_sign: negative_sign.into(),
            decimal_separator: decimal_separator.into(),
        }
    }

    pub fn negative_sign(&self) -> &str {
        &self.negative_sign
    }

    pub fn decimal_separator(&self) -> &str {
        &self.decimal_separator
    }

    /// Splits a leading negative sign off `value`.
    fn split_sign<'a>(&self, value: &'a str) -> (bool, &'a str) {
        if self.negative_sign.is_empty() {
            return (false, value);
        }
        match value.strip_prefix(self.negative_sign.as_str()) {
            Some(rest) => (true, rest),
            None => (false, value),
        }
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::invariant()
    }
}

// ----------------------------------------------------------------------------

/// A value produced by a [`ParameterBinder`].
pub struct BoundValue(Box<dyn Any + Send + Sync>);

impl BoundValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Box::new(value))
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        match self.0.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(inner) => Err(Self(inner)),
        }
    }
}

impl fmt::Debug for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundValue").finish_non_exhaustive()
    }
}

// ----------------------------------------------------------------------------

/// Binds route tokens of one value type.
///
/// Binders hold no mutable state: the same instance is shared by every
/// route and may be called from any number of threads at once.
pub trait ParameterBinder: Send + Sync + fmt::Debug {
    /// Name of the bound type, for diagnostics.
    fn type_name(&self) -> &'static str;

    /// Parses `value`, or returns `None` when the segment does not match.
    fn try_bind(&self, value: &str, format: &NumberFormat) -> Option<BoundValue>;

    /// Regex fragment describing the accepted literal forms. It is meant to
    /// match a whole segment. `None` accepts any non-empty segment.
    fn constraint(&self, format: &NumberFormat) -> Option<String>;
}

// ----------------------------------------------------------------------------

#[doc(hidden)]
pub trait CanonicalInteger: FromStr + Any + Send + Sync + fmt::Debug {
    const SIGNED: bool;
}

macro_rules! impl_canonical_integer {
    ($signed:literal => $($ty:ty),+) => {
        $(
            impl CanonicalInteger for $ty {
                const SIGNED: bool = $signed;
            }
        )+
    };
}

impl_canonical_integer!(true => i8, i16, i32, i64, i128, isize);
impl_canonical_integer!(false => u8, u16, u32, u64, u128, usize);

/// Binds fixed-width integers written in canonical form.
#[derive(Debug, Default)]
pub struct IntegerBinder<T>(PhantomData<fn() -> T>);

impl<T> IntegerBinder<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: CanonicalInteger> ParameterBinder for IntegerBinder<T> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn try_bind(&self, value: &str, format: &NumberFormat) -> Option<BoundValue> {
        let (negative, digits) = format.split_sign(value);

        if negative && !T::SIGNED {
            return None;
        }
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // disallow leading zero and negative zero
        if digits.starts_with('0') && (digits.len() != 1 || negative) {
            return None;
        }

        let parsed = if negative {
            format!("-{digits}").parse::<T>()
        } else {
            digits.parse::<T>()
        };

        parsed.ok().map(BoundValue::new)
    }

    fn constraint(&self, format: &NumberFormat) -> Option<String> {
        Some(if T::SIGNED && !format.negative_sign().is_empty() {
            format!(
                "0|{}?[1-9][0-9]*",
                regex::escape(format.negative_sign())
            )
        } else {
            String::from("0|[1-9][0-9]*")
        })
    }
}

// ----------------------------------------------------------------------------

#[doc(hidden)]
pub trait CanonicalFloat: FromStr + fmt::Display + fmt::Debug + Any + Send + Sync + Copy {
    fn is_finite(self) -> bool;
}

impl CanonicalFloat for f32 {
    fn is_finite(self) -> bool {
        f32::is_finite(self)
    }
}

impl CanonicalFloat for f64 {
    fn is_finite(self) -> bool {
        f64::is_finite(self)
    }
}

/// Binds finite floating point numbers written in their shortest
/// round-trip form, using the culture decimal separator.
#[derive(Debug, Default)]
pub struct FloatBinder<T>(PhantomData<fn() -> T>);

impl<T> FloatBinder<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: CanonicalFloat> ParameterBinder for FloatBinder<T> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn try_bind(&self, value: &str, format: &NumberFormat) -> Option<BoundValue> {
        let (negative, unsigned) = format.split_sign(value);
        let separator = format.decimal_separator();

        let (integral, fractional) = match unsigned.split_once(separator) {
            Some((integral, fractional)) if !separator.is_empty() => (integral, Some(fractional)),
            _ => (unsigned, None),
        };

        let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if !is_digits(integral) || !fractional.is_none_or(is_digits) {
            return None;
        }

        let mut invariant = String::with_capacity(value.len());
        if negative {
            invariant.push('-');
        }
        invariant.push_str(integral);
        if let Some(fractional) = fractional {
            invariant.push('.');
            invariant.push_str(fractional);
        }

        let parsed = invariant.parse::<T>().ok()?;
        // only the shortest round-trip spelling is accepted
        if !parsed.is_finite() || parsed.to_string() != invariant {
            return None;
        }

        Some(BoundValue::new(parsed))
    }

    fn constraint(&self, format: &NumberFormat) -> Option<String> {
        let sign = if format.negative_sign().is_empty() {
            String::new()
        } else {
            format!("{}?", regex::escape(format.negative_sign()))
        };

        Some(format!(
            "{sign}(?:0|[1-9][0-9]*)(?:{}[0-9]*[1-9])?",
            regex::escape(format.decimal_separator())
        ))
    }
}

// ----------------------------------------------------------------------------

/// Binds `true` and `false`.
#[derive(Debug, Default)]
pub struct BoolBinder;

impl ParameterBinder for BoolBinder {
    fn type_name(&self) -> &'static str {
        "bool"
    }

    fn try_bind(&self, value: &str, _format: &NumberFormat) -> Option<BoundValue> {
        match value {
            "true" => Some(BoundValue::new(true)),
            "false" => Some(BoundValue::new(false)),
            _ => None,
        }
    }

    fn constraint(&self, _format: &NumberFormat) -> Option<String> {
        Some(String::from("true|false"))
    }
}

/// Binds any non-empty segment as a [`String`].
#[derive(Debug, Default)]
pub struct StringBinder;

impl ParameterBinder for StringBinder {
    fn type_name(&self) -> &'static str {
        "alloc::string::String"
    }

    fn try_bind(&self, value: &str, _format: &NumberFormat) -> Option<BoundValue> {
        (!value.is_empty()).then(|| BoundValue::new(value.to_owned()))
    }

    fn constraint(&self, _format: &NumberFormat) -> Option<String> {
        None
    }
}

// ----------------------------------------------------------------------------

/// Binders keyed by the type they produce.
///
/// The default registry knows every primitive integer, `f32`, `f64`,
/// `bool` and `String`. Registering a binder for a type that already has
/// one replaces it.
#[derive(Clone)]
pub struct BinderRegistry {
    inner: HashMap<TypeId, Arc<dyn ParameterBinder>>,
}

impl BinderRegistry {
    /// A registry without any binder.
    pub fn empty() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    pub fn register<T: Any>(&mut self, binder: impl ParameterBinder + 'static) -> &mut Self {
        self.inner.insert(TypeId::of::<T>(), Arc::new(binder));
        self
    }

    pub fn with_binder<T: Any>(mut self, binder: impl ParameterBinder + 'static) -> Self {
        self.register::<T>(binder);
        self
    }

    pub fn get(&self, type_id: TypeId) -> Option<&Arc<dyn ParameterBinder>> {
        self.inner.get(&type_id)
    }

    pub fn get_for<T: Any>(&self) -> Option<&Arc<dyn ParameterBinder>> {
        self.get(TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

macro_rules! register_binders {
    ($registry:ident, $binder:ident => $($ty:ty),+) => {
        $(
            $registry.register::<$ty>($binder::<$ty>::new());
        )+
    };
}

impl Default for BinderRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();

        register_binders!(registry, IntegerBinder => i8, i16, i32, i64, i128, isize);
        register_binders!(registry, IntegerBinder => u8, u16, u32, u64, u128, usize);
        register_binders!(registry, FloatBinder => f32, f64);
        registry.register::<bool>(BoolBinder);
        registry.register::<String>(StringBinder);

        registry
    }
}

impl fmt::Debug for BinderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self
            .inner
            .values()
            .map(|binder| binder.type_name())
            .collect::<Vec<_>>();
        names.sort_unstable();

        f.debug_struct("BinderRegistry")
            .field("types", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bind<T: Any + Copy>(text: &str) -> Option<T> {
        let registry = BinderRegistry::default();
        registry
            .get_for::<T>()
            .and_then(|binder| binder.try_bind(text, &NumberFormat::invariant()))
            .and_then(|value| value.downcast_ref::<T>().copied())
    }

    fn constraint_matches<T: Any>(text: &str, format: &NumberFormat) -> bool {
        let constraint = BinderRegistry::default()
            .get_for::<T>()
            .and_then(|binder| binder.constraint(format))
            .unwrap_or_default();
        regex::Regex::new(&format!("^(?:{constraint})$"))
            .map(|re| re.is_match(text))
            .unwrap_or(false)
    }

    #[test]
    fn integers_are_canonical() {
        assert_eq!(bind::<i32>("0"), Some(0));
        assert_eq!(bind::<i32>("42"), Some(42));
        assert_eq!(bind::<i32>("-42"), Some(-42));
        assert_eq!(bind::<i32>("01"), None);
        assert_eq!(bind::<i32>("+5"), None);
        assert_eq!(bind::<i32>("-0"), None);
        assert_eq!(bind::<i32>("-05"), None);
        assert_eq!(bind::<i32>("00"), None);
        assert_eq!(bind::<i32>(""), None);
        assert_eq!(bind::<i32>(" 1"), None);
        assert_eq!(bind::<i32>("2147483648"), None);
        assert_eq!(bind::<i32>("-2147483648"), Some(i32::MIN));
    }

    #[test]
    fn unsigned_rejects_sign() {
        assert_eq!(bind::<u16>("65535"), Some(u16::MAX));
        assert_eq!(bind::<u16>("65536"), None);
        assert_eq!(bind::<u16>("-1"), None);
        assert_eq!(bind::<u16>("0"), Some(0));
        assert_eq!(bind::<u16>("007"), None);
    }

    #[test]
    fn floats_are_canonical() {
        assert_eq!(bind::<f64>("1.5"), Some(1.5));
        assert_eq!(bind::<f64>("1"), Some(1.0));
        assert_eq!(bind::<f64>("-0.25"), Some(-0.25));
        assert_eq!(bind::<f64>("1.50"), None);
        assert_eq!(bind::<f64>("1.0"), None);
        assert_eq!(bind::<f64>("01.5"), None);
        assert_eq!(bind::<f64>(".5"), None);
        assert_eq!(bind::<f64>("1e3"), None);
        assert_eq!(bind::<f64>("inf"), None);
        assert_eq!(bind::<f64>("NaN"), None);
    }

    #[test]
    fn culture_aware_floats() {
        let format = NumberFormat::new("-", ",");
        let binder = FloatBinder::<f64>::new();

        let value = binder.try_bind("-2,5", &format).and_then(|v| v.downcast::<f64>().ok());
        assert_eq!(value, Some(-2.5));
        assert!(binder.try_bind("2.5", &format).is_none());
        assert!(constraint_matches::<f64>("-2,5", &format));
        assert!(!constraint_matches::<f64>("2.5", &format));
    }

    #[test]
    fn culture_aware_integers() {
        let format = NumberFormat::new("~", ".");
        let binder = IntegerBinder::<i64>::new();

        let value = binder.try_bind("~7", &format).and_then(|v| v.downcast::<i64>().ok());
        assert_eq!(value, Some(-7));
        assert!(binder.try_bind("-7", &format).is_none());
        assert!(constraint_matches::<i64>("~7", &format));
    }

    #[test]
    fn bool_and_string() {
        assert_eq!(bind::<bool>("true"), Some(true));
        assert_eq!(bind::<bool>("True"), None);

        let registry = BinderRegistry::default();
        let binder = registry.get_for::<String>().map(Arc::clone);
        let binder = binder.as_deref();
        assert!(binder.is_some_and(|b| b.constraint(&NumberFormat::invariant()).is_none()));
        assert!(binder.is_some_and(|b| b.try_bind("", &NumberFormat::invariant()).is_none()));
        let bound = binder
            .and_then(|b| b.try_bind("hello", &NumberFormat::invariant()))
            .and_then(|v| v.downcast::<String>().ok());
        assert_eq!(bound.as_deref(), Some("hello"));
    }

    #[test]
    fn constraints_reject_non_canonical_forms() {
        let format = NumberFormat::invariant();
        assert!(constraint_matches::<i32>("0", &format));
        assert!(constraint_matches::<i32>("42", &format));
        assert!(constraint_matches::<i32>("-42", &format));
        assert!(!constraint_matches::<i32>("01", &format));
        assert!(!constraint_matches::<i32>("+5", &format));
        assert!(!constraint_matches::<u32>("-5", &format));
    }

    #[derive(Debug)]
    struct UpperBinder;

    impl ParameterBinder for UpperBinder {
        fn type_name(&self) -> &'static str {
            "alloc::string::String"
        }

        fn try_bind(&self, value: &str, _format: &NumberFormat) -> Option<BoundValue> {
            value
                .bytes()
                .all(|b| b.is_ascii_uppercase())
                .then(|| BoundValue::new(value.to_owned()))
        }

        fn constraint(&self, _format: &NumberFormat) -> Option<String> {
            Some(String::from("[A-Z]+"))
        }
    }

    #[test]
    fn register_overrides_builtin() {
        let registry = BinderRegistry::default().with_binder::<String>(UpperBinder);
        let binder = registry.get_for::<String>();
        assert!(binder.is_some_and(|b| b.try_bind("abc", &NumberFormat::invariant()).is_none()));
        assert_eq!(registry.len(), BinderRegistry::default().len());
    }

    proptest! {
        #[test]
        fn i32_binds_iff_round_trips(text in "[-+0-9]{1,11}") {
            let expected = text.parse::<i32>().ok().filter(|v| v.to_string() == text);
            prop_assert_eq!(bind::<i32>(&text), expected);
        }

        #[test]
        fn u8_binds_iff_round_trips(text in "[-+0-9]{1,4}") {
            let expected = text.parse::<u8>().ok().filter(|v| v.to_string() == text);
            prop_assert_eq!(bind::<u8>(&text), expected);
        }

        #[test]
        fn f64_binds_iff_round_trips(text in "-?[0-9]{1,4}(\\.[0-9]{1,3})?") {
            let expected = text
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && v.to_string() == text);
            prop_assert_eq!(bind::<f64>(&text), expected);
        }

        #[test]
        fn bound_integers_match_constraint(value in any::<i64>()) {
            let text = value.to_string();
            prop_assert!(bind::<i64>(&text).is_some());
            prop_assert!(constraint_matches::<i64>(&text, &NumberFormat::invariant()));
        }
    }
}
