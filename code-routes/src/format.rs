//! Turns identifiers (namespace segments, controller and action names,
//! token names) into URL segments.
//!
//! Only derived segments go through the formatter. Literals written in a
//! custom route are used as they are.

use regex::Regex;
use std::sync::{Arc, LazyLock};

/// What an identifier is being formatted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentType {
    Namespace,
    Controller,
    Action,
    Token,
}

/// Input of a [`RouteFormatter`].
#[derive(Debug, Clone, Copy)]
pub struct FormatterArgs<'a> {
    /// The identifier as declared.
    pub original_segment: &'a str,
    pub segment_type: SegmentType,
    /// Type name of the controller the segment belongs to.
    pub controller: &'a str,
}

/// Formats route segments. It must be a pure function of its arguments:
/// results are computed once per node and reused.
pub type RouteFormatter = Arc<dyn Fn(&FormatterArgs<'_>) -> String + Send + Sync>;

/// Keeps identifiers as they are.
pub fn identity() -> RouteFormatter {
    Arc::new(|args| args.original_segment.to_owned())
}

pub fn lower_case() -> RouteFormatter {
    Arc::new(|args| args.original_segment.to_lowercase())
}

static WORD_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([a-z0-9])([A-Z])").expect("word boundary pattern is valid")
});

/// `UserProfile` and `user_profile` both become `user-profile`. Tokens are
/// kept as declared.
pub fn hyphenate() -> RouteFormatter {
    Arc::new(|args| match args.segment_type {
        SegmentType::Token => args.original_segment.to_owned(),
        _ => WORD_BOUNDARY
            .replace_all(args.original_segment, "$1-$2")
            .replace('_', "-")
            .to_lowercase(),
    })
}
