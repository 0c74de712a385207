//! Multi-field predicate filtering over resource listings.
//!
//! A [`FilterSpec`] names, per field, a substring or regex predicate plus
//! exact-match predicates on the enumerated ACL fields. Active predicates are
//! ANDed. Compilation validates everything up front, so a bad regex is
//! rejected before a single row is looked at.

use std::borrow::Cow;
use std::fmt;
use std::mem;

use regex::{Regex, RegexBuilder};

use crate::admin::{
    AclBinding, AclOperation, AclPermissionType, PatternType, ResourceType, TopicSummary,
};
use crate::core::errors::AdminError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Substring,
    Regex,
}

/// A text predicate on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPredicate {
    pub pattern: String,
    pub mode: MatchMode,
    pub case_sensitive: bool,
}

impl TextPredicate {
    pub fn substring(pattern: impl Into<String>, case_sensitive: bool) -> Self {
        Self {
            pattern: pattern.into(),
            mode: MatchMode::Substring,
            case_sensitive,
        }
    }

    pub fn regex(pattern: impl Into<String>, case_sensitive: bool) -> Self {
        Self {
            pattern: pattern.into(),
            mode: MatchMode::Regex,
            case_sensitive,
        }
    }

    /// Blank patterns impose no constraint.
    pub fn is_active(&self) -> bool {
        !self.pattern.trim().is_empty()
    }
}

/// Exact-match predicate on an enumerated field. `Any` means no constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
    Operation(AclOperation),
    Permission(AclPermissionType),
    Resource(ResourceType),
    Pattern(PatternType),
}

impl KindFilter {
    pub fn is_unconstrained(&self) -> bool {
        match self {
            KindFilter::Operation(op) => *op == AclOperation::Any,
            KindFilter::Permission(p) => *p == AclPermissionType::Any,
            KindFilter::Resource(r) => *r == ResourceType::Any,
            KindFilter::Pattern(p) => *p == PatternType::Any,
        }
    }

    pub fn field_name(&self) -> &'static str {
        match self {
            KindFilter::Operation(_) => "operation",
            KindFilter::Permission(_) => "permission",
            KindFilter::Resource(_) => "resource type",
            KindFilter::Pattern(_) => "pattern type",
        }
    }
}

/// A row the engine can filter.
pub trait FilterRow {
    type Field: Copy + Eq + fmt::Debug;

    /// Text rendering of `field` used by substring and regex predicates.
    fn text(&self, field: Self::Field) -> Cow<'_, str>;

    /// Whether rows of this type carry the enumerated field `filter` tests.
    fn supports_kind(filter: &KindFilter) -> bool;

    fn kind_matches(&self, filter: &KindFilter) -> bool;
}

/// The full set of predicates for one resource kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec<R: FilterRow> {
    text: Vec<(R::Field, TextPredicate)>,
    kinds: Vec<KindFilter>,
}

impl<R: FilterRow> Default for FilterSpec<R> {
    fn default() -> Self {
        Self {
            text: Vec::new(),
            kinds: Vec::new(),
        }
    }
}

impl<R: FilterRow> FilterSpec<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn substring(self, field: R::Field, pattern: impl Into<String>, case_sensitive: bool) -> Self {
        self.predicate(field, TextPredicate::substring(pattern, case_sensitive))
    }

    pub fn regex(self, field: R::Field, pattern: impl Into<String>, case_sensitive: bool) -> Self {
        self.predicate(field, TextPredicate::regex(pattern, case_sensitive))
    }

    /// Sets the predicate for `field`, replacing any previous one.
    pub fn predicate(mut self, field: R::Field, predicate: TextPredicate) -> Self {
        self.set(field, predicate);
        self
    }

    /// Sets an enumerated-field predicate, replacing one on the same field.
    pub fn kind(mut self, filter: KindFilter) -> Self {
        self.kinds
            .retain(|k| mem::discriminant(k) != mem::discriminant(&filter));
        self.kinds.push(filter);
        self
    }

    pub fn set(&mut self, field: R::Field, predicate: TextPredicate) {
        match self.text.iter_mut().find(|(f, _)| *f == field) {
            Some((_, existing)) => *existing = predicate,
            None => self.text.push((field, predicate)),
        }
    }

    pub fn remove(&mut self, field: R::Field) {
        self.text.retain(|(f, _)| *f != field);
    }

    pub fn get(&self, field: R::Field) -> Option<&TextPredicate> {
        self.text.iter().find(|(f, _)| *f == field).map(|(_, p)| p)
    }

    /// True when no predicate would constrain anything.
    pub fn is_empty(&self) -> bool {
        self.text.iter().all(|(_, p)| !p.is_active())
            && self.kinds.iter().all(KindFilter::is_unconstrained)
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Substring { needle: String, case_sensitive: bool },
    Regex(Regex),
}

impl Matcher {
    fn matches(&self, value: &str) -> bool {
        match self {
            Matcher::Substring {
                needle,
                case_sensitive: true,
            } => value.contains(needle.as_str()),
            Matcher::Substring {
                needle,
                case_sensitive: false,
            } => value.to_lowercase().contains(needle.as_str()),
            Matcher::Regex(re) => re.is_match(value),
        }
    }
}

/// A validated [`FilterSpec`], reusable across repeated applications.
#[derive(Debug, Clone)]
pub struct CompiledFilter<R: FilterRow> {
    kinds: Vec<KindFilter>,
    text: Vec<(R::Field, Matcher)>,
}

impl<R: FilterRow> CompiledFilter<R> {
    /// A filter that lets every row through.
    pub fn pass_through() -> Self {
        Self {
            kinds: Vec::new(),
            text: Vec::new(),
        }
    }

    pub fn is_pass_through(&self) -> bool {
        self.kinds.is_empty() && self.text.is_empty()
    }

    /// Evaluates the active predicates, stopping at the first that fails.
    pub fn matches(&self, row: &R) -> bool {
        self.kinds.iter().all(|k| row.kind_matches(k))
            && self
                .text
                .iter()
                .all(|(field, matcher)| matcher.matches(&row.text(*field)))
    }

    /// Positions of the matching rows, in their original order.
    pub fn matching_indices(&self, rows: &[R]) -> Vec<usize> {
        rows.iter()
            .enumerate()
            .filter(|(_, row)| self.matches(row))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Stateless evaluator of [`FilterSpec`]s.
pub struct FilterEngine;

impl FilterEngine {
    /// Drops inactive predicates and builds every regex. Fails on the first
    /// invalid pattern or on an enumerated predicate the row type lacks.
    pub fn compile<R: FilterRow>(spec: &FilterSpec<R>) -> Result<CompiledFilter<R>, AdminError> {
        let mut kinds = Vec::new();
        for kind in spec.kinds.iter().filter(|k| !k.is_unconstrained()) {
            if !R::supports_kind(kind) {
                return Err(AdminError::validation(
                    kind.field_name(),
                    "not a field of this resource",
                ));
            }
            kinds.push(*kind);
        }

        let mut text = Vec::new();
        for (field, predicate) in spec.text.iter().filter(|(_, p)| p.is_active()) {
            let matcher = match predicate.mode {
                MatchMode::Substring => {
                    let trimmed = predicate.pattern.trim();
                    Matcher::Substring {
                        needle: if predicate.case_sensitive {
                            trimmed.to_string()
                        } else {
                            trimmed.to_lowercase()
                        },
                        case_sensitive: predicate.case_sensitive,
                    }
                }
                MatchMode::Regex => {
                    let re = RegexBuilder::new(&predicate.pattern)
                        .case_insensitive(!predicate.case_sensitive)
                        .build()
                        .map_err(|e| AdminError::validation(format!("{field:?}"), e.to_string()))?;
                    Matcher::Regex(re)
                }
            };
            text.push((*field, matcher));
        }

        // Cheap exact comparisons first, regexes last.
        text.sort_by_key(|(_, m)| matches!(m, Matcher::Regex(_)));
        Ok(CompiledFilter { kinds, text })
    }

    /// Compiles `spec` and returns the matching rows in their original order.
    pub fn apply<'a, R: FilterRow>(
        rows: &'a [R],
        spec: &FilterSpec<R>,
    ) -> Result<Vec<&'a R>, AdminError> {
        let compiled = Self::compile(spec)?;
        Ok(Self::apply_compiled(rows, &compiled))
    }

    pub fn apply_compiled<'a, R: FilterRow>(rows: &'a [R], filter: &CompiledFilter<R>) -> Vec<&'a R> {
        rows.iter().filter(|row| filter.matches(row)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicField {
    Name,
    Partitions,
    ReplicationFactor,
}

impl FilterRow for TopicSummary {
    type Field = TopicField;

    fn text(&self, field: TopicField) -> Cow<'_, str> {
        match field {
            TopicField::Name => Cow::Borrowed(&self.name),
            TopicField::Partitions => Cow::Owned(self.partitions.to_string()),
            TopicField::ReplicationFactor => Cow::Owned(self.replication_factor.to_string()),
        }
    }

    fn supports_kind(filter: &KindFilter) -> bool {
        match filter {
            KindFilter::Operation(_)
            | KindFilter::Permission(_)
            | KindFilter::Resource(_)
            | KindFilter::Pattern(_) => false,
        }
    }

    fn kind_matches(&self, filter: &KindFilter) -> bool {
        Self::supports_kind(filter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AclField {
    Principal,
    Host,
    Operation,
    Permission,
    ResourceType,
    ResourceName,
    PatternType,
}

impl FilterRow for AclBinding {
    type Field = AclField;

    fn text(&self, field: AclField) -> Cow<'_, str> {
        match field {
            AclField::Principal => Cow::Borrowed(&self.principal),
            AclField::Host => Cow::Borrowed(&self.host),
            AclField::Operation => Cow::Borrowed(self.operation.as_str()),
            AclField::Permission => Cow::Borrowed(self.permission.as_str()),
            AclField::ResourceType => Cow::Borrowed(self.resource_type.as_str()),
            AclField::ResourceName => Cow::Borrowed(&self.resource_name),
            AclField::PatternType => Cow::Borrowed(self.pattern_type.as_str()),
        }
    }

    fn supports_kind(filter: &KindFilter) -> bool {
        match filter {
            KindFilter::Operation(_)
            | KindFilter::Permission(_)
            | KindFilter::Resource(_)
            | KindFilter::Pattern(_) => true,
        }
    }

    fn kind_matches(&self, filter: &KindFilter) -> bool {
        match *filter {
            KindFilter::Operation(op) => self.operation == op,
            KindFilter::Permission(p) => self.permission == p,
            KindFilter::Resource(r) => self.resource_type == r,
            KindFilter::Pattern(p) => self.pattern_type == p,
        }
    }
}
