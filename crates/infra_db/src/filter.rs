//! Typed filter combinators
//!
//! A combinator is an optional, per-field set of operator slots. Every slot
//! is optional; an empty combinator contributes nothing. An entity filter
//! holds one `Option<...Filter>` per filterable field and lowers itself into
//! a flat list of [`Predicate`]s, which the query builder resolves against
//! the column mapping and renders with positional parameters.
//!
//! All set fields of an entity filter are ANDed together, and so are all set
//! slots inside one combinator:
//!
//! ```rust
//! use infra_db::filter::{Combinator, IntFilter};
//!
//! // 10 < id < 20
//! let range = IntFilter {
//!     greater_than: Some(10),
//!     less_than: Some(20),
//!     ..Default::default()
//! };
//! assert_eq!(range.predicates("id").len(), 2);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A literal bound to a positional parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
    IntArray(Vec<i64>),
    TextArray(Vec<String>),
}

/// Binary comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gt,
    Lt,
    /// `LIKE` with `\` as the escape character
    Like,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Like => "LIKE",
        }
    }
}

/// One constraint on one logical field
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `<column> <op> $n`
    Compare {
        field: &'static str,
        op: CompareOp,
        value: SqlValue,
    },
    /// `<column> = ANY($n)` with a non-empty array
    AnyOf {
        field: &'static str,
        values: SqlValue,
    },
    /// `<column> IS [NOT] NULL`
    IsNull { field: &'static str, negated: bool },
    /// Matches no row; produced by an empty `one_of`
    Never { field: &'static str },
}

impl Predicate {
    /// Logical field this predicate constrains
    pub fn field(&self) -> &'static str {
        match self {
            Predicate::Compare { field, .. }
            | Predicate::AnyOf { field, .. }
            | Predicate::IsNull { field, .. }
            | Predicate::Never { field } => *field,
        }
    }
}

/// A per-field set of optional operator slots
pub trait Combinator {
    /// Emits one predicate per set slot, in slot declaration order
    fn predicates(&self, field: &'static str) -> Vec<Predicate>;

    /// Returns true when no slot is set
    fn is_empty(&self) -> bool;
}

/// An entity-shaped set of optional combinators
pub trait EntityFilter {
    /// Lowers every set combinator into predicates, in field declaration order
    fn predicates(&self) -> Vec<Predicate>;
}

/// Appends the predicates of an optional combinator
pub fn push_field<C: Combinator>(out: &mut Vec<Predicate>, field: &'static str, filter: Option<&C>) {
    if let Some(filter) = filter {
        out.extend(filter.predicates(field));
    }
}

/// Integer constraints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntFilter {
    pub equals: Option<i64>,
    pub one_of: Option<Vec<i64>>,
    pub greater_than: Option<i64>,
    pub less_than: Option<i64>,
}

impl IntFilter {
    pub fn equals(value: i64) -> Self {
        Self {
            equals: Some(value),
            ..Default::default()
        }
    }

    pub fn one_of(values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            one_of: Some(values.into_iter().collect()),
            ..Default::default()
        }
    }

    /// Exclusive range `lower < value < upper`
    pub fn between(lower: i64, upper: i64) -> Self {
        Self {
            greater_than: Some(lower),
            less_than: Some(upper),
            ..Default::default()
        }
    }
}

impl Combinator for IntFilter {
    fn predicates(&self, field: &'static str) -> Vec<Predicate> {
        let mut out = Vec::new();
        if let Some(value) = self.equals {
            out.push(compare(field, CompareOp::Eq, SqlValue::Int(value)));
        }
        if let Some(values) = &self.one_of {
            out.push(any_of(field, values.is_empty(), || SqlValue::IntArray(values.clone())));
        }
        if let Some(value) = self.greater_than {
            out.push(compare(field, CompareOp::Gt, SqlValue::Int(value)));
        }
        if let Some(value) = self.less_than {
            out.push(compare(field, CompareOp::Lt, SqlValue::Int(value)));
        }
        out
    }

    fn is_empty(&self) -> bool {
        self.equals.is_none()
            && self.one_of.is_none()
            && self.greater_than.is_none()
            && self.less_than.is_none()
    }
}

/// Text constraints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringFilter {
    pub equals: Option<String>,
    pub one_of: Option<Vec<String>>,
    /// Substring match; `%` and `_` in the needle are matched literally
    pub contains: Option<String>,
    /// `Some(true)` for `IS NULL`, `Some(false)` for `IS NOT NULL`
    pub is_null: Option<bool>,
}

impl StringFilter {
    pub fn equals(value: impl Into<String>) -> Self {
        Self {
            equals: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn one_of<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self {
            one_of: Some(values.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn contains(needle: impl Into<String>) -> Self {
        Self {
            contains: Some(needle.into()),
            ..Default::default()
        }
    }
}

impl Combinator for StringFilter {
    fn predicates(&self, field: &'static str) -> Vec<Predicate> {
        let mut out = Vec::new();
        if let Some(value) = &self.equals {
            out.push(compare(field, CompareOp::Eq, SqlValue::Text(value.clone())));
        }
        if let Some(values) = &self.one_of {
            out.push(any_of(field, values.is_empty(), || SqlValue::TextArray(values.clone())));
        }
        if let Some(needle) = &self.contains {
            out.push(compare(
                field,
                CompareOp::Like,
                SqlValue::Text(format!("%{}%", escape_like(needle))),
            ));
        }
        if let Some(is_null) = self.is_null {
            out.push(Predicate::IsNull {
                field,
                negated: !is_null,
            });
        }
        out
    }

    fn is_empty(&self) -> bool {
        self.equals.is_none()
            && self.one_of.is_none()
            && self.contains.is_none()
            && self.is_null.is_none()
    }
}

/// Timestamp constraints; bounds are exclusive
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFilter {
    pub equals: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    pub after: Option<DateTime<Utc>>,
}

impl TimeFilter {
    pub fn before(at: DateTime<Utc>) -> Self {
        Self {
            before: Some(at),
            ..Default::default()
        }
    }

    pub fn after(at: DateTime<Utc>) -> Self {
        Self {
            after: Some(at),
            ..Default::default()
        }
    }
}

impl Combinator for TimeFilter {
    fn predicates(&self, field: &'static str) -> Vec<Predicate> {
        let mut out = Vec::new();
        if let Some(at) = self.equals {
            out.push(compare(field, CompareOp::Eq, SqlValue::Timestamp(at)));
        }
        if let Some(at) = self.before {
            out.push(compare(field, CompareOp::Lt, SqlValue::Timestamp(at)));
        }
        if let Some(at) = self.after {
            out.push(compare(field, CompareOp::Gt, SqlValue::Timestamp(at)));
        }
        out
    }

    fn is_empty(&self) -> bool {
        self.equals.is_none() && self.before.is_none() && self.after.is_none()
    }
}

fn compare(field: &'static str, op: CompareOp, value: SqlValue) -> Predicate {
    Predicate::Compare { field, op, value }
}

fn any_of(field: &'static str, empty: bool, values: impl FnOnce() -> SqlValue) -> Predicate {
    if empty {
        Predicate::Never { field }
    } else {
        Predicate::AnyOf {
            field,
            values: values(),
        }
    }
}

/// Escapes `LIKE` metacharacters so the needle matches literally
pub fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
