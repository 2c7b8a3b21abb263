//! Parameterized SELECT construction
//!
//! [`SelectQuery`] turns a column mapping, an entity filter, an optional
//! single-column sort and limit/offset pagination into a [`Statement`]:
//! SQL text with `$n` placeholders plus the values to bind, in order.
//!
//! Only three kinds of text ever reach the SQL string: fixed keywords,
//! physical names taken from the column mapping, and integers produced by
//! clamping the pagination. Every caller-supplied value is a parameter.
//!
//! ```rust,ignore
//! let statement = SelectQuery::new(UserRow::column_mapping()?)
//!     .filter(&params.filter)
//!     .sort(params.sort.as_ref())
//!     .paginate(&params.pagination)
//!     .build()?;
//!
//! let rows: Vec<UserRow> = statement.fetch_all(&pool).await?;
//! ```

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, PgPool, Postgres};

use core_kernel::{CoreError, CoreResult};

use crate::column::ColumnMapping;
use crate::error::DatabaseError;
use crate::filter::{CompareOp, EntityFilter, Predicate, SqlValue};

/// Page size used when the caller does not ask for one
pub const DEFAULT_LIMIT: u32 = 50;

/// Largest page size a caller can ask for
pub const MAX_LIMIT: u32 = 100;

/// Limit/offset pagination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOffsetPagination {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl LimitOffsetPagination {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    /// Requested limit clamped to `1..=MAX_LIMIT`
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn effective_offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Sort on one logical field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneColumnSort {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl OneColumnSort {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Filter, sort and pagination for one list call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListParams<F> {
    #[serde(default)]
    pub pagination: LimitOffsetPagination,
    #[serde(default)]
    pub sort: Option<OneColumnSort>,
    pub filter: F,
}

impl<F: EntityFilter> ListParams<F> {
    pub fn new(filter: F) -> Self {
        Self {
            pagination: LimitOffsetPagination::default(),
            sort: None,
            filter,
        }
    }

    pub fn with_sort(mut self, sort: OneColumnSort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_pagination(mut self, limit: u32, offset: u32) -> Self {
        self.pagination = LimitOffsetPagination::new(limit, offset);
        self
    }

    /// Builds the SELECT for these parameters against `mapping`
    pub fn statement(&self, mapping: &ColumnMapping) -> CoreResult<Statement> {
        SelectQuery::new(mapping)
            .filter(&self.filter)
            .sort(self.sort.as_ref())
            .paginate(&self.pagination)
            .build()
    }
}

/// SQL text with its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    /// Executes the statement and decodes every row
    pub async fn fetch_all<T>(&self, pool: &PgPool) -> Result<Vec<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let query = self
            .params
            .iter()
            .fold(sqlx::query_as::<_, T>(&self.sql), bind_value);

        Ok(query.fetch_all(pool).await?)
    }
}

fn bind_value<'q, T>(
    query: QueryAs<'q, Postgres, T, PgArguments>,
    value: &'q SqlValue,
) -> QueryAs<'q, Postgres, T, PgArguments> {
    match value {
        SqlValue::Int(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.as_str()),
        SqlValue::Timestamp(v) => query.bind(*v),
        SqlValue::IntArray(v) => query.bind(v.as_slice()),
        SqlValue::TextArray(v) => query.bind(v.as_slice()),
    }
}

/// Builder for a single-table SELECT
#[derive(Debug)]
pub struct SelectQuery<'a> {
    mapping: &'a ColumnMapping,
    predicates: Vec<Predicate>,
    sort: Option<&'a OneColumnSort>,
    pagination: LimitOffsetPagination,
}

impl<'a> SelectQuery<'a> {
    pub fn new(mapping: &'a ColumnMapping) -> Self {
        Self {
            mapping,
            predicates: Vec::new(),
            sort: None,
            pagination: LimitOffsetPagination::default(),
        }
    }

    pub fn filter(mut self, filter: &impl EntityFilter) -> Self {
        self.predicates.extend(filter.predicates());
        self
    }

    pub fn sort(mut self, sort: Option<&'a OneColumnSort>) -> Self {
        self.sort = sort;
        self
    }

    pub fn paginate(mut self, pagination: &LimitOffsetPagination) -> Self {
        self.pagination = *pagination;
        self
    }

    /// Renders the statement
    ///
    /// # Errors
    ///
    /// - `Unprocessable` when the sort column is not a sortable mapped field
    /// - `Internal` when a filter names a field the mapping lacks
    pub fn build(self) -> CoreResult<Statement> {
        let order_by = match self.sort {
            Some(sort) => {
                let column = self.mapping.resolve_sortable(&sort.column).ok_or_else(|| {
                    CoreError::unprocessable(format!("unknown sort column: {}", sort.column))
                })?;
                Some((column, sort.direction))
            }
            None => None,
        };

        let mut sql = format!("SELECT * FROM {}", self.mapping.table());
        let mut params = Vec::new();

        for (i, predicate) in self.predicates.into_iter().enumerate() {
            let column = self.mapping.resolve(predicate.field()).ok_or_else(|| {
                CoreError::internal(format!(
                    "filter field {} is not mapped for {}",
                    predicate.field(),
                    self.mapping.table()
                ))
            })?;

            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            render_predicate(&mut sql, &mut params, column, predicate);
        }

        if let Some((column, direction)) = order_by {
            let _ = write!(sql, " ORDER BY {} {}", column, direction.as_sql());
        }

        let _ = write!(
            sql,
            " LIMIT {} OFFSET {}",
            self.pagination.effective_limit(),
            self.pagination.effective_offset()
        );

        Ok(Statement { sql, params })
    }
}

fn render_predicate(sql: &mut String, params: &mut Vec<SqlValue>, column: &str, predicate: Predicate) {
    match predicate {
        Predicate::Compare { op, value, .. } => {
            params.push(value);
            let _ = write!(sql, "{} {} ${}", column, op.as_sql(), params.len());
            if op == CompareOp::Like {
                sql.push_str(" ESCAPE '\\'");
            }
        }
        Predicate::AnyOf { values, .. } => {
            params.push(values);
            let _ = write!(sql, "{} = ANY(${})", column, params.len());
        }
        Predicate::IsNull { negated, .. } => {
            let _ = write!(sql, "{} IS {}NULL", column, if negated { "NOT " } else { "" });
        }
        Predicate::Never { .. } => sql.push_str("FALSE"),
    }
}
