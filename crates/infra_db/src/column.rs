//! Column mapping: logical field names to physical column names
//!
//! Each persisted entity shape declares its table and its field → column
//! pairs once, as constants. The mapping is validated and built the first
//! time it is requested and then shared read-only for the life of the
//! process.
//!
//! Caller-chosen names (sort columns, filter fields) reach SQL text only by
//! resolving through a [`ColumnMapping`]; anything that does not resolve is
//! rejected before a statement is built.
//!
//! ```rust,ignore
//! impl ColumnMapped for UserRow {
//!     const TABLE: &'static str = "users";
//!     const COLUMNS: &'static [(&'static str, &'static str)] = &[
//!         ("id", "id"),
//!         ("first_name", "firstname"),
//!     ];
//!
//!     fn mapping_cell() -> &'static OnceCell<ColumnMapping> {
//!         static CELL: OnceCell<ColumnMapping> = OnceCell::new();
//!         &CELL
//!     }
//! }
//! ```

use std::collections::HashMap;

use once_cell::sync::OnceCell;

use core_kernel::{CoreError, CoreResult};

/// Resolved field → column table for one entity shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    table: &'static str,
    // keyed by lowercased logical name
    columns: HashMap<String, &'static str>,
    declared: Vec<(&'static str, &'static str)>,
    // lowercased logical names that may not appear in ORDER BY
    unsortable: Vec<String>,
}

impl ColumnMapping {
    /// Validates a declaration and builds the lookup table
    ///
    /// # Errors
    ///
    /// `Internal` when the table or a column name is not a plain SQL
    /// identifier, the declaration is empty, or a logical name repeats
    /// (case-insensitively).
    pub fn from_pairs(
        table: &'static str,
        pairs: &[(&'static str, &'static str)],
    ) -> CoreResult<Self> {
        if !is_identifier(table) {
            return Err(CoreError::internal(format!(
                "invalid table name in column mapping: {:?}",
                table
            )));
        }
        if pairs.is_empty() {
            return Err(CoreError::internal(format!(
                "column mapping for {} declares no columns",
                table
            )));
        }

        let mut columns = HashMap::with_capacity(pairs.len());
        for &(field, column) in pairs {
            if !is_identifier(field) || !is_identifier(column) {
                return Err(CoreError::internal(format!(
                    "invalid column mapping entry for {}: {:?} -> {:?}",
                    table, field, column
                )));
            }
            if columns.insert(field.to_lowercase(), column).is_some() {
                return Err(CoreError::internal(format!(
                    "duplicate field {:?} in column mapping for {}",
                    field, table
                )));
            }
        }

        Ok(Self {
            table,
            columns,
            declared: pairs.to_vec(),
            unsortable: Vec::new(),
        })
    }

    /// Marks mapped fields as filter-only, excluding them from sorting
    ///
    /// # Errors
    ///
    /// `Internal` when a named field is not mapped
    pub fn with_unsortable(mut self, fields: &[&str]) -> CoreResult<Self> {
        for field in fields {
            if !self.contains(field) {
                return Err(CoreError::internal(format!(
                    "unsortable field {:?} is not mapped for {}",
                    field, self.table
                )));
            }
            self.unsortable.push(field.to_lowercase());
        }
        Ok(self)
    }

    /// Physical table name
    pub fn table(&self) -> &'static str {
        self.table
    }

    /// Resolves a logical field name (case-insensitive) to its column
    pub fn resolve(&self, field: &str) -> Option<&'static str> {
        self.columns.get(&field.to_lowercase()).copied()
    }

    /// Resolves a field that callers may sort on
    pub fn resolve_sortable(&self, field: &str) -> Option<&'static str> {
        let key = field.to_lowercase();
        if self.unsortable.contains(&key) {
            return None;
        }
        self.columns.get(&key).copied()
    }

    /// Returns true if the logical field is mapped
    pub fn contains(&self, field: &str) -> bool {
        self.resolve(field).is_some()
    }

    /// Declared pairs in declaration order
    pub fn pairs(&self) -> &[(&'static str, &'static str)] {
        &self.declared
    }

    pub fn len(&self) -> usize {
        self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }
}

/// An entity shape with a statically declared column mapping
pub trait ColumnMapped {
    /// Physical table name
    const TABLE: &'static str;

    /// Logical field → physical column pairs, in declaration order
    const COLUMNS: &'static [(&'static str, &'static str)];

    /// Mapped fields that may not be used as a sort column
    const UNSORTABLE: &'static [&'static str] = &[];

    /// Per-shape storage for the built mapping
    fn mapping_cell() -> &'static OnceCell<ColumnMapping>;

    /// Returns the mapping, building it on first use
    fn column_mapping() -> CoreResult<&'static ColumnMapping> {
        Self::mapping_cell().get_or_try_init(|| {
            ColumnMapping::from_pairs(Self::TABLE, Self::COLUMNS)?.with_unsortable(Self::UNSORTABLE)
        })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
