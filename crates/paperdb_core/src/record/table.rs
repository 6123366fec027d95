//! Table descriptors and the per-entity mapping contract.

use crate::error::DbResult;
use crate::value::ResultRow;
use rusqlite::types::Value;
use std::fmt::{Debug, Formatter};

/// Static shape of one entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table {
    /// Appended to the adapter prefix to form the table name.
    pub suffix: &'static str,
    pub primary_key: &'static str,
    /// Every column except the primary key, in insert order.
    pub columns: &'static [&'static str],
}

impl Table {
    pub fn name(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.suffix)
    }

    /// Position of `column` in `columns`, which is also its index in
    /// `Entity::to_values`. The primary key has no position.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| *name == column)
    }
}

/// Row mapping for one persistent type.
///
/// Implementations are data: a `Table` plus the two mappers. All finder and
/// write behavior lives in `Record`.
pub trait Entity: Clone + Default {
    const TABLE: Table;

    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);

    /// Builds an entity from a full result row, failing on the first bad column.
    fn from_row(row: &ResultRow) -> DbResult<Self>;

    /// Current values of `TABLE.columns`, in the same order.
    fn to_values(&self) -> Vec<Value>;
}

/// Typed handle to one mutable column of `E`.
pub struct Field<E, T> {
    pub column: &'static str,
    pub assign: fn(&mut E, T),
}

impl<E, T> Field<E, T> {
    pub const fn new(column: &'static str, assign: fn(&mut E, T)) -> Self {
        Self { column, assign }
    }
}

impl<E, T> Clone for Field<E, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, T> Copy for Field<E, T> {}

impl<E, T> Debug for Field<E, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field").field("column", &self.column).finish()
    }
}
