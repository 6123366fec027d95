//! Active-record contract implemented once for every `Entity`.
//!
//! # Responsibility
//! - Bind an entity value to an adapter and its prefixed table.
//! - Track setter calls in a `Changeset` and flush them as partial updates.
//! - Provide the finder, create/save/update, reload and single-column update
//!   operations.
//!
//! # Invariants
//! - A column is dirty iff its setter ran since the last load, even when the
//!   value did not change. Saving does not clear dirty columns.
//! - `find` overwrites the whole receiver; finders report zero rows as
//!   `DbError::NotFound`.
//! - `update` with nothing dirty emits no SQL.

mod changeset;
mod sql;
mod table;

pub use changeset::Changeset;
pub use table::{Entity, Field, Table};

use crate::adapter::{Adapter, ExecOutcome, Severity};
use crate::error::{DbError, DbResult};
use crate::value::ResultRow;
use rusqlite::types::Value;
use std::panic::Location;

#[derive(Debug, Clone)]
pub struct Record<'a, E: Entity> {
    adapter: &'a Adapter,
    table: String,
    entity: E,
    changes: Changeset,
    is_new: bool,
}

impl<'a, E: Entity> Record<'a, E> {
    /// A new, not yet inserted record with default field values.
    pub fn new(adapter: &'a Adapter) -> Self {
        Self::from_entity(adapter, E::default())
    }

    /// A new, not yet inserted record holding `entity`.
    pub fn from_entity(adapter: &'a Adapter, entity: E) -> Self {
        Self {
            adapter,
            table: E::TABLE.name(adapter.database_prefix()),
            entity,
            changes: Changeset::new(),
            is_new: true,
        }
    }

    fn loaded(adapter: &'a Adapter, table: String, entity: E) -> Self {
        Self {
            adapter,
            table,
            entity,
            changes: Changeset::new(),
            is_new: false,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn id(&self) -> i64 {
        self.entity.id()
    }

    pub fn entity(&self) -> &E {
        &self.entity
    }

    pub fn into_entity(self) -> E {
        self.entity
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn changes(&self) -> &Changeset {
        &self.changes
    }

    pub fn is_dirty<T>(&self, field: Field<E, T>) -> bool {
        self.changes.is_dirty(field.column)
    }

    pub fn discard_changes(&mut self) {
        self.changes.clear();
    }

    /// Assigns `value` and marks the column dirty.
    pub fn set<T>(&mut self, field: Field<E, T>, value: T) {
        (field.assign)(&mut self.entity, value);
        self.changes.mark(field.column);
    }

    /// Loads the row whose primary key is `id` into this record, replacing
    /// all in-memory state.
    #[track_caller]
    pub fn find(&mut self, id: i64) -> DbResult<()> {
        let caller = Location::caller();
        let primary_key = E::TABLE.primary_key;
        let rows = self.select(caller, primary_key, Value::Integer(id))?;
        let Some(row) = rows.first() else {
            return Err(self.not_found(caller, primary_key, id.to_string()));
        };

        let sql = sql::select_eq(&self.table, primary_key);
        self.entity = E::from_row(row).map_err(|err| err.context(sql))?;
        self.changes.clear();
        self.is_new = false;
        Ok(())
    }

    /// Returns every row whose `field` equals `value`. Zero rows is
    /// `DbError::NotFound`.
    #[track_caller]
    pub fn find_by<T>(&self, field: Field<E, T>, value: T) -> DbResult<Vec<Record<'a, E>>>
    where
        T: Into<Value>,
    {
        let caller = Location::caller();
        let value = value.into();
        let shown = display_value(&value);
        let rows = self.select(caller, field.column, value)?;
        if rows.is_empty() {
            return Err(self.not_found(caller, field.column, shown));
        }

        let sql = sql::select_eq(&self.table, field.column);
        rows.iter()
            .map(|row| {
                E::from_row(row)
                    .map(|entity| Self::loaded(self.adapter, self.table.clone(), entity))
                    .map_err(|err| err.context(sql.clone()))
            })
            .collect()
    }

    /// Replaces this record's state with one result row.
    pub fn load_row(&mut self, row: &ResultRow) -> DbResult<()> {
        self.entity = E::from_row(row)?;
        self.changes.clear();
        self.is_new = false;
        Ok(())
    }

    /// Inserts every non-key column and adopts the generated primary key.
    #[track_caller]
    pub fn create(&mut self) -> DbResult<ExecOutcome> {
        let caller = Location::caller();
        let columns = E::TABLE.columns;
        let values = self.entity.to_values();
        debug_assert_eq!(columns.len(), values.len(), "to_values must match TABLE.columns");

        let sql = sql::insert(&self.table, columns.iter().copied());
        let outcome = self
            .adapter
            .execute_at(caller, &sql, &values)
            .map_err(|err| err.context(sql))?;
        self.entity.set_id(outcome.last_insert_id);
        self.is_new = false;
        Ok(outcome)
    }

    /// `create` for new records, otherwise `update`.
    #[track_caller]
    pub fn save(&mut self) -> DbResult<ExecOutcome> {
        if self.is_new {
            return self.create();
        }
        self.update()
    }

    /// Writes the current values of the dirty columns only. Dirty markers
    /// survive the write.
    #[track_caller]
    pub fn update(&mut self) -> DbResult<ExecOutcome> {
        let caller = Location::caller();
        if self.changes.is_empty() {
            self.adapter.logger().log_at(
                Severity::Debug,
                caller,
                &format!("nothing to update in {} for id {}", self.table, self.id()),
            );
            return Ok(ExecOutcome::default());
        }

        let current = self.entity.to_values();
        let mut params = Vec::with_capacity(self.changes.len() + 1);
        for column in self.changes.columns() {
            let value = E::TABLE
                .column_index(column)
                .and_then(|index| current.get(index))
                .cloned()
                .ok_or_else(|| {
                    self.adapter
                        .logger()
                        .oops_at(caller, DbError::MissingColumn(column.to_string()))
                })?;
            params.push(value);
        }
        params.push(Value::Integer(self.id()));

        let sql = sql::update(&self.table, self.changes.columns(), E::TABLE.primary_key);
        self.adapter
            .execute_at(caller, &sql, &params)
            .map_err(|err| err.context(sql))
    }

    /// Re-reads this record from storage by its primary key.
    #[track_caller]
    pub fn reload(&mut self) -> DbResult<()> {
        self.find(self.id())
    }

    /// Immediately writes one column, independent of the changeset, and
    /// returns the affected row count.
    #[track_caller]
    pub fn update_column<T>(&mut self, field: Field<E, T>, value: T) -> DbResult<u64>
    where
        T: Clone + Into<Value>,
    {
        let caller = Location::caller();
        let sql = sql::update(&self.table, [field.column], E::TABLE.primary_key);
        let params = [value.clone().into(), Value::Integer(self.id())];
        let outcome = self
            .adapter
            .execute_at(caller, &sql, &params)
            .map_err(|err| err.context(sql))?;
        (field.assign)(&mut self.entity, value);
        Ok(outcome.affected_rows)
    }

    fn select(
        &self,
        caller: &'static Location<'static>,
        column: &str,
        value: Value,
    ) -> DbResult<Vec<ResultRow>> {
        let sql = sql::select_eq(&self.table, column);
        self.adapter
            .query_at(caller, &sql, &[value])
            .map_err(|err| err.context(sql))
    }

    fn not_found(&self, caller: &'static Location<'static>, column: &str, value: String) -> DbError {
        self.adapter.logger().oops_at(
            caller,
            DbError::NotFound {
                table: self.table.clone(),
                column: column.to_string(),
                value,
            },
        )
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(value) => value.to_string(),
        Value::Real(value) => value.to_string(),
        Value::Text(value) => format!("'{value}'"),
        Value::Blob(value) => format!("<{} bytes>", value.len()),
    }
}
