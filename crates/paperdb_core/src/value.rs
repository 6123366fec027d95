//! Raw column text with on-demand typed conversions.
//!
//! # Responsibility
//! - Hold one column value exactly as the driver rendered it.
//! - Convert to integer, float, string and timestamp forms.
//!
//! # Invariants
//! - Conversions never mutate the stored text.
//! - A failed conversion is an error, never a silent zero.
//! - Conversion failures are logged through the originating adapter's logger.

use crate::adapter::AdapterLogger;
use crate::error::{ConversionError, DbError, DbResult};
use crate::timestamp::Timestamp;
use rusqlite::types::ValueRef;
use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};
use std::panic::Location;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Clone)]
pub struct TypedValue {
    column: String,
    raw: String,
    logger: Arc<AdapterLogger>,
}

impl TypedValue {
    pub(crate) fn new(
        logger: Arc<AdapterLogger>,
        column: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            raw: raw.into(),
            logger,
        }
    }

    /// Captures a driver value. Text and blob bytes must be valid UTF-8.
    pub(crate) fn from_sql(
        logger: Arc<AdapterLogger>,
        column: &str,
        value: ValueRef<'_>,
    ) -> DbResult<Self> {
        let raw = raw_text(column, value)?;
        Ok(Self::new(logger, column, raw))
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn as_string(&self) -> String {
        self.raw.clone()
    }

    #[track_caller]
    pub fn as_i32(&self) -> DbResult<i32> {
        self.parse_as(Location::caller(), "i32")
    }

    #[track_caller]
    pub fn as_i64(&self) -> DbResult<i64> {
        self.parse_as(Location::caller(), "i64")
    }

    #[track_caller]
    pub fn as_f32(&self) -> DbResult<f32> {
        self.parse_as(Location::caller(), "f32")
    }

    #[track_caller]
    pub fn as_f64(&self) -> DbResult<f64> {
        self.parse_as(Location::caller(), "f64")
    }

    #[track_caller]
    pub fn as_timestamp(&self) -> DbResult<Timestamp> {
        let caller = Location::caller();
        Timestamp::parse(&self.raw).map_err(|err| {
            let err = ConversionError::from_timestamp(&self.column, &self.raw, err);
            self.logger.oops_at(caller, err.into())
        })
    }

    /// Parses the raw text into any `FromStr` type.
    #[track_caller]
    pub fn parse<T>(&self) -> DbResult<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.parse_as(Location::caller(), std::any::type_name::<T>())
    }

    fn parse_as<T>(&self, caller: &'static Location<'static>, expected: &'static str) -> DbResult<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.raw.parse::<T>().map_err(|err| {
            let err = ConversionError {
                column: self.column.clone(),
                raw: self.raw.clone(),
                expected,
                reason: err.to_string(),
            };
            self.logger.oops_at(caller, err.into())
        })
    }
}

impl Debug for TypedValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedValue")
            .field("column", &self.column)
            .field("raw", &self.raw)
            .finish()
    }
}

impl PartialEq for TypedValue {
    fn eq(&self, other: &Self) -> bool {
        self.column == other.column && self.raw == other.raw
    }
}

/// One result row: column name to value.
#[derive(Clone)]
pub struct ResultRow {
    values: BTreeMap<String, TypedValue>,
    logger: Arc<AdapterLogger>,
}

impl ResultRow {
    pub(crate) fn new(logger: Arc<AdapterLogger>) -> Self {
        Self {
            values: BTreeMap::new(),
            logger,
        }
    }

    /// Adds `value` under its own column name, replacing any previous one.
    pub fn insert(&mut self, value: TypedValue) {
        self.values.insert(value.column.clone(), value);
    }

    #[track_caller]
    pub fn get(&self, column: &str) -> DbResult<&TypedValue> {
        let caller = Location::caller();
        self.values.get(column).ok_or_else(|| {
            self.logger
                .oops_at(caller, DbError::MissingColumn(column.to_string()))
        })
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Debug for ResultRow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.values.iter().map(|(k, v)| (k, v.raw())))
            .finish()
    }
}

// NULL renders as empty text; numbers use their shortest decimal form.
fn raw_text(column: &str, value: ValueRef<'_>) -> Result<String, ConversionError> {
    match value {
        ValueRef::Null => Ok(String::new()),
        ValueRef::Integer(value) => Ok(value.to_string()),
        ValueRef::Real(value) => Ok(value.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|err| ConversionError {
                column: column.to_string(),
                raw: String::from_utf8_lossy(bytes).into_owned(),
                expected: "utf-8 text",
                reason: err.to_string(),
            }),
    }
}
