#![allow(dead_code)]

use paperdb_core::{
    Adapter, AdapterConfig, AdapterLogger, DbResult, Entity, Field, ResultRow, Table, Timestamp,
    Value,
};
use std::io::Write;
use std::sync::{Arc, Mutex};

pub const PREFIX: &str = "pp_";

const SCHEMA: &[&str] = &[
    "CREATE TABLE pp_portfolios (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        value INTEGER NOT NULL
    )",
    "CREATE TABLE pp_positions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        portfolio_id INTEGER NOT NULL,
        started_at TEXT NOT NULL,
        ptype TEXT NOT NULL,
        buy REAL NOT NULL,
        quantity INTEGER NOT NULL
    )",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Portfolio {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub value: i64,
}

impl Portfolio {
    pub const NAME: Field<Portfolio, String> =
        Field::new("name", |p: &mut Portfolio, v: String| p.name = v);
    pub const DESCRIPTION: Field<Portfolio, String> =
        Field::new("description", |p: &mut Portfolio, v: String| p.description = v);
    pub const VALUE: Field<Portfolio, i64> =
        Field::new("value", |p: &mut Portfolio, v: i64| p.value = v);
}

impl Entity for Portfolio {
    const TABLE: Table = Table {
        suffix: "portfolios",
        primary_key: "id",
        columns: &["name", "description", "value"],
    };

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &ResultRow) -> DbResult<Self> {
        Ok(Self {
            id: row.get("id")?.as_i64()?,
            name: row.get("name")?.as_string(),
            description: row.get("description")?.as_string(),
            value: row.get("value")?.as_i64()?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::from(self.name.clone()),
            Value::from(self.description.clone()),
            Value::from(self.value),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Position {
    pub id: i64,
    pub portfolio_id: i64,
    pub started_at: Timestamp,
    pub ptype: String,
    pub buy: f64,
    pub quantity: i32,
}

impl Position {
    pub const PORTFOLIO_ID: Field<Position, i64> =
        Field::new("portfolio_id", |p: &mut Position, v: i64| p.portfolio_id = v);
    pub const STARTED_AT: Field<Position, Timestamp> =
        Field::new("started_at", |p: &mut Position, v: Timestamp| p.started_at = v);
    pub const PTYPE: Field<Position, String> =
        Field::new("ptype", |p: &mut Position, v: String| p.ptype = v);
    pub const BUY: Field<Position, f64> = Field::new("buy", |p: &mut Position, v: f64| p.buy = v);
    pub const QUANTITY: Field<Position, i32> =
        Field::new("quantity", |p: &mut Position, v: i32| p.quantity = v);
}

impl Entity for Position {
    const TABLE: Table = Table {
        suffix: "positions",
        primary_key: "id",
        columns: &["portfolio_id", "started_at", "ptype", "buy", "quantity"],
    };

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &ResultRow) -> DbResult<Self> {
        Ok(Self {
            id: row.get("id")?.as_i64()?,
            portfolio_id: row.get("portfolio_id")?.as_i64()?,
            started_at: row.get("started_at")?.as_timestamp()?,
            ptype: row.get("ptype")?.as_string(),
            buy: row.get("buy")?.as_f64()?,
            quantity: row.get("quantity")?.as_i32()?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::from(self.portfolio_id),
            Value::from(self.started_at),
            Value::from(self.ptype.clone()),
            Value::from(self.buy),
            Value::from(self.quantity),
        ]
    }
}

/// Shared in-memory log writer.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    pub fn lines_containing(&self, needle: &str) -> Vec<String> {
        self.text()
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_string)
            .collect()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Opens an in-memory database with the fixture schema.
pub fn open_memory(logger: AdapterLogger) -> Adapter {
    let mut adapter = Adapter::new(AdapterConfig::with_prefix(PREFIX), logger);
    adapter
        .open("localhost", "tester", "secret", ":memory:")
        .unwrap();
    for statement in SCHEMA {
        adapter.execute(statement, &[]).unwrap();
    }
    adapter
}

pub fn open_quiet() -> Adapter {
    open_memory(AdapterLogger::discard())
}
