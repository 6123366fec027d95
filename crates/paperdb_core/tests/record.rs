mod common;

use common::{open_memory, open_quiet, Capture, Portfolio, Position, PREFIX};
use paperdb_core::{AdapterLogger, DbError, LogSink, Record, Timestamp, Value};

fn sample_portfolio() -> Portfolio {
    Portfolio {
        id: 0,
        name: "growth".to_string(),
        description: "long only".to_string(),
        value: 1200,
    }
}

#[test]
fn new_record_resolves_prefixed_table() {
    let adapter = open_quiet();
    let record = Record::<Portfolio>::new(&adapter);

    assert_eq!(record.table_name(), format!("{PREFIX}portfolios"));
    assert!(record.is_new());
    assert!(record.changes().is_empty());
}

#[test]
fn create_then_find_roundtrip() {
    let adapter = open_quiet();
    let mut created = Record::from_entity(&adapter, sample_portfolio());
    let outcome = created.create().unwrap();

    assert_eq!(outcome.affected_rows, 1);
    assert_eq!(created.id(), outcome.last_insert_id);
    assert!(!created.is_new());

    let mut found = Record::<Portfolio>::new(&adapter);
    found.find(created.id()).unwrap();
    assert_eq!(found.entity(), created.entity());
    assert!(!found.is_new());
}

#[test]
fn create_update_reload_scenario() {
    let adapter = open_quiet();
    let mut record = Record::<Portfolio>::new(&adapter);
    record.set(Portfolio::NAME, "income".to_string());
    record.set(Portfolio::DESCRIPTION, "dividends".to_string());
    record.set(Portfolio::VALUE, 300);
    record.create().unwrap();

    let mut loaded = Record::<Portfolio>::new(&adapter);
    loaded.find(record.id()).unwrap();
    assert_eq!(loaded.entity().name, "income");
    assert_eq!(loaded.entity().description, "dividends");
    assert_eq!(loaded.entity().value, 300);

    let affected = loaded.update_column(Portfolio::VALUE, 450).unwrap();
    assert_eq!(affected, 1);
    assert_eq!(loaded.entity().value, 450);

    record.reload().unwrap();
    assert_eq!(record.entity().value, 450);
    assert_eq!(record.entity().name, "income");
    assert_eq!(record.entity().description, "dividends");
}

#[test]
fn setter_marks_dirty_even_for_same_value() {
    let adapter = open_quiet();
    let mut record = Record::from_entity(&adapter, sample_portfolio());
    record.create().unwrap();
    record.find(record.id()).unwrap();
    assert!(!record.is_dirty(Portfolio::VALUE));

    record.set(Portfolio::VALUE, 1200);
    assert!(record.is_dirty(Portfolio::VALUE));
    assert!(!record.is_dirty(Portfolio::NAME));
}

#[test]
fn save_emits_only_dirty_columns() {
    let info = Capture::default();
    let adapter =
        open_memory(AdapterLogger::discard().with_info_sink(LogSink::writer(info.clone())));
    let mut record = Record::from_entity(&adapter, sample_portfolio());
    record.create().unwrap();
    let id = record.id();
    record.find(id).unwrap();

    // Change storage behind the record's back; the untouched column must survive.
    adapter
        .execute(
            "UPDATE pp_portfolios SET description = 'external' WHERE id = ?1",
            &[Value::from(id)],
        )
        .unwrap();

    info.clear();
    record.set(Portfolio::NAME, "renamed".to_string());
    record.save().unwrap();

    let updates = info.lines_containing("UPDATE");
    assert_eq!(updates.len(), 1);
    assert!(
        updates[0].contains("UPDATE \"pp_portfolios\" SET \"name\" = ?1 WHERE \"id\" = ?2"),
        "{}",
        updates[0]
    );

    let mut stored = Record::<Portfolio>::new(&adapter);
    stored.find(id).unwrap();
    assert_eq!(stored.entity().name, "renamed");
    assert_eq!(stored.entity().description, "external");
    assert_eq!(stored.entity().value, 1200);
}

#[test]
fn save_does_not_clear_dirty_columns() {
    let info = Capture::default();
    let adapter =
        open_memory(AdapterLogger::discard().with_info_sink(LogSink::writer(info.clone())));
    let mut record = Record::from_entity(&adapter, sample_portfolio());
    record.create().unwrap();
    record.find(record.id()).unwrap();

    record.set(Portfolio::VALUE, 5);
    record.set(Portfolio::NAME, "a".to_string());
    info.clear();
    record.save().unwrap();
    record.save().unwrap();

    let updates = info.lines_containing("UPDATE");
    assert_eq!(updates.len(), 2);
    assert!(updates
        .iter()
        .all(|line| line.contains("SET \"value\" = ?1, \"name\" = ?2 WHERE")));
    assert_eq!(record.changes().len(), 2);
}

#[test]
fn update_with_nothing_dirty_emits_no_sql() {
    let info = Capture::default();
    let adapter =
        open_memory(AdapterLogger::discard().with_info_sink(LogSink::writer(info.clone())));
    let mut record = Record::from_entity(&adapter, sample_portfolio());
    record.create().unwrap();
    record.find(record.id()).unwrap();
    info.clear();

    let outcome = record.update().unwrap();

    assert_eq!(outcome.affected_rows, 0);
    assert!(info.lines_containing("UPDATE").is_empty());
}

#[test]
fn save_on_new_record_creates() {
    let adapter = open_quiet();
    let mut record = Record::<Portfolio>::new(&adapter);
    record.set(Portfolio::NAME, "fresh".to_string());

    let outcome = record.save().unwrap();

    assert!(!record.is_new());
    assert_eq!(record.id(), outcome.last_insert_id);
    let mut stored = Record::<Portfolio>::new(&adapter);
    stored.find(record.id()).unwrap();
    assert_eq!(stored.entity().name, "fresh");
    assert_eq!(stored.entity().description, "");
}

#[test]
fn find_missing_id_is_not_found_and_logged() {
    let errors = Capture::default();
    let adapter =
        open_memory(AdapterLogger::discard().with_error_sink(LogSink::writer(errors.clone())));
    let mut record = Record::<Portfolio>::new(&adapter);

    let err = record.find(404).unwrap_err();

    assert!(err.is_not_found());
    assert!(record.is_new());
    assert_eq!(errors.lines_containing("not found").len(), 1);
}

#[test]
fn query_failure_is_not_reported_as_not_found() {
    let adapter = open_quiet();
    adapter.execute("DROP TABLE pp_portfolios", &[]).unwrap();
    let mut record = Record::<Portfolio>::new(&adapter);

    let err = record.find(1).unwrap_err();

    assert!(!err.is_not_found());
    assert!(matches!(err.root(), DbError::Query { .. }));
}

#[test]
fn find_overwrites_all_in_memory_state() {
    let adapter = open_quiet();
    let mut stored = Record::from_entity(&adapter, sample_portfolio());
    stored.create().unwrap();

    let mut record = Record::<Portfolio>::new(&adapter);
    record.set(Portfolio::NAME, "scratch".to_string());
    record.set(Portfolio::VALUE, -1);
    record.find(stored.id()).unwrap();

    assert_eq!(record.entity(), stored.entity());
    assert!(record.changes().is_empty());
}

#[test]
fn find_by_returns_every_match() {
    let adapter = open_quiet();
    for name in ["alpha", "beta", "alpha"] {
        let mut record = Record::<Portfolio>::new(&adapter);
        record.set(Portfolio::NAME, name.to_string());
        record.create().unwrap();
    }

    let finder = Record::<Portfolio>::new(&adapter);
    let alphas = finder
        .find_by(Portfolio::NAME, "alpha".to_string())
        .unwrap();

    assert_eq!(alphas.len(), 2);
    assert!(alphas.iter().all(|r| r.entity().name == "alpha" && !r.is_new()));
    assert_ne!(alphas[0].id(), alphas[1].id());
}

#[test]
fn find_by_without_matches_is_not_found() {
    let adapter = open_quiet();
    let finder = Record::<Portfolio>::new(&adapter);

    let err = finder.find_by(Portfolio::VALUE, 77).unwrap_err();

    assert!(err.is_not_found());
    assert!(err.to_string().contains("value = 77"));
}

#[test]
fn update_column_ignores_changeset() {
    let adapter = open_quiet();
    let mut record = Record::from_entity(&adapter, sample_portfolio());
    record.create().unwrap();
    record.find(record.id()).unwrap();
    record.set(Portfolio::NAME, "pending".to_string());

    let affected = record
        .update_column(Portfolio::DESCRIPTION, "immediate".to_string())
        .unwrap();

    assert_eq!(affected, 1);
    assert!(record.is_dirty(Portfolio::NAME));
    assert!(!record.is_dirty(Portfolio::DESCRIPTION));

    let mut stored = Record::<Portfolio>::new(&adapter);
    stored.find(record.id()).unwrap();
    assert_eq!(stored.entity().description, "immediate");
    assert_eq!(stored.entity().name, "growth");
}

#[test]
fn save_flushes_value_written_by_update_column_after_set() {
    let adapter = open_quiet();
    let mut record = Record::from_entity(&adapter, sample_portfolio());
    record.create().unwrap();
    record.find(record.id()).unwrap();

    record.set(Portfolio::NAME, "pending".to_string());
    record
        .update_column(Portfolio::NAME, "immediate".to_string())
        .unwrap();
    record.save().unwrap();

    let mut stored = Record::<Portfolio>::new(&adapter);
    stored.find(record.id()).unwrap();
    assert_eq!(record.entity().name, "immediate");
    assert_eq!(stored.entity().name, "immediate");
}

#[test]
fn discard_changes_turns_save_into_noop() {
    let info = Capture::default();
    let adapter =
        open_memory(AdapterLogger::discard().with_info_sink(LogSink::writer(info.clone())));
    let mut record = Record::from_entity(&adapter, sample_portfolio());
    record.create().unwrap();
    record.set(Portfolio::NAME, "kept in memory".to_string());

    record.discard_changes();
    info.clear();
    record.save().unwrap();

    assert!(info.lines_containing("UPDATE").is_empty());
    let entity = record.into_entity();
    assert_eq!(entity.name, "kept in memory");
}

#[test]
fn reload_discards_unsaved_changes() {
    let adapter = open_quiet();
    let mut record = Record::from_entity(&adapter, sample_portfolio());
    record.create().unwrap();
    record.set(Portfolio::NAME, "unsaved".to_string());

    record.reload().unwrap();

    assert_eq!(record.entity().name, "growth");
    assert!(record.changes().is_empty());
}

#[test]
fn load_row_populates_typed_fields() {
    let adapter = open_quiet();
    let mut row = adapter.new_row();
    for (column, raw) in [
        ("id", "999"),
        ("portfolio_id", "12"),
        ("started_at", "2017-03-04 05:06:07"),
        ("ptype", "long"),
        ("buy", "10.25"),
        ("quantity", "3"),
    ] {
        row.insert(adapter.new_value(column, raw));
    }

    let mut record = Record::<Position>::new(&adapter);
    record.load_row(&row).unwrap();

    let position = record.entity();
    assert_eq!(position.id, 999);
    assert_eq!(position.portfolio_id, 12);
    assert_eq!(position.started_at, Timestamp::new(2017, 3, 4, 5, 6, 7));
    assert_eq!(position.ptype, "long");
    assert_eq!(position.buy, 10.25);
    assert_eq!(position.quantity, 3);
    assert!(!record.is_new());
}

#[test]
fn load_row_surfaces_conversion_error() {
    let errors = Capture::default();
    let adapter =
        open_memory(AdapterLogger::discard().with_error_sink(LogSink::writer(errors.clone())));
    let mut row = adapter.new_row();
    row.insert(adapter.new_value("id", "1"));
    row.insert(adapter.new_value("portfolio_id", "2"));
    row.insert(adapter.new_value("started_at", "last tuesday"));

    let mut record = Record::<Position>::new(&adapter);
    let err = record.load_row(&row).unwrap_err();

    assert!(err.is_conversion());
    assert!(record.is_new());
    assert_eq!(errors.lines_containing("started_at").len(), 1);
}

#[test]
fn timestamps_and_floats_roundtrip_through_storage() {
    let adapter = open_quiet();
    let opened = Timestamp::new(2021, 11, 5, 9, 30, 0);
    let mut record = Record::<Position>::new(&adapter);
    record.set(Position::PORTFOLIO_ID, 7);
    record.set(Position::STARTED_AT, opened);
    record.set(Position::PTYPE, "short".to_string());
    record.set(Position::BUY, 99.5);
    record.set(Position::QUANTITY, 40);
    record.create().unwrap();

    let by_time = Record::<Position>::new(&adapter)
        .find_by(Position::STARTED_AT, opened)
        .unwrap();
    assert_eq!(by_time.len(), 1);
    assert_eq!(by_time[0].entity(), record.entity());

    let rows = adapter
        .query("SELECT started_at FROM pp_positions", &[])
        .unwrap();
    assert_eq!(rows[0].get("started_at").unwrap().raw(), "2021-11-05 09:30:00");
}

#[test]
fn record_operations_fail_before_open() {
    let adapter = paperdb_core::Adapter::new(
        paperdb_core::AdapterConfig::with_prefix(PREFIX),
        AdapterLogger::discard(),
    );
    let mut record = Record::from_entity(&adapter, sample_portfolio());

    assert!(matches!(record.create().unwrap_err().root(), DbError::NotOpened));
    assert!(matches!(record.find(1).unwrap_err().root(), DbError::NotOpened));
}
