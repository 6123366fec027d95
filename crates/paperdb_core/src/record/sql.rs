//! SQL text for the record operations. Values are always bound as `?N`.

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub(crate) fn select_eq(table: &str, column: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE {} = ?1",
        quote_ident(table),
        quote_ident(column)
    )
}

pub(crate) fn insert<'c>(table: &str, columns: impl IntoIterator<Item = &'c str>) -> String {
    let columns: Vec<String> = columns.into_iter().map(quote_ident).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|n| format!("?{n}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        columns.join(", "),
        placeholders.join(", ")
    )
}

/// `UPDATE` binding the SET values first and the primary key last.
pub(crate) fn update<'c>(
    table: &str,
    columns: impl IntoIterator<Item = &'c str>,
    primary_key: &str,
) -> String {
    let sets: Vec<String> = columns
        .into_iter()
        .enumerate()
        .map(|(index, column)| format!("{} = ?{}", quote_ident(column), index + 1))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE {} = ?{}",
        quote_ident(table),
        sets.join(", "),
        quote_ident(primary_key),
        sets.len() + 1
    )
}
