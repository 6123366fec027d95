//! Ordered set of columns touched since the last load.

/// Columns whose setter ran since the last load.
///
/// Only names are kept; `Record::update` reads the current values from the
/// entity, so a column written by any path after `set` flushes what the
/// record holds now. Setting a column again keeps its original position, so
/// the emitted `SET` list is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    columns: Vec<&'static str>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, column: &'static str) {
        if !self.is_dirty(column) {
            self.columns.push(column);
        }
    }

    pub fn is_dirty(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn clear(&mut self) {
        self.columns.clear();
    }
}
