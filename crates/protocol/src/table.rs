use crate::{CqaRecord, ReasoningRow, KNOWLEDGE_BASE_COLUMNS, REASONING_COLUMNS};
use serde::{Deserialize, Serialize};

/// A rectangular text table: column names plus rows of cells.
///
/// Construction makes the table rectangular so renderers can index every
/// column without bounds checks: short rows are padded with empty cells, and a
/// row longer than the header widens the header with unnamed columns rather
/// than losing cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(mut columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).fold(columns.len(), usize::max);
        columns.resize(width, String::new());
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn from_reasoning(rows: &[ReasoningRow]) -> Self {
        Self::new(
            REASONING_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            rows.iter()
                .map(|row| row.cells().iter().map(|c| (*c).to_string()).collect())
                .collect(),
        )
    }

    pub fn from_records(records: &[CqaRecord]) -> Self {
        Self::new(
            KNOWLEDGE_BASE_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            records
                .iter()
                .map(|row| row.cells().iter().map(|c| (*c).to_string()).collect())
                .collect(),
        )
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
