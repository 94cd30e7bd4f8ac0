use crate::{KnowledgeBaseError, Result};
use cmc_protocol::{CqaRecord, KNOWLEDGE_BASE_COLUMNS};
use std::io::{Read, Write};
use std::path::Path;

/// Parse knowledge base CSV.
///
/// Columns are matched by header name, so column order in the file does not
/// matter. Missing columns and missing cells become empty strings; unknown
/// columns are ignored.
pub fn read_records<R: Read>(reader: R, origin: &Path) -> Result<Vec<CqaRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|err| KnowledgeBaseError::csv(origin, err))?
        .clone();
    let positions: Vec<Option<usize>> = KNOWLEDGE_BASE_COLUMNS
        .iter()
        .map(|column| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == *column)
        })
        .collect();

    let missing: Vec<&str> = KNOWLEDGE_BASE_COLUMNS
        .iter()
        .zip(&positions)
        .filter(|(_, pos)| pos.is_none())
        .map(|(column, _)| *column)
        .collect();
    if !missing.is_empty() {
        log::warn!(
            "{}: missing columns {:?}, treating them as empty",
            origin.display(),
            missing
        );
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|err| KnowledgeBaseError::csv(origin, err))?;
        let cell = |idx: usize| -> String {
            positions[idx]
                .and_then(|pos| row.get(pos))
                .unwrap_or_default()
                .to_string()
        };
        records.push(CqaRecord {
            modality: cell(0),
            phase: cell(1),
            cqa: cell(2),
            test_methods: cell(3),
            justification: cell(4),
            regulatory_source: cell(5),
            control_action: cell(6),
        });
    }
    Ok(records)
}

/// Serialize records under the fixed knowledge base header.
pub fn write_records<W: Write>(writer: W, records: &[CqaRecord], origin: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    writer
        .write_record(KNOWLEDGE_BASE_COLUMNS)
        .map_err(|err| KnowledgeBaseError::csv(origin, err))?;
    for record in records {
        writer
            .write_record(record.cells())
            .map_err(|err| KnowledgeBaseError::csv(origin, err))?;
    }
    writer.flush()?;
    Ok(())
}

/// CSV bytes for a full-table download.
pub fn records_to_csv(records: &[CqaRecord]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_records(&mut out, records, Path::new("<memory>"))?;
    Ok(out)
}
