use cmc_protocol::CqaRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Choices offered by the query form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub modalities: Vec<String>,
    pub phases: Vec<String>,
}

/// Sorted distinct modality and phase values present in the knowledge base.
pub fn options(records: &[CqaRecord]) -> QueryOptions {
    QueryOptions {
        modalities: distinct(records.iter().map(|r| r.modality.as_str())),
        phases: distinct(records.iter().map(|r| r.phase.as_str())),
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
