use cmc_protocol::{CqaRecord, ReasoningRow};
use std::collections::BTreeMap;

/// Separator used when joining the unique values of a column.
pub const JOIN_SEPARATOR: &str = ", ";

/// Whole-value, case-insensitive match on modality and phase.
fn matches(record: &CqaRecord, modality: &str, phase: &str) -> bool {
    eq_ignore_case(&record.modality, modality) && eq_ignore_case(&record.phase, phase)
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Unique values in first-occurrence order.
#[derive(Debug, Default)]
struct UniqueValues<'a> {
    values: Vec<&'a str>,
}

impl<'a> UniqueValues<'a> {
    fn push(&mut self, value: &'a str) {
        if !self.values.contains(&value) {
            self.values.push(value);
        }
    }

    fn join(&self) -> String {
        self.values.join(JOIN_SEPARATOR)
    }
}

#[derive(Debug, Default)]
struct CqaGroup<'a> {
    test_methods: UniqueValues<'a>,
    control_actions: UniqueValues<'a>,
    justifications: UniqueValues<'a>,
    references: UniqueValues<'a>,
}

/// Aggregate the knowledge base for one (modality, phase).
///
/// Rows are grouped by the exact CQA value (case-sensitive) and returned in
/// ascending CQA order. Within a group each column is the first-occurrence
/// unique join of its values, empty strings included. When nothing matches
/// the result is the single [`ReasoningRow::no_data`] row.
pub fn query(modality: &str, phase: &str, records: &[CqaRecord]) -> Vec<ReasoningRow> {
    let mut groups: BTreeMap<&str, CqaGroup<'_>> = BTreeMap::new();
    let mut matched = 0usize;
    for record in records.iter().filter(|record| matches(record, modality, phase)) {
        matched += 1;
        let group = groups.entry(record.cqa.as_str()).or_default();
        group.test_methods.push(&record.test_methods);
        group.control_actions.push(&record.control_action);
        group.justifications.push(&record.justification);
        group.references.push(&record.regulatory_source);
    }

    log::debug!(
        "reasoning query modality={modality:?} phase={phase:?}: {matched} of {} rows, {} CQAs",
        records.len(),
        groups.len()
    );

    if groups.is_empty() {
        return vec![ReasoningRow::no_data()];
    }

    groups
        .into_iter()
        .map(|(cqa, group)| ReasoningRow {
            cqa: cqa.to_string(),
            test_methods: group.test_methods.join(),
            control_action: group.control_actions.join(),
            justification: group.justifications.join(),
            reference: group.references.join(),
        })
        .collect()
}
