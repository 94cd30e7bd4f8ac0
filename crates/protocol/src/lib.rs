use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod table;

pub use table::Table;

/// Knowledge base header, in storage order.
pub const KNOWLEDGE_BASE_COLUMNS: [&str; 7] = [
    "Modality",
    "Phase",
    "CQA",
    "Test Methods",
    "Justification",
    "Regulatory Source",
    "Control Action",
];

/// Reasoning result header, in display order.
pub const REASONING_COLUMNS: [&str; 5] = [
    "CQA",
    "Test Methods",
    "Control Action",
    "Justification",
    "Reference",
];

/// CQA value of the sentinel row returned when a query matches nothing.
pub const NO_DATA_FOUND: &str = "No data found";

pub const EXTRACTED_JUSTIFICATION: &str = "AI Extracted";
pub const EXTRACTED_REGULATORY_SOURCE: &str = "PDF-LLM";
pub const EXTRACTED_CONTROL_ACTION: &str = "Specification";

/// One row of the knowledge base.
///
/// Every column is plain text. Missing values are represented as empty strings,
/// never as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CqaRecord {
    #[serde(rename = "Modality", default)]
    pub modality: String,

    #[serde(rename = "Phase", default)]
    pub phase: String,

    #[serde(rename = "CQA", default)]
    pub cqa: String,

    #[serde(rename = "Test Methods", default)]
    pub test_methods: String,

    #[serde(rename = "Justification", default)]
    pub justification: String,

    #[serde(rename = "Regulatory Source", default)]
    pub regulatory_source: String,

    #[serde(rename = "Control Action", default)]
    pub control_action: String,
}

impl CqaRecord {
    /// Stamp an extracted (CQA, test methods) pair with its provenance.
    pub fn extracted(
        modality: impl Into<String>,
        phase: impl Into<String>,
        cqa: impl Into<String>,
        test_methods: impl Into<String>,
    ) -> Self {
        Self {
            modality: modality.into(),
            phase: phase.into(),
            cqa: cqa.into(),
            test_methods: test_methods.into(),
            justification: EXTRACTED_JUSTIFICATION.to_string(),
            regulatory_source: EXTRACTED_REGULATORY_SOURCE.to_string(),
            control_action: EXTRACTED_CONTROL_ACTION.to_string(),
        }
    }

    /// Cells in [`KNOWLEDGE_BASE_COLUMNS`] order.
    #[must_use]
    pub fn cells(&self) -> [&str; 7] {
        [
            &self.modality,
            &self.phase,
            &self.cqa,
            &self.test_methods,
            &self.justification,
            &self.regulatory_source,
            &self.control_action,
        ]
    }
}

/// One aggregated row per CQA, produced fresh for every query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningRow {
    #[serde(rename = "CQA")]
    pub cqa: String,

    #[serde(rename = "Test Methods")]
    pub test_methods: String,

    #[serde(rename = "Control Action")]
    pub control_action: String,

    #[serde(rename = "Justification")]
    pub justification: String,

    #[serde(rename = "Reference")]
    pub reference: String,
}

impl ReasoningRow {
    /// The single row that stands for "no results".
    #[must_use]
    pub fn no_data() -> Self {
        Self {
            cqa: NO_DATA_FOUND.to_string(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn is_no_data(&self) -> bool {
        self.cqa == NO_DATA_FOUND
            && self.test_methods.is_empty()
            && self.control_action.is_empty()
            && self.justification.is_empty()
            && self.reference.is_empty()
    }

    /// Cells in [`REASONING_COLUMNS`] order.
    #[must_use]
    pub fn cells(&self) -> [&str; 5] {
        [
            &self.cqa,
            &self.test_methods,
            &self.control_action,
            &self.justification,
            &self.reference,
        ]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    /// Whether this role may upload documents and browse the raw knowledge base.
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            hint: None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorResponse {
    pub error: ErrorEnvelope,
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}
