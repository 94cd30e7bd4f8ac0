use crate::rules::ModalityClass;
use cmc_protocol::CqaRecord;
use serde::{Deserialize, Serialize};

/// A (CQA, test methods) candidate found in one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePair {
    pub cqa: String,
    pub test_methods: String,
}

impl CandidatePair {
    pub fn new(cqa: impl Into<String>, test_methods: impl Into<String>) -> Self {
        Self {
            cqa: cqa.into(),
            test_methods: test_methods.into(),
        }
    }
}

impl From<(&str, &str)> for CandidatePair {
    fn from((cqa, test_methods): (&str, &str)) -> Self {
        Self::new(cqa, test_methods)
    }
}

/// Everything one ingestion pass learned about a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub modality: String,
    pub phase: String,
    pub class: ModalityClass,

    /// Number of characters of extracted text
    pub text_chars: usize,

    /// Number of windows scanned
    pub windows: usize,

    /// Candidates in window order, then rule order
    pub pairs: Vec<CandidatePair>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Stamp every pair with modality, phase and extraction provenance.
    pub fn to_records(&self) -> Vec<CqaRecord> {
        self.pairs
            .iter()
            .map(|pair| {
                CqaRecord::extracted(
                    self.modality.as_str(),
                    self.phase.as_str(),
                    pair.cqa.as_str(),
                    pair.test_methods.as_str(),
                )
            })
            .collect()
    }
}
