use crate::config::ExtractorConfig;
use crate::error::{ExtractorError, Result};
use crate::pdf_text;
use crate::rules::{rules_for, ModalityClass};
use crate::types::{CandidatePair, Extraction};
use crate::window::split_windows;
use std::path::Path;

/// Keyword-window classifier for regulatory documents
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    config: ExtractorConfig,
}

impl Classifier {
    /// Create a classifier, rejecting invalid configuration
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        config.validate().map_err(ExtractorError::invalid_config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Rule set selected by `modality`. Depends on the modality only, never on content.
    pub fn modality_class(&self, modality: &str) -> ModalityClass {
        if self.config.is_biologic(modality) {
            ModalityClass::Biologic
        } else {
            ModalityClass::SmallMolecule
        }
    }

    /// Extract, window and classify a PDF held in memory.
    pub fn ingest(&self, document: &[u8], modality: &str, phase: &str) -> Result<Extraction> {
        let text = pdf_text::extract_text(document)?;
        Ok(self.classify_document_text(&text, modality, phase))
    }

    /// Same as [`Classifier::ingest`], reading the PDF from disk.
    pub fn ingest_file(
        &self,
        path: impl AsRef<Path>,
        modality: &str,
        phase: &str,
    ) -> Result<Extraction> {
        let text = pdf_text::extract_text_from_file(path)?;
        Ok(self.classify_document_text(&text, modality, phase))
    }

    /// Classify already-extracted text.
    pub fn classify_document_text(&self, text: &str, modality: &str, phase: &str) -> Extraction {
        let class = self.modality_class(modality);
        let windows = split_windows(text, self.config.window_chars);
        let pairs = classify_windows(&windows, class);

        log::debug!(
            "classified {} chars in {} windows as {}: {} candidates",
            text.chars().count(),
            windows.len(),
            class.as_str(),
            pairs.len()
        );

        Extraction {
            modality: modality.to_string(),
            phase: phase.to_string(),
            class,
            text_chars: text.chars().count(),
            windows: windows.len(),
            pairs,
        }
    }

    /// Candidate pairs only, in window order then rule order.
    pub fn classify_text(&self, text: &str, modality: &str) -> Vec<CandidatePair> {
        let windows = split_windows(text, self.config.window_chars);
        classify_windows(&windows, self.modality_class(modality))
    }
}

fn classify_windows(windows: &[&str], class: ModalityClass) -> Vec<CandidatePair> {
    let mut pairs = Vec::new();
    for window in windows {
        let lower = window.to_lowercase();
        for rule in rules_for(class) {
            if rule.matches(&lower) {
                pairs.push(CandidatePair::new(rule.cqa, rule.test_methods));
            }
        }
    }
    pairs
}
