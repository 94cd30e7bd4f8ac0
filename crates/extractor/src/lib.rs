//! # CMC Extractor
//!
//! Turns an uploaded regulatory PDF into candidate (CQA, test method) pairs.
//!
//! ## Pipeline
//!
//! ```text
//! PDF bytes
//!     │
//!     ├──> Text extraction (page by page, no OCR)
//!     │
//!     ├──> Fixed windows (1000 characters, no boundary alignment)
//!     │
//!     └──> Keyword rules
//!          ├─> Rule set chosen by modality (biologic / small molecule)
//!          └─> One pair per firing rule, window order then rule order
//! ```
//!
//! ## Example
//!
//! ```rust
//! use cmc_extractor::{Classifier, ExtractorConfig};
//!
//! let classifier = Classifier::new(ExtractorConfig::default()).unwrap();
//! let extraction = classifier.classify_document_text(
//!     "Purity and potency are release tests.",
//!     "mAb",
//!     "Phase 1",
//! );
//! for record in extraction.to_records() {
//!     println!("{} -> {}", record.cqa, record.test_methods);
//! }
//! ```

mod classifier;
mod config;
mod error;
mod pdf_text;
mod rules;
mod types;
mod window;

pub use classifier::Classifier;
pub use config::{ExtractorConfig, DEFAULT_WINDOW_CHARS};
pub use error::{ExtractorError, Result};
pub use pdf_text::{extract_text, extract_text_from_file};
pub use rules::{rules_for, KeywordRule, ModalityClass, RULES};
pub use types::{CandidatePair, Extraction};
pub use window::split_windows;
