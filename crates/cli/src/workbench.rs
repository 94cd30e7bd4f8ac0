use crate::config::AppConfig;
use cmc_extractor::{Classifier, ExtractorError};
use cmc_knowledge_base::{KnowledgeBase, KnowledgeBaseError};
use cmc_protocol::{CqaRecord, ReasoningRow};
use cmc_reasoning::QueryOptions;
use cmc_report::{ReportError, ReportRenderer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const INGEST_INPUT_MESSAGE: &str = "Please upload a PDF and fill modality and phase.";
pub const NOTHING_EXTRACTED_MESSAGE: &str = "No extractable data found in PDF.";
pub const INVALID_LOGIN_MESSAGE: &str = "Invalid username or password";

/// Failures surfaced to API and CLI callers.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Missing or expired session")]
    SessionRequired,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Malformed PDF: {0}")]
    MalformedDocument(String),

    #[error("Knowledge base error: {0}")]
    Storage(#[from] KnowledgeBaseError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials | Self::SessionRequired => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::InvalidRequest(_) => "invalid_request",
            Self::MalformedDocument(_) => "malformed_document",
            Self::Storage(_) => "storage_error",
            Self::Report(_) => "report_error",
            Self::Internal(_) => "internal",
        }
    }

    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::SessionRequired => {
                Some("Log in via POST /api/login and send Authorization: Bearer <token>.")
            }
            Self::Forbidden(_) => Some("This view requires the admin role."),
            Self::MalformedDocument(_) => Some("Upload the raw bytes of a PDF file."),
            _ => None,
        }
    }
}

impl From<ExtractorError> for ServiceError {
    fn from(err: ExtractorError) -> Self {
        match err {
            ExtractorError::MalformedPdf(inner) => Self::MalformedDocument(inner.to_string()),
            ExtractorError::IoError(inner) => Self::Storage(KnowledgeBaseError::IoError(inner)),
            ExtractorError::InvalidConfig(message) => Self::Internal(message),
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Outcome of one ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub added: usize,
    pub total_rows: usize,
    pub windows: usize,
    pub message: String,
}

/// The application core shared by the HTTP API and the CLI.
///
/// All methods block on file I/O; async callers run them on the blocking pool.
#[derive(Debug)]
pub struct Workbench {
    config: AppConfig,
    classifier: Classifier,
    knowledge_base: KnowledgeBase,
    renderer: ReportRenderer,
}

impl Workbench {
    pub fn open(config: AppConfig) -> ServiceResult<Self> {
        let classifier = Classifier::new(config.extractor.clone())?;
        let knowledge_base = KnowledgeBase::open(&config.knowledge_base_path)?;
        let renderer = ReportRenderer::new(config.report.layout);
        Ok(Self {
            config,
            classifier,
            knowledge_base,
            renderer,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    /// Extract candidates from `document`, stamp them and append them.
    ///
    /// Missing inputs are rejected before any parsing. A document that yields
    /// nothing is a successful no-op.
    pub fn ingest(
        &self,
        document: &[u8],
        modality: &str,
        phase: &str,
    ) -> ServiceResult<IngestSummary> {
        let modality = modality.trim();
        let phase = phase.trim();
        if document.is_empty() || modality.is_empty() || phase.is_empty() {
            return Err(ServiceError::InvalidRequest(INGEST_INPUT_MESSAGE.to_string()));
        }

        let extraction = self.classifier.ingest(document, modality, phase)?;
        let records = extraction.to_records();
        let outcome = self.knowledge_base.append(&records)?;

        let message = if outcome.appended == 0 {
            NOTHING_EXTRACTED_MESSAGE.to_string()
        } else {
            format!("Ingestion complete. {} new records added!", outcome.appended)
        };
        log::info!(
            "Ingested {modality}/{phase}: {} windows, {} pairs, {} rows added ({} total)",
            extraction.windows,
            extraction.pairs.len(),
            outcome.appended,
            outcome.total_rows()
        );

        Ok(IngestSummary {
            added: outcome.appended,
            total_rows: outcome.total_rows(),
            windows: extraction.windows,
            message,
        })
    }

    pub fn query(&self, modality: &str, phase: &str) -> ServiceResult<Vec<ReasoningRow>> {
        let records = self.knowledge_base.load()?;
        let rows = cmc_reasoning::query(modality, phase, &records);
        if rows.first().is_some_and(ReasoningRow::is_no_data) {
            log::info!("No knowledge base rows for modality={modality:?} phase={phase:?}");
        }
        Ok(rows)
    }

    /// The aggregated rows for a query rendered as a PDF report.
    pub fn query_pdf(
        &self,
        modality: &str,
        phase: &str,
        title: Option<&str>,
    ) -> ServiceResult<Vec<u8>> {
        let rows = self.query(modality, phase)?;
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(self.config.report_title.as_str());
        Ok(self.renderer.render_reasoning(&rows, title)?)
    }

    pub fn options(&self) -> ServiceResult<QueryOptions> {
        let records = self.knowledge_base.load()?;
        Ok(cmc_reasoning::options(&records))
    }

    pub fn records(&self) -> ServiceResult<Vec<CqaRecord>> {
        Ok(self.knowledge_base.load()?)
    }

    pub fn export_csv(&self) -> ServiceResult<Vec<u8>> {
        Ok(self.knowledge_base.export_csv()?)
    }
}
