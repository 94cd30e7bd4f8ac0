use thiserror::Error;

/// Result type for report rendering
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors raised while producing a PDF report
#[derive(Error, Debug)]
pub enum ReportError {
    /// The PDF object model rejected the document
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Writing the serialized document failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
