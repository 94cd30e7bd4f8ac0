//! PDF table reports.
//!
//! A report is a title plus a [`Table`](cmc_protocol::Table) laid out on US
//! Letter pages. One renderer serves every table; the [`LayoutStrategy`]
//! decides column sizing, font sizes, header shading and whether the header
//! repeats on each page.
//!
//! ```text
//! Table ──► column_widths ──► wrap_text per cell ──► PageCursor ──► lopdf Document
//!               (layout)           (wrap)              (renderer)       (bytes)
//! ```
//!
//! ```no_run
//! use cmc_protocol::ReasoningRow;
//! use cmc_report::{LayoutStrategy, ReportRenderer};
//!
//! let pdf = ReportRenderer::new(LayoutStrategy::Wrapped)
//!     .render_reasoning(&[ReasoningRow::no_data()], "Reasoning Results")?;
//! std::fs::write("reasoning_results.pdf", pdf)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod layout;
mod metrics;
mod renderer;
mod wrap;

pub use error::{ReportError, Result};
pub use layout::{column_widths, LayoutSpec, LayoutStrategy};
pub use metrics::{encode_win_ansi, text_width, unencodable_chars, Font};
pub use renderer::{ReportRenderer, PAGE_HEIGHT, PAGE_MARGIN, PAGE_WIDTH};
pub use wrap::wrap_text;

/// Title used when the caller does not supply one.
pub const DEFAULT_REPORT_TITLE: &str = "Reasoning Results";
