//! # CMC Knowledge Base
//!
//! The flat CSV table of CQA records accumulated from ingested documents.
//!
//! ## Write path
//!
//! ```text
//! append(records)
//!     │
//!     ├──> lock <kb>.lock (exclusive, blocking)
//!     ├──> load full table
//!     ├──> extend in memory
//!     ├──> write <kb>.tmp
//!     └──> rename over <kb>, unlock
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use cmc_knowledge_base::KnowledgeBase;
//! use cmc_protocol::CqaRecord;
//!
//! let kb = KnowledgeBase::open("output/CQA_KnowledgeBase_Master.csv")?;
//! let outcome = kb.append(&[CqaRecord::extracted("mAb", "Phase 1", "Purity", "HPLC, SEC")])?;
//! println!("{} rows now", outcome.total_rows());
//! # Ok::<(), cmc_knowledge_base::KnowledgeBaseError>(())
//! ```

mod csv_io;
mod error;
mod store;
mod store_lock;

pub use csv_io::{read_records, records_to_csv, write_records};
pub use error::{KnowledgeBaseError, Result};
pub use store::{AppendOutcome, KnowledgeBase, DEFAULT_KNOWLEDGE_BASE_PATH};
