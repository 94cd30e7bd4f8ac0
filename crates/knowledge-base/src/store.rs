use crate::csv_io::{read_records, records_to_csv, write_records};
use crate::store_lock::acquire_store_write_lock;
use crate::{KnowledgeBaseError, Result};
use cmc_protocol::CqaRecord;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default location of the knowledge base, relative to the working directory.
pub const DEFAULT_KNOWLEDGE_BASE_PATH: &str = "output/CQA_KnowledgeBase_Master.csv";

/// Result of one append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppendOutcome {
    /// Rows present before the append
    pub previous_rows: usize,
    /// Rows added by this append
    pub appended: usize,
}

impl AppendOutcome {
    pub fn total_rows(&self) -> usize {
        self.previous_rows + self.appended
    }
}

/// The knowledge base file.
///
/// Reads take no lock. Every write holds an exclusive lock on `<path>.lock`
/// for the whole load → mutate → write cycle and replaces the file through a
/// temp file + rename, so a reader sees either the old or the new table.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    path: PathBuf,
}

impl KnowledgeBase {
    /// Open the store, creating the file (and parent directories) with the
    /// fixed header if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(KnowledgeBaseError::InvalidPath("empty path".into()));
        }
        let store = Self { path };
        store.ensure_exists()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_exists(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let _lock = acquire_store_write_lock(&self.path)?;
        if self.path.exists() {
            return Ok(());
        }
        self.replace_contents(&[])?;
        log::info!("created knowledge base {}", self.path.display());
        Ok(())
    }

    /// Load the whole table.
    pub fn load(&self) -> Result<Vec<CqaRecord>> {
        let file = File::open(&self.path)?;
        read_records(BufReader::new(file), &self.path)
    }

    /// Append `records` to the table and persist it.
    pub fn append(&self, records: &[CqaRecord]) -> Result<AppendOutcome> {
        let _lock = acquire_store_write_lock(&self.path)?;

        let mut table = self.load()?;
        let previous_rows = table.len();
        if records.is_empty() {
            return Ok(AppendOutcome {
                previous_rows,
                appended: 0,
            });
        }

        table.extend_from_slice(records);
        self.replace_contents(&table)?;

        log::info!(
            "appended {} rows to {} ({} total)",
            records.len(),
            self.path.display(),
            table.len()
        );
        Ok(AppendOutcome {
            previous_rows,
            appended: records.len(),
        })
    }

    /// Replace the whole table.
    pub fn save(&self, records: &[CqaRecord]) -> Result<()> {
        let _lock = acquire_store_write_lock(&self.path)?;
        self.replace_contents(records)
    }

    /// The full table as CSV bytes, for download.
    pub fn export_csv(&self) -> Result<Vec<u8>> {
        records_to_csv(&self.load()?)
    }

    /// Caller must hold the store lock.
    fn replace_contents(&self, records: &[CqaRecord]) -> Result<()> {
        let tmp = self.tmp_path();
        {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            write_records(&mut writer, records, &self.path)?;
            writer.flush()?;
            writer
                .into_inner()
                .map_err(|err| KnowledgeBaseError::IoError(err.into_error()))?
                .sync_all()?;
        }
        if let Err(err) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
