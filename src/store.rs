//! Append-only lead record store
//!
//! One CSV row per persisted status transition. The file is truncated and the
//! header rewritten when the store is created, so each run starts clean.

use crate::state_machine::state::{Field, LeadState, LeadStatus};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Record writer lock poisoned by a panic in another append")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A row in the record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub lead_id: String,
    pub name: String,
    pub age: String,
    pub country: String,
    pub interest: String,
    pub status: LeadStatus,
}

impl LeadRecord {
    pub const COLUMNS: [&'static str; 6] = ["lead_id", "name", "age", "country", "interest", "status"];

    /// Snapshot a lead; unanswered fields become empty strings
    pub fn from_state(state: &LeadState) -> Self {
        let field = |f: Field| state.answer(f).unwrap_or_default().to_string();
        Self {
            lead_id: state.lead_id.clone(),
            name: state.name.clone(),
            age: field(Field::Age),
            country: field(Field::Country),
            interest: field(Field::Interest),
            status: state.status,
        }
    }
}

// ============================================================================
// Record file
// ============================================================================

/// Byte sink behind the store that can be cut back after a failed write
pub trait RecordFile: Write + Send {
    /// Current end of the file; the next write lands here
    fn end_offset(&mut self) -> io::Result<u64>;

    /// Drop everything past `offset` and continue writing there
    fn truncate_to(&mut self, offset: u64) -> io::Result<()>;

    /// Make written bytes durable
    fn sync(&mut self) -> io::Result<()>;
}

impl RecordFile for File {
    fn end_offset(&mut self) -> io::Result<u64> {
        self.seek(SeekFrom::End(0))
    }

    fn truncate_to(&mut self, offset: u64) -> io::Result<()> {
        self.set_len(offset)?;
        self.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

/// CSV-backed record store with a single serialized writer.
///
/// Each row is encoded in memory and written in one piece. A row whose write
/// fails is cut off again, so nothing of it reaches the file later.
pub struct CsvRecordStore<F: RecordFile = File> {
    path: PathBuf,
    file: Mutex<F>,
}

impl CsvRecordStore {
    /// Create (or truncate) the file at `path` and write the header
    pub fn create<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = File::create(&path)?;
        file.write_all(&encode_row(LeadRecord::COLUMNS)?)?;
        file.sync_data()?;

        tracing::info!(path = %path.display(), "Cleared record store for new run");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }
}

impl<F: RecordFile> CsvRecordStore<F> {
    /// Append one row and make it durable before returning
    pub fn append_record(&self, record: &LeadRecord) -> StoreResult<()> {
        let row = encode_row(record)?;

        let mut file = self.file.lock().map_err(|_| StoreError::Poisoned)?;
        let start = file.end_offset()?;
        if let Err(e) = write_durably(&mut *file, &row) {
            if let Err(rollback) = file.truncate_to(start) {
                tracing::error!(
                    lead_id = %record.lead_id,
                    error = %rollback,
                    "Failed to cut back partial record"
                );
            }
            return Err(e.into());
        }
        drop(file);

        tracing::info!(
            lead_id = %record.lead_id,
            name = %record.name,
            status = %record.status,
            path = %self.path.display(),
            "Wrote lead record"
        );
        Ok(())
    }
}

fn encode_row<T: Serialize>(row: T) -> StoreResult<Vec<u8>> {
    let mut encoder = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    encoder.serialize(row)?;
    encoder
        .into_inner()
        .map_err(|e| StoreError::Io(io::Error::other(e.to_string())))
}

fn write_durably<F: RecordFile>(file: &mut F, bytes: &[u8]) -> io::Result<()> {
    file.write_all(bytes)?;
    file.flush()?;
    file.sync()
}

/// Read every row back from a record file
pub fn read_records<P: AsRef<Path>>(path: P) -> StoreResult<Vec<LeadRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader.deserialize().collect::<Result<Vec<LeadRecord>, _>>()?;
    Ok(records)
}
