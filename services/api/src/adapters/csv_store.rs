//! services/api/src/adapters/csv_store.rs
//!
//! The CSV data file adapter, the concrete implementation of the `ResponseStore`
//! port. One row is appended per submitted questionnaire; the header row is
//! written when the file is first created.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use paid_survey_core::domain::{RecordTable, ResponseRecord, CSV_COLUMNS};
use paid_survey_core::ports::{PortError, PortResult, ResponseStore};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A response store backed by a single append-only CSV file.
///
/// Every append and read goes through one lock, so rows written by this
/// process never interleave and the header is written at most once.
pub struct CsvResponseStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvResponseStore {
    /// Creates a new `CsvResponseStore`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the next append starts a fresh file.
    async fn needs_header(&self) -> PortResult<bool> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => Ok(meta.len() == 0),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
            Err(e) => Err(io_error(&self.path, e)),
        }
    }

    async fn read_table(&self) -> PortResult<Option<RecordTable>> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&self.path, e)),
        };
        if data.is_empty() {
            return Ok(None);
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(data.as_slice());
        let columns: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Some(RecordTable { columns, rows }))
    }
}

//=========================================================================================
// `ResponseStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ResponseStore for CsvResponseStore {
    async fn append_record(&self, record: &ResponseRecord) -> PortResult<()> {
        let _guard = self.lock.lock().await;

        let row = record.to_row();
        let write_header = self.needs_header().await?;
        let encoded = if write_header {
            let header: Vec<String> = CSV_COLUMNS.iter().map(|c| c.to_string()).collect();
            encode_csv([header, row])?
        } else {
            encode_csv([row])?
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| io_error(&self.path, e))?;
        file.write_all(&encoded)
            .await
            .map_err(|e| io_error(&self.path, e))?;
        file.flush().await.map_err(|e| io_error(&self.path, e))?;

        if write_header {
            info!("Created data file {}", self.path.display());
        }
        debug!(
            "Appended record for patient {} to {}",
            record.form.patient.patient_id,
            self.path.display()
        );
        Ok(())
    }

    async fn list_records(&self) -> PortResult<Option<RecordTable>> {
        let _guard = self.lock.lock().await;
        self.read_table().await
    }

    async fn export(&self) -> PortResult<Option<Bytes>> {
        let table = {
            let _guard = self.lock.lock().await;
            self.read_table().await?
        };
        let Some(table) = table else {
            return Ok(None);
        };

        let encoded = encode_csv(std::iter::once(table.columns).chain(table.rows))?;
        Ok(Some(Bytes::from(encoded)))
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Encodes rows as CSV, quoting cells that need it.
fn encode_csv<I, R, T>(rows: I) -> PortResult<Vec<u8>>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row).map_err(csv_error)?;
    }
    writer
        .into_inner()
        .map_err(|e| PortError::Unexpected(format!("Failed to encode CSV: {}", e)))
}

fn csv_error(e: csv::Error) -> PortError {
    PortError::Unexpected(format!("Malformed data file: {}", e))
}

fn io_error(path: &Path, e: std::io::Error) -> PortError {
    PortError::Unexpected(format!("Data file {}: {}", path.display(), e))
}
