use crate::output::row::{ResultRow, HEADER};
use crate::output::traits::{ResultSink, SinkError, SinkResult};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Creates a directory and its parents if missing
pub fn ensure_dir(path: &Path) -> SinkResult<()> {
    std::fs::create_dir_all(path).map_err(|source| SinkError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Append-only CSV table shared by all workers
///
/// Every append locks, opens the file, writes one record, flushes and closes,
/// so rows from concurrent callers never interleave.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvSink {
    /// Creates the table, discarding any previous file at `path`
    ///
    /// The new file holds only the header row.
    pub fn create(path: impl Into<PathBuf>) -> SinkResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }

        if path.exists() {
            std::fs::remove_file(&path)?;
        }

        let file = File::create(&path)?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(HEADER)?;
        writer.flush()?;

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row under the sink's lock
    pub fn append(&self, row: &ResultRow) -> SinkResult<()> {
        // The lock guards no data, so a poisoned lock is still usable
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(row.to_record())?;
        writer.flush()?;

        Ok(())
    }
}

impl ResultSink for CsvSink {
    fn append(&self, row: &ResultRow) -> SinkResult<()> {
        CsvSink::append(self, row)
    }
}
