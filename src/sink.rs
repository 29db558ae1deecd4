use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::record::{ReviewRecord, HEADER};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Append-only CSV output. The file is reopened for every batch and flushed
/// after every row, so a crash loses nothing that was already appended.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    /// Starts a fresh file: any previous content is discarded and the BOM and
    /// header are written.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut file = File::create(&path)
            .with_context(|| format!("cannot create {}", path.display()))?;
        file.write_all(UTF8_BOM)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(HEADER)?;
        writer.flush()?;

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the file for one cycle of appends. It is closed again when the
    /// returned batch is dropped.
    pub fn batch(&self) -> Result<SinkBatch> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("cannot open {} for appending", self.path.display()))?;
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        Ok(SinkBatch { writer, written: 0 })
    }

    /// Appends `records` and returns how many rows were written.
    pub fn append(&self, records: &[ReviewRecord]) -> Result<usize> {
        let mut batch = self.batch()?;
        for record in records {
            batch.write(record)?;
        }
        Ok(batch.written())
    }
}

pub struct SinkBatch {
    writer: csv::Writer<File>,
    written: usize,
}

impl SinkBatch {
    /// Writes one row and flushes it to the file before returning.
    pub fn write(&mut self, record: &ReviewRecord) -> Result<()> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }
}
