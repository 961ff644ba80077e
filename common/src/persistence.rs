// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use enviro_model::Reading;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("writing {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("writing {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
}

/// What a flush does with rows already in the file.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlushMode {
    /// Keep earlier flushes and add the new rows after them.
    #[default]
    Append,
    /// Replace the file with the rows of this flush only.
    Overwrite,
}

/// Buffers readings in memory and writes them out as CSV rows, without a header.
pub struct CsvSink {
    path: PathBuf,
    mode: FlushMode,
    buffer: Vec<Vec<String>>,
    last_flush: Instant,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>, mode: FlushMode) -> Self {
        Self {
            path: path.into(),
            mode,
            buffer: Vec::new(),
            last_flush: Instant::now(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn push(&mut self, reading: &Reading) {
        self.buffer.push(reading.csv_record());
    }

    pub fn since_last_flush(&self) -> Duration {
        self.last_flush.elapsed()
    }

    /// Whether more than `interval` passed since the last flush.
    pub fn due(&self, interval: Duration) -> bool {
        self.since_last_flush() > interval
    }

    /// Restarts the flush clock without writing, e.g. after a failed flush.
    pub fn reset_clock(&mut self) {
        self.last_flush = Instant::now();
    }

    /// Writes every buffered reading and empties the buffer.
    ///
    /// Returns the number of rows written. The rows are encoded before the file is touched
    /// and go out in a single write; an overwrite goes through a temporary file that replaces
    /// the old one. On error the buffer is left untouched.
    pub fn flush(&mut self) -> Result<usize, PersistError> {
        let io_error = |source| PersistError::Io {
            path: self.path.clone(),
            source,
        };

        let bytes = self.encode()?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        match self.mode {
            FlushMode::Append => {
                let mut file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)
                    .map_err(io_error)?;
                file.write_all(&bytes).map_err(io_error)?;
                file.flush().map_err(io_error)?;
            }
            FlushMode::Overwrite => {
                let mut staging = self.path.clone().into_os_string();
                staging.push(".tmp");
                let staging = PathBuf::from(staging);

                std::fs::write(&staging, &bytes).map_err(io_error)?;
                std::fs::rename(&staging, &self.path).map_err(io_error)?;
            }
        }

        let rows = self.buffer.len();
        log::info!("Saved {rows} readings to {}", self.path.display());

        self.buffer.clear();
        self.reset_clock();

        Ok(rows)
    }

    fn encode(&self) -> Result<Vec<u8>, PersistError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(Vec::new());

        for record in &self.buffer {
            writer
                .write_record(record)
                .map_err(|source| PersistError::Csv {
                    path: self.path.clone(),
                    source,
                })?;
        }

        writer.into_inner().map_err(|e| PersistError::Io {
            path: self.path.clone(),
            source: e.into_error(),
        })
    }
}

#[cfg(test)]
fn temp_csv(name: &str) -> PathBuf {
    let path = std::env::temp_dir()
        .join(format!("enviro-csv-{}", std::process::id()))
        .join(name);
    let _ = std::fs::remove_file(&path);
    path
}

#[cfg(test)]
fn reading(temperature: f64) -> Reading {
    Reading {
        timestamp: chrono::Local::now(),
        temperature,
        pressure: 1000.0,
        humidity: 50.0,
        light: 1.0,
        gas: Default::default(),
        particulates: None,
    }
}

#[cfg(test)]
fn rows(path: &Path) -> Vec<csv::StringRecord> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap()
        .records()
        .collect::<Result<_, _>>()
        .unwrap()
}

#[test]
fn test_flush_writes_buffer_and_clears_it() {
    let path = temp_csv("flush.csv");
    let mut sink = CsvSink::new(&path, FlushMode::Append);

    for i in 0..5 {
        sink.push(&reading(20.0 + i as f64));
    }

    assert_eq!(sink.flush().unwrap(), 5);
    assert_eq!(sink.len(), 0);

    let rows = rows(&path);
    assert_eq!(rows.len(), 5);
    // The timestamp keeps its comma inside one quoted field
    assert_eq!(rows[0].len(), 8);
    assert_eq!(&rows[4][1], "24.0");
}

#[test]
fn test_append_and_overwrite_modes() {
    let path = temp_csv("modes.csv");

    let mut sink = CsvSink::new(&path, FlushMode::Append);
    sink.push(&reading(1.0));
    sink.flush().unwrap();
    sink.push(&reading(2.0));
    sink.push(&reading(3.0));
    sink.flush().unwrap();
    assert_eq!(rows(&path).len(), 3);

    let mut sink = CsvSink::new(&path, FlushMode::Overwrite);
    sink.push(&reading(4.0));
    sink.flush().unwrap();
    assert_eq!(rows(&path).len(), 1);
}

#[test]
fn test_due() {
    let sink = CsvSink::new(temp_csv("due.csv"), FlushMode::Append);

    assert!(!sink.due(Duration::from_secs(3600)));
}

#[test]
fn test_failed_flush_keeps_rows_for_retry() {
    let path = temp_csv("retry.csv");
    // A directory in place of the file makes the first flush fail
    std::fs::create_dir_all(&path).unwrap();

    let mut sink = CsvSink::new(&path, FlushMode::Append);
    sink.push(&reading(1.0));
    sink.push(&reading(2.0));

    assert!(matches!(sink.flush(), Err(PersistError::Io { .. })));
    assert_eq!(sink.len(), 2);

    std::fs::remove_dir(&path).unwrap();
    assert_eq!(sink.flush().unwrap(), 2);
    assert_eq!(rows(&path).len(), 2);
}
