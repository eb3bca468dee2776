//! # Telemetry Module
//!
//! Handles antenna system telemetry logging to JSONL files with rotation.
//!
//! This module handles:
//! - Building telemetry records from status and temperature readings
//! - Formatting as JSONL (JSON Lines)
//! - Writing to rotating log files
//! - Managing file rotation (max N records per file)
//! - Retaining only last M files

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::protocol::calibration::TemperatureReading;
use crate::protocol::opcodes::Microcontroller;
use crate::protocol::status::{self, StatusReport};

const FILE_PREFIX: &str = "telemetry_";
const FILE_EXTENSION: &str = "jsonl";

/// One telemetry sample of the antenna system
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    pub timestamp: DateTime<Utc>,
    pub microcontroller: Microcontroller,
    pub status_code: u16,
    pub status: StatusReport,
    pub temperature: TemperatureReading,
    /// Temperature with the out-of-range sentinel applied
    pub temperature_c: i16,
}

impl TelemetryRecord {
    /// Build a record stamped with the current time
    pub fn new(
        microcontroller: Microcontroller,
        status_code: u16,
        temperature: TemperatureReading,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            microcontroller,
            status_code,
            status: status::decode(status_code),
            temperature,
            temperature_c: temperature.value(),
        }
    }

    /// Serialize as a single JSON line (without trailing newline)
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Appends telemetry records to rotating JSONL files
pub struct TelemetryWriter {
    log_dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    current: Option<BufWriter<File>>,
    records_in_file: usize,
}

impl std::fmt::Debug for TelemetryWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryWriter")
            .field("log_dir", &self.log_dir)
            .field("records_in_file", &self.records_in_file)
            .finish_non_exhaustive()
    }
}

impl TelemetryWriter {
    /// Create a writer, creating `log_dir` if needed
    ///
    /// # Errors
    ///
    /// Returns `Io` error if the directory cannot be created
    pub fn new<P: AsRef<Path>>(
        log_dir: P,
        max_records_per_file: usize,
        max_files_to_keep: usize,
    ) -> Result<Self> {
        let log_dir = log_dir.as_ref().to_path_buf();
        fs::create_dir_all(&log_dir)?;

        Ok(Self {
            log_dir,
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            current: None,
            records_in_file: 0,
        })
    }

    /// Append one record, rotating files as needed
    pub fn write(&mut self, record: &TelemetryRecord) -> Result<()> {
        if self.current.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let line = record.to_json_line()?;
        if let Some(file) = self.current.as_mut() {
            writeln!(file, "{}", line)?;
            file.flush()?;
        }
        self.records_in_file += 1;
        Ok(())
    }

    /// Telemetry files in `log_dir`, oldest first
    pub fn log_files(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.log_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_telemetry_file(path))
            .collect();
        // Timestamped names sort chronologically
        files.sort();
        Ok(files)
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut file) = self.current.take() {
            file.flush()?;
        }

        let path = self.next_file_path();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!("Writing telemetry to {}", path.display());
        self.current = Some(BufWriter::new(file));
        self.records_in_file = 0;

        self.prune()
    }

    fn next_file_path(&self) -> PathBuf {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.6f");
        let mut path = self.log_dir.join(format!("{}{}.{}", FILE_PREFIX, stamp, FILE_EXTENSION));
        let mut n = 1;
        while path.exists() {
            path = self
                .log_dir
                .join(format!("{}{}_{}.{}", FILE_PREFIX, stamp, n, FILE_EXTENSION));
            n += 1;
        }
        path
    }

    fn prune(&self) -> Result<()> {
        let files = self.log_files()?;
        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        for old in &files[..files.len() - self.max_files_to_keep] {
            match fs::remove_file(old) {
                Ok(()) => debug!("Removed old telemetry file {}", old.display()),
                Err(e) => warn!("Failed to remove {}: {}", old.display(), e),
            }
        }
        Ok(())
    }
}

fn is_telemetry_file(path: &Path) -> bool {
    let name_ok = path
        .file_name()
        .and_then(|n| n.to_str())
        .map_or(false, |n| n.starts_with(FILE_PREFIX));
    let ext_ok = path.extension().and_then(|e| e.to_str()) == Some(FILE_EXTENSION);
    name_ok && ext_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_record() -> TelemetryRecord {
        TelemetryRecord::new(Microcontroller::Primary, 0x0001, TemperatureReading::Celsius(21))
    }

    #[test]
    fn test_record_decodes_status() {
        let record = TelemetryRecord::new(Microcontroller::Secondary, 1 << 15, TemperatureReading::OutOfRange);
        assert!(record.status.antennas[0].not_deployed);
        assert!(!record.status.armed);
        assert_eq!(record.temperature_c, -200);
    }

    #[test]
    fn test_record_json_line() {
        let line = sample_record().to_json_line().unwrap();
        assert!(!line.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["microcontroller"], "Primary");
        assert_eq!(value["status_code"], 1);
        assert_eq!(value["status"]["armed"], true);
        assert_eq!(value["temperature_c"], 21);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_writer_appends_lines() {
        let dir = TempDir::new().unwrap();
        let mut writer = TelemetryWriter::new(dir.path(), 100, 5).unwrap();

        for _ in 0..3 {
            writer.write(&sample_record()).unwrap();
        }

        let files = writer.log_files().unwrap();
        assert_eq!(files.len(), 1);
        let contents = fs::read_to_string(&files[0]).unwrap();
        assert_eq!(contents.lines().count(), 3);
    }

    #[test]
    fn test_writer_rotates_and_prunes() {
        let dir = TempDir::new().unwrap();
        let mut writer = TelemetryWriter::new(dir.path(), 2, 2).unwrap();

        // 7 records at 2 per file = 4 files, only 2 kept
        for _ in 0..7 {
            writer.write(&sample_record()).unwrap();
        }

        let files = writer.log_files().unwrap();
        assert_eq!(files.len(), 2);

        let newest = fs::read_to_string(files.last().unwrap()).unwrap();
        assert_eq!(newest.lines().count(), 1);
        let older = fs::read_to_string(&files[0]).unwrap();
        assert_eq!(older.lines().count(), 2);
    }

    #[test]
    fn test_writer_ignores_foreign_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "keep me").unwrap();

        let mut writer = TelemetryWriter::new(dir.path(), 1, 1).unwrap();
        writer.write(&sample_record()).unwrap();
        writer.write(&sample_record()).unwrap();

        assert!(dir.path().join("notes.txt").exists());
        assert_eq!(writer.log_files().unwrap().len(), 1);
    }

    #[test]
    fn test_writer_creates_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let mut writer = TelemetryWriter::new(&nested, 10, 1).unwrap();
        writer.write(&sample_record()).unwrap();
        assert!(nested.is_dir());
    }
}
