//! Run log recording the options, inputs and outputs of an analysis.
//!
//! Each entry is a tab-delimited line of timestamp, label and message.
//! Input files are recorded with their CRC-32.

use std::fmt::Debug;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use crc::{Crc, CRC_32_ISO_HDLC};
use log::{debug, info};

use crate::error::Result;

pub const RUN_LOG_FILE: &str = "analysis.log";

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

pub struct RunLog {
    path: Option<PathBuf>,
    out: Option<BufWriter<File>>,
}

impl RunLog {
    /// Start a new log at `<dir>/analysis.log`, replacing any previous one.
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<RunLog> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(RUN_LOG_FILE);
        let out = BufWriter::new(File::create(&path)?);
        debug!("Logging run to {}", path.display());
        Ok(RunLog { path: Some(path), out: Some(out) })
    }

    /// A log that records nothing, for dry runs.
    pub fn disabled() -> RunLog {
        RunLog { path: None, out: None }
    }

    /// Start a log unless this is a dry run.
    pub fn for_run<P: AsRef<Path>>(dir: P, dry_run: bool) -> Result<RunLog> {
        if dry_run { Ok(RunLog::disabled()) } else { RunLog::create(dir) }
    }

    #[inline]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.out.is_some()
    }

    pub fn message(&mut self, label: &str, msg: &str) -> Result<()> {
        if let Some(out) = self.out.as_mut() {
            writeln!(out, "{}\t{}\t{}", Local::now().format("%Y-%m-%d %H:%M:%S"), label, msg)?;
            out.flush()?;
        }
        Ok(())
    }

    /// Record the settings of a run.
    pub fn vars<T: Debug>(&mut self, vars: &T) -> Result<()> {
        self.message("vars", &format!("{:?}", vars))
    }

    pub fn input_file<P: AsRef<Path>>(&mut self, label: &str, path: P) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let path = path.as_ref();
        let checksum = CRC32.checksum(&fs::read(path)?);
        self.message(label, &format!("{} crc32={:08x}", path.display(), checksum))
    }

    /// Record an output file; it is also reported on the console.
    pub fn output_file<P: AsRef<Path>>(&mut self, label: &str, path: P) -> Result<()> {
        let path = path.as_ref();
        info!("Wrote {}", path.display());
        self.message(label, &path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entries() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("counts.txt");
        fs::write(&input, "123456789").unwrap();

        let mut log = RunLog::create(dir.path().join("out")).unwrap();
        log.vars(&("first_order", false)).unwrap();
        log.input_file("countsfile1_path", &input).unwrap();
        log.output_file("summary", dir.path().join("out/summary.txt")).unwrap();

        let text = fs::read_to_string(dir.path().join("out").join(RUN_LOG_FILE)).unwrap();
        let lines: Vec<Vec<&str>> = text.lines().map(|l| l.split('\t').collect()).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0][1], "vars");
        assert_eq!(lines[0][2], "(\"first_order\", false)");
        // CRC-32 check value of "123456789"
        assert!(lines[1][2].ends_with("crc32=cbf43926"));
        assert_eq!(lines[2][1], "summary");
        assert!(lines[2][2].ends_with("summary.txt"));
    }

    #[test]
    fn test_disabled_log_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RunLog::for_run(dir.path().join("out"), true).unwrap();
        assert!(!log.is_enabled());
        assert!(log.path().is_none());
        log.input_file("countsfile1_path", dir.path().join("missing.txt")).unwrap();
        log.output_file("summary", dir.path().join("summary.txt")).unwrap();
        assert!(!dir.path().join("out").exists());
    }
}
