//! Append-only results ledger.
//!
//! One line per trial submission, accepted or not:
//!
//! ```text
//! seq,plan_index,name,value,count,name,value,count,...,ACCEPTED|NA
//! ```
//!
//! Lines are written and fsynced before the attempt they describe exists in
//! memory. They are never rewritten; revising which attempt is official
//! appends a new ACCEPTED line repeating that attempt's sequence number.
//!
//! # Recovery
//!
//! On startup the event reads every record with [`LedgerFile::read_records`]
//! and re-applies them through the live code path using a sink that does not
//! write. Unlike a journal that can drop a torn tail, a line that does not
//! parse is fatal: skipping it could hand its sequence number out again.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::error;

use super::durable::fsync_file;
use crate::types::LedgerSeq;

const ACCEPTED_MARKER: &str = "ACCEPTED";
const NOT_ACCEPTED_MARKER: &str = "NA";

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A line could not be parsed.
    #[error("malformed ledger line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// One lane's share of a ledger line.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneSample {
    /// Competitor (or placeholder) name at the time of writing.
    pub name: String,
    /// Elapsed time in seconds.
    pub value: f64,
    /// Raw timer count.
    pub count: i64,
}

/// A parsed ledger line.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRecord {
    pub seq: LedgerSeq,
    pub plan_index: usize,
    pub lanes: Vec<LaneSample>,
    pub accepted: bool,
}

impl LedgerRecord {
    pub fn times(&self) -> Vec<f64> {
        self.lanes.iter().map(|l| l.value).collect()
    }

    pub fn counts(&self) -> Vec<i64> {
        self.lanes.iter().map(|l| l.count).collect()
    }
}

impl fmt::Display for LedgerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.seq, self.plan_index)?;
        for lane in &self.lanes {
            write!(f, ",{},{},{}", lane.name, lane.value, lane.count)?;
        }
        let marker = if self.accepted {
            ACCEPTED_MARKER
        } else {
            NOT_ACCEPTED_MARKER
        };
        write!(f, ",{}", marker)
    }
}

impl FromStr for LedgerRecord {
    type Err = String;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(',').collect();
        if fields.len() < 6 || (fields.len() - 3) % 3 != 0 {
            return Err(format!(
                "expected seq, plan index, name/value/count triples and a marker; got {} fields",
                fields.len()
            ));
        }

        let seq = fields[0]
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("bad sequence number {:?}: {}", fields[0], e))?;
        let plan_index = fields[1]
            .trim()
            .parse::<usize>()
            .map_err(|e| format!("bad plan index {:?}: {}", fields[1], e))?;

        let marker = fields[fields.len() - 1].trim();
        let accepted = if marker.eq_ignore_ascii_case(ACCEPTED_MARKER) {
            true
        } else if marker == NOT_ACCEPTED_MARKER {
            false
        } else {
            return Err(format!("unknown acceptance marker {:?}", marker));
        };

        let lanes = fields[2..fields.len() - 1]
            .chunks(3)
            .map(|triple| {
                let value = triple[1]
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| format!("bad time {:?}: {}", triple[1], e))?;
                let count = triple[2]
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| format!("bad count {:?}: {}", triple[2], e))?;
                Ok(LaneSample {
                    name: triple[0].to_string(),
                    value,
                    count,
                })
            })
            .collect::<std::result::Result<Vec<_>, String>>()?;

        Ok(LedgerRecord {
            seq: LedgerSeq(seq),
            plan_index,
            lanes,
            accepted,
        })
    }
}

/// Proof that a record went through a ledger sink.
///
/// Only this module can create one, and an `Attempt` cannot be built without
/// it.
#[derive(Debug)]
pub struct Appended {
    seq: LedgerSeq,
}

impl Appended {
    pub fn seq(&self) -> LedgerSeq {
        self.seq
    }
}

/// Destination for ledger records.
pub trait LedgerSink {
    /// Makes `record` durable (or deliberately does not) and returns the receipt.
    fn append(&mut self, record: &LedgerRecord) -> Result<Appended>;
}

/// An append-only ledger file.
#[derive(Debug)]
pub struct LedgerFile {
    /// The underlying file handle, opened for append.
    file: File,
    /// Path to the ledger file.
    path: PathBuf,
}

impl LedgerFile {
    /// Opens an existing ledger or creates a new one, positioned for append.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;

        Ok(LedgerFile { file, path })
    }

    /// Returns the path to the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every record, front to back.
    ///
    /// Returns `(line_number, record)` pairs with 1-based line numbers. Blank
    /// lines are skipped. A missing file reads as empty.
    ///
    /// # Errors
    ///
    /// The first line that fails to parse yields [`LedgerError::Malformed`].
    pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<(usize, LedgerRecord)>> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = line
                .parse::<LedgerRecord>()
                .map_err(|reason| LedgerError::Malformed { line: i + 1, reason })?;
            records.push((i + 1, record));
        }
        Ok(records)
    }

    /// Returns true if the file at `path` holds at least one non-blank line.
    pub fn has_records(path: impl AsRef<Path>) -> io::Result<bool> {
        let file = match File::open(path.as_ref()) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        for line in BufReader::new(file).lines() {
            if !line?.trim().is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl LedgerSink for LedgerFile {
    fn append(&mut self, record: &LedgerRecord) -> Result<Appended> {
        let write = writeln!(self.file, "{}", record).and_then(|()| fsync_file(&self.file));
        if let Err(e) = write {
            error!(path = %self.path.display(), seq = %record.seq, error = %e, "Ledger append failed");
            return Err(e.into());
        }
        Ok(Appended { seq: record.seq })
    }
}

/// The ledger an event writes to.
#[derive(Debug)]
pub enum Ledger {
    /// Durable append-only file.
    File(LedgerFile),

    /// Logging switched off by explicit operator choice. Results are not durable.
    Disabled,
}

impl Ledger {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Ledger::File(_))
    }
}

impl LedgerSink for Ledger {
    fn append(&mut self, record: &LedgerRecord) -> Result<Appended> {
        match self {
            Ledger::File(file) => file.append(record),
            Ledger::Disabled => Ok(Appended { seq: record.seq }),
        }
    }
}

/// Sink used while replaying: the record is already on disk.
#[derive(Debug, Default)]
pub(crate) struct Replay;

impl LedgerSink for Replay {
    fn append(&mut self, record: &LedgerRecord) -> Result<Appended> {
        Ok(Appended { seq: record.seq })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn record(seq: u64, plan_index: usize, counts: &[i64], accepted: bool) -> LedgerRecord {
        LedgerRecord {
            seq: LedgerSeq(seq),
            plan_index,
            lanes: counts
                .iter()
                .enumerate()
                .map(|(i, c)| LaneSample {
                    name: format!("Racer {}", i + 1),
                    value: *c as f64 / 2000.0,
                    count: *c,
                })
                .collect(),
            accepted,
        }
    }

    fn arb_record() -> impl Strategy<Value = LedgerRecord> {
        (
            any::<u32>(),
            0usize..500,
            prop::collection::vec(("[A-Za-z][A-Za-z0-9 ]{0,12}", 0i64..100_000), 2..8),
            any::<bool>(),
        )
            .prop_map(|(seq, plan_index, lanes, accepted)| LedgerRecord {
                seq: LedgerSeq(seq as u64),
                plan_index,
                lanes: lanes
                    .into_iter()
                    .map(|(name, count)| LaneSample {
                        name,
                        value: count as f64 / 2000.0,
                        count,
                    })
                    .collect(),
                accepted,
            })
    }

    // ─── Line format ───

    #[test]
    fn formats_documented_line() {
        let r = record(7, 3, &[8000, 8200, 0, 8100], true);
        assert_eq!(
            r.to_string(),
            "7,3,Racer 1,4,8000,Racer 2,4.1,8200,Racer 3,0,0,Racer 4,4.05,8100,ACCEPTED"
        );
    }

    #[test]
    fn parses_title_case_marker() {
        let r: LedgerRecord = "0,0,Ann,4.0215,8043,Bo,4.1,8200,Accepted".parse().unwrap();
        assert!(r.accepted);
        assert_eq!(r.lanes.len(), 2);
        assert_eq!(r.lanes[0].count, 8043);
        assert_eq!(r.counts(), vec![8043, 8200]);
    }

    #[test]
    fn parses_not_accepted_marker() {
        let r: LedgerRecord = "12,5,Ann,4,8000,empty 1,0,0,NA\n".parse().unwrap();
        assert!(!r.accepted);
        assert_eq!(r.seq, LedgerSeq(12));
        assert_eq!(r.plan_index, 5);
        assert_eq!(r.times(), vec![4.0, 0.0]);
    }

    #[test]
    fn rejects_malformed_lines() {
        for line in [
            "",
            "1,2,3",
            "x,0,Ann,4,8000,Bo,4,8000,NA",
            "0,-1,Ann,4,8000,Bo,4,8000,NA",
            "0,0,Ann,four,8000,Bo,4,8000,NA",
            "0,0,Ann,4,8000,Bo,4,8000,MAYBE",
            "0,0,Ann,4,8000,Bo,4,NA",
        ] {
            assert!(line.parse::<LedgerRecord>().is_err(), "accepted {:?}", line);
        }
    }

    // ─── File behaviour ───

    #[test]
    fn open_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("race_log.csv");

        assert!(!path.exists());
        let _ledger = LedgerFile::open(&path).unwrap();
        assert!(path.exists());
        assert!(!LedgerFile::has_records(&path).unwrap());
    }

    #[test]
    fn append_writes_one_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("race_log.csv");

        let mut ledger = LedgerFile::open(&path).unwrap();
        let receipt = ledger.append(&record(0, 0, &[8000, 8100], false)).unwrap();
        assert_eq!(receipt.seq(), LedgerSeq(0));

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "0,0,Racer 1,4,8000,Racer 2,4.05,8100,NA\n");
    }

    #[test]
    fn read_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let records = LedgerFile::read_records(dir.path().join("nope.csv")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn read_skips_blank_lines_and_reports_line_numbers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("race_log.csv");
        std::fs::write(
            &path,
            "0,0,A,4,8000,B,4,8000,NA\n\n1,0,A,4,8000,B,4,8000,ACCEPTED\n",
        )
        .unwrap();

        let records = LedgerFile::read_records(&path).unwrap();
        let lines: Vec<usize> = records.iter().map(|(n, _)| *n).collect();
        assert_eq!(lines, vec![1, 3]);
    }

    #[test]
    fn corrupt_line_is_fatal_with_its_line_number() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("race_log.csv");
        std::fs::write(
            &path,
            "0,0,A,4,8000,B,4,8000,NA\n1,0,A,4,80\n2,0,A,4,8000,B,4,8000,NA\n",
        )
        .unwrap();

        let err = LedgerFile::read_records(&path).unwrap_err();
        assert!(matches!(err, LedgerError::Malformed { line: 2, .. }));
    }

    #[test]
    fn reopening_appends_after_existing_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("race_log.csv");

        let mut ledger = LedgerFile::open(&path).unwrap();
        ledger.append(&record(0, 0, &[1, 2], false)).unwrap();
        drop(ledger);

        let mut ledger = LedgerFile::open(&path).unwrap();
        ledger.append(&record(1, 0, &[3, 4], true)).unwrap();

        let records = LedgerFile::read_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].1.seq, LedgerSeq(1));
    }

    #[test]
    fn disabled_ledger_writes_nothing() {
        let mut ledger = Ledger::Disabled;
        assert!(!ledger.is_enabled());
        let receipt = ledger.append(&record(4, 0, &[1, 2], true)).unwrap();
        assert_eq!(receipt.seq(), LedgerSeq(4));
    }

    // ─── Property tests ───

    proptest! {
        /// Written records read back identically and in order.
        #[test]
        fn written_records_read_back(records in prop::collection::vec(arb_record(), 1..20)) {
            let dir = tempdir().unwrap();
            let path = dir.path().join("race_log.csv");

            let mut ledger = LedgerFile::open(&path).unwrap();
            for r in &records {
                ledger.append(r).unwrap();
            }
            drop(ledger);

            let replayed: Vec<LedgerRecord> = LedgerFile::read_records(&path)
                .unwrap()
                .into_iter()
                .map(|(_, r)| r)
                .collect();
            prop_assert_eq!(replayed, records);
        }

        /// Appending only ever extends the file; earlier bytes never change.
        #[test]
        fn appends_preserve_existing_bytes(records in prop::collection::vec(arb_record(), 2..10)) {
            let dir = tempdir().unwrap();
            let path = dir.path().join("race_log.csv");

            let mut ledger = LedgerFile::open(&path).unwrap();
            let mut previous = Vec::new();
            for r in &records {
                ledger.append(r).unwrap();
                let current = std::fs::read(&path).unwrap();
                prop_assert!(current.starts_with(&previous));
                prop_assert!(current.len() > previous.len());
                previous = current;
            }
        }
    }
}
