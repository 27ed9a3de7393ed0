//! Per-round station statistics and their writers.
//!
//! [`CsvStatsWriter`] creates one file per station in the output directory:
//! `server_stats_{station}.csv`.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::Writer;
use sp_core::{StationId, Timestep};

use crate::StationResult;

/// One row of station output.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RoundStats {
    pub ts:        Timestep,
    /// Segments downloaded this round.
    pub bandwidth: usize,
    /// Downloaded-flagged history entries held in the buffer after the round.
    pub storage:   usize,
    pub forwarded: usize,
}

/// Sink for per-round statistics.
pub trait StatsWriter {
    fn record(&mut self, row: &RoundStats) -> StationResult<()>;

    /// Flush and close.  Idempotent.
    fn finish(&mut self) -> StationResult<()>;
}

/// Keeps rows in memory.
impl StatsWriter for Vec<RoundStats> {
    fn record(&mut self, row: &RoundStats) -> StationResult<()> {
        self.push(*row);
        Ok(())
    }

    fn finish(&mut self) -> StationResult<()> {
        Ok(())
    }
}

/// Writes one CSV row per round.
pub struct CsvStatsWriter {
    writer:   Writer<File>,
    path:     PathBuf,
    finished: bool,
}

impl CsvStatsWriter {
    /// Create `server_stats_{station}.csv` in `dir` and write the header row.
    pub fn new(dir: &Path, station: &StationId) -> StationResult<Self> {
        let path = dir.join(Self::file_name(station));
        let mut writer = Writer::from_path(&path)?;
        writer.write_record(["timestep", "bandwidth", "storage", "forwarded"])?;
        Ok(Self { writer, path, finished: false })
    }

    pub fn file_name(station: &StationId) -> String {
        format!("server_stats_{station}.csv")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatsWriter for CsvStatsWriter {
    fn record(&mut self, row: &RoundStats) -> StationResult<()> {
        self.writer.write_record(&[
            row.ts.0.to_string(),
            row.bandwidth.to_string(),
            row.storage.to_string(),
            row.forwarded.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> StationResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.writer.flush()?;
        Ok(())
    }
}
