//! JSON trace loader.
//!
//! Reads the three trace files produced by the mobility simulation and
//! builds the full [`TraceSet`] in one pass.  See [`crate::format`] for the
//! file shapes.
//!
//! # Large files
//!
//! Each file is deserialized into its raw shape before indexing, so peak
//! memory is roughly twice the size of the indices.  The traces for a
//! city-scale run are tens of megabytes; this is not a concern at startup.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::de::DeserializeOwned;
use sp_core::{ProviderConfig, StationId, Timestep};
use tracing::{info, warn};

use crate::format::{SegmentTrace, TowerTrace, VehicleTrace};
use crate::{
    CoverageIndex, LoadError, LoadResult, SegmentAssignmentIndex, TraceKind, VehicleHistoryIndex,
};

// ── TraceSet ──────────────────────────────────────────────────────────────────

/// Every index the provider needs, built once and read-only afterwards.
#[derive(Debug, Default)]
pub struct TraceSet {
    pub coverage:   CoverageIndex,
    pub history:    VehicleHistoryIndex,
    pub assignment: SegmentAssignmentIndex,
    /// Last servable timestep: the largest ts in the contact or history trace.
    pub max_ts:     Timestep,
}

impl TraceSet {
    /// Number of distinct stations in the contact trace.
    pub fn station_count(&self) -> usize {
        self.coverage.station_count()
    }

    /// Stations that own segments in the distance trace but never appear in
    /// the contact trace.  They cannot request coverage, so nothing they own
    /// is ever downloaded.
    pub fn owners_without_coverage(&self) -> Vec<&StationId> {
        let mut orphans: Vec<&StationId> = self
            .assignment
            .iter()
            .filter(|(station, owned)| !owned.is_empty() && !self.coverage.contains_station(station))
            .map(|(station, _)| station)
            .collect();
        orphans.sort();
        orphans
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load all three traces named by `config`.
pub fn load_traces(config: &ProviderConfig) -> LoadResult<TraceSet> {
    config.validate()?;
    load_trace_files(&config.tower_trace, &config.vehicle_trace, &config.segment_trace)
}

/// Load the three traces from explicit paths.
pub fn load_trace_files(tower: &Path, vehicle: &Path, segment: &Path) -> LoadResult<TraceSet> {
    load_traces_reader(open(tower)?, open(vehicle)?, open(segment)?)
}

/// Like [`load_trace_files`] but accepts any `Read` sources.
///
/// Useful for testing (pass a `std::io::Cursor`) or for traces that arrive
/// over the network.
pub fn load_traces_reader<T: Read, V: Read, S: Read>(
    tower:   T,
    vehicle: V,
    segment: S,
) -> LoadResult<TraceSet> {
    let tower: TowerTrace = parse(tower, TraceKind::Tower)?;
    let vehicle: VehicleTrace = parse(vehicle, TraceKind::Vehicle)?;
    let segment: SegmentTrace = parse(segment, TraceKind::Segment)?;
    build_trace_set(&tower, &vehicle, &segment)
}

/// Build the indices from already-parsed traces.
pub fn build_trace_set(
    tower:   &TowerTrace,
    vehicle: &VehicleTrace,
    segment: &SegmentTrace,
) -> LoadResult<TraceSet> {
    let coverage = CoverageIndex::build(tower)?;
    let history = VehicleHistoryIndex::build(vehicle)?;
    let assignment = SegmentAssignmentIndex::build(segment)?;

    let max_ts = coverage
        .max_ts()
        .max(history.max_ts())
        .unwrap_or(Timestep::ZERO);

    info!(
        stations = coverage.station_count(),
        nodes = history.node_count(),
        segments = assignment.segment_count(),
        max_ts = max_ts.0,
        "loaded simulation traces"
    );

    let traces = TraceSet { coverage, history, assignment, max_ts };
    for station in traces.owners_without_coverage() {
        warn!(
            %station,
            owned = traces.assignment.assigned(station).map_or(0, <[_]>::len),
            "station owns segments but has no contact trace"
        );
    }
    Ok(traces)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn open(path: &Path) -> LoadResult<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| LoadError::Io { path: path.to_path_buf(), source })
}

fn parse<T: DeserializeOwned, R: Read>(reader: R, trace: TraceKind) -> LoadResult<T> {
    serde_json::from_reader(reader).map_err(|source| LoadError::Json { trace, source })
}
