//! `SegmentAssignmentIndex` — nearest-station ownership of every segment.
//!
//! # Algorithm
//!
//! The distance trace is a matrix: one row per station, one column per
//! segment.  For each column the owner is the row with the smallest finite
//! distance.  The running best starts at `f64::INFINITY` and is only replaced
//! by a strictly smaller value, so on ties the station that appears first in
//! the trace wins.  Columns are independent, which is what makes the
//! `parallel` feature safe: the result does not depend on scan order across
//! columns.
//!
//! A column with no finite distance (every row `null`) has no owner; it is
//! recorded in [`unassigned`][SegmentAssignmentIndex::unassigned].

use rustc_hash::FxHashMap;
use sp_core::{SegmentId, StationId};
use tracing::warn;

use crate::format::{SegmentTrace, TowerDistances};
use crate::{LoadError, LoadResult, TraceKind};

/// station → owned segments, in segment-column order.
#[derive(Debug, Default)]
pub struct SegmentAssignmentIndex {
    by_station: FxHashMap<StationId, Vec<SegmentId>>,
    unassigned: Vec<SegmentId>,
    segment_count: usize,
}

impl SegmentAssignmentIndex {
    /// Partition every segment column of `trace` to its nearest station.
    pub fn build(trace: &SegmentTrace) -> LoadResult<Self> {
        let width = trace.segments.len();
        for row in &trace.towers {
            if row.tower_id.trim().is_empty() {
                return Err(LoadError::malformed(TraceKind::Segment, "empty tower_id"));
            }
            if row.distances.len() != width {
                return Err(LoadError::malformed(
                    TraceKind::Segment,
                    format!(
                        "tower {} has {} distances, expected one per segment ({width})",
                        row.tower_id,
                        row.distances.len(),
                    ),
                ));
            }
        }

        let owners = nearest_owners(&trace.towers, width);

        let mut index = Self { segment_count: width, ..Self::default() };
        for (column, owner) in owners.into_iter().enumerate() {
            let segment = SegmentId::new(trace.segments[column].as_str());
            match owner {
                Some(row) => index
                    .by_station
                    .entry(StationId::new(trace.towers[row].tower_id.as_str()))
                    .or_default()
                    .push(segment),
                None => index.unassigned.push(segment),
            }
        }

        if !index.unassigned.is_empty() {
            warn!(
                count = index.unassigned.len(),
                "segments with no reachable station were left unassigned"
            );
        }
        Ok(index)
    }

    /// Segments owned by `station`, or `None` if it owns none.
    pub fn assigned(&self, station: &StationId) -> Option<&[SegmentId]> {
        self.by_station.get(station).map(Vec::as_slice)
    }

    /// Iterate over every (station, owned segments) pair in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&StationId, &[SegmentId])> {
        self.by_station.iter().map(|(s, v)| (s, v.as_slice()))
    }

    /// Segments that no station could reach.
    pub fn unassigned(&self) -> &[SegmentId] {
        &self.unassigned
    }

    /// Number of segment columns in the distance trace.
    pub fn segment_count(&self) -> usize {
        self.segment_count
    }
}

// ── Nearest-station scan ──────────────────────────────────────────────────────

/// Row index of the nearest station for `column`, first-seen on ties.
fn nearest_row(rows: &[TowerDistances], column: usize) -> Option<usize> {
    let mut best_distance = f64::INFINITY;
    let mut best_row = None;
    for (row, station) in rows.iter().enumerate() {
        if let Some(d) = station.distances[column] {
            if d < best_distance {
                best_distance = d;
                best_row = Some(row);
            }
        }
    }
    best_row
}

#[cfg(not(feature = "parallel"))]
fn nearest_owners(rows: &[TowerDistances], width: usize) -> Vec<Option<usize>> {
    (0..width).map(|column| nearest_row(rows, column)).collect()
}

#[cfg(feature = "parallel")]
fn nearest_owners(rows: &[TowerDistances], width: usize) -> Vec<Option<usize>> {
    use rayon::prelude::*;

    (0..width)
        .into_par_iter()
        .map(|column| nearest_row(rows, column))
        .collect()
}
