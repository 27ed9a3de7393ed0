//! JSON shapes of the mobility-simulation output consumed by the provider.
//!
//! # Contact trace (`tower`)
//!
//! ```json
//! { "vehicle_ids": ["veh0", "veh1"],
//!   "towers": [ { "tower_id": "tower_0",
//!                 "vehicles": [ { "ts": 1, "v": [[0, 12.5], [1, 40.0]] } ] } ] }
//! ```
//!
//! Each `v` pair is `[index into vehicle_ids, distance to the tower]`.
//!
//! # History trace (`vehicle`)
//!
//! ```json
//! { "segments": ["s0", "s1"],
//!   "vehicles": [ { "vehicle_id": "veh0",
//!                   "segments": [ { "ts": 1, "s": [[0, 0], [1, 3]] } ] } ] }
//! ```
//!
//! Each `s` pair is `[index into segments, timesteps since the visit]`.
//!
//! # Distance trace (`segment`)
//!
//! ```json
//! { "segments": ["s0", "s1"],
//!   "towers": [ { "tower_id": "tower_0", "distances": [10.0, null] } ] }
//! ```
//!
//! One `distances` entry per segment column; `null` means the station cannot
//! reach that segment.
//!
//! Timesteps, indices and ages are JSON numbers and may be written as floats
//! (`1.0`); they must still hold non-negative integral values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which of the three input traces a value came from.  Used in error messages.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraceKind {
    Tower,
    Vehicle,
    Segment,
}

impl fmt::Display for TraceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TraceKind::Tower   => "tower",
            TraceKind::Vehicle => "vehicle",
            TraceKind::Segment => "segment",
        })
    }
}

// ── Contact trace ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TowerTrace {
    pub vehicle_ids: Vec<String>,
    pub towers:      Vec<TowerContacts>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TowerContacts {
    pub tower_id: String,
    #[serde(default)]
    pub vehicles: Vec<ContactSample>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContactSample {
    pub ts: f64,
    /// `[node index, distance]` pairs.
    #[serde(default)]
    pub v:  Vec<[f64; 2]>,
}

// ── History trace ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VehicleTrace {
    pub segments: Vec<String>,
    pub vehicles: Vec<VehicleVisits>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VehicleVisits {
    pub vehicle_id: String,
    #[serde(default)]
    pub segments:   Vec<VisitSample>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VisitSample {
    pub ts: f64,
    /// `[segment index, age in timesteps]` pairs.
    #[serde(default)]
    pub s:  Vec<[f64; 2]>,
}

// ── Distance trace ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SegmentTrace {
    pub segments: Vec<String>,
    pub towers:   Vec<TowerDistances>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TowerDistances {
    pub tower_id:  String,
    pub distances: Vec<Option<f64>>,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Interpret a JSON number as a non-negative integer (index or age).
pub(crate) fn integral(v: f64) -> Option<u64> {
    sp_core::Timestep::from_trace_value(v).map(|t| t.0)
}

/// Resolve `raw` as an index into a table of length `len`.
pub(crate) fn table_index(raw: f64, len: usize) -> Option<usize> {
    integral(raw)
        .and_then(|i| usize::try_from(i).ok())
        .filter(|&i| i < len)
}
