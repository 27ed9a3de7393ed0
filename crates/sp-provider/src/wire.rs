//! JSON shapes exchanged with stations.
//!
//! Field names are the ones station processes already parse, so they are
//! kept short (`dist`, `hist`) rather than descriptive.

use serde::{Deserialize, Serialize};
use sp_core::{NodeId, SegmentId, Timestep};

/// Response body of `GET /tower/{station}/{ts}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleCoverage {
    pub vehicles: Vec<VehicleEntry>,
    pub max_ts:   Timestep,
}

/// One node in range of the requesting station.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleEntry {
    pub id:   NodeId,
    pub dist: f64,
    pub hist: Vec<HistoryEntry>,
}

/// One segment in a node's history, with its live downloaded flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Timesteps since the node passed the segment.
    pub elapsed:    u64,
    pub id:         SegmentId,
    pub downloaded: bool,
}

/// Element of the `POST /downloaded` body.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DownloadedSegment {
    pub vehicle_id: NodeId,
    pub segment_id: SegmentId,
}

impl DownloadedSegment {
    pub fn new(vehicle_id: NodeId, segment_id: SegmentId) -> Self {
        Self { vehicle_id, segment_id }
    }
}

/// Coarse provider state reported by `GET /status`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderPhase {
    /// No station is parked in the barrier.
    Idle,
    /// At least one station is waiting for the next timestep.
    Blocked,
    /// Every station has reported completion.
    Complete,
    /// The barrier was closed; blocking requests are rejected.
    Closed,
}

/// Response body of `GET /status`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub current_ts:     Timestep,
    pub max_ts:         Timestep,
    pub total_stations: usize,
    pub waiting:        usize,
    pub completed:      usize,
    pub phase:          ProviderPhase,
}
