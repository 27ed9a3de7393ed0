//! `VehicleHistoryIndex` — the segments each node has passed, as of each timestep.
//!
//! The history window is whatever the trace encodes: a record at `(node, ts)`
//! already lists earlier visits with their ages, so nothing is recomputed
//! here.  The per-visit "downloaded" flag is not part of the record; the
//! provider resolves it at query time.

use rustc_hash::FxHashMap;
use sp_core::{NodeId, SegmentId, Timestep};

use crate::format::{VehicleTrace, integral, table_index};
use crate::{LoadError, LoadResult, TraceKind};

/// A segment a node passed through, `age` timesteps before the record's ts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Visit {
    pub segment: SegmentId,
    pub age:     u64,
}

/// (node, timestep) → visits, in trace order.
#[derive(Debug, Default)]
pub struct VehicleHistoryIndex {
    by_node:  FxHashMap<NodeId, FxHashMap<Timestep, Vec<Visit>>>,
    segments: Vec<SegmentId>,
    max_ts:   Option<Timestep>,
}

impl VehicleHistoryIndex {
    /// Build the index from a parsed history trace, resolving every segment
    /// index against the trace's `segments` table.
    pub fn build(trace: &VehicleTrace) -> LoadResult<Self> {
        let segments: Vec<SegmentId> = trace.segments.iter().map(|s| SegmentId::new(s.as_str())).collect();
        let mut by_node: FxHashMap<NodeId, FxHashMap<Timestep, Vec<Visit>>> = FxHashMap::default();
        let mut max_ts = None;

        for vehicle in &trace.vehicles {
            let node = NodeId::new(vehicle.vehicle_id.as_str());
            let timesteps = by_node.entry(node).or_default();

            for sample in &vehicle.segments {
                let ts = Timestep::from_trace_value(sample.ts).ok_or_else(|| {
                    LoadError::malformed(
                        TraceKind::Vehicle,
                        format!("vehicle {}: invalid timestep {}", vehicle.vehicle_id, sample.ts),
                    )
                })?;
                max_ts = max_ts.max(Some(ts));

                let visits = timesteps.entry(ts).or_default();
                visits.reserve(sample.s.len());
                for &[raw_segment, raw_age] in &sample.s {
                    let i = table_index(raw_segment, segments.len()).ok_or_else(|| {
                        LoadError::malformed(
                            TraceKind::Vehicle,
                            format!(
                                "vehicle {} at {ts}: segment index {raw_segment} outside segments (len {})",
                                vehicle.vehicle_id,
                                segments.len(),
                            ),
                        )
                    })?;
                    let age = integral(raw_age).ok_or_else(|| {
                        LoadError::malformed(
                            TraceKind::Vehicle,
                            format!("vehicle {} at {ts}: invalid age {raw_age}", vehicle.vehicle_id),
                        )
                    })?;
                    visits.push(Visit { segment: segments[i].clone(), age });
                }
            }
        }

        Ok(Self { by_node, segments, max_ts })
    }

    /// Visits recorded for `node` at `ts`; empty if there is no record.
    pub fn visits(&self, node: &NodeId, ts: Timestep) -> &[Visit] {
        self.by_node
            .get(node)
            .and_then(|t| t.get(&ts))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct nodes with at least one history entry.
    pub fn node_count(&self) -> usize {
        self.by_node.len()
    }

    /// The segment table, in trace order.
    pub fn segments(&self) -> &[SegmentId] {
        &self.segments
    }

    /// Largest timestep in the history trace, if it had any samples.
    pub fn max_ts(&self) -> Option<Timestep> {
        self.max_ts
    }
}
