//! `CoverageIndex` — which nodes each station could reach at each timestep.

use rustc_hash::FxHashMap;
use sp_core::{NodeId, StationId, Timestep};

use crate::format::{TowerTrace, table_index};
use crate::{LoadError, LoadResult, TraceKind};

/// One node in range of a station.
#[derive(Clone, Debug, PartialEq)]
pub struct Contact {
    pub node:     NodeId,
    pub distance: f64,
}

/// (station, timestep) → contacts, in trace order.
///
/// Also fixes the set of known stations: a station id is "known" exactly when
/// it appears in the contact trace, even if it never had a node in range.
#[derive(Debug, Default)]
pub struct CoverageIndex {
    /// Distinct station ids in first-seen trace order.
    stations:   Vec<StationId>,
    by_station: FxHashMap<StationId, FxHashMap<Timestep, Vec<Contact>>>,
    max_ts:     Option<Timestep>,
}

impl CoverageIndex {
    /// Build the index from a parsed contact trace, resolving every node
    /// index against the trace's `vehicle_ids` table.
    pub fn build(trace: &TowerTrace) -> LoadResult<Self> {
        let mut index = Self::default();
        let node_ids: Vec<NodeId> = trace.vehicle_ids.iter().map(|v| NodeId::new(v.as_str())).collect();

        for tower in &trace.towers {
            if tower.tower_id.trim().is_empty() {
                return Err(LoadError::malformed(TraceKind::Tower, "empty tower_id"));
            }
            let station = StationId::new(tower.tower_id.as_str());
            if !index.by_station.contains_key(&station) {
                index.stations.push(station.clone());
            }
            let timesteps = index.by_station.entry(station).or_default();

            for sample in &tower.vehicles {
                let ts = Timestep::from_trace_value(sample.ts).ok_or_else(|| {
                    LoadError::malformed(
                        TraceKind::Tower,
                        format!("tower {}: invalid timestep {}", tower.tower_id, sample.ts),
                    )
                })?;
                index.max_ts = index.max_ts.max(Some(ts));

                let contacts = timesteps.entry(ts).or_default();
                contacts.reserve(sample.v.len());
                for &[raw_node, distance] in &sample.v {
                    let i = table_index(raw_node, node_ids.len()).ok_or_else(|| {
                        LoadError::malformed(
                            TraceKind::Tower,
                            format!(
                                "tower {} at {ts}: vehicle index {raw_node} outside vehicle_ids (len {})",
                                tower.tower_id,
                                node_ids.len(),
                            ),
                        )
                    })?;
                    contacts.push(Contact { node: node_ids[i].clone(), distance });
                }
            }
        }

        Ok(index)
    }

    pub fn contains_station(&self, station: &StationId) -> bool {
        self.by_station.contains_key(station)
    }

    /// Contacts of `station` at `ts`, or `None` if the station is unknown or
    /// had no record at that timestep.
    pub fn contacts(&self, station: &StationId, ts: Timestep) -> Option<&[Contact]> {
        self.by_station
            .get(station)?
            .get(&ts)
            .map(Vec::as_slice)
    }

    /// Known station ids, in first-seen trace order.
    pub fn stations(&self) -> &[StationId] {
        &self.stations
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    /// Largest timestep in the contact trace, if it had any samples.
    pub fn max_ts(&self) -> Option<Timestep> {
        self.max_ts
    }
}
