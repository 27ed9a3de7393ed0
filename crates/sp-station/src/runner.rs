//! The `StationRunner` round loop.

use sp_core::{StationId, Timestep};
use sp_provider::VehicleEntry;
use tracing::{debug, info};

use crate::{
    ProviderClient, RoundContext, RoundStats, StationPolicy, StationResult, StatsWriter,
};

/// Totals for a finished run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub station:    StationId,
    pub rounds:     usize,
    pub max_ts:     Timestep,
    pub downloaded: usize,
    pub forwarded:  usize,
}

/// Drives one station through every timestep:
///
/// ```text
/// assigned = client.assigned_segments()
/// for ts in 1..:
///   coverage = client.coverage(ts)        (blocks on the barrier)
///   decision = policy.decide(...)
///   forward / replace buffer / report downloads / record stats
///   ts >= coverage.max_ts → client.complete(), stop
/// ```
///
/// Forwards are logged and counted only; peer delivery is not wired up.
pub struct StationRunner<C, P, W> {
    client: C,
    policy: P,
    stats:  W,
    buffer: Vec<VehicleEntry>,
}

impl<C: ProviderClient, P: StationPolicy, W: StatsWriter> StationRunner<C, P, W> {
    pub fn new(client: C, policy: P, stats: W) -> Self {
        Self { client, policy, stats, buffer: Vec::new() }
    }

    pub fn station(&self) -> &StationId {
        self.client.station()
    }

    pub fn buffer(&self) -> &[VehicleEntry] {
        &self.buffer
    }

    pub fn stats(&self) -> &W {
        &self.stats
    }

    /// Run every round, report completion, and flush the stats writer.
    pub fn run(&mut self) -> StationResult<RunSummary> {
        let station = self.client.station().clone();
        let assigned = self.client.assigned_segments()?;
        info!(%station, segments = assigned.len(), "fetched segment assignment");

        let mut summary = RunSummary {
            station:    station.clone(),
            rounds:     0,
            max_ts:     Timestep::ZERO,
            downloaded: 0,
            forwarded:  0,
        };
        let mut ts = Timestep::FIRST;

        loop {
            let coverage = self.client.coverage(ts)?;

            let decision = self.policy.decide(&RoundContext {
                station:  &station,
                ts,
                assigned: &assigned,
                coverage: &coverage.vehicles,
                buffer:   &self.buffer,
            })?;

            for fwd in &decision.to_forward {
                debug!(from = %station, to = %fwd.station, vehicle = %fwd.data.id, "forwarding vehicle data");
            }
            if !decision.downloaded.is_empty() {
                self.client.mark_downloaded(&decision.downloaded)?;
            }
            self.buffer = decision.buffer;

            let row = RoundStats {
                ts,
                bandwidth: decision.downloaded.len(),
                storage:   stored_segments(&self.buffer),
                forwarded: decision.to_forward.len(),
            };
            self.stats.record(&row)?;
            debug!(
                %station,
                timestep = ts.0,
                vehicles = coverage.vehicles.len(),
                bandwidth = row.bandwidth,
                storage = row.storage,
                "round finished"
            );

            summary.rounds += 1;
            summary.downloaded += row.bandwidth;
            summary.forwarded += row.forwarded;
            summary.max_ts = coverage.max_ts;

            if ts >= coverage.max_ts {
                break;
            }
            ts = ts.next();
        }

        self.client.complete()?;
        self.stats.finish()?;
        info!(
            %station,
            max_ts = summary.max_ts.0,
            downloaded = summary.downloaded,
            "completed final timestep"
        );
        Ok(summary)
    }
}

fn stored_segments(buffer: &[VehicleEntry]) -> usize {
    buffer
        .iter()
        .flat_map(|v| &v.hist)
        .filter(|h| h.downloaded)
        .count()
}
