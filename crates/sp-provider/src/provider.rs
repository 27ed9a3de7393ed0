//! The `Provider` struct and its query path.

use sp_core::{NodeId, SegmentId, StationId, Timestep};
use sp_sync::{
    BarrierPhase, CancelToken, CompletionReport, CompletionTracker, DownloadedSegmentsTracker,
    TimestepBarrier,
};
use sp_trace::TraceSet;
use tracing::{debug, warn};

use crate::wire::{
    DownloadedSegment, HistoryEntry, ProviderPhase, ProviderStatus, VehicleCoverage, VehicleEntry,
};
use crate::{ProviderError, ProviderObserver, ProviderResult};

/// The segment provider: immutable trace indices plus the three pieces of
/// shared run state (barrier, download ledger, completion count).
///
/// Every method takes `&self`; share one instance behind an `Arc` across all
/// request threads.  Create via [`ProviderBuilder`][crate::ProviderBuilder].
pub struct Provider {
    pub(crate) traces:     TraceSet,
    pub(crate) barrier:    TimestepBarrier,
    pub(crate) downloads:  DownloadedSegmentsTracker,
    pub(crate) completion: CompletionTracker,
    pub(crate) observer:   Box<dyn ProviderObserver>,
}

impl Provider {
    // ── Coverage ──────────────────────────────────────────────────────────

    /// Nodes in range of `station` at `ts`, each with its segment history.
    ///
    /// Returns immediately when `ts` is at or before the shared timestep.
    /// Otherwise the station is counted as arrived at the barrier and the
    /// call blocks until the shared timestep reaches `ts`.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::OutOfRange`] if `ts` is past the last timestep.
    /// - [`ProviderError::UnknownStation`] if `station` is not in the
    ///   contact trace.  Checked before the barrier, so a typo never counts
    ///   as an arrival.
    /// - [`ProviderError::Cancelled`] / [`ProviderError::Closed`] from the
    ///   blocking wait.
    pub fn request_coverage(
        &self,
        ts:      Timestep,
        station: &StationId,
        token:   &CancelToken,
    ) -> ProviderResult<VehicleCoverage> {
        let max_ts = self.traces.max_ts;
        if ts > max_ts {
            return Err(ProviderError::OutOfRange { ts, max_ts });
        }
        if !self.traces.coverage.contains_station(station) {
            return Err(ProviderError::UnknownStation(station.clone()));
        }

        loop {
            if ts <= self.barrier.current_ts() {
                return Ok(self.coverage_at(station, ts));
            }
            let outcome = self.barrier.wait_for(station, ts, token)?;
            for opened in outcome.opened {
                self.observer.on_timestep_advanced(opened);
            }
        }
    }

    /// Build the response from the static indices.  Never blocks on the
    /// barrier.
    fn coverage_at(&self, station: &StationId, ts: Timestep) -> VehicleCoverage {
        let contacts = self.traces.coverage.contacts(station, ts).unwrap_or(&[]);
        let downloads = self.downloads.view();

        let vehicles = contacts
            .iter()
            .map(|contact| VehicleEntry {
                id:   contact.node.clone(),
                dist: contact.distance,
                hist: self
                    .traces
                    .history
                    .visits(&contact.node, ts)
                    .iter()
                    .map(|visit| HistoryEntry {
                        elapsed:    visit.age,
                        id:         visit.segment.clone(),
                        downloaded: downloads.is_downloaded(&contact.node, &visit.segment),
                    })
                    .collect(),
            })
            .collect();

        VehicleCoverage { vehicles, max_ts: self.traces.max_ts }
    }

    // ── Assignment ────────────────────────────────────────────────────────

    /// Segments `station` is nearest to.  Empty (with a warning) when the
    /// station owns nothing or is unknown.
    pub fn assigned_segments(&self, station: &StationId) -> &[SegmentId] {
        match self.traces.assignment.assigned(station) {
            Some(segments) => segments,
            None => {
                warn!(%station, "no segments assigned to station");
                &[]
            }
        }
    }

    // ── Download ledger ───────────────────────────────────────────────────

    /// Record downloads reported by a station.  Returns how many were new.
    pub fn mark_downloaded<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = DownloadedSegment>,
    {
        let added = self
            .downloads
            .mark_downloaded(entries.into_iter().map(|d| (d.vehicle_id, d.segment_id)));
        debug!(added, total = self.downloads.len(), "segments marked downloaded");
        added
    }

    pub fn is_downloaded(&self, node: &NodeId, segment: &SegmentId) -> bool {
        self.downloads.is_downloaded(node, segment)
    }

    // ── Completion ────────────────────────────────────────────────────────

    /// Count one completion.  `station`, when given, must be known and is
    /// counted at most once.
    pub fn report_complete(&self, station: Option<&StationId>) -> ProviderResult<CompletionReport> {
        if let Some(s) = station {
            if !self.traces.coverage.contains_station(s) {
                return Err(ProviderError::UnknownStation(s.clone()));
            }
        }
        let report = self.completion.report(station);
        if report.newly_complete {
            self.observer.on_simulation_complete();
        }
        Ok(report)
    }

    pub fn is_complete(&self) -> bool {
        self.completion.is_complete()
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Abandon the blocking request that owns `token`.
    pub fn cancel(&self, token: &CancelToken) {
        self.barrier.cancel(token);
    }

    /// Release every parked request with [`ProviderError::Closed`].
    /// Non-blocking lookups keep working.
    pub fn shutdown(&self) {
        self.barrier.close();
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn status(&self) -> ProviderStatus {
        let snap = self.barrier.snapshot();
        let phase = if self.completion.is_complete() {
            ProviderPhase::Complete
        } else if snap.closed {
            ProviderPhase::Closed
        } else {
            match snap.phase {
                BarrierPhase::Idle => ProviderPhase::Idle,
                BarrierPhase::Blocked => ProviderPhase::Blocked,
            }
        };
        ProviderStatus {
            current_ts:     snap.current_ts,
            max_ts:         self.traces.max_ts,
            total_stations: snap.total_stations,
            waiting:        snap.waiting,
            completed:      self.completion.completed(),
            phase,
        }
    }

    pub fn current_ts(&self) -> Timestep {
        self.barrier.current_ts()
    }

    pub fn max_ts(&self) -> Timestep {
        self.traces.max_ts
    }

    /// Stations the barrier waits for each round.
    pub fn total_stations(&self) -> usize {
        self.barrier.total_stations()
    }

    pub fn traces(&self) -> &TraceSet {
        &self.traces
    }
}
