//! The `StationPolicy` trait — the station's pluggable decision logic.

use rustc_hash::FxHashSet;
use sp_core::{SegmentId, StationId, Timestep};
use sp_provider::{DownloadedSegment, VehicleEntry};

use crate::StationResult;

/// Everything a policy sees for one round.
pub struct RoundContext<'a> {
    pub station:  &'a StationId,
    pub ts:       Timestep,
    /// Segments this station is nearest to.
    pub assigned: &'a [SegmentId],
    /// Nodes in range this round, with live downloaded flags.
    pub coverage: &'a [VehicleEntry],
    /// What the previous round decided to keep.
    pub buffer:   &'a [VehicleEntry],
}

/// Vehicle data to push to a peer station.
#[derive(Clone, Debug, PartialEq)]
pub struct Forward {
    pub station: StationId,
    pub data:    VehicleEntry,
}

/// A policy's output for one round.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Decision {
    pub to_forward: Vec<Forward>,
    /// Replaces the station's buffer.
    pub buffer:     Vec<VehicleEntry>,
    /// Reported to the provider's download ledger.
    pub downloaded: Vec<DownloadedSegment>,
}

/// Pluggable per-round decision logic.
///
/// Called once per round, sequentially, on the station's own thread.
///
/// # Example
///
/// ```rust,ignore
/// struct KeepEverything;
///
/// impl StationPolicy for KeepEverything {
///     fn decide(&mut self, ctx: &RoundContext<'_>) -> StationResult<Decision> {
///         let mut buffer = ctx.buffer.to_vec();
///         buffer.extend_from_slice(ctx.coverage);
///         Ok(Decision { buffer, ..Decision::default() })
///     }
/// }
/// ```
pub trait StationPolicy: Send {
    fn decide(&mut self, ctx: &RoundContext<'_>) -> StationResult<Decision>;
}

/// Downloads nothing and keeps the buffer as it is.
pub struct NoopPolicy;

impl StationPolicy for NoopPolicy {
    fn decide(&mut self, ctx: &RoundContext<'_>) -> StationResult<Decision> {
        Ok(Decision { buffer: ctx.buffer.to_vec(), ..Decision::default() })
    }
}

/// Downloads every segment this station owns that a node in range carries
/// and nobody has downloaded yet, and buffers the carrying nodes with those
/// entries flagged.
#[derive(Default)]
pub struct DownloadAssigned;

impl StationPolicy for DownloadAssigned {
    fn decide(&mut self, ctx: &RoundContext<'_>) -> StationResult<Decision> {
        let owned: FxHashSet<&SegmentId> = ctx.assigned.iter().collect();
        let mut decision = Decision { buffer: ctx.buffer.to_vec(), ..Decision::default() };

        for vehicle in ctx.coverage {
            let mut carried = vehicle.clone();
            let mut fetched = false;
            for entry in carried.hist.iter_mut() {
                if !entry.downloaded && owned.contains(&entry.id) {
                    entry.downloaded = true;
                    fetched = true;
                    decision
                        .downloaded
                        .push(DownloadedSegment::new(vehicle.id.clone(), entry.id.clone()));
                }
            }
            if fetched {
                decision.buffer.push(carried);
            }
        }
        Ok(decision)
    }
}
