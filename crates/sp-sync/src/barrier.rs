//! `TimestepBarrier` — a cyclic barrier gating the shared timestep.
//!
//! # Protocol
//!
//! ```text
//! wait_for(station, target):
//!   lock
//!   loop:
//!     current >= target        → return
//!     closed / cancelled       → retract arrival, return error
//!     station not yet arrived  → record arrival
//!       arrivals == total      → clear arrivals, current += 1,
//!                                unlock, notify_all, relock, continue
//!     park on condvar (releases lock), re-check on every wakeup
//! ```
//!
//! The arrival set is cleared exactly once per opening, so the barrier can be
//! reused for an unbounded number of rounds.  A waiter woken by an opening
//! that did not reach its target is still "done" with the round that just
//! opened, so it arrives again for the next one.
//!
//! `current_ts` is mirrored in an atomic so the provider's fast path can read
//! it without taking the lock.  A stale read is harmless: the caller falls
//! into `wait_for`, which re-checks under the lock before counting anything.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashSet;
use sp_core::{StationId, Timestep};
use tracing::{debug, info};

use crate::{SyncError, SyncResult};

// ── CancelToken ───────────────────────────────────────────────────────────────

/// Handle that lets a blocked [`TimestepBarrier::wait_for`] be abandoned.
///
/// Clone it before handing it to the waiting thread; cancel through
/// [`TimestepBarrier::cancel`] so the waiter is woken.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ── Snapshot types ────────────────────────────────────────────────────────────

/// Whether any station is currently parked in the barrier.
///
/// Opening happens entirely inside the lock, so it is never observable here.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BarrierPhase {
    Idle,
    Blocked,
}

/// A consistent view of the barrier counters, taken under its lock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BarrierSnapshot {
    pub current_ts:     Timestep,
    pub waiting:        usize,
    pub total_stations: usize,
    pub phase:          BarrierPhase,
    pub closed:         bool,
}

/// Result of a successful [`TimestepBarrier::wait_for`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WaitOutcome {
    /// The shared timestep when the wait finished (`>= target`).
    pub current_ts: Timestep,
    /// Timesteps this caller opened, in order.  Empty unless it was the last
    /// arrival of at least one round.
    pub opened:     Vec<Timestep>,
}

// ── TimestepBarrier ───────────────────────────────────────────────────────────

struct BarrierState {
    current_ts: Timestep,
    /// Stations that have asked past `current_ts` in this round.
    arrived:    FxHashSet<StationId>,
    closed:     bool,
}

/// Counting barrier over a fixed number of stations.
///
/// `current_ts` only advances, by exactly one, when the `total`-th distinct
/// station arrives.
pub struct TimestepBarrier {
    state:    Mutex<BarrierState>,
    released: Condvar,
    current:  AtomicU64,
    total:    usize,
}

impl TimestepBarrier {
    /// A barrier for `total` stations with the shared timestep at `start`.
    pub fn new(total: usize, start: Timestep) -> SyncResult<Self> {
        if total == 0 {
            return Err(SyncError::EmptyFleet);
        }
        Ok(Self {
            state: Mutex::new(BarrierState {
                current_ts: start,
                arrived:    FxHashSet::default(),
                closed:     false,
            }),
            released: Condvar::new(),
            current:  AtomicU64::new(start.0),
            total,
        })
    }

    /// The shared timestep, read without locking.
    #[inline]
    pub fn current_ts(&self) -> Timestep {
        Timestep(self.current.load(Ordering::Acquire))
    }

    pub fn total_stations(&self) -> usize {
        self.total
    }

    /// Block until the shared timestep reaches `target`, counting `station`
    /// as arrived for every round that has to open on the way.
    ///
    /// Returns immediately if the timestep is already at or past `target`.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Cancelled`] after [`cancel`][Self::cancel] is called
    ///   with `token`.  The station's arrival in the still-open round is
    ///   retracted.
    /// - [`SyncError::Closed`] once [`close`][Self::close] has been called.
    pub fn wait_for(
        &self,
        station: &StationId,
        target:  Timestep,
        token:   &CancelToken,
    ) -> SyncResult<WaitOutcome> {
        let mut opened = Vec::new();
        let mut state = self.lock();

        loop {
            if state.current_ts >= target {
                return Ok(WaitOutcome { current_ts: state.current_ts, opened });
            }
            if state.closed {
                return Err(SyncError::Closed);
            }
            if token.is_cancelled() {
                if state.arrived.remove(station) {
                    debug!(%station, waiting = state.arrived.len(), "arrival retracted");
                    // Another request from the same station may be parked on
                    // this arrival; let it re-arrive.
                    self.released.notify_all();
                }
                return Err(SyncError::Cancelled);
            }

            if !state.arrived.contains(station) {
                state.arrived.insert(station.clone());

                if state.arrived.len() == self.total {
                    let next = state.current_ts.next();
                    state.arrived.clear();
                    state.current_ts = next;
                    self.current.store(next.0, Ordering::Release);
                    info!(timestep = next.0, stations = self.total, "timestep advanced");

                    drop(state);
                    self.released.notify_all();
                    opened.push(next);
                    state = self.lock();
                    continue;
                }

                debug!(
                    %station,
                    target = target.0,
                    waiting = state.arrived.len(),
                    total = self.total,
                    "station waiting for barrier"
                );
            }

            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Cancel `token` and wake its waiter.
    pub fn cancel(&self, token: &CancelToken) {
        // Set under the lock so a waiter cannot check the flag and then park
        // after the notification has already been sent.
        let _state = self.lock();
        token.0.store(true, Ordering::Release);
        self.released.notify_all();
    }

    /// Release every waiter with [`SyncError::Closed`] and reject later
    /// waits that would block.  Idempotent.
    pub fn close(&self) {
        let mut state = self.lock();
        if !state.closed {
            state.closed = true;
            info!(waiting = state.arrived.len(), "timestep barrier closed");
        }
        drop(state);
        self.released.notify_all();
    }

    /// A consistent copy of the counters.
    pub fn snapshot(&self) -> BarrierSnapshot {
        let state = self.lock();
        let waiting = state.arrived.len();
        BarrierSnapshot {
            current_ts:     state.current_ts,
            waiting,
            total_stations: self.total,
            phase:          if waiting == 0 { BarrierPhase::Idle } else { BarrierPhase::Blocked },
            closed:         state.closed,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
