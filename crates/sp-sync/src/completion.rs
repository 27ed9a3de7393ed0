//! `CompletionTracker` — counts stations that have consumed their last timestep.

use std::sync::{Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashSet;
use sp_core::StationId;
use tracing::info;

/// What a single [`CompletionTracker::report`] call did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CompletionReport {
    pub completed:      usize,
    pub total:          usize,
    /// The station had already reported; nothing was counted.
    pub duplicate:      bool,
    /// This report is the one that completed the simulation.
    pub newly_complete: bool,
}

#[derive(Default)]
struct CompletionState {
    named:     FxHashSet<StationId>,
    anonymous: usize,
    complete:  bool,
}

impl CompletionState {
    fn completed(&self) -> usize {
        self.named.len() + self.anonymous
    }
}

/// Completion counter over a fixed fleet size.
///
/// Named reports are deduplicated per station; anonymous reports cannot be
/// and each one counts.  Once the count reaches `total` the tracker stays
/// complete.
pub struct CompletionTracker {
    total: usize,
    state: Mutex<CompletionState>,
}

impl CompletionTracker {
    pub fn new(total: usize) -> Self {
        Self { total, state: Mutex::new(CompletionState::default()) }
    }

    /// Register one completion, optionally attributed to `station`.
    pub fn report(&self, station: Option<&StationId>) -> CompletionReport {
        let mut state = self.lock();

        let duplicate = match station {
            Some(s) => !state.named.insert(s.clone()),
            None => {
                state.anonymous += 1;
                false
            }
        };

        let completed = state.completed();
        let newly_complete = !state.complete && completed >= self.total;
        if newly_complete {
            state.complete = true;
        }
        drop(state);

        if duplicate {
            info!(station = ?station.map(StationId::as_str), "duplicate completion ignored");
        } else {
            info!(completed, total = self.total, "station reported completion");
        }
        if newly_complete {
            info!(stations = self.total, "all stations complete, simulation finished");
        }

        CompletionReport { completed, total: self.total, duplicate, newly_complete }
    }

    pub fn completed(&self) -> usize {
        self.lock().completed()
    }

    pub fn is_complete(&self) -> bool {
        self.lock().complete
    }

    pub fn total(&self) -> usize {
        self.total
    }

    fn lock(&self) -> MutexGuard<'_, CompletionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
