//! `DownloadedSegmentsTracker` — accumulate-only ledger of downloaded segments.
//!
//! Stations report (node, segment) pairs they fetched; coverage responses
//! read the ledger to flag each history entry.  Marks are never cleared for
//! the lifetime of the process.

use std::sync::{Mutex, MutexGuard, PoisonError};

use rustc_hash::{FxHashMap, FxHashSet};
use sp_core::{NodeId, SegmentId};

type Marks = FxHashMap<NodeId, FxHashSet<SegmentId>>;

/// Lock-guarded (node, segment) → downloaded ledger.  Default: not downloaded.
#[derive(Default)]
pub struct DownloadedSegmentsTracker {
    marks: Mutex<Marks>,
}

impl DownloadedSegmentsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark every pair as downloaded.  Idempotent.
    ///
    /// Returns how many pairs were not already marked.
    pub fn mark_downloaded<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (NodeId, SegmentId)>,
    {
        let mut marks = self.lock();
        let mut added = 0;
        for (node, segment) in entries {
            if marks.entry(node).or_default().insert(segment) {
                added += 1;
            }
        }
        added
    }

    pub fn is_downloaded(&self, node: &NodeId, segment: &SegmentId) -> bool {
        self.view().is_downloaded(node, segment)
    }

    /// Hold the ledger lock for a batch of lookups.
    ///
    /// Keep the view short-lived: station reports block while it exists.
    pub fn view(&self) -> DownloadView<'_> {
        DownloadView { marks: self.lock() }
    }

    /// Total number of marked pairs.
    pub fn len(&self) -> usize {
        self.lock().values().map(FxHashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Marks> {
        self.marks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Read access to the ledger under its lock.
pub struct DownloadView<'a> {
    marks: MutexGuard<'a, Marks>,
}

impl DownloadView<'_> {
    pub fn is_downloaded(&self, node: &NodeId, segment: &SegmentId) -> bool {
        self.marks
            .get(node)
            .is_some_and(|segments| segments.contains(segment))
    }
}
