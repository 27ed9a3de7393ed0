//! `sp-sync` — the provider's shared mutable state.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                       |
//! |----------------|----------------------------------------------------------------|
//! | [`barrier`]    | `TimestepBarrier`, `CancelToken`, `BarrierSnapshot`            |
//! | [`downloads`]  | `DownloadedSegmentsTracker`, `DownloadView`                    |
//! | [`completion`] | `CompletionTracker`, `CompletionReport`                        |
//! | [`error`]      | `SyncError`, `SyncResult<T>`                                   |
//!
//! # Locking
//!
//! Each structure owns exactly one `Mutex`, and no operation holds two of
//! them at once.  The barrier's lock covers the current timestep and the
//! arrival set together, so "am I the last arrival?" and "advance" are one
//! atomic step.  The download ledger is locked independently because it is
//! touched on every coverage response and must not contend with barrier
//! progress.
//!
//! Mutex poisoning is recovered rather than propagated: no critical section
//! in this crate can panic part-way through an update.

pub mod barrier;
pub mod completion;
pub mod downloads;
pub mod error;

#[cfg(test)]
mod tests;

pub use barrier::{BarrierPhase, BarrierSnapshot, CancelToken, TimestepBarrier, WaitOutcome};
pub use completion::{CompletionReport, CompletionTracker};
pub use downloads::{DownloadView, DownloadedSegmentsTracker};
pub use error::{SyncError, SyncResult};
