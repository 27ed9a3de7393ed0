//! `sp-provider` — the lockstep segment provider.
//!
//! Ties the immutable trace indices from `sp-trace` to the shared run state
//! from `sp-sync` and exposes the operations every transport maps onto.
//!
//! # Query path
//!
//! ```text
//! request_coverage(ts, station):
//!   ts > max_ts               → OutOfRange
//!   station not in trace      → UnknownStation
//!   loop:
//!     ts <= current_ts        → answer from indices (never blocks)
//!     else                    → barrier.wait_for(station, ts), retry
//! ```
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`provider`] | `Provider` and its operations                             |
//! | [`builder`]  | `ProviderBuilder`                                         |
//! | [`observer`] | `ProviderObserver`, `NoopObserver`                        |
//! | [`wire`]     | JSON request/response shapes                              |
//! | [`error`]    | `ProviderError`, `ProviderResult<T>`                      |

pub mod builder;
pub mod error;
pub mod observer;
pub mod provider;
pub mod wire;


pub use builder::ProviderBuilder;
pub use error::{ProviderError, ProviderResult};
pub use observer::{NoopObserver, ProviderObserver};
pub use provider::Provider;
pub use sp_sync::{CancelToken, CompletionReport};
pub use wire::{
    DownloadedSegment, HistoryEntry, ProviderPhase, ProviderStatus, VehicleCoverage, VehicleEntry,
};
