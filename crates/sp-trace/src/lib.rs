//! `sp-trace` — trace loading and the provider's read-only lookup indices.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                        |
//! |----------------|-----------------------------------------------------------------|
//! | [`format`]     | serde shapes of the three JSON trace files, `TraceKind`         |
//! | [`loader`]     | `load_traces`, `load_traces_reader`, `TraceSet`                 |
//! | [`coverage`]   | `CoverageIndex` — (station, ts) → `[Contact]`                   |
//! | [`history`]    | `VehicleHistoryIndex` — (node, ts) → `[Visit]`                  |
//! | [`assignment`] | `SegmentAssignmentIndex` — station → nearest segments           |
//! | [`error`]      | `LoadError`, `LoadResult<T>`                                    |
//!
//! # Lifecycle
//!
//! All indices are built exactly once, single-threaded, at startup.  After
//! [`load_traces`] returns they are never mutated, so the provider shares
//! them across request threads without locking.  Any parse failure is
//! returned as a [`LoadError`]; there is no partial index set.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                     |
//! |------------|------------------------------------------------------------|
//! | `parallel` | Runs the nearest-station assignment scan on Rayon.         |

pub mod assignment;
pub mod coverage;
pub mod error;
pub mod format;
pub mod history;
pub mod loader;


pub use assignment::SegmentAssignmentIndex;
pub use coverage::{Contact, CoverageIndex};
pub use error::{LoadError, LoadResult};
pub use format::{SegmentTrace, TowerTrace, TraceKind, VehicleTrace};
pub use history::{VehicleHistoryIndex, Visit};
pub use loader::{TraceSet, build_trace_set, load_trace_files, load_traces, load_traces_reader};
