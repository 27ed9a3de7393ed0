//! `sp-core` — foundational types for the segment provider workspace.
//!
//! This crate is a dependency of every other `sp-*` crate.  It has no `sp-*`
//! dependencies and only `thiserror` (plus optional `serde`) externally.
//!
//! # What lives here
//!
//! | Module       | Contents                                               |
//! |--------------|--------------------------------------------------------|
//! | [`ids`]      | `StationId`, `NodeId`, `SegmentId`                     |
//! | [`time`]     | `Timestep`                                             |
//! | [`config`]   | `ProviderConfig`                                       |
//! | [`error`]    | `SpError`, `SpResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod ids;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::ProviderConfig;
pub use error::{SpError, SpResult};
pub use ids::{NodeId, SegmentId, StationId};
pub use time::Timestep;
