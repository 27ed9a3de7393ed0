//! `sp-station` — the station side of the lockstep simulation.
//!
//! A station repeatedly asks the provider who is in range at the next
//! timestep, hands that to a [`StationPolicy`], reports what the policy
//! downloaded, and records per-round usage.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                       |
//! |------------|----------------------------------------------------------------|
//! | [`client`] | `ProviderClient`, `LocalProviderClient`, `HttpProviderClient`  |
//! | [`policy`] | `StationPolicy`, `RoundContext`, `Decision`, built-in policies |
//! | [`runner`] | `StationRunner`, `RunSummary`                                  |
//! | [`stats`]  | `RoundStats`, `StatsWriter`, `CsvStatsWriter`                  |
//! | [`error`]  | `StationError`, `StationResult<T>`                             |
//!
//! # Cargo features
//!
//! | Feature | Effect                                                        |
//! |---------|---------------------------------------------------------------|
//! | `http`  | (default) `HttpProviderClient` over reqwest's blocking client |

pub mod client;
pub mod error;
pub mod policy;
pub mod runner;
pub mod stats;

#[cfg(test)]
mod tests;

#[cfg(feature = "http")]
pub use client::HttpProviderClient;
pub use client::{LocalProviderClient, ProviderClient};
pub use error::{StationError, StationResult};
pub use policy::{Decision, DownloadAssigned, Forward, NoopPolicy, RoundContext, StationPolicy};
pub use runner::{RunSummary, StationRunner};
pub use stats::{CsvStatsWriter, RoundStats, StatsWriter};
