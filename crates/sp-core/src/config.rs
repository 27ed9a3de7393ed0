//! Provider startup configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::{SpError, SpResult};

/// Top-level provider configuration.
///
/// Typically assembled from command-line flags (or the matching `SP_*`
/// environment variables) by the application crate and passed to the trace
/// loader and provider builder.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProviderConfig {
    /// Station ↔ node contact trace (`tower` output of the mobility run).
    pub tower_trace: PathBuf,

    /// Per-node segment visit history.
    pub vehicle_trace: PathBuf,

    /// Per-station distance to every segment.
    pub segment_trace: PathBuf,

    /// Replace the trace-derived station count.  Used for partial-fleet and
    /// test runs; the barrier then waits for exactly this many stations.
    pub station_override: Option<usize>,

    /// Address to bind the HTTP listener on.  Default: `0.0.0.0`.
    pub bind: IpAddr,

    /// Port to serve requests on.  Default: 8080.
    pub port: u16,

    /// Shut the HTTP server down once every station has reported completion.
    pub exit_on_complete: bool,
}

impl ProviderConfig {
    pub const DEFAULT_PORT: u16 = 8080;

    /// A configuration with the three trace paths and defaults elsewhere.
    pub fn new(
        tower_trace:   impl Into<PathBuf>,
        vehicle_trace: impl Into<PathBuf>,
        segment_trace: impl Into<PathBuf>,
    ) -> Self {
        Self {
            tower_trace:      tower_trace.into(),
            vehicle_trace:    vehicle_trace.into(),
            segment_trace:    segment_trace.into(),
            station_override: None,
            bind:             IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port:             Self::DEFAULT_PORT,
            exit_on_complete: true,
        }
    }

    /// Check that every required path is present and the override is usable.
    pub fn validate(&self) -> SpResult<()> {
        for (flag, path) in [
            ("tower-output", &self.tower_trace),
            ("vehicle-output", &self.vehicle_trace),
            ("segment-output", &self.segment_trace),
        ] {
            if path.as_os_str().is_empty() {
                return Err(SpError::Config(format!("{flag} file must be specified")));
            }
        }
        if self.station_override == Some(0) {
            return Err(SpError::Config("station override must be at least 1".into()));
        }
        Ok(())
    }

    /// The socket address the HTTP server listens on.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}
