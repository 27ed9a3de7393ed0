//! segment-provider — serves precomputed mobility traces to a fleet of
//! stations, one timestep at a time.
//!
//! # Example
//!
//! ```bash
//! segment-provider \
//!     --tower-output out/towers.json \
//!     --vehicle-output out/vehicles.json \
//!     --segment-output out/segments.json \
//!     --port 8080
//! ```

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use sp_core::ProviderConfig;
use sp_provider::ProviderBuilder;
use sp_server::completion_signal;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Segment provider
///
/// Loads the contact, vehicle-history, and segment-distance traces and
/// answers station requests, holding every station at the same timestep.
#[derive(Parser, Debug)]
#[command(name = "segment-provider")]
#[command(version, about, long_about = None)]
struct Args {
    /// Station ↔ vehicle contact trace (JSON)
    #[arg(long, env = "SP_TOWER_OUTPUT")]
    tower_output: PathBuf,

    /// Vehicle segment-history trace (JSON)
    #[arg(long, env = "SP_VEHICLE_OUTPUT")]
    vehicle_output: PathBuf,

    /// Station ↔ segment distance trace (JSON)
    #[arg(long, env = "SP_SEGMENT_OUTPUT")]
    segment_output: PathBuf,

    /// Override the number of stations the barrier waits for
    #[arg(long, env = "SP_TOWERS")]
    towers: Option<usize>,

    /// Port to serve on
    #[arg(short, long, env = "SP_PORT", default_value_t = ProviderConfig::DEFAULT_PORT)]
    port: u16,

    /// Address to bind
    #[arg(long, env = "SP_BIND", default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Stop serving once every station has reported completion
    #[arg(long, env = "SP_EXIT_ON_COMPLETE", default_value_t = true, action = ArgAction::Set)]
    exit_on_complete: bool,
}

impl Args {
    fn into_config(self) -> ProviderConfig {
        let mut config = ProviderConfig::new(self.tower_output, self.vehicle_output, self.segment_output);
        config.station_override = self.towers;
        config.port = self.port;
        config.bind = self.bind;
        config.exit_on_complete = self.exit_on_complete;
        config
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,sp_trace=info,sp_sync=info,sp_provider=info,sp_server=info,segment_provider=info")),
        )
        .init();

    let config = Args::parse().into_config();
    config.validate().context("invalid configuration")?;

    info!(
        tower = %config.tower_trace.display(),
        vehicle = %config.vehicle_trace.display(),
        segment = %config.segment_trace.display(),
        "loading traces"
    );
    let traces = sp_trace::load_traces(&config).context("failed to load traces")?;

    let (signal, done) = completion_signal();
    let provider = ProviderBuilder::new(traces)
        .station_override(config.station_override)
        .observer(signal)
        .build()
        .context("failed to build provider")?;

    // The fleet size is only known once the traces are in.
    let stations = provider.total_stations();
    let runtime = sp_server::runtime(stations).context("failed to start runtime")?;
    info!(stations, blocking_threads = sp_server::blocking_threads(stations), "runtime ready");

    runtime.block_on(async {
        let addr = config.listen_addr();
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;

        let until_complete = config.exit_on_complete.then_some(done);
        sp_server::serve(listener, Arc::new(provider), until_complete).await?;
        Ok::<_, anyhow::Error>(())
    })
}
