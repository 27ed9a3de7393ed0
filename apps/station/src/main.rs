//! station — one station process of the lockstep simulation.
//!
//! # Example
//!
//! ```bash
//! station --idx 3 --sprov 127.0.0.1:8080 --output-dir out/ --policy download-assigned
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use sp_core::StationId;
use sp_station::{
    CsvStatsWriter, DownloadAssigned, HttpProviderClient, NoopPolicy, ProviderClient,
    StationPolicy, StationRunner,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum PolicyKind {
    /// Download nothing
    Noop,
    /// Download every owned segment a vehicle in range carries
    DownloadAssigned,
}

/// Station
///
/// Requests coverage from the segment provider for every timestep, applies
/// a download policy, and writes per-round bandwidth and storage to CSV.
#[derive(Parser, Debug)]
#[command(name = "station")]
#[command(version, about, long_about = None)]
struct Args {
    /// Index of this station; the station id becomes `tower_{idx}`
    #[arg(long, conflicts_with = "station_id")]
    idx: Option<usize>,

    /// Explicit station id
    #[arg(long)]
    station_id: Option<String>,

    /// Address of the segment provider
    #[arg(long, env = "SP_PROVIDER", default_value = "127.0.0.1:8080")]
    sprov: String,

    /// Directory for the stats CSV
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Decision policy
    #[arg(long, value_enum, default_value_t = PolicyKind::DownloadAssigned)]
    policy: PolicyKind,
}

impl Args {
    fn station(&self) -> Result<StationId> {
        match (&self.station_id, self.idx) {
            (Some(id), _) => id.parse().context("invalid --station-id"),
            (None, Some(idx)) => Ok(StationId::from_index(idx)),
            (None, None) => bail!("station index must be specified (--idx or --station-id)"),
        }
    }
}

fn run<P: StationPolicy>(client: HttpProviderClient, policy: P, args: &Args) -> Result<()> {
    let stats = CsvStatsWriter::new(&args.output_dir, client.station())
        .context("failed to create stats file")?;
    let path = stats.path().to_path_buf();

    let summary = StationRunner::new(client, policy, stats).run()?;
    info!(
        station = %summary.station,
        rounds = summary.rounds,
        downloaded = summary.downloaded,
        stats = %path.display(),
        "station finished"
    );
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,sp_station=info,station=info")),
        )
        .init();

    let args = Args::parse();
    let station = args.station()?;
    info!(%station, provider = %args.sprov, policy = ?args.policy, "starting station");

    let client = HttpProviderClient::new(&args.sprov, station)?;
    match args.policy {
        PolicyKind::Noop => run(client, NoopPolicy, &args),
        PolicyKind::DownloadAssigned => run(client, DownloadAssigned, &args),
    }
}
