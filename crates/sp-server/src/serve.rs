//! Serving loop and shutdown triggers.

use std::io;
use std::sync::Arc;

use sp_provider::{Provider, ProviderObserver};
use tokio::net::TcpListener;
use tokio::runtime::{self, Runtime};
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::router;

// ── Completion signal ─────────────────────────────────────────────────────────

/// Observer half of [`completion_signal`].  Register it on the
/// [`ProviderBuilder`][sp_provider::ProviderBuilder].
pub struct CompletionSignal(watch::Sender<bool>);

impl ProviderObserver for CompletionSignal {
    fn on_simulation_complete(&self) {
        self.0.send_replace(true);
    }
}

/// Future half of [`completion_signal`].
pub struct SimulationDone(watch::Receiver<bool>);

impl SimulationDone {
    /// Resolves once every station has reported completion (or the provider
    /// holding the other half is gone).
    pub async fn wait(mut self) {
        let _ = self.0.wait_for(|done| *done).await;
    }
}

/// A linked pair: the provider fires the signal, the server awaits it.
pub fn completion_signal() -> (CompletionSignal, SimulationDone) {
    let (tx, rx) = watch::channel(false);
    (CompletionSignal(tx), SimulationDone(rx))
}

// ── Runtime ───────────────────────────────────────────────────────────────────

/// Blocking threads kept free on top of one per station, for duplicate
/// requests that arrive while the whole fleet is parked.
pub const BLOCKING_HEADROOM: usize = 64;

/// Tokio's own default for `max_blocking_threads`.
const TOKIO_DEFAULT_BLOCKING: usize = 512;

/// Blocking-pool size needed for `stations` coverage requests to be parked
/// in the barrier at once.
///
/// Every parked request holds a pool thread until its round opens, so a pool
/// smaller than the fleet queues the last arrivals behind threads that only
/// those arrivals can release.
pub fn blocking_threads(stations: usize) -> usize {
    stations.saturating_add(BLOCKING_HEADROOM).max(TOKIO_DEFAULT_BLOCKING)
}

/// Multi-threaded runtime whose blocking pool fits a fleet of `stations`.
pub fn runtime(stations: usize) -> io::Result<Runtime> {
    runtime::Builder::new_multi_thread()
        .enable_all()
        .max_blocking_threads(blocking_threads(stations))
        .build()
}

// ── serve ─────────────────────────────────────────────────────────────────────

/// Serve the API on `listener` until Ctrl-C, or until `until_complete`
/// resolves when one is given.
///
/// On shutdown the provider's barrier is closed first so requests parked in
/// it return promptly and the graceful drain can finish.
pub async fn serve(
    listener:       TcpListener,
    provider:       Arc<Provider>,
    until_complete: Option<SimulationDone>,
) -> io::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, stations = provider.total_stations(), "segment provider listening");

    let app = router(Arc::clone(&provider));
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal(until_complete).await;
            provider.shutdown();
        })
        .await?;

    info!("segment provider stopped");
    Ok(())
}

async fn shutdown_signal(until_complete: Option<SimulationDone>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "unable to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    let complete = async {
        match until_complete {
            Some(done) => done.wait().await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl-C, shutting down"),
        _ = complete => info!("simulation complete, shutting down"),
    }
}
