//! Fluent builder for constructing a [`Provider`].

use sp_core::Timestep;
use sp_sync::{CompletionTracker, DownloadedSegmentsTracker, TimestepBarrier};
use sp_trace::TraceSet;
use tracing::{info, warn};

use crate::{NoopObserver, Provider, ProviderError, ProviderObserver, ProviderResult};

/// Fluent builder for [`Provider`].
///
/// # Optional inputs (have defaults)
///
/// | Method                  | Default                                   |
/// |-------------------------|-------------------------------------------|
/// | `.station_override(n)`  | Distinct stations in the contact trace    |
/// | `.observer(o)`          | [`NoopObserver`]                          |
///
/// # Example
///
/// ```rust,ignore
/// let traces = sp_trace::load_traces(&config)?;
/// let provider = ProviderBuilder::new(traces)
///     .station_override(config.station_override)
///     .build()?;
/// ```
pub struct ProviderBuilder {
    traces:           TraceSet,
    station_override: Option<usize>,
    observer:         Option<Box<dyn ProviderObserver>>,
}

impl ProviderBuilder {
    pub fn new(traces: TraceSet) -> Self {
        Self { traces, station_override: None, observer: None }
    }

    /// Make the barrier wait for `count` stations instead of the number the
    /// contact trace defines.  `None` keeps the trace-derived count; a count
    /// above the trace's is rejected by [`build`](Self::build).
    pub fn station_override(mut self, count: Option<usize>) -> Self {
        self.station_override = count;
        self
    }

    pub fn observer(mut self, observer: impl ProviderObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Size the barrier and return a ready-to-serve [`Provider`] with the
    /// shared timestep at 1.
    pub fn build(self) -> ProviderResult<Provider> {
        let derived = self.traces.station_count();
        let total = match self.station_override {
            Some(0) => {
                return Err(ProviderError::Config("station override must be at least 1".into()));
            }
            Some(n) if n > derived => {
                // Only stations named in the contact trace can arrive.
                return Err(ProviderError::Config(format!(
                    "station override {n} exceeds the {derived} stations in the contact trace"
                )));
            }
            Some(n) => {
                if n < derived {
                    warn!(
                        configured = n,
                        in_trace = derived,
                        "station count overridden; barrier no longer matches the trace topology"
                    );
                }
                n
            }
            None => derived,
        };

        let barrier = TimestepBarrier::new(total, Timestep::FIRST)?;
        info!(
            stations = total,
            max_ts = self.traces.max_ts.0,
            "segment provider ready"
        );

        Ok(Provider {
            traces:     self.traces,
            barrier,
            downloads:  DownloadedSegmentsTracker::new(),
            completion: CompletionTracker::new(total),
            observer:   self.observer.unwrap_or_else(|| Box::new(NoopObserver)),
        })
    }
}
