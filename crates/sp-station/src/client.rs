//! Provider clients: the station's only view of the provider.

use std::sync::Arc;

use sp_core::{SegmentId, StationId, Timestep};
use sp_provider::{CancelToken, DownloadedSegment, Provider, VehicleCoverage};

use crate::StationResult;

/// The four provider operations a station uses, bound to one station id.
///
/// `coverage` blocks until every station has asked for `ts`.
pub trait ProviderClient {
    fn station(&self) -> &StationId;

    fn assigned_segments(&self) -> StationResult<Vec<SegmentId>>;

    fn coverage(&self, ts: Timestep) -> StationResult<VehicleCoverage>;

    fn mark_downloaded(&self, entries: &[DownloadedSegment]) -> StationResult<()>;

    fn complete(&self) -> StationResult<()>;
}

// ── In-process ────────────────────────────────────────────────────────────────

/// Calls a shared [`Provider`] directly.  Used for single-process runs and
/// tests; run one per thread.
pub struct LocalProviderClient {
    provider: Arc<Provider>,
    station:  StationId,
}

impl LocalProviderClient {
    pub fn new(provider: Arc<Provider>, station: StationId) -> Self {
        Self { provider, station }
    }
}

impl ProviderClient for LocalProviderClient {
    fn station(&self) -> &StationId {
        &self.station
    }

    fn assigned_segments(&self) -> StationResult<Vec<SegmentId>> {
        Ok(self.provider.assigned_segments(&self.station).to_vec())
    }

    fn coverage(&self, ts: Timestep) -> StationResult<VehicleCoverage> {
        Ok(self.provider.request_coverage(ts, &self.station, &CancelToken::new())?)
    }

    fn mark_downloaded(&self, entries: &[DownloadedSegment]) -> StationResult<()> {
        self.provider.mark_downloaded(entries.iter().cloned());
        Ok(())
    }

    fn complete(&self) -> StationResult<()> {
        self.provider.report_complete(Some(&self.station))?;
        Ok(())
    }
}

// ── HTTP ──────────────────────────────────────────────────────────────────────

#[cfg(feature = "http")]
pub use http::HttpProviderClient;

#[cfg(feature = "http")]
mod http {
    use reqwest::Url;
    use reqwest::blocking::{Client, Response};
    use sp_core::{SegmentId, StationId, Timestep};
    use sp_provider::{DownloadedSegment, VehicleCoverage};
    use tracing::debug;

    use super::ProviderClient;
    use crate::{StationError, StationResult};

    /// Talks to a provider over its HTTP API.
    ///
    /// The client has no request timeout: a coverage request legitimately
    /// waits as long as the slowest station takes to finish its round.
    pub struct HttpProviderClient {
        client:  Client,
        base:    Url,
        station: StationId,
    }

    impl HttpProviderClient {
        /// `addr` is `host:port` or a full `http://` base URL.
        pub fn new(addr: &str, station: StationId) -> StationResult<Self> {
            let raw = if addr.contains("://") { addr.to_owned() } else { format!("http://{addr}") };
            let invalid = |reason: String| StationError::Address { addr: addr.to_owned(), reason };
            let base = Url::parse(&raw).map_err(|e| invalid(e.to_string()))?;
            if base.cannot_be_a_base() {
                return Err(invalid("not a hierarchical URL".into()));
            }
            let client = Client::builder()
                .timeout(None::<std::time::Duration>)
                .build()
                .map_err(|source| StationError::Http { url: raw, source })?;
            Ok(Self { client, base, station })
        }

        pub fn base_url(&self) -> &str {
            self.base.as_str().trim_end_matches('/')
        }

        /// `base` with `segments` appended, each percent-encoded as a single
        /// path segment.
        pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
            let mut url = self.base.clone();
            if let Ok(mut path) = url.path_segments_mut() {
                path.pop_if_empty().extend(segments);
            }
            url
        }

        fn get(&self, url: Url) -> StationResult<Response> {
            debug!(%url, "GET");
            let resp = self
                .client
                .get(url.clone())
                .send()
                .map_err(|source| StationError::Http { url: url.to_string(), source })?;
            check(url, resp)
        }
    }

    impl ProviderClient for HttpProviderClient {
        fn station(&self) -> &StationId {
            &self.station
        }

        fn assigned_segments(&self) -> StationResult<Vec<SegmentId>> {
            let url = self.endpoint(&["segments", self.station.as_str()]);
            self.get(url.clone())?
                .json()
                .map_err(|source| StationError::Http { url: url.to_string(), source })
        }

        fn coverage(&self, ts: Timestep) -> StationResult<VehicleCoverage> {
            let ts = ts.0.to_string();
            let url = self.endpoint(&["tower", self.station.as_str(), &ts]);
            self.get(url.clone())?
                .json()
                .map_err(|source| StationError::Http { url: url.to_string(), source })
        }

        fn mark_downloaded(&self, entries: &[DownloadedSegment]) -> StationResult<()> {
            let url = self.endpoint(&["downloaded"]);
            let resp = self
                .client
                .post(url.clone())
                .json(entries)
                .send()
                .map_err(|source| StationError::Http { url: url.to_string(), source })?;
            check(url, resp).map(drop)
        }

        fn complete(&self) -> StationResult<()> {
            self.get(self.endpoint(&["complete", self.station.as_str()])).map(drop)
        }
    }

    fn check(url: Url, resp: Response) -> StationResult<Response> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            Err(StationError::Status { url: url.into(), status: status.as_u16() })
        }
    }
}
