//! Unit tests for sp-station.

use std::cell::{Cell, RefCell};
use std::io::Cursor;
use std::sync::Arc;
use std::thread;

use sp_core::{NodeId, SegmentId, StationId, Timestep};
use sp_provider::{
    DownloadedSegment, HistoryEntry, Provider, ProviderBuilder, VehicleCoverage, VehicleEntry,
};

use crate::{
    DownloadAssigned, LocalProviderClient, NoopPolicy, ProviderClient, RoundContext, RoundStats,
    StationPolicy, StationResult, StationRunner,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const TOWER_JSON: &str = r#"{
  "vehicle_ids": ["veh0", "veh1", "veh2"],
  "towers": [
    { "tower_id": "tower_0",
      "vehicles": [ { "ts": 1, "v": [[0, 12.5], [2, 30.0]] },
                    { "ts": 2, "v": [[1, 4.0]] } ] },
    { "tower_id": "tower_1",
      "vehicles": [ { "ts": 1, "v": [[1, 8.0]] } ] }
  ]
}"#;

const VEHICLE_JSON: &str = r#"{
  "segments": ["s0", "s1", "s2"],
  "vehicles": [
    { "vehicle_id": "veh0",
      "segments": [ { "ts": 1, "s": [[0, 0], [1, 2]] } ] },
    { "vehicle_id": "veh1",
      "segments": [ { "ts": 1, "s": [[2, 0]] },
                    { "ts": 2, "s": [[2, 1], [0, 0]] } ] }
  ]
}"#;

const SEGMENT_JSON: &str = r#"{
  "segments": ["s0", "s1", "s2"],
  "towers": [
    { "tower_id": "tower_0", "distances": [1.0, 9.0, 5.0] },
    { "tower_id": "tower_1", "distances": [2.0, 3.0, 6.0] }
  ]
}"#;

fn provider_from(tower: &str, vehicle: &str, segment: &str) -> Arc<Provider> {
    let traces =
        sp_trace::load_traces_reader(Cursor::new(tower), Cursor::new(vehicle), Cursor::new(segment))
            .unwrap();
    Arc::new(ProviderBuilder::new(traces).build().unwrap())
}

fn provider() -> Arc<Provider> {
    provider_from(TOWER_JSON, VEHICLE_JSON, SEGMENT_JSON)
}

fn seg(id: &str) -> SegmentId {
    SegmentId::new(id)
}

fn vehicle(id: &str, hist: &[(&str, bool)]) -> VehicleEntry {
    VehicleEntry {
        id:   NodeId::new(id),
        dist: 1.0,
        hist: hist
            .iter()
            .map(|&(s, downloaded)| HistoryEntry { elapsed: 0, id: seg(s), downloaded })
            .collect(),
    }
}

fn row(ts: u64, bandwidth: usize, storage: usize) -> RoundStats {
    RoundStats { ts: Timestep(ts), bandwidth, storage, forwarded: 0 }
}

// ── Policies ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod policy {
    use super::*;

    fn ctx<'a>(
        station:  &'a StationId,
        assigned: &'a [SegmentId],
        coverage: &'a [VehicleEntry],
        buffer:   &'a [VehicleEntry],
    ) -> RoundContext<'a> {
        RoundContext { station, ts: Timestep(1), assigned, coverage, buffer }
    }

    #[test]
    fn noop_keeps_buffer_and_downloads_nothing() {
        let station = StationId::from_index(0);
        let buffer = [vehicle("v9", &[("s9", true)])];
        let coverage = [vehicle("v1", &[("s0", false)])];
        let d = NoopPolicy.decide(&ctx(&station, &[seg("s0")], &coverage, &buffer)).unwrap();
        assert!(d.downloaded.is_empty());
        assert_eq!(d.buffer, buffer);
    }

    #[test]
    fn download_assigned_takes_owned_undownloaded_only() {
        let station = StationId::from_index(0);
        let assigned = [seg("s0"), seg("s2")];
        let coverage = [
            vehicle("v1", &[("s0", false), ("s1", false), ("s2", true)]),
            vehicle("v2", &[("s1", false)]),
        ];
        let d = DownloadAssigned.decide(&ctx(&station, &assigned, &coverage, &[])).unwrap();

        assert_eq!(d.downloaded, [DownloadedSegment::new(NodeId::new("v1"), seg("s0"))]);
        assert_eq!(d.buffer.len(), 1, "only the carrier of a fetched segment is buffered");
        let flags: Vec<bool> = d.buffer[0].hist.iter().map(|h| h.downloaded).collect();
        assert_eq!(flags, [true, false, true]);
    }

    #[test]
    fn download_assigned_appends_to_buffer() {
        let station = StationId::from_index(0);
        let buffer = [vehicle("old", &[("s0", true)])];
        let coverage = [vehicle("v1", &[("s0", false)])];
        let d = DownloadAssigned.decide(&ctx(&station, &[seg("s0")], &coverage, &buffer)).unwrap();
        assert_eq!(d.buffer.len(), 2);
        assert_eq!(d.buffer[0].id, NodeId::new("old"));
    }
}

// ── StationRunner ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod runner {
    use super::*;

    /// Serves a fixed coverage list and records calls.
    struct ScriptedClient {
        station:   StationId,
        max_ts:    Timestep,
        requested: RefCell<Vec<u64>>,
        reported:  RefCell<Vec<DownloadedSegment>>,
        completes: Cell<usize>,
    }

    impl ScriptedClient {
        fn new(max_ts: u64) -> Self {
            Self {
                station:   StationId::from_index(3),
                max_ts:    Timestep(max_ts),
                requested: RefCell::new(Vec::new()),
                reported:  RefCell::new(Vec::new()),
                completes: Cell::new(0),
            }
        }
    }

    impl ProviderClient for &ScriptedClient {
        fn station(&self) -> &StationId {
            &self.station
        }

        fn assigned_segments(&self) -> StationResult<Vec<SegmentId>> {
            Ok(vec![seg("s0")])
        }

        fn coverage(&self, ts: Timestep) -> StationResult<VehicleCoverage> {
            self.requested.borrow_mut().push(ts.0);
            let id = format!("v{}", ts.0);
            let downloaded = self.reported.borrow().iter().any(|d| d.vehicle_id.as_str() == id);
            Ok(VehicleCoverage {
                vehicles: vec![vehicle(&id, &[("s0", downloaded)])],
                max_ts:   self.max_ts,
            })
        }

        fn mark_downloaded(&self, entries: &[DownloadedSegment]) -> StationResult<()> {
            self.reported.borrow_mut().extend_from_slice(entries);
            Ok(())
        }

        fn complete(&self) -> StationResult<()> {
            self.completes.set(self.completes.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn requests_each_timestep_then_completes_once() {
        let client = ScriptedClient::new(3);
        let mut runner = StationRunner::new(&client, DownloadAssigned, Vec::new());
        let summary = runner.run().unwrap();

        assert_eq!(*client.requested.borrow(), [1, 2, 3]);
        assert_eq!(client.completes.get(), 1);
        assert_eq!(client.reported.borrow().len(), 3);
        assert_eq!(summary.rounds, 3);
        assert_eq!(summary.downloaded, 3);
        assert_eq!(summary.max_ts, Timestep(3));
        // Storage grows with the buffer; bandwidth is per round.
        assert_eq!(runner.stats().as_slice(), [row(1, 1, 1), row(2, 1, 2), row(3, 1, 3)]);
        assert_eq!(runner.buffer().len(), 3);
    }

    #[test]
    fn noop_policy_reports_nothing() {
        let client = ScriptedClient::new(2);
        let mut runner = StationRunner::new(&client, NoopPolicy, Vec::new());
        runner.run().unwrap();
        assert!(client.reported.borrow().is_empty());
        assert_eq!(runner.stats().as_slice(), [row(1, 0, 0), row(2, 0, 0)]);
    }

    #[test]
    fn stations_run_in_lockstep_against_shared_provider() {
        let p = provider();
        let handles: Vec<_> = (0..2)
            .map(|i| {
                let client = LocalProviderClient::new(Arc::clone(&p), StationId::from_index(i));
                thread::spawn(move || {
                    let mut runner = StationRunner::new(client, DownloadAssigned, Vec::new());
                    let summary = runner.run().unwrap();
                    (summary, runner.stats().clone())
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // tower_0 owns s0 and s2; tower_1 owns s1, which no node it sees carries.
        assert_eq!(results[0].1, [row(1, 1, 1), row(2, 2, 3)]);
        assert_eq!(results[1].1, [row(1, 0, 0), row(2, 0, 0)]);
        assert_eq!(results[0].0.rounds, 2);

        assert!(p.is_complete());
        assert_eq!(p.current_ts(), Timestep(2));
        assert!(p.is_downloaded(&NodeId::new("veh0"), &seg("s0")));
        assert!(p.is_downloaded(&NodeId::new("veh1"), &seg("s2")));
        assert!(!p.is_downloaded(&NodeId::new("veh0"), &seg("s1")));
    }

    #[test]
    fn many_stations_complete_every_round() {
        const STATIONS: usize = 4;
        const MAX_TS: u64 = 12;

        let vehicle_ids: Vec<String> = (0..=MAX_TS).map(|t| format!("\"v{t}\"")).collect();
        let samples: Vec<String> =
            (1..=MAX_TS).map(|t| format!("{{\"ts\":{t},\"v\":[[{t},1.0]]}}")).collect();
        let towers: Vec<String> = (0..STATIONS)
            .map(|i| format!("{{\"tower_id\":\"tower_{i}\",\"vehicles\":[{}]}}", samples.join(",")))
            .collect();
        let tower = format!(
            "{{\"vehicle_ids\":[{}],\"towers\":[{}]}}",
            vehicle_ids.join(","),
            towers.join(",")
        );
        let p = provider_from(
            &tower,
            r#"{ "segments": [], "vehicles": [] }"#,
            r#"{ "segments": [], "towers": [] }"#,
        );

        let handles: Vec<_> = (0..STATIONS)
            .map(|i| {
                let client = LocalProviderClient::new(Arc::clone(&p), StationId::from_index(i));
                thread::spawn(move || {
                    let mut runner = StationRunner::new(client, NoopPolicy, Vec::new());
                    runner.run().unwrap();
                    runner.stats().len()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), MAX_TS as usize);
        }
        assert!(p.is_complete());
        assert_eq!(p.current_ts(), Timestep(MAX_TS));
    }
}

// ── Stats output ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod stats {
    use super::*;
    use crate::{CsvStatsWriter, StatsWriter};

    #[test]
    fn csv_rows_follow_header() {
        let dir = tempfile::tempdir().unwrap();
        let station = StationId::from_index(2);
        let mut w = CsvStatsWriter::new(dir.path(), &station).unwrap();
        w.record(&row(1, 2, 2)).unwrap();
        w.record(&RoundStats { ts: Timestep(2), bandwidth: 0, storage: 2, forwarded: 1 }).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();

        assert_eq!(w.path(), dir.path().join("server_stats_tower_2.csv"));
        let text = std::fs::read_to_string(w.path()).unwrap();
        assert_eq!(text, "timestep,bandwidth,storage,forwarded\n1,2,2,0\n2,0,2,1\n");
    }

    #[test]
    fn runner_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let p = provider();
        let handles: Vec<_> = (0..2)
            .map(|i| {
                let station = StationId::from_index(i);
                let writer = CsvStatsWriter::new(dir.path(), &station).unwrap();
                let client = LocalProviderClient::new(Arc::clone(&p), station);
                thread::spawn(move || StationRunner::new(client, NoopPolicy, writer).run().unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let text = std::fs::read_to_string(dir.path().join("server_stats_tower_0.csv")).unwrap();
        assert_eq!(text.lines().count(), 3);
    }
}

// ── HTTP client ───────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "http"))]
mod http_client {
    use crate::{HttpProviderClient, StationError};

    use super::*;

    #[test]
    fn base_url_gets_scheme() {
        let c = HttpProviderClient::new("127.0.0.1:8080", StationId::from_index(0)).unwrap();
        assert_eq!(c.base_url(), "http://127.0.0.1:8080");
        let c = HttpProviderClient::new("http://provider:9000/", StationId::from_index(0)).unwrap();
        assert_eq!(c.base_url(), "http://provider:9000");
    }

    #[test]
    fn unparseable_address_rejected() {
        let result = HttpProviderClient::new("http://[::1", StationId::from_index(0));
        assert!(matches!(result, Err(StationError::Address { .. })));
    }

    #[test]
    fn station_id_is_one_path_segment() {
        let station: StationId = "north/gate?#1".parse().unwrap();
        let c = HttpProviderClient::new("127.0.0.1:8080", station.clone()).unwrap();
        let url = c.endpoint(&["tower", station.as_str(), "3"]);
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/tower/north%2Fgate%3F%231/3");
        assert_eq!(url.path_segments().map(|s| s.count()), Some(3));
    }

    #[test]
    fn base_path_prefix_kept() {
        let c = HttpProviderClient::new("http://provider:9000/sim/", StationId::from_index(2)).unwrap();
        let url = c.endpoint(&["segments", "tower_2"]);
        assert_eq!(url.as_str(), "http://provider:9000/sim/segments/tower_2");
    }
}
