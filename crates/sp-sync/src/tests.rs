//! Unit and concurrency tests for sp-sync.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use sp_core::{NodeId, SegmentId, StationId, Timestep};

use crate::{CancelToken, SyncError, TimestepBarrier};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn station(i: usize) -> StationId {
    StationId::from_index(i)
}

fn barrier(total: usize) -> Arc<TimestepBarrier> {
    Arc::new(TimestepBarrier::new(total, Timestep::FIRST).unwrap())
}

/// Poll until `cond` holds, panicking after 5 s.
fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(1));
    }
}

fn waiting(b: &TimestepBarrier) -> usize {
    b.snapshot().waiting
}

// ── TimestepBarrier ───────────────────────────────────────────────────────────

#[cfg(test)]
mod barrier {
    use super::*;
    use crate::BarrierPhase;

    #[test]
    fn empty_fleet_rejected() {
        assert_eq!(TimestepBarrier::new(0, Timestep::FIRST).err(), Some(SyncError::EmptyFleet));
    }

    #[test]
    fn starts_idle_at_first_timestep() {
        let b = barrier(3);
        let snap = b.snapshot();
        assert_eq!(snap.current_ts, Timestep(1));
        assert_eq!(snap.waiting, 0);
        assert_eq!(snap.total_stations, 3);
        assert_eq!(snap.phase, BarrierPhase::Idle);
        assert!(!snap.closed);
    }

    #[test]
    fn reached_target_returns_without_arriving() {
        let b = barrier(2);
        let out = b.wait_for(&station(0), Timestep(1), &CancelToken::new()).unwrap();
        assert_eq!(out.current_ts, Timestep(1));
        assert!(out.opened.is_empty());
        assert_eq!(waiting(&b), 0);
    }

    #[test]
    fn single_station_opens_every_round() {
        let b = barrier(1);
        let token = CancelToken::new();
        for ts in 2..=5 {
            let out = b.wait_for(&station(0), Timestep(ts), &token).unwrap();
            assert_eq!(out.opened, vec![Timestep(ts)]);
            assert_eq!(b.current_ts(), Timestep(ts));
        }
    }

    #[test]
    fn last_arrival_opens_and_wakes_waiter() {
        let b = barrier(2);
        let waiter = {
            let b = Arc::clone(&b);
            thread::spawn(move || b.wait_for(&station(0), Timestep(2), &CancelToken::new()))
        };
        wait_until("first arrival", || waiting(&b) == 1);
        assert_eq!(b.snapshot().phase, BarrierPhase::Blocked);
        assert_eq!(b.current_ts(), Timestep(1));

        let last = b.wait_for(&station(1), Timestep(2), &CancelToken::new()).unwrap();
        let first = waiter.join().unwrap().unwrap();

        assert_eq!(last.opened, vec![Timestep(2)]);
        assert!(first.opened.is_empty());
        assert_eq!(first.current_ts, Timestep(2));
        assert_eq!(waiting(&b), 0);
    }

    #[test]
    fn duplicate_arrival_counts_once() {
        let b = barrier(2);
        let spawn_a = || {
            let b = Arc::clone(&b);
            thread::spawn(move || b.wait_for(&station(0), Timestep(2), &CancelToken::new()))
        };
        let a1 = spawn_a();
        let a2 = spawn_a();
        wait_until("station 0 arrival", || waiting(&b) == 1);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(b.current_ts(), Timestep(1), "one station must not open a two-station barrier");
        assert_eq!(waiting(&b), 1);

        b.wait_for(&station(1), Timestep(2), &CancelToken::new()).unwrap();
        assert!(a1.join().unwrap().is_ok());
        assert!(a2.join().unwrap().is_ok());
        assert_eq!(b.current_ts(), Timestep(2));
    }

    #[test]
    fn cancel_retracts_arrival() {
        let b = barrier(2);
        let token = CancelToken::new();
        let waiter = {
            let (b, token) = (Arc::clone(&b), token.clone());
            thread::spawn(move || b.wait_for(&station(0), Timestep(2), &token))
        };
        wait_until("arrival", || waiting(&b) == 1);

        b.cancel(&token);
        assert_eq!(waiter.join().unwrap(), Err(SyncError::Cancelled));
        assert_eq!(waiting(&b), 0);
        assert_eq!(b.current_ts(), Timestep(1));

        // Station 1 alone cannot open; station 0 re-requesting completes the round.
        let other = {
            let b = Arc::clone(&b);
            thread::spawn(move || b.wait_for(&station(1), Timestep(2), &CancelToken::new()))
        };
        wait_until("station 1 arrival", || waiting(&b) == 1);
        b.wait_for(&station(0), Timestep(2), &CancelToken::new()).unwrap();
        assert!(other.join().unwrap().is_ok());
        assert_eq!(b.current_ts(), Timestep(2));
    }

    #[test]
    fn pre_cancelled_token_never_arrives() {
        let b = barrier(2);
        let token = CancelToken::new();
        b.cancel(&token);
        assert!(token.is_cancelled());
        assert_eq!(b.wait_for(&station(0), Timestep(2), &token), Err(SyncError::Cancelled));
        assert_eq!(waiting(&b), 0);
    }

    #[test]
    fn close_releases_all_waiters() {
        let b = barrier(4);
        let waiters: Vec<_> = (0..3)
            .map(|i| {
                let b = Arc::clone(&b);
                thread::spawn(move || b.wait_for(&station(i), Timestep(2), &CancelToken::new()))
            })
            .collect();
        wait_until("three arrivals", || waiting(&b) == 3);

        b.close();
        for w in waiters {
            assert_eq!(w.join().unwrap(), Err(SyncError::Closed));
        }
        assert!(b.snapshot().closed);
        assert_eq!(b.wait_for(&station(3), Timestep(2), &CancelToken::new()), Err(SyncError::Closed));
        // Already-reached timesteps are still answered.
        assert!(b.wait_for(&station(3), Timestep(1), &CancelToken::new()).is_ok());
    }

    #[test]
    fn far_ahead_request_counts_for_each_round() {
        let b = barrier(2);
        let ahead = {
            let b = Arc::clone(&b);
            thread::spawn(move || b.wait_for(&station(0), Timestep(4), &CancelToken::new()))
        };
        wait_until("far-ahead arrival", || waiting(&b) == 1);

        for ts in 2..=4 {
            b.wait_for(&station(1), Timestep(ts), &CancelToken::new()).unwrap();
            assert!(b.current_ts() >= Timestep(ts));
        }
        let out = ahead.join().unwrap().unwrap();
        assert_eq!(out.current_ts, Timestep(4));
        assert_eq!(b.current_ts(), Timestep(4));
    }

    #[test]
    fn many_rounds_advance_exactly_once_each() {
        use std::sync::Mutex;
        use std::sync::atomic::{AtomicUsize, Ordering};

        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};

        const STATIONS: usize = 6;
        const LAST: u64 = 40;

        let b = barrier(STATIONS);
        // requested[ts] = number of stations that have asked for ts.
        let requested: Arc<Vec<AtomicUsize>> =
            Arc::new((0..=LAST as usize).map(|_| AtomicUsize::new(0)).collect());
        let opened = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..STATIONS)
            .map(|i| {
                let (b, requested, opened) = (Arc::clone(&b), Arc::clone(&requested), Arc::clone(&opened));
                thread::spawn(move || {
                    let mut rng = SmallRng::seed_from_u64(i as u64);
                    let token = CancelToken::new();
                    for ts in 2..=LAST {
                        if rng.gen_bool(0.3) {
                            thread::sleep(Duration::from_micros(rng.gen_range(0..500)));
                        }
                        requested[ts as usize].fetch_add(1, Ordering::SeqCst);
                        let out = b.wait_for(&station(i), Timestep(ts), &token).unwrap();
                        assert!(out.current_ts >= Timestep(ts));
                        assert_eq!(
                            requested[ts as usize].load(Ordering::SeqCst),
                            STATIONS,
                            "released into {ts} before every station asked for it"
                        );
                        opened.lock().unwrap().extend(out.opened);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut opened = opened.lock().unwrap().clone();
        opened.sort();
        let expected: Vec<Timestep> = (2..=LAST).map(Timestep).collect();
        assert_eq!(opened, expected, "each timestep must open exactly once");
        assert_eq!(b.current_ts(), Timestep(LAST));
        assert_eq!(waiting(&b), 0);
    }
}

// ── DownloadedSegmentsTracker ─────────────────────────────────────────────────

#[cfg(test)]
mod downloads {
    use super::*;
    use crate::DownloadedSegmentsTracker;

    fn pair(n: &str, s: &str) -> (NodeId, SegmentId) {
        (NodeId::new(n), SegmentId::new(s))
    }

    #[test]
    fn default_is_not_downloaded() {
        let t = DownloadedSegmentsTracker::new();
        assert!(!t.is_downloaded(&NodeId::new("v1"), &SegmentId::new("s1")));
        assert!(t.is_empty());
    }

    #[test]
    fn marking_is_idempotent() {
        let t = DownloadedSegmentsTracker::new();
        assert_eq!(t.mark_downloaded([pair("v1", "s1")]), 1);
        assert_eq!(t.mark_downloaded([pair("v1", "s1")]), 0);
        assert!(t.is_downloaded(&NodeId::new("v1"), &SegmentId::new("s1")));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn marks_are_per_node() {
        let t = DownloadedSegmentsTracker::new();
        t.mark_downloaded([pair("v1", "s1"), pair("v2", "s2")]);
        let view = t.view();
        assert!(view.is_downloaded(&NodeId::new("v1"), &SegmentId::new("s1")));
        assert!(!view.is_downloaded(&NodeId::new("v2"), &SegmentId::new("s1")));
        assert!(view.is_downloaded(&NodeId::new("v2"), &SegmentId::new("s2")));
    }

    #[test]
    fn concurrent_marks_never_lost() {
        let t = Arc::new(DownloadedSegmentsTracker::new());
        let handles: Vec<_> = (0..4)
            .map(|w| {
                let t = Arc::clone(&t);
                thread::spawn(move || {
                    for i in 0..100 {
                        t.mark_downloaded([pair(&format!("v{w}"), &format!("s{i}"))]);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(t.len(), 400);
    }
}

// ── CompletionTracker ─────────────────────────────────────────────────────────

#[cfg(test)]
mod completion {
    use super::*;
    use crate::CompletionTracker;

    #[test]
    fn named_reports_deduplicated() {
        let c = CompletionTracker::new(2);
        let first = c.report(Some(&station(0)));
        assert_eq!(first.completed, 1);
        assert!(!first.duplicate);

        let again = c.report(Some(&station(0)));
        assert!(again.duplicate);
        assert_eq!(again.completed, 1);
        assert!(!c.is_complete());

        let last = c.report(Some(&station(1)));
        assert!(last.newly_complete);
        assert!(c.is_complete());
    }

    #[test]
    fn anonymous_reports_each_count() {
        let c = CompletionTracker::new(3);
        c.report(None);
        c.report(None);
        assert_eq!(c.completed(), 2);
        assert!(c.report(None).newly_complete);
    }

    #[test]
    fn completes_only_once() {
        let c = CompletionTracker::new(1);
        assert!(c.report(None).newly_complete);
        let extra = c.report(None);
        assert!(!extra.newly_complete);
        assert!(c.is_complete());
        assert_eq!(extra.completed, 2);
    }
}
