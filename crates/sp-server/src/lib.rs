//! `sp-server` — HTTP API of the segment provider.
//!
//! | Route                         | Verb       | Provider operation                  |
//! |-------------------------------|------------|-------------------------------------|
//! | `/tower/{station}/{ts}`       | GET        | `request_coverage` (may block)      |
//! | `/segments/{station}`         | GET        | `assigned_segments`                 |
//! | `/downloaded`                 | POST       | `mark_downloaded`                   |
//! | `/complete`                   | GET, POST  | `report_complete(None)`             |
//! | `/complete/{station}`         | GET, POST  | `report_complete(Some(station))`    |
//! | `/status`                     | GET        | `status`                            |
//!
//! Malformed parameters, bodies, and verbs are answered with 400.  Unknown
//! stations and out-of-range timesteps are 500; a shut-down barrier is 503.
//!
//! Blocking coverage requests run on Tokio's blocking pool, one thread per
//! parked station, so they never stall the non-blocking routes.  The pool
//! must hold the whole fleet at once: serve from a runtime built by
//! [`runtime`], which sizes it with [`blocking_threads`].  Under Tokio's
//! default pool of 512 threads, a fleet larger than that deadlocks on its
//! first round.

pub mod error;
pub mod routes;
pub mod serve;


pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use serve::{
    BLOCKING_HEADROOM, CompletionSignal, SimulationDone, blocking_threads, completion_signal, runtime,
    serve,
};
