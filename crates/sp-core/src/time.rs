//! Simulation time model.
//!
//! # Design
//!
//! The mobility traces are sampled at discrete, integer timesteps covering a
//! closed range `[0, max_ts]`.  Global progress is a single `Timestep` that
//! only moves forward, one step per barrier opening, starting at
//! [`Timestep::FIRST`] (the first timestep stations request).

use std::fmt;

// ── Timestep ─────────────────────────────────────────────────────────────────

/// An absolute simulation timestep.
///
/// Stored as `u64` so trace values never need narrowing, and so the ids in
/// request paths parse without a second range check.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Timestep(pub u64);

impl Timestep {
    pub const ZERO: Timestep = Timestep(0);

    /// The timestep every station requests first and the barrier starts at.
    pub const FIRST: Timestep = Timestep(1);

    /// The timestep immediately after `self`.
    #[inline]
    pub fn next(self) -> Timestep {
        Timestep(self.0 + 1)
    }

    /// Convert a trace timestamp to a `Timestep`.
    ///
    /// Traces store timesteps as JSON numbers, which may arrive as floats.
    /// Only finite, non-negative, integral values are accepted.
    pub fn from_trace_value(v: f64) -> Option<Timestep> {
        if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 {
            Some(Timestep(v as u64))
        } else {
            None
        }
    }
}

impl fmt::Display for Timestep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

impl From<u64> for Timestep {
    fn from(v: u64) -> Self {
        Timestep(v)
    }
}
