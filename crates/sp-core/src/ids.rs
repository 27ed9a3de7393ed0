//! Strongly typed string identifier wrappers.
//!
//! Trace files name stations, nodes and segments with free-form strings
//! (`"tower_3"`, `"veh12"`, `"-4521#0"`).  Wrapping them keeps a `NodeId`
//! from ever being passed where a `SegmentId` is expected.  All IDs are
//! `Ord + Hash` so they can be used as map keys and sorted without ceremony.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use crate::SpError;

/// Generate a typed ID wrapper around an owned string.
macro_rules! string_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        $vis struct $name(String);

        impl $name {
            /// Wrap any string-like value.  No validation is applied; use
            /// [`FromStr`] when the value comes from an untrusted source.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = SpError;

            /// Rejects empty and whitespace-only ids.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.trim().is_empty() {
                    return Err(SpError::InvalidId {
                        kind: stringify!($name),
                        raw:  s.to_owned(),
                    });
                }
                Ok(Self(s.to_owned()))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// A fixed-location station (a "tower" in the trace files).
    pub struct StationId;
}

string_id! {
    /// A mobile node (a "vehicle" in the trace files).
    pub struct NodeId;
}

string_id! {
    /// A unit of route data a node accumulates as it travels.
    pub struct SegmentId;
}

impl StationId {
    /// The conventional id of the station at fleet index `idx`.
    pub fn from_index(idx: usize) -> Self {
        Self(format!("tower_{idx}"))
    }
}
