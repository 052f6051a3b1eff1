//! Backend identifiers and their static attributes.
//!
//! The set of serving backends is closed: one free local endpoint plus a
//! small and a large model on each of two remote providers. Using an enum
//! (rather than string keys) lets the rate card and the agents treat an
//! unknown backend as a type error instead of a runtime sentinel.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A serving backend the router can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Free local backend (price 0/0)
    Local,
    /// Provider A, small model
    RemoteSmallA,
    /// Provider A, large model
    RemoteLargeA,
    /// Provider B, small model
    RemoteSmallB,
    /// Provider B, large model
    RemoteLargeB,
}

/// Which adapter serves a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Local,
    A,
    B,
}

/// Relative capability tier, used to match backends to task complexity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    Cheap,
    Mid,
    Strong,
}

impl Backend {
    /// All backends, in no particular order.
    pub const ALL: [Backend; 5] = [
        Backend::Local,
        Backend::RemoteSmallA,
        Backend::RemoteLargeA,
        Backend::RemoteSmallB,
        Backend::RemoteLargeB,
    ];

    pub fn provider(self) -> Provider {
        match self {
            Backend::Local => Provider::Local,
            Backend::RemoteSmallA | Backend::RemoteLargeA => Provider::A,
            Backend::RemoteSmallB | Backend::RemoteLargeB => Provider::B,
        }
    }

    pub fn strength(self) -> Strength {
        match self {
            Backend::Local => Strength::Cheap,
            Backend::RemoteSmallA | Backend::RemoteSmallB => Strength::Mid,
            Backend::RemoteLargeA | Backend::RemoteLargeB => Strength::Strong,
        }
    }

    pub fn is_local(self) -> bool {
        matches!(self, Backend::Local)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Backend::Local => "local",
            Backend::RemoteSmallA => "remote-small-a",
            Backend::RemoteLargeA => "remote-large-a",
            Backend::RemoteSmallB => "remote-small-b",
            Backend::RemoteLargeB => "remote-large-b",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Backend::Local),
            "remote-small-a" => Ok(Backend::RemoteSmallA),
            "remote-large-a" => Ok(Backend::RemoteLargeA),
            "remote-small-b" => Ok(Backend::RemoteSmallB),
            "remote-large-b" => Ok(Backend::RemoteLargeB),
            _ => Err(format!("Unknown backend: {}", s)),
        }
    }
}
