//! Agent identity value object
//!
//! The roster is fixed: one project manager and three interchangeable
//! workers. Identities key both session isolation and endpoint resolution,
//! so they are deliberately a closed enum rather than free-form strings.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One of the four agents in the roster.
///
/// Wire names are `pm`, `A`, `B`, `C` — the same identifiers the inbound
/// `target` field and the configuration file use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentIdentity {
    #[serde(rename = "pm")]
    Pm,
    #[serde(rename = "A")]
    WorkerA,
    #[serde(rename = "B")]
    WorkerB,
    #[serde(rename = "C")]
    WorkerC,
}

impl AgentIdentity {
    /// Wire/display name for this identity.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentIdentity::Pm => "pm",
            AgentIdentity::WorkerA => "A",
            AgentIdentity::WorkerB => "B",
            AgentIdentity::WorkerC => "C",
        }
    }

    /// The three worker identities, in roster order.
    pub fn workers() -> [AgentIdentity; 3] {
        [
            AgentIdentity::WorkerA,
            AgentIdentity::WorkerB,
            AgentIdentity::WorkerC,
        ]
    }

    /// All identities including the PM.
    pub fn all() -> [AgentIdentity; 4] {
        [
            AgentIdentity::Pm,
            AgentIdentity::WorkerA,
            AgentIdentity::WorkerB,
            AgentIdentity::WorkerC,
        ]
    }

    pub fn is_worker(&self) -> bool {
        !matches!(self, AgentIdentity::Pm)
    }
}

impl std::fmt::Display for AgentIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgentIdentity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pm" | "PM" | "Pm" => Ok(AgentIdentity::Pm),
            "A" | "a" => Ok(AgentIdentity::WorkerA),
            "B" | "b" => Ok(AgentIdentity::WorkerB),
            "C" | "c" => Ok(AgentIdentity::WorkerC),
            other => Err(DomainError::UnknownAgent(other.to_string())),
        }
    }
}
