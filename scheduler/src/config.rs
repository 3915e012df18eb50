//! Run configuration and policy selection.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SchedError;

/// Default safety horizon, in ticks
pub const DEFAULT_HORIZON: usize = 100_000;

/// Quanta of the two round-robin MLFQ levels; the last level runs to completion
pub const DEFAULT_MLFQ_QUANTA: [usize; 2] = [5, 10];

/// The dispatch policies the simulator knows about
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    Fcfs,
    Sjf,
    Mlfq,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 3] = [PolicyKind::Fcfs, PolicyKind::Sjf, PolicyKind::Mlfq];

    pub fn name(&self) -> &'static str {
        match self {
            PolicyKind::Fcfs => "FCFS",
            PolicyKind::Sjf => "SJF",
            PolicyKind::Mlfq => "MLFQ",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PolicyKind {
    type Err = SchedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FCFS" => Ok(PolicyKind::Fcfs),
            "SJF" => Ok(PolicyKind::Sjf),
            "MLFQ" => Ok(PolicyKind::Mlfq),
            _ => Err(SchedError::UnknownPolicy(s.to_owned())),
        }
    }
}

/// Multi-level feedback queue settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlfqConfig {
    /// Quantum of each round-robin level, highest priority first. One more
    /// level without a quantum is always added at the bottom.
    pub quanta: Vec<NonZeroUsize>,
    /// Send a process back to the top level when its I/O burst completes
    pub reset_on_unblock: bool,
}

impl MlfqConfig {
    /// Number of priority levels, the run-to-completion level included
    pub fn levels(&self) -> usize {
        self.quanta.len() + 1
    }

    /// Quantum of `level`, `None` for the bottom level
    pub fn quantum(&self, level: usize) -> Option<NonZeroUsize> {
        self.quanta.get(level).copied()
    }
}

impl Default for MlfqConfig {
    fn default() -> Self {
        MlfqConfig {
            quanta: DEFAULT_MLFQ_QUANTA
                .iter()
                .filter_map(|quantum| NonZeroUsize::new(*quantum))
                .collect(),
            reset_on_unblock: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Ticks after which a run that has not completed is abandoned
    pub horizon: usize,
    pub mlfq: MlfqConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            horizon: DEFAULT_HORIZON,
            mlfq: MlfqConfig::default(),
        }
    }
}
