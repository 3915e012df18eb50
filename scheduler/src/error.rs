//! Error kinds reported by the simulator core.

use std::fmt;

use crate::{Pid, ProcessState, Transition};

/// Reason a workload was rejected before the simulation started.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkloadDefect {
    /// The workload has no processes at all.
    Empty,
    /// Two entries share the same pid.
    DuplicatePid,
    /// The burst sequence has no entries.
    NoBursts,
    /// The burst sequence does not start and end with a CPU burst.
    EvenLength { len: usize },
    /// A burst of zero ticks at the given index.
    ZeroBurst { index: usize },
}

impl fmt::Display for WorkloadDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "workload contains no processes"),
            Self::DuplicatePid => write!(f, "pid appears more than once"),
            Self::NoBursts => write!(f, "burst sequence is empty"),
            Self::EvenLength { len } => write!(
                f,
                "burst sequence has {len} entries, expected an odd count (cpu, io, ..., cpu)"
            ),
            Self::ZeroBurst { index } => write!(f, "burst at index {index} lasts zero ticks"),
        }
    }
}

/// Errors returned by the simulator core.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchedError {
    /// Malformed workload; detected before the first tick.
    InvalidWorkload {
        pid: Option<Pid>,
        defect: WorkloadDefect,
    },
    /// Unrecognised policy selector.
    UnknownPolicy(String),
    /// A transition was attempted from the wrong state.
    StateViolation {
        pid: Pid,
        transition: Transition,
        state: ProcessState,
    },
    /// Dispatch attempted while another process holds the CPU.
    CpuBusy { pid: Pid, running: Pid },
    /// The pid is not part of the simulated workload.
    UnknownProcess(Pid),
    /// The burst cursor cannot move past the last burst.
    BurstSequenceExhausted(Pid),
    /// The burst at the cursor has not been fully served yet.
    BurstNotComplete {
        pid: Pid,
        served: usize,
        required: usize,
    },
    /// Termination requested while bursts are still left in the program.
    BurstsRemaining { pid: Pid, remaining: usize },
    /// The safety horizon was reached before every process terminated.
    UnboundedRun { horizon: usize },
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWorkload { pid: Some(pid), defect } => {
                write!(f, "invalid workload entry {pid}: {defect}")
            }
            Self::InvalidWorkload { pid: None, defect } => {
                write!(f, "invalid workload: {defect}")
            }
            Self::UnknownPolicy(name) => write!(
                f,
                "unknown scheduling policy `{name}` (valid policies: FCFS, SJF, MLFQ)"
            ),
            Self::StateViolation {
                pid,
                transition,
                state,
            } => write!(f, "{pid}: cannot {transition} while {state}"),
            Self::CpuBusy { pid, running } => {
                write!(f, "cannot dispatch {pid}: {running} is still running")
            }
            Self::UnknownProcess(pid) => write!(f, "no process with pid {pid}"),
            Self::BurstSequenceExhausted(pid) => {
                write!(f, "{pid}: no burst left to advance to")
            }
            Self::BurstNotComplete {
                pid,
                served,
                required,
            } => write!(f, "{pid}: burst served for {served} of {required} ticks"),
            Self::BurstsRemaining { pid, remaining } => {
                write!(f, "{pid}: cannot terminate with {remaining} bursts left")
            }
            Self::UnboundedRun { horizon } => {
                write!(f, "simulation did not complete within {horizon} ticks")
            }
        }
    }
}

impl std::error::Error for SchedError {}

pub type Result<T> = std::result::Result<T, SchedError>;
