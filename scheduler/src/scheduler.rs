use std::fmt;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::{Pid, ProcessManager};

/// The state of a process
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessState {
    New,
    Ready,
    Running,
    Waiting,
    Terminated,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessState::New => "new",
            ProcessState::Ready => "ready",
            ProcessState::Running => "running",
            ProcessState::Waiting => "waiting",
            ProcessState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// A move between two process states
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transition {
    /// New -> Ready
    Admit,
    /// Ready -> Running
    Dispatch,
    /// Running -> Waiting
    Block,
    /// Waiting -> Ready
    Unblock,
    /// Running -> Terminated
    Terminate,
    /// Running -> Ready, before the burst completed
    Preempt,
}

impl Transition {
    /// The state a process must be in for this transition to be legal
    pub fn from_state(&self) -> ProcessState {
        match self {
            Transition::Admit => ProcessState::New,
            Transition::Dispatch => ProcessState::Ready,
            Transition::Block | Transition::Terminate | Transition::Preempt => {
                ProcessState::Running
            }
            Transition::Unblock => ProcessState::Waiting,
        }
    }

    /// The state a process is in after this transition
    pub fn to_state(&self) -> ProcessState {
        match self {
            Transition::Admit | Transition::Unblock | Transition::Preempt => ProcessState::Ready,
            Transition::Dispatch => ProcessState::Running,
            Transition::Block => ProcessState::Waiting,
            Transition::Terminate => ProcessState::Terminated,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Transition::Admit => "admit",
            Transition::Dispatch => "dispatch",
            Transition::Block => "block",
            Transition::Unblock => "unblock",
            Transition::Terminate => "terminate",
            Transition::Preempt => "preempt",
        };
        f.write_str(name)
    }
}

/// What the policy wants the CPU to do next
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulingDecision {
    /// Run the process with `pid`. A `timeslice` of `None` lets it keep the
    /// CPU until its current burst completes.
    Run {
        pid: Pid,
        timeslice: Option<NonZeroUsize>,
    },
    /// Nothing is ready; the CPU stays idle for this tick.
    Idle,
}

/// Why the running process left the CPU
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The CPU burst completed and an I/O burst follows.
    Io,
    /// The last CPU burst completed.
    Exit,
    /// The timeslice ran out before the burst completed.
    Expired,
}

/// A dispatch policy.
///
/// The driver calls `next` once per tick, only while the CPU is idle and at
/// least one process is ready. Policies never mutate the process table
/// themselves; they see it read-only and answer with a decision. The
/// notification hooks let a policy keep private bookkeeping such as priority
/// levels.
pub trait Scheduler {
    /// Short name used in traces and reports
    fn name(&self) -> &'static str;

    /// Selects the ready process that should run next
    ///
    /// * `processes` - the process table, as seen at the dispatch point
    fn next(&mut self, processes: &ProcessManager) -> SchedulingDecision;

    /// Called once for every process admitted to the ready queue
    fn admit(&mut self, _pid: Pid) {}

    /// Called when a process returns to the ready queue after its I/O burst
    fn wake(&mut self, _pid: Pid) {}

    /// Called when the running process leaves the CPU
    ///
    /// * `pid` - the process that stopped
    /// * `reason` - why it stopped
    fn stop(&mut self, _pid: Pid, _reason: StopReason) {}

    /// Groups the ready queue by priority level, highest priority first
    ///
    /// * `ready` - ready pids in queue order
    fn ready_levels(&self, ready: &[Pid]) -> Vec<Vec<Pid>> {
        vec![ready.to_vec()]
    }
}

impl<S: Scheduler + ?Sized> Scheduler for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn next(&mut self, processes: &ProcessManager) -> SchedulingDecision {
        (**self).next(processes)
    }

    fn admit(&mut self, pid: Pid) {
        (**self).admit(pid)
    }

    fn wake(&mut self, pid: Pid) {
        (**self).wake(pid)
    }

    fn stop(&mut self, pid: Pid, reason: StopReason) {
        (**self).stop(pid, reason)
    }

    fn ready_levels(&self, ready: &[Pid]) -> Vec<Vec<Pid>> {
        (**self).ready_levels(ready)
    }
}
