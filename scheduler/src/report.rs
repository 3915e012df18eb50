//! Records emitted by a simulation run and the sink that receives them.
//!
//! The core only produces structured records; turning them into text is up to
//! the sink.

use serde::{Deserialize, Serialize};

use crate::{Pid, ProcessControlBlock, ProcessManager, Timestamp, Transition};

/// A transition applied to a process during a tick
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub pid: Pid,
    pub transition: Transition,
}

impl TransitionRecord {
    pub fn new(pid: Pid, transition: Transition) -> TransitionRecord {
        TransitionRecord { pid, transition }
    }
}

/// What happened during one tick, as seen after the dispatch decision
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvent {
    pub tick: Timestamp,
    /// Process dispatched during this tick
    pub dispatched: Option<Pid>,
    /// Process holding the CPU for this tick
    pub running: Option<Pid>,
    /// Ready processes per priority level, highest first
    pub ready: Vec<Vec<Pid>>,
    pub waiting: Vec<Pid>,
    pub terminated: Vec<Pid>,
    /// Transitions applied during this tick, in order
    pub transitions: Vec<TransitionRecord>,
}

/// Final figures of one process
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStats {
    pub pid: Pid,
    pub waiting_time: usize,
    pub cpu_time: usize,
    pub io_time: usize,
    /// waiting + cpu + io
    pub turnaround: usize,
    /// Tick of the first dispatch
    pub response_time: Option<usize>,
    pub termination_time: Option<usize>,
}

impl From<&ProcessControlBlock> for ProcessStats {
    fn from(pcb: &ProcessControlBlock) -> Self {
        ProcessStats {
            pid: pcb.pid(),
            waiting_time: pcb.waiting_time(),
            cpu_time: pcb.cpu_time(),
            io_time: pcb.io_time(),
            turnaround: pcb.turnaround(),
            response_time: pcb.response_time().map(|t| t.get()),
            termination_time: pcb.termination_time().map(|t| t.get()),
        }
    }
}

/// Arithmetic means across processes
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    pub waiting_time: f64,
    pub turnaround: f64,
    /// Mean over the processes that were dispatched at least once
    pub response_time: f64,
}

impl Averages {
    pub fn of(stats: &[ProcessStats]) -> Averages {
        Averages {
            waiting_time: mean(stats.iter().map(|s| s.waiting_time)),
            turnaround: mean(stats.iter().map(|s| s.turnaround)),
            response_time: mean(stats.iter().filter_map(|s| s.response_time)),
        }
    }
}

fn mean(values: impl Iterator<Item = usize>) -> f64 {
    let (sum, count) = values.fold((0usize, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// `100 * (1 - idle / total)`, or 0 for a run without ticks
pub fn cpu_utilization(idle_ticks: usize, total_ticks: usize) -> f64 {
    if total_ticks == 0 {
        return 0.0;
    }
    100.0 * (1.0 - idle_ticks as f64 / total_ticks as f64)
}

/// Statistics of a whole run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    pub policy: String,
    /// False when the run stopped at the safety horizon
    pub complete: bool,
    pub total_ticks: usize,
    pub idle_ticks: usize,
    pub cpu_utilization: f64,
    /// Per-process figures, in workload order
    pub processes: Vec<ProcessStats>,
    pub averages: Averages,
    pub termination_order: Vec<Pid>,
}

impl FinalReport {
    pub fn build(
        policy: &str,
        processes: &ProcessManager,
        total_ticks: usize,
        idle_ticks: usize,
        complete: bool,
    ) -> FinalReport {
        let stats: Vec<ProcessStats> = processes.processes().map(ProcessStats::from).collect();

        FinalReport {
            policy: policy.to_owned(),
            complete,
            total_ticks,
            idle_ticks,
            cpu_utilization: cpu_utilization(idle_ticks, total_ticks),
            averages: Averages::of(&stats),
            processes: stats,
            termination_order: processes.terminated().to_vec(),
        }
    }

    pub fn process(&self, pid: Pid) -> Option<&ProcessStats> {
        self.processes.iter().find(|stats| stats.pid == pid)
    }
}

/// Receives the records of a run
pub trait ReportSink {
    /// Called once per simulated tick
    fn tick(&mut self, event: &TickEvent);

    /// Called once when the run ends, complete or not
    fn finish(&mut self, report: &FinalReport);
}

/// Discards everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn tick(&mut self, _event: &TickEvent) {}

    fn finish(&mut self, _report: &FinalReport) {}
}

/// Keeps every record in memory
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub ticks: Vec<TickEvent>,
    pub report: Option<FinalReport>,
}

impl RecordingSink {
    pub fn new() -> RecordingSink {
        RecordingSink::default()
    }

    /// Pids in the order they were dispatched
    pub fn dispatch_order(&self) -> Vec<Pid> {
        self.ticks.iter().filter_map(|event| event.dispatched).collect()
    }
}

impl ReportSink for RecordingSink {
    fn tick(&mut self, event: &TickEvent) {
        self.ticks.push(event.clone());
    }

    fn finish(&mut self, report: &FinalReport) {
        self.report = Some(report.clone());
    }
}
