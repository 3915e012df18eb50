//! A CPU scheduling simulator library.
//!
//! This library models a fixed set of processes, each with a predetermined
//! sequence of alternating cpu and i/o bursts, and simulates how a dispatch
//! policy moves them through the new, ready, running, waiting and terminated
//! states over discrete time units.
//!
//! ```
//! use scheduler::{run_policy, NullSink, PolicyKind, SimulationConfig, Workload};
//!
//! let workload = Workload::from_bursts([vec![3], vec![2]]);
//! let outcome = run_policy(
//!     PolicyKind::Fcfs,
//!     &workload,
//!     &SimulationConfig::default(),
//!     &mut NullSink,
//! )
//! .unwrap();
//! assert_eq!(outcome.report().total_ticks, 5);
//! ```

mod schedulers;
pub use schedulers::{Fcfs, MultiLevelFeedback, ShortestJobFirst};

mod scheduler;
pub use crate::scheduler::{ProcessState, Scheduler, SchedulingDecision, StopReason, Transition};

mod common_types;
pub use crate::common_types::{Pid, Timestamp};

mod collector;
pub use crate::collector::{collect_all, collect_ready_levels, Collector};

mod process_control_block;
pub use process_control_block::{BurstKind, ProcessControlBlock};

mod process_manager;
pub use crate::process_manager::{ProcessManager, RunningSlot};

pub mod queue;
pub use crate::queue::ProcessQueue;

mod common_funcs;
pub use common_funcs::{account_tick, complete_cpu_burst, complete_io_bursts, TickUsage};

pub mod config;
pub use crate::config::{MlfqConfig, PolicyKind, SimulationConfig};

pub mod error;
pub use crate::error::{SchedError, WorkloadDefect};

pub mod report;
pub use crate::report::{
    Averages, FinalReport, NullSink, ProcessStats, RecordingSink, ReportSink, TickEvent,
    TransitionRecord,
};

pub mod simulation;
pub use crate::simulation::{DriverState, RunOutcome, Simulation};

pub mod workload;
pub use crate::workload::{ProcessSpec, Workload};

/// Returns a first come, first served policy
pub fn fcfs() -> impl Scheduler {
    Fcfs::new()
}

/// Returns a non-preemptive shortest job first policy
pub fn sjf() -> impl Scheduler {
    ShortestJobFirst::new()
}

/// Returns a multi-level feedback queue policy
///
/// * `config` - quanta of the round robin levels and the unblock behaviour
pub fn mlfq(config: MlfqConfig) -> impl Scheduler {
    MultiLevelFeedback::new(config)
}

/// Returns the policy selected by `kind`
///
/// * `kind` - which policy to build
/// * `config` - policy settings; only MLFQ reads them
pub fn policy(kind: PolicyKind, config: &SimulationConfig) -> Box<dyn Scheduler + Send> {
    match kind {
        PolicyKind::Fcfs => Box::new(fcfs()),
        PolicyKind::Sjf => Box::new(sjf()),
        PolicyKind::Mlfq => Box::new(mlfq(config.mlfq.clone())),
    }
}

/// Runs `workload` under the policy selected by `kind`
pub fn run_policy(
    kind: PolicyKind,
    workload: &Workload,
    config: &SimulationConfig,
    sink: &mut dyn ReportSink,
) -> Result<RunOutcome, SchedError> {
    let simulation = Simulation::new(workload, policy(kind, config), config.clone())?;
    simulation.run(sink)
}
