//! The tick-driven simulation loop.
//!
//! Every tick runs the same fixed sequence:
//!
//! 1. processes whose i/o burst is done go back to ready
//! 2. the running process leaves the CPU if its burst is done (or its
//!    timeslice ran out)
//! 3. if the CPU is free, the policy picks a ready process
//! 4. if nothing is ready, running or waiting any more the run is complete
//! 5. otherwise every live process is charged one tick and the clock advances
//!
//! The tick that detects completion is not charged, so `total_ticks` equals
//! the termination time of the last process.

use log::{info, trace, warn};

use crate::collector::{collect_all, collect_ready_levels, Collector};
use crate::common_funcs::{account_tick, complete_cpu_burst, complete_io_bursts};
use crate::config::SimulationConfig;
use crate::error::{Result, SchedError};
use crate::report::{FinalReport, ReportSink, TickEvent, TransitionRecord};
use crate::workload::Workload;
use crate::{Pid, ProcessManager, Scheduler, SchedulingDecision, Timestamp, Transition};

/// State of the driver over a whole run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    /// Ticks remain and some process is still alive
    Active,
    /// Ready, running and waiting are all empty
    Complete,
}

/// How a run ended
#[derive(Clone, Debug, PartialEq)]
pub enum RunOutcome {
    Complete(FinalReport),
    /// The safety horizon was reached first; the report is partial
    Unbounded { report: FinalReport, horizon: usize },
}

impl RunOutcome {
    pub fn report(&self) -> &FinalReport {
        match self {
            RunOutcome::Complete(report) => report,
            RunOutcome::Unbounded { report, .. } => report,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, RunOutcome::Complete(_))
    }

    /// Treats an unbounded run as an error
    pub fn into_result(self) -> Result<FinalReport> {
        match self {
            RunOutcome::Complete(report) => Ok(report),
            RunOutcome::Unbounded { horizon, .. } => Err(SchedError::UnboundedRun { horizon }),
        }
    }
}

/// One simulation run: a workload, a policy and the state they evolve
pub struct Simulation<S: Scheduler> {
    processes: ProcessManager,
    scheduler: S,
    config: SimulationConfig,
    clock: Timestamp,
    idle_ticks: usize,
    state: DriverState,
}

impl<S: Scheduler> Simulation<S> {
    /// Validates `workload` and admits every process to the ready queue
    ///
    /// * `workload` - processes in admission order
    /// * `scheduler` - the dispatch policy
    /// * `config` - horizon and policy settings
    pub fn new(workload: &Workload, mut scheduler: S, config: SimulationConfig) -> Result<Self> {
        workload.validate()?;

        let mut processes = ProcessManager::new(workload);
        for spec in workload.iter() {
            processes.admit(spec.pid)?;
            scheduler.admit(spec.pid);
        }

        Ok(Simulation {
            processes,
            scheduler,
            config,
            clock: Timestamp::new(0),
            idle_ticks: 0,
            state: DriverState::Active,
        })
    }

    pub fn processes(&self) -> &ProcessManager {
        &self.processes
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn clock(&self) -> Timestamp {
        self.clock
    }

    pub fn idle_ticks(&self) -> usize {
        self.idle_ticks
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Runs until every process terminated or the horizon is reached
    pub fn run(mut self, sink: &mut dyn ReportSink) -> Result<RunOutcome> {
        let horizon = self.config.horizon;
        info!(
            "{}: simulating {} processes (horizon {horizon})",
            self.scheduler.name(),
            self.processes.processes().count()
        );

        while self.clock.get() < horizon {
            if self.step(sink)? == DriverState::Complete {
                return Ok(self.finish(sink));
            }
        }

        // the last process may finish exactly on the horizon; nothing is
        // dispatched for a tick that will not be simulated
        if self.settle(sink, false)? == DriverState::Complete {
            return Ok(self.finish(sink));
        }

        let report = self.report();
        let alive: Vec<String> = collect_all(&self.processes)
            .iter()
            .map(Pid::to_string)
            .collect();
        warn!(
            "{}: no completion after {horizon} ticks, still alive: {}",
            report.policy,
            alive.join(" ")
        );
        sink.finish(&report);
        Ok(RunOutcome::Unbounded { report, horizon })
    }

    /// Simulates one tick
    pub fn step(&mut self, sink: &mut dyn ReportSink) -> Result<DriverState> {
        if self.settle(sink, true)? == DriverState::Complete {
            return Ok(DriverState::Complete);
        }

        let usage = account_tick(&mut self.processes)?;
        if !usage.busy {
            self.idle_ticks += 1;
        }
        trace!(
            "tick {}: cpu {}, {} ready, {} in i/o",
            self.clock,
            if usage.busy { "busy" } else { "idle" },
            usage.waited,
            usage.in_io
        );

        self.clock = self.clock + 1;
        Ok(DriverState::Active)
    }

    /// Statistics as of now
    pub fn report(&self) -> FinalReport {
        FinalReport::build(
            self.scheduler.name(),
            &self.processes,
            self.clock.get(),
            self.idle_ticks,
            self.state == DriverState::Complete,
        )
    }

    /// Applies the transitions of the current tick and reports them
    ///
    /// * `dispatch` - whether the policy may fill an idle CPU
    fn settle(&mut self, sink: &mut dyn ReportSink, dispatch: bool) -> Result<DriverState> {
        if self.state == DriverState::Complete {
            return Ok(DriverState::Complete);
        }

        let now = self.clock;
        let mut transitions = complete_io_bursts(&mut self.processes, &mut self.scheduler)?;
        transitions.extend(complete_cpu_burst(
            &mut self.processes,
            &mut self.scheduler,
            now,
        )?);

        let dispatched = if dispatch { self.dispatch(now)? } else { None };
        if let Some(pid) = dispatched {
            transitions.push(TransitionRecord::new(pid, Transition::Dispatch));
        }

        sink.tick(&TickEvent {
            tick: now,
            dispatched,
            running: self.processes.running(),
            ready: collect_ready_levels(&self.processes, &self.scheduler),
            waiting: self.processes.collect_waiting(),
            terminated: self.processes.collect_terminated(),
            transitions,
        });

        if self.processes.is_complete() {
            self.state = DriverState::Complete;
        }
        Ok(self.state)
    }

    fn dispatch(&mut self, now: Timestamp) -> Result<Option<Pid>> {
        if self.processes.has_running_process() || !self.processes.has_ready_processes() {
            return Ok(None);
        }

        match self.scheduler.next(&self.processes) {
            SchedulingDecision::Run { pid, timeslice } => {
                self.processes.dispatch(pid, now, timeslice)?;
                Ok(Some(pid))
            }
            SchedulingDecision::Idle => Ok(None),
        }
    }

    fn finish(self, sink: &mut dyn ReportSink) -> RunOutcome {
        let report = self.report();
        info!(
            "{}: complete after {} ticks, cpu utilization {:.2}%",
            report.policy, report.total_ticks, report.cpu_utilization
        );
        sink.finish(&report);
        RunOutcome::Complete(report)
    }
}
