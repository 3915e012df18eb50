use crate::{ProcessManager, Scheduler, SchedulingDecision};

/// First come, first served
///
/// Always runs the head of the ready queue, which is the process that has
/// been ready the longest. Never preempts.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fcfs;

impl Fcfs {
    pub fn new() -> Fcfs {
        Fcfs
    }
}

impl Scheduler for Fcfs {
    fn name(&self) -> &'static str {
        "FCFS"
    }

    fn next(&mut self, processes: &ProcessManager) -> SchedulingDecision {
        match processes.ready().front() {
            Some(pid) => SchedulingDecision::Run {
                pid,
                timeslice: None,
            },
            None => SchedulingDecision::Idle,
        }
    }
}
