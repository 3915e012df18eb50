use crate::{ProcessManager, Scheduler, SchedulingDecision};

/// Non-preemptive shortest job first
///
/// Picks the ready process with the shortest upcoming cpu burst. Ties go to
/// the process closest to the head of the ready queue. The chosen process
/// keeps the CPU until its burst completes.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShortestJobFirst;

impl ShortestJobFirst {
    pub fn new() -> ShortestJobFirst {
        ShortestJobFirst
    }
}

impl Scheduler for ShortestJobFirst {
    fn name(&self) -> &'static str {
        "SJF"
    }

    fn next(&mut self, processes: &ProcessManager) -> SchedulingDecision {
        // min_by_key keeps the first of equal elements
        let shortest = processes
            .ready()
            .iter()
            .filter_map(|pid| processes.process(pid))
            .min_by_key(|pcb| pcb.upcoming_cpu_burst());

        match shortest {
            Some(pcb) => SchedulingDecision::Run {
                pid: pcb.pid(),
                timeslice: None,
            },
            None => SchedulingDecision::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Pid, Workload};

    fn ready(programs: Vec<Vec<usize>>) -> ProcessManager {
        let workload = Workload::from_bursts(programs);
        let mut procs = ProcessManager::new(&workload);
        for spec in workload.iter() {
            procs.admit(spec.pid).unwrap();
        }
        procs
    }

    fn chosen(procs: &ProcessManager) -> Pid {
        match ShortestJobFirst::new().next(procs) {
            SchedulingDecision::Run { pid, timeslice } => {
                assert_eq!(timeslice, None);
                pid
            }
            SchedulingDecision::Idle => panic!("nothing chosen"),
        }
    }

    #[test]
    fn picks_the_shortest_next_burst() {
        let procs = ready(vec![vec![10], vec![2], vec![7]]);
        assert_eq!(chosen(&procs), Pid::new(2));
    }

    #[test]
    fn ties_go_to_the_earliest_admitted() {
        let procs = ready(vec![vec![6], vec![3, 1, 1], vec![3]]);
        assert_eq!(chosen(&procs), Pid::new(2));
    }

    #[test]
    fn only_the_next_burst_counts() {
        let procs = ready(vec![vec![4, 1, 1], vec![5]]);
        assert_eq!(chosen(&procs), Pid::new(1));
    }
}
