use crate::{Pid, ProcessManager, Scheduler};

pub trait Collector {
    // Returns the running process, if any
    fn collect_running(&self) -> Vec<Pid>;

    // Returns the ready processes in queue order
    fn collect_ready(&self) -> Vec<Pid>;

    // Returns the processes doing i/o
    fn collect_waiting(&self) -> Vec<Pid>;

    // Returns the finished processes in termination order
    fn collect_terminated(&self) -> Vec<Pid>;
}

impl Collector for ProcessManager {
    fn collect_running(&self) -> Vec<Pid> {
        self.running().into_iter().collect()
    }

    fn collect_ready(&self) -> Vec<Pid> {
        self.ready().to_vec()
    }

    fn collect_waiting(&self) -> Vec<Pid> {
        self.waiting().to_vec()
    }

    fn collect_terminated(&self) -> Vec<Pid> {
        self.terminated().to_vec()
    }
}

/// Every live process: running first, then ready, then waiting
pub fn collect_all(processes: &dyn Collector) -> Vec<Pid> {
    let mut procs: Vec<Pid> = Vec::new();

    procs.extend(processes.collect_running());
    procs.extend(processes.collect_ready());
    procs.extend(processes.collect_waiting());

    procs
}

/// Ready processes grouped by the priority levels of `scheduler`
pub fn collect_ready_levels(processes: &dyn Collector, scheduler: &dyn Scheduler) -> Vec<Vec<Pid>> {
    scheduler.ready_levels(&processes.collect_ready())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Timestamp, Workload};

    #[test]
    fn collects_live_processes_by_state() {
        let workload = Workload::from_bursts([vec![1, 1, 1], vec![2], vec![3]]);
        let mut procs = ProcessManager::new(&workload);
        for spec in workload.iter() {
            procs.admit(spec.pid).unwrap();
        }
        procs.dispatch(Pid::new(1), Timestamp::new(0), None).unwrap();
        procs.pcb_mut(Pid::new(1)).unwrap().cpu_tick();
        procs.block(Pid::new(1)).unwrap();
        procs.dispatch(Pid::new(3), Timestamp::new(1), None).unwrap();

        assert_eq!(procs.collect_running(), vec![Pid::new(3)]);
        assert_eq!(procs.collect_ready(), vec![Pid::new(2)]);
        assert_eq!(procs.collect_waiting(), vec![Pid::new(1)]);
        assert!(procs.collect_terminated().is_empty());
        assert_eq!(
            collect_all(&procs),
            vec![Pid::new(3), Pid::new(2), Pid::new(1)]
        );
    }
}
