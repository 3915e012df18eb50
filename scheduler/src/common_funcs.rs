use crate::error::Result;
use crate::report::TransitionRecord;
use crate::{Pid, ProcessManager, Scheduler, StopReason, Timestamp, Transition};

/// Moves every waiting process whose i/o burst is done back to ready
///
/// Processes are handled in waiting-queue order, so they reach the ready
/// queue in the order they started their i/o.
pub fn complete_io_bursts(
    processes: &mut ProcessManager,
    scheduler: &mut dyn Scheduler,
) -> Result<Vec<TransitionRecord>> {
    let done: Vec<Pid> = processes
        .waiting()
        .iter()
        .filter(|pid| processes.process(*pid).is_some_and(|pcb| pcb.burst_done()))
        .collect();

    let mut records = Vec::with_capacity(done.len());
    for pid in done {
        processes.unblock(pid)?;
        scheduler.wake(pid);
        records.push(TransitionRecord::new(pid, Transition::Unblock));
    }

    Ok(records)
}

/// Takes the running process off the CPU if its burst is done or its
/// timeslice ran out
///
/// * `now` - the current tick, used as termination time
pub fn complete_cpu_burst(
    processes: &mut ProcessManager,
    scheduler: &mut dyn Scheduler,
    now: Timestamp,
) -> Result<Option<TransitionRecord>> {
    let Some(slot) = processes.running_slot() else {
        return Ok(None);
    };
    let pid = slot.pid;
    let (done, last) = match processes.process(pid) {
        Some(pcb) => (pcb.burst_done(), pcb.on_last_burst()),
        None => return Ok(None),
    };

    let transition = if done && last {
        processes.terminate(pid, now)?;
        scheduler.stop(pid, StopReason::Exit);
        Transition::Terminate
    } else if done {
        processes.block(pid)?;
        scheduler.stop(pid, StopReason::Io);
        Transition::Block
    } else if slot.expired() {
        processes.preempt(pid)?;
        scheduler.stop(pid, StopReason::Expired);
        Transition::Preempt
    } else {
        return Ok(None);
    };

    Ok(Some(TransitionRecord::new(pid, transition)))
}

/// Time units handed out during one tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickUsage {
    pub waited: usize,
    pub busy: bool,
    pub in_io: usize,
}

/// Charges one tick to every live process
///
/// Ready processes accumulate waiting time, the running process cpu time and
/// waiting processes i/o time.
pub fn account_tick(processes: &mut ProcessManager) -> Result<TickUsage> {
    let ready = processes.ready().to_vec();
    let waiting = processes.waiting().to_vec();
    let running = processes.running();

    for pid in &ready {
        processes.pcb_mut(*pid)?.wait_tick();
    }

    for pid in &waiting {
        processes.pcb_mut(*pid)?.io_tick();
    }

    if let Some(pid) = running {
        processes.pcb_mut(pid)?.cpu_tick();
        processes.tick_running_slice();
    }

    Ok(TickUsage {
        waited: ready.len(),
        busy: running.is_some(),
        in_io: waiting.len(),
    })
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::schedulers::Fcfs;
    use crate::{ProcessState, Workload};

    fn setup(programs: Vec<Vec<usize>>) -> ProcessManager {
        let workload = Workload::from_bursts(programs);
        let mut procs = ProcessManager::new(&workload);
        for spec in workload.iter() {
            procs.admit(spec.pid).unwrap();
        }
        procs
    }

    #[test]
    fn accounting_charges_each_queue() {
        let mut procs = setup(vec![vec![2, 3, 1], vec![4], vec![1]]);
        procs.dispatch(Pid::new(1), Timestamp::new(0), None).unwrap();

        let usage = account_tick(&mut procs).unwrap();
        assert_eq!(
            usage,
            TickUsage {
                waited: 2,
                busy: true,
                in_io: 0
            }
        );
        assert_eq!(procs.process(Pid::new(1)).unwrap().timings(), (0, 1, 0));
        assert_eq!(procs.process(Pid::new(2)).unwrap().timings(), (1, 0, 0));
        assert_eq!(procs.running_slot().unwrap().slice_elapsed, 1);
    }

    #[test]
    fn finished_cpu_burst_blocks_then_io_unblocks() {
        let mut sched = Fcfs::new();
        let mut procs = setup(vec![vec![1, 2, 1]]);
        procs.dispatch(Pid::new(1), Timestamp::new(0), None).unwrap();
        account_tick(&mut procs).unwrap();

        let record = complete_cpu_burst(&mut procs, &mut sched, Timestamp::new(1)).unwrap();
        assert_eq!(
            record,
            Some(TransitionRecord::new(Pid::new(1), Transition::Block))
        );
        assert_eq!(procs.process(Pid::new(1)).unwrap().burst_cursor(), Some(1));

        account_tick(&mut procs).unwrap();
        assert!(complete_io_bursts(&mut procs, &mut sched).unwrap().is_empty());
        account_tick(&mut procs).unwrap();

        let records = complete_io_bursts(&mut procs, &mut sched).unwrap();
        assert_eq!(
            records,
            vec![TransitionRecord::new(Pid::new(1), Transition::Unblock)]
        );
        let pcb = procs.process(Pid::new(1)).unwrap();
        assert_eq!(pcb.state(), ProcessState::Ready);
        assert_eq!(pcb.burst_cursor(), Some(2));
        assert_eq!(pcb.io_time(), 2);
    }

    #[test]
    fn last_burst_terminates() {
        let mut sched = Fcfs::new();
        let mut procs = setup(vec![vec![1]]);
        procs.dispatch(Pid::new(1), Timestamp::new(0), None).unwrap();
        account_tick(&mut procs).unwrap();

        complete_cpu_burst(&mut procs, &mut sched, Timestamp::new(1)).unwrap();
        let pcb = procs.process(Pid::new(1)).unwrap();
        assert_eq!(pcb.state(), ProcessState::Terminated);
        assert_eq!(pcb.termination_time(), Some(Timestamp::new(1)));
        assert!(procs.is_complete());
    }

    #[test]
    fn expired_slice_preempts_unfinished_burst() {
        let mut sched = Fcfs::new();
        let mut procs = setup(vec![vec![5], vec![1]]);
        procs
            .dispatch(Pid::new(1), Timestamp::new(0), NonZeroUsize::new(2))
            .unwrap();
        account_tick(&mut procs).unwrap();
        assert_eq!(
            complete_cpu_burst(&mut procs, &mut sched, Timestamp::new(1)).unwrap(),
            None
        );
        account_tick(&mut procs).unwrap();

        let record = complete_cpu_burst(&mut procs, &mut sched, Timestamp::new(2)).unwrap();
        assert_eq!(
            record,
            Some(TransitionRecord::new(Pid::new(1), Transition::Preempt))
        );
        assert_eq!(procs.ready().to_vec(), vec![Pid::new(2), Pid::new(1)]);
        assert_eq!(procs.process(Pid::new(1)).unwrap().remaining_in_burst(), 3);
    }

    #[test]
    fn completion_wins_over_expiry() {
        let mut sched = Fcfs::new();
        let mut procs = setup(vec![vec![2]]);
        procs
            .dispatch(Pid::new(1), Timestamp::new(0), NonZeroUsize::new(2))
            .unwrap();
        account_tick(&mut procs).unwrap();
        account_tick(&mut procs).unwrap();

        let record = complete_cpu_burst(&mut procs, &mut sched, Timestamp::new(2)).unwrap();
        assert_eq!(
            record,
            Some(TransitionRecord::new(Pid::new(1), Transition::Terminate))
        );
    }
}
