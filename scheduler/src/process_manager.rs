use std::collections::HashMap;
use std::num::NonZeroUsize;

use log::debug;

use crate::error::{Result, SchedError};
use crate::queue::ProcessQueue;
use crate::workload::Workload;
use crate::{Pid, ProcessControlBlock, ProcessState, Timestamp, Transition};

/// The process holding the CPU and the slice it was granted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunningSlot {
    pub pid: Pid,
    /// Maximum ticks before preemption, `None` to run the burst to completion
    pub timeslice: Option<NonZeroUsize>,
    /// Ticks held since the latest dispatch
    pub slice_elapsed: usize,
}

impl RunningSlot {
    /// True once the granted timeslice has been used up
    pub fn expired(&self) -> bool {
        match self.timeslice {
            Some(slice) => self.slice_elapsed >= slice.get(),
            None => false,
        }
    }
}

/// Owns every process control block of a run together with the state
/// containers and the running slot.
///
/// All state changes go through the transition operations below. Each one
/// checks the current state of the process first and refuses with
/// `SchedError::StateViolation` if the move is not legal.
#[derive(Clone, Debug)]
pub struct ProcessManager {
    /// Arena of process control blocks, in workload order
    processes: Vec<ProcessControlBlock>,
    /// Pid -> index in `processes`
    index: HashMap<Pid, usize>,
    ready: ProcessQueue,
    running: Option<RunningSlot>,
    waiting: ProcessQueue,
    terminated: ProcessQueue,
}

impl ProcessManager {
    /// Creates a process table with every workload entry in the `New` state
    ///
    /// * `workload` - a workload that already passed validation
    pub fn new(workload: &Workload) -> ProcessManager {
        let mut processes = Vec::with_capacity(workload.len());
        let mut index = HashMap::with_capacity(workload.len());

        for spec in workload.iter() {
            index.insert(spec.pid, processes.len());
            processes.push(ProcessControlBlock::new(spec.pid, spec.bursts.clone()));
        }

        ProcessManager {
            processes,
            index,
            ready: ProcessQueue::new(),
            running: None,
            waiting: ProcessQueue::new(),
            terminated: ProcessQueue::new(),
        }
    }

    pub fn process(&self, pid: Pid) -> Option<&ProcessControlBlock> {
        self.index.get(&pid).map(|idx| &self.processes[*idx])
    }

    /// All processes in workload order
    pub fn processes(&self) -> impl Iterator<Item = &ProcessControlBlock> {
        self.processes.iter()
    }

    pub fn ready(&self) -> &ProcessQueue {
        &self.ready
    }

    pub fn waiting(&self) -> &ProcessQueue {
        &self.waiting
    }

    pub fn terminated(&self) -> &ProcessQueue {
        &self.terminated
    }

    pub fn running(&self) -> Option<Pid> {
        self.running.map(|slot| slot.pid)
    }

    pub fn running_slot(&self) -> Option<RunningSlot> {
        self.running
    }

    pub fn has_running_process(&self) -> bool {
        self.running.is_some()
    }

    pub fn has_ready_processes(&self) -> bool {
        !self.ready.is_empty()
    }

    pub fn has_waiting_processes(&self) -> bool {
        !self.waiting.is_empty()
    }

    /// True when nothing is ready, running or waiting any more
    pub fn is_complete(&self) -> bool {
        !self.has_running_process() && !self.has_ready_processes() && !self.has_waiting_processes()
    }

    pub(crate) fn pcb_mut(&mut self, pid: Pid) -> Result<&mut ProcessControlBlock> {
        match self.index.get(&pid) {
            Some(idx) => Ok(&mut self.processes[*idx]),
            None => Err(SchedError::UnknownProcess(pid)),
        }
    }

    /// Looks up `pid` and checks it is in the source state of `transition`
    fn checked(&mut self, pid: Pid, transition: Transition) -> Result<&mut ProcessControlBlock> {
        let pcb = self.pcb_mut(pid)?;
        let state = pcb.state();

        if state != transition.from_state() {
            return Err(SchedError::StateViolation {
                pid,
                transition,
                state,
            });
        }

        Ok(pcb)
    }

    /// New -> Ready, at the tail of the ready queue
    pub fn admit(&mut self, pid: Pid) -> Result<()> {
        self.checked(pid, Transition::Admit)?.set_state(ProcessState::Ready);
        self.ready.push_back(pid);

        debug!("{pid}: admitted");
        Ok(())
    }

    /// Ready -> Running
    ///
    /// * `pid` - any member of the ready queue, not only the head
    /// * `now` - the current tick, recorded as response time on first dispatch
    /// * `timeslice` - ticks the process may hold the CPU, `None` for the whole burst
    pub fn dispatch(
        &mut self,
        pid: Pid,
        now: Timestamp,
        timeslice: Option<NonZeroUsize>,
    ) -> Result<()> {
        if let Some(slot) = self.running {
            return Err(SchedError::CpuBusy {
                pid,
                running: slot.pid,
            });
        }

        let pcb = self.checked(pid, Transition::Dispatch)?;
        if pcb.burst_cursor().is_none() {
            pcb.advance_burst()?;
        }
        pcb.mark_response(now);
        pcb.set_state(ProcessState::Running);

        self.ready.remove(pid);
        self.running = Some(RunningSlot {
            pid,
            timeslice,
            slice_elapsed: 0,
        });

        debug!("{pid}: dispatched at {now}");
        Ok(())
    }

    /// Running -> Waiting, at the tail of the waiting queue
    ///
    /// The cpu burst must be fully served; the cursor moves on to the i/o
    /// burst that follows it.
    pub fn block(&mut self, pid: Pid) -> Result<()> {
        let pcb = self.checked(pid, Transition::Block)?;
        pcb.check_burst_done()?;
        if pcb.on_last_burst() {
            return Err(SchedError::BurstSequenceExhausted(pid));
        }

        self.leave_cpu(pid, Transition::Block)?;
        self.advance_burst(pid)?;
        self.waiting.push_back(pid);

        debug!("{pid}: blocked for i/o");
        Ok(())
    }

    /// Waiting -> Ready, at the tail of the ready queue
    ///
    /// The i/o burst must be fully served; the cursor moves on to the next
    /// cpu burst.
    pub fn unblock(&mut self, pid: Pid) -> Result<()> {
        let pcb = self.checked(pid, Transition::Unblock)?;
        pcb.advance_burst()?;
        pcb.set_state(ProcessState::Ready);
        self.waiting.remove(pid);
        self.ready.push_back(pid);

        debug!("{pid}: i/o done");
        Ok(())
    }

    /// Running -> Terminated, at the tail of the terminated queue
    ///
    /// Only legal once the last cpu burst is fully served.
    pub fn terminate(&mut self, pid: Pid, now: Timestamp) -> Result<()> {
        let pcb = self.checked(pid, Transition::Terminate)?;
        pcb.check_burst_done()?;
        let remaining = pcb.bursts_left();
        if remaining > 0 {
            return Err(SchedError::BurstsRemaining { pid, remaining });
        }

        self.leave_cpu(pid, Transition::Terminate)?;
        self.pcb_mut(pid)?.mark_terminated(now);
        self.terminated.push_back(pid);

        debug!("{pid}: terminated at {now}");
        Ok(())
    }

    /// Running -> Ready without finishing the burst
    pub fn preempt(&mut self, pid: Pid) -> Result<()> {
        self.leave_cpu(pid, Transition::Preempt)?;
        self.ready.push_back(pid);

        debug!("{pid}: preempted");
        Ok(())
    }

    /// Moves the burst cursor of `pid` one step forward, once the current
    /// burst is fully served
    pub fn advance_burst(&mut self, pid: Pid) -> Result<()> {
        self.pcb_mut(pid)?.advance_burst()
    }

    /// Frees the running slot held by `pid`
    fn leave_cpu(&mut self, pid: Pid, transition: Transition) -> Result<()> {
        let holds_cpu = matches!(self.running, Some(slot) if slot.pid == pid);
        let pcb = self.checked(pid, transition)?;

        if !holds_cpu {
            return Err(SchedError::StateViolation {
                pid,
                transition,
                state: pcb.state(),
            });
        }

        pcb.set_state(transition.to_state());
        self.running = None;
        Ok(())
    }

    pub(crate) fn tick_running_slice(&mut self) {
        if let Some(slot) = self.running.as_mut() {
            slot.slice_elapsed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::ProcessSpec;

    fn manager(programs: &[&[usize]]) -> ProcessManager {
        let workload = Workload::new(
            programs
                .iter()
                .enumerate()
                .map(|(idx, bursts)| ProcessSpec::new(Pid::new(idx + 1), bursts.to_vec()))
                .collect(),
        );
        ProcessManager::new(&workload)
    }

    fn p(id: usize) -> Pid {
        Pid::new(id)
    }

    #[test]
    fn admit_moves_new_to_ready_tail() {
        let mut procs = manager(&[&[1], &[2]]);
        procs.admit(p(2)).unwrap();
        procs.admit(p(1)).unwrap();

        assert_eq!(procs.ready().to_vec(), vec![p(2), p(1)]);
        assert_eq!(procs.process(p(1)).unwrap().state(), ProcessState::Ready);
    }

    #[test]
    fn admit_twice_is_a_violation() {
        let mut procs = manager(&[&[1]]);
        procs.admit(p(1)).unwrap();

        assert_eq!(
            procs.admit(p(1)),
            Err(SchedError::StateViolation {
                pid: p(1),
                transition: Transition::Admit,
                state: ProcessState::Ready,
            })
        );
        assert_eq!(procs.ready().len(), 1);
    }

    #[test]
    fn dispatch_takes_any_ready_member() {
        let mut procs = manager(&[&[1], &[2], &[3]]);
        for id in 1..=3 {
            procs.admit(p(id)).unwrap();
        }

        procs.dispatch(p(2), Timestamp::new(0), None).unwrap();

        assert_eq!(procs.running(), Some(p(2)));
        assert_eq!(procs.ready().to_vec(), vec![p(1), p(3)]);
        let pcb = procs.process(p(2)).unwrap();
        assert_eq!(pcb.burst_cursor(), Some(0));
        assert_eq!(pcb.response_time(), Some(Timestamp::new(0)));
    }

    #[test]
    fn dispatch_refuses_when_cpu_is_busy() {
        let mut procs = manager(&[&[1], &[2]]);
        procs.admit(p(1)).unwrap();
        procs.admit(p(2)).unwrap();
        procs.dispatch(p(1), Timestamp::new(0), None).unwrap();

        assert_eq!(
            procs.dispatch(p(2), Timestamp::new(0), None),
            Err(SchedError::CpuBusy {
                pid: p(2),
                running: p(1)
            })
        );
        assert!(procs.ready().contains(p(2)));
    }

    #[test]
    fn dispatch_of_new_process_is_a_violation() {
        let mut procs = manager(&[&[1]]);
        let err = procs.dispatch(p(1), Timestamp::new(0), None).unwrap_err();

        assert!(matches!(
            err,
            SchedError::StateViolation {
                transition: Transition::Dispatch,
                state: ProcessState::New,
                ..
            }
        ));
    }

    #[test]
    fn block_then_unblock_round_trip() {
        let mut procs = manager(&[&[1, 2, 1], &[4]]);
        procs.admit(p(1)).unwrap();
        procs.admit(p(2)).unwrap();
        procs.dispatch(p(1), Timestamp::new(0), None).unwrap();
        procs.pcb_mut(p(1)).unwrap().cpu_tick();

        procs.block(p(1)).unwrap();
        assert_eq!(procs.running(), None);
        assert_eq!(procs.waiting().to_vec(), vec![p(1)]);
        let pcb = procs.process(p(1)).unwrap();
        assert_eq!(pcb.state(), ProcessState::Waiting);
        assert_eq!(pcb.burst_cursor(), Some(1));

        procs.pcb_mut(p(1)).unwrap().io_tick();
        procs.pcb_mut(p(1)).unwrap().io_tick();
        procs.unblock(p(1)).unwrap();
        assert!(procs.waiting().is_empty());
        assert_eq!(procs.ready().to_vec(), vec![p(2), p(1)]);
        assert_eq!(procs.process(p(1)).unwrap().burst_cursor(), Some(2));
    }

    #[test]
    fn unblock_of_ready_process_is_a_violation() {
        let mut procs = manager(&[&[1]]);
        procs.admit(p(1)).unwrap();

        assert!(matches!(
            procs.unblock(p(1)),
            Err(SchedError::StateViolation {
                transition: Transition::Unblock,
                state: ProcessState::Ready,
                ..
            })
        ));
    }

    #[test]
    fn terminated_queue_keeps_arrival_order() {
        let mut procs = manager(&[&[1], &[1]]);
        procs.admit(p(1)).unwrap();
        procs.admit(p(2)).unwrap();

        procs.dispatch(p(2), Timestamp::new(0), None).unwrap();
        procs.pcb_mut(p(2)).unwrap().cpu_tick();
        procs.terminate(p(2), Timestamp::new(1)).unwrap();
        procs.dispatch(p(1), Timestamp::new(1), None).unwrap();
        procs.pcb_mut(p(1)).unwrap().cpu_tick();
        procs.terminate(p(1), Timestamp::new(2)).unwrap();

        assert_eq!(procs.terminated().to_vec(), vec![p(2), p(1)]);
        assert_eq!(
            procs.process(p(2)).unwrap().termination_time(),
            Some(Timestamp::new(1))
        );
        assert!(procs.is_complete());
    }

    #[test]
    fn terminate_of_waiting_process_is_a_violation() {
        let mut procs = manager(&[&[1, 1, 1]]);
        procs.admit(p(1)).unwrap();
        procs.dispatch(p(1), Timestamp::new(0), None).unwrap();
        procs.pcb_mut(p(1)).unwrap().cpu_tick();
        procs.block(p(1)).unwrap();

        assert!(matches!(
            procs.terminate(p(1), Timestamp::new(3)),
            Err(SchedError::StateViolation {
                transition: Transition::Terminate,
                state: ProcessState::Waiting,
                ..
            })
        ));
    }

    #[test]
    fn preempt_returns_to_ready_tail_and_keeps_burst() {
        let mut procs = manager(&[&[9], &[1]]);
        procs.admit(p(1)).unwrap();
        procs.admit(p(2)).unwrap();
        procs
            .dispatch(p(1), Timestamp::new(0), NonZeroUsize::new(2))
            .unwrap();
        procs.pcb_mut(p(1)).unwrap().cpu_tick();
        procs.tick_running_slice();
        procs.tick_running_slice();
        assert!(procs.running_slot().unwrap().expired());

        procs.preempt(p(1)).unwrap();

        assert_eq!(procs.ready().to_vec(), vec![p(2), p(1)]);
        let pcb = procs.process(p(1)).unwrap();
        assert_eq!(pcb.burst_cursor(), Some(0));
        assert_eq!(pcb.remaining_in_burst(), 8);
    }

    #[test]
    fn unfinished_cpu_burst_cannot_leave_the_cpu() {
        let mut procs = manager(&[&[5, 3, 2]]);
        procs.admit(p(1)).unwrap();
        procs.dispatch(p(1), Timestamp::new(0), None).unwrap();

        let unfinished = SchedError::BurstNotComplete {
            pid: p(1),
            served: 0,
            required: 5,
        };
        assert_eq!(procs.advance_burst(p(1)), Err(unfinished.clone()));
        assert_eq!(procs.block(p(1)), Err(unfinished.clone()));
        assert_eq!(procs.terminate(p(1), Timestamp::new(0)), Err(unfinished));

        // nothing moved
        assert_eq!(procs.running(), Some(p(1)));
        let pcb = procs.process(p(1)).unwrap();
        assert_eq!(pcb.state(), ProcessState::Running);
        assert_eq!(pcb.burst_cursor(), Some(0));
        assert_eq!(pcb.termination_time(), None);
    }

    #[test]
    fn terminate_needs_the_last_burst() {
        let mut procs = manager(&[&[1, 3, 2]]);
        procs.admit(p(1)).unwrap();
        procs.dispatch(p(1), Timestamp::new(0), None).unwrap();
        procs.pcb_mut(p(1)).unwrap().cpu_tick();

        assert_eq!(
            procs.terminate(p(1), Timestamp::new(1)),
            Err(SchedError::BurstsRemaining {
                pid: p(1),
                remaining: 2
            })
        );
        assert_eq!(procs.running(), Some(p(1)));
        assert_eq!(procs.process(p(1)).unwrap().termination_time(), None);
        assert!(procs.terminated().is_empty());
    }

    #[test]
    fn block_on_the_last_burst_is_refused() {
        let mut procs = manager(&[&[1]]);
        procs.admit(p(1)).unwrap();
        procs.dispatch(p(1), Timestamp::new(0), None).unwrap();
        procs.pcb_mut(p(1)).unwrap().cpu_tick();

        assert_eq!(
            procs.block(p(1)),
            Err(SchedError::BurstSequenceExhausted(p(1)))
        );
        assert_eq!(procs.running(), Some(p(1)));
    }

    #[test]
    fn unblock_waits_for_the_io_burst() {
        let mut procs = manager(&[&[1, 3, 1]]);
        procs.admit(p(1)).unwrap();
        procs.dispatch(p(1), Timestamp::new(0), None).unwrap();
        procs.pcb_mut(p(1)).unwrap().cpu_tick();
        procs.block(p(1)).unwrap();
        procs.pcb_mut(p(1)).unwrap().io_tick();

        assert_eq!(
            procs.unblock(p(1)),
            Err(SchedError::BurstNotComplete {
                pid: p(1),
                served: 1,
                required: 3
            })
        );
        assert_eq!(procs.waiting().to_vec(), vec![p(1)]);
        assert_eq!(procs.process(p(1)).unwrap().state(), ProcessState::Waiting);
    }

    #[test]
    fn unknown_pid_is_reported() {
        let mut procs = manager(&[&[1]]);
        assert_eq!(procs.admit(p(42)), Err(SchedError::UnknownProcess(p(42))));
    }
}
