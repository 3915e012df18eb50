use crate::error::{Result, SchedError};
use crate::{Pid, ProcessState, Timestamp};

/// The kind of service a burst asks for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BurstKind {
    Cpu,
    Io,
}

/// The simulated process control block
///
/// Holds the identity, the burst program and the timing counters of one
/// process. Queue membership is not stored here; the `ProcessManager`
/// containers are the only source of truth for it.
#[derive(Clone, Debug)]
pub struct ProcessControlBlock {
    /// The pid of the process
    pid: Pid,
    /// The state of the process
    state: ProcessState,
    /// Burst durations: cpu, io, cpu, ..., cpu
    bursts: Vec<usize>,
    /// Index of the burst being served, `None` before the first dispatch
    burst_cursor: Option<usize>,
    /// Ticks served within the burst at `burst_cursor`
    burst_elapsed: usize,
    /// Ticks spent in the ready queue
    waiting_time: usize,
    /// Ticks spent on the CPU
    cpu_time: usize,
    /// Ticks spent doing I/O
    io_time: usize,
    /// The tick of the first dispatch
    response_time: Option<Timestamp>,
    /// The tick the process terminated
    termination_time: Option<Timestamp>,
}

impl ProcessControlBlock {
    /// Creates a new Process Control Block in the `New` state
    ///
    /// * `pid` - pid of the new process
    /// * `bursts` - the burst program, already validated
    pub fn new(pid: Pid, bursts: Vec<usize>) -> ProcessControlBlock {
        ProcessControlBlock {
            pid,
            state: ProcessState::New,
            bursts,
            burst_cursor: None,
            burst_elapsed: 0,
            waiting_time: 0,
            cpu_time: 0,
            io_time: 0,
            response_time: None,
            termination_time: None,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: ProcessState) {
        self.state = state;
    }

    pub fn bursts(&self) -> &[usize] {
        &self.bursts
    }

    pub fn burst_cursor(&self) -> Option<usize> {
        self.burst_cursor
    }

    pub fn burst_elapsed(&self) -> usize {
        self.burst_elapsed
    }

    /// Returns `(waiting, cpu, io)` tick counters
    pub fn timings(&self) -> (usize, usize, usize) {
        (self.waiting_time, self.cpu_time, self.io_time)
    }

    pub fn waiting_time(&self) -> usize {
        self.waiting_time
    }

    pub fn cpu_time(&self) -> usize {
        self.cpu_time
    }

    pub fn io_time(&self) -> usize {
        self.io_time
    }

    /// Time from admission to termination
    pub fn turnaround(&self) -> usize {
        self.waiting_time + self.cpu_time + self.io_time
    }

    pub fn response_time(&self) -> Option<Timestamp> {
        self.response_time
    }

    pub fn termination_time(&self) -> Option<Timestamp> {
        self.termination_time
    }

    /// Kind of the burst at the cursor, if a burst has started
    pub fn current_kind(&self) -> Option<BurstKind> {
        self.burst_cursor.map(|index| {
            if index % 2 == 0 {
                BurstKind::Cpu
            } else {
                BurstKind::Io
            }
        })
    }

    /// Ticks left in the burst at the cursor
    pub fn remaining_in_burst(&self) -> usize {
        match self.burst_cursor {
            Some(index) => self.bursts[index].saturating_sub(self.burst_elapsed),
            None => 0,
        }
    }

    /// Length of the CPU service the process asks for when it next runs
    ///
    /// Before the first dispatch this is the whole first burst; afterwards it
    /// is what is left of the current CPU burst.
    pub fn upcoming_cpu_burst(&self) -> usize {
        match self.current_kind() {
            None => self.bursts[0],
            Some(BurstKind::Cpu) => self.remaining_in_burst(),
            Some(BurstKind::Io) => self
                .burst_cursor
                .and_then(|index| self.bursts.get(index + 1))
                .copied()
                .unwrap_or(0),
        }
    }

    /// True once the burst at the cursor has been fully served
    pub fn burst_done(&self) -> bool {
        match self.burst_cursor {
            Some(index) => self.burst_elapsed >= self.bursts[index],
            None => false,
        }
    }

    /// True if the burst at the cursor is the last one of the program
    pub fn on_last_burst(&self) -> bool {
        self.burst_cursor
            .map(|index| index + 1 == self.bursts.len())
            .unwrap_or(false)
    }

    /// Bursts after the one at the cursor
    pub fn bursts_left(&self) -> usize {
        match self.burst_cursor {
            Some(index) => self.bursts.len() - index - 1,
            None => self.bursts.len(),
        }
    }

    /// Fails unless the burst at the cursor has been fully served
    pub fn check_burst_done(&self) -> Result<()> {
        match self.burst_cursor {
            Some(index) if !self.burst_done() => Err(SchedError::BurstNotComplete {
                pid: self.pid,
                served: self.burst_elapsed,
                required: self.bursts[index],
            }),
            _ => Ok(()),
        }
    }

    /// Moves the cursor to the next burst and resets the elapsed counter
    ///
    /// The first call starts burst 0; every later call needs the current
    /// burst to be fully served.
    pub fn advance_burst(&mut self) -> Result<()> {
        self.check_burst_done()?;
        let next = match self.burst_cursor {
            None => 0,
            Some(index) => index + 1,
        };

        if next >= self.bursts.len() {
            return Err(SchedError::BurstSequenceExhausted(self.pid));
        }

        self.burst_cursor = Some(next);
        self.burst_elapsed = 0;
        Ok(())
    }

    /// Records the first dispatch; later calls keep the original value
    pub(crate) fn mark_response(&mut self, now: Timestamp) {
        if self.response_time.is_none() {
            self.response_time = Some(now);
        }
    }

    pub(crate) fn mark_terminated(&mut self, now: Timestamp) {
        if self.termination_time.is_none() {
            self.termination_time = Some(now);
        }
    }

    /// One tick spent in the ready queue
    pub(crate) fn wait_tick(&mut self) {
        self.waiting_time += 1;
    }

    /// One tick spent on the CPU
    pub(crate) fn cpu_tick(&mut self) {
        self.cpu_time += 1;
        self.burst_elapsed += 1;
    }

    /// One tick spent on I/O
    pub(crate) fn io_tick(&mut self) {
        self.io_time += 1;
        self.burst_elapsed += 1;
    }
}
