//! Ordered process containers.
//!
//! Each state queue keeps pids in arrival order. Entries are keyed by a
//! monotonically increasing sequence number so that removal by identity does
//! not have to shift the rest of the queue.

use std::collections::{BTreeMap, HashMap};

use crate::Pid;

#[derive(Clone, Debug, Default)]
pub struct ProcessQueue {
    order: BTreeMap<u64, Pid>,
    slots: HashMap<Pid, u64>,
    next_seq: u64,
}

impl ProcessQueue {
    pub fn new() -> ProcessQueue {
        ProcessQueue::default()
    }

    /// Appends `pid` at the tail
    ///
    /// Returns `false` if the pid is already queued.
    pub fn push_back(&mut self, pid: Pid) -> bool {
        if self.slots.contains_key(&pid) {
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, pid);
        self.slots.insert(pid, seq);
        true
    }

    /// Removes `pid` wherever it sits in the queue
    ///
    /// Returns `false` if the pid was not queued.
    pub fn remove(&mut self, pid: Pid) -> bool {
        match self.slots.remove(&pid) {
            Some(seq) => {
                self.order.remove(&seq);
                true
            }
            None => false,
        }
    }

    pub fn pop_front(&mut self) -> Option<Pid> {
        let (_, pid) = self.order.pop_first()?;
        self.slots.remove(&pid);
        Some(pid)
    }

    pub fn front(&self) -> Option<Pid> {
        self.order.values().next().copied()
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.slots.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Pids from head to tail
    pub fn iter(&self) -> impl Iterator<Item = Pid> + '_ {
        self.order.values().copied()
    }

    pub fn to_vec(&self) -> Vec<Pid> {
        self.iter().collect()
    }
}
