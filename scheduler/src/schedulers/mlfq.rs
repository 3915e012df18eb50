use std::collections::BTreeMap;

use log::debug;

use crate::config::MlfqConfig;
use crate::{Pid, ProcessManager, Scheduler, SchedulingDecision, StopReason};

/// Multi-level feedback queue
///
/// Levels are numbered from 0 (highest priority). Every level but the last
/// is round robin with its own quantum; the last one runs each process until
/// its burst completes. A process whose quantum expires drops one level, a
/// process that finishes its burst in time keeps its level.
///
/// The ready queue of the process table holds every ready process in arrival
/// order. A process enters its level at the same moment it enters the ready
/// queue, so the first ready process found on the best non-empty level is the
/// head of that level.
#[derive(Clone, Debug)]
pub struct MultiLevelFeedback {
    config: MlfqConfig,
    /// Current level of every process seen so far
    levels: BTreeMap<Pid, usize>,
}

impl MultiLevelFeedback {
    pub fn new(config: MlfqConfig) -> MultiLevelFeedback {
        MultiLevelFeedback {
            config,
            levels: BTreeMap::new(),
        }
    }

    /// The level `pid` is queued on; unknown processes start at the top
    pub fn level_of(&self, pid: Pid) -> usize {
        self.levels.get(&pid).copied().unwrap_or(0)
    }

    fn bottom(&self) -> usize {
        self.config.levels() - 1
    }

    fn demote(&mut self, pid: Pid) {
        let level = (self.level_of(pid) + 1).min(self.bottom());
        self.levels.insert(pid, level);

        debug!("{pid}: quantum expired, now on level {level}");
    }
}

impl Default for MultiLevelFeedback {
    fn default() -> Self {
        MultiLevelFeedback::new(MlfqConfig::default())
    }
}

impl Scheduler for MultiLevelFeedback {
    fn name(&self) -> &'static str {
        "MLFQ"
    }

    fn next(&mut self, processes: &ProcessManager) -> SchedulingDecision {
        // min_by_key keeps the first of equal elements
        let best = processes
            .ready()
            .iter()
            .map(|pid| (pid, self.level_of(pid)))
            .min_by_key(|(_, level)| *level);

        match best {
            Some((pid, level)) => SchedulingDecision::Run {
                pid,
                timeslice: self.config.quantum(level),
            },
            None => SchedulingDecision::Idle,
        }
    }

    fn admit(&mut self, pid: Pid) {
        self.levels.insert(pid, 0);
    }

    fn wake(&mut self, pid: Pid) {
        if self.config.reset_on_unblock {
            self.levels.insert(pid, 0);
        }
    }

    fn stop(&mut self, pid: Pid, reason: StopReason) {
        match reason {
            StopReason::Expired => self.demote(pid),
            StopReason::Exit => {
                self.levels.remove(&pid);
            }
            StopReason::Io => {}
        }
    }

    fn ready_levels(&self, ready: &[Pid]) -> Vec<Vec<Pid>> {
        let mut queues = vec![Vec::new(); self.config.levels()];
        for pid in ready {
            queues[self.level_of(*pid).min(self.bottom())].push(*pid);
        }
        queues
    }
}
