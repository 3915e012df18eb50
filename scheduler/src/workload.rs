//! Workload input.
//!
//! A workload is the ordered set of processes a run starts with. The order is
//! the admission order. Workloads come from outside the core (the runner
//! ships the classic eight-process dataset and can load JSON files) and are
//! validated before any simulation state exists.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedError, WorkloadDefect};
use crate::Pid;

/// One process of a workload: its pid and its burst program
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    pub pid: Pid,
    /// cpu, io, cpu, ..., cpu
    pub bursts: Vec<usize>,
}

impl ProcessSpec {
    pub fn new(pid: Pid, bursts: Vec<usize>) -> ProcessSpec {
        ProcessSpec { pid, bursts }
    }

    fn validate(&self) -> Result<()> {
        let defect = |defect| SchedError::InvalidWorkload {
            pid: Some(self.pid),
            defect,
        };

        if self.bursts.is_empty() {
            return Err(defect(WorkloadDefect::NoBursts));
        }

        if self.bursts.len() % 2 == 0 {
            return Err(defect(WorkloadDefect::EvenLength {
                len: self.bursts.len(),
            }));
        }

        if let Some(index) = self.bursts.iter().position(|burst| *burst == 0) {
            return Err(defect(WorkloadDefect::ZeroBurst { index }));
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Workload {
    processes: Vec<ProcessSpec>,
}

impl Workload {
    pub fn new(processes: Vec<ProcessSpec>) -> Workload {
        Workload { processes }
    }

    /// Builds a workload from plain burst lists, numbering pids from 1
    pub fn from_bursts<I>(programs: I) -> Workload
    where
        I: IntoIterator<Item = Vec<usize>>,
    {
        Workload::new(
            programs
                .into_iter()
                .enumerate()
                .map(|(idx, bursts)| ProcessSpec::new(Pid::new(idx + 1), bursts))
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcessSpec> {
        self.processes.iter()
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Checks the workload can be simulated
    ///
    /// Rejects an empty workload, duplicated pids, and burst programs that
    /// are empty, of even length or contain a zero-length burst.
    pub fn validate(&self) -> Result<()> {
        if self.processes.is_empty() {
            return Err(SchedError::InvalidWorkload {
                pid: None,
                defect: WorkloadDefect::Empty,
            });
        }

        let mut seen = HashSet::with_capacity(self.processes.len());
        for spec in &self.processes {
            if !seen.insert(spec.pid) {
                return Err(SchedError::InvalidWorkload {
                    pid: Some(spec.pid),
                    defect: WorkloadDefect::DuplicatePid,
                });
            }
            spec.validate()?;
        }

        Ok(())
    }
}

impl FromIterator<ProcessSpec> for Workload {
    fn from_iter<T: IntoIterator<Item = ProcessSpec>>(iter: T) -> Self {
        Workload::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid(workload: &Workload) -> (Option<Pid>, WorkloadDefect) {
        match workload.validate() {
            Err(SchedError::InvalidWorkload { pid, defect }) => (pid, defect),
            other => panic!("expected InvalidWorkload, got {other:?}"),
        }
    }

    #[test]
    fn accepts_alternating_programs() {
        let workload = Workload::from_bursts([vec![5], vec![4, 48, 5]]);
        assert!(workload.validate().is_ok());
        assert_eq!(workload.len(), 2);
    }

    #[test]
    fn rejects_empty_workload() {
        assert_eq!(invalid(&Workload::default()), (None, WorkloadDefect::Empty));
    }

    #[test]
    fn rejects_even_length_program() {
        let workload = Workload::from_bursts([vec![3], vec![3, 4]]);
        assert_eq!(
            invalid(&workload),
            (Some(Pid::new(2)), WorkloadDefect::EvenLength { len: 2 })
        );
    }

    #[test]
    fn rejects_empty_and_zero_bursts() {
        let workload = Workload::from_bursts([vec![]]);
        assert_eq!(invalid(&workload), (Some(Pid::new(1)), WorkloadDefect::NoBursts));

        let workload = Workload::from_bursts([vec![2, 0, 1]]);
        assert_eq!(
            invalid(&workload),
            (Some(Pid::new(1)), WorkloadDefect::ZeroBurst { index: 1 })
        );
    }

    #[test]
    fn rejects_duplicate_pid() {
        let workload: Workload = [
            ProcessSpec::new(Pid::new(4), vec![1]),
            ProcessSpec::new(Pid::new(4), vec![2]),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            invalid(&workload),
            (Some(Pid::new(4)), WorkloadDefect::DuplicatePid)
        );
    }

    #[test]
    fn parses_from_json() {
        let json = r#"[{"pid": 1, "bursts": [5, 27, 3]}, {"pid": 8, "bursts": [4]}]"#;
        let workload: Workload = serde_json::from_str(json).unwrap();

        assert!(workload.validate().is_ok());
        let pids: Vec<_> = workload.iter().map(|spec| spec.pid).collect();
        assert_eq!(pids, vec![Pid::new(1), Pid::new(8)]);
    }
}
