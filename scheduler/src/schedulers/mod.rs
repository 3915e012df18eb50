//! Dispatch policies.
//!
//! Each policy lives in its own file and implements the `Scheduler` trait.

mod fcfs;
pub use fcfs::Fcfs;

mod sjf;
pub use sjf::ShortestJobFirst;

mod mlfq;
pub use mlfq::MultiLevelFeedback;
