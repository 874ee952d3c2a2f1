//! Frontier scheduling: decides which nodes run in a superstep and executes
//! them concurrently.

mod scheduler;

pub use scheduler::{Scheduler, SchedulerError, SchedulerState, StepRunResult};
