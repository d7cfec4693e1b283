// Bounded worker pool and the outcome type its jobs report

pub mod jobs;
pub mod workers;

pub use jobs::{JobFailure, JobOutcome};
pub use workers::WorkerPool;
