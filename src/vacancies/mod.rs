//! Vacancy enrichment and bulk applications
//!
//! Both operations fan out over the bounded [`WorkerPool`](crate::queue::WorkerPool)
//! and report one outcome per vacancy; a failing vacancy never stops its
//! siblings.

pub mod apply;
pub mod details;

pub use apply::{apply_all, owns_resume, ApplyReport};
pub use details::{fetch_details, DetailOutcome, DetailReport};

use std::collections::HashSet;

use crate::queue::JobOutcome;

/// Requested ids that produced no outcome: not reached before the run was
/// cancelled or hit its deadline, abandoned mid-flight, or lost to a job that
/// panicked
fn unfinished<T>(requested: &[String], outcomes: &[JobOutcome<T>]) -> Vec<String> {
    let finished: HashSet<&str> = outcomes.iter().map(|o| o.id.as_str()).collect();
    requested
        .iter()
        .filter(|id| !finished.contains(id.as_str()))
        .cloned()
        .collect()
}
