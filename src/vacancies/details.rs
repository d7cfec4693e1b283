use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::unfinished;
use crate::hh::{VacancyDetail, VacancySource};
use crate::queue::{JobFailure, JobOutcome, WorkerPool};

pub type DetailOutcome = JobOutcome<VacancyDetail>;

/// Fetch the full detail of every id through the worker pool.
///
/// Outcomes arrive in completion order; each carries its id. A failed fetch
/// is an `Err` outcome for that id only.
pub async fn fetch_details<S>(
    source: Arc<S>,
    ids: Vec<String>,
    pool: &WorkerPool,
) -> Vec<DetailOutcome>
where
    S: VacancySource + ?Sized + 'static,
{
    if ids.is_empty() {
        return Vec::new();
    }

    let requested = ids.len();
    info!(count = requested, workers = pool.workers(), "Fetching vacancy details");

    let outcomes = pool
        .run(ids, move |id: String| {
            let source = Arc::clone(&source);
            async move {
                let result = source.vacancy_detail(&id).await;
                if let Err(e) = &result {
                    warn!(vacancy_id = %id, error = %e, "Vacancy detail fetch failed");
                }
                JobOutcome::new(id, result)
            }
        })
        .await;

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed > 0 || outcomes.len() < requested {
        warn!(
            requested,
            completed = outcomes.len(),
            failed,
            "Vacancy detail fetch finished with failures"
        );
    } else {
        info!(count = requested, "Vacancy details fetched");
    }

    outcomes
}

/// Detail outcomes split for API responses
#[derive(Debug, Default, Serialize)]
pub struct DetailReport {
    pub details: Vec<VacancyDetail>,
    pub failed: Vec<JobFailure>,
    /// Ids without an outcome: cut off by cancellation or the request
    /// deadline, or whose fetch panicked
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unfinished: Vec<String>,
}

impl DetailReport {
    pub fn from_outcomes(requested: &[String], outcomes: Vec<DetailOutcome>) -> Self {
        let mut report = DetailReport {
            unfinished: unfinished(requested, &outcomes),
            ..Default::default()
        };

        for outcome in outcomes {
            match outcome.result {
                Ok(detail) => report.details.push(detail),
                Err(e) => report.failed.push(JobFailure::new(outcome.id, &e)),
            }
        }

        report
    }
}
