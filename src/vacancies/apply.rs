use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::unfinished;
use crate::hh::{ApplicantApi, Credentials, FetchError};
use crate::queue::{JobFailure, JobOutcome, WorkerPool};

/// Per-vacancy results of a bulk application
#[derive(Debug, Default, Serialize)]
pub struct ApplyReport {
    pub resume_id: String,
    pub applied: Vec<String>,
    pub failed: Vec<JobFailure>,
    /// Vacancies without an outcome: cut off by cancellation or the request
    /// deadline, or whose job panicked. An application abandoned mid-flight
    /// may still have reached hh.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unfinished: Vec<String>,
}

/// Whether `resume_id` is one of the user's own resumes
pub async fn owns_resume<A>(
    api: &A,
    credentials: &Credentials,
    resume_id: &str,
) -> Result<bool, FetchError>
where
    A: ApplicantApi + ?Sized,
{
    let resumes = api.resumes(credentials).await?;
    Ok(resumes.iter().any(|resume| resume.id == resume_id))
}

/// Apply to every vacancy with one resume, collecting each outcome before
/// returning.
pub async fn apply_all<A>(
    api: Arc<A>,
    credentials: Credentials,
    resume_id: String,
    vacancy_ids: Vec<String>,
    pool: &WorkerPool,
) -> ApplyReport
where
    A: ApplicantApi + ?Sized + 'static,
{
    let requested = vacancy_ids.clone();
    info!(resume_id = %resume_id, count = requested.len(), "Applying to vacancies");

    let job_resume = resume_id.clone();
    let outcomes = pool
        .run(vacancy_ids, move |vacancy_id: String| {
            let api = Arc::clone(&api);
            let credentials = credentials.clone();
            let resume_id = job_resume.clone();
            async move {
                let result = api.apply(&credentials, &resume_id, &vacancy_id).await;
                if let Err(e) = &result {
                    warn!(vacancy_id = %vacancy_id, error = %e, "Application failed");
                }
                JobOutcome::new(vacancy_id, result)
            }
        })
        .await;

    let mut report = ApplyReport {
        resume_id,
        unfinished: unfinished(&requested, &outcomes),
        ..Default::default()
    };
    for outcome in outcomes {
        match outcome.result {
            Ok(()) => report.applied.push(outcome.id),
            Err(e) => report.failed.push(JobFailure::new(outcome.id, &e)),
        }
    }

    if report.failed.is_empty() && report.unfinished.is_empty() {
        info!(applied = report.applied.len(), "Applications submitted");
    } else {
        warn!(
            applied = report.applied.len(),
            failed = report.failed.len(),
            unfinished = report.unfinished.len(),
            "Applications finished with failures"
        );
    }

    report
}
