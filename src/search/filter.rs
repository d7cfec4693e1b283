use std::collections::HashSet;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::deadline_reached;
use crate::hh::{ApplicantApi, Credentials, FetchError, SearchResult};

/// Keep only candidates whose id is not in `responded`, preserving order
pub fn filter_unresponded(
    candidates: Vec<SearchResult>,
    responded: &HashSet<String>,
) -> Vec<SearchResult> {
    if responded.is_empty() {
        return candidates;
    }

    candidates
        .into_iter()
        .filter(|candidate| !responded.contains(&candidate.id))
        .collect()
}

/// Ids of every vacancy the user has already applied to, across all pages
/// of their negotiation history.
///
/// The history is all or nothing: a failed page, cancellation or the deadline
/// fails the whole call, since a partial set would let applied vacancies
/// through the filter.
pub async fn responded_ids<A>(
    api: &A,
    credentials: &Credentials,
    deadline: Option<Instant>,
    cancel: &CancellationToken,
) -> Result<HashSet<String>, FetchError>
where
    A: ApplicantApi + ?Sized,
{
    let mut responded = HashSet::new();
    let mut page = 0;

    loop {
        let batch = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            _ = deadline_reached(deadline) => return Err(FetchError::DeadlineExceeded),
            batch = api.negotiations_page(credentials, page) => batch?,
        };
        responded.extend(
            batch
                .items
                .into_iter()
                .filter_map(|negotiation| negotiation.vacancy.map(|v| v.id)),
        );

        page += 1;
        if page >= batch.pages {
            break;
        }
    }

    debug!(count = responded.len(), "Loaded negotiation history");
    Ok(responded)
}
