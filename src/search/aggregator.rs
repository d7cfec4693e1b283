use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::hh::{FetchError, SearchPage, SearchResult, VacancySource, PAGE_SIZE};

/// How the number of pages is derived from the `found` total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageRounding {
    /// `found / 100`: the trailing partial page is never fetched
    Floor,
    /// `ceil(found / 100)`: every result is fetched
    #[default]
    Ceil,
}

impl PageRounding {
    /// Number of pages to request for `found` results. Page 0 is always
    /// requested, so this is never less than one.
    pub fn page_count(self, found: u32) -> u32 {
        let pages = match self {
            PageRounding::Floor => found / PAGE_SIZE,
            PageRounding::Ceil => found.div_ceil(PAGE_SIZE),
        };
        pages.max(1)
    }
}

#[derive(Debug, Error)]
#[error("unknown page rounding {0:?}, expected \"floor\" or \"ceil\"")]
pub struct ParseRoundingError(String);

impl FromStr for PageRounding {
    type Err = ParseRoundingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "floor" => Ok(PageRounding::Floor),
            "ceil" => Ok(PageRounding::Ceil),
            _ => Err(ParseRoundingError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    pub rounding: PageRounding,
    /// Upper bound on pages fetched per query
    pub max_pages: Option<u32>,
    /// Pages still outstanding at this instant are skipped
    pub deadline: Option<Instant>,
}

impl SearchOptions {
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl From<&SearchConfig> for SearchOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            rounding: config.page_rounding,
            max_pages: config.max_pages,
            deadline: None,
        }
    }
}

/// Resolves once `deadline` has passed, never when there is none
pub(crate) async fn deadline_reached(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) if Instant::now() >= deadline => {}
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Merged results of every page of one query
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregatedSearch {
    /// Items in page order, then source order within a page
    pub items: Vec<SearchResult>,
    pub found: u32,
    /// Pages that failed and were left out of `items`
    pub skipped_pages: Vec<u32>,
}

impl AggregatedSearch {
    pub fn is_partial(&self) -> bool {
        !self.skipped_pages.is_empty()
    }
}

/// Fetch every page of `query` and merge the items.
///
/// Page 0 must succeed since it carries the total. Later pages are best
/// effort: a failed page is logged, recorded in `skipped_pages` and skipped.
/// Once the deadline passes, the page in flight and every page after it are
/// skipped too. No de-duplication is performed.
pub async fn search_all<S>(
    source: &S,
    query: &str,
    options: &SearchOptions,
    cancel: &CancellationToken,
) -> Result<AggregatedSearch, FetchError>
where
    S: VacancySource + ?Sized,
{
    let first = fetch_page(source, query, 0, options.deadline, cancel).await?;

    let mut total_pages = options.rounding.page_count(first.found);
    if let Some(max_pages) = options.max_pages {
        total_pages = total_pages.min(max_pages.max(1));
    }
    info!(query = %query, found = first.found, total_pages, "Starting paginated search");

    let mut result = AggregatedSearch {
        items: first.items,
        found: first.found,
        skipped_pages: Vec::new(),
    };

    for page in 1..total_pages {
        match fetch_page(source, query, page, options.deadline, cancel).await {
            Ok(next) => {
                debug!(page, count = next.items.len(), "Merged search page");
                result.items.extend(next.items);
            }
            Err(FetchError::Cancelled) => return Err(FetchError::Cancelled),
            Err(FetchError::DeadlineExceeded) => {
                warn!(
                    query = %query,
                    page,
                    remaining = total_pages - page,
                    "Search deadline reached, skipping remaining pages"
                );
                result.skipped_pages.extend(page..total_pages);
                break;
            }
            Err(e) => {
                warn!(query = %query, page, error = %e, "Skipping search page");
                result.skipped_pages.push(page);
            }
        }
    }

    if result.is_partial() {
        warn!(
            query = %query,
            skipped = ?result.skipped_pages,
            "Search completed with missing pages"
        );
    }
    info!(query = %query, count = result.items.len(), "Search completed");

    Ok(result)
}

async fn fetch_page<S>(
    source: &S,
    query: &str,
    page: u32,
    deadline: Option<Instant>,
    cancel: &CancellationToken,
) -> Result<SearchPage, FetchError>
where
    S: VacancySource + ?Sized,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FetchError::Cancelled),
        _ = deadline_reached(deadline) => Err(FetchError::DeadlineExceeded),
        page = source.search_page(query, page) => page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hh::VacancyDetail;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Serves `found` synthetic results, 100 per page, failing the listed pages
    struct StubSource {
        found: u32,
        failing: HashSet<u32>,
        requested: Mutex<Vec<u32>>,
    }

    impl StubSource {
        fn new(found: u32) -> Self {
            Self {
                found,
                failing: HashSet::new(),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn failing(mut self, page: u32) -> Self {
            self.failing.insert(page);
            self
        }

        fn requested(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VacancySource for StubSource {
        async fn search_page(&self, _query: &str, page: u32) -> Result<SearchPage, FetchError> {
            self.requested.lock().unwrap().push(page);
            if self.failing.contains(&page) {
                return Err(FetchError::UpstreamStatus {
                    url: "/vacancies".to_string(),
                    status: 503,
                    body: String::new(),
                });
            }

            let start = page * PAGE_SIZE;
            let end = self.found.min(start + PAGE_SIZE);
            Ok(SearchPage {
                items: (start..end).map(|i| SearchResult::new(format!("v{}", i))).collect(),
                page,
                pages: self.found.div_ceil(PAGE_SIZE),
                found: self.found,
            })
        }

        async fn vacancy_detail(&self, _id: &str) -> Result<VacancyDetail, FetchError> {
            unreachable!("search never fetches details")
        }
    }

    async fn run(source: &StubSource, options: SearchOptions) -> Result<AggregatedSearch, FetchError> {
        search_all(source, "backend", &options, &CancellationToken::new()).await
    }

    #[test]
    fn test_page_count() {
        assert_eq!(PageRounding::Ceil.page_count(0), 1);
        assert_eq!(PageRounding::Ceil.page_count(100), 1);
        assert_eq!(PageRounding::Ceil.page_count(101), 2);
        assert_eq!(PageRounding::Ceil.page_count(250), 3);
        assert_eq!(PageRounding::Floor.page_count(50), 1);
        assert_eq!(PageRounding::Floor.page_count(250), 2);
        assert_eq!(PageRounding::Floor.page_count(300), 3);
    }

    #[test]
    fn test_parse_rounding() {
        assert_eq!("Floor".parse::<PageRounding>().unwrap(), PageRounding::Floor);
        assert_eq!(" ceil ".parse::<PageRounding>().unwrap(), PageRounding::Ceil);
        assert!("round".parse::<PageRounding>().is_err());
    }

    #[tokio::test]
    async fn test_single_page_when_found_fits() {
        for found in [0, 1, 99, 100] {
            let source = StubSource::new(found);
            let result = run(&source, SearchOptions::default()).await.unwrap();
            assert_eq!(source.requested(), vec![0], "found = {found}");
            assert_eq!(result.items.len(), found as usize);
        }
    }

    #[tokio::test]
    async fn test_ceil_fetches_trailing_partial_page() {
        let source = StubSource::new(250);
        let result = run(&source, SearchOptions::default()).await.unwrap();

        assert_eq!(source.requested(), vec![0, 1, 2]);
        assert_eq!(result.items.len(), 250);
        assert_eq!(result.items.first().unwrap().id, "v0");
        assert_eq!(result.items.last().unwrap().id, "v249");
        assert!(!result.is_partial());
    }

    #[tokio::test]
    async fn test_floor_reproduces_reference_page_count() {
        let source = StubSource::new(250);
        let options = SearchOptions {
            rounding: PageRounding::Floor,
            ..SearchOptions::default()
        };
        let result = run(&source, options).await.unwrap();

        assert_eq!(source.requested(), vec![0, 1]);
        assert_eq!(result.items.len(), 200);
    }

    #[tokio::test]
    async fn test_failed_page_is_skipped() {
        let source = StubSource::new(250).failing(1);
        let result = run(&source, SearchOptions::default()).await.unwrap();

        assert_eq!(source.requested(), vec![0, 1, 2]);
        assert_eq!(result.skipped_pages, vec![1]);
        assert_eq!(result.items.len(), 150);
        // page order survives the gap
        assert_eq!(result.items[99].id, "v99");
        assert_eq!(result.items[100].id, "v200");
    }

    #[tokio::test]
    async fn test_first_page_failure_is_an_error() {
        let source = StubSource::new(250).failing(0);
        let err = run(&source, SearchOptions::default()).await.unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert_eq!(source.requested(), vec![0]);
    }

    #[tokio::test]
    async fn test_max_pages_caps_requests() {
        let source = StubSource::new(5_000);
        let options = SearchOptions {
            max_pages: Some(3),
            ..SearchOptions::default()
        };
        let result = run(&source, options).await.unwrap();

        assert_eq!(source.requested(), vec![0, 1, 2]);
        assert_eq!(result.found, 5_000);
        assert_eq!(result.items.len(), 300);
    }

    #[tokio::test]
    async fn test_cancelled_search_stops() {
        let source = StubSource::new(250);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = search_all(&source, "backend", &SearchOptions::default(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Cancelled));
        assert!(source.requested().is_empty());
    }

    /// Page 0 answers at once; every later page never completes
    struct HangingSource;

    #[async_trait]
    impl VacancySource for HangingSource {
        async fn search_page(&self, _query: &str, page: u32) -> Result<SearchPage, FetchError> {
            if page > 0 {
                std::future::pending::<()>().await;
            }
            Ok(SearchPage {
                items: (0..PAGE_SIZE).map(|i| SearchResult::new(format!("v{}", i))).collect(),
                page,
                pages: 3,
                found: 250,
            })
        }

        async fn vacancy_detail(&self, _id: &str) -> Result<VacancyDetail, FetchError> {
            unreachable!("search never fetches details")
        }
    }

    #[tokio::test]
    async fn test_cancel_interrupts_request_in_flight() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let options = SearchOptions::default();
        let search = search_all(&HangingSource, "backend", &options, &cancel);
        let err = tokio::time::timeout(Duration::from_secs(5), search)
            .await
            .expect("search ignored cancellation")
            .unwrap_err();

        assert!(matches!(err, FetchError::Cancelled));
    }

    #[tokio::test]
    async fn test_deadline_returns_partial_results() {
        let options = SearchOptions::default()
            .with_deadline(Instant::now() + Duration::from_millis(50));

        let cancel = CancellationToken::new();
        let search = search_all(&HangingSource, "backend", &options, &cancel);
        let result = tokio::time::timeout(Duration::from_secs(5), search)
            .await
            .expect("search ignored its deadline")
            .unwrap();

        assert_eq!(result.found, 250);
        assert_eq!(result.items.len(), 100);
        assert_eq!(result.skipped_pages, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_deadline_before_first_page_is_an_error() {
        let source = StubSource::new(250);
        let options = SearchOptions::default().with_deadline(Instant::now());

        let err = search_all(&source, "backend", &options, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::DeadlineExceeded));
        assert!(source.requested().is_empty());
    }
}
