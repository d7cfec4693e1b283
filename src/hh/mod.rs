//! Job board access
//!
//! The rest of the crate talks to the job board through two traits:
//! - [`VacancySource`]: public search and detail lookups
//! - [`ApplicantApi`]: calls made on behalf of an authenticated user
//!
//! [`HhClient`] implements both against the hh.ru REST API; tests swap in
//! in-memory stubs.

pub mod client;
pub mod types;

use async_trait::async_trait;

pub use client::{FetchError, HhClient};
pub use types::{
    Credentials, Negotiation, NegotiationPage, Resume, SearchPage, SearchResult, VacancyDetail,
    MAX_REACHABLE_RESULTS, PAGE_SIZE,
};

#[async_trait]
pub trait VacancySource: Send + Sync {
    /// Fetch one page (`page` is zero-based) of vacancies whose name matches `query`
    async fn search_page(&self, query: &str, page: u32) -> Result<SearchPage, FetchError>;

    async fn vacancy_detail(&self, id: &str) -> Result<VacancyDetail, FetchError>;
}

#[async_trait]
pub trait ApplicantApi: Send + Sync {
    async fn negotiations_page(
        &self,
        credentials: &Credentials,
        page: u32,
    ) -> Result<NegotiationPage, FetchError>;

    async fn resumes(&self, credentials: &Credentials) -> Result<Vec<Resume>, FetchError>;

    /// Submit an application for `vacancy_id` using the given resume
    async fn apply(
        &self,
        credentials: &Credentials,
        resume_id: &str,
        vacancy_id: &str,
    ) -> Result<(), FetchError>;
}

/// Everything the HTTP layer needs from the job board
pub trait JobBoard: VacancySource + ApplicantApi {}

impl<T: VacancySource + ApplicantApi + ?Sized> JobBoard for T {}
