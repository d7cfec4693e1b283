//! hh.ru REST client
//!
//! Thin `reqwest` wrapper over the handful of endpoints the service needs:
//! - `GET /vacancies` and `GET /vacancies/{id}` (public)
//! - `GET /negotiations`, `GET /resumes/mine` and `POST /negotiations`
//!   (authorized with the caller's bearer token)
//!
//! The client keeps no per-user state. Credentials travel with each call so
//! one instance can be shared by every request handler and worker.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use super::types::{
    Credentials, NegotiationPage, Resume, ResumeList, SearchPage, VacancyDetail, PAGE_SIZE,
};
use super::{ApplicantApi, VacancySource};
use crate::config::HhConfig;

/// Errors from a single call to the job board
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{url} returned status {status}: {body}")]
    UpstreamStatus { url: String, status: u16, body: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl FetchError {
    /// Upstream HTTP status, if the request got that far
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::UpstreamStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub struct HhClient {
    client: Client,
    base_url: Url,
    experience: Option<String>,
}

impl HhClient {
    pub fn new(config: &HhConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        let base_url = Url::parse(config.api_url.trim_end_matches('/'))
            .with_context(|| format!("invalid hh API URL {:?}", config.api_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("hh API URL {:?} cannot carry a path", config.api_url);
        }

        Ok(Self {
            client,
            base_url,
            experience: config.experience.clone(),
        })
    }

    /// Base URL with `segments` appended. Each segment is percent-encoded,
    /// `/` and `?` included, so caller-supplied ids stay inside one segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments.iter().copied());
        }
        url
    }

    /// Send the request and decode a JSON body, mapping each failure mode
    /// onto its own [`FetchError`] variant.
    async fn execute<T: DeserializeOwned>(
        &self,
        url: &str,
        request: RequestBuilder,
    ) -> Result<T, FetchError> {
        let body = self.send(url, request).await?;
        serde_json::from_str(&body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<String, FetchError> {
        let network = |source| FetchError::Network {
            url: url.to_string(),
            source,
        };

        let response = request.send().await.map_err(network)?;
        let status = response.status();
        let body = response.text().await.map_err(network)?;

        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "hh API returned an error status");
            return Err(FetchError::UpstreamStatus {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

fn authorized(request: RequestBuilder, credentials: &Credentials) -> RequestBuilder {
    request.bearer_auth(credentials.access_token())
}

#[async_trait]
impl VacancySource for HhClient {
    async fn search_page(&self, query: &str, page: u32) -> Result<SearchPage, FetchError> {
        let url = self.endpoint(&["vacancies"]);
        debug!(query = %query, page, "Fetching vacancy search page");

        let mut params = vec![
            ("text", format!("name:{}", query)),
            ("archived", "false".to_string()),
            ("page", page.to_string()),
            ("per_page", PAGE_SIZE.to_string()),
        ];
        if let Some(experience) = &self.experience {
            params.push(("experience", experience.clone()));
        }

        let request = self.client.get(url.clone()).query(&params);
        self.execute(url.as_str(), request).await
    }

    async fn vacancy_detail(&self, id: &str) -> Result<VacancyDetail, FetchError> {
        let url = self.endpoint(&["vacancies", id]);
        debug!(vacancy_id = %id, "Fetching vacancy detail");

        self.execute(url.as_str(), self.client.get(url.clone())).await
    }
}

#[async_trait]
impl ApplicantApi for HhClient {
    async fn negotiations_page(
        &self,
        credentials: &Credentials,
        page: u32,
    ) -> Result<NegotiationPage, FetchError> {
        let url = self.endpoint(&["negotiations"]);
        let request = self
            .client
            .get(url.clone())
            .query(&[("page", page.to_string()), ("per_page", PAGE_SIZE.to_string())]);

        self.execute(url.as_str(), authorized(request, credentials)).await
    }

    async fn resumes(&self, credentials: &Credentials) -> Result<Vec<Resume>, FetchError> {
        let url = self.endpoint(&["resumes", "mine"]);
        let list: ResumeList = self
            .execute(url.as_str(), authorized(self.client.get(url.clone()), credentials))
            .await?;
        Ok(list.items)
    }

    async fn apply(
        &self,
        credentials: &Credentials,
        resume_id: &str,
        vacancy_id: &str,
    ) -> Result<(), FetchError> {
        let url = self.endpoint(&["negotiations"]);
        let request = self
            .client
            .post(url.clone())
            .query(&[("vacancy_id", vacancy_id), ("resume_id", resume_id)]);

        self.send(url.as_str(), authorized(request, credentials)).await?;
        debug!(vacancy_id = %vacancy_id, "Application submitted");
        Ok(())
    }
}
