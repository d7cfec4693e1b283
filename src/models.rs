use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::hh::{JobBoard, SearchResult};
use crate::queue::WorkerPool;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub board: Arc<dyn JobBoard>,
    /// Root token, cancelled when the server shuts down
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Config, board: Arc<dyn JobBoard>) -> Self {
        Self {
            config,
            board,
            shutdown: CancellationToken::new(),
        }
    }

    /// Instant by which a request started now has to stop calling upstream
    pub fn deadline(&self) -> Instant {
        Instant::now() + self.config.search.budget()
    }

    /// Fresh pool for one request; it stops at `deadline` or when the server
    /// shuts down
    pub fn worker_pool(&self, deadline: Instant) -> WorkerPool {
        WorkerPool::new(self.config.search.workers, self.shutdown.child_token())
            .with_deadline(deadline)
    }
}

// API Request/Response types

#[derive(Debug, serde::Deserialize)]
pub struct SearchParams {
    pub title: String,
}

#[derive(Debug, serde::Serialize)]
pub struct SearchResponse {
    pub found: u32,
    pub skipped_pages: Vec<u32>,
    pub result: Vec<SearchResult>,
}

#[derive(Debug, serde::Deserialize)]
pub struct DetailsRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct ApplyParams {
    pub resume_id: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct ApplyRequest {
    pub vacancy_ids: Vec<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}
