// JobSearch - vacancy search and bulk applications over the hh.ru API

pub mod config;
pub mod hh;        // Job board client and wire types
pub mod models;
pub mod types;
pub mod search;    // Paginated search aggregation and response filtering
pub mod queue;     // Bounded worker pool
pub mod vacancies; // Detail enrichment and bulk applications
pub mod routes;
pub mod middleware;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
