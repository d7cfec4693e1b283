use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use crate::middleware::{bearer_credentials, require_credentials};
use crate::models::{
    AppState, ApplyParams, ApplyRequest, DetailsRequest, SearchParams, SearchResponse,
};
use crate::search::{filter_unresponded, responded_ids, search_all, SearchOptions};
use crate::types::{AppError, AppResult};
use crate::vacancies::{apply_all, fetch_details, owns_resume, ApplyReport, DetailReport};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/vacancies", get(search_vacancies))
        .route("/vacancies/", get(search_vacancies))
        .route("/vacancies/details", post(vacancy_details))
        .route("/vacancy/response", post(respond_to_vacancies))
        .with_state(state)
}

async fn search_vacancies(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<SearchResponse>> {
    let title = params.title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidRequest("title must not be empty".to_string()));
    }

    let deadline = state.deadline();
    let cancel = state.shutdown.child_token();

    // History first: it is required, while search pages may be skipped once
    // the deadline passes.
    let responded = match bearer_credentials(&headers) {
        Some(credentials) => {
            Some(responded_ids(state.board.as_ref(), &credentials, Some(deadline), &cancel).await?)
        }
        None => None,
    };

    let options = SearchOptions::from(&state.config.search).with_deadline(deadline);
    let search = search_all(state.board.as_ref(), title, &options, &cancel).await?;

    let result = match responded {
        Some(responded) => {
            let total = search.items.len();
            let fresh = filter_unresponded(search.items, &responded);
            info!(total, fresh = fresh.len(), "Filtered out vacancies already responded to");
            fresh
        }
        None => search.items,
    };

    Ok(Json(SearchResponse {
        found: search.found,
        skipped_pages: search.skipped_pages,
        result,
    }))
}

/// hh vacancy ids are alphanumeric
fn is_vacancy_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric())
}

fn check_vacancy_ids(ids: &[String]) -> AppResult<()> {
    match ids.iter().find(|id| !is_vacancy_id(id)) {
        Some(id) => Err(AppError::InvalidRequest(format!("invalid vacancy id {:?}", id))),
        None => Ok(()),
    }
}

async fn vacancy_details(
    State(state): State<AppState>,
    Json(request): Json<DetailsRequest>,
) -> AppResult<Json<DetailReport>> {
    check_vacancy_ids(&request.ids)?;

    let requested = request.ids.clone();
    let pool = state.worker_pool(state.deadline());
    let outcomes = fetch_details(Arc::clone(&state.board), request.ids, &pool).await;

    Ok(Json(DetailReport::from_outcomes(&requested, outcomes)))
}

async fn respond_to_vacancies(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ApplyParams>,
    Json(request): Json<ApplyRequest>,
) -> AppResult<Json<ApplyReport>> {
    let credentials = require_credentials(&headers)?;
    check_vacancy_ids(&request.vacancy_ids)?;
    let resume_id = params.resume_id.trim().to_string();
    let deadline = state.deadline();

    if resume_id.is_empty() || !owns_resume(state.board.as_ref(), &credentials, &resume_id).await? {
        return Err(AppError::InvalidRequest("Invalid resume_id".to_string()));
    }

    let report = apply_all(
        Arc::clone(&state.board),
        credentials,
        resume_id,
        request.vacancy_ids,
        &state.worker_pool(deadline),
    )
    .await;

    Ok(Json(report))
}
