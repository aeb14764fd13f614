//! Paper management handlers

use super::blocking;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use citagraph_common::{
    auth::AdminContext,
    errors::{AppError, Result},
    library::ImportOutcome,
    models::{Paper, PaperDraft, PaperPatch},
};
use citagraph_graph::{connections, library_table, Connections, PaperRow, TableFilter};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize)]
pub struct PaperListResponse {
    pub papers: Vec<PaperRow>,
    pub total: usize,
    pub matched: usize,
}

/// Request to import a paper by DOI
#[derive(Debug, Deserialize, Validate)]
pub struct ImportRequest {
    #[validate(length(min = 1, max = 256))]
    pub doi: String,

    /// PI to record instead of the one derived from the author list
    #[serde(default)]
    pub pi_override: Option<String>,
}

/// Library table, optionally filtered
pub async fn list_papers(
    State(state): State<AppState>,
    Query(filter): Query<TableFilter>,
) -> Result<Json<PaperListResponse>> {
    let store = state.store.clone();
    let library = blocking(move || store.load()).await?;

    let papers = library_table(&library, &filter);
    Ok(Json(PaperListResponse {
        total: library.paper_count(),
        matched: papers.len(),
        papers,
    }))
}

/// Get a paper by id
pub async fn get_paper(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Paper>> {
    let store = state.store.clone();
    let library = blocking(move || store.load()).await?;

    Ok(Json(library.require_paper(&id)?.clone()))
}

/// Papers citing and cited by a paper
pub async fn get_connections(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Connections>> {
    let store = state.store.clone();
    let library = blocking(move || store.load()).await?;

    Ok(Json(connections(&library, &id)?))
}

/// Add a paper
pub async fn create_paper(
    State(state): State<AppState>,
    _admin: AdminContext,
    Json(draft): Json<PaperDraft>,
) -> Result<(StatusCode, Json<Paper>)> {
    draft.validate()?;

    let store = state.store.clone();
    let paper = blocking(move || store.update("add_paper", |library| library.add_paper(draft))).await?;

    tracing::info!(paper_id = %paper.id, "Paper added");
    Ok((StatusCode::CREATED, Json(paper)))
}

/// Edit fields of a paper
pub async fn update_paper(
    State(state): State<AppState>,
    _admin: AdminContext,
    Path(id): Path<String>,
    Json(patch): Json<PaperPatch>,
) -> Result<Json<Paper>> {
    patch.validate()?;

    let store = state.store.clone();
    let paper = blocking(move || {
        store.update("update_paper", |library| library.update_paper(&id, patch))
    })
    .await?;

    tracing::info!(paper_id = %paper.id, "Paper updated");
    Ok(Json(paper))
}

/// Delete a paper and every citation touching it
pub async fn delete_paper(
    State(state): State<AppState>,
    _admin: AdminContext,
    Path(id): Path<String>,
) -> Result<Json<Paper>> {
    let store = state.store.clone();
    let paper = blocking(move || store.update("delete_paper", |library| library.delete_paper(&id))).await?;

    tracing::info!(paper_id = %paper.id, "Paper deleted");
    Ok(Json(paper))
}

/// Fetch metadata for a DOI and add the paper with its citations
pub async fn import_paper(
    State(state): State<AppState>,
    _admin: AdminContext,
    Json(request): Json<ImportRequest>,
) -> Result<(StatusCode, Json<ImportOutcome>)> {
    request.validate()?;

    let doi = request.doi.trim().to_string();
    if doi.is_empty() {
        return Err(AppError::MissingField {
            field: "doi".to_string(),
        });
    }

    let metadata = state.metadata.fetch(&doi).await?;
    tracing::debug!(
        doi = %doi,
        provider = state.metadata.name(),
        references = metadata.references.len(),
        "Fetched paper metadata"
    );

    let store = state.store.clone();
    let pi_override = request.pi_override;
    let outcome = blocking(move || {
        store.update("import_paper", |library| {
            library.import_metadata(&doi, metadata, pi_override)
        })
    })
    .await?;

    tracing::info!(
        paper_id = %outcome.paper.id,
        citations_added = outcome.citations_added,
        replaced_existing = outcome.replaced_existing,
        "Paper imported"
    );
    Ok((StatusCode::CREATED, Json(outcome)))
}
