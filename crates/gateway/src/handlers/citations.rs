//! Citation edge handlers

use super::blocking;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use citagraph_common::{
    auth::AdminContext,
    errors::Result,
    models::{Citation, CitationInput},
};
use serde::Serialize;

#[derive(Serialize)]
pub struct CitationResponse {
    pub citing_id: String,
    pub cited_id: String,
}

impl From<Citation> for CitationResponse {
    fn from(c: Citation) -> Self {
        Self {
            citing_id: c.citing_id,
            cited_id: c.cited_id,
        }
    }
}

/// Record that one paper cites another
pub async fn create_citation(
    State(state): State<AppState>,
    _admin: AdminContext,
    Json(input): Json<CitationInput>,
) -> Result<(StatusCode, Json<CitationResponse>)> {
    let store = state.store.clone();
    let citation = blocking(move || {
        store.update("add_citation", |library| {
            library.add_citation(input.citing_id.trim(), input.cited_id.trim())
        })
    })
    .await?;

    tracing::info!(
        citing_id = %citation.citing_id,
        cited_id = %citation.cited_id,
        "Citation added"
    );
    Ok((StatusCode::CREATED, Json(citation.into())))
}

/// Remove a citation
pub async fn delete_citation(
    State(state): State<AppState>,
    _admin: AdminContext,
    Path((citing_id, cited_id)): Path<(String, String)>,
) -> Result<Json<CitationResponse>> {
    let store = state.store.clone();
    let citation = blocking(move || {
        store.update("remove_citation", |library| {
            library.remove_citation(&citing_id, &cited_id)
        })
    })
    .await?;

    tracing::info!(
        citing_id = %citation.citing_id,
        cited_id = %citation.cited_id,
        "Citation removed"
    );
    Ok(Json(citation.into()))
}
