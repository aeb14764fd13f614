//! Graph rendering handlers

use super::blocking;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use citagraph_common::{errors::Result, metrics, Library};
use citagraph_graph::{
    build_figure, render_svg, CitationGraph, ColorMode, Figure, FigureRequest, LayoutKind,
    LayoutOptions, SvgOptions,
};
use serde::Deserialize;
use std::time::Instant;

/// Query parameters shared by the figure, the SVG, and the page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphQuery {
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub selected: Option<String>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl GraphQuery {
    /// Resolve names against the configured defaults; unknown names are rejected
    pub fn to_request(&self, state: &AppState) -> Result<FigureRequest> {
        let layout = match self.layout.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(name) => name.parse::<LayoutKind>()?,
            None => state.default_layout(),
        };
        let color = match self.color.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(name) => name.parse::<ColorMode>()?,
            None => state.default_color_mode(),
        };

        Ok(FigureRequest {
            layout,
            color,
            selected: self
                .selected
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            options: LayoutOptions {
                iterations: state.config.render.layout_iterations,
                seed: self.seed,
            },
        })
    }
}

/// Lay out and build the figure for an already loaded library
pub(crate) fn figure_for(library: &Library, request: &FigureRequest) -> Figure {
    let graph = CitationGraph::from_library(library);
    build_figure(&graph, request)
}

async fn load_and_render<T, F>(state: &AppState, request: FigureRequest, format: &'static str, draw: F) -> Result<T>
where
    F: FnOnce(&Figure) -> T + Send + 'static,
    T: Send + 'static,
{
    let store = state.store.clone();
    let layout = request.layout;
    let start = Instant::now();

    let out = blocking(move || {
        let library = store.load()?;
        let figure = figure_for(&library, &request);
        Ok(draw(&figure))
    })
    .await?;

    metrics::record_render(start.elapsed().as_secs_f64(), layout.as_str(), format);
    Ok(out)
}

/// Figure as JSON
pub async fn graph_json(
    State(state): State<AppState>,
    Query(query): Query<GraphQuery>,
) -> Result<Json<Figure>> {
    let request = query.to_request(&state)?;
    let figure = load_and_render(&state, request, "json", Figure::clone).await?;
    Ok(Json(figure))
}

/// Figure as a standalone SVG document
pub async fn graph_svg(
    State(state): State<AppState>,
    Query(query): Query<GraphQuery>,
) -> Result<Response> {
    let request = query.to_request(&state)?;
    let options = SvgOptions {
        width: state.config.render.width,
        height: state.config.render.height,
        link_query: None,
    };

    let svg = load_and_render(&state, request, "svg", move |figure| render_svg(figure, &options)).await?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}
