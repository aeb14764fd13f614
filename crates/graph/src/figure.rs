//! Renderer-neutral description of a drawn graph
//!
//! A [`Figure`] is a list of edge traces (line segments sharing a style)
//! followed by node traces (markers sharing a color and legend entry).

use crate::color::{decade_color, decade_label, AuthorPalette, ColorMode, Rgb};
use crate::graph::{CitationGraph, NodeIndex};
use crate::layout::{compute_layout, LayoutKind, LayoutOptions, Point};
use serde::Serialize;

/// Edges when nothing is selected
pub const EDGE_COLOR: &str = "rgba(128,128,128,0.6)";
/// Edges away from the selected paper
pub const FADED_EDGE_COLOR: &str = "rgba(180,180,180,0.2)";
/// Edges touching the selected paper
pub const HIGHLIGHT_EDGE_COLOR: &str = "rgba(50,50,50,0.8)";

pub const NODE_SIZE: f64 = 12.0;
pub const SELECTED_NODE_SIZE: f64 = 20.0;
pub const NEIGHBOR_NODE_SIZE: f64 = 16.0;
pub const NEIGHBOR_OPACITY: f64 = 0.9;
pub const DIMMED_OPACITY: f64 = 0.3;

/// What to draw
#[derive(Debug, Clone, Default)]
pub struct FigureRequest {
    pub layout: LayoutKind,
    pub color: ColorMode,
    /// Paper to highlight; ids not in the library are ignored
    pub selected: Option<String>,
    pub options: LayoutOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub layout: LayoutKind,
    pub color_mode: ColorMode,
    pub selected: Option<String>,
    pub edge_traces: Vec<EdgeTrace>,
    pub node_traces: Vec<NodeTrace>,
}

/// Line segments drawn with one style
#[derive(Debug, Clone, Serialize)]
pub struct EdgeTrace {
    pub color: &'static str,
    pub width: f64,
    pub edges: Vec<EdgeSegment>,
}

/// One citation, from the citing to the cited paper
#[derive(Debug, Clone, Serialize)]
pub struct EdgeSegment {
    pub citing_id: String,
    pub cited_id: String,
    pub from: Point,
    pub to: Point,
}

/// Markers sharing a color and a legend entry
#[derive(Debug, Clone, Serialize)]
pub struct NodeTrace {
    pub name: String,
    pub color: Rgb,
    pub nodes: Vec<NodeMarker>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeMarker {
    pub id: String,
    pub position: Point,
    pub size: f64,
    pub opacity: f64,
    /// Tooltip lines: title, first author, PI, year, paper id
    pub hover: Vec<String>,
}

impl Figure {
    /// Number of markers across all traces
    pub fn node_count(&self) -> usize {
        self.node_traces.iter().map(|t| t.nodes.len()).sum()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_traces.iter().map(|t| t.edges.len()).sum()
    }

    pub fn markers(&self) -> impl Iterator<Item = (&NodeTrace, &NodeMarker)> {
        self.node_traces
            .iter()
            .flat_map(|trace| trace.nodes.iter().map(move |node| (trace, node)))
    }

    pub fn marker(&self, id: &str) -> Option<&NodeMarker> {
        self.markers().map(|(_, node)| node).find(|node| node.id == id)
    }
}

/// Lay out the graph and build its figure
pub fn build_figure(graph: &CitationGraph<'_>, request: &FigureRequest) -> Figure {
    let positions = compute_layout(graph, request.layout, &request.options);
    let selected = request
        .selected
        .as_deref()
        .and_then(|id| graph.index_of(id));

    Figure {
        layout: request.layout,
        color_mode: request.color,
        selected: selected.map(|i| graph.paper(i).id.clone()),
        edge_traces: edge_traces(graph, &positions, selected),
        node_traces: node_traces(graph, &positions, selected, request.color),
    }
}

fn edge_traces(graph: &CitationGraph<'_>, positions: &[Point], selected: Option<NodeIndex>) -> Vec<EdgeTrace> {
    let segment = |&(citing, cited): &(NodeIndex, NodeIndex)| EdgeSegment {
        citing_id: graph.paper(citing).id.clone(),
        cited_id: graph.paper(cited).id.clone(),
        from: positions[citing],
        to: positions[cited],
    };

    let Some(selected) = selected else {
        return vec![EdgeTrace {
            color: EDGE_COLOR,
            width: 1.0,
            edges: graph.edges().iter().map(segment).collect(),
        }];
    };

    let (highlighted, normal): (Vec<_>, Vec<_>) = graph
        .edges()
        .iter()
        .partition(|&&(citing, cited)| citing == selected || cited == selected);

    let mut traces = Vec::with_capacity(2);
    if !normal.is_empty() {
        traces.push(EdgeTrace {
            color: FADED_EDGE_COLOR,
            width: 1.0,
            edges: normal.into_iter().map(segment).collect(),
        });
    }
    if !highlighted.is_empty() {
        traces.push(EdgeTrace {
            color: HIGHLIGHT_EDGE_COLOR,
            width: 2.0,
            edges: highlighted.into_iter().map(segment).collect(),
        });
    }
    traces
}

/// Size and opacity of a node given the selection
fn emphasis(graph: &CitationGraph<'_>, node: NodeIndex, selected: Option<NodeIndex>) -> (f64, f64) {
    match selected {
        None => (NODE_SIZE, 1.0),
        Some(s) if s == node => (SELECTED_NODE_SIZE, 1.0),
        Some(s) if graph.is_adjacent(s, node) => (NEIGHBOR_NODE_SIZE, NEIGHBOR_OPACITY),
        Some(_) => (NODE_SIZE, DIMMED_OPACITY),
    }
}

fn node_traces(
    graph: &CitationGraph<'_>,
    positions: &[Point],
    selected: Option<NodeIndex>,
    mode: ColorMode,
) -> Vec<NodeTrace> {
    let mut palette = AuthorPalette::new();
    // (sort key, trace); the key only matters for decades
    let mut groups: Vec<(Option<i32>, NodeTrace)> = Vec::new();

    for (node, paper) in graph.papers().iter().enumerate() {
        let (key, name, color) = match mode {
            ColorMode::FirstAuthor => (None, paper.author.clone(), palette.color_for(&paper.author)),
            ColorMode::Pi => (None, paper.pi.clone(), palette.color_for(&paper.pi)),
            ColorMode::Decade => {
                let decade = paper.decade();
                (decade, decade_label(decade), decade_color(decade))
            }
        };

        let (size, opacity) = emphasis(graph, node, selected);
        let marker = NodeMarker {
            id: paper.id.clone(),
            position: positions[node],
            size,
            opacity,
            hover: vec![
                paper.title.clone(),
                format!("First Author: {}", paper.author),
                format!("PI: {}", paper.pi),
                format!("Year: {}", paper.year),
                format!("Paper ID: {}", paper.id),
            ],
        };

        match groups.iter_mut().find(|(_, trace)| trace.name == name) {
            Some((_, trace)) => trace.nodes.push(marker),
            None => groups.push((
                key,
                NodeTrace {
                    name,
                    color,
                    nodes: vec![marker],
                },
            )),
        }
    }

    if mode == ColorMode::Decade {
        // Chronological, unknown last
        groups.sort_by_key(|(decade, _)| (decade.is_none(), *decade));
    }

    groups.into_iter().map(|(_, trace)| trace).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::AUTHOR_COLORS;
    use citagraph_common::models::PaperDraft;
    use citagraph_common::Library;

    fn paper(lib: &mut Library, id: &str, author: &str, pi: &str, year: &str) {
        lib.add_paper(PaperDraft {
            id: Some(id.to_string()),
            title: format!("Title {}", id),
            author: Some(author.to_string()),
            pi: Some(pi.to_string()),
            year: Some(year.to_string()),
            ..Default::default()
        })
        .unwrap();
    }

    fn sample() -> Library {
        let mut lib = Library::new();
        paper(&mut lib, "a", "Curie", "Bohr", "2012");
        paper(&mut lib, "b", "Noether", "Bohr", "Unknown");
        paper(&mut lib, "c", "Curie", "Dirac", "1987");
        paper(&mut lib, "d", "Meitner", "Dirac", "2015");
        lib.add_citation("b", "a").unwrap();
        lib.add_citation("c", "a").unwrap();
        lib.add_citation("d", "c").unwrap();
        lib
    }

    fn request(color: ColorMode, selected: Option<&str>) -> FigureRequest {
        FigureRequest {
            layout: LayoutKind::Circular,
            color,
            selected: selected.map(String::from),
            options: LayoutOptions::default(),
        }
    }

    #[test]
    fn test_author_traces_in_first_appearance_order() {
        let lib = sample();
        let graph = CitationGraph::from_library(&lib);
        let figure = build_figure(&graph, &request(ColorMode::FirstAuthor, None));

        let names: Vec<&str> = figure.node_traces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Curie", "Noether", "Meitner"]);
        assert_eq!(figure.node_traces[0].nodes.len(), 2);
        assert_eq!(figure.node_traces[0].color, AUTHOR_COLORS[0]);
        assert_eq!(figure.node_traces[2].color, AUTHOR_COLORS[2]);
        assert_eq!(figure.node_count(), 4);
    }

    #[test]
    fn test_pi_traces() {
        let lib = sample();
        let graph = CitationGraph::from_library(&lib);
        let figure = build_figure(&graph, &request(ColorMode::Pi, None));

        let names: Vec<&str> = figure.node_traces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Bohr", "Dirac"]);
    }

    #[test]
    fn test_decade_traces_chronological_unknown_last() {
        let lib = sample();
        let graph = CitationGraph::from_library(&lib);
        let figure = build_figure(&graph, &request(ColorMode::Decade, None));

        let names: Vec<&str> = figure.node_traces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["1980s", "2010s", "Unknown"]);
        assert_eq!(figure.node_traces[1].nodes.len(), 2);
        assert_eq!(figure.node_traces[0].color, Rgb(255, 255, 0));
        assert_eq!(figure.node_traces[2].color, Rgb(128, 128, 128));
    }

    #[test]
    fn test_no_selection_single_edge_trace() {
        let lib = sample();
        let graph = CitationGraph::from_library(&lib);
        let figure = build_figure(&graph, &request(ColorMode::FirstAuthor, None));

        assert_eq!(figure.edge_traces.len(), 1);
        assert_eq!(figure.edge_traces[0].color, EDGE_COLOR);
        assert_eq!(figure.edge_count(), 3);
        assert!(figure.markers().all(|(_, m)| m.size == NODE_SIZE && m.opacity == 1.0));
    }

    #[test]
    fn test_selection_highlights_neighbors() {
        let lib = sample();
        let graph = CitationGraph::from_library(&lib);
        let figure = build_figure(&graph, &request(ColorMode::FirstAuthor, Some("a")));

        assert_eq!(figure.selected.as_deref(), Some("a"));
        assert_eq!(figure.marker("a").unwrap().size, SELECTED_NODE_SIZE);
        let neighbor = figure.marker("b").unwrap();
        assert_eq!((neighbor.size, neighbor.opacity), (NEIGHBOR_NODE_SIZE, NEIGHBOR_OPACITY));
        let other = figure.marker("d").unwrap();
        assert_eq!((other.size, other.opacity), (NODE_SIZE, DIMMED_OPACITY));

        assert_eq!(figure.edge_traces.len(), 2);
        assert_eq!(figure.edge_traces[0].color, FADED_EDGE_COLOR);
        assert_eq!(figure.edge_traces[0].edges.len(), 1);
        assert_eq!(figure.edge_traces[1].color, HIGHLIGHT_EDGE_COLOR);
        assert_eq!(figure.edge_traces[1].width, 2.0);
        assert_eq!(figure.edge_traces[1].edges.len(), 2);
    }

    #[test]
    fn test_unknown_selection_is_ignored() {
        let lib = sample();
        let graph = CitationGraph::from_library(&lib);
        let figure = build_figure(&graph, &request(ColorMode::FirstAuthor, Some("nope")));

        assert!(figure.selected.is_none());
        assert_eq!(figure.edge_traces.len(), 1);
    }

    #[test]
    fn test_hover_text() {
        let lib = sample();
        let graph = CitationGraph::from_library(&lib);
        let figure = build_figure(&graph, &request(ColorMode::FirstAuthor, None));

        assert_eq!(
            figure.marker("c").unwrap().hover,
            vec!["Title c", "First Author: Curie", "PI: Dirac", "Year: 1987", "Paper ID: c"]
        );
    }

    #[test]
    fn test_empty_library() {
        let lib = Library::new();
        let graph = CitationGraph::from_library(&lib);
        let figure = build_figure(&graph, &request(ColorMode::Decade, None));
        assert_eq!(figure.node_count(), 0);
        assert_eq!(figure.edge_count(), 0);
    }
}
