//! SVG rendering of a [`Figure`]
//!
//! Edges are drawn first with arrowheads at the cited paper, then markers
//! per trace, then the legend. Every marker carries its hover lines as a
//! `<title>` tooltip and, when a link query is given, links to the same
//! page with the paper selected.

use crate::figure::Figure;
use crate::layout::Point;
use std::collections::HashMap;

pub const FONT_FAMILY: &str = "Times New Roman";
const MARKER_OUTLINE: &str = "DarkSlateGrey";
const LEGEND_WIDTH: f64 = 220.0;
const LEGEND_ROW: f64 = 22.0;
const MARGIN: f64 = 10.0;
const MARGIN_TOP: f64 = 40.0;

/// Canvas and link settings
#[derive(Debug, Clone)]
pub struct SvgOptions {
    pub width: u32,
    pub height: u32,
    /// Query string (without `?` or trailing `&`) kept on click-to-select
    /// links; `None` disables links
    pub link_query: Option<String>,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            width: 960,
            height: 800,
            link_query: None,
        }
    }
}

/// Maps layout coordinates onto the plot area
struct Viewport {
    min: Point,
    span_x: f64,
    span_y: f64,
    left: f64,
    top: f64,
    plot_w: f64,
    plot_h: f64,
}

impl Viewport {
    fn fit(figure: &Figure, options: &SvgOptions) -> Self {
        let (mut min, mut max) = (Point::new(f64::MAX, f64::MAX), Point::new(f64::MIN, f64::MIN));
        for (_, node) in figure.markers() {
            min.x = min.x.min(node.position.x);
            min.y = min.y.min(node.position.y);
            max.x = max.x.max(node.position.x);
            max.y = max.y.max(node.position.y);
        }
        if figure.node_count() == 0 {
            min = Point::new(-1.0, -1.0);
            max = Point::new(1.0, 1.0);
        }

        // Degenerate extents (single node, collinear nodes) get a unit span
        let span = |lo: &mut f64, hi: f64| {
            let s = hi - *lo;
            if s < 1e-9 {
                *lo -= 1.0;
                2.0
            } else {
                s
            }
        };
        let span_x = span(&mut min.x, max.x);
        let span_y = span(&mut min.y, max.y);

        // Leave room for the largest marker on every side
        let pad = 14.0;
        let left = MARGIN + pad;
        let top = MARGIN_TOP + pad;
        let plot_w = (options.width as f64 - LEGEND_WIDTH - left - MARGIN - pad).max(1.0);
        let plot_h = (options.height as f64 - top - MARGIN - pad).max(1.0);

        Self {
            min,
            span_x,
            span_y,
            left,
            top,
            plot_w,
            plot_h,
        }
    }

    fn project(&self, p: Point) -> Point {
        Point::new(
            self.left + (p.x - self.min.x) / self.span_x * self.plot_w,
            // SVG y grows downwards
            self.top + self.plot_h - (p.y - self.min.y) / self.span_y * self.plot_h,
        )
    }
}

/// Render a figure as a standalone SVG document
pub fn render_svg(figure: &Figure, options: &SvgOptions) -> String {
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" font-family=\"{font}\" font-size=\"16\">\n",
        w = options.width,
        h = options.height,
        font = FONT_FAMILY,
    );
    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");

    if figure.node_count() == 0 {
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" fill=\"black\">No papers in the library yet</text>\n</svg>\n",
            options.width / 2,
            options.height / 2
        ));
        return svg;
    }

    let viewport = Viewport::fit(figure, options);
    let radius: HashMap<&str, f64> = figure
        .markers()
        .map(|(_, node)| (node.id.as_str(), node.size / 2.0))
        .collect();

    // Arrowheads, one per edge style
    svg.push_str("<defs>\n");
    for (i, trace) in figure.edge_traces.iter().enumerate() {
        svg.push_str(&format!(
            "  <marker id=\"arrow-{}\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>\n",
            i, trace.color
        ));
    }
    svg.push_str("</defs>\n");

    svg.push_str("<g class=\"edges\">\n");
    for (i, trace) in figure.edge_traces.iter().enumerate() {
        for edge in &trace.edges {
            let from = viewport.project(edge.from);
            let to = viewport.project(edge.to);
            let (dx, dy) = (to.x - from.x, to.y - from.y);
            let length = dx.hypot(dy);
            // Self-citations and coincident nodes have nothing to draw
            if length < 1.0 {
                continue;
            }

            // Stop at the rim of the cited marker so the arrowhead stays visible
            let inset = radius.get(edge.cited_id.as_str()).copied().unwrap_or(6.0) + 1.0;
            let end = Point::new(to.x - dx / length * inset, to.y - dy / length * inset);

            svg.push_str(&format!(
                "  <line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"{}\" marker-end=\"url(#arrow-{})\"/>\n",
                from.x, from.y, end.x, end.y, trace.color, trace.width, i
            ));
        }
    }
    svg.push_str("</g>\n");

    svg.push_str("<g class=\"nodes\">\n");
    for trace in &figure.node_traces {
        svg.push_str(&format!("  <g class=\"trace\" data-name=\"{}\">\n", escape_xml(&trace.name)));
        for node in &trace.nodes {
            let p = viewport.project(node.position);
            let circle = format!(
                "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{}\" fill=\"{}\" opacity=\"{}\" stroke=\"{}\" stroke-width=\"2\" data-id=\"{}\"><title>{}</title></circle>",
                p.x,
                p.y,
                node.size / 2.0,
                trace.color,
                node.opacity,
                MARKER_OUTLINE,
                escape_xml(&node.id),
                escape_xml(&node.hover.join("\n")),
            );
            match &options.link_query {
                Some(query) => svg.push_str(&format!(
                    "    <a href=\"{}\">{}</a>\n",
                    escape_xml(&select_href(query, &node.id)),
                    circle
                )),
                None => svg.push_str(&format!("    {}\n", circle)),
            }
        }
        svg.push_str("  </g>\n");
    }
    svg.push_str("</g>\n");

    render_legend(&mut svg, figure, options);
    svg.push_str("</svg>\n");
    svg
}

fn render_legend(svg: &mut String, figure: &Figure, options: &SvgOptions) {
    let x = options.width as f64 - LEGEND_WIDTH;
    let y = MARGIN_TOP;
    let height = LEGEND_ROW * figure.node_traces.len() as f64 + 10.0;

    svg.push_str(&format!(
        "<g class=\"legend\" font-size=\"14\">\n  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"white\" stroke=\"black\" stroke-width=\"1\"/>\n",
        x,
        y,
        LEGEND_WIDTH - MARGIN,
        height
    ));
    for (i, trace) in figure.node_traces.iter().enumerate() {
        let row = y + 5.0 + LEGEND_ROW * i as f64 + LEGEND_ROW / 2.0;
        svg.push_str(&format!(
            "  <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"6\" fill=\"{}\" stroke=\"{}\" stroke-width=\"2\"/>\n  <text x=\"{:.1}\" y=\"{:.1}\" dominant-baseline=\"middle\" fill=\"black\">{}</text>\n",
            x + 14.0,
            row,
            trace.color,
            MARKER_OUTLINE,
            x + 28.0,
            row,
            escape_xml(&trace.name)
        ));
    }
    svg.push_str("</g>\n");
}

/// Link that reselects `paper_id` while keeping the other query parameters
pub fn select_href(query: &str, paper_id: &str) -> String {
    let query = query.trim_start_matches('?').trim_end_matches('&');
    if query.is_empty() {
        format!("?selected={}", urlencoding::encode(paper_id))
    } else {
        format!("?{}&selected={}", query, urlencoding::encode(paper_id))
    }
}

/// Escape text for XML/HTML content and attribute values
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorMode;
    use crate::figure::{build_figure, FigureRequest};
    use crate::graph::CitationGraph;
    use crate::layout::LayoutKind;
    use citagraph_common::models::PaperDraft;
    use citagraph_common::Library;

    fn library() -> Library {
        let mut lib = Library::new();
        for (id, title) in [("0001", "Graphs & <Trees>"), ("0002", "Second")] {
            lib.add_paper(PaperDraft {
                id: Some(id.to_string()),
                title: title.to_string(),
                author: Some("Curie".to_string()),
                ..Default::default()
            })
            .unwrap();
        }
        lib.add_citation("0002", "0001").unwrap();
        lib
    }

    fn figure(lib: &Library, selected: Option<&str>) -> Figure {
        let graph = CitationGraph::from_library(lib);
        build_figure(
            &graph,
            &FigureRequest {
                layout: LayoutKind::Circular,
                color: ColorMode::FirstAuthor,
                selected: selected.map(String::from),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_render_basic() {
        let lib = library();
        let svg = render_svg(&figure(&lib, None), &SvgOptions::default());

        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<circle cx").count(), 2 + 1); // two markers, one legend swatch
        assert_eq!(svg.matches("<line ").count(), 1);
        assert!(svg.contains("marker-end=\"url(#arrow-0)\""));
        assert!(svg.contains("Graphs &amp; &lt;Trees&gt;"));
        assert!(svg.contains("Times New Roman"));
        assert!(!svg.contains("<a href"));
    }

    #[test]
    fn test_render_links_and_selection() {
        let lib = library();
        let options = SvgOptions {
            link_query: Some("layout=circular&color=pi".to_string()),
            ..Default::default()
        };
        let svg = render_svg(&figure(&lib, Some("0001")), &options);

        assert!(svg.contains("href=\"?layout=circular&amp;color=pi&amp;selected=0001\""));
        assert!(svg.contains("rgba(50,50,50,0.8)"));
        assert!(svg.contains("r=\"10\""));
    }

    #[test]
    fn test_render_empty() {
        let lib = Library::new();
        let svg = render_svg(&figure(&lib, None), &SvgOptions::default());
        assert!(svg.contains("No papers in the library yet"));
        assert!(!svg.contains("<circle"));
    }

    #[test]
    fn test_select_href() {
        assert_eq!(select_href("", "10.1/abc"), "?selected=10.1%2Fabc");
        assert_eq!(select_href("?layout=spring&", "a b"), "?layout=spring&selected=a%20b");
        assert_eq!(select_href("", "x&y=z#"), "?selected=x%26y%3Dz%23");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("<a href=\"x\">'&'</a>"), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }
}
