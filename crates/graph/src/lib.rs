//! Citagraph graph rendering
//!
//! Turns a [`citagraph_common::Library`] into something to look at:
//! - a directed citation graph
//! - node layouts (spring, circular, Kamada-Kawai, random, Fruchterman-Reingold)
//! - color coding by first author, PI, or decade
//! - a renderer-neutral figure and its SVG rendering
//! - the filtered library table and per-paper connections

pub mod color;
pub mod figure;
pub mod graph;
pub mod layout;
pub mod svg;
pub mod table;

pub use color::{ColorMode, Rgb};
pub use figure::{build_figure, Figure, FigureRequest};
pub use graph::CitationGraph;
pub use layout::{compute_layout, LayoutKind, LayoutOptions, Point};
pub use svg::{render_svg, SvgOptions};
pub use table::{connections, library_table, Connections, PaperRow, TableFilter};
