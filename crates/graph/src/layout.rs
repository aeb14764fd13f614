//! Node placement
//!
//! Every algorithm returns one position per node, in node order. All of them
//! except `random` are centered on the origin and scaled so the largest
//! coordinate has magnitude 1.

use crate::graph::CitationGraph;
use citagraph_common::errors::{AppError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

/// Seed of the spring layout, fixed so the picture is stable across reloads
pub const SPRING_SEED: u64 = 42;

/// Smallest distance used in force computations
const MIN_DISTANCE: f64 = 0.01;

/// Sweeps of the Kamada-Kawai majorization
const STRESS_SWEEPS: usize = 300;

/// Layout algorithm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutKind {
    #[default]
    Spring,
    Circular,
    KamadaKawai,
    Random,
    FruchtermanReingold,
}

impl LayoutKind {
    pub const ALL: [LayoutKind; 5] = [
        LayoutKind::Spring,
        LayoutKind::Circular,
        LayoutKind::KamadaKawai,
        LayoutKind::Random,
        LayoutKind::FruchtermanReingold,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LayoutKind::Spring => "spring",
            LayoutKind::Circular => "circular",
            LayoutKind::KamadaKawai => "kamada-kawai",
            LayoutKind::Random => "random",
            LayoutKind::FruchtermanReingold => "fruchterman-reingold",
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        LayoutKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::Validation {
                message: format!(
                    "Unknown layout '{}', expected one of: spring, circular, kamada-kawai, random, fruchterman-reingold",
                    s
                ),
                field: Some("layout".to_string()),
            })
    }
}

/// Layout tuning
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Force-directed iterations
    pub iterations: usize,

    /// Seed for `random` and `fruchterman-reingold`; drawn fresh when absent
    pub seed: Option<u64>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            iterations: 50,
            seed: None,
        }
    }
}

/// A node position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Compute positions for every node of `graph`
pub fn compute_layout(graph: &CitationGraph<'_>, kind: LayoutKind, options: &LayoutOptions) -> Vec<Point> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }

    let seed = options.seed.unwrap_or_else(rand::random);
    let positions = match kind {
        LayoutKind::Random => return random_layout(n, seed),
        _ if n == 1 => return vec![Point::ORIGIN],
        LayoutKind::Spring => force_directed(graph, options.iterations, SPRING_SEED),
        LayoutKind::FruchtermanReingold => force_directed(graph, options.iterations, seed),
        LayoutKind::Circular => circular(n),
        LayoutKind::KamadaKawai => kamada_kawai(graph),
    };

    tracing::debug!(layout = %kind, nodes = n, "Layout computed");
    rescale(positions)
}

/// Uniform positions in the unit square
fn random_layout(n: usize, seed: u64) -> Vec<Point> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| Point::new(rng.gen(), rng.gen())).collect()
}

/// Evenly spaced on the unit circle, first node at angle 0
fn circular(n: usize) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let theta = TAU * i as f64 / n as f64;
            Point::new(theta.cos(), theta.sin())
        })
        .collect()
}

/// Fruchterman-Reingold: repulsion between all pairs, attraction along
/// edges, displacement capped by a linearly cooling temperature.
fn force_directed(graph: &CitationGraph<'_>, iterations: usize, seed: u64) -> Vec<Point> {
    let n = graph.node_count();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut pos: Vec<Point> = (0..n).map(|_| Point::new(rng.gen(), rng.gen())).collect();

    // Optimal distance between nodes
    let k = (1.0 / n as f64).sqrt();
    let mut temperature = 0.1;
    let cooling = temperature / (iterations as f64 + 1.0);

    for _ in 0..iterations {
        let mut displacement = vec![Point::ORIGIN; n];

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let dx = pos[i].x - pos[j].x;
                let dy = pos[i].y - pos[j].y;
                let distance = dx.hypot(dy).max(MIN_DISTANCE);

                let attraction = if graph.is_adjacent(i, j) { distance / k } else { 0.0 };
                let force = k * k / (distance * distance) - attraction;

                displacement[i].x += dx * force;
                displacement[i].y += dy * force;
            }
        }

        for (p, d) in pos.iter_mut().zip(&displacement) {
            let length = d.x.hypot(d.y).max(MIN_DISTANCE);
            p.x += d.x * temperature / length;
            p.y += d.y * temperature / length;
        }

        temperature -= cooling;
    }

    pos
}

/// Kamada-Kawai by stress majorization: graph distances are the target
/// Euclidean distances, weighted by `1 / d²`. Unreachable pairs get the
/// largest finite distance plus one.
fn kamada_kawai(graph: &CitationGraph<'_>) -> Vec<Point> {
    let n = graph.node_count();
    let hops = graph.undirected_distances();

    let longest = hops.iter().flatten().flatten().copied().max().unwrap_or(0);
    let target: Vec<Vec<f64>> = hops
        .iter()
        .map(|row| {
            row.iter()
                .map(|d| d.unwrap_or(longest + 1) as f64)
                .collect()
        })
        .collect();

    let mut pos = circular(n);

    for _ in 0..STRESS_SWEEPS {
        let mut moved: f64 = 0.0;

        for i in 0..n {
            let (mut sum_x, mut sum_y, mut sum_w) = (0.0, 0.0, 0.0);

            for j in 0..n {
                if i == j {
                    continue;
                }
                let d = target[i][j];
                let w = 1.0 / (d * d);
                let current = pos[i].distance(pos[j]);

                let (ux, uy) = if current > f64::EPSILON {
                    ((pos[i].x - pos[j].x) / current, (pos[i].y - pos[j].y) / current)
                } else {
                    (0.0, 0.0)
                };

                sum_x += w * (pos[j].x + d * ux);
                sum_y += w * (pos[j].y + d * uy);
                sum_w += w;
            }

            let next = Point::new(sum_x / sum_w, sum_y / sum_w);
            moved = moved.max(next.distance(pos[i]));
            pos[i] = next;
        }

        if moved < 1e-6 {
            break;
        }
    }

    pos
}

/// Center on the origin and scale the largest coordinate to magnitude 1
pub fn rescale(mut positions: Vec<Point>) -> Vec<Point> {
    if positions.is_empty() {
        return positions;
    }

    let n = positions.len() as f64;
    let mean_x = positions.iter().map(|p| p.x).sum::<f64>() / n;
    let mean_y = positions.iter().map(|p| p.y).sum::<f64>() / n;

    for p in &mut positions {
        p.x -= mean_x;
        p.y -= mean_y;
    }

    let limit = positions
        .iter()
        .flat_map(|p| [p.x.abs(), p.y.abs()])
        .fold(0.0_f64, f64::max);

    if limit > 0.0 {
        for p in &mut positions {
            p.x /= limit;
            p.y /= limit;
        }
    }

    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use citagraph_common::models::PaperDraft;
    use citagraph_common::Library;

    fn chain(n: usize) -> Library {
        let mut lib = Library::new();
        for i in 0..n {
            lib.add_paper(PaperDraft {
                id: Some(format!("p{}", i)),
                title: format!("Paper {}", i),
                ..Default::default()
            })
            .unwrap();
        }
        for i in 1..n {
            lib.add_citation(&format!("p{}", i), &format!("p{}", i - 1)).unwrap();
        }
        lib
    }

    fn in_unit_box(points: &[Point]) -> bool {
        points
            .iter()
            .all(|p| p.x.abs() <= 1.0 + 1e-9 && p.y.abs() <= 1.0 + 1e-9)
    }

    #[test]
    fn test_parse_layout_kind() {
        assert_eq!("kamada-kawai".parse::<LayoutKind>().unwrap(), LayoutKind::KamadaKawai);
        assert_eq!("Spring".parse::<LayoutKind>().unwrap(), LayoutKind::Spring);
        assert!("hexagonal".parse::<LayoutKind>().is_err());
        for kind in LayoutKind::ALL {
            assert_eq!(kind.as_str().parse::<LayoutKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_empty_and_single_node() {
        let empty = Library::new();
        let graph = CitationGraph::from_library(&empty);
        for kind in LayoutKind::ALL {
            assert!(compute_layout(&graph, kind, &LayoutOptions::default()).is_empty());
        }

        let one = chain(1);
        let graph = CitationGraph::from_library(&one);
        let pos = compute_layout(&graph, LayoutKind::Spring, &LayoutOptions::default());
        assert_eq!(pos, vec![Point::ORIGIN]);
    }

    #[test]
    fn test_every_layout_stays_in_bounds() {
        let lib = chain(12);
        let graph = CitationGraph::from_library(&lib);
        let options = LayoutOptions {
            seed: Some(7),
            ..Default::default()
        };

        for kind in LayoutKind::ALL {
            let pos = compute_layout(&graph, kind, &options);
            assert_eq!(pos.len(), 12, "{}", kind);
            assert!(pos.iter().all(|p| p.x.is_finite() && p.y.is_finite()), "{}", kind);
            assert!(in_unit_box(&pos), "{}", kind);
        }
    }

    #[test]
    fn test_random_layout_in_unit_square() {
        let lib = chain(30);
        let graph = CitationGraph::from_library(&lib);
        let pos = compute_layout(&graph, LayoutKind::Random, &LayoutOptions::default());
        assert!(pos.iter().all(|p| (0.0..1.0).contains(&p.x) && (0.0..1.0).contains(&p.y)));
    }

    #[test]
    fn test_spring_is_deterministic() {
        let lib = chain(8);
        let graph = CitationGraph::from_library(&lib);

        // The request seed does not affect the spring layout
        let a = compute_layout(&graph, LayoutKind::Spring, &LayoutOptions { seed: Some(1), ..Default::default() });
        let b = compute_layout(&graph, LayoutKind::Spring, &LayoutOptions { seed: Some(2), ..Default::default() });
        assert_eq!(a, b);
    }

    #[test]
    fn test_seeded_fruchterman_reingold_is_reproducible() {
        let lib = chain(8);
        let graph = CitationGraph::from_library(&lib);
        let options = LayoutOptions {
            seed: Some(99),
            ..Default::default()
        };
        assert_eq!(
            compute_layout(&graph, LayoutKind::FruchtermanReingold, &options),
            compute_layout(&graph, LayoutKind::FruchtermanReingold, &options)
        );
    }

    #[test]
    fn test_circular_on_unit_circle() {
        let lib = chain(6);
        let graph = CitationGraph::from_library(&lib);
        let pos = compute_layout(&graph, LayoutKind::Circular, &LayoutOptions::default());

        assert!((pos[0].x - 1.0).abs() < 1e-9 && pos[0].y.abs() < 1e-9);
        for p in &pos {
            assert!((p.x.hypot(p.y) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_kamada_kawai_preserves_graph_distance_order() {
        let lib = chain(5);
        let graph = CitationGraph::from_library(&lib);
        let pos = compute_layout(&graph, LayoutKind::KamadaKawai, &LayoutOptions::default());

        // Ends of a path are farther apart than neighbors
        assert!(pos[0].distance(pos[4]) > pos[0].distance(pos[1]));
    }

    #[test]
    fn test_rescale() {
        let pos = rescale(vec![Point::new(2.0, 2.0), Point::new(4.0, 6.0)]);
        assert_eq!(pos, vec![Point::new(-0.5, -1.0), Point::new(0.5, 1.0)]);
        assert_eq!(rescale(vec![Point::new(3.0, 3.0)]), vec![Point::ORIGIN]);
    }
}
