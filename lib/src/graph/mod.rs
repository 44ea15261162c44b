//! Planar graph over polyline linework.
//!
//! The graph is built once from a set of polylines: every polyline becomes
//! one edge and the deduplicated polyline endpoints become the vertices.
//! During a path query, arbitrary planar points are grafted into the graph
//! by splitting the edge they lie on; [`TraceGraph::reset`] undoes all
//! grafts so the next query starts from the original graph.
//!
//! # Temporary modifications
//!
//! [`TraceGraph::join_point`] appends exactly one vertex and two edges at
//! the tail of the vertex and edge arrays and deactivates the split edge.
//! That layout makes the revert cheap: truncate the transient tails, then
//! reinstate every deactivated edge that survived the truncation.

mod shortest_path;

use crate::geometry::{Point, Polyline};
use std::collections::{HashMap, HashSet};

/// A graph vertex: a planar point plus the indices of its incident edges.
#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    /// Location of the vertex.
    pub point: Point,
    /// Indices of adjacent active edges.
    pub edges: Vec<usize>,
}

/// An undirected graph edge carrying its full polyline geometry.
///
/// The polyline endpoints match the two vertex locations, in either order;
/// traversal orientation is recovered from endpoint identity.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    /// First endpoint vertex index.
    pub v1: usize,
    /// Second endpoint vertex index.
    pub v2: usize,
    /// Coordinates of the edge, including both endpoints.
    pub coords: Polyline,
}

impl Edge {
    /// The endpoint on the other side of `v0`.
    #[inline]
    pub fn other_vertex(&self, v0: usize) -> usize {
        if self.v1 == v0 {
            self.v2
        } else {
            self.v1
        }
    }

    /// Edge weight: the planar length of its polyline.
    #[inline]
    pub fn weight(&self) -> f64 {
        self.coords.length()
    }
}

/// Planar graph for shortest-path tracing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TraceGraph {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    /// Temporarily deactivated edges (split by a graft).
    inactive_edges: HashSet<usize>,
    /// Number of transient vertices appended since the last reset. Each one
    /// came with two transient edges.
    joined_vertices: usize,
}

impl TraceGraph {
    /// Build a graph from a set of polylines.
    ///
    /// Each polyline becomes one edge; endpoints are deduplicated under
    /// exact coordinate equality. Polylines with fewer than two points are
    /// skipped. A polyline whose endpoints coincide produces a degenerate
    /// loop edge, which the path search treats as an ordinary zero-weight
    /// cycle. Duplicate polylines produce parallel edges.
    pub fn from_linework(lines: &[Polyline]) -> Self {
        let mut graph = TraceGraph::default();
        let mut point_to_vertex: HashMap<(u64, u64), usize> = HashMap::new();

        for line in lines {
            let (first, last) = match (line.first_point(), line.last_point()) {
                (Some(first), Some(last)) if !line.is_empty() => (first, last),
                _ => continue,
            };

            let v1 = *point_to_vertex
                .entry(point_key(&first))
                .or_insert_with(|| {
                    graph.vertices.push(Vertex {
                        point: first,
                        edges: Vec::new(),
                    });
                    graph.vertices.len() - 1
                });
            let v2 = *point_to_vertex
                .entry(point_key(&last))
                .or_insert_with(|| {
                    graph.vertices.push(Vertex {
                        point: last,
                        edges: Vec::new(),
                    });
                    graph.vertices.len() - 1
                });

            graph.edges.push(Edge {
                v1,
                v2,
                coords: line.clone(),
            });
            let edge_index = graph.edges.len() - 1;
            graph.vertices[v1].edges.push(edge_index);
            graph.vertices[v2].edges.push(edge_index);
        }

        graph
    }

    /// The graph vertices.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// The graph edges.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of transient vertices currently grafted in.
    pub fn joined_vertices(&self) -> usize {
        self.joined_vertices
    }

    /// Whether an edge participates in queries.
    #[inline]
    pub fn is_edge_active(&self, index: usize) -> bool {
        index < self.edges.len() && !self.inactive_edges.contains(&index)
    }

    /// Find the first vertex whose point coincides with `pt` within
    /// `epsilon`.
    pub fn point_to_vertex(&self, pt: &Point, epsilon: f64) -> Option<usize> {
        self.vertices
            .iter()
            .position(|v| v.point.coincides_with(pt, epsilon))
    }

    /// Find the lowest-indexed active edge passing through `pt`.
    ///
    /// Returns the edge index together with the index of the polyline
    /// vertex immediately following the hit point.
    pub fn point_to_edge(&self, pt: &Point, epsilon: f64) -> Option<(usize, usize)> {
        for (index, edge) in self.edges.iter().enumerate() {
            if self.inactive_edges.contains(&index) {
                continue;
            }
            if let Some(hit) = edge.coords.closest_segment(pt, epsilon) {
                if hit.distance <= epsilon {
                    return Some((index, hit.vertex_after));
                }
            }
        }
        None
    }

    /// Graft `pt` into the graph by splitting the edge it lies on.
    ///
    /// Appends one transient vertex and two transient edges (the two split
    /// halves), deactivates the original edge, and rewires the original
    /// endpoints to the halves. Returns the new vertex index, or `None`
    /// when the point is not on any active edge.
    pub fn join_point(&mut self, pt: Point, epsilon: f64) -> Option<usize> {
        let (edge_index, vertex_after) = self.point_to_edge(&pt, epsilon)?;

        let edge = &self.edges[edge_index];
        let (a, b) = (edge.v1, edge.v2);
        let (first_half, second_half) = edge.coords.split_at(pt, vertex_after);

        let new_vertex = self.vertices.len();
        let first_edge = self.edges.len();
        let second_edge = first_edge + 1;

        self.vertices.push(Vertex {
            point: pt,
            edges: vec![first_edge, second_edge],
        });
        self.edges.push(Edge {
            v1: a,
            v2: new_vertex,
            coords: first_half,
        });
        self.edges.push(Edge {
            v1: new_vertex,
            v2: b,
            coords: second_half,
        });

        replace_edge_index(&mut self.vertices[a].edges, edge_index, first_edge);
        replace_edge_index(&mut self.vertices[b].edges, edge_index, second_edge);

        self.inactive_edges.insert(edge_index);
        self.joined_vertices += 1;
        Some(new_vertex)
    }

    /// Resolve a planar point to a vertex index: an existing vertex when
    /// one coincides, otherwise a transient vertex grafted onto the edge
    /// the point lies on. `None` when the point is not in the graph.
    pub fn point_in_graph(&mut self, pt: Point, epsilon: f64) -> Option<usize> {
        if let Some(vertex) = self.point_to_vertex(&pt, epsilon) {
            return Some(vertex);
        }
        self.join_point(pt, epsilon)
    }

    /// Undo all grafts since the last reset, restoring the original graph.
    pub fn reset(&mut self) {
        self.vertices
            .truncate(self.vertices.len() - self.joined_vertices);
        self.edges
            .truncate(self.edges.len() - self.joined_vertices * 2);
        self.joined_vertices = 0;

        let edge_count = self.edges.len();
        let inactive = std::mem::take(&mut self.inactive_edges);
        for edge_index in inactive {
            if edge_index >= edge_count {
                continue;
            }
            let (v1, v2) = (self.edges[edge_index].v1, self.edges[edge_index].v2);
            for vertex in [v1, v2] {
                let list = &mut self.vertices[vertex].edges;
                list.retain(|&i| i < edge_count);
                list.push(edge_index);
            }
        }
    }
}

// Exact-equality hash key; the builder deduplicates endpoints bitwise.
#[inline]
fn point_key(pt: &Point) -> (u64, u64) {
    (pt.x.to_bits(), pt.y.to_bits())
}

fn replace_edge_index(list: &mut [usize], from: usize, to: usize) {
    if let Some(slot) = list.iter_mut().find(|i| **i == from) {
        *slot = to;
    }
}
