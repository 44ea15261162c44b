//! Dijkstra shortest-path search over the trace graph.

use super::TraceGraph;
use crate::geometry::{Point, Polyline};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

// Min-heap entry; BinaryHeap is a max-heap so the ordering is reversed.
// Ties on distance break on the vertex index for determinism.
#[derive(Clone, Copy, PartialEq)]
struct QueueEntry {
    distance: f64,
    vertex: usize,
}

impl Eq for QueueEntry {}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .partial_cmp(&self.distance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl TraceGraph {
    /// Find the shortest path between two vertices.
    ///
    /// Returns the stitched polyline from `start` to `goal`, or an empty
    /// polyline when no route exists. Edge weights are polyline lengths,
    /// which are never negative, so the search finalizes each vertex the
    /// first time it is dequeued; superseded heap entries are skipped
    /// rather than decreased in place.
    pub fn shortest_path(&self, start: usize, goal: usize) -> Polyline {
        let vertex_count = self.vertices.len();
        if start >= vertex_count || goal >= vertex_count {
            return Polyline::new();
        }

        let mut distance = vec![f64::MAX; vertex_count];
        let mut finalized = vec![false; vertex_count];
        let mut predecessor: Vec<Option<usize>> = vec![None; vertex_count];
        let mut queue = BinaryHeap::new();

        distance[start] = 0.0;
        queue.push(QueueEntry {
            distance: 0.0,
            vertex: start,
        });

        let mut current = usize::MAX;
        while let Some(entry) = queue.pop() {
            current = entry.vertex;
            if current == goal {
                break;
            }
            if finalized[current] {
                continue;
            }

            for &edge_index in &self.vertices[current].edges {
                if !self.is_edge_active(edge_index) {
                    continue;
                }
                let edge = &self.edges[edge_index];
                let neighbor = edge.other_vertex(current);
                let weight = edge.weight();
                if !finalized[neighbor] && distance[current] + weight < distance[neighbor] {
                    distance[neighbor] = distance[current] + weight;
                    predecessor[neighbor] = Some(edge_index);
                    queue.push(QueueEntry {
                        distance: distance[neighbor],
                        vertex: neighbor,
                    });
                }
            }
            finalized[current] = true;
        }

        if current != goal {
            return Polyline::new();
        }

        // walk the predecessor edges from the goal back to the start,
        // orienting each edge polyline away from the current vertex and
        // dropping the overlap point shared with the previous edge
        let mut points: Vec<Point> = Vec::new();
        let mut vertex = goal;
        while let Some(edge_index) = predecessor[vertex] {
            let edge = &self.edges[edge_index];
            let mut coords = edge.coords.clone();
            if coords.first_point() != Some(self.vertices[vertex].point) {
                coords.reverse();
            }
            if !points.is_empty() {
                points.pop();
            }
            points.extend_from_slice(coords.points());
            vertex = edge.other_vertex(vertex);
        }
        points.reverse();
        Polyline::from_points(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(points: &[(f64, f64)]) -> Polyline {
        Polyline::from_points(points.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    fn vertex_at(graph: &TraceGraph, x: f64, y: f64) -> usize {
        graph
            .point_to_vertex(&Point::new(x, y), 1e-6)
            .expect("vertex present")
    }

    #[test]
    fn test_path_through_shared_vertex() {
        let graph = TraceGraph::from_linework(&[
            line(&[(0.0, 0.0), (5.0, 0.0)]),
            line(&[(5.0, 0.0), (10.0, 0.0)]),
            line(&[(5.0, -5.0), (5.0, 0.0)]),
            line(&[(5.0, 0.0), (5.0, 5.0)]),
        ]);
        let start = vertex_at(&graph, 0.0, 0.0);
        let goal = vertex_at(&graph, 5.0, 5.0);

        let path = graph.shortest_path(start, goal);
        assert_eq!(
            path.points(),
            &[
                Point::new(0.0, 0.0),
                Point::new(5.0, 0.0),
                Point::new(5.0, 5.0)
            ]
        );
        assert!((path.length() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_direct_edge_beats_detour() {
        let graph = TraceGraph::from_linework(&[
            line(&[(0.0, 0.0), (10.0, 0.0)]),
            line(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]),
        ]);
        let start = vertex_at(&graph, 0.0, 0.0);
        let goal = vertex_at(&graph, 10.0, 0.0);

        let path = graph.shortest_path(start, goal);
        assert!((path.length() - 10.0).abs() < 1e-9);
        assert_eq!(path.num_points(), 2);
    }

    #[test]
    fn test_parallel_edges_use_shorter() {
        let graph = TraceGraph::from_linework(&[
            line(&[(0.0, 0.0), (0.0, 7.0), (10.0, 7.0), (10.0, 0.0)]),
            line(&[(0.0, 0.0), (10.0, 0.0)]),
        ]);
        let path = graph.shortest_path(0, 1);
        assert!((path.length() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_disconnected_returns_empty() {
        let graph = TraceGraph::from_linework(&[
            line(&[(0.0, 0.0), (1.0, 0.0)]),
            line(&[(5.0, 5.0), (6.0, 5.0)]),
        ]);
        let start = vertex_at(&graph, 0.0, 0.0);
        let goal = vertex_at(&graph, 6.0, 5.0);
        assert!(graph.shortest_path(start, goal).is_empty());
    }

    #[test]
    fn test_same_vertex_returns_empty() {
        let graph = TraceGraph::from_linework(&[line(&[(0.0, 0.0), (1.0, 0.0)])]);
        assert!(graph.shortest_path(0, 0).is_empty());
    }

    #[test]
    fn test_out_of_range_returns_empty() {
        let graph = TraceGraph::from_linework(&[line(&[(0.0, 0.0), (1.0, 0.0)])]);
        assert!(graph.shortest_path(0, 99).is_empty());
    }

    #[test]
    fn test_multi_hop_path_orientation() {
        // edges stored with mixed orientations; the stitched path must
        // still run start -> goal without jumps
        let graph = TraceGraph::from_linework(&[
            line(&[(5.0, 0.0), (0.0, 0.0)]),
            line(&[(5.0, 0.0), (5.0, 5.0), (10.0, 5.0)]),
            line(&[(10.0, 5.0), (10.0, 0.0)]),
        ]);
        let start = vertex_at(&graph, 0.0, 0.0);
        let goal = vertex_at(&graph, 10.0, 0.0);

        let path = graph.shortest_path(start, goal);
        assert_eq!(path.first_point(), Some(Point::new(0.0, 0.0)));
        assert_eq!(path.last_point(), Some(Point::new(10.0, 0.0)));
        let points = path.points();
        for pair in points.windows(2) {
            assert!(pair[0].distance(&pair[1]) <= 5.0 + 1e-9);
        }
        assert!((path.length() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_weight_loop_is_harmless() {
        let graph = TraceGraph::from_linework(&[
            line(&[(0.0, 0.0), (0.0, 0.0)]),
            line(&[(0.0, 0.0), (1.0, 0.0)]),
        ]);
        let start = vertex_at(&graph, 0.0, 0.0);
        let goal = vertex_at(&graph, 1.0, 0.0);
        let path = graph.shortest_path(start, goal);
        assert!((path.length() - 1.0).abs() < 1e-12);
    }
}
