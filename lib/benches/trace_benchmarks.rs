//! Tracing benchmarks
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::rc::Rc;
use tracer::geometry::{Point, Polyline};
use tracer::source::{Geometry, MemoryLayer};
use tracer::{TraceGraph, Tracer};

// An n x n street grid: horizontal and vertical lines noded at every
// integer crossing.
fn grid_linework(n: usize) -> Vec<Polyline> {
    let mut lines = Vec::new();
    for row in 0..=n {
        for col in 0..n {
            lines.push(Polyline::from_points(vec![
                Point::new(col as f64, row as f64),
                Point::new(col as f64 + 1.0, row as f64),
            ]));
            lines.push(Polyline::from_points(vec![
                Point::new(row as f64, col as f64),
                Point::new(row as f64, col as f64 + 1.0),
            ]));
        }
    }
    lines
}

fn bench_graph_build(c: &mut Criterion) {
    let lines = grid_linework(30);
    c.bench_function("graph_build_30x30", |b| {
        b.iter(|| TraceGraph::from_linework(black_box(&lines)))
    });
}

fn bench_shortest_path(c: &mut Criterion) {
    let graph = TraceGraph::from_linework(&grid_linework(30));
    let start = graph
        .point_to_vertex(&Point::new(0.0, 0.0), 1e-6)
        .expect("grid corner");
    let goal = graph
        .point_to_vertex(&Point::new(30.0, 30.0), 1e-6)
        .expect("grid corner");
    c.bench_function("shortest_path_30x30", |b| {
        b.iter(|| graph.shortest_path(black_box(start), black_box(goal)))
    });
}

fn bench_traced_query(c: &mut Criterion) {
    let mut layer = MemoryLayer::new("grid");
    for line in grid_linework(20) {
        layer.add_feature(Geometry::LineString(line));
    }
    let mut tracer = Tracer::new();
    tracer.set_layers(vec![Rc::new(layer)]);
    // warm up the lazy graph outside the measurement
    tracer.is_point_snapped(Point::new(0.0, 0.0));

    c.bench_function("traced_query_20x20_grafted", |b| {
        b.iter(|| {
            tracer.find_shortest_path(
                black_box(Point::new(0.5, 0.0)),
                black_box(Point::new(20.0, 19.5)),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_graph_build,
    bench_shortest_path,
    bench_traced_query
);
criterion_main!(benches);
