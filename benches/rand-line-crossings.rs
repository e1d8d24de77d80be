use criterion::*;
use geo::{line_intersection::line_intersection, LineString, Rect};
use geo_overlay::Intersector;
use rand::thread_rng;

const BBOX: [f64; 2] = [1024., 1024.];

#[path = "utils/random.rs"]
mod random;
use random::*;

fn run_lines(c: &mut Criterion, name: &str, lines: Vec<geo::Line<f64>>) {
    let strings: Vec<LineString<f64>> = lines
        .iter()
        .map(|l| LineString(vec![l.start, l.end]))
        .collect();
    let intersector = Intersector::default();
    c.bench_function(&format!("Bentley-Ottman - {}", name), |b| {
        b.iter(|| black_box(intersector.intersections(&strings)).map(|pts| pts.len()))
    });
    c.bench_function(&format!("Brute-Force - {}", name), |b| {
        b.iter(|| {
            for (i, l1) in lines.iter().enumerate() {
                for l2 in lines[i + 1..].iter() {
                    black_box(line_intersection(*l1, *l2));
                }
            }
        })
    });
}

fn length_lc(c: &mut Criterion) {
    const NUM_LINES: usize = 1024;
    let bbox: Rect<f64> = Rect::new([0., 0.], BBOX);
    let line_len = BBOX[0] / 5.;
    let lines = (0..NUM_LINES)
        .map(|_| uniform_line_with_length(&mut thread_rng(), bbox, line_len))
        .collect();
    run_lines(c, "short random lines", lines);
}

fn uniform_lc(c: &mut Criterion) {
    const NUM_LINES: usize = 1024;
    let bbox: Rect<f64> = Rect::new([0., 0.], BBOX);
    let lines = (0..NUM_LINES)
        .map(|_| uniform_line(&mut thread_rng(), bbox))
        .collect();
    run_lines(c, "uniform random lines", lines);
}

criterion_group!(random, uniform_lc, length_lc);
criterion_main!(random);
