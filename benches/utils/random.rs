use std::f64::consts::PI;

use geo::{rotate::RotatePoint, Coordinate, Line, LineString, Polygon, Rect};

use rand::Rng;
use rand_distr::Standard;

#[inline]
#[allow(dead_code)]
pub fn uniform_point<R: Rng>(rng: &mut R, bounds: Rect<f64>) -> Coordinate<f64> {
    let coords: [f64; 2] = rng.sample(Standard);
    let dims = bounds.max() - bounds.min();
    Coordinate {
        x: bounds.min().x + dims.x * coords[0],
        y: bounds.min().y + dims.y * coords[1],
    }
}

#[inline]
#[allow(dead_code)]
pub fn uniform_line<R: Rng>(rng: &mut R, bounds: Rect<f64>) -> Line<f64> {
    Line::new(uniform_point(rng, bounds), uniform_point(rng, bounds))
}

#[inline]
#[allow(dead_code)]
pub fn uniform_line_with_length<R: Rng>(rng: &mut R, bounds: Rect<f64>, length: f64) -> Line<f64> {
    let start = uniform_point(rng, bounds);
    let line = Line::new(start, start + (length, 0.).into());
    let angle = rng.sample::<f64, _>(Standard) * 2. * PI;
    line.rotate_around_point(angle, start.into())
}

/// Star-shaped polygon around the origin with `steps` vertices at evenly
/// spaced angles and random radii in `[0.5, 1)`.
#[allow(dead_code)]
pub fn circular_polygon<R: Rng>(mut rng: R, steps: usize) -> Polygon<f64> {
    let ang_step = 2. * PI / steps as f64;
    let ring = (0..steps)
        .map(|i| {
            let radius = 0.5 + rng.sample::<f64, _>(Standard) * 0.5;
            let angle = i as f64 * ang_step;
            Coordinate {
                x: radius * angle.cos(),
                y: radius * angle.sin(),
            }
        })
        .collect();
    Polygon::new(LineString(ring), vec![])
}
