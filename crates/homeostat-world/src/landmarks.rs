//! Landmarks and the landmark-area convex hull.
//!
//! Landmarks are laid out from a coarse per-cell count pattern over the
//! floor and serve two purposes: they are the preferred roaming
//! destinations for predators, and their convex hull bounds the region a
//! predator may chase in.

use homeostat_types::{Aabb, Vec2};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::arena::Arena;
use crate::placement::is_overlapping;

/// Landmark layout configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LandmarkConfig {
    /// Per-cell landmark counts, one inner list per row.
    ///
    /// The first row is the far (+z) edge of the floor. A cell with count
    /// `n > 0` receives an evenly spaced `n x n` lattice of landmarks.
    #[serde(default)]
    pub pattern: Vec<Vec<u32>>,

    /// Collision radius of a landmark.
    #[serde(default = "default_landmark_radius")]
    pub landmark_radius: f64,

    /// Extra clearance required around a landmark.
    #[serde(default = "default_overlap_padding")]
    pub overlap_padding: f64,
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            pattern: Vec::new(),
            landmark_radius: default_landmark_radius(),
            overlap_padding: default_overlap_padding(),
        }
    }
}

/// Convex polygon in the (x, z) plane, counter-clockwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvexHull {
    points: Vec<Vec2>,
}

impl ConvexHull {
    /// Build the hull of `points` with the monotone-chain method.
    ///
    /// Fewer than three input points produce an empty hull. Collinear
    /// points on the boundary are dropped.
    pub fn build(points: &[Vec2]) -> Self {
        if points.len() < 3 {
            return Self::default();
        }

        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.z.total_cmp(&b.z)));

        let mut lower: Vec<Vec2> = Vec::with_capacity(sorted.len());
        for &p in &sorted {
            pop_non_left_turns(&mut lower, p);
            lower.push(p);
        }

        let mut upper: Vec<Vec2> = Vec::with_capacity(sorted.len());
        for &p in sorted.iter().rev() {
            pop_non_left_turns(&mut upper, p);
            upper.push(p);
        }

        // The last point of each chain is the first point of the other.
        lower.pop();
        upper.pop();
        lower.extend(upper);

        if lower.len() < 3 {
            return Self::default();
        }
        Self { points: lower }
    }

    /// Hull vertices in counter-clockwise order.
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Whether the hull has no area (fewer than three vertices).
    pub fn is_empty(&self) -> bool {
        self.points.len() < 3
    }

    /// Whether `point` lies inside or on the hull.
    ///
    /// The point is outside as soon as it is strictly to the right of any
    /// edge. An empty hull contains nothing.
    pub fn contains(&self, point: Vec2) -> bool {
        if self.is_empty() {
            return false;
        }
        let edges = self.points.iter().zip(self.points.iter().cycle().skip(1));
        for (&a, &b) in edges {
            if b.minus(a).cross(point.minus(a)) < 0.0 {
                return false;
            }
        }
        true
    }
}

/// Drop chain tail points that would make a clockwise or straight turn.
fn pop_non_left_turns(chain: &mut Vec<Vec2>, next: Vec2) {
    while let [.., a, b] = *chain.as_slice() {
        if b.minus(a).cross(next.minus(a)) > 0.0 {
            break;
        }
        chain.pop();
    }
}

/// The generated landmarks plus their hull.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkField {
    landmarks: Vec<Vec2>,
    hull: ConvexHull,
}

impl LandmarkField {
    /// Lay out landmarks over the arena floor.
    ///
    /// Candidates whose clearance box (radius plus padding) overlaps any
    /// `occupied` box are skipped. The hull is built from the survivors;
    /// with fewer than three landmarks it is left empty and a warning is
    /// logged.
    pub fn generate(config: &LandmarkConfig, arena: &Arena, occupied: &[Aabb]) -> Self {
        let rows = config.pattern.len();
        let cols = config.pattern.iter().map(Vec::len).max().unwrap_or(0);
        if rows == 0 || cols == 0 {
            debug!("No landmark pattern configured");
            return Self::default();
        }

        let floor = arena.floor();
        let size = floor.size();
        let cell_w = size.x / usize_to_f64(cols);
        let cell_h = size.z / usize_to_f64(rows);
        let diameter = config.landmark_radius * 2.0;
        let footprint = Vec2::new(diameter, diameter);

        let mut landmarks = Vec::new();
        // Pattern rows run far-to-near; grid rows run near-to-far.
        for (grid_row, counts) in config.pattern.iter().rev().enumerate() {
            for (col, &n) in counts.iter().enumerate() {
                if n == 0 {
                    continue;
                }
                let cell_min = Vec2::new(
                    floor.min.x + usize_to_f64(col) * cell_w,
                    floor.min.z + usize_to_f64(grid_row) * cell_h,
                );
                let nf = f64::from(n);
                for i in 0..n {
                    for j in 0..n {
                        let pos = Vec2::new(
                            cell_min.x + cell_w * (f64::from(i) + 0.5) / nf,
                            cell_min.z + cell_h * (f64::from(j) + 0.5) / nf,
                        );
                        if is_overlapping(pos, footprint, config.overlap_padding, occupied) {
                            continue;
                        }
                        landmarks.push(pos);
                    }
                }
            }
        }

        let hull = ConvexHull::build(&landmarks);
        if hull.is_empty() {
            warn!(
                landmarks = landmarks.len(),
                "Landmark hull needs at least 3 non-collinear landmarks; containment disabled"
            );
        } else {
            debug!(
                landmarks = landmarks.len(),
                hull_points = hull.points().len(),
                "Landmark field generated"
            );
        }

        Self { landmarks, hull }
    }

    /// Build directly from known positions.
    pub fn from_points(landmarks: Vec<Vec2>) -> Self {
        let hull = ConvexHull::build(&landmarks);
        Self { landmarks, hull }
    }

    /// Landmark positions.
    pub fn landmarks(&self) -> &[Vec2] {
        &self.landmarks
    }

    /// Hull of all landmarks.
    pub const fn hull(&self) -> &ConvexHull {
        &self.hull
    }
}

#[allow(clippy::cast_precision_loss)]
fn usize_to_f64(v: usize) -> f64 {
    // Pattern dimensions are tiny.
    v as f64
}

const fn default_landmark_radius() -> f64 {
    0.5
}

const fn default_overlap_padding() -> f64 {
    0.5
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arena::ArenaConfig;

    fn square() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(0.0, 4.0),
        ]
    }

    #[test]
    fn square_hull_contains_centroid() {
        let hull = ConvexHull::build(&square());
        assert_eq!(hull.points().len(), 4);
        assert!(hull.contains(Vec2::new(2.0, 2.0)));
        assert!(!hull.contains(Vec2::new(100.0, 100.0)));
        assert!(!hull.contains(Vec2::new(-0.1, 2.0)));
    }

    #[test]
    fn boundary_points_count_as_inside() {
        let hull = ConvexHull::build(&square());
        assert!(hull.contains(Vec2::new(0.0, 2.0)));
        assert!(hull.contains(Vec2::new(4.0, 4.0)));
    }

    #[test]
    fn interior_and_collinear_points_are_dropped() {
        let mut pts = square();
        pts.push(Vec2::new(2.0, 2.0));
        pts.push(Vec2::new(2.0, 0.0));
        let hull = ConvexHull::build(&pts);
        assert_eq!(hull.points().len(), 4);
    }

    #[test]
    fn hull_is_counter_clockwise() {
        let hull = ConvexHull::build(&square());
        let pts = hull.points();
        let mut area2 = 0.0;
        for (a, b) in pts.iter().zip(pts.iter().cycle().skip(1)) {
            area2 += a.cross(*b);
        }
        assert!(area2 > 0.0);
    }

    #[test]
    fn too_few_points_give_empty_hull() {
        let hull = ConvexHull::build(&[Vec2::ZERO, Vec2::new(1.0, 1.0)]);
        assert!(hull.is_empty());
        assert!(!hull.contains(Vec2::new(0.5, 0.5)));
        let line = ConvexHull::build(&[Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)]);
        assert!(line.is_empty());
    }

    #[test]
    fn pattern_generates_lattice() {
        let arena = Arena::new(&ArenaConfig {
            origin: Vec2::ZERO,
            floor_size: Vec2::new(20.0, 20.0),
            obstacles: Vec::new(),
        })
        .unwrap();
        let config = LandmarkConfig {
            pattern: vec![vec![1, 0], vec![0, 2]],
            landmark_radius: 0.5,
            overlap_padding: 0.0,
        };
        let field = LandmarkField::generate(&config, &arena, &[]);
        assert_eq!(field.landmarks().len(), 5);
        // First pattern row is the far edge: its single landmark sits at +z.
        assert!(field.landmarks().iter().any(|p| *p == Vec2::new(-5.0, 5.0)));
        // The 2x2 cell is near-right.
        assert!(field.landmarks().iter().any(|p| *p == Vec2::new(2.5, -7.5)));
        assert!(!field.hull().is_empty());
    }

    #[test]
    fn occupied_cells_are_skipped() {
        let arena = Arena::new(&ArenaConfig::default()).unwrap();
        let config = LandmarkConfig {
            pattern: vec![vec![1]],
            ..LandmarkConfig::default()
        };
        let blocker = [Aabb::from_center(Vec2::ZERO, Vec2::new(2.0, 2.0))];
        let field = LandmarkField::generate(&config, &arena, &blocker);
        assert!(field.landmarks().is_empty());
        assert!(field.hull().is_empty());
    }
}
