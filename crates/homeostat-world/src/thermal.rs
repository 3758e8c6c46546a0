//! Spatial thermal field covering the arena floor.
//!
//! The field is a `cells_x` by `cells_z` grid of temperatures laid over the
//! floor footprint. Two grids are kept:
//!
//! - `base` -- the episode's baked field: default temperature, random
//!   square hot-spots, obstacle footprints, then one Gaussian smoothing pass.
//!   Frozen until the next [`ThermalField::regenerate`].
//! - `current` -- what sensors read: `base` plus the diurnal offset, rebuilt
//!   whenever the offset changes.
//!
//! Cell `(x, z)` covers the floor slice starting at
//! `floor.min + cell_size * (x, z)`; its center is half a cell further in.

use homeostat_types::{Aabb, Vec2};
use rand::Rng;
use serde::Deserialize;
use tracing::debug;

use crate::arena::Arena;
use crate::error::WorldError;

/// Thermal field configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThermalConfig {
    /// Number of cells along x.
    #[serde(default = "default_cells")]
    pub cells_x: u32,

    /// Number of cells along z.
    #[serde(default = "default_cells")]
    pub cells_z: u32,

    /// Temperature of cells not covered by any hot-spot or obstacle, and of
    /// every off-grid query.
    #[serde(default)]
    pub field_default_temp: f64,

    /// Temperature written into hot-spot cells.
    #[serde(default = "default_hot_spot_temp")]
    pub hot_spot_temp: f64,

    /// Number of random hot-spots seeded per episode.
    #[serde(default = "default_hot_spot_count")]
    pub hot_spot_count: u32,

    /// Side length of a hot-spot in cells.
    #[serde(default = "default_hot_spot_size")]
    pub hot_spot_size: f64,

    /// Gaussian smoothing sigma in cells (0 disables smoothing).
    #[serde(default = "default_smoothing_sigma")]
    pub smoothing_sigma: f64,

    /// Whether obstacles with a temperature imprint their footprint.
    #[serde(default = "default_true")]
    pub use_object_hot_spot: bool,

    /// Whether random hot-spots are seeded.
    #[serde(default = "default_true")]
    pub use_random_hot_spot: bool,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            cells_x: default_cells(),
            cells_z: default_cells(),
            field_default_temp: 0.0,
            hot_spot_temp: default_hot_spot_temp(),
            hot_spot_count: default_hot_spot_count(),
            hot_spot_size: default_hot_spot_size(),
            smoothing_sigma: default_smoothing_sigma(),
            use_object_hot_spot: true,
            use_random_hot_spot: true,
        }
    }
}

/// A dense 2D grid of temperatures indexed by `(x, z)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureGrid {
    cells_x: usize,
    cells_z: usize,
    values: Vec<f64>,
}

impl TemperatureGrid {
    /// Create a grid with every cell set to `value`.
    pub fn filled(cells_x: usize, cells_z: usize, value: f64) -> Self {
        Self {
            cells_x,
            cells_z,
            values: vec![value; cells_x.saturating_mul(cells_z)],
        }
    }

    /// Grid dimensions `(cells_x, cells_z)`.
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.cells_x, self.cells_z)
    }

    fn offset_of(&self, x: usize, z: usize) -> Option<usize> {
        if x < self.cells_x && z < self.cells_z {
            x.checked_mul(self.cells_z)?.checked_add(z)
        } else {
            None
        }
    }

    /// Temperature at `(x, z)`, or `None` off-grid.
    pub fn get(&self, x: usize, z: usize) -> Option<f64> {
        self.offset_of(x, z)
            .and_then(|i| self.values.get(i))
            .copied()
    }

    /// Overwrite the temperature at `(x, z)`; off-grid writes are ignored.
    pub fn set(&mut self, x: usize, z: usize, value: f64) {
        if let Some(cell) = self.offset_of(x, z).and_then(|i| self.values.get_mut(i)) {
            *cell = value;
        }
    }

    /// Overwrite every cell.
    pub fn fill(&mut self, value: f64) {
        self.values.iter_mut().for_each(|v| *v = value);
    }

    /// Overwrite every cell whose signed index falls inside the inclusive
    /// rectangle, clipping to the grid.
    fn fill_rect(&mut self, x0: i64, x1: i64, z0: i64, z1: i64, value: f64) {
        for x in x0..=x1 {
            for z in z0..=z1 {
                if let (Ok(ux), Ok(uz)) = (usize::try_from(x), usize::try_from(z)) {
                    self.set(ux, uz, value);
                }
            }
        }
    }

    /// Iterate over all cell values.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// Return a Gaussian-smoothed copy of the grid.
    ///
    /// Each cell becomes the weighted mean of the in-bounds cells within
    /// `ceil(3 * sigma)` (Chebyshev) of it, weight
    /// `exp(-(dx^2 + dz^2) / (2 * sigma^2))`. Out-of-grid neighbours are
    /// excluded from both numerator and weight sum, so every output is a
    /// convex combination of its neighbourhood. A `sigma` of zero (or any
    /// non-positive value) returns an identical copy.
    #[must_use]
    pub fn gaussian_smoothed(&self, sigma: f64) -> Self {
        if sigma <= 0.0 || !sigma.is_finite() {
            return self.clone();
        }
        let radius = ceil_to_i64(3.0 * sigma).unwrap_or(0);
        let two_sigma_sq = 2.0 * sigma * sigma;

        let mut out = self.clone();
        for x in 0..self.cells_x {
            for z in 0..self.cells_z {
                let mut sum = 0.0;
                let mut weight_sum = 0.0;
                for dx in -radius..=radius {
                    for dz in -radius..=radius {
                        let Some(value) = self.get_signed(x, dx, z, dz) else {
                            continue;
                        };
                        let dist_sq = square_i64(dx) + square_i64(dz);
                        let weight = (-dist_sq / two_sigma_sq).exp();
                        sum += value * weight;
                        weight_sum += weight;
                    }
                }
                if weight_sum > 0.0 {
                    out.set(x, z, sum / weight_sum);
                }
            }
        }
        out
    }

    fn get_signed(&self, x: usize, dx: i64, z: usize, dz: i64) -> Option<f64> {
        let nx = i64::try_from(x).ok()?.checked_add(dx)?;
        let nz = i64::try_from(z).ok()?.checked_add(dz)?;
        self.get(usize::try_from(nx).ok()?, usize::try_from(nz).ok()?)
    }
}

/// The arena's thermal field.
#[derive(Debug, Clone)]
pub struct ThermalField {
    config: ThermalConfig,
    floor: Aabb,
    cell_size: Vec2,
    base: TemperatureGrid,
    current: TemperatureGrid,
    offset: f64,
}

impl ThermalField {
    /// Create a field over the arena floor, uniformly at the default
    /// temperature. Call [`ThermalField::regenerate`] to bake an episode.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EmptyGrid`] for a zero-sized grid and
    /// [`WorldError::InvalidConfig`] for a negative hot-spot size or sigma.
    pub fn new(config: &ThermalConfig, arena: &Arena) -> Result<Self, WorldError> {
        if config.cells_x == 0 || config.cells_z == 0 {
            return Err(WorldError::EmptyGrid {
                cells_x: config.cells_x,
                cells_z: config.cells_z,
            });
        }
        if config.hot_spot_size < 0.0 {
            return Err(WorldError::invalid("thermal.hot_spot_size", "must not be negative"));
        }
        if config.smoothing_sigma < 0.0 || !config.smoothing_sigma.is_finite() {
            return Err(WorldError::invalid(
                "thermal.smoothing_sigma",
                "must be a finite, non-negative number",
            ));
        }

        let cells_x = usize::try_from(config.cells_x)
            .map_err(|_err| WorldError::invalid("thermal.cells_x", "exceeds usize range"))?;
        let cells_z = usize::try_from(config.cells_z)
            .map_err(|_err| WorldError::invalid("thermal.cells_z", "exceeds usize range"))?;

        let floor = arena.floor();
        let size = floor.size();
        let cell_size = Vec2::new(
            size.x / f64::from(config.cells_x),
            size.z / f64::from(config.cells_z),
        );
        let grid = TemperatureGrid::filled(cells_x, cells_z, config.field_default_temp);

        Ok(Self {
            config: config.clone(),
            floor,
            cell_size,
            base: grid.clone(),
            current: grid,
            offset: 0.0,
        })
    }

    /// Rebuild the baked field for a new episode.
    ///
    /// Order: reset to default, seed random hot-spots, overlay obstacle
    /// temperatures, smooth once, freeze as `base`. The diurnal offset is
    /// cleared; the day/night cycle re-applies it.
    pub fn regenerate<R: Rng + ?Sized>(&mut self, arena: &Arena, rng: &mut R) {
        let mut grid = self.base.clone();
        grid.fill(self.config.field_default_temp);

        if self.config.use_random_hot_spot {
            self.seed_hot_spots(&mut grid, rng);
        }
        if self.config.use_object_hot_spot {
            self.overlay_obstacles(&mut grid, arena);
        }

        self.base = grid.gaussian_smoothed(self.config.smoothing_sigma);
        self.current = self.base.clone();
        self.offset = 0.0;

        debug!(
            hot_spots = self.config.hot_spot_count,
            sigma = self.config.smoothing_sigma,
            "Thermal field regenerated"
        );
    }

    fn seed_hot_spots<R: Rng + ?Sized>(&self, grid: &mut TemperatureGrid, rng: &mut R) {
        let (cells_x, cells_z) = grid.dimensions();
        let half = trunc_to_i64(self.config.hot_spot_size / 2.0).unwrap_or(0);

        for _ in 0..self.config.hot_spot_count {
            let cx = i64::try_from(rng.random_range(0..cells_x)).unwrap_or(0);
            let cz = i64::try_from(rng.random_range(0..cells_z)).unwrap_or(0);
            grid.fill_rect(
                cx.saturating_sub(half),
                cx.saturating_add(half),
                cz.saturating_sub(half),
                cz.saturating_add(half),
                self.config.hot_spot_temp,
            );
        }
    }

    fn overlay_obstacles(&self, grid: &mut TemperatureGrid, arena: &Arena) {
        for obstacle in arena.thermal_sources() {
            let b = obstacle.bounds;
            let (Some(x0), Some(x1), Some(z0), Some(z1)) = (
                floor_to_i64((b.min.x - self.floor.min.x) / self.cell_size.x),
                floor_to_i64((b.max.x - self.floor.min.x) / self.cell_size.x),
                floor_to_i64((b.min.z - self.floor.min.z) / self.cell_size.z),
                floor_to_i64((b.max.z - self.floor.min.z) / self.cell_size.z),
            ) else {
                continue;
            };
            grid.fill_rect(x0, x1, z0, z1, obstacle.temperature);
        }
    }

    /// Set the diurnal offset: `current = base + offset` for every cell.
    pub fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
        self.current = self.base.clone();
        self.current.values.iter_mut().for_each(|v| *v += offset);
    }

    /// Shift every current cell by `delta` without touching `base`.
    ///
    /// The shift lasts until the next [`ThermalField::set_offset`].
    pub fn adjust(&mut self, delta: f64) {
        self.current.values.iter_mut().for_each(|v| *v += delta);
    }

    /// The diurnal offset last applied.
    pub const fn offset(&self) -> f64 {
        self.offset
    }

    /// Grid dimensions `(cells_x, cells_z)`.
    pub const fn dimensions(&self) -> (usize, usize) {
        self.base.dimensions()
    }

    /// The baked, offset-free grid.
    pub const fn base(&self) -> &TemperatureGrid {
        &self.base
    }

    /// The grid sensors read.
    pub const fn current(&self) -> &TemperatureGrid {
        &self.current
    }

    /// World-space size of one cell.
    pub const fn cell_size(&self) -> Vec2 {
        self.cell_size
    }

    /// World-space center of cell `(x, z)`.
    pub fn cell_center(&self, x: usize, z: usize) -> Vec2 {
        let fx = f64::from(u32::try_from(x).unwrap_or(u32::MAX));
        let fz = f64::from(u32::try_from(z).unwrap_or(u32::MAX));
        Vec2::new(
            self.floor.min.x + self.cell_size.x * (fx + 0.5),
            self.floor.min.z + self.cell_size.z * (fz + 0.5),
        )
    }

    /// Cell containing a world-space point, or `None` off the grid.
    pub fn cell_of(&self, point: Vec2) -> Option<(usize, usize)> {
        let x = floor_to_i64((point.x - self.floor.min.x) / self.cell_size.x)?;
        let z = floor_to_i64((point.z - self.floor.min.z) / self.cell_size.z)?;
        let (ux, uz) = (usize::try_from(x).ok()?, usize::try_from(z).ok()?);
        let (cells_x, cells_z) = self.dimensions();
        (ux < cells_x && uz < cells_z).then_some((ux, uz))
    }

    /// Current temperature of cell `(x, z)`; the field default off-grid.
    pub fn cell_temperature(&self, x: i64, z: i64) -> f64 {
        match (usize::try_from(x), usize::try_from(z)) {
            (Ok(ux), Ok(uz)) => self
                .current
                .get(ux, uz)
                .unwrap_or(self.config.field_default_temp),
            _ => self.config.field_default_temp,
        }
    }

    /// Current temperature at a world-space point; the field default off-grid.
    pub fn temperature_at(&self, point: Vec2) -> f64 {
        self.cell_of(point)
            .and_then(|(x, z)| self.current.get(x, z))
            .unwrap_or(self.config.field_default_temp)
    }

    /// Current temperature of cell `(x, z)` rescaled to `[0, 1]` against
    /// `[min, max]` (clamped). Returns 0 off-grid or for an empty range.
    pub fn normalized(&self, x: i64, z: i64, min: f64, max: f64) -> f64 {
        let (Ok(ux), Ok(uz)) = (usize::try_from(x), usize::try_from(z)) else {
            return 0.0;
        };
        let Some(value) = self.current.get(ux, uz) else {
            return 0.0;
        };
        let span = max - min;
        if span.abs() < f64::EPSILON {
            return 0.0;
        }
        ((value - min) / span).clamp(0.0, 1.0)
    }
}

/// Floor a finite float to `i64`.
#[allow(clippy::cast_possible_truncation)]
fn floor_to_i64(value: f64) -> Option<i64> {
    // Grid coordinates are small; anything beyond i64 is off-grid anyway.
    (value.is_finite() && value.abs() < 9.0e15).then(|| value.floor() as i64)
}

/// Ceil a finite float to `i64`.
#[allow(clippy::cast_possible_truncation)]
fn ceil_to_i64(value: f64) -> Option<i64> {
    (value.is_finite() && value.abs() < 9.0e15).then(|| value.ceil() as i64)
}

/// Truncate a finite float toward zero.
#[allow(clippy::cast_possible_truncation)]
fn trunc_to_i64(value: f64) -> Option<i64> {
    (value.is_finite() && value.abs() < 9.0e15).then(|| value.trunc() as i64)
}

#[allow(clippy::cast_precision_loss)]
fn square_i64(v: i64) -> f64 {
    // Kernel offsets are bounded by the kernel radius.
    let f = v as f64;
    f * f
}

const fn default_cells() -> u32 {
    20
}

const fn default_hot_spot_temp() -> f64 {
    30.0
}

const fn default_hot_spot_count() -> u32 {
    3
}

const fn default_hot_spot_size() -> f64 {
    4.0
}

const fn default_smoothing_sigma() -> f64 {
    1.0
}

const fn default_true() -> bool {
    true
}
