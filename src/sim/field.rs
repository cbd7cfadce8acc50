//! Grid-sampled flow and signal fields
//!
//! Each field is a fixed NxN grid covering the square arena. Reads are
//! bilinear with indices clamped at the grid edge (no wraparound), so
//! sampling is total over all of R^2. `deposit` on the scalar field is
//! the only mutator; everything else is pure.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Fractional grid coordinate for a world position, clamped to the grid.
///
/// Returns the base cell `(i, j)`, the clamped neighbor cell `(i1, j1)`,
/// and the interpolation weights `(u, v)` in `[0, 1)`.
fn grid_coord(
    resolution: usize,
    world_size: f32,
    x: f32,
    y: f32,
) -> (usize, usize, usize, usize, f32, f32) {
    let max = (resolution - 1) as f32;
    let fx = (x / world_size * max).clamp(0.0, max);
    let fy = (y / world_size * max).clamp(0.0, max);
    let i = fx.floor() as usize;
    let j = fy.floor() as usize;
    let i1 = (i + 1).min(resolution - 1);
    let j1 = (j + 1).min(resolution - 1);
    (i, j, i1, j1, fx - i as f32, fy - j as f32)
}

/// A 2-component flow field (blood or lymph).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorField {
    resolution: usize,
    world_size: f32,
    cells: Vec<Vec2>,
}

impl VectorField {
    /// Build a field by evaluating `f` at every cell `(i, j)`.
    pub fn from_fn(resolution: usize, world_size: f32, f: impl Fn(usize, usize) -> Vec2) -> Self {
        let mut cells = Vec::with_capacity(resolution * resolution);
        for j in 0..resolution {
            for i in 0..resolution {
                cells.push(f(i, j));
            }
        }
        Self {
            resolution,
            world_size,
            cells,
        }
    }

    #[inline]
    fn at(&self, i: usize, j: usize) -> Vec2 {
        self.cells[j * self.resolution + i]
    }

    /// Bilinear sample at a world position. Total: out-of-range
    /// coordinates clamp to the boundary cells.
    pub fn sample(&self, x: f32, y: f32) -> Vec2 {
        let (i, j, i1, j1, u, v) = grid_coord(self.resolution, self.world_size, x, y);
        let a = self.at(i, j);
        let b = self.at(i1, j);
        let c = self.at(i, j1);
        let d = self.at(i1, j1);
        a * (1.0 - u) * (1.0 - v) + b * u * (1.0 - v) + c * (1.0 - u) * v + d * u * v
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Raw cell data in row-major order, for snapshots.
    pub fn cells(&self) -> &[Vec2] {
        &self.cells
    }
}

/// A scalar concentration field (chemokine signal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarField {
    resolution: usize,
    world_size: f32,
    cells: Vec<f32>,
}

impl ScalarField {
    /// A zeroed field.
    pub fn new(resolution: usize, world_size: f32) -> Self {
        Self {
            resolution,
            world_size,
            cells: vec![0.0; resolution * resolution],
        }
    }

    #[inline]
    fn at(&self, i: usize, j: usize) -> f32 {
        self.cells[j * self.resolution + i]
    }

    /// Width of one grid cell in world units.
    pub fn cell_size(&self) -> f32 {
        self.world_size / self.resolution as f32
    }

    /// Bilinear sample at a world position.
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let (i, j, i1, j1, u, v) = grid_coord(self.resolution, self.world_size, x, y);
        let a = self.at(i, j);
        let b = self.at(i1, j);
        let c = self.at(i, j1);
        let d = self.at(i1, j1);
        a * (1.0 - u) * (1.0 - v) + b * u * (1.0 - v) + c * (1.0 - u) * v + d * u * v
    }

    /// Central-difference gradient with a one-cell step, probes clamped
    /// to the world boundary. Chemotaxis steers up this gradient.
    pub fn gradient(&self, x: f32, y: f32) -> Vec2 {
        let step = self.cell_size();
        let w = self.world_size;
        let left = self.sample((x - step).max(0.0), y);
        let right = self.sample((x + step).min(w), y);
        let down = self.sample(x, (y - step).max(0.0));
        let up = self.sample(x, (y + step).min(w));
        Vec2::new(right - left, up - down) / (2.0 * step)
    }

    /// Add `amount` to the single cell containing `(x, y)`. No
    /// interpolation on write; indices clamp to the grid.
    pub fn deposit(&mut self, x: f32, y: f32, amount: f32) {
        let cell = self.cell_size();
        let i = ((x / cell).floor().max(0.0) as usize).min(self.resolution - 1);
        let j = ((y / cell).floor().max(0.0) as usize).min(self.resolution - 1);
        self.cells[j * self.resolution + i] += amount;
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Raw cell data in row-major order, for snapshots.
    pub fn cells(&self) -> &[f32] {
        &self.cells
    }
}

/// The ambient environment: two flow fields plus the chemokine signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldStore {
    world_size: f32,
    pub blood: VectorField,
    pub lymph: VectorField,
    pub signal: ScalarField,
}

impl FieldStore {
    /// Initialize the flow fields with the sinusoidal circulation pattern
    /// and a zeroed signal field.
    pub fn new(world_size: f32, resolution: usize) -> Self {
        let blood = VectorField::from_fn(resolution, world_size, |_, j| {
            Vec2::new((j as f32 / 5.0).sin(), 1.0)
        });
        let lymph = VectorField::from_fn(resolution, world_size, |_, j| {
            Vec2::new((j as f32 / 5.0).sin() * 0.5, 0.5)
        });
        Self {
            world_size,
            blood,
            lymph,
            signal: ScalarField::new(resolution, world_size),
        }
    }

    pub fn world_size(&self) -> f32 {
        self.world_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const WORLD: f32 = 1000.0;
    const RES: usize = 32;

    fn ramp_field() -> ScalarField {
        let mut f = ScalarField::new(RES, WORLD);
        // Grow along x: cell (i, j) holds i.
        for j in 0..RES {
            for i in 0..RES {
                f.cells[j * RES + i] = i as f32;
            }
        }
        f
    }

    #[test]
    fn test_sample_exact_at_grid_points() {
        let f = ramp_field();
        // Grid point (i, j) sits at world coordinate i / (RES-1) * WORLD.
        let to_world = |i: usize| i as f32 / (RES - 1) as f32 * WORLD;
        for i in [0, 1, 7, 30, 31] {
            let s = f.sample(to_world(i), to_world(5));
            assert!((s - i as f32).abs() < 1e-3, "cell {i}: got {s}");
        }
    }

    #[test]
    fn test_sample_interpolates_midpoint() {
        let f = ramp_field();
        let to_world = |i: f32| i / (RES - 1) as f32 * WORLD;
        // Halfway between cells 3 and 4 along x.
        let s = f.sample(to_world(3.5), to_world(10.0));
        assert!((s - 3.5).abs() < 1e-3);
    }

    #[test]
    fn test_sample_clamps_outside_world() {
        let f = ramp_field();
        assert!((f.sample(-500.0, 100.0) - 0.0).abs() < 1e-3);
        assert!((f.sample(WORLD * 2.0, 100.0) - (RES - 1) as f32).abs() < 1e-3);
    }

    #[test]
    fn test_vector_sample_exact_at_grid_points() {
        let f = VectorField::from_fn(RES, WORLD, |i, j| Vec2::new(i as f32, j as f32));
        let to_world = |i: usize| i as f32 / (RES - 1) as f32 * WORLD;
        let s = f.sample(to_world(12), to_world(20));
        assert!((s.x - 12.0).abs() < 1e-3);
        assert!((s.y - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_deposit_lands_in_containing_cell() {
        let mut f = ScalarField::new(RES, WORLD);
        let cell = f.cell_size();
        f.deposit(cell * 3.0 + 1.0, cell * 7.0 + 1.0, 2.5);
        assert!((f.cells[7 * RES + 3] - 2.5).abs() < 1e-6);
        assert_eq!(f.cells.iter().filter(|&&c| c != 0.0).count(), 1);
    }

    #[test]
    fn test_deposit_clamps_out_of_range() {
        let mut f = ScalarField::new(RES, WORLD);
        f.deposit(-50.0, WORLD + 50.0, 1.0);
        assert!((f.cells[(RES - 1) * RES] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_deposit_is_additive() {
        let mut f = ScalarField::new(RES, WORLD);
        f.deposit(500.0, 500.0, 1.0);
        f.deposit(500.0, 500.0, 2.0);
        assert!((f.sample(500.0, 500.0) - 3.0).abs() < 0.5);
    }

    proptest! {
        #[test]
        fn prop_constant_field_samples_to_constant(
            x in -100.0f32..1100.0,
            y in -100.0f32..1100.0,
        ) {
            let mut f = ScalarField::new(RES, WORLD);
            for c in f.cells.iter_mut() {
                *c = 7.25;
            }
            prop_assert!((f.sample(x, y) - 7.25).abs() < 1e-3);
        }

        #[test]
        fn prop_constant_field_has_zero_gradient(
            x in 0.0f32..1000.0,
            y in 0.0f32..1000.0,
        ) {
            let mut f = ScalarField::new(RES, WORLD);
            for c in f.cells.iter_mut() {
                *c = 3.0;
            }
            let g = f.gradient(x, y);
            prop_assert!(g.length() < 1e-4);
        }

        #[test]
        fn prop_uniform_vector_field_samples_uniformly(
            x in -100.0f32..1100.0,
            y in -100.0f32..1100.0,
        ) {
            let f = VectorField::from_fn(RES, WORLD, |_, _| Vec2::new(1.5, -0.5));
            let s = f.sample(x, y);
            prop_assert!((s.x - 1.5).abs() < 1e-3);
            prop_assert!((s.y + 0.5).abs() < 1e-3);
        }
    }

    #[test]
    fn test_gradient_points_uphill() {
        let f = ramp_field();
        let g = f.gradient(500.0, 500.0);
        assert!(g.x > 0.0, "ramp grows along x, gradient {g:?}");
        assert!(g.y.abs() < 1e-4);
    }
}
