use crate::config::ModelVariant;
use crate::grid::Field;
use rand::Rng;
use rand_distr::{Distribution, Poisson};
use serde::{Deserialize, Serialize};

/// Steepness of the growth suppression `exp(-k * concentration)`.
pub const SUPPRESSION_STEEPNESS: f64 = 20.0;

/// Variant that receives growth in Wolbachia cells in the genetic model.
pub const MODIFIED_VARIANT: usize = 1;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VirusParameters {
    /// Mean number of hops per individual per step.
    pub diffuse_rate: f64,
    pub growth_rate: f64,
    pub carrying_capacity: f64,
}

impl VirusParameters {
    pub fn new(diffuse_rate: f64, growth_rate: f64, carrying_capacity: f64) -> Self {
        Self {
            diffuse_rate,
            growth_rate,
            carrying_capacity,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.diffuse_rate.is_finite() || self.diffuse_rate < 0.0 {
            return Err(format!(
                "diffuse_rate must be finite and >= 0, got {}",
                self.diffuse_rate
            ));
        }
        if !self.growth_rate.is_finite() {
            return Err(format!("growth_rate must be finite, got {}", self.growth_rate));
        }
        if !self.carrying_capacity.is_finite() || self.carrying_capacity <= 0.0 {
            return Err(format!(
                "carrying_capacity must be finite and > 0, got {}",
                self.carrying_capacity
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// `(di, dj)` offset of one hop.
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
        }
    }
}

/// Read-only inputs shared by every cell update of one variant.
#[derive(Clone, Copy)]
pub struct CellContext<'a> {
    pub model: ModelVariant,
    pub params: &'a VirusParameters,
    pub bacteria: &'a Field<u8>,
    pub concentration: &'a Field<f64>,
}

/// Counters from one pass over the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassStats {
    pub cells_visited: usize,
    pub hops: u64,
    pub exited: u64,
}

impl PassStats {
    pub fn merge(&mut self, other: PassStats) {
        self.cells_visited += other.cells_visited;
        self.hops += other.hops;
        self.exited += other.exited;
    }
}

/// Draw from Poisson(`mean`). Non-positive or non-finite means draw nothing.
pub fn sample_poisson<R: Rng + ?Sized>(rng: &mut R, mean: f64) -> u64 {
    if !(mean > 0.0) || !mean.is_finite() {
        return 0;
    }
    match Poisson::new(mean) {
        Ok(dist) => dist.sample(rng) as u64,
        Err(err) => {
            log::warn!("poisson mean {mean} rejected ({err}); using rounded mean");
            mean.round() as u64
        }
    }
}

/// Expected growth increment at `(i, j)` for variant `k`.
pub fn expected_growth(
    ctx: &CellContext<'_>,
    virus: &[Field<u64>],
    k: usize,
    i: usize,
    j: usize,
) -> f64 {
    let v = virus[k].get(i, j) as f64;
    let total: u64 = virus.iter().map(|field| field.get(i, j)).sum();
    let logistic = v * (1.0 - total as f64 / ctx.params.carrying_capacity);
    match ctx.model {
        ModelVariant::Signalling => {
            let suppression = (-SUPPRESSION_STEEPNESS * ctx.concentration.get(i, j)).exp();
            ctx.params.growth_rate * suppression * logistic
        }
        ModelVariant::Genetic => ctx.params.growth_rate * logistic,
    }
}

/// Apply one stochastic growth draw at `(i, j)` for variant `k`.
pub fn grow_cell<R: Rng + ?Sized>(
    ctx: &CellContext<'_>,
    virus: &mut [Field<u64>],
    k: usize,
    i: usize,
    j: usize,
    rng: &mut R,
) {
    let growth = expected_growth(ctx, virus, k, i, j);
    if growth > 0.0 {
        let increment = sample_poisson(rng, growth);
        let target = match ctx.model {
            ModelVariant::Genetic if ctx.bacteria.get(i, j) == 1 => MODIFIED_VARIANT,
            _ => k,
        };
        let cell = &mut virus[target][(i, j)];
        *cell = cell.saturating_add(increment);
    } else if growth < 0.0 {
        let decrement = sample_poisson(rng, -growth);
        let cell = &mut virus[k][(i, j)];
        *cell = cell.saturating_sub(decrement);
    }
}

/// Move one individual one hop from `from` in direction `dir`.
///
/// Returns the destination, or `None` when the hop leaves the grid and the
/// individual is removed.
pub fn hop(
    field: &mut Field<u64>,
    from: (usize, usize),
    dir: Direction,
) -> Option<(usize, usize)> {
    field[from] -= 1;
    let (di, dj) = dir.offset();
    let dest = field.resolve(from.0 as isize + di, from.1 as isize + dj)?;
    field[dest] += 1;
    Some(dest)
}

/// Random-walk `count` individuals starting at `(i, j)`.
///
/// Each individual draws Poisson(`diffuse_rate`) hops and stops early if it
/// leaves the grid. Diffusion of the cell stops once the source is empty.
pub fn diffuse_cell<R: Rng + ?Sized>(
    field: &mut Field<u64>,
    diffuse_rate: f64,
    i: usize,
    j: usize,
    count: u64,
    rng: &mut R,
) -> PassStats {
    let mut stats = PassStats::default();
    for _ in 0..count {
        if field.get(i, j) == 0 {
            break;
        }
        let num_hops = sample_poisson(rng, diffuse_rate);
        let mut at = (i, j);
        for _ in 0..num_hops {
            let dir = Direction::random(rng);
            stats.hops += 1;
            match hop(field, at, dir) {
                Some(dest) => at = dest,
                None => {
                    stats.exited += 1;
                    break;
                }
            }
        }
    }
    stats
}

/// One growth + diffusion pass over the whole grid for variant `k`.
///
/// Cells are visited row-major and later cells observe moves made by earlier
/// ones. Each cell diffuses the count it held before its own growth.
pub fn update_variant<R: Rng + ?Sized>(
    ctx: &CellContext<'_>,
    virus: &mut [Field<u64>],
    k: usize,
    rng: &mut R,
) -> PassStats {
    let n_x = virus[k].n_x();
    let n_y = virus[k].n_y();
    let mut stats = PassStats::default();
    for i in 0..n_x {
        for j in 0..n_y {
            let count = virus[k].get(i, j);
            if count == 0 {
                continue;
            }
            stats.cells_visited += 1;
            grow_cell(ctx, virus, k, i, j, rng);
            let moved = diffuse_cell(&mut virus[k], ctx.params.diffuse_rate, i, j, count, rng);
            stats.merge(moved);
        }
    }
    stats
}
