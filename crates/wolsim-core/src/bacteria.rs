use crate::grid::Field;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Side of the square top-left block used by [`BacteriaPattern::RandomPatch`].
pub const PATCH_SIZE: usize = 15;

/// Rows covered by [`BacteriaPattern::Barrier`].
pub const BARRIER_ROWS: std::ops::Range<usize> = 7..13;

/// Wolbachia placement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BacteriaPattern {
    /// Independent Bernoulli(`p`) draws over the top-left patch.
    RandomPatch { p: f64 },
    /// Solid band across the full width of the grid.
    Barrier,
}

impl Default for BacteriaPattern {
    fn default() -> Self {
        BacteriaPattern::RandomPatch { p: 0.3 }
    }
}

impl BacteriaPattern {
    pub fn validate(&self) -> Result<(), f64> {
        match *self {
            BacteriaPattern::RandomPatch { p } if !(0.0..=1.0).contains(&p) => Err(p),
            _ => Ok(()),
        }
    }

    /// Write the pattern into `field`. Cells outside the pattern are left as-is.
    pub fn place<R: Rng + ?Sized>(&self, field: &mut Field<u8>, rng: &mut R) {
        match *self {
            BacteriaPattern::RandomPatch { p } => {
                let rows = PATCH_SIZE.min(field.n_x());
                let cols = PATCH_SIZE.min(field.n_y());
                for i in 0..rows {
                    for j in 0..cols {
                        field.set(i, j, u8::from(rng.random_bool(p)));
                    }
                }
            }
            BacteriaPattern::Barrier => field.fill_rows(BARRIER_ROWS, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn random_patch_stays_in_top_left_block() {
        let mut field = Field::<u8>::zeros(20, 20);
        let mut rng = ChaCha12Rng::seed_from_u64(4);
        BacteriaPattern::RandomPatch { p: 1.0 }.place(&mut field, &mut rng);
        for (i, row) in field.rows().enumerate() {
            for (j, &b) in row.iter().enumerate() {
                let inside = i < PATCH_SIZE && j < PATCH_SIZE;
                assert_eq!(b, u8::from(inside), "cell ({i}, {j})");
            }
        }
    }

    #[test]
    fn random_patch_clamps_to_small_grid() {
        let mut field = Field::<u8>::zeros(6, 4);
        let mut rng = ChaCha12Rng::seed_from_u64(4);
        BacteriaPattern::RandomPatch { p: 1.0 }.place(&mut field, &mut rng);
        assert!(field.data().iter().all(|&b| b == 1));
    }

    #[test]
    fn random_patch_density_tracks_probability() {
        let mut field = Field::<u8>::zeros(15, 15);
        let mut rng = ChaCha12Rng::seed_from_u64(8);
        BacteriaPattern::RandomPatch { p: 0.3 }.place(&mut field, &mut rng);
        let occupied = field.data().iter().filter(|&&b| b == 1).count();
        assert!((30..=105).contains(&occupied), "occupied {occupied} of 225");
        assert_eq!(field.distinct(), vec![0, 1]);
    }

    #[test]
    fn barrier_covers_rows_seven_through_twelve() {
        let mut field = Field::<u8>::zeros(20, 9);
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        BacteriaPattern::Barrier.place(&mut field, &mut rng);
        for (i, row) in field.rows().enumerate() {
            let expected = u8::from((7..=12).contains(&i));
            assert!(row.iter().all(|&b| b == expected), "row {i}");
        }
    }

    #[test]
    fn probability_must_lie_in_unit_interval() {
        assert!(BacteriaPattern::RandomPatch { p: 0.0 }.validate().is_ok());
        assert!(BacteriaPattern::RandomPatch { p: 1.0 }.validate().is_ok());
        assert_eq!(BacteriaPattern::RandomPatch { p: 1.5 }.validate(), Err(1.5));
        assert!(BacteriaPattern::RandomPatch { p: -0.1 }.validate().is_err());
        assert!(BacteriaPattern::RandomPatch { p: f64::NAN }.validate().is_err());
        assert!(BacteriaPattern::Barrier.validate().is_ok());
    }
}
