pub mod lifecycle;
pub mod metrics;

pub use metrics::*;

use crate::bacteria::BacteriaPattern;
use crate::config::{ModelVariant, SimConfig, SimConfigError};
use crate::grid::Field;
use crate::inhibitor::ConcentrationSolver;
use crate::virus::VirusParameters;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::{error::Error, fmt};

/// Default virus seed location.
pub const DEFAULT_SEED_CELL: (usize, usize) = (15, 15);

/// Seed location used together with [`BacteriaPattern::Barrier`].
pub const BARRIER_SEED_CELL: (usize, usize) = (2, 10);

/// Per-variant virus snapshot, indexed by variant.
pub type VirusSnapshot = Vec<Field<u64>>;

pub struct World {
    pub(crate) config: SimConfig,
    pub(crate) virus: Vec<Field<u64>>,
    pub(crate) bacteria: Field<u8>,
    pub(crate) concentration: Field<f64>,
    pub(crate) params: Vec<Option<VirusParameters>>,
    pub(crate) solver: Box<dyn ConcentrationSolver>,
    pub(crate) rng: ChaCha12Rng,
    pub(crate) virus_history: Vec<VirusSnapshot>,
    pub(crate) concentration_history: Vec<Field<f64>>,
    pub(crate) step_index: usize,
    pub(crate) exited_last_step: u64,
    pub(crate) total_exited: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorldError {
    Config(SimConfigError),
    InvalidVariant { variant: usize, num_virus: usize },
    InvalidVirusParameters { variant: usize, reason: String },
    InvalidProbability(f64),
    CellOutOfBounds { cell: (usize, usize), n_x: usize, n_y: usize },
    MissingVirusParameters { variant: usize },
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::Config(e) => write!(f, "{}", e),
            WorldError::InvalidVariant { variant, num_virus } => write!(
                f,
                "virus variant {variant} out of range (model has {num_virus})"
            ),
            WorldError::InvalidVirusParameters { variant, reason } => {
                write!(f, "invalid parameters for virus variant {variant}: {reason}")
            }
            WorldError::InvalidProbability(p) => {
                write!(f, "wolbachia probability must lie in [0, 1], got {p}")
            }
            WorldError::CellOutOfBounds { cell, n_x, n_y } => write!(
                f,
                "cell ({}, {}) lies outside the {n_x}x{n_y} grid",
                cell.0, cell.1
            ),
            WorldError::MissingVirusParameters { variant } => {
                write!(f, "virus variant {variant} has no parameters set")
            }
        }
    }
}

impl From<SimConfigError> for WorldError {
    fn from(err: SimConfigError) -> Self {
        WorldError::Config(err)
    }
}

impl Error for WorldError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorldError::Config(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExperimentError {
    InvalidSampleEvery,
    TooManySteps { max: usize, actual: usize },
    World(WorldError),
}

impl fmt::Display for ExperimentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperimentError::InvalidSampleEvery => write!(f, "sample_every must be positive"),
            ExperimentError::TooManySteps { max, actual } => {
                write!(f, "steps ({actual}) exceed supported maximum ({max})")
            }
            ExperimentError::World(e) => write!(f, "{}", e),
        }
    }
}

impl From<WorldError> for ExperimentError {
    fn from(err: WorldError) -> Self {
        ExperimentError::World(err)
    }
}

impl Error for ExperimentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ExperimentError::World(e) => Some(e),
            _ => None,
        }
    }
}

impl World {
    pub const MAX_EXPERIMENT_STEPS: usize = 1_000_000;

    pub fn new(config: SimConfig) -> Self {
        Self::try_new(config).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_new(config: SimConfig) -> Result<Self, WorldError> {
        let rng = ChaCha12Rng::seed_from_u64(config.seed);
        Self::with_rng(config, rng)
    }

    /// Build a world drawing all randomness from `rng` instead of the
    /// configured seed.
    pub fn with_rng(config: SimConfig, rng: ChaCha12Rng) -> Result<Self, WorldError> {
        config.validate()?;
        let (n_x, n_y) = (config.n_x, config.n_y);
        let num_virus = config.num_virus();
        let solver = Box::new(config.inhibitor);
        Ok(Self {
            virus: vec![Field::zeros(n_x, n_y); num_virus],
            bacteria: Field::zeros(n_x, n_y),
            concentration: Field::zeros(n_x, n_y),
            params: vec![None; num_virus],
            solver,
            rng,
            virus_history: Vec::new(),
            concentration_history: Vec::new(),
            step_index: 0,
            exited_last_step: 0,
            total_exited: 0,
            config,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn model(&self) -> ModelVariant {
        self.config.model
    }

    pub fn num_virus(&self) -> usize {
        self.virus.len()
    }

    pub fn n_x(&self) -> usize {
        self.config.n_x
    }

    pub fn n_y(&self) -> usize {
        self.config.n_y
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// Replace the concentration solver. Takes effect at the next recompute.
    pub fn set_solver(&mut self, solver: Box<dyn ConcentrationSolver>) {
        self.solver = solver;
    }

    fn check_variant(&self, variant: usize) -> Result<(), WorldError> {
        if variant >= self.num_virus() {
            return Err(WorldError::InvalidVariant {
                variant,
                num_virus: self.num_virus(),
            });
        }
        Ok(())
    }

    pub fn set_virus_parameters(
        &mut self,
        variant: usize,
        diffuse_rate: f64,
        growth_rate: f64,
        carrying_capacity: f64,
    ) -> Result<(), WorldError> {
        self.set_virus_params(
            variant,
            VirusParameters::new(diffuse_rate, growth_rate, carrying_capacity),
        )
    }

    pub fn set_virus_params(
        &mut self,
        variant: usize,
        params: VirusParameters,
    ) -> Result<(), WorldError> {
        self.check_variant(variant)?;
        params
            .validate()
            .map_err(|reason| WorldError::InvalidVirusParameters { variant, reason })?;
        self.params[variant] = Some(params);
        Ok(())
    }

    pub fn virus_parameters(&self, variant: usize) -> Option<&VirusParameters> {
        self.params.get(variant).and_then(|p| p.as_ref())
    }

    /// Place Wolbachia, then compute and record the initial concentration.
    pub fn initialize_bacteria(&mut self, pattern: BacteriaPattern) -> Result<(), WorldError> {
        pattern.validate().map_err(WorldError::InvalidProbability)?;
        pattern.place(&mut self.bacteria, &mut self.rng);
        let present = self.bacteria.data().iter().filter(|&&b| b == 1).count();
        log::info!(
            "placed wolbachia ({pattern:?}) in {present} of {} cells",
            self.bacteria.data().len()
        );
        self.recompute_concentration();
        self.concentration_history.push(self.concentration.clone());
        Ok(())
    }

    /// Set one cell of variant `variant` to a population of 1 and record the
    /// virus snapshot.
    pub fn seed_virus(&mut self, variant: usize, cell: (usize, usize)) -> Result<(), WorldError> {
        self.check_variant(variant)?;
        if !self.virus[variant].contains(cell.0, cell.1) {
            return Err(WorldError::CellOutOfBounds {
                cell,
                n_x: self.n_x(),
                n_y: self.n_y(),
            });
        }
        self.virus[variant][cell] = 1;
        log::info!("seeded virus variant {variant} at {cell:?}");
        self.virus_history.push(self.virus.clone());
        Ok(())
    }

    /// Seed at [`DEFAULT_SEED_CELL`].
    ///
    /// Grids smaller than 16x16 are accepted at construction; on those this
    /// fails with [`WorldError::CellOutOfBounds`].
    pub fn seed_virus_default(&mut self, variant: usize) -> Result<(), WorldError> {
        self.seed_virus(variant, DEFAULT_SEED_CELL)
    }

    /// Recompute the concentration field from bacteria and unmodified virus.
    pub fn recompute_concentration(&mut self) {
        self.concentration = self.solver.solve(&self.bacteria, &self.virus[0]);
    }

    pub fn virus(&self, variant: usize) -> &Field<u64> {
        &self.virus[variant]
    }

    pub fn virus_fields(&self) -> &[Field<u64>] {
        &self.virus
    }

    pub fn bacteria(&self) -> &Field<u8> {
        &self.bacteria
    }

    pub fn concentration(&self) -> &Field<f64> {
        &self.concentration
    }

    pub fn virus_history(&self) -> &[VirusSnapshot] {
        &self.virus_history
    }

    pub fn concentration_history(&self) -> &[Field<f64>] {
        &self.concentration_history
    }

    pub fn virus_totals(&self) -> Vec<u64> {
        self.virus.iter().map(Field::<u64>::total).collect()
    }

    pub fn run_experiment(&mut self, steps: usize, sample_every: usize) -> RunSummary {
        self.try_run_experiment(steps, sample_every)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_run_experiment(
        &mut self,
        steps: usize,
        sample_every: usize,
    ) -> Result<RunSummary, ExperimentError> {
        if sample_every == 0 {
            return Err(ExperimentError::InvalidSampleEvery);
        }
        if steps > Self::MAX_EXPERIMENT_STEPS {
            return Err(ExperimentError::TooManySteps {
                max: Self::MAX_EXPERIMENT_STEPS,
                actual: steps,
            });
        }
        self.check_parameters()?;

        let estimated_samples = if steps == 0 {
            0
        } else {
            ((steps - 1) / sample_every) + 1
        };
        let exited_before = self.total_exited;
        let mut samples = Vec::with_capacity(estimated_samples);
        for step in 1..=steps {
            self.try_step()?;
            if step % sample_every == 0 || step == steps {
                samples.push(self.collect_step_metrics(step));
            }
        }
        Ok(RunSummary {
            schema_version: 1,
            model: self.config.model,
            n_x: self.n_x(),
            n_y: self.n_y(),
            steps,
            sample_every,
            samples,
            final_virus_totals: self.virus_totals(),
            total_exited: self.total_exited - exited_before,
        })
    }
}
