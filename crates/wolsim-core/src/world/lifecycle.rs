use super::metrics::StepTimings;
use super::{World, WorldError};
use crate::config::ModelVariant;
use crate::virus::{self, CellContext, PassStats};
use std::time::Instant;

impl World {
    pub(crate) fn check_parameters(&self) -> Result<(), WorldError> {
        match self.params.iter().position(Option::is_none) {
            Some(variant) => Err(WorldError::MissingVirusParameters { variant }),
            None => Ok(()),
        }
    }

    /// Grow and diffuse every variant in ascending order. Variant `k + 1`
    /// sees variant `k` already updated for this step.
    fn step_virus_phase(&mut self) -> Result<PassStats, WorldError> {
        let mut stats = PassStats::default();
        for k in 0..self.virus.len() {
            let params = self.params[k].ok_or(WorldError::MissingVirusParameters { variant: k })?;
            let ctx = CellContext {
                model: self.config.model,
                params: &params,
                bacteria: &self.bacteria,
                concentration: &self.concentration,
            };
            stats.merge(virus::update_variant(
                &ctx,
                &mut self.virus,
                k,
                &mut self.rng,
            ));
        }
        Ok(stats)
    }

    /// Only the signalling model tracks concentration over time; the genetic
    /// model keeps the field computed at bacterium initialization.
    fn step_concentration_phase(&mut self) {
        if self.config.model != ModelVariant::Signalling {
            return;
        }
        self.recompute_concentration();
        self.concentration_history.push(self.concentration.clone());
    }

    pub fn step(&mut self) -> StepTimings {
        self.try_step().unwrap_or_else(|e| panic!("{e}"))
    }

    /// Advance one step. Fails before touching any field if a variant has
    /// no parameters.
    pub fn try_step(&mut self) -> Result<StepTimings, WorldError> {
        self.check_parameters()?;
        let total_start = Instant::now();
        self.step_index = self.step_index.saturating_add(1);

        let t0 = Instant::now();
        let stats = self.step_virus_phase()?;
        let virus_update_us = t0.elapsed().as_micros() as u64;

        let t1 = Instant::now();
        self.step_concentration_phase();
        let concentration_us = t1.elapsed().as_micros() as u64;

        self.virus_history.push(self.virus.clone());
        self.exited_last_step = stats.exited;
        self.total_exited = self.total_exited.saturating_add(stats.exited);

        let timings = StepTimings {
            virus_update_us,
            concentration_us,
            total_us: total_start.elapsed().as_micros() as u64,
        };
        log::debug!(
            "step {}: totals {:?}, {} cells visited, {} hops, {} exited, {}us",
            self.step_index,
            self.virus_totals(),
            stats.cells_visited,
            stats.hops,
            stats.exited,
            timings.total_us
        );
        Ok(timings)
    }
}
