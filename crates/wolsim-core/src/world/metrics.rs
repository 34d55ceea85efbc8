use super::World;
use crate::config::ModelVariant;
use crate::grid::Field;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug)]
pub struct StepTimings {
    pub virus_update_us: u64,
    pub concentration_us: u64,
    pub total_us: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct StepMetrics {
    pub step: usize,
    /// Population per variant.
    pub virus_totals: Vec<u64>,
    /// Non-empty cells per variant.
    pub occupied_cells: Vec<usize>,
    pub exited_count: u64,
    pub concentration_mean: f64,
    pub concentration_max: f64,
    /// Virus population sitting on Wolbachia cells, per variant.
    pub virus_on_bacteria: Vec<u64>,
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub model: ModelVariant,
    pub n_x: usize,
    pub n_y: usize,
    pub steps: usize,
    pub sample_every: usize,
    pub samples: Vec<StepMetrics>,
    #[serde(default)]
    pub final_virus_totals: Vec<u64>,
    #[serde(default)]
    pub total_exited: u64,
}

impl World {
    pub(crate) fn collect_step_metrics(&self, step: usize) -> StepMetrics {
        let on_bacteria = |field: &Field<u64>| -> u64 {
            field
                .data()
                .iter()
                .zip(self.bacteria.data())
                .filter(|&(_, &b)| b == 1)
                .map(|(&v, _)| v)
                .sum()
        };
        StepMetrics {
            step,
            virus_totals: self.virus_totals(),
            occupied_cells: self.virus.iter().map(Field::<u64>::occupied).collect(),
            exited_count: self.exited_last_step,
            concentration_mean: self.concentration.mean(),
            concentration_max: self.concentration.max(),
            virus_on_bacteria: self.virus.iter().map(on_bacteria).collect(),
        }
    }
}
