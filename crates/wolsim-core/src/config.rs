use crate::inhibitor::InhibitorPde;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::{error::Error, fmt};

/// Which variant of the model to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelVariant {
    /// One virus, growth suppressed directly by the inhibitor concentration.
    #[default]
    Signalling,
    /// Unmodified (0) and modified (1) virus; Wolbachia cells route growth
    /// into the modified variant.
    Genetic,
}

impl ModelVariant {
    pub fn num_virus(self) -> usize {
        match self {
            ModelVariant::Signalling => 1,
            ModelVariant::Genetic => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModelVariant::Signalling => "signalling",
            ModelVariant::Genetic => "genetic",
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelVariant {
    type Err = SimConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signalling" => Ok(ModelVariant::Signalling),
            "genetic" => Ok(ModelVariant::Genetic),
            other => Err(SimConfigError::UnknownModel(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub n_x: usize,
    pub n_y: usize,
    pub model: ModelVariant,
    pub seed: u64,
    pub inhibitor: InhibitorPde,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            n_x: 20,
            n_y: 20,
            model: ModelVariant::Signalling,
            seed: 0,
            inhibitor: InhibitorPde::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimConfigError {
    InvalidGridSize { n_x: usize, n_y: usize },
    GridTooLarge { max: usize, actual: usize },
    UnknownModel(String),
    InvalidInhibitor(String),
    Parse(String),
}

impl fmt::Display for SimConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimConfigError::InvalidGridSize { n_x, n_y } => {
                write!(f, "grid dimensions must be positive, got {n_x}x{n_y}")
            }
            SimConfigError::GridTooLarge { max, actual } => {
                write!(f, "grid cell count ({actual}) exceeds supported maximum ({max})")
            }
            SimConfigError::UnknownModel(name) => write!(
                f,
                "model variant {name:?} not recognized (expected \"signalling\" or \"genetic\")"
            ),
            SimConfigError::InvalidInhibitor(reason) => {
                write!(f, "invalid inhibitor parameters: {reason}")
            }
            SimConfigError::Parse(reason) => write!(f, "could not parse config: {reason}"),
        }
    }
}

impl Error for SimConfigError {}

impl SimConfig {
    pub const MAX_CELLS: usize = 4_194_304;

    /// Convenience constructor taking the model by name.
    pub fn for_model(n_x: usize, n_y: usize, model: &str) -> Result<Self, SimConfigError> {
        let config = Self {
            n_x,
            n_y,
            model: model.parse()?,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, SimConfigError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SimConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimConfigError> {
        if self.n_x == 0 || self.n_y == 0 {
            return Err(SimConfigError::InvalidGridSize {
                n_x: self.n_x,
                n_y: self.n_y,
            });
        }
        let cells = self
            .n_x
            .checked_mul(self.n_y)
            .ok_or(SimConfigError::GridTooLarge {
                max: Self::MAX_CELLS,
                actual: usize::MAX,
            })?;
        if cells > Self::MAX_CELLS {
            return Err(SimConfigError::GridTooLarge {
                max: Self::MAX_CELLS,
                actual: cells,
            });
        }
        self.inhibitor.validate()
    }

    pub fn num_virus(&self) -> usize {
        self.model.num_virus()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_model_names() {
        assert_eq!("signalling".parse::<ModelVariant>(), Ok(ModelVariant::Signalling));
        assert_eq!("genetic".parse::<ModelVariant>(), Ok(ModelVariant::Genetic));
        assert_eq!(ModelVariant::Signalling.num_virus(), 1);
        assert_eq!(ModelVariant::Genetic.num_virus(), 2);
    }

    #[test]
    fn rejects_unknown_model_names() {
        for name in ["", "Signalling", "signaling", "both"] {
            assert_eq!(
                name.parse::<ModelVariant>(),
                Err(SimConfigError::UnknownModel(name.to_string()))
            );
        }
        assert!(SimConfig::for_model(20, 20, "hybrid").is_err());
    }

    #[test]
    fn rejects_empty_grid() {
        let config = SimConfig {
            n_x: 0,
            ..SimConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(SimConfigError::InvalidGridSize { n_x: 0, n_y: 20 })
        );
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = SimConfig::from_json_str(r#"{"model": "genetic", "n_x": 32}"#).unwrap();
        assert_eq!(config.model, ModelVariant::Genetic);
        assert_eq!(config.n_x, 32);
        assert_eq!(config.n_y, 20);
        assert_eq!(config.inhibitor, InhibitorPde::default());
    }

    #[test]
    fn json_rejects_unknown_model() {
        assert!(SimConfig::from_json_str(r#"{"model": "mystery"}"#).is_err());
    }

    #[test]
    fn json_rejects_solver_with_too_many_steps() {
        let err = SimConfig::from_json_str(r#"{"inhibitor": {"dt": 1e-9}}"#).unwrap_err();
        assert!(matches!(err, SimConfigError::InvalidInhibitor(_)));
    }
}
