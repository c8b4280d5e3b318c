//! Classifier configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! [encoder]
//! small_amount_below = 20.0
//! large_amount_from = 100.0
//!
//! [service]
//! not_available_label = "N/A"
//! likelihood_top_n = 20
//! target_column = "category"
//! min_training_rows = 2
//!
//! [evaluation]
//! tolerance_rank = 1
//! train_ratio = 0.9
//! min_validation_rows = 2
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Float, Result, SpendcatError};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub encoder: EncoderConfig,
    pub service: ServiceConfig,
    pub evaluation: EvaluationConfig,
}

/// Boundaries of the amount buckets.
///
/// `|v| < small_amount_below` is a small amount, `|v| >= large_amount_from`
/// a large one, anything in between is medium.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub small_amount_below: Float,
    pub large_amount_from: Float,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            small_amount_below: 20.0,
            large_amount_from: 100.0,
        }
    }
}

impl EncoderConfig {
    /// # Errors
    ///
    /// - [`SpendcatError::InvalidHyperparameter`] unless
    ///   `0 <= small_amount_below <= large_amount_from` (both finite).
    pub fn validate(&self) -> Result<()> {
        let small = self.small_amount_below;
        let large = self.large_amount_from;

        if !small.is_finite() || small < 0.0 {
            return Err(SpendcatError::InvalidHyperparameter {
                name: "small_amount_below".into(),
                value: small.to_string(),
            });
        }
        if !large.is_finite() || large < small {
            return Err(SpendcatError::InvalidHyperparameter {
                name: "large_amount_from".into(),
                value: format!("{} < small_amount_below ({})", large, small),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Label reported for every row when no model is loaded. Training rows
    /// carrying this label are treated as unlabelled.
    pub not_available_label: String,
    /// Tokens kept per class when listing likelihoods.
    pub likelihood_top_n: usize,
    /// Name of the column holding the category.
    pub target_column: String,
    pub min_training_rows: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            not_available_label: "N/A".into(),
            likelihood_top_n: 20,
            target_column: "category".into(),
            min_training_rows: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Highest rank of the true label still counted as a hit.
    pub tolerance_rank: usize,
    /// Share of the (date ordered) rows used for training; the rest validates.
    pub train_ratio: Float,
    pub min_validation_rows: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            tolerance_rank: 1,
            train_ratio: 0.9,
            min_validation_rows: 2,
        }
    }
}

impl Config {
    /// Reads and validates a TOML config file.
    ///
    /// # Errors
    ///
    /// - [`SpendcatError::Io`] if the file cannot be read.
    /// - [`SpendcatError::Config`] if it is not valid TOML for this schema.
    /// - [`SpendcatError::InvalidHyperparameter`] if a value is out of range.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| SpendcatError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.encoder.validate()?;

        let ratio = self.evaluation.train_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(SpendcatError::InvalidHyperparameter {
                name: "train_ratio".into(),
                value: ratio.to_string(),
            });
        }

        if self.service.not_available_label.is_empty() {
            return Err(SpendcatError::InvalidHyperparameter {
                name: "not_available_label".into(),
                value: "\"\"".into(),
            });
        }

        Ok(())
    }
}
