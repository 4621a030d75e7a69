//! End-to-end feature pipeline
//!
//! Chains the stages into a single deterministic batch transform:
//! chain reconstruction -> stationarizing transforms -> frequency alignment
//! -> quarterly join -> lag generation -> temporal split. Each stage boundary
//! is a hard barrier; every stage reads an immutable panel and produces a new
//! one, so reruns on identical input yield identical output.

use crate::align::FrequencyAligner;
use crate::chain::{AnchorPolicy, ChainIndexReconstructor};
use crate::error::{NowcastError, Result};
use crate::feature::AvailabilityCatalog;
use crate::lags::LagGenerator;
use crate::panel::{Frequency, TimePanel};
use crate::split::TemporalSplitter;
use crate::transform::{RollingNullPolicy, TransformConfig, TransformEngine};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Full pipeline configuration, supplied at construction and validated
/// before any data is touched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Monthly columns given as chain-linked indices (base 100)
    pub chain_index_columns: Vec<String>,
    /// Quarterly target column names
    pub target_columns: Vec<String>,
    /// Maximum forecast horizon H; horizons run 1..=H
    pub max_horizon: usize,
    /// Trailing rolling-mean window lengths, in months
    pub rolling_windows: Vec<usize>,
    /// Validation window length, in quarters
    pub valid_len: usize,
    /// Test window length, in quarters
    pub test_len: usize,
    /// Rows before this year are discarded prior to splitting
    pub start_year: i32,
    pub anchor_policy: AnchorPolicy,
    pub rolling_null_policy: RollingNullPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chain_index_columns: Vec::new(),
            target_columns: Vec::new(),
            max_horizon: 6,
            rolling_windows: vec![3, 6, 12],
            valid_len: 12,
            test_len: 12,
            start_year: 2001,
            anchor_policy: AnchorPolicy::default(),
            rolling_null_policy: RollingNullPolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_chain_index_columns(mut self, columns: Vec<String>) -> Self {
        self.chain_index_columns = columns;
        self
    }

    pub fn with_target_columns(mut self, columns: Vec<String>) -> Self {
        self.target_columns = columns;
        self
    }

    pub fn with_max_horizon(mut self, horizon: usize) -> Self {
        self.max_horizon = horizon;
        self
    }

    pub fn with_rolling_windows(mut self, windows: Vec<usize>) -> Self {
        self.rolling_windows = windows;
        self
    }

    pub fn with_valid_len(mut self, quarters: usize) -> Self {
        self.valid_len = quarters;
        self
    }

    pub fn with_test_len(mut self, quarters: usize) -> Self {
        self.test_len = quarters;
        self
    }

    pub fn with_start_year(mut self, year: i32) -> Self {
        self.start_year = year;
        self
    }

    pub fn with_anchor_policy(mut self, policy: AnchorPolicy) -> Self {
        self.anchor_policy = policy;
        self
    }

    pub fn with_rolling_null_policy(mut self, policy: RollingNullPolicy) -> Self {
        self.rolling_null_policy = policy;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_horizon < 1 {
            return Err(NowcastError::Config(format!(
                "max horizon must be >= 1, got {}",
                self.max_horizon
            )));
        }
        if self.valid_len < 1 || self.test_len < 1 {
            return Err(NowcastError::Config(format!(
                "validation and test lengths must be >= 1, got {} and {}",
                self.valid_len, self.test_len
            )));
        }
        if self.rolling_windows.is_empty() {
            return Err(NowcastError::Config(
                "at least one rolling window is required".to_string(),
            ));
        }
        if let Some(w) = self.rolling_windows.iter().find(|w| **w < 1) {
            return Err(NowcastError::Config(format!(
                "rolling windows must be >= 1, got {}",
                w
            )));
        }
        if self.target_columns.is_empty() {
            return Err(NowcastError::Config(
                "at least one quarterly target column is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// The pipeline's immutable output: three schema-identical panels and the
/// availability catalog model adapters select columns from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub train: TimePanel,
    pub valid: TimePanel,
    pub test: TimePanel,
    pub catalog: AvailabilityCatalog,
}

/// Deterministic batch pipeline over one monthly and one quarterly snapshot
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    config: PipelineConfig,
}

impl FeaturePipeline {
    /// Validate the configuration and build the pipeline; configuration
    /// errors surface here, before any data is touched
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full transform over one input snapshot
    pub fn run(&self, monthly: &TimePanel, quarterly: &TimePanel) -> Result<PipelineOutput> {
        if monthly.frequency() != Frequency::Monthly {
            return Err(NowcastError::DataIntegrity(
                "first input panel must be monthly".to_string(),
            ));
        }
        if quarterly.frequency() != Frequency::Quarterly {
            return Err(NowcastError::DataIntegrity(
                "second input panel must be quarterly".to_string(),
            ));
        }
        info!(
            monthly_rows = monthly.n_rows(),
            monthly_cols = monthly.n_cols(),
            quarterly_rows = quarterly.n_rows(),
            max_horizon = self.config.max_horizon,
            "running feature pipeline"
        );

        let reconstructed = ChainIndexReconstructor::new(self.config.chain_index_columns.clone())
            .with_policy(self.config.anchor_policy)
            .reconstruct(monthly)?;

        let engine = TransformEngine::new(TransformConfig {
            rolling_windows: self.config.rolling_windows.clone(),
            rolling_null_policy: self.config.rolling_null_policy,
        });
        let monthly_features = engine.transform_monthly(&reconstructed)?;
        let quarterly_features = engine.transform_quarterly(quarterly, &self.config.target_columns)?;

        let aligner = FrequencyAligner::new();
        let (aligned, catalog) = aligner.align(
            &monthly_features.panel,
            &monthly_features.d12,
            &monthly_features.rolling,
        )?;
        let joined = aligner.join_quarterly(&quarterly_features.panel, &aligned)?;

        let lagged = LagGenerator::new(self.config.max_horizon).generate(
            &joined,
            &catalog,
            &quarterly_features.d4,
        )?;

        let (train, valid, test) =
            TemporalSplitter::new(self.config.start_year, self.config.valid_len, self.config.test_len)?
                .split(&lagged)?;

        info!(
            train = train.n_rows(),
            valid = valid.n_rows(),
            test = test.n_rows(),
            columns = lagged.n_cols(),
            "feature pipeline finished"
        );
        Ok(PipelineOutput {
            train,
            valid,
            test,
            catalog,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_rejects_zero_horizon() {
        let config = PipelineConfig::default()
            .with_target_columns(vec!["y".into()])
            .with_max_horizon(0);
        assert!(matches!(
            FeaturePipeline::new(config),
            Err(NowcastError::Config(_))
        ));
    }

    #[test]
    fn test_config_rejects_zero_window_lengths() {
        let base = PipelineConfig::default().with_target_columns(vec!["y".into()]);
        assert!(FeaturePipeline::new(base.clone().with_valid_len(0)).is_err());
        assert!(FeaturePipeline::new(base.clone().with_test_len(0)).is_err());
        assert!(FeaturePipeline::new(base.clone().with_rolling_windows(vec![])).is_err());
        assert!(FeaturePipeline::new(base.clone().with_rolling_windows(vec![3, 0])).is_err());
        assert!(FeaturePipeline::new(base).is_ok());
    }

    #[test]
    fn test_config_requires_targets() {
        assert!(matches!(
            FeaturePipeline::new(PipelineConfig::default()),
            Err(NowcastError::Config(_))
        ));
    }
}
