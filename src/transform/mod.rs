//! Stationarizing transforms and rolling smooths
//!
//! Classifies monthly columns as log-eligible, derives 12-month
//! (log-)differences and their trailing rolling means, and derives 4-quarter
//! log differences for the quarterly targets. Derived columns are appended;
//! raw columns stay in place.

use crate::error::{NowcastError, Result};
use crate::feature::{FeatureDescriptor, TransformKind};
use crate::panel::TimePanel;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Null handling for the trailing rolling mean
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollingNullPolicy {
    /// Any null among the trailing `w` values, or a window not yet fully
    /// formed, yields null. Conservative default.
    #[default]
    Strict,
    /// Average whatever non-null values the trailing window holds; null only
    /// when the window holds none.
    Partial,
}

/// Configuration for the transform stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Trailing rolling-mean window lengths, in months
    pub rolling_windows: Vec<usize>,
    pub rolling_null_policy: RollingNullPolicy,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            rolling_windows: vec![3, 6, 12],
            rolling_null_policy: RollingNullPolicy::default(),
        }
    }
}

/// Monthly panel with derived columns appended, plus the descriptors of the
/// two feature universes produced
#[derive(Debug, Clone)]
pub struct MonthlyFeatures {
    pub panel: TimePanel,
    /// 12-month (log-)difference columns, in derivation order
    pub d12: Vec<FeatureDescriptor>,
    /// Rolling-mean columns over the d12 universe
    pub rolling: Vec<FeatureDescriptor>,
}

/// Quarterly panel with target transforms appended
#[derive(Debug, Clone)]
pub struct QuarterlyFeatures {
    pub panel: TimePanel,
    /// 4-quarter log-difference columns, one per target
    pub d4: Vec<FeatureDescriptor>,
}

/// Derives stationarizing transforms for both panels
#[derive(Debug, Clone, Default)]
pub struct TransformEngine {
    config: TransformConfig,
}

impl TransformEngine {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    /// Derive `_d12`/`_log_d12` columns for every monthly indicator and
    /// trailing rolling means over them
    ///
    /// A column is log-eligible iff every observed value is strictly
    /// positive. Log-eligible columns are processed first, then the rest,
    /// each group in panel column order, so the derived column set is
    /// deterministic.
    pub fn transform_monthly(&self, panel: &TimePanel) -> Result<MonthlyFeatures> {
        let mut log_eligible = Vec::new();
        let mut not_log_eligible = Vec::new();
        for name in panel.column_names() {
            let values = panel.column(name)?;
            if values.iter().flatten().all(|v| *v > 0.0) {
                log_eligible.push(name.to_string());
            } else {
                not_log_eligible.push(name.to_string());
            }
        }

        let descriptors: Vec<FeatureDescriptor> = log_eligible
            .iter()
            .map(|name| FeatureDescriptor::raw(name).with_transform(TransformKind::LogD12))
            .chain(
                not_log_eligible
                    .iter()
                    .map(|name| FeatureDescriptor::raw(name).with_transform(TransformKind::D12)),
            )
            .collect();

        let d12_values: Vec<(FeatureDescriptor, Vec<Option<f64>>)> = descriptors
            .par_iter()
            .map(|desc| -> Result<(FeatureDescriptor, Vec<Option<f64>>)> {
                let values = panel.column(&desc.base)?;
                let log = desc.transform == TransformKind::LogD12;
                Ok((desc.clone(), period_diff(values, 12, log)))
            })
            .collect::<Result<Vec<_>>>()?;

        let rolling_values: Vec<(FeatureDescriptor, Vec<Option<f64>>)> = self
            .config
            .rolling_windows
            .iter()
            .flat_map(|w| d12_values.iter().map(move |(desc, values)| (*w, desc, values)))
            .collect::<Vec<_>>()
            .par_iter()
            .map(|(w, desc, values)| {
                let rolled = rolling_mean(values, *w, self.config.rolling_null_policy);
                ((*desc).clone().with_window(*w), rolled)
            })
            .collect();

        let mut out = panel.clone();
        let mut d12 = Vec::with_capacity(d12_values.len());
        for (desc, values) in d12_values {
            out.add_column(desc.column_name(), values)?;
            d12.push(desc);
        }
        let mut rolling = Vec::with_capacity(rolling_values.len());
        for (desc, values) in rolling_values {
            out.add_column(desc.column_name(), values)?;
            rolling.push(desc);
        }

        debug!(
            d12 = d12.len(),
            rolling = rolling.len(),
            "derived monthly transforms"
        );
        Ok(MonthlyFeatures { panel: out, d12, rolling })
    }

    /// Derive `_log_d4` columns for the quarterly targets
    ///
    /// Targets are assumed strictly positive; a non-positive observation is a
    /// data integrity error.
    pub fn transform_quarterly(
        &self,
        panel: &TimePanel,
        targets: &[String],
    ) -> Result<QuarterlyFeatures> {
        let mut out = panel.clone();
        let mut d4 = Vec::with_capacity(targets.len());
        for target in targets {
            let values = panel.column(target).map_err(|_| {
                NowcastError::DataIntegrity(format!(
                    "target column '{}' not found in quarterly panel",
                    target
                ))
            })?;
            for (row, value) in values.iter().enumerate() {
                if let Some(v) = value {
                    if *v <= 0.0 {
                        return Err(NowcastError::DataIntegrity(format!(
                            "target column '{}' has non-positive value {} at {}",
                            target,
                            v,
                            panel.dates()[row]
                        )));
                    }
                }
            }
            let desc = FeatureDescriptor::raw(target).with_transform(TransformKind::LogD4);
            out.add_column(desc.column_name(), period_diff(values, 4, true))?;
            d4.push(desc);
        }
        debug!(targets = d4.len(), "derived quarterly target transforms");
        Ok(QuarterlyFeatures { panel: out, d4 })
    }
}

/// Difference against the value `k` periods earlier; null unless both
/// operands are observed
fn period_diff(values: &[Option<f64>], k: usize, log: bool) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i < k {
                return None;
            }
            match (values[i], values[i - k]) {
                (Some(now), Some(then)) => Some(if log {
                    now.ln() - then.ln()
                } else {
                    now - then
                }),
                _ => None,
            }
        })
        .collect()
}

/// Trailing simple average of the `w` most recent values ending at the
/// current period, inclusive
fn rolling_mean(values: &[Option<f64>], w: usize, policy: RollingNullPolicy) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            let window_full = i + 1 >= w;
            let start = if window_full { i + 1 - w } else { 0 };
            let window = &values[start..=i];
            match policy {
                RollingNullPolicy::Strict => {
                    if !window_full || window.iter().any(|v| v.is_none()) {
                        None
                    } else {
                        Some(window.iter().flatten().sum::<f64>() / w as f64)
                    }
                }
                RollingNullPolicy::Partial => {
                    let observed: Vec<f64> = window.iter().flatten().copied().collect();
                    if observed.is_empty() {
                        None
                    } else {
                        Some(observed.iter().sum::<f64>() / observed.len() as f64)
                    }
                }
            }
        })
        .collect()
}
