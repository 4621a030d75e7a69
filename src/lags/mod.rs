//! Per-horizon lag generation without look-ahead
//!
//! For horizon 1 the freshest available vintage is used directly (nowcast);
//! for horizon h > 1 monthly-origin columns gain a `_lag{h-1}` copy shifted
//! down h-1 rows. Quarterly target transforms, used autoregressively, gain
//! `_lag{h}` copies for every horizon h in [1, H], so a model forecasting h
//! quarters ahead never sees a target observation less than h periods old.
//! Only columns are added; no rows are filtered.

use crate::error::{NowcastError, Result};
use crate::feature::{AvailabilityCatalog, FeatureDescriptor};
use crate::panel::TimePanel;
use rayon::prelude::*;
use tracing::debug;

/// Builds per-horizon lagged feature and target columns
#[derive(Debug, Clone)]
pub struct LagGenerator {
    max_horizon: usize,
}

impl LagGenerator {
    /// Generator for horizons 1..=`max_horizon`
    pub fn new(max_horizon: usize) -> Self {
        Self { max_horizon }
    }

    /// Append lag columns for every cataloged monthly-origin column and
    /// every quarterly target transform
    pub fn generate(
        &self,
        panel: &TimePanel,
        catalog: &AvailabilityCatalog,
        targets: &[FeatureDescriptor],
    ) -> Result<TimePanel> {
        let mut jobs: Vec<(String, usize)> = Vec::new();
        for horizon in 2..=self.max_horizon {
            for name in catalog.monthly_columns() {
                jobs.push((name, horizon - 1));
            }
        }
        for horizon in 1..=self.max_horizon {
            for target in targets {
                jobs.push((target.column_name(), horizon));
            }
        }

        let lagged: Vec<(String, Vec<Option<f64>>)> = jobs
            .par_iter()
            .map(|(name, lag)| -> Result<(String, Vec<Option<f64>>)> {
                let values = panel.column(name).map_err(|_| {
                    NowcastError::DataIntegrity(format!(
                        "cataloged column '{}' missing from aligned panel",
                        name
                    ))
                })?;
                let desc = FeatureDescriptor::parse(name).with_lag(*lag);
                Ok((desc.column_name(), shift_down(values, *lag)))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut out = panel.clone();
        for (name, values) in lagged {
            out.add_column(name, values)?;
        }
        debug!(
            lag_columns = jobs.len(),
            max_horizon = self.max_horizon,
            "generated per-horizon lags"
        );
        Ok(out)
    }
}

/// Row i takes the value formerly at row i - k; the first k rows become null.
/// No wraparound.
fn shift_down(values: &[Option<f64>], k: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| if i < k { None } else { values[i - k] })
        .collect()
}
