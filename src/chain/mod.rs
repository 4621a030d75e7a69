//! Chain-linked index reconstruction
//!
//! Converts period-over-period growth-factor series (base 100) into absolute
//! levels. Each column is an independent left-to-right fold carrying an
//! `Option<f64>` running level as explicit function state, so per-column work
//! can run on parallel workers with no shared mutable state.

use crate::error::{NowcastError, Result};
use crate::panel::TimePanel;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the running level is anchored at the first non-null observation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnchorPolicy {
    /// Anchor at the first observed raw value itself; the growth factor that
    /// triggers the anchor is not applied. Matches the historical behavior
    /// downstream fixtures pin, so it stays the default.
    #[default]
    FirstObserved,
    /// Anchor at 100.0: the first observed period defines the base, and
    /// subsequent growth factors compound from there.
    Base100,
}

/// Reconstructs absolute levels from chain-linked index columns
#[derive(Debug, Clone)]
pub struct ChainIndexReconstructor {
    columns: Vec<String>,
    policy: AnchorPolicy,
}

impl ChainIndexReconstructor {
    /// Reconstructor for the given chain-linked column names
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            policy: AnchorPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: AnchorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace every configured chain column with its reconstructed levels;
    /// all other columns are untouched
    pub fn reconstruct(&self, panel: &TimePanel) -> Result<TimePanel> {
        let reconstructed: Vec<(String, Vec<Option<f64>>)> = self
            .columns
            .par_iter()
            .map(|name| -> Result<(String, Vec<Option<f64>>)> {
                let values = panel.column(name).map_err(|_| {
                    NowcastError::DataIntegrity(format!(
                        "chain-linked column '{}' not found in monthly panel",
                        name
                    ))
                })?;
                Ok((name.clone(), reconstruct_column(values, self.policy)))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut out = panel.clone();
        for (name, values) in reconstructed {
            out.replace_column(&name, values)?;
        }
        debug!(columns = self.columns.len(), "reconstructed chain-linked indices");
        Ok(out)
    }
}

/// Pure fold over one column: nulls emit null and leave the running level
/// unchanged; the first non-null value anchors the level per the policy;
/// every later non-null value `v` advances it to `level * v / 100`.
fn reconstruct_column(values: &[Option<f64>], policy: AnchorPolicy) -> Vec<Option<f64>> {
    let mut last_level: Option<f64> = None;
    values
        .iter()
        .map(|value| match value {
            None => None,
            Some(growth) => {
                let level = match last_level {
                    None => match policy {
                        AnchorPolicy::FirstObserved => *growth,
                        AnchorPolicy::Base100 => 100.0,
                    },
                    Some(previous) => previous * growth / 100.0,
                };
                last_level = Some(level);
                Some(level)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::Frequency;
    use chrono::NaiveDate;

    fn monthly_panel(values: Vec<Option<f64>>) -> TimePanel {
        let dates: Vec<NaiveDate> = (0..values.len())
            .map(|i| {
                NaiveDate::from_ymd_opt(2020 + i as i32 / 12, (i as u32 % 12) + 1, 1).unwrap()
            })
            .collect();
        let mut panel = TimePanel::new(Frequency::Monthly, dates).unwrap();
        panel.add_column("idx", values).unwrap();
        panel
    }

    #[test]
    fn test_anchor_then_compound() {
        let panel = monthly_panel(vec![Some(101.0), Some(102.0), Some(99.0)]);
        let out = ChainIndexReconstructor::new(vec!["idx".into()])
            .reconstruct(&panel)
            .unwrap();
        let values = out.column("idx").unwrap();
        assert_eq!(values[0], Some(101.0));
        assert!((values[1].unwrap() - 101.0 * 102.0 / 100.0).abs() < 1e-9);
        assert!((values[2].unwrap() - 101.0 * 1.02 * 0.99).abs() < 1e-9);
    }

    #[test]
    fn test_nulls_do_not_advance_the_level() {
        let panel = monthly_panel(vec![None, Some(101.0), None, Some(110.0)]);
        let out = ChainIndexReconstructor::new(vec!["idx".into()])
            .reconstruct(&panel)
            .unwrap();
        let values = out.column("idx").unwrap();
        assert_eq!(values[0], None);
        assert_eq!(values[1], Some(101.0));
        assert_eq!(values[2], None);
        // The null in between neither resets nor advances the running level.
        assert!((values[3].unwrap() - 101.0 * 110.0 / 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_base100_anchor() {
        let panel = monthly_panel(vec![None, Some(101.0), Some(102.0)]);
        let out = ChainIndexReconstructor::new(vec!["idx".into()])
            .with_policy(AnchorPolicy::Base100)
            .reconstruct(&panel)
            .unwrap();
        let values = out.column("idx").unwrap();
        assert_eq!(values[1], Some(100.0));
        assert!((values[2].unwrap() - 102.0).abs() < 1e-9);
    }

    #[test]
    fn test_other_columns_untouched() {
        let mut panel = monthly_panel(vec![Some(101.0), Some(102.0)]);
        panel
            .add_column("other", vec![Some(5.0), Some(6.0)])
            .unwrap();
        let out = ChainIndexReconstructor::new(vec!["idx".into()])
            .reconstruct(&panel)
            .unwrap();
        assert_eq!(out.column("other").unwrap(), &[Some(5.0), Some(6.0)]);
    }

    #[test]
    fn test_missing_column_is_integrity_error() {
        let panel = monthly_panel(vec![Some(101.0)]);
        let result = ChainIndexReconstructor::new(vec!["absent".into()]).reconstruct(&panel);
        assert!(matches!(result, Err(NowcastError::DataIntegrity(_))));
    }
}
