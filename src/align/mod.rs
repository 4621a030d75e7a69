//! Monthly-to-quarterly frequency alignment
//!
//! Reshapes monthly feature columns into three month-in-quarter vintages,
//! joins them onto the quarterly grid keyed by (year, quarter), and records
//! which columns become available at each point in the quarter. Run once per
//! feature universe; the two outputs are combined column-wise on the shared
//! quarterly key.

use crate::error::{NowcastError, Result};
use crate::feature::{AvailabilityCatalog, AvailabilityLevel, FeatureDescriptor, FeatureUniverse};
use crate::panel::{month_in_quarter, quarter_of, quarter_start, Frequency, TimePanel};
use chrono::Datelike;
use std::collections::HashMap;
use tracing::debug;

/// Aligns monthly vintages onto the quarterly grid
#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencyAligner;

impl FrequencyAligner {
    pub fn new() -> Self {
        Self
    }

    /// Align both feature universes and build the combined availability
    /// catalog
    ///
    /// The quarterly key set is the set of quarters holding a first-month
    /// observation (the partitions are left-outer-joined with partition 1 as
    /// the base); quarters missing their second or third month carry nulls
    /// for those vintages.
    pub fn align(
        &self,
        monthly: &TimePanel,
        d12: &[FeatureDescriptor],
        rolling: &[FeatureDescriptor],
    ) -> Result<(TimePanel, AvailabilityCatalog)> {
        let mut catalog = AvailabilityCatalog::new();
        let (mut aligned, d12_levels) =
            self.align_universe(monthly, FeatureUniverse::D12, d12)?;
        let (rolling_panel, rolling_levels) =
            self.align_universe(monthly, FeatureUniverse::Rolling, rolling)?;

        if aligned.dates() != rolling_panel.dates() {
            return Err(NowcastError::Alignment(
                "feature universes disagree on the quarterly key set".to_string(),
            ));
        }
        for name in rolling_panel.column_names() {
            aligned.add_column(name, rolling_panel.column(name)?.to_vec())?;
        }

        for (level, columns) in AvailabilityLevel::ALL.into_iter().zip(d12_levels) {
            catalog.set_columns(FeatureUniverse::D12, level, columns);
        }
        for (level, columns) in AvailabilityLevel::ALL.into_iter().zip(rolling_levels) {
            catalog.set_columns(FeatureUniverse::Rolling, level, columns);
        }

        debug!(
            quarters = aligned.n_rows(),
            columns = aligned.n_cols(),
            "aligned monthly vintages to quarterly grid"
        );
        Ok((aligned, catalog))
    }

    /// One invocation of the alignment for a single universe: partition by
    /// month-in-quarter, rename with the vintage suffix, join on (year,
    /// quarter)
    fn align_universe(
        &self,
        monthly: &TimePanel,
        universe: FeatureUniverse,
        columns: &[FeatureDescriptor],
    ) -> Result<(TimePanel, [Vec<String>; 3])> {
        if monthly.frequency() != Frequency::Monthly {
            return Err(NowcastError::DataIntegrity(
                "frequency alignment expects a monthly panel".to_string(),
            ));
        }

        // Partition row indices by month-in-quarter, keyed by (year, quarter).
        let mut partitions: [HashMap<(i32, u32), usize>; 3] = Default::default();
        let mut base_keys: Vec<(i32, u32)> = Vec::new();
        for (row, date) in monthly.dates().iter().enumerate() {
            let key = (date.year(), quarter_of(*date));
            let level = AvailabilityLevel::from_month_in_quarter(month_in_quarter(*date))?;
            let slot = (level.as_u8() - 1) as usize;
            if partitions[slot].insert(key, row).is_some() {
                return Err(NowcastError::Alignment(format!(
                    "duplicate (year, quarter) key ({}, Q{}) in month-{} partition ({})",
                    key.0,
                    key.1,
                    level.as_u8(),
                    universe
                )));
            }
            if level == AvailabilityLevel::M1 {
                base_keys.push(key);
            }
        }

        let dates = base_keys
            .iter()
            .map(|(year, quarter)| {
                quarter_start(*year, *quarter).ok_or_else(|| {
                    NowcastError::Alignment(format!("invalid quarter key ({}, Q{})", year, quarter))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let mut aligned = TimePanel::new(Frequency::Quarterly, dates)?;

        let mut level_columns: [Vec<String>; 3] = Default::default();
        for (slot, partition) in partitions.iter().enumerate() {
            let level = AvailabilityLevel::ALL[slot];
            for desc in columns {
                let source = monthly.column(&desc.column_name())?;
                let name = desc.clone().with_vintage(level).column_name();
                let values = base_keys
                    .iter()
                    .map(|key| partition.get(key).and_then(|row| source[*row]))
                    .collect();
                aligned.add_column(name.clone(), values)?;
                level_columns[slot].push(name);
            }
        }

        Ok((aligned, level_columns))
    }

    /// Join the aligned vintages onto the quarterly panel (targets and their
    /// transforms), inner-joined on the quarterly date with the quarterly
    /// panel as the base
    pub fn join_quarterly(&self, quarterly: &TimePanel, aligned: &TimePanel) -> Result<TimePanel> {
        if quarterly.frequency() != Frequency::Quarterly {
            return Err(NowcastError::DataIntegrity(
                "join expects a quarterly panel".to_string(),
            ));
        }
        let aligned_rows: HashMap<_, _> = aligned
            .dates()
            .iter()
            .enumerate()
            .map(|(row, date)| (*date, row))
            .collect();

        let keep: Vec<(usize, usize)> = quarterly
            .dates()
            .iter()
            .enumerate()
            .filter_map(|(row, date)| aligned_rows.get(date).map(|a| (row, *a)))
            .collect();

        let dates = keep.iter().map(|(q, _)| quarterly.dates()[*q]).collect();
        let mut joined = TimePanel::new(Frequency::Quarterly, dates)?;
        for name in quarterly.column_names() {
            let values = quarterly.column(name)?;
            joined.add_column(name, keep.iter().map(|(q, _)| values[*q]).collect())?;
        }
        for name in aligned.column_names() {
            let values = aligned.column(name)?;
            joined.add_column(name, keep.iter().map(|(_, a)| values[*a]).collect())?;
        }
        debug!(
            quarters = joined.n_rows(),
            columns = joined.n_cols(),
            "joined quarterly targets with aligned vintages"
        );
        Ok(joined)
    }
}
