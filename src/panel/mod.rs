//! Time panels: ordered, nullable numeric columns over a date axis
//!
//! A [`TimePanel`] is the unit of data flowing between pipeline stages: one
//! row per period, strictly increasing dates, named `Option<f64>` columns.
//! Monthly panels sit at first-of-month granularity, quarterly panels at
//! first-of-quarter. Every stage produces a new panel rather than mutating
//! its input.

use crate::error::{NowcastError, Result};
use chrono::{Datelike, NaiveDate};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Sampling frequency of a panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Monthly,
    Quarterly,
}

/// Month position within the quarter (1, 2 or 3)
pub fn month_in_quarter(date: NaiveDate) -> u32 {
    (date.month() - 1) % 3 + 1
}

/// Calendar quarter of a date (1..=4)
pub fn quarter_of(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

/// First day of the given calendar quarter
pub fn quarter_start(year: i32, quarter: u32) -> Option<NaiveDate> {
    if !(1..=4).contains(&quarter) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, 3 * (quarter - 1) + 1, 1)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Column {
    name: String,
    values: Vec<Option<f64>>,
}

/// Ordered rows of (date, named nullable numeric fields), one row per period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimePanel {
    frequency: Frequency,
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl TimePanel {
    /// Create an empty panel over a validated date axis
    pub fn new(frequency: Frequency, dates: Vec<NaiveDate>) -> Result<Self> {
        for pair in dates.windows(2) {
            if pair[1] <= pair[0] {
                return Err(NowcastError::DataIntegrity(format!(
                    "dates must be strictly increasing: {} followed by {}",
                    pair[0], pair[1]
                )));
            }
        }
        for date in &dates {
            let granular = match frequency {
                Frequency::Monthly => date.day() == 1,
                Frequency::Quarterly => date.day() == 1 && (date.month() - 1) % 3 == 0,
            };
            if !granular {
                return Err(NowcastError::DataIntegrity(format!(
                    "date {} does not match {:?} granularity",
                    date, frequency
                )));
            }
        }
        Ok(Self {
            frequency,
            dates,
            columns: Vec::new(),
        })
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Column names in insertion order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Values of a named column
    pub fn column(&self, name: &str) -> Result<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
            .ok_or_else(|| NowcastError::DataIntegrity(format!("column '{}' not found", name)))
    }

    /// Append a new column; the name must be fresh and the length must match
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Result<()> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(NowcastError::DataIntegrity(format!(
                "duplicate column '{}'",
                name
            )));
        }
        if values.len() != self.dates.len() {
            return Err(NowcastError::DataIntegrity(format!(
                "column '{}' has {} values for {} rows",
                name,
                values.len(),
                self.dates.len()
            )));
        }
        self.columns.push(Column { name, values });
        Ok(())
    }

    /// Replace an existing column in place, leaving its position untouched
    pub fn replace_column(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<()> {
        if values.len() != self.dates.len() {
            return Err(NowcastError::DataIntegrity(format!(
                "column '{}' has {} values for {} rows",
                name,
                values.len(),
                self.dates.len()
            )));
        }
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| NowcastError::DataIntegrity(format!("column '{}' not found", name)))?;
        column.values = values;
        Ok(())
    }

    /// New panel keeping only rows whose date satisfies the predicate
    pub fn filter_dates<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(NaiveDate) -> bool,
    {
        let mask: Vec<bool> = self.dates.iter().map(|d| keep(*d)).collect();
        let dates = self
            .dates
            .iter()
            .zip(&mask)
            .filter(|(_, m)| **m)
            .map(|(d, _)| *d)
            .collect();
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: c
                    .values
                    .iter()
                    .zip(&mask)
                    .filter(|(_, m)| **m)
                    .map(|(v, _)| *v)
                    .collect(),
            })
            .collect();
        Self {
            frequency: self.frequency,
            dates,
            columns,
        }
    }

    /// Export selected columns as a dense matrix, nulls mapped to NaN
    ///
    /// This is the hand-off point for model adapters that consume a
    /// (universe, availability, horizon) column subset from the catalog.
    pub fn to_matrix(&self, columns: &[&str]) -> Result<Array2<f64>> {
        let mut data = Vec::with_capacity(self.n_rows() * columns.len());
        let selected: Vec<&[Option<f64>]> = columns
            .iter()
            .map(|name| self.column(name))
            .collect::<Result<Vec<_>>>()?;
        for row in 0..self.n_rows() {
            for values in &selected {
                data.push(values[row].unwrap_or(f64::NAN));
            }
        }
        Array2::from_shape_vec((self.n_rows(), columns.len()), data)
            .map_err(|e| NowcastError::DataIntegrity(format!("matrix export failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_panel_construction() {
        let dates = vec![ymd(2020, 1, 1), ymd(2020, 2, 1), ymd(2020, 3, 1)];
        let mut panel = TimePanel::new(Frequency::Monthly, dates).unwrap();
        panel
            .add_column("x", vec![Some(1.0), None, Some(3.0)])
            .unwrap();
        assert_eq!(panel.n_rows(), 3);
        assert_eq!(panel.column("x").unwrap()[1], None);
    }

    #[test]
    fn test_rejects_non_monotonic_dates() {
        let dates = vec![ymd(2020, 2, 1), ymd(2020, 1, 1)];
        let result = TimePanel::new(Frequency::Monthly, dates);
        assert!(matches!(result, Err(NowcastError::DataIntegrity(_))));
    }

    #[test]
    fn test_rejects_duplicate_dates() {
        let dates = vec![ymd(2020, 1, 1), ymd(2020, 1, 1)];
        assert!(TimePanel::new(Frequency::Monthly, dates).is_err());
    }

    #[test]
    fn test_rejects_wrong_granularity() {
        assert!(TimePanel::new(Frequency::Monthly, vec![ymd(2020, 1, 15)]).is_err());
        assert!(TimePanel::new(Frequency::Quarterly, vec![ymd(2020, 2, 1)]).is_err());
        assert!(TimePanel::new(Frequency::Quarterly, vec![ymd(2020, 4, 1)]).is_ok());
    }

    #[test]
    fn test_rejects_duplicate_column() {
        let mut panel = TimePanel::new(Frequency::Monthly, vec![ymd(2020, 1, 1)]).unwrap();
        panel.add_column("x", vec![Some(1.0)]).unwrap();
        assert!(panel.add_column("x", vec![Some(2.0)]).is_err());
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let mut panel = TimePanel::new(Frequency::Monthly, vec![ymd(2020, 1, 1)]).unwrap();
        assert!(panel.add_column("x", vec![Some(1.0), Some(2.0)]).is_err());
    }

    #[test]
    fn test_filter_dates() {
        let dates = vec![ymd(2019, 1, 1), ymd(2020, 1, 1), ymd(2021, 1, 1)];
        let mut panel = TimePanel::new(Frequency::Quarterly, dates).unwrap();
        panel
            .add_column("x", vec![Some(1.0), Some(2.0), Some(3.0)])
            .unwrap();
        let filtered = panel.filter_dates(|d| d.year() >= 2020);
        assert_eq!(filtered.n_rows(), 2);
        assert_eq!(filtered.column("x").unwrap(), &[Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_quarter_helpers() {
        assert_eq!(month_in_quarter(ymd(2020, 1, 1)), 1);
        assert_eq!(month_in_quarter(ymd(2020, 5, 1)), 2);
        assert_eq!(month_in_quarter(ymd(2020, 12, 1)), 3);
        assert_eq!(quarter_of(ymd(2020, 7, 1)), 3);
        assert_eq!(quarter_start(2020, 4), Some(ymd(2020, 10, 1)));
        assert_eq!(quarter_start(2020, 5), None);
    }

    #[test]
    fn test_to_matrix_maps_nulls_to_nan() {
        let dates = vec![ymd(2020, 1, 1), ymd(2020, 2, 1)];
        let mut panel = TimePanel::new(Frequency::Monthly, dates).unwrap();
        panel.add_column("a", vec![Some(1.0), None]).unwrap();
        panel.add_column("b", vec![None, Some(4.0)]).unwrap();
        let matrix = panel.to_matrix(&["a", "b"]).unwrap();
        assert_eq!(matrix[[0, 0]], 1.0);
        assert!(matrix[[0, 1]].is_nan());
        assert!(matrix[[1, 0]].is_nan());
        assert_eq!(matrix[[1, 1]], 4.0);
    }
}
