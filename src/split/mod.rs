//! Strictly time-ordered train/validation/test partitioning
//!
//! Pure date-cutoff windows over the panel's tail: the test window covers the
//! last T quarters, validation the V quarters immediately before it, and
//! training everything earlier (after the minimum start year filter). The
//! three windows are contiguous, non-overlapping and reconstruct the filtered
//! input exactly.

use crate::error::{NowcastError, Result};
use crate::panel::TimePanel;
use chrono::{Datelike, Months, NaiveDate};
use tracing::debug;

/// Partitions a quarterly panel into train/valid/test by calendar cutoffs
#[derive(Debug, Clone, Copy)]
pub struct TemporalSplitter {
    start_year: i32,
    valid_len: usize,
    test_len: usize,
}

impl TemporalSplitter {
    /// Splitter discarding rows before `start_year`, holding out `valid_len`
    /// quarters for validation and `test_len` quarters for test
    ///
    /// Both window lengths must be at least one quarter; zero is a
    /// configuration error, not a request for an empty window.
    pub fn new(start_year: i32, valid_len: usize, test_len: usize) -> Result<Self> {
        if valid_len < 1 || test_len < 1 {
            return Err(NowcastError::Config(format!(
                "validation and test windows must each span >= 1 quarter, got {} and {}",
                valid_len, test_len
            )));
        }
        Ok(Self {
            start_year,
            valid_len,
            test_len,
        })
    }

    /// Split into (train, valid, test)
    pub fn split(&self, panel: &TimePanel) -> Result<(TimePanel, TimePanel, TimePanel)> {
        let filtered = panel.filter_dates(|d| d.year() >= self.start_year);
        let max_date = filtered.dates().last().copied().ok_or_else(|| {
            NowcastError::DataIntegrity(format!(
                "no rows remain after filtering to years >= {}",
                self.start_year
            ))
        })?;

        let test_start = back_quarters(max_date, self.test_len - 1)?;
        let valid_end = back_quarters(max_date, self.test_len)?;
        let valid_start = back_quarters(valid_end, self.valid_len - 1)?;

        let test = filtered.filter_dates(|d| d >= test_start && d <= max_date);
        let valid = filtered.filter_dates(|d| d >= valid_start && d <= valid_end);
        let train = filtered.filter_dates(|d| d < valid_start);

        if test.n_rows() != self.test_len {
            return Err(NowcastError::DataIntegrity(format!(
                "test window spans {} quarters, expected {} (missing quarters in the panel tail?)",
                test.n_rows(),
                self.test_len
            )));
        }
        if valid.n_rows() != self.valid_len {
            return Err(NowcastError::DataIntegrity(format!(
                "validation window spans {} quarters, expected {}",
                valid.n_rows(),
                self.valid_len
            )));
        }

        debug!(
            train = train.n_rows(),
            valid = valid.n_rows(),
            test = test.n_rows(),
            "split panel by date cutoffs"
        );
        Ok((train, valid, test))
    }
}

/// The first day of the quarter `n` quarters before `date`
fn back_quarters(date: NaiveDate, n: usize) -> Result<NaiveDate> {
    date.checked_sub_months(Months::new(3 * n as u32))
        .ok_or_else(|| {
            NowcastError::DataIntegrity(format!("date arithmetic underflow at {} - {}q", date, n))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::Frequency;

    fn quarterly_panel(start_year: i32, start_quarter: u32, quarters: usize) -> TimePanel {
        let dates: Vec<NaiveDate> = (0..quarters)
            .map(|i| {
                let q0 = (start_quarter as usize - 1) + i;
                NaiveDate::from_ymd_opt(
                    start_year + (q0 / 4) as i32,
                    3 * (q0 % 4) as u32 + 1,
                    1,
                )
                .unwrap()
            })
            .collect();
        let n = dates.len();
        let mut panel = TimePanel::new(Frequency::Quarterly, dates).unwrap();
        panel
            .add_column("y", (0..n).map(|i| Some(i as f64)).collect())
            .unwrap();
        panel
    }

    #[test]
    fn test_split_windows_scenario() {
        // 1999Q1..2020Q4, Y0 = 2001, V = T = 12: test is 2018Q1..2020Q4,
        // valid 2015Q1..2017Q4, train 2001Q1 up to (not including) 2015Q1.
        let panel = quarterly_panel(1999, 1, 88);
        let splitter = TemporalSplitter::new(2001, 12, 12).unwrap();
        let (train, valid, test) = splitter.split(&panel).unwrap();

        assert_eq!(test.n_rows(), 12);
        assert_eq!(
            test.dates().first(),
            Some(&NaiveDate::from_ymd_opt(2018, 1, 1).unwrap())
        );
        assert_eq!(
            test.dates().last(),
            Some(&NaiveDate::from_ymd_opt(2020, 10, 1).unwrap())
        );

        assert_eq!(valid.n_rows(), 12);
        assert_eq!(
            valid.dates().first(),
            Some(&NaiveDate::from_ymd_opt(2015, 1, 1).unwrap())
        );
        assert_eq!(
            valid.dates().last(),
            Some(&NaiveDate::from_ymd_opt(2017, 10, 1).unwrap())
        );

        assert_eq!(
            train.dates().first(),
            Some(&NaiveDate::from_ymd_opt(2001, 1, 1).unwrap())
        );
        assert_eq!(
            train.dates().last(),
            Some(&NaiveDate::from_ymd_opt(2014, 10, 1).unwrap())
        );
    }

    #[test]
    fn test_partitions_disjoint_and_exhaustive() {
        let panel = quarterly_panel(2000, 1, 40);
        let splitter = TemporalSplitter::new(2001, 4, 4).unwrap();
        let (train, valid, test) = splitter.split(&panel).unwrap();

        let filtered = panel.filter_dates(|d| d.year() >= 2001);
        assert_eq!(
            train.n_rows() + valid.n_rows() + test.n_rows(),
            filtered.n_rows()
        );
        let mut all: Vec<NaiveDate> = train
            .dates()
            .iter()
            .chain(valid.dates())
            .chain(test.dates())
            .copied()
            .collect();
        assert_eq!(all, filtered.dates());
        all.dedup();
        assert_eq!(all.len(), filtered.n_rows());
        assert!(train.dates().last() < valid.dates().first());
        assert!(valid.dates().last() < test.dates().first());
    }

    #[test]
    fn test_short_tail_is_integrity_error() {
        let panel = quarterly_panel(2019, 1, 6);
        let result = TemporalSplitter::new(2019, 4, 4).unwrap().split(&panel);
        assert!(matches!(result, Err(NowcastError::DataIntegrity(_))));
    }

    #[test]
    fn test_empty_after_start_year_filter() {
        let panel = quarterly_panel(2000, 1, 8);
        let result = TemporalSplitter::new(2010, 1, 1).unwrap().split(&panel);
        assert!(matches!(result, Err(NowcastError::DataIntegrity(_))));
    }

    #[test]
    fn test_single_quarter_windows() {
        let panel = quarterly_panel(2020, 1, 8);
        let splitter = TemporalSplitter::new(2020, 1, 1).unwrap();
        let (train, valid, test) = splitter.split(&panel).unwrap();
        assert_eq!(test.n_rows(), 1);
        assert_eq!(valid.n_rows(), 1);
        assert_eq!(train.n_rows(), 6);
    }

    #[test]
    fn test_zero_length_windows_rejected_at_construction() {
        // A zero-quarter window is never widened to one quarter silently.
        assert!(matches!(
            TemporalSplitter::new(2018, 0, 4),
            Err(NowcastError::Config(_))
        ));
        assert!(matches!(
            TemporalSplitter::new(2018, 4, 0),
            Err(NowcastError::Config(_))
        ));
        assert!(TemporalSplitter::new(2018, 1, 1).is_ok());
    }
}
