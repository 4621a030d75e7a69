//! Availability catalog: which columns are known at each point in the quarter

use super::{AvailabilityLevel, FeatureUniverse};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct LevelColumns {
    m1: Vec<String>,
    m2: Vec<String>,
    m3: Vec<String>,
}

impl LevelColumns {
    fn at(&self, level: AvailabilityLevel) -> &Vec<String> {
        match level {
            AvailabilityLevel::M1 => &self.m1,
            AvailabilityLevel::M2 => &self.m2,
            AvailabilityLevel::M3 => &self.m3,
        }
    }

    fn at_mut(&mut self, level: AvailabilityLevel) -> &mut Vec<String> {
        match level {
            AvailabilityLevel::M1 => &mut self.m1,
            AvailabilityLevel::M2 => &mut self.m2,
            AvailabilityLevel::M3 => &mut self.m3,
        }
    }
}

/// Mapping from (feature universe, availability level) to the ordered set of
/// column names known as of that point in the quarter
///
/// For a fixed universe the three per-level sets are pairwise disjoint: each
/// column is tagged to exactly one origin month. The cumulative view at level
/// `a` is the union of levels 1..=a and is monotonically non-decreasing in
/// `a`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityCatalog {
    d12: LevelColumns,
    rolling: LevelColumns,
}

impl AvailabilityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn universe(&self, universe: FeatureUniverse) -> &LevelColumns {
        match universe {
            FeatureUniverse::D12 => &self.d12,
            FeatureUniverse::Rolling => &self.rolling,
        }
    }

    pub(crate) fn set_columns(
        &mut self,
        universe: FeatureUniverse,
        level: AvailabilityLevel,
        columns: Vec<String>,
    ) {
        let slot = match universe {
            FeatureUniverse::D12 => self.d12.at_mut(level),
            FeatureUniverse::Rolling => self.rolling.at_mut(level),
        };
        *slot = columns;
    }

    /// Columns tagged to exactly this (universe, level)
    pub fn columns(&self, universe: FeatureUniverse, level: AvailabilityLevel) -> &[String] {
        self.universe(universe).at(level)
    }

    /// Cumulative view: union of levels 1..=`level`, in level-then-insertion
    /// order
    pub fn cumulative(&self, universe: FeatureUniverse, level: AvailabilityLevel) -> Vec<String> {
        let mut out = Vec::new();
        for l in AvailabilityLevel::ALL {
            if l <= level {
                out.extend(self.columns(universe, l).iter().cloned());
            }
        }
        out
    }

    /// Every column of a universe, across all three levels
    pub fn all_columns(&self, universe: FeatureUniverse) -> Vec<String> {
        self.cumulative(universe, AvailabilityLevel::M3)
    }

    /// Every monthly-origin column across both universes, in a fixed
    /// deterministic order (d12 universe first, then rolling; levels 1..=3
    /// within each)
    pub fn monthly_columns(&self) -> Vec<String> {
        let mut out = Vec::new();
        for universe in FeatureUniverse::ALL {
            out.extend(self.all_columns(universe));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AvailabilityCatalog {
        let mut catalog = AvailabilityCatalog::new();
        catalog.set_columns(
            FeatureUniverse::D12,
            AvailabilityLevel::M1,
            vec!["a_d12_m1".into()],
        );
        catalog.set_columns(
            FeatureUniverse::D12,
            AvailabilityLevel::M2,
            vec!["a_d12_m2".into()],
        );
        catalog.set_columns(
            FeatureUniverse::D12,
            AvailabilityLevel::M3,
            vec!["a_d12_m3".into()],
        );
        catalog.set_columns(
            FeatureUniverse::Rolling,
            AvailabilityLevel::M1,
            vec!["a_d12_roll_mean_3_m1".into()],
        );
        catalog
    }

    #[test]
    fn test_levels_are_disjoint() {
        let catalog = sample();
        for universe in FeatureUniverse::ALL {
            for level in AvailabilityLevel::ALL {
                for other in AvailabilityLevel::ALL {
                    if level == other {
                        continue;
                    }
                    for name in catalog.columns(universe, level) {
                        assert!(!catalog.columns(universe, other).contains(name));
                    }
                }
            }
        }
    }

    #[test]
    fn test_cumulative_is_monotone() {
        let catalog = sample();
        let mut previous = 0;
        for level in AvailabilityLevel::ALL {
            let count = catalog.cumulative(FeatureUniverse::D12, level).len();
            assert!(count >= previous);
            previous = count;
        }
        assert_eq!(
            catalog.cumulative(FeatureUniverse::D12, AvailabilityLevel::M3),
            vec!["a_d12_m1", "a_d12_m2", "a_d12_m3"]
        );
    }

    #[test]
    fn test_monthly_columns_covers_both_universes() {
        let catalog = sample();
        let all = catalog.monthly_columns();
        assert_eq!(all.len(), 4);
        assert!(all.contains(&"a_d12_roll_mean_3_m1".to_string()));
    }

    #[test]
    fn test_serde_round_trip() {
        let catalog = sample();
        let json = serde_json::to_string(&catalog).unwrap();
        let back: AvailabilityCatalog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, catalog);
    }
}
