//! Structured feature descriptors and the boundary naming convention

use crate::error::{NowcastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stationarizing transform applied to a base indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformKind {
    /// Raw level, no transform
    None,
    /// 12-month difference
    D12,
    /// 12-month log difference
    LogD12,
    /// 4-quarter difference
    D4,
    /// 4-quarter log difference
    LogD4,
}

impl TransformKind {
    fn suffix(self) -> &'static str {
        match self {
            TransformKind::None => "",
            TransformKind::D12 => "_d12",
            TransformKind::LogD12 => "_log_d12",
            TransformKind::D4 => "_d4",
            TransformKind::LogD4 => "_log_d4",
        }
    }
}

/// Feature universe a monthly-origin column belongs to
///
/// The d12 universe holds the 12-month (log-)differences; the rolling
/// universe holds the trailing means derived from them. The two are disjoint
/// for cataloging purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureUniverse {
    D12,
    Rolling,
}

impl FeatureUniverse {
    pub const ALL: [FeatureUniverse; 2] = [FeatureUniverse::D12, FeatureUniverse::Rolling];

    pub fn tag(self) -> &'static str {
        match self {
            FeatureUniverse::D12 => "d12",
            FeatureUniverse::Rolling => "rolling",
        }
    }
}

impl FromStr for FeatureUniverse {
    type Err = NowcastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "d12" => Ok(FeatureUniverse::D12),
            "rolling" => Ok(FeatureUniverse::Rolling),
            other => Err(NowcastError::Config(format!(
                "unknown feature universe '{}', expected 'd12' or 'rolling'",
                other
            ))),
        }
    }
}

impl fmt::Display for FeatureUniverse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Which month within the quarter a monthly observation became known
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AvailabilityLevel {
    M1,
    M2,
    M3,
}

impl AvailabilityLevel {
    pub const ALL: [AvailabilityLevel; 3] = [
        AvailabilityLevel::M1,
        AvailabilityLevel::M2,
        AvailabilityLevel::M3,
    ];

    /// Level as 1..=3
    pub fn as_u8(self) -> u8 {
        match self {
            AvailabilityLevel::M1 => 1,
            AvailabilityLevel::M2 => 2,
            AvailabilityLevel::M3 => 3,
        }
    }

    /// Boundary constructor for adapters addressing levels numerically
    pub fn try_from_u8(level: u8) -> Result<Self> {
        match level {
            1 => Ok(AvailabilityLevel::M1),
            2 => Ok(AvailabilityLevel::M2),
            3 => Ok(AvailabilityLevel::M3),
            other => Err(NowcastError::Config(format!(
                "availability level must be in 1..=3, got {}",
                other
            ))),
        }
    }

    /// Level of a month position within the quarter (1..=3)
    pub fn from_month_in_quarter(position: u32) -> Result<Self> {
        Self::try_from_u8(position as u8)
    }

    pub(crate) fn suffix(self) -> &'static str {
        match self {
            AvailabilityLevel::M1 => "_m1",
            AvailabilityLevel::M2 => "_m2",
            AvailabilityLevel::M3 => "_m3",
        }
    }
}

/// Full provenance of a derived column: base indicator, transform, rolling
/// window, month-in-quarter vintage and lag offset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDescriptor {
    pub base: String,
    pub transform: TransformKind,
    /// Rolling-mean window over the transformed series, if any
    pub window: Option<usize>,
    /// Month-in-quarter vintage for monthly-origin columns
    pub vintage: Option<AvailabilityLevel>,
    /// Lag offset in quarters
    pub lag: Option<usize>,
}

impl FeatureDescriptor {
    /// Descriptor for an untransformed base indicator
    pub fn raw(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            transform: TransformKind::None,
            window: None,
            vintage: None,
            lag: None,
        }
    }

    pub fn with_transform(mut self, transform: TransformKind) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_vintage(mut self, vintage: AvailabilityLevel) -> Self {
        self.vintage = Some(vintage);
        self
    }

    pub fn with_lag(mut self, lag: usize) -> Self {
        self.lag = Some(lag);
        self
    }

    /// Render the boundary column name:
    /// `<base>[_d12|_log_d12|_d4|_log_d4][_roll_mean_<w>][_m<k>][_lag<n>]`
    pub fn column_name(&self) -> String {
        let mut name = String::with_capacity(self.base.len() + 24);
        name.push_str(&self.base);
        name.push_str(self.transform.suffix());
        if let Some(w) = self.window {
            name.push_str(&format!("_roll_mean_{}", w));
        }
        if let Some(v) = self.vintage {
            name.push_str(v.suffix());
        }
        if let Some(l) = self.lag {
            name.push_str(&format!("_lag{}", l));
        }
        name
    }

    /// Reconstruct provenance from a boundary column name
    ///
    /// Suffixes are stripped right to left; anything left over is the base
    /// indicator name. Unrecognized names parse as raw descriptors.
    pub fn parse(name: &str) -> Self {
        let mut rest = name;

        let mut lag = None;
        if let Some(idx) = rest.rfind("_lag") {
            let digits = &rest[idx + 4..];
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                lag = digits.parse().ok();
                if lag.is_some() {
                    rest = &rest[..idx];
                }
            }
        }

        let mut vintage = None;
        for level in AvailabilityLevel::ALL {
            if let Some(stripped) = rest.strip_suffix(level.suffix()) {
                vintage = Some(level);
                rest = stripped;
                break;
            }
        }

        let mut window = None;
        if let Some(idx) = rest.rfind("_roll_mean_") {
            let digits = &rest[idx + "_roll_mean_".len()..];
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                window = digits.parse().ok();
                if window.is_some() {
                    rest = &rest[..idx];
                }
            }
        }

        let (transform, base) = if let Some(b) = rest.strip_suffix("_log_d12") {
            (TransformKind::LogD12, b)
        } else if let Some(b) = rest.strip_suffix("_d12") {
            (TransformKind::D12, b)
        } else if let Some(b) = rest.strip_suffix("_log_d4") {
            (TransformKind::LogD4, b)
        } else if let Some(b) = rest.strip_suffix("_d4") {
            (TransformKind::D4, b)
        } else {
            (TransformKind::None, rest)
        };

        Self {
            base: base.to_string(),
            transform,
            window,
            vintage,
            lag,
        }
    }
}
