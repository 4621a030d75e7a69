//! Leakage-safe feature engineering for macroeconomic nowcasting
//!
//! Prepares mixed-frequency economic time series (monthly indicators,
//! quarterly targets) into a forecast-ready feature panel with point-in-time
//! correctness: no feature may carry information that was not yet available
//! at the period it is attached to.
//!
//! # Modules
//!
//! ## Data model
//! - [`panel`] - Nullable numeric time panels over a validated date axis
//! - [`feature`] - Structured feature provenance and the availability catalog
//!
//! ## Pipeline stages
//! - [`chain`] - Chain-linked index reconstruction (growth factors to levels)
//! - [`transform`] - Stationarizing d12/d4 transforms and rolling smooths
//! - [`align`] - Monthly-to-quarterly alignment with month-in-quarter vintages
//! - [`lags`] - Per-horizon lag generation without look-ahead
//! - [`split`] - Strictly time-ordered train/validation/test windows
//!
//! ## Orchestration
//! - [`pipeline`] - Validated configuration and the end-to-end batch run
//!
//! The pipeline is a pure function of its inputs and configuration: one
//! synchronous pass over an in-memory snapshot, deterministic and safely
//! re-runnable. Per-column work inside a stage runs on parallel workers;
//! stage boundaries are hard barriers.

// Core error handling
pub mod error;

// Data model
pub mod feature;
pub mod panel;

// Pipeline stages
pub mod align;
pub mod chain;
pub mod lags;
pub mod split;
pub mod transform;

// Orchestration
pub mod pipeline;

pub use error::{NowcastError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::align::FrequencyAligner;
    pub use crate::chain::{AnchorPolicy, ChainIndexReconstructor};
    pub use crate::error::{NowcastError, Result};
    pub use crate::feature::{
        AvailabilityCatalog, AvailabilityLevel, FeatureDescriptor, FeatureUniverse, TransformKind,
    };
    pub use crate::lags::LagGenerator;
    pub use crate::panel::{Frequency, TimePanel};
    pub use crate::pipeline::{FeaturePipeline, PipelineConfig, PipelineOutput};
    pub use crate::split::TemporalSplitter;
    pub use crate::transform::{RollingNullPolicy, TransformConfig, TransformEngine};
}
