//! Per-pixel period estimation for event-camera streams.
//!
//! Pipeline per pixel: [`NoiseFilter`] -> [`CascadedReconstructor`] ->
//! period estimators ([`PeriodExtractor`]).

pub mod cutoff;
pub mod error;
pub mod noise_filter;
pub mod parser;
pub mod period;
pub mod reconstructor;
pub mod runner;
pub mod stats;
pub mod types;

pub use cutoff::{
    compute_alpha_for_cutoff, compute_beta_for_cutoff, FrequencyResponse, PoleParameters,
    MIN_CUTOFF_PERIOD,
};
pub use error::{EvPeriodError, Result};
pub use noise_filter::NoiseFilter;
pub use parser::{parse_events, parse_events_from_bytes, read_events_file};
pub use period::{
    extract_periods, EstimatorKind, EstimatorMetadata, PeriodExtractor, PeriodSeries,
    ESTIMATOR_REGISTRY,
};
pub use reconstructor::{reconstruct, CascadedReconstructor, ReconstructorState};
pub use runner::{active_pixels, analyze_pixel, PeriodRunner, PixelAnalyzer};
pub use stats::{PeriodError, PeriodHistogram, PeriodStats};
pub use types::*;
