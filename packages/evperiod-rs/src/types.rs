use serde::{Deserialize, Serialize};

use crate::cutoff::{check_cutoff_period, PoleParameters};
use crate::error::{EvPeriodError, Result};
use crate::period::EstimatorKind;
use crate::stats::{PeriodError, PeriodHistogram, PeriodStats};

/// Timestamps are nanoseconds; frequencies in Hz divide by this.
pub const NANOS_PER_SECOND: f64 = 1e9;

/// Single polarity event at one pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    /// Sensor time in nanoseconds
    pub timestamp: i64,
    /// `true` = ON (brightness increase), `false` = OFF
    pub polarity: bool,
}

impl Event {
    pub fn new(timestamp: i64, polarity: bool) -> Self {
        Self {
            timestamp,
            polarity,
        }
    }

    pub fn on(timestamp: i64) -> Self {
        Self::new(timestamp, true)
    }

    pub fn off(timestamp: i64) -> Self {
        Self::new(timestamp, false)
    }

    /// Impulse fed to the reconstructor: +1 for ON, -1 for OFF
    pub fn impulse(&self) -> f64 {
        if self.polarity {
            1.0
        } else {
            -1.0
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\t{}", self.timestamp, u8::from(self.polarity))
    }
}

/// Time-ordered event sequence of a single pixel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelEvents {
    /// Flat pixel index (row-major)
    pub pixel: u32,
    pub events: Vec<Event>,
}

impl PixelEvents {
    pub fn new(pixel: u32, events: Vec<Event>) -> Self {
        Self { pixel, events }
    }
}

/// Check that timestamps never decrease. Repeated timestamps are fine.
pub fn validate_monotonic(events: &[Event]) -> Result<()> {
    for (index, pair) in events.windows(2).enumerate() {
        if pair[1].timestamp < pair[0].timestamp {
            return Err(EvPeriodError::NonMonotonicTimestamps {
                index: index + 1,
                previous: pair[0].timestamp,
                current: pair[1].timestamp,
            });
        }
    }
    Ok(())
}

/// A point in time between two integer timestamps: `anchor + offset` ns.
///
/// The anchor keeps full `i64` precision at any absolute time; the offset
/// carries only the sub-sample part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubSampleTime {
    pub anchor: i64,
    pub offset: f64,
}

impl SubSampleTime {
    pub fn new(anchor: i64, offset: f64) -> Self {
        Self { anchor, offset }
    }

    pub fn at(timestamp: i64) -> Self {
        Self::new(timestamp, 0.0)
    }

    /// Elapsed time since `earlier`, with the integer parts subtracted in `i64`
    pub fn since(&self, earlier: &SubSampleTime) -> f64 {
        self.anchor.saturating_sub(earlier.anchor) as f64 + (self.offset - earlier.offset)
    }
}

/// One measured oscillation cycle
///
/// Baseline and filtered records close on event timestamps and carry zero
/// offsets, so their periods are exact integers. Interpolated records keep
/// the sub-sample position of each crossing in the offsets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    /// End of the cycle (ns)
    pub t_end: i64,
    /// Start of the cycle (ns)
    pub t_start: i64,
    /// Sub-sample part of the cycle end (ns)
    #[serde(default)]
    pub end_offset: f64,
    /// Sub-sample part of the cycle start (ns)
    #[serde(default)]
    pub start_offset: f64,
    /// Reconstructed signal level where the cycle was closed
    pub amplitude: f64,
}

impl PeriodRecord {
    pub fn new(t_end: i64, t_start: i64, amplitude: f64) -> Self {
        Self {
            t_end,
            t_start,
            end_offset: 0.0,
            start_offset: 0.0,
            amplitude,
        }
    }

    /// Record between two interpolated zero crossings
    pub fn interpolated(end: SubSampleTime, start: SubSampleTime) -> Self {
        Self {
            t_end: end.anchor,
            t_start: start.anchor,
            end_offset: end.offset,
            start_offset: start.offset,
            amplitude: 0.0,
        }
    }

    pub fn end(&self) -> SubSampleTime {
        SubSampleTime::new(self.t_end, self.end_offset)
    }

    pub fn start(&self) -> SubSampleTime {
        SubSampleTime::new(self.t_start, self.start_offset)
    }

    /// Cycle length in timestamp units
    pub fn period(&self) -> f64 {
        self.end().since(&self.start())
    }

    /// Instantaneous frequency, `1 / (t_end - t_start)`, in inverse timestamp units
    pub fn frequency(&self) -> f64 {
        1.0 / self.period()
    }

    /// Instantaneous frequency in Hz, assuming nanosecond timestamps
    pub fn frequency_hz(&self) -> f64 {
        NANOS_PER_SECOND / self.period()
    }
}

/// Noise filter timing parameters (nanoseconds)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoiseFilterConfig {
    /// Minimum gap before a polarity flip-back is trusted
    #[serde(default)]
    pub pass_dt: i64,
    /// Chatter window after an accepted transition; defaults to `pass_dt`
    #[serde(default)]
    pub dead_dt: Option<i64>,
}

impl NoiseFilterConfig {
    pub fn new(pass_dt: i64, dead_dt: Option<i64>) -> Self {
        Self { pass_dt, dead_dt }
    }

    pub fn resolved_dead_dt(&self) -> i64 {
        self.dead_dt.unwrap_or(self.pass_dt)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pass_dt < 0 {
            return Err(EvPeriodError::InvalidParameter(format!(
                "pass_dt must be >= 0, got {}",
                self.pass_dt
            )));
        }
        if self.resolved_dead_dt() < 0 {
            return Err(EvPeriodError::InvalidParameter(format!(
                "dead_dt must be >= 0, got {}",
                self.resolved_dead_dt()
            )));
        }
        Ok(())
    }
}

/// Complete analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Target cutoff period T, in events (samples)
    pub cutoff_period: f64,
    #[serde(default)]
    pub noise: NoiseFilterConfig,
    /// Known signal frequency, used for error statistics
    #[serde(default)]
    pub ground_truth_hz: Option<f64>,
    /// Histogram bin count; no histograms when absent
    #[serde(default)]
    pub histogram_bins: Option<usize>,
}

impl AnalysisConfig {
    pub fn new(cutoff_period: f64) -> Self {
        Self {
            cutoff_period,
            noise: NoiseFilterConfig::default(),
            ground_truth_hz: None,
            histogram_bins: None,
        }
    }

    pub fn with_noise_filter(mut self, pass_dt: i64, dead_dt: Option<i64>) -> Self {
        self.noise = NoiseFilterConfig::new(pass_dt, dead_dt);
        self
    }

    pub fn with_ground_truth(mut self, hz: f64) -> Self {
        self.ground_truth_hz = Some(hz);
        self
    }

    pub fn with_histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = Some(bins);
        self
    }

    /// Number of leading samples skipped by every estimator: `2 * round(T)`
    pub fn warm_up_samples(&self) -> usize {
        warm_up_samples(self.cutoff_period)
    }

    pub fn validate(&self) -> Result<()> {
        check_cutoff_period(self.cutoff_period)?;
        self.noise.validate()?;
        if let Some(hz) = self.ground_truth_hz {
            if !hz.is_finite() || hz <= 0.0 {
                return Err(EvPeriodError::InvalidParameter(format!(
                    "ground truth frequency must be > 0, got {}",
                    hz
                )));
            }
        }
        if self.histogram_bins == Some(0) {
            return Err(EvPeriodError::InvalidParameter(
                "histogram bin count must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn warm_up_samples(cutoff_period: f64) -> usize {
    (cutoff_period.round().max(0.0) as usize).saturating_mul(2)
}

/// Statistics of one estimator's series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorSummary {
    pub estimator: EstimatorKind,
    pub stats: Option<PeriodStats>,
    pub error: Option<PeriodError>,
    pub histogram: Option<PeriodHistogram>,
}

/// Everything measured at one pixel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelResult {
    pub pixel: u32,
    /// Events offered to the noise filter
    pub total_events: usize,
    /// Events that passed the noise filter
    pub accepted_events: usize,
    pub baseline_on: Vec<PeriodRecord>,
    pub baseline_off: Vec<PeriodRecord>,
    pub filtered: Vec<PeriodRecord>,
    pub interpolated: Vec<PeriodRecord>,
    pub summaries: Vec<EstimatorSummary>,
}

impl PixelResult {
    pub fn rejected_events(&self) -> usize {
        self.total_events - self.accepted_events
    }

    pub fn records(&self, kind: EstimatorKind) -> &[PeriodRecord] {
        match kind {
            EstimatorKind::BaselineOn => &self.baseline_on,
            EstimatorKind::BaselineOff => &self.baseline_off,
            EstimatorKind::Filtered => &self.filtered,
            EstimatorKind::Interpolated => &self.interpolated,
        }
    }

    pub fn summary(&self, kind: EstimatorKind) -> Option<&EstimatorSummary> {
        self.summaries.iter().find(|s| s.estimator == kind)
    }

    pub fn is_empty(&self) -> bool {
        EstimatorKind::ALL.iter().all(|&k| self.records(k).is_empty())
    }
}

/// Result of analysing a set of pixels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: String,
    pub config: AnalysisConfig,
    pub poles: PoleParameters,
    pub pixels: Vec<PixelResult>,
    pub created_at: String,
}

impl AnalysisResult {
    pub fn new(config: AnalysisConfig, poles: PoleParameters, pixels: Vec<PixelResult>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            config,
            poles,
            pixels,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn pixel(&self, pixel: u32) -> Option<&PixelResult> {
        self.pixels.iter().find(|p| p.pixel == pixel)
    }
}
