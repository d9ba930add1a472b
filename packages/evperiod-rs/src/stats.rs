use serde::{Deserialize, Serialize};

use crate::types::{PeriodRecord, NANOS_PER_SECOND};

/// Summary statistics of a period series (timestamp units)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: f64,
    pub max: f64,
    /// `1 / mean`, in Hz for nanosecond timestamps
    pub mean_frequency_hz: f64,
}

impl PeriodStats {
    /// `None` for an empty series
    pub fn from_records(records: &[PeriodRecord]) -> Option<Self> {
        Self::from_periods(records.iter().map(PeriodRecord::period))
    }

    pub fn from_periods<I>(periods: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let periods: Vec<f64> = periods.into_iter().collect();
        if periods.is_empty() {
            return None;
        }
        let n = periods.len() as f64;
        let mean = periods.iter().sum::<f64>() / n;
        let variance = periods.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
        let min = periods.iter().copied().fold(f64::INFINITY, f64::min);
        let max = periods.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            count: periods.len(),
            mean,
            std: variance.sqrt(),
            min,
            max,
            mean_frequency_hz: NANOS_PER_SECOND / mean,
        })
    }

    pub fn variance(&self) -> f64 {
        self.std * self.std
    }

    /// Deviation of this series from a known signal frequency
    pub fn error_against(&self, ground_truth_hz: f64) -> PeriodError {
        let expected = NANOS_PER_SECOND / ground_truth_hz;
        let bias = self.mean - expected;
        PeriodError {
            ground_truth_period: expected,
            mean_error: bias,
            rms_error: (self.variance() + bias * bias).sqrt(),
        }
    }
}

/// Period error against ground truth (timestamp units)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodError {
    pub ground_truth_period: f64,
    pub mean_error: f64,
    pub rms_error: f64,
}

/// Fixed-width histogram of periods over `[lo, hi]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodHistogram {
    pub lo: f64,
    pub hi: f64,
    pub centers: Vec<f64>,
    pub counts: Vec<usize>,
}

impl PeriodHistogram {
    /// Periods outside `[lo, hi]` are not counted. Returns `None` for zero
    /// bins or an empty/inverted range.
    pub fn build(records: &[PeriodRecord], bins: usize, lo: f64, hi: f64) -> Option<Self> {
        if bins == 0 || !(hi > lo) || !lo.is_finite() || !hi.is_finite() {
            return None;
        }
        let width = (hi - lo) / bins as f64;
        let centers = (0..bins).map(|i| lo + (i as f64 + 0.5) * width).collect();
        let mut counts = vec![0usize; bins];
        for period in records.iter().map(PeriodRecord::period) {
            if period < lo || period > hi {
                continue;
            }
            let idx = (((period - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        Some(Self {
            lo,
            hi,
            centers,
            counts,
        })
    }

    /// Range `mean ± 3·std` of `stats`, widened to ±1% of the mean when the
    /// series has no spread.
    pub fn around(records: &[PeriodRecord], bins: usize, stats: &PeriodStats) -> Option<Self> {
        let half = if stats.std > 0.0 {
            3.0 * stats.std
        } else {
            0.01 * stats.mean.abs()
        };
        Self::build(records, bins, stats.mean - half, stats.mean + half)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}
