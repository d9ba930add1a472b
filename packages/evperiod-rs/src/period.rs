//! Period estimation from the reconstructed signal.
//!
//! Three strategies share one sample stream and one warm-up policy:
//!
//! - **Baseline** anchors cycles on the first event of each ON (or OFF) run
//!   of the raw polarity stream;
//! - **Filtered** anchors cycles on the sample where `L` goes from `>= 0`
//!   to `< 0`;
//! - **Interpolated** refines the same crossing linearly between the two
//!   bracketing samples.
//!
//! A sample at 0-based index `i` may close a cycle only when
//! `i > 2 * round(T)`.

use serde::{Deserialize, Serialize};

use crate::types::{warm_up_samples, Event, PeriodRecord, SubSampleTime};

/// One accepted event together with the reconstructed level after it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// 0-based index among accepted events
    pub index: usize,
    pub timestamp: i64,
    pub polarity: bool,
    /// `L` after this event
    pub level: f64,
}

/// Warm-up gate shared by all estimators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmUp {
    samples: usize,
}

impl WarmUp {
    pub fn new(samples: usize) -> Self {
        Self { samples }
    }

    /// `2 * round(T)` samples
    pub fn for_cutoff_period(cutoff_period: f64) -> Self {
        Self::new(warm_up_samples(cutoff_period))
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn is_settled(&self, index: usize) -> bool {
        index > self.samples
    }
}

/// Streaming period estimator over [`Sample`]s
pub trait PeriodEstimator {
    fn kind(&self) -> EstimatorKind;

    /// Observe the next sample; returns a record when a cycle closes
    fn observe(&mut self, sample: &Sample) -> Option<PeriodRecord>;
}

/// Cycle boundaries from polarity changes of the raw stream
#[derive(Debug, Clone)]
pub struct BaselineEstimator {
    polarity: bool,
    warm_up: WarmUp,
    last_polarity: Option<bool>,
    last_anchor: Option<i64>,
}

impl BaselineEstimator {
    /// Estimator anchored on transitions *to* `polarity`
    pub fn new(polarity: bool, warm_up: WarmUp) -> Self {
        Self {
            polarity,
            warm_up,
            last_polarity: None,
            last_anchor: None,
        }
    }
}

impl PeriodEstimator for BaselineEstimator {
    fn kind(&self) -> EstimatorKind {
        if self.polarity {
            EstimatorKind::BaselineOn
        } else {
            EstimatorKind::BaselineOff
        }
    }

    fn observe(&mut self, sample: &Sample) -> Option<PeriodRecord> {
        let changed = self.last_polarity.is_some_and(|p| p != sample.polarity);
        self.last_polarity = Some(sample.polarity);
        if !changed || sample.polarity != self.polarity {
            return None;
        }
        let record = match self.last_anchor {
            Some(start) if self.warm_up.is_settled(sample.index) => {
                Some(PeriodRecord::new(sample.timestamp, start, sample.level))
            }
            _ => None,
        };
        self.last_anchor = Some(sample.timestamp);
        record
    }
}

/// The two samples bracketing a downward zero crossing of `L`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub t_prev: i64,
    pub level_prev: f64,
    pub t: i64,
    pub level: f64,
}

impl Crossing {
    /// Linear estimate of where `L` passes zero, as an offset from `t_prev`.
    ///
    /// A zero previous level is the crossing itself. A flat segment or a
    /// non-finite estimate falls back to the sample timestamp.
    pub fn interpolate(&self) -> SubSampleTime {
        if self.level_prev == 0.0 {
            return SubSampleTime::at(self.t_prev);
        }
        let dl = self.level - self.level_prev;
        if dl == 0.0 {
            log::debug!("flat zero crossing at t={}, using sample time", self.t);
            return SubSampleTime::at(self.t);
        }
        let dt = self.t.saturating_sub(self.t_prev) as f64;
        let offset = -dt * self.level_prev / dl;
        if offset.is_finite() {
            SubSampleTime::new(self.t_prev, offset)
        } else {
            log::debug!("non-finite zero crossing at t={}, using sample time", self.t);
            SubSampleTime::at(self.t)
        }
    }
}

/// Detects `L` moving from `>= 0` to `< 0` after warm-up
#[derive(Debug, Clone)]
pub struct ZeroCrossingDetector {
    warm_up: WarmUp,
    prev: Option<(i64, f64)>,
}

impl ZeroCrossingDetector {
    pub fn new(warm_up: WarmUp) -> Self {
        Self {
            warm_up,
            prev: None,
        }
    }

    pub fn observe(&mut self, sample: &Sample) -> Option<Crossing> {
        let crossing = match self.prev {
            Some((t_prev, level_prev))
                if level_prev >= 0.0
                    && sample.level < 0.0
                    && self.warm_up.is_settled(sample.index) =>
            {
                Some(Crossing {
                    t_prev,
                    level_prev,
                    t: sample.timestamp,
                    level: sample.level,
                })
            }
            _ => None,
        };
        self.prev = Some((sample.timestamp, sample.level));
        crossing
    }
}

/// Cycle boundaries at the sample where `L` turns negative
#[derive(Debug, Clone)]
pub struct FilteredEstimator {
    detector: ZeroCrossingDetector,
    last_anchor: Option<i64>,
}

impl FilteredEstimator {
    pub fn new(warm_up: WarmUp) -> Self {
        Self {
            detector: ZeroCrossingDetector::new(warm_up),
            last_anchor: None,
        }
    }
}

impl PeriodEstimator for FilteredEstimator {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Filtered
    }

    fn observe(&mut self, sample: &Sample) -> Option<PeriodRecord> {
        let crossing = self.detector.observe(sample)?;
        let t = crossing.t;
        let record = self
            .last_anchor
            .map(|start| PeriodRecord::new(t, start, crossing.level));
        self.last_anchor = Some(t);
        record
    }
}

/// Cycle boundaries at the linearly interpolated zero of `L`
#[derive(Debug, Clone)]
pub struct InterpolatedEstimator {
    detector: ZeroCrossingDetector,
    last_anchor: Option<SubSampleTime>,
}

impl InterpolatedEstimator {
    pub fn new(warm_up: WarmUp) -> Self {
        Self {
            detector: ZeroCrossingDetector::new(warm_up),
            last_anchor: None,
        }
    }
}

impl PeriodEstimator for InterpolatedEstimator {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Interpolated
    }

    fn observe(&mut self, sample: &Sample) -> Option<PeriodRecord> {
        let crossing = self.detector.observe(sample)?;
        let t_zero = crossing.interpolate();
        let record = self
            .last_anchor
            .map(|start| PeriodRecord::interpolated(t_zero, start));
        self.last_anchor = Some(t_zero);
        record
    }
}

/// All four estimator states of one pixel
#[derive(Debug, Clone)]
pub struct PeriodExtractor {
    baseline_on: BaselineEstimator,
    baseline_off: BaselineEstimator,
    filtered: FilteredEstimator,
    interpolated: InterpolatedEstimator,
    series: PeriodSeries,
}

impl PeriodExtractor {
    pub fn new(warm_up: WarmUp) -> Self {
        Self {
            baseline_on: BaselineEstimator::new(true, warm_up),
            baseline_off: BaselineEstimator::new(false, warm_up),
            filtered: FilteredEstimator::new(warm_up),
            interpolated: InterpolatedEstimator::new(warm_up),
            series: PeriodSeries::default(),
        }
    }

    pub fn for_cutoff_period(cutoff_period: f64) -> Self {
        Self::new(WarmUp::for_cutoff_period(cutoff_period))
    }

    pub fn observe(&mut self, sample: &Sample) {
        let estimators: [&mut dyn PeriodEstimator; 4] = [
            &mut self.baseline_on,
            &mut self.baseline_off,
            &mut self.filtered,
            &mut self.interpolated,
        ];
        for estimator in estimators {
            if let Some(record) = estimator.observe(sample) {
                self.series.push(estimator.kind(), record);
            }
        }
    }

    pub fn series(&self) -> &PeriodSeries {
        &self.series
    }

    pub fn into_series(self) -> PeriodSeries {
        self.series
    }
}

/// The record series produced for one pixel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodSeries {
    pub baseline_on: Vec<PeriodRecord>,
    pub baseline_off: Vec<PeriodRecord>,
    pub filtered: Vec<PeriodRecord>,
    pub interpolated: Vec<PeriodRecord>,
}

impl PeriodSeries {
    pub fn get(&self, kind: EstimatorKind) -> &[PeriodRecord] {
        match kind {
            EstimatorKind::BaselineOn => &self.baseline_on,
            EstimatorKind::BaselineOff => &self.baseline_off,
            EstimatorKind::Filtered => &self.filtered,
            EstimatorKind::Interpolated => &self.interpolated,
        }
    }

    fn push(&mut self, kind: EstimatorKind, record: PeriodRecord) {
        match kind {
            EstimatorKind::BaselineOn => self.baseline_on.push(record),
            EstimatorKind::BaselineOff => self.baseline_off.push(record),
            EstimatorKind::Filtered => self.filtered.push(record),
            EstimatorKind::Interpolated => self.interpolated.push(record),
        }
    }
}

/// Run all estimators over accepted events and their reconstructed levels.
///
/// `events` and `levels` must have equal length.
pub fn extract_periods(events: &[Event], levels: &[f64], cutoff_period: f64) -> PeriodSeries {
    debug_assert_eq!(events.len(), levels.len());
    let mut extractor = PeriodExtractor::for_cutoff_period(cutoff_period);
    for (index, (event, &level)) in events.iter().zip(levels).enumerate() {
        extractor.observe(&Sample {
            index,
            timestamp: event.timestamp,
            polarity: event.polarity,
            level,
        });
    }
    extractor.into_series()
}

// =============================================================================
// ESTIMATOR REGISTRY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    BaselineOn,
    BaselineOff,
    Filtered,
    Interpolated,
}

impl EstimatorKind {
    pub const ALL: [EstimatorKind; 4] = [
        EstimatorKind::BaselineOn,
        EstimatorKind::BaselineOff,
        EstimatorKind::Filtered,
        EstimatorKind::Interpolated,
    ];

    pub fn metadata(&self) -> &'static EstimatorMetadata {
        match self {
            Self::BaselineOn => &BASELINE_ON,
            Self::BaselineOff => &BASELINE_OFF,
            Self::Filtered => &FILTERED,
            Self::Interpolated => &INTERPOLATED,
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        self.metadata().abbreviation
    }

    pub fn from_abbrev(abbrev: &str) -> Option<Self> {
        ESTIMATOR_REGISTRY
            .iter()
            .find(|m| m.abbreviation.eq_ignore_ascii_case(abbrev))
            .map(|m| m.kind)
    }
}

/// Static description of an estimator
#[derive(Debug, Clone, Serialize)]
pub struct EstimatorMetadata {
    pub kind: EstimatorKind,
    pub abbreviation: &'static str,
    pub name: &'static str,
    /// Whether cycle boundaries can fall between samples
    pub sub_sample: bool,
    pub documentation: &'static str,
}

pub const BASELINE_ON: EstimatorMetadata = EstimatorMetadata {
    kind: EstimatorKind::BaselineOn,
    abbreviation: "ON",
    name: "Baseline ON to ON",
    sub_sample: false,
    documentation: "Time between the first events of consecutive ON runs in the noise-filtered polarity stream.",
};

pub const BASELINE_OFF: EstimatorMetadata = EstimatorMetadata {
    kind: EstimatorKind::BaselineOff,
    abbreviation: "OFF",
    name: "Baseline OFF to OFF",
    sub_sample: false,
    documentation: "Time between the first events of consecutive OFF runs in the noise-filtered polarity stream.",
};

pub const FILTERED: EstimatorMetadata = EstimatorMetadata {
    kind: EstimatorKind::Filtered,
    abbreviation: "FLT",
    name: "Filtered zero crossing",
    sub_sample: false,
    documentation: "Time between samples where the reconstructed signal turns negative. Resolution is bounded by event density.",
};

pub const INTERPOLATED: EstimatorMetadata = EstimatorMetadata {
    kind: EstimatorKind::Interpolated,
    abbreviation: "INT",
    name: "Interpolated zero crossing",
    sub_sample: true,
    documentation: "Same crossings as FLT, located by linear interpolation between the bracketing samples.",
};

/// All estimators in output order
pub const ESTIMATOR_REGISTRY: &[EstimatorMetadata] =
    &[BASELINE_ON, BASELINE_OFF, FILTERED, INTERPOLATED];
