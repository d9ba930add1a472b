use rayon::prelude::*;

use crate::cutoff::PoleParameters;
use crate::error::{EvPeriodError, Result};
use crate::noise_filter::{FilterState, NoiseFilter};
use crate::period::{EstimatorKind, PeriodExtractor, Sample, WarmUp};
use crate::reconstructor::CascadedReconstructor;
use crate::stats::{PeriodHistogram, PeriodStats};
use crate::types::*;

/// Streaming pipeline for a single pixel.
///
/// Each pushed event goes through the noise filter, then the reconstructor,
/// then every period estimator. Memory is O(1) apart from the emitted
/// records.
#[derive(Debug, Clone)]
pub struct PixelAnalyzer {
    pixel: u32,
    filter: NoiseFilter,
    filter_state: FilterState,
    reconstructor: CascadedReconstructor,
    extractor: PeriodExtractor,
    total_events: usize,
    accepted_events: usize,
    ground_truth_hz: Option<f64>,
    histogram_bins: Option<usize>,
}

impl PixelAnalyzer {
    pub fn new(pixel: u32, config: &AnalysisConfig, poles: PoleParameters) -> Result<Self> {
        Ok(Self {
            pixel,
            filter: NoiseFilter::from_config(&config.noise)?,
            filter_state: FilterState::default(),
            reconstructor: CascadedReconstructor::new(poles),
            extractor: PeriodExtractor::new(WarmUp::new(config.warm_up_samples())),
            total_events: 0,
            accepted_events: 0,
            ground_truth_hz: config.ground_truth_hz,
            histogram_bins: config.histogram_bins,
        })
    }

    /// Feed the next event of this pixel. Returns the reconstructed level
    /// when the event passes the noise filter.
    pub fn push(&mut self, event: Event) -> Option<f64> {
        self.total_events += 1;
        if !self.filter.accept(&mut self.filter_state, &event) {
            return None;
        }
        let level = self.reconstructor.update_polarity(event.polarity);
        self.extractor.observe(&Sample {
            index: self.accepted_events,
            timestamp: event.timestamp,
            polarity: event.polarity,
            level,
        });
        self.accepted_events += 1;
        Some(level)
    }

    pub fn finish(self) -> PixelResult {
        let series = self.extractor.into_series();
        let summaries = EstimatorKind::ALL
            .iter()
            .map(|&kind| {
                let records = series.get(kind);
                let stats = PeriodStats::from_records(records);
                EstimatorSummary {
                    estimator: kind,
                    error: stats
                        .zip(self.ground_truth_hz)
                        .map(|(s, hz)| s.error_against(hz)),
                    histogram: stats
                        .zip(self.histogram_bins)
                        .and_then(|(s, bins)| PeriodHistogram::around(records, bins, &s)),
                    stats,
                }
            })
            .collect();

        PixelResult {
            pixel: self.pixel,
            total_events: self.total_events,
            accepted_events: self.accepted_events,
            baseline_on: series.baseline_on,
            baseline_off: series.baseline_off,
            filtered: series.filtered,
            interpolated: series.interpolated,
            summaries,
        }
    }
}

/// Run the full pipeline over one pixel's ordered events
pub fn analyze_pixel(
    pixel: &PixelEvents,
    config: &AnalysisConfig,
    poles: PoleParameters,
) -> Result<PixelResult> {
    validate_monotonic(&pixel.events)?;
    let mut analyzer = PixelAnalyzer::new(pixel.pixel, config, poles)?;
    for &event in &pixel.events {
        analyzer.push(event);
    }
    Ok(analyzer.finish())
}

/// Pixels ordered by event count, most active first
pub fn active_pixels(pixels: &[PixelEvents]) -> Vec<u32> {
    let mut ranked: Vec<(u32, usize)> = pixels.iter().map(|p| (p.pixel, p.events.len())).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().map(|(pixel, _)| pixel).collect()
}

/// Period analysis runner
///
/// Pixels are independent, so they are processed in parallel on a rayon
/// pool. Results come back in input order.
pub struct PeriodRunner {
    config: AnalysisConfig,
    poles: PoleParameters,
    pool: Option<rayon::ThreadPool>,
}

impl PeriodRunner {
    /// Validate `config` and solve the filter poles
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let poles = PoleParameters::for_cutoff_period(config.cutoff_period)?;
        log::info!(
            "Cutoff period T={} events: alpha={:.6}, beta={:.6}, warm-up {} samples",
            config.cutoff_period,
            poles.alpha,
            poles.beta,
            config.warm_up_samples()
        );
        log::info!(
            "Noise filter: pass_dt={} ns, dead_dt={} ns",
            config.noise.pass_dt,
            config.noise.resolved_dead_dt()
        );
        Ok(Self {
            config,
            poles,
            pool: None,
        })
    }

    /// Use a dedicated pool of `threads` workers instead of the global one
    pub fn with_threads(mut self, threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("evperiod-pixel-{}", i))
            .build()
            .map_err(|e| {
                EvPeriodError::InvalidParameter(format!("Failed to create thread pool: {}", e))
            })?;
        self.pool = Some(pool);
        Ok(self)
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn poles(&self) -> PoleParameters {
        self.poles
    }

    /// Analyze every pixel; fails on the first pixel with invalid input
    pub fn analyze(&self, pixels: &[PixelEvents]) -> Result<AnalysisResult> {
        let start_time = std::time::Instant::now();
        let results = match &self.pool {
            Some(pool) => pool.install(|| self.analyze_all(pixels)),
            None => self.analyze_all(pixels),
        }?;

        let records: usize = results
            .iter()
            .flat_map(|p| EstimatorKind::ALL.iter().map(move |&k| p.records(k).len()))
            .sum();
        log::info!(
            "Analyzed {} pixels ({} period records) in {:.2}s",
            results.len(),
            records,
            start_time.elapsed().as_secs_f64()
        );

        Ok(AnalysisResult::new(self.config.clone(), self.poles, results))
    }

    fn analyze_all(&self, pixels: &[PixelEvents]) -> Result<Vec<PixelResult>> {
        pixels
            .par_iter()
            .map(|p| {
                let result = analyze_pixel(p, &self.config, self.poles)?;
                if result.rejected_events() > 0 {
                    log::debug!(
                        "Pixel {}: noise filter dropped {} of {} events",
                        p.pixel,
                        result.rejected_events(),
                        result.total_events
                    );
                }
                Ok(result)
            })
            .collect()
    }
}
