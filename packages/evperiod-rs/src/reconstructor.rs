//! Two-stage IIR reconstruction of detrended brightness from ±1 impulses.
//!
//! ```text
//! y1[n] = x[n] + α·y1[n-1]              detrend
//! y2[n] = (1-β)·y1[n] + β·y2[n-1]       smoothing
//! L[n]  = y2[n]
//! ```

use serde::{Deserialize, Serialize};

use crate::cutoff::PoleParameters;
use crate::types::Event;

/// Outputs of the two stages after the most recent event
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconstructorState {
    pub y1: f64,
    pub y2: f64,
}

/// Stateful per-pixel reconstructor, O(1) time and memory per event
#[derive(Debug, Clone)]
pub struct CascadedReconstructor {
    poles: PoleParameters,
    state: ReconstructorState,
}

impl CascadedReconstructor {
    pub fn new(poles: PoleParameters) -> Self {
        Self::with_state(poles, ReconstructorState::default())
    }

    pub fn with_state(poles: PoleParameters, state: ReconstructorState) -> Self {
        Self { poles, state }
    }

    /// Feed one impulse (`+1.0` ON, `-1.0` OFF) and return the new `L`
    pub fn update(&mut self, x: f64) -> f64 {
        let PoleParameters { alpha, beta } = self.poles;
        let y1 = x + alpha * self.state.y1;
        let y2 = (1.0 - beta) * y1 + beta * self.state.y2;
        self.state = ReconstructorState { y1, y2 };
        y2
    }

    pub fn update_polarity(&mut self, polarity: bool) -> f64 {
        self.update(if polarity { 1.0 } else { -1.0 })
    }

    /// Current `L`, i.e. the smoothing stage output
    pub fn level(&self) -> f64 {
        self.state.y2
    }

    pub fn state(&self) -> ReconstructorState {
        self.state
    }

    pub fn poles(&self) -> PoleParameters {
        self.poles
    }

    /// Explicit reinitialization to `(0, 0)`
    pub fn reset(&mut self) {
        self.state = ReconstructorState::default();
    }
}

/// Reconstruct `L` for a whole sequence starting from `initial`
pub fn reconstruct(
    events: &[Event],
    poles: PoleParameters,
    initial: ReconstructorState,
) -> Vec<f64> {
    let mut reconstructor = CascadedReconstructor::with_state(poles, initial);
    events
        .iter()
        .map(|e| reconstructor.update(e.impulse()))
        .collect()
}

/// Plain running sum of impulses, OFF events weighted by `off_weight`.
///
/// `Some(1.0)` gives the naive integral, which drifts whenever ON and OFF
/// rates differ. `None` weights OFF events by the measured `#ON / #OFF`
/// ratio so the sum returns to its start level over the whole sequence.
pub fn integrate_polarities(events: &[Event], off_weight: Option<f64>) -> Vec<f64> {
    let weight = off_weight.unwrap_or_else(|| on_off_ratio(events));
    let mut level = 0.0;
    events
        .iter()
        .map(|e| {
            level += if e.polarity { 1.0 } else { -weight };
            level
        })
        .collect()
}

/// `#ON / max(#OFF, 1)`
pub fn on_off_ratio(events: &[Event]) -> f64 {
    let on = events.iter().filter(|e| e.polarity).count();
    let off = (events.len() - on).max(1);
    on as f64 / off as f64
}
