//! Rejection of implausible rapid polarity flips.
//!
//! Two rules, both judged against previously *accepted* events only:
//!
//! - **chatter**: once a polarity transition has been accepted, every event
//!   within `dead_dt` of it is dropped, whatever its polarity;
//! - **bounce**: an event that flips polarity back within `pass_dt` of the
//!   most recent accepted event of the opposite polarity is dropped.
//!
//! Dropped events leave the filter state untouched, so filtering an
//! already filtered sequence is a no-op. Both comparisons are strict, which
//! makes `pass_dt = dead_dt = 0` the identity.

use crate::error::Result;
use crate::types::{Event, NoiseFilterConfig};

/// Per-pixel filter state, discarded after each pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterState {
    last_on: Option<i64>,
    last_off: Option<i64>,
    last_polarity: Option<bool>,
    last_transition: Option<i64>,
    #[cfg(debug_assertions)]
    last_seen: Option<i64>,
}

impl FilterState {
    /// Timestamp of the last accepted event with the given polarity
    pub fn last_accepted(&self, polarity: bool) -> Option<i64> {
        if polarity {
            self.last_on
        } else {
            self.last_off
        }
    }

    /// Timestamp of the last accepted polarity transition
    pub fn last_transition(&self) -> Option<i64> {
        self.last_transition
    }

    fn accept(&mut self, event: &Event) {
        if let Some(p) = self.last_polarity {
            if p != event.polarity {
                self.last_transition = Some(event.timestamp);
            }
        }
        if event.polarity {
            self.last_on = Some(event.timestamp);
        } else {
            self.last_off = Some(event.timestamp);
        }
        self.last_polarity = Some(event.polarity);
    }
}

/// Noise filter parameters (nanoseconds, both >= 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoiseFilter {
    pass_dt: i64,
    dead_dt: i64,
}

impl NoiseFilter {
    pub fn new(pass_dt: i64, dead_dt: i64) -> Result<Self> {
        Self::from_config(&NoiseFilterConfig::new(pass_dt, Some(dead_dt)))
    }

    pub fn from_config(config: &NoiseFilterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pass_dt: config.pass_dt,
            dead_dt: config.resolved_dead_dt(),
        })
    }

    /// Filter that passes every event
    pub fn passthrough() -> Self {
        Self {
            pass_dt: 0,
            dead_dt: 0,
        }
    }

    pub fn pass_dt(&self) -> i64 {
        self.pass_dt
    }

    pub fn dead_dt(&self) -> i64 {
        self.dead_dt
    }

    pub fn is_passthrough(&self) -> bool {
        self.pass_dt == 0 && self.dead_dt == 0
    }

    /// Decide on one event and update `state` if it is accepted.
    pub fn accept(&self, state: &mut FilterState, event: &Event) -> bool {
        #[cfg(debug_assertions)]
        {
            if let Some(prev) = state.last_seen {
                assert!(
                    event.timestamp >= prev,
                    "event timestamps must be non-decreasing: {} after {}",
                    event.timestamp,
                    prev
                );
            }
            state.last_seen = Some(event.timestamp);
        }

        if let Some(t_flip) = state.last_transition {
            if event.timestamp.saturating_sub(t_flip) < self.dead_dt {
                return false;
            }
        }

        let flips = state.last_polarity.is_some_and(|p| p != event.polarity);
        if flips {
            if let Some(t_opposite) = state.last_accepted(!event.polarity) {
                if event.timestamp.saturating_sub(t_opposite) < self.pass_dt {
                    return false;
                }
            }
        }

        state.accept(event);
        true
    }

    /// Lazily filter an event sequence. Calling this again on a fresh
    /// iterator restarts with a clean state.
    pub fn apply<I>(&self, events: I) -> NoiseFiltered<I::IntoIter>
    where
        I: IntoIterator<Item = Event>,
    {
        NoiseFiltered {
            filter: *self,
            state: FilterState::default(),
            inner: events.into_iter(),
        }
    }

    /// Filter a materialized sequence
    pub fn filter_events(&self, events: &[Event]) -> Vec<Event> {
        self.apply(events.iter().copied()).collect()
    }
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self::passthrough()
    }
}

/// Iterator adapter returned by [`NoiseFilter::apply`]
#[derive(Debug, Clone)]
pub struct NoiseFiltered<I> {
    filter: NoiseFilter,
    state: FilterState,
    inner: I,
}

impl<I> Iterator for NoiseFiltered<I>
where
    I: Iterator<Item = Event>,
{
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        for event in self.inner.by_ref() {
            if self.filter.accept(&mut self.state, &event) {
                return Some(event);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}
