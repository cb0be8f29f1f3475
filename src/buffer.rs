//! # Day Buffer
//!
//! Owns the sliding window of consecutive Islamic days. The window is a
//! deque of [`DayData`] ordered by date, bounded by a fixed capacity:
//! growing it past one end trims the opposite end, so memory stays constant
//! no matter how far the user pages.
//!
//! The anchor decision at startup is where the Fajr-to-Fajr day model meets
//! the civil clock: between midnight and Fajr the current *Islamic* day is
//! still yesterday's civil date, so the buffer probes today's Fajr before
//! choosing which date to load first.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use tracing::{debug, warn};

use crate::config::CalculationConfig;
use crate::resolver::{self, ActivePeriod};
use crate::source::{EventTimeSource, SourceError};
use crate::timeline;
use crate::{DayData, EventId, Timing};

/// Default window bound.
pub const MAX_BUFFERED_DAYS: usize = 3;

/// Lifecycle of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// No window has been established yet.
    Uninitialized,
    /// A window is loaded and queries are meaningful.
    Ready,
    /// The configuration cannot produce times (bad coordinates); the
    /// window is intentionally empty and queries return nothing.
    Invalid,
}

/// Sliding window of consecutive Islamic days over an event-time source.
pub struct DayBufferManager<S> {
    source: S,
    config: CalculationConfig,
    days: VecDeque<DayData>,
    state: BufferState,
    capacity: usize,
    next_index: u64,
}

impl<S: EventTimeSource> DayBufferManager<S> {
    pub fn new(source: S, config: CalculationConfig) -> Self {
        Self::with_capacity(source, config, MAX_BUFFERED_DAYS)
    }

    /// A window bound below one cannot hold its own anchor day.
    pub fn with_capacity(source: S, config: CalculationConfig, capacity: usize) -> Self {
        DayBufferManager {
            source,
            config,
            days: VecDeque::with_capacity(capacity.max(1)),
            state: BufferState::Uninitialized,
            capacity: capacity.max(1),
            next_index: 0,
        }
    }

    pub fn state(&self) -> BufferState {
        self.state
    }

    pub fn config(&self) -> &CalculationConfig {
        &self.config
    }

    /// Buffered days, oldest first. Dates are consecutive.
    pub fn days(&self) -> &VecDeque<DayData> {
        &self.days
    }

    /// Establish a fresh one-day window anchored on the Islamic day
    /// containing `now`.
    ///
    /// Before today's Fajr the current Islamic day is still yesterday's
    /// civil date, so the buffer probes today's times first and anchors a
    /// day earlier when `now` precedes that Fajr. A day with no Fajr at all
    /// anchors on today's civil date.
    ///
    /// Any previous window is discarded up front; a failed load therefore
    /// leaves the buffer empty and uninitialized, never half-stale.
    ///
    /// Invalid coordinates are a configuration condition, not an error: the
    /// buffer empties, flips to [`BufferState::Invalid`], and returns `Ok`
    /// without touching the source.
    pub fn initialize(&mut self, now: DateTime<FixedOffset>) -> Result<(), SourceError> {
        self.days.clear();
        self.state = BufferState::Uninitialized;
        self.next_index = 0;

        if !self.config.has_valid_coordinates() {
            warn!(
                latitude = self.config.latitude,
                longitude = self.config.longitude,
                "coordinates out of range, buffer disabled"
            );
            self.state = BufferState::Invalid;
            return Ok(());
        }

        let today = now.date_naive();
        let probe = self.source.compute_day(&self.config, today)?;
        let anchor = match probe.fajr {
            Some(fajr) if now < fajr => today.pred_opt().unwrap_or(today),
            _ => today,
        };

        let day = self.load_day(anchor)?;
        self.days.push_back(day);
        self.state = BufferState::Ready;
        debug!(date = %anchor, "buffer initialized");
        Ok(())
    }

    /// Extend the window one day forward, trimming the oldest day when the
    /// bound is exceeded. No-op on an empty buffer.
    pub fn add_next_day(&mut self) -> Result<(), SourceError> {
        let next_date = match self.days.back().and_then(|d| d.date.succ_opt()) {
            Some(date) => date,
            None => return Ok(()),
        };
        let day = self.load_day(next_date)?;
        self.days.push_back(day);
        while self.days.len() > self.capacity {
            self.days.pop_front();
        }
        Ok(())
    }

    /// Extend the window one day backward, trimming the newest day when the
    /// bound is exceeded. No-op on an empty buffer.
    pub fn add_previous_day(&mut self) -> Result<(), SourceError> {
        let previous_date = match self.days.front().and_then(|d| d.date.pred_opt()) {
            Some(date) => date,
            None => return Ok(()),
        };
        let day = self.load_day(previous_date)?;
        self.days.push_front(day);
        while self.days.len() > self.capacity {
            self.days.pop_back();
        }
        Ok(())
    }

    /// Swap in a new calculation configuration.
    ///
    /// An identical configuration keeps the current window untouched.
    /// Anything else invalidates every buffered day and rebuilds from
    /// scratch around `now`.
    pub fn set_config(
        &mut self,
        config: CalculationConfig,
        now: DateTime<FixedOffset>,
    ) -> Result<(), SourceError> {
        if self.config == config {
            debug!("configuration unchanged, keeping buffered days");
            return Ok(());
        }
        self.config = config;
        self.initialize(now)
    }

    /// Drop every buffered day and return to the uninitialized state.
    pub fn teardown(&mut self) {
        self.days.clear();
        self.state = BufferState::Uninitialized;
        self.next_index = 0;
    }

    /// The buffered Islamic day whose Fajr-to-Fajr span contains `now`.
    pub fn day_for(&self, now: DateTime<FixedOffset>) -> Option<&DayData> {
        self.days.iter().find(|day| day.contains(now))
    }

    /// Name the event currently in force.
    ///
    /// Resolution happens against the civil date's event list; when `now`
    /// lands in the pre-Fajr hours of that list, the previous buffered
    /// day's final event is still the active one. Returns `None` when the
    /// civil date is not buffered or no event has started yet.
    pub fn active_event(&self, now: DateTime<FixedOffset>) -> Option<EventId> {
        let position = self.days.iter().position(|day| day.date == now.date_naive())?;
        match resolver::resolve(&self.days[position].timings, now)? {
            ActivePeriod::Event(event) => Some(event),
            ActivePeriod::PreFajr => {
                let previous = position.checked_sub(1)?;
                resolver::resolve(&self.days[previous].timings, now)?.event()
            }
        }
    }

    /// Load one day from the source and derive everything the window
    /// stores for it: canonical-order timings, the night markers, and the
    /// normalized timeline.
    fn load_day(&mut self, date: NaiveDate) -> Result<DayData, SourceError> {
        let raw = self.source.compute_day(&self.config, date)?;

        // Next day's Fajr bounds this day; a missing or failing next day
        // falls back to the fixed 24 h span downstream.
        let next_fajr = date
            .succ_opt()
            .and_then(|next| self.source.compute_day(&self.config, next).ok())
            .and_then(|next_raw| next_raw.fajr);

        let mut timings: Vec<Timing> = EventId::SOLAR
            .iter()
            .filter_map(|&event| raw.get(event).map(|value| Timing::new(event, value)))
            .collect();

        // Night markers split Maghrib-to-next-Fajr, never midnight
        if let (Some(maghrib), Some(next_fajr)) = (raw.maghrib, next_fajr) {
            let night = next_fajr - maghrib;
            if night > Duration::zero() {
                timings.push(Timing::new(EventId::MiddleOfNight, maghrib + night / 2));
                timings.push(Timing::new(EventId::LastThirdOfNight, maghrib + (night * 2) / 3));
            } else {
                warn!(%date, "Maghrib at or after the next Fajr, skipping night markers");
            }
        }

        let timeline = timeline::normalize(&timings, next_fajr).map(|n| n.timeline);
        if timeline.is_none() {
            warn!(%date, "no Fajr anchor, day has no timeline");
        }

        let day_index = self.next_index;
        self.next_index += 1;

        Ok(DayData {
            date,
            day_index,
            timings,
            next_fajr,
            timeline,
        })
    }
}
