//! # Event-Time Sources
//!
//! The engine treats the astronomical solver as a black box behind the
//! [`EventTimeSource`] trait: given a calculation config and a calendar
//! date, a source returns the six solar instants for that date. Two
//! implementations ship with the crate:
//!
//! - [`crate::aladhan::AlAdhanSource`]: HTTP against the AlAdhan timings
//!   API with a JSON file cache
//! - [`FixedTableSource`]: a deterministic in-memory table for tests and
//!   offline consumers
//!
//! A source never fabricates a value. An event the solver cannot produce
//! (polar latitudes, unparsable API field) is `None` in [`RawDayTimes`] and
//! stays absent all the way through the pipeline.

use crate::config::CalculationConfig;
use crate::EventId;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use thiserror::Error;

/// Errors that can occur while obtaining or caching event times.
///
/// Every failure mode in the source pipeline funnels through this enum so
/// the buffer can propagate one error type. None of these are fatal to the
/// engine: a failed load leaves the day buffer unchanged.
#[derive(Error, Debug)]
pub enum SourceError {
    /// HTTP request failed (network, server, or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered but not with usable timings
    #[error("API error: {0}")]
    Api(String),

    /// A response field could not be interpreted
    #[error("parse failed: {0}")]
    Parse(String),

    /// Cache file operations failed (permissions, disk space)
    #[error("cache IO: {0}")]
    Cache(#[from] io::Error),

    /// Cache (de)serialization failed
    #[error("cache JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The async runtime backing the HTTP client could not start
    #[error("runtime: {0}")]
    Runtime(io::Error),

    /// The source has no entry for the requested date
    #[error("no event times available for {0}")]
    Missing(NaiveDate),
}

/// The six solar instants for one calendar date, straight from a solver.
///
/// Each field is `None` when the solver produced no value for that event.
/// Instants carry the location's UTC offset so wall-clock formatting never
/// needs a time-zone database. The two night markers are *not* here: the
/// buffer derives them from Maghrib and the next day's Fajr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDayTimes {
    pub fajr: Option<DateTime<FixedOffset>>,
    pub sunrise: Option<DateTime<FixedOffset>>,
    pub dhuhr: Option<DateTime<FixedOffset>>,
    pub asr: Option<DateTime<FixedOffset>>,
    pub maghrib: Option<DateTime<FixedOffset>>,
    pub isha: Option<DateTime<FixedOffset>>,
}

impl RawDayTimes {
    /// Look up one solar event. The night markers always return `None`
    /// here; they exist only after derivation in the buffer.
    pub fn get(&self, event: EventId) -> Option<DateTime<FixedOffset>> {
        match event {
            EventId::Fajr => self.fajr,
            EventId::Sunrise => self.sunrise,
            EventId::Dhuhr => self.dhuhr,
            EventId::Asr => self.asr,
            EventId::Maghrib => self.maghrib,
            EventId::Isha => self.isha,
            EventId::MiddleOfNight | EventId::LastThirdOfNight => None,
        }
    }

    /// The solar events present for this day, in canonical order.
    pub fn present(&self) -> impl Iterator<Item = (EventId, DateTime<FixedOffset>)> + '_ {
        EventId::SOLAR
            .into_iter()
            .filter_map(|e| self.get(e).map(|v| (e, v)))
    }
}

/// Black-box solver interface.
///
/// Implementations must be idempotent: calling `compute_day` twice with
/// identical inputs yields identical output, with no hidden time-of-call
/// dependency. When an implementation must materialize an instant from the
/// bare date (e.g. to query a remote API), it anchors at local noon so a
/// DST transition can never shift the date under it.
pub trait EventTimeSource {
    fn compute_day(
        &self,
        config: &CalculationConfig,
        date: NaiveDate,
    ) -> Result<RawDayTimes, SourceError>;
}

/// Deterministic in-memory source backed by a date-keyed table.
///
/// Used by the test suite and by offline consumers that precomputed their
/// timetable elsewhere. Dates without an entry are an error, never a
/// fabricated day.
#[derive(Debug, Default, Clone)]
pub struct FixedTableSource {
    days: BTreeMap<NaiveDate, RawDayTimes>,
}

impl FixedTableSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) the entry for `date`.
    pub fn insert(&mut self, date: NaiveDate, times: RawDayTimes) -> &mut Self {
        self.days.insert(date, times);
        self
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl EventTimeSource for FixedTableSource {
    fn compute_day(
        &self,
        _config: &CalculationConfig,
        date: NaiveDate,
    ) -> Result<RawDayTimes, SourceError> {
        self.days
            .get(&date)
            .copied()
            .ok_or(SourceError::Missing(date))
    }
}
