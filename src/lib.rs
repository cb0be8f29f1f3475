//! # Salat Tracker Core Library
//!
//! This library computes a rolling window of daily prayer-event times for a
//! geographic location and exposes them as a continuous, normalized timeline
//! that downstream consumers (a scroll-driven visualization, tabular views,
//! charts) sample to derive positions, colors, and active-state labels.
//!
//! ## Design Philosophy
//!
//! ### The Islamic day boundary
//! A display day here is *not* the Gregorian midnight-to-midnight day: it runs
//! from one Fajr to the next. Everything downstream hangs off that choice:
//! - [`buffer::DayBufferManager`] decides at startup whether "now" still
//!   belongs to yesterday's Islamic day (pre-Fajr hours) or to today's
//! - [`timeline::normalize`] expresses every event as the fraction of the
//!   Fajr-to-Fajr span that has elapsed, so `0.0` is always this day's Fajr
//!   and `1.0` the next day's
//! - the night markers (middle of the night, last third) are derived from
//!   Maghrib and the *next* day's Fajr, never from midnight
//!
//! ### Absence propagates
//! At extreme latitudes the solver may have no value for an event. A missing
//! event is simply not present in [`DayData::timings`]; it produces no
//! timeline fraction, and the interpolators that need it collapse to their
//! resting values. Nothing in this crate fabricates a time.
//!
//! ### Data Flow
//! 1. **Source**: [`source::EventTimeSource`] yields the six solar instants
//!    for a calendar date (remote API with a JSON cache, or a fixed table)
//! 2. **Buffer**: [`buffer::DayBufferManager`] assembles bounded, contiguous
//!    [`DayData`] windows and derives the night-fraction events
//! 3. **Consumers**: [`resolver`] names the active period for an instant or a
//!    scroll progress; [`interpolate`] maps progress to visual attributes;
//!    [`scheduler`] arranges the single outstanding recomputation
//!
//! ## Core Types
//!
//! The library exports three primary types shared by every module:
//! - [`EventId`]: the closed set of daily events in canonical order
//! - [`Timing`]: one named event with its absolute instant
//! - [`DayData`]: one Islamic day's timings plus its normalized timeline

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

// Module declarations
pub mod aladhan;
pub mod buffer;
pub mod config;
pub mod interpolate;
pub mod moon;
pub mod renderer;
pub mod resolver;
pub mod scheduler;
pub mod source;
pub mod timeline;

pub use timeline::Timeline;

/// The closed set of daily events, in canonical chronological order.
///
/// The first six are the solar events produced by an event-time source; the
/// two night markers are derived by the buffer from Maghrib and the next
/// day's Fajr. Enumeration order is the expected time order within one
/// Islamic day, which is why the derive list includes `PartialOrd`/`Ord`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventId {
    Fajr,
    Sunrise,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
    MiddleOfNight,
    LastThirdOfNight,
}

impl EventId {
    /// All events in canonical order.
    pub const ALL: [EventId; 8] = [
        EventId::Fajr,
        EventId::Sunrise,
        EventId::Dhuhr,
        EventId::Asr,
        EventId::Maghrib,
        EventId::Isha,
        EventId::MiddleOfNight,
        EventId::LastThirdOfNight,
    ];

    /// The six events an [`source::EventTimeSource`] is expected to produce.
    pub const SOLAR: [EventId; 6] = [
        EventId::Fajr,
        EventId::Sunrise,
        EventId::Dhuhr,
        EventId::Asr,
        EventId::Maghrib,
        EventId::Isha,
    ];

    /// Human-readable label used by tabular and terminal consumers.
    pub fn label(self) -> &'static str {
        match self {
            EventId::Fajr => "Fajr",
            EventId::Sunrise => "Sunrise",
            EventId::Dhuhr => "Dhuhr",
            EventId::Asr => "Asr",
            EventId::Maghrib => "Maghrib",
            EventId::Isha => "Isha",
            EventId::MiddleOfNight => "Middle of the night",
            EventId::LastThirdOfNight => "Last third of the night",
        }
    }

    /// True for the five obligatory prayers.
    pub fn is_obligatory(self) -> bool {
        matches!(
            self,
            EventId::Fajr | EventId::Dhuhr | EventId::Asr | EventId::Maghrib | EventId::Isha
        )
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single named event within one Islamic day.
///
/// `value` is the absolute instant carrying the location's UTC offset;
/// `time` is the same instant pre-formatted for display so renderers never
/// re-derive wall-clock strings.
#[derive(Clone, Debug, Serialize)]
pub struct Timing {
    pub event: EventId,
    pub label: &'static str,
    /// Wall-clock rendering of `value`, e.g. `"05:28"`.
    pub time: String,
    pub value: DateTime<FixedOffset>,
    pub is_obligatory: bool,
}

impl Timing {
    /// Build a timing for `event` at `value`, deriving the display fields.
    pub fn new(event: EventId, value: DateTime<FixedOffset>) -> Self {
        Timing {
            event,
            label: event.label(),
            time: value.format("%H:%M").to_string(),
            value,
            is_obligatory: event.is_obligatory(),
        }
    }
}

/// One Islamic day's computed events.
///
/// `day_index` is assigned from a monotonic counter when the day is loaded
/// and never reassigned, even when the buffer trims the entry's neighbors;
/// it exists solely to give renderers a stable ordering key. `timings` holds
/// only the events the source produced (absent events are omitted, not
/// defaulted). `timeline` is `None` only when the day has no Fajr anchor.
#[derive(Clone, Debug, Serialize)]
pub struct DayData {
    pub date: NaiveDate,
    pub day_index: u64,
    pub timings: Vec<Timing>,
    pub next_fajr: Option<DateTime<FixedOffset>>,
    pub timeline: Option<Timeline>,
}

impl DayData {
    /// Look up one event's timing, if the source produced it.
    pub fn timing(&self, event: EventId) -> Option<&Timing> {
        self.timings.iter().find(|t| t.event == event)
    }

    /// The instant this Islamic day starts, i.e. its Fajr.
    pub fn day_start(&self) -> Option<DateTime<FixedOffset>> {
        self.timing(EventId::Fajr).map(|t| t.value)
    }

    /// The instant this Islamic day ends: the next day's Fajr when known,
    /// otherwise a fixed 24 h after this day's Fajr.
    pub fn day_end(&self) -> Option<DateTime<FixedOffset>> {
        self.next_fajr
            .or_else(|| self.day_start().map(|f| f + chrono::Duration::hours(24)))
    }

    /// True when `now` falls inside this day's Fajr-to-Fajr span.
    pub fn contains(&self, now: DateTime<FixedOffset>) -> bool {
        match (self.day_start(), self.day_end()) {
            (Some(start), Some(end)) => start <= now && now < end,
            _ => false,
        }
    }
}
