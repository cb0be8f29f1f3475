//! # Timeline Normalization
//!
//! Converts one Islamic day's absolute event instants into fractions of the
//! day in `[0, 1]`, where `0.0` is the day's Fajr and `1.0` the next day's
//! Fajr (or a fixed 24 h later when the next Fajr is unknown). The fractions
//! are what every visual consumer samples: the scroll progress of the
//! renderer is directly comparable to them.
//!
//! Normalization is pure. Out-of-order input is a data-quality fault: it is
//! flagged and logged, never silently reordered, and the offending fractions
//! are clamped rather than trusted.

use crate::{EventId, Timing};
use chrono::{DateTime, Duration, FixedOffset};
use serde::Serialize;
use tracing::warn;

/// Normalized `[0, 1]` day-fractions for one Islamic day.
///
/// Each field is `None` when the event was absent from the input. Present
/// fractions are non-decreasing in canonical event order whenever the input
/// honored that order. The day's end is always `1.0` by construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Timeline {
    pub fajr: Option<f32>,
    pub sunrise: Option<f32>,
    pub dhuhr: Option<f32>,
    pub asr: Option<f32>,
    pub maghrib: Option<f32>,
    pub isha: Option<f32>,
    pub mid_night: Option<f32>,
    pub last_third: Option<f32>,
}

impl Timeline {
    /// The normalized position of the day's end.
    pub const fn end(&self) -> f32 {
        1.0
    }

    /// Fraction for one event, if it was present in the input.
    pub fn fraction(&self, event: EventId) -> Option<f32> {
        match event {
            EventId::Fajr => self.fajr,
            EventId::Sunrise => self.sunrise,
            EventId::Dhuhr => self.dhuhr,
            EventId::Asr => self.asr,
            EventId::Maghrib => self.maghrib,
            EventId::Isha => self.isha,
            EventId::MiddleOfNight => self.mid_night,
            EventId::LastThirdOfNight => self.last_third,
        }
    }

    fn set(&mut self, event: EventId, fraction: f32) {
        let slot = match event {
            EventId::Fajr => &mut self.fajr,
            EventId::Sunrise => &mut self.sunrise,
            EventId::Dhuhr => &mut self.dhuhr,
            EventId::Asr => &mut self.asr,
            EventId::Maghrib => &mut self.maghrib,
            EventId::Isha => &mut self.isha,
            EventId::MiddleOfNight => &mut self.mid_night,
            EventId::LastThirdOfNight => &mut self.last_third,
        };
        *slot = Some(fraction);
    }

    /// Present events with their fractions, in canonical order.
    pub fn present(&self) -> impl Iterator<Item = (EventId, f32)> + '_ {
        EventId::ALL
            .into_iter()
            .filter_map(|e| self.fraction(e).map(|f| (e, f)))
    }
}

/// A [`Timeline`] together with the data-quality flag the normalizer raises
/// when the input instants were not in canonical order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalized {
    pub timeline: Timeline,
    /// True when the input violated the non-decreasing order invariant.
    /// The fractions are still produced (clamped), but downstream code may
    /// want to display a staleness hint.
    pub out_of_order: bool,
}

/// Normalize one day's timings into day-fractions.
///
/// Fraction = `(event − day_fajr) / (next_fajr − day_fajr)`, clamped to
/// `[0, 1]`. When `next_fajr` is absent (or not after the day's Fajr,
/// the same data-quality fault as out-of-order input) the divisor
/// falls back to a fixed 24 h span. Returns `None` only when the day has no
/// Fajr anchor at all (the fraction origin would be undefined).
pub fn normalize(timings: &[Timing], next_fajr: Option<DateTime<FixedOffset>>) -> Option<Normalized> {
    let day_fajr = timings
        .iter()
        .find(|t| t.event == EventId::Fajr)
        .map(|t| t.value)?;

    let mut out_of_order = ordered_violation(timings);

    let span = match next_fajr {
        Some(nf) if nf > day_fajr => nf - day_fajr,
        Some(nf) => {
            warn!(%nf, %day_fajr, "next fajr not after day fajr, falling back to 24h span");
            out_of_order = true;
            Duration::hours(24)
        }
        None => Duration::hours(24),
    };
    let span_ms = span.num_milliseconds() as f64;

    let mut timeline = Timeline::default();
    for timing in timings {
        let elapsed_ms = (timing.value - day_fajr).num_milliseconds() as f64;
        let fraction = (elapsed_ms / span_ms).clamp(0.0, 1.0) as f32;
        timeline.set(timing.event, fraction);
    }

    if out_of_order {
        warn!("event instants out of canonical order, fractions clamped");
    }

    Some(Normalized {
        timeline,
        out_of_order,
    })
}

/// True when the timing list breaks the canonical-order invariant: event
/// ids must strictly increase down the list and instants must never step
/// backwards.
fn ordered_violation(timings: &[Timing]) -> bool {
    timings
        .windows(2)
        .any(|pair| pair[0].event >= pair[1].event || pair[0].value > pair[1].value)
}
