//! # Active-Event Resolution
//!
//! Determines which named event/period is active for a given instant (wall
//! clock) or progress fraction (scroll input). The rule is the same in both
//! domains: the active event is the *last* boundary at or before "now",
//! an inclusive lower bound, so an instant exactly on a boundary activates
//! that boundary's event. Time before the day's first boundary is the
//! special pre-Fajr period, which still belongs to the *previous* Islamic
//! day; resolving it against that day's final event is the buffer's job
//! because only the buffer owns two adjacent days.

use crate::{EventId, Timeline, Timing};
use chrono::{DateTime, FixedOffset};

/// What is active at a queried instant within one day's timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePeriod {
    /// Before the day's first timing. Semantically the tail of the previous
    /// Islamic day; callers holding that day resolve it to a concrete event.
    PreFajr,
    /// At or after this event's boundary and before the next one.
    Event(EventId),
}

impl ActivePeriod {
    /// The concrete event, unless this is the pre-Fajr marker.
    pub fn event(self) -> Option<EventId> {
        match self {
            ActivePeriod::PreFajr => None,
            ActivePeriod::Event(id) => Some(id),
        }
    }
}

/// Resolve the active period for an absolute instant.
///
/// Returns `None` for an empty timing list. The day's final event stays
/// active for any `now` past it; the caller switches days once the next
/// day's Fajr is reached.
pub fn resolve(timings: &[Timing], now: DateTime<FixedOffset>) -> Option<ActivePeriod> {
    if timings.is_empty() {
        return None;
    }
    let active = timings
        .iter()
        .rev()
        .find(|t| t.value <= now)
        .map(|t| ActivePeriod::Event(t.event));
    Some(active.unwrap_or(ActivePeriod::PreFajr))
}

/// Resolve the active period for a scroll progress in `[0, 1]`.
///
/// The fraction-domain analog of [`resolve`], with the same inclusive
/// tie-break. Returns `None` when the timeline carries no fractions at all.
pub fn resolve_progress(timeline: &Timeline, progress: f32) -> Option<ActivePeriod> {
    let mut active = None;
    let mut any = false;
    for (event, fraction) in timeline.present() {
        any = true;
        if fraction <= progress {
            active = Some(ActivePeriod::Event(event));
        }
    }
    if !any {
        return None;
    }
    Some(active.unwrap_or(ActivePeriod::PreFajr))
}
