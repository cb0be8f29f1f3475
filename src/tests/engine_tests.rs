//! # Scenario Tests for Salat Tracker
//!
//! These tests wire several library pieces together the way the binary
//! does: a deterministic source feeding the day window, boundary delays
//! feeding the update chain, and day data feeding the terminal renderer.
//! Tests run quickly and independently, suitable for continuous
//! integration and development workflows.

use std::time::Duration;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone};

use salat_clock_lib::buffer::{BufferState, DayBufferManager};
use salat_clock_lib::config::Config;
use salat_clock_lib::renderer;
use salat_clock_lib::scheduler::{delay_until_next_boundary, FakeScheduler, UpdateChain};
use salat_clock_lib::source::{FixedTableSource, RawDayTimes};
use salat_clock_lib::EventId;

use crate::{next_boundary_delay, parse_args, Args};

const OFFSET_HOURS: i32 = 3;

fn at(date: NaiveDate, h: u32, m: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(OFFSET_HOURS * 3600)
        .unwrap()
        .with_ymd_and_hms(date.year(), date.month(), date.day(), h, m, 0)
        .unwrap()
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

/// A week of regular times around mid-March 2024.
fn table() -> FixedTableSource {
    let mut source = FixedTableSource::new();
    for day in 12..=18 {
        let d = date(day);
        source.insert(
            d,
            RawDayTimes {
                fajr: Some(at(d, 6, 0)),
                sunrise: Some(at(d, 7, 15)),
                dhuhr: Some(at(d, 12, 30)),
                asr: Some(at(d, 15, 45)),
                maghrib: Some(at(d, 18, 0)),
                isha: Some(at(d, 19, 30)),
            },
        );
    }
    source
}

fn window_at(now: DateTime<FixedOffset>) -> DayBufferManager<FixedTableSource> {
    let mut buffer = DayBufferManager::new(table(), Config::default().calculation());
    buffer.initialize(now).unwrap();
    buffer
}

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// No arguments means a single render of today.
#[test]
fn parse_args_defaults_to_single_render() {
    let parsed = parse_args(Vec::new()).unwrap();
    assert_eq!(parsed, Args::default());
}

#[test]
fn parse_args_accepts_watch_flag() {
    let parsed = parse_args(strings(&["--watch"])).unwrap();
    assert!(parsed.watch);
    assert!(parsed.date.is_none());
}

#[test]
fn parse_args_reads_a_date() {
    let parsed = parse_args(strings(&["--date", "2024-03-15"])).unwrap();
    assert_eq!(parsed.date, Some(date(15)));
    assert!(!parsed.watch);
}

#[test]
fn parse_args_rejects_unknown_flags() {
    let err = parse_args(strings(&["--frobnicate"])).unwrap_err();
    assert!(
        err.to_string().contains("unknown argument"),
        "error should name the offending flag, got: {err}"
    );
}

#[test]
fn parse_args_requires_a_date_value() {
    assert!(parse_args(strings(&["--date"])).is_err());
}

#[test]
fn parse_args_rejects_malformed_dates() {
    assert!(parse_args(strings(&["--date", "15-03-2024"])).is_err());
}

/// Walk a whole Islamic day hour by hour and verify the active event
/// only ever moves forward: Fajr at dawn, the night markers after
/// midnight, and no regressions anywhere in between.
#[test]
fn active_event_never_regresses_across_a_day() {
    let mut buffer = window_at(at(date(15), 10, 0));
    buffer.add_next_day().unwrap();

    let mut seen = Vec::new();
    for hour in 6..24 {
        seen.push(buffer.active_event(at(date(15), hour, 0)));
    }
    for hour in 0..6 {
        seen.push(buffer.active_event(at(date(16), hour, 0)));
    }

    let events: Vec<EventId> = seen
        .into_iter()
        .map(|event| event.expect("every sampled hour has an active event"))
        .collect();
    assert_eq!(events.first(), Some(&EventId::Fajr));
    assert_eq!(events.last(), Some(&EventId::LastThirdOfNight));
    for pair in events.windows(2) {
        assert!(
            pair[0] <= pair[1],
            "active event regressed from {:?} to {:?}",
            pair[0],
            pair[1]
        );
    }
}

/// The window never exceeds its capacity no matter how growth calls are
/// interleaved, and the surviving dates stay consecutive.
#[test]
fn interleaved_growth_keeps_the_window_bounded_and_contiguous() {
    let mut buffer =
        DayBufferManager::with_capacity(table(), Config::default().calculation(), 3);
    buffer.initialize(at(date(15), 10, 0)).unwrap();

    buffer.add_previous_day().unwrap();
    buffer.add_next_day().unwrap();
    buffer.add_next_day().unwrap();
    buffer.add_previous_day().unwrap();

    assert_eq!(buffer.days().len(), 3, "window must stay at capacity");
    assert_eq!(buffer.days().front().unwrap().date, date(14));
    assert_eq!(buffer.days().back().unwrap().date, date(16));
    let dates: Vec<NaiveDate> = buffer.days().iter().map(|day| day.date).collect();
    for pair in dates.windows(2) {
        assert_eq!(
            pair[0].succ_opt(),
            Some(pair[1]),
            "buffered dates must stay consecutive"
        );
    }
}

/// Five in the morning still belongs to the previous day's night: with
/// Fajr ahead of `now`, the window anchors on yesterday.
#[test]
fn a_pre_fajr_instant_anchors_on_the_previous_day() {
    let mut source = FixedTableSource::new();
    for day in 14..=15 {
        let d = date(day);
        source.insert(
            d,
            RawDayTimes {
                fajr: Some(at(d, 5, 28)),
                sunrise: Some(at(d, 6, 45)),
                dhuhr: Some(at(d, 12, 30)),
                asr: Some(at(d, 15, 45)),
                maghrib: Some(at(d, 18, 15)),
                isha: Some(at(d, 19, 30)),
            },
        );
    }
    let mut buffer = DayBufferManager::new(source, Config::default().calculation());
    buffer.initialize(at(date(15), 5, 0)).unwrap();

    assert_eq!(buffer.state(), BufferState::Ready);
    assert_eq!(buffer.days()[0].date, date(14));
    assert_eq!(buffer.days()[0].day_index, 0);
}

/// Fractions produced by the full source-to-timeline path land in [0, 1)
/// and strictly increase in canonical event order.
#[test]
fn buffered_timeline_fractions_increase_in_order() {
    let buffer = window_at(at(date(15), 10, 0));
    let timeline = buffer.days()[0]
        .timeline
        .expect("complete input yields a timeline");

    let fractions: Vec<(EventId, f32)> = timeline.present().collect();
    assert_eq!(fractions.len(), 8, "all eight events should be placed");
    assert_eq!(fractions[0], (EventId::Fajr, 0.0));
    for pair in fractions.windows(2) {
        assert!(
            pair[0].1 < pair[1].1,
            "{:?} at {} should precede {:?} at {}",
            pair[0].0,
            pair[0].1,
            pair[1].0,
            pair[1].1
        );
    }
    assert!(fractions.iter().all(|(_, f)| (0.0..1.0).contains(f)));
}

/// The watch loop's steady state: compute the delay to the next event,
/// arm, fire, recompute, arm again. Exactly one update is outstanding at
/// any moment and each delay matches the wall-clock gap.
#[test]
fn update_chain_rearms_for_each_boundary() {
    let buffer = window_at(at(date(15), 10, 0));
    let timings = &buffer.days()[0].timings;
    let scheduler = FakeScheduler::new();
    let mut chain = UpdateChain::new(scheduler.clone());

    // 10:00 -> Dhuhr at 12:30
    let delay = delay_until_next_boundary(at(date(15), 10, 0), timings);
    assert_eq!(delay, Duration::from_secs(9_000));
    chain.arm(delay, Box::new(|| {}));
    assert_eq!(scheduler.pending_count(), 1);
    assert_eq!(scheduler.fire_all(), 1);

    // woke at 12:30 -> Asr at 15:45; the boundary itself is not "next"
    let delay = delay_until_next_boundary(at(date(15), 12, 30), timings);
    assert_eq!(delay, Duration::from_secs(11_700));
    chain.arm(delay, Box::new(|| {}));

    assert_eq!(scheduler.scheduled_count(), 2);
    assert_eq!(scheduler.pending_count(), 1);
    assert_eq!(scheduler.pending_delays(), vec![Duration::from_secs(11_700)]);
}

/// Past the last night marker the next boundary is the closing Fajr,
/// the instant the window hands over to the following Islamic day.
#[test]
fn boundary_past_the_last_event_is_the_closing_fajr() {
    let now = at(date(16), 3, 0);
    let buffer = window_at(now);
    assert_eq!(buffer.days()[0].date, date(15), "03:00 is still the 15th");

    let delay = next_boundary_delay(&buffer, now);
    assert_eq!(delay, Duration::from_secs(3 * 3600));
}

/// End to end: table source, day window, sky strip. Mid-morning the
/// strip carries the now marker, a visible sun, and the ruler labels.
#[test]
fn full_pipeline_renders_a_marked_morning_strip() {
    let now = at(date(15), 10, 0);
    let buffer = window_at(now);
    let day = buffer.day_for(now).expect("10:00 is inside the day");

    let strip = renderer::render_day(day, Some(now), 72, 12);
    assert!(strip.contains('X'), "ruler should mark the current instant");
    assert!(strip.contains('O'), "mid-morning sun should be fully lit");
    assert!(strip.contains("Fajr"), "ruler should carry its labels");
}

/// The timetable flags exactly one row as active when the instant falls
/// inside the day, and none when no marker is given.
#[test]
fn timetable_marks_exactly_one_active_row() {
    let now = at(date(15), 10, 0);
    let buffer = window_at(now);
    let day = buffer.day_for(now).unwrap();

    let marked = renderer::render_timetable(day, Some(now));
    assert_eq!(marked.matches('\u{25b6}').count(), 1);
    let active_line = marked
        .lines()
        .find(|line| line.contains('\u{25b6}'))
        .unwrap();
    assert!(
        active_line.contains("Sunrise"),
        "10:00 sits in the Sunrise period, got: {active_line}"
    );

    let unmarked = renderer::render_timetable(day, None);
    assert_eq!(unmarked.matches('\u{25b6}').count(), 0);
}

/// A rebuilt window reports Ready and anchors on the day whose Fajr has
/// already passed, exactly what the binary's refresh path relies on.
#[test]
fn rebuilding_the_window_is_idempotent() {
    let now = at(date(15), 10, 0);
    let mut buffer = window_at(now);
    let first_date = buffer.days()[0].date;

    buffer.initialize(now).unwrap();
    assert_eq!(buffer.state(), BufferState::Ready);
    assert_eq!(buffer.days().len(), 1);
    assert_eq!(buffer.days()[0].date, first_date);
    assert_eq!(
        buffer.days()[0].day_index,
        0,
        "a rebuild starts the load sequence over"
    );
}
