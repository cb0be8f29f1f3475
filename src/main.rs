//! # Salat Tracker Application Entry Point
//!
//! This binary coordinates the library pieces: load configuration, build
//! the day window over the AlAdhan source, render the current day to the
//! terminal, and in watch mode keep a single update armed for the next
//! event boundary.

// Test modules
#[cfg(test)]
mod tests;

use std::env;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, FixedOffset, Local, NaiveDate};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use salat_clock_lib::aladhan::AlAdhanSource;
use salat_clock_lib::buffer::{BufferState, DayBufferManager};
use salat_clock_lib::config::Config;
use salat_clock_lib::renderer;
use salat_clock_lib::scheduler::{self, ThreadScheduler, UpdateChain};
use salat_clock_lib::source::EventTimeSource;
use salat_clock_lib::{EventId, Timing};

/// Re-arm delay after a failed refresh in watch mode.
const RETRY_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Default, PartialEq)]
struct Args {
    /// Keep running, re-rendering at every event boundary.
    watch: bool,
    /// Render one specific civil date instead of today.
    date: Option<NaiveDate>,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--watch" => parsed.watch = true,
            "--date" => {
                let value = args.next().context("--date needs a YYYY-MM-DD value")?;
                let date = NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                    .with_context(|| format!("unrecognized --date value: {value}"))?;
                parsed.date = Some(date);
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(parsed)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn local_now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

/// Rebuild the window around `now` and print it. The source caches by
/// (config, date), so rebuilding is cheap after the first fill.
fn refresh(
    buffer: &mut DayBufferManager<AlAdhanSource>,
    config: &Config,
    now: DateTime<FixedOffset>,
) -> anyhow::Result<BufferState> {
    buffer.initialize(now).context("load day window")?;
    if buffer.state() != BufferState::Ready {
        return Ok(buffer.state());
    }
    for _ in 1..config.display.buffered_days.max(1) {
        buffer.add_next_day().context("extend day window")?;
    }
    render_window(buffer, config, now);
    Ok(buffer.state())
}

fn render_window(
    buffer: &DayBufferManager<AlAdhanSource>,
    config: &Config,
    now: DateTime<FixedOffset>,
) {
    let current = buffer.day_for(now).map(|day| day.date);
    for day in buffer.days() {
        if current == Some(day.date) {
            print!(
                "{}",
                renderer::render_day(
                    day,
                    Some(now),
                    config.display.strip_width,
                    config.display.strip_height,
                )
            );
            println!("{}", renderer::render_timetable(day, Some(now)));
        } else {
            println!("{}", renderer::render_timetable(day, None));
        }
    }
}

/// One specific civil date: anchor at its noon so the probe always lands
/// inside that date's own Islamic day, then render without the live sun
/// unless the real now happens to fall inside it.
fn render_single_date(
    buffer: &mut DayBufferManager<AlAdhanSource>,
    config: &Config,
    date: NaiveDate,
) -> anyhow::Result<()> {
    let now = local_now();
    let noon = date
        .and_hms_opt(12, 0, 0)
        .and_then(|naive| naive.and_local_timezone(*now.offset()).single())
        .context("materialize noon for the requested date")?;

    buffer.initialize(noon).context("load requested day")?;
    if buffer.state() != BufferState::Ready {
        warn!("configured coordinates cannot produce times; check salat-config.toml");
        return Ok(());
    }
    let day = buffer.days().front().context("requested day missing")?;
    let marker = if day.contains(now) { Some(now) } else { None };
    print!(
        "{}",
        renderer::render_day(
            day,
            marker,
            config.display.strip_width,
            config.display.strip_height,
        )
    );
    println!("{}", renderer::render_timetable(day, marker));
    Ok(())
}

/// Delay until the day under `now` needs recomputing: the first event
/// still ahead, or the closing Fajr once every listed event has passed.
fn next_boundary_delay<S: EventTimeSource>(
    buffer: &DayBufferManager<S>,
    now: DateTime<FixedOffset>,
) -> Duration {
    match buffer.day_for(now) {
        Some(day) => {
            let mut boundaries = day.timings.clone();
            boundaries.extend(day.next_fajr.map(|end| Timing::new(EventId::Fajr, end)));
            scheduler::delay_until_next_boundary(now, &boundaries)
        }
        None => RETRY_DELAY,
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    init_logging();
    let args = parse_args(env::args().skip(1))?;

    let config = Config::load();
    let source = AlAdhanSource::new().context("create timings source")?;
    let mut buffer = DayBufferManager::with_capacity(
        source,
        config.calculation(),
        config.display.buffered_days.max(1),
    );

    if let Some(date) = args.date {
        return render_single_date(&mut buffer, &config, date);
    }

    let (tx, rx) = mpsc::channel::<()>();
    let mut chain = UpdateChain::new(ThreadScheduler);

    loop {
        let now = local_now();
        let delay = match refresh(&mut buffer, &config, now) {
            Ok(BufferState::Ready) => {
                if !args.watch {
                    return Ok(());
                }
                next_boundary_delay(&buffer, now)
            }
            Ok(_) => {
                // invalid coordinates will not fix themselves while running
                warn!("configured coordinates cannot produce times; check salat-config.toml");
                return Ok(());
            }
            Err(err) => {
                if !args.watch {
                    return Err(err);
                }
                warn!(error = %err, "refresh failed, retrying shortly");
                RETRY_DELAY
            }
        };

        info!(seconds = delay.as_secs(), "next update armed");
        let tick = tx.clone();
        chain.arm(
            delay,
            Box::new(move || {
                let _ = tick.send(());
            }),
        );

        // Block until the armed update fires, then recompute from the
        // actual clock: a late wake after suspend lands on current data.
        rx.recv().context("update channel closed")?;
    }
}
