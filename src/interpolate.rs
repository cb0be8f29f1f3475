//! # Visual Interpolators
//!
//! Pure functions mapping a day progress in `[0, 1]` plus a [`Timeline`] to
//! visual attributes: sun position, sun and night-sky opacity, and sky
//! color. Renderers sample these directly; no smoothing happens here. The
//! values are raw so a renderer can apply its own spring/easing on top.
//!
//! Every function is continuous at every sub-interval edge: the value at a
//! boundary equals the limit approaching it from both sides. An asymmetry
//! there is a visible rendering glitch, so the edge behavior is pinned by
//! tests rather than left to convention. An absent event collapses the
//! functions that need it to their resting values instead of inventing a
//! window.

use crate::Timeline;

/// Normalized horizontal bound where the sun rises.
pub const SUN_EAST_X: f32 = 0.0;
/// Normalized horizontal bound where the sun sets.
pub const SUN_WEST_X: f32 = 1.0;
/// Vertical resting position (horizon).
pub const SUN_BASELINE_Y: f32 = 0.0;
/// Vertical position at the arc's peak.
pub const SUN_PEAK_Y: f32 = 1.0;

/// Width of the sun's fade-in/fade-out shoulder, as a day fraction.
const SUN_FADE: f32 = 0.04;

/// Linear RGB color with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// Sky color during the night plateau.
pub const NIGHT_SKY: Rgb = Rgb {
    r: 0.03,
    g: 0.05,
    b: 0.15,
};
/// Warm dawn color at sunrise.
pub const DAWN_SKY: Rgb = Rgb {
    r: 0.95,
    g: 0.62,
    b: 0.38,
};
/// Neutral daylight plateau.
pub const DAY_SKY: Rgb = Rgb {
    r: 0.45,
    g: 0.71,
    b: 0.96,
};
/// Warm dusk color at maghrib.
pub const DUSK_SKY: Rgb = Rgb {
    r: 0.93,
    g: 0.45,
    b: 0.30,
};

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    // two-product form lands exactly on the endpoints at t = 0 and t = 1
    a * (1.0 - t) + b * t
}

/// The daylight sub-interval `[sunrise, maghrib]`, or `None` when either
/// end is absent or the interval is degenerate.
fn daylight(timeline: &Timeline) -> Option<(f32, f32)> {
    match (timeline.sunrise, timeline.maghrib) {
        (Some(sunrise), Some(maghrib)) if maghrib > sunrise => Some((sunrise, maghrib)),
        _ => None,
    }
}

/// Horizontal sun position: linear from the east bound to the west bound
/// across `[sunrise, maghrib]`, clamped to the east bound before sunrise
/// and the west bound at and after maghrib. Resting value is the east
/// bound when the daylight interval is unavailable.
pub fn sun_x(progress: f32, timeline: &Timeline) -> f32 {
    let (sunrise, maghrib) = match daylight(timeline) {
        Some(interval) => interval,
        None => return SUN_EAST_X,
    };
    let t = ((progress - sunrise) / (maghrib - sunrise)).clamp(0.0, 1.0);
    lerp(SUN_EAST_X, SUN_WEST_X, t)
}

/// Vertical sun position: a parabola peaking at the midpoint of
/// `[sunrise, maghrib]`, equal to the baseline at and outside the
/// interval's edges.
pub fn sun_y(progress: f32, timeline: &Timeline) -> f32 {
    let (sunrise, maghrib) = match daylight(timeline) {
        Some(interval) => interval,
        None => return SUN_BASELINE_Y,
    };
    let t = ((progress - sunrise) / (maghrib - sunrise)).clamp(0.0, 1.0);
    // 4t(1-t): 0 at both edges, 1 at t = ½
    lerp(SUN_BASELINE_Y, SUN_PEAK_Y, 4.0 * t * (1.0 - t))
}

/// Sun opacity: zero outside `[sunrise, maghrib]`, with short linear
/// shoulders just inside the interval so both edges meet the outside
/// zero continuously.
pub fn sun_opacity(progress: f32, timeline: &Timeline) -> f32 {
    let (sunrise, maghrib) = match daylight(timeline) {
        Some(interval) => interval,
        None => return 0.0,
    };
    let shoulder = SUN_FADE.min((maghrib - sunrise) / 2.0);
    let rise = ((progress - sunrise) / shoulder).clamp(0.0, 1.0);
    let fall = ((maghrib - progress) / shoulder).clamp(0.0, 1.0);
    rise.min(fall)
}

/// Night-sky opacity: full at the day's start (the pre-dawn hours), fading
/// out by sunrise; zero through daylight; ramping over `[isha, mid_night]`
/// back to full and holding through the last third to the day's end.
pub fn night_opacity(progress: f32, timeline: &Timeline) -> f32 {
    let morning = match timeline.sunrise {
        Some(sunrise) if sunrise > 0.0 => (1.0 - progress / sunrise).clamp(0.0, 1.0),
        _ => 0.0,
    };
    let evening = match (timeline.isha, timeline.mid_night) {
        (Some(isha), Some(mid)) if mid > isha => ((progress - isha) / (mid - isha)).clamp(0.0, 1.0),
        _ => 0.0,
    };
    morning.max(evening)
}

/// Sky color sampled from three independently interpolated channels.
///
/// Each channel is a piecewise-linear curve through its own anchor list:
/// the red and green channels start warming midway between Asr and
/// Maghrib, while blue begins falling at Asr itself and is the last to
/// recover at dawn. Outside its transition windows every channel sits on a
/// stable plateau, so values there are identical no matter how far outside
/// the window the progress lies.
pub fn sky_color(progress: f32, timeline: &Timeline) -> Rgb {
    let dusk_start = match (timeline.asr, timeline.maghrib) {
        (Some(asr), Some(maghrib)) => Some((asr + maghrib) / 2.0),
        _ => None,
    };
    let dawn_end = match (timeline.sunrise, timeline.dhuhr) {
        (Some(sunrise), Some(dhuhr)) => Some((sunrise + dhuhr) / 2.0),
        _ => None,
    };

    let red = channel_anchors(&[
        (Some(0.0), NIGHT_SKY.r),
        (timeline.fajr, NIGHT_SKY.r),
        (timeline.sunrise, DAWN_SKY.r),
        (dawn_end, DAY_SKY.r),
        (dusk_start, DAY_SKY.r),
        (timeline.maghrib, DUSK_SKY.r),
        (timeline.isha, NIGHT_SKY.r),
        (Some(1.0), NIGHT_SKY.r),
    ]);
    let green = channel_anchors(&[
        (Some(0.0), NIGHT_SKY.g),
        (timeline.fajr, NIGHT_SKY.g),
        (timeline.sunrise, DAWN_SKY.g),
        (dawn_end, DAY_SKY.g),
        (dusk_start, DAY_SKY.g),
        (timeline.maghrib, DUSK_SKY.g),
        (timeline.isha, NIGHT_SKY.g),
        (Some(1.0), NIGHT_SKY.g),
    ]);
    let blue = channel_anchors(&[
        (Some(0.0), NIGHT_SKY.b),
        (timeline.fajr, NIGHT_SKY.b),
        (timeline.sunrise, DAWN_SKY.b),
        (timeline.dhuhr, DAY_SKY.b),
        (timeline.asr, DAY_SKY.b),
        (timeline.maghrib, DUSK_SKY.b),
        (timeline.isha, NIGHT_SKY.b),
        (Some(1.0), NIGHT_SKY.b),
    ]);

    Rgb {
        r: piecewise(progress, &red),
        g: piecewise(progress, &green),
        b: piecewise(progress, &blue),
    }
}

/// Keep only the anchors whose position is known, and enforce strictly
/// increasing positions so every segment is non-degenerate. Dropping an
/// anchor shortens a transition but can never introduce a jump.
fn channel_anchors(candidates: &[(Option<f32>, f32)]) -> Vec<(f32, f32)> {
    let mut anchors: Vec<(f32, f32)> = Vec::with_capacity(candidates.len());
    for &(position, value) in candidates {
        if let Some(position) = position {
            match anchors.last() {
                Some(&(prev, _)) if position <= prev => continue,
                _ => anchors.push((position, value)),
            }
        }
    }
    anchors
}

/// Sample a piecewise-linear curve with plateau clamping at both ends.
fn piecewise(progress: f32, anchors: &[(f32, f32)]) -> f32 {
    let (first_pos, first_val) = match anchors.first() {
        Some(&a) => a,
        None => return 0.0,
    };
    if progress <= first_pos {
        return first_val;
    }
    for pair in anchors.windows(2) {
        let (p0, v0) = pair[0];
        let (p1, v1) = pair[1];
        if progress <= p1 {
            if v0 == v1 {
                // plateau segments stay bit-identical across their span
                return v0;
            }
            return lerp(v0, v1, (progress - p0) / (p1 - p0));
        }
    }
    anchors.last().map(|&(_, v)| v).unwrap_or(first_val)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn timeline() -> Timeline {
        Timeline {
            fajr: Some(0.0),
            sunrise: Some(0.06),
            dhuhr: Some(0.29),
            asr: Some(0.43),
            maghrib: Some(0.53),
            isha: Some(0.58),
            mid_night: Some(0.77),
            last_third: Some(0.85),
        }
    }

    /// Left and right ε-limits must both converge to the value at the edge.
    fn assert_continuous_at(f: impl Fn(f32) -> f32, edge: f32) {
        const EPS: f32 = 1e-5;
        let at = f(edge);
        let left = f(edge - EPS);
        let right = f(edge + EPS);
        assert_abs_diff_eq!(left, at, epsilon = 2e-3);
        assert_abs_diff_eq!(right, at, epsilon = 2e-3);
    }

    fn all_edges(tl: &Timeline) -> Vec<f32> {
        let mut edges: Vec<f32> = tl.present().map(|(_, f)| f).collect();
        edges.push((tl.asr.unwrap() + tl.maghrib.unwrap()) / 2.0);
        edges.push((tl.sunrise.unwrap() + tl.dhuhr.unwrap()) / 2.0);
        edges.push(tl.sunrise.unwrap() + 0.04); // sun fade shoulder
        edges.push(tl.maghrib.unwrap() - 0.04);
        edges
    }

    #[test]
    fn sun_x_clamps_to_the_bounds() {
        let tl = timeline();
        assert_eq!(sun_x(0.0, &tl), SUN_EAST_X);
        assert_eq!(sun_x(0.05, &tl), SUN_EAST_X, "east of sunrise stays east");
        assert_eq!(sun_x(0.53, &tl), SUN_WEST_X, "maghrib itself is the west bound");
        assert_eq!(sun_x(0.9, &tl), SUN_WEST_X);
        let midday = (0.06 + 0.53) / 2.0;
        assert_abs_diff_eq!(sun_x(midday, &tl), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn sun_y_peaks_at_the_interval_midpoint() {
        let tl = timeline();
        let midday = (0.06 + 0.53) / 2.0;
        assert_abs_diff_eq!(sun_y(midday, &tl), SUN_PEAK_Y, epsilon = 1e-6);
        assert_eq!(sun_y(0.06, &tl), SUN_BASELINE_Y);
        assert_eq!(sun_y(0.53, &tl), SUN_BASELINE_Y);
        assert_eq!(sun_y(0.0, &tl), SUN_BASELINE_Y);
        assert_eq!(sun_y(1.0, &tl), SUN_BASELINE_Y);
    }

    #[test]
    fn sun_opacity_is_zero_outside_daylight_and_full_inside() {
        let tl = timeline();
        assert_eq!(sun_opacity(0.0, &tl), 0.0);
        assert_eq!(sun_opacity(0.06, &tl), 0.0, "edge value matches the outside");
        assert_eq!(sun_opacity(0.3, &tl), 1.0);
        assert_eq!(sun_opacity(0.53, &tl), 0.0);
        assert_eq!(sun_opacity(0.8, &tl), 0.0);
    }

    #[test]
    fn night_opacity_profile() {
        let tl = timeline();
        assert_eq!(night_opacity(0.0, &tl), 1.0, "full at the day's start");
        assert_eq!(night_opacity(0.06, &tl), 0.0, "gone by sunrise");
        assert_eq!(night_opacity(0.3, &tl), 0.0, "daylight");
        assert_eq!(night_opacity(0.58, &tl), 0.0, "ramp starts at isha");
        assert!(night_opacity(0.7, &tl) > 0.0, "ramping");
        assert_eq!(night_opacity(0.77, &tl), 1.0, "full by mid-night");
        assert_eq!(night_opacity(0.85, &tl), 1.0, "full through the last third");
        assert_eq!(night_opacity(1.0, &tl), 1.0);
    }

    #[test]
    fn every_interpolator_is_continuous_at_every_edge() {
        let tl = timeline();
        for edge in all_edges(&tl) {
            assert_continuous_at(|p| sun_x(p, &tl), edge);
            assert_continuous_at(|p| sun_y(p, &tl), edge);
            assert_continuous_at(|p| sun_opacity(p, &tl), edge);
            assert_continuous_at(|p| night_opacity(p, &tl), edge);
            assert_continuous_at(|p| sky_color(p, &tl).r, edge);
            assert_continuous_at(|p| sky_color(p, &tl).g, edge);
            assert_continuous_at(|p| sky_color(p, &tl).b, edge);
        }
    }

    #[test]
    fn sky_plateaus_are_stable_outside_the_windows() {
        let tl = timeline();
        // Night plateau before fajr and after isha
        assert_eq!(sky_color(0.0, &tl), NIGHT_SKY);
        assert_eq!(sky_color(0.6, &tl), sky_color(0.95, &tl));
        assert_eq!(sky_color(0.58, &tl), NIGHT_SKY);
        // Day plateau: red/green flat between dawn end and dusk start,
        // blue flat between dhuhr and asr
        let a = sky_color(0.30, &tl);
        let b = sky_color(0.42, &tl);
        assert_abs_diff_eq!(a.b, b.b, epsilon = 1e-6);
        assert_abs_diff_eq!(a.b, DAY_SKY.b, epsilon = 1e-6);
    }

    #[test]
    fn dusk_warmth_peaks_at_maghrib() {
        let tl = timeline();
        let dusk = sky_color(0.53, &tl);
        assert_abs_diff_eq!(dusk.r, DUSK_SKY.r, epsilon = 1e-6);
        assert!(dusk.r > sky_color(0.43, &tl).r, "warmer than mid-afternoon");
    }

    #[test]
    fn absent_events_collapse_to_resting_values() {
        let mut tl = timeline();
        tl.sunrise = None;
        for p in [0.0, 0.25, 0.5, 0.75, 1.0] {
            assert_eq!(sun_x(p, &tl), SUN_EAST_X);
            assert_eq!(sun_y(p, &tl), SUN_BASELINE_Y);
            assert_eq!(sun_opacity(p, &tl), 0.0);
        }

        let mut tl = timeline();
        tl.mid_night = None;
        assert_eq!(night_opacity(0.7, &tl), 0.0, "no ramp without its window");
        assert_eq!(night_opacity(0.02, &tl), night_opacity_morning_reference());

        // A missing asr drops anchors but never tears the curve
        let mut tl = timeline();
        tl.asr = None;
        for edge in [0.0, 0.06, 0.29, 0.53, 0.58, 1.0] {
            assert_continuous_at(|p| sky_color(p, &tl).r, edge);
            assert_continuous_at(|p| sky_color(p, &tl).b, edge);
        }
    }

    fn night_opacity_morning_reference() -> f32 {
        // morning fade at p = 0.02 with sunrise at 0.06
        (1.0f32 - 0.02 / 0.06).clamp(0.0, 1.0)
    }

    #[test]
    fn empty_timeline_rests_everywhere() {
        let tl = Timeline::default();
        for p in [0.0, 0.3, 0.6, 1.0] {
            assert_eq!(sun_x(p, &tl), SUN_EAST_X);
            assert_eq!(sun_opacity(p, &tl), 0.0);
            assert_eq!(night_opacity(p, &tl), 0.0);
            assert_eq!(sky_color(p, &tl), NIGHT_SKY);
        }
    }
}
