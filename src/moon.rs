//! Moon-phase computation (Schaefer 1985)
//!
//! Low-precision phase routine, good to about a day: enough to pick a
//! glyph and caption for the header line. Reference: Sky & Telescope
//! "MOONFX.BAS" phase section (Mar 1985).

use chrono::{Datelike, NaiveDate};

/// Mean synodic month length in days.
const SYNODIC_MONTH: f64 = 29.530_588_2;

/// Phase snapshot for one civil date.
#[derive(Debug, Clone, Copy)]
pub struct MoonPhase {
    /// Phase octant 0-7 (0 = new, 4 = full).
    pub phase_index: u8,
    /// Age of the moon in days since the last new moon.
    pub age_days: f64,
    /// Illuminated fraction (0-1).
    pub illuminated: f64,
}

impl MoonPhase {
    /// Unicode glyph for the phase octant.
    pub fn glyph(&self) -> char {
        match self.phase_index {
            0 => '\u{1F311}', // new
            1 => '\u{1F312}', // waxing crescent
            2 => '\u{1F313}', // first quarter
            3 => '\u{1F314}', // waxing gibbous
            4 => '\u{1F315}', // full
            5 => '\u{1F316}', // waning gibbous
            6 => '\u{1F317}', // last quarter
            _ => '\u{1F318}', // waning crescent
        }
    }

    pub fn caption(&self) -> &'static str {
        match self.phase_index {
            0 => "New Moon",
            1 => "Waxing Crescent",
            2 => "First Quarter",
            3 => "Waxing Gibbous",
            4 => "Full Moon",
            5 => "Waning Gibbous",
            6 => "Last Quarter",
            _ => "Waning Crescent",
        }
    }
}

/// Schaefer's phase routine evaluated at civil noon of `date`.
pub fn moon_phase(date: NaiveDate) -> MoonPhase {
    // March-based year simplifies the day-count arithmetic
    let (mut y, mut m) = (date.year(), date.month() as i32);
    if m < 3 {
        y -= 1;
        m += 12;
    }
    m += 1;
    let day = f64::from(date.day()) + 0.5;

    // Day count from the 1900-01-00 12 UT new-moon epoch (S&T 1985)
    let days = (365.25 * f64::from(y)).floor() + (30.6 * f64::from(m)).floor() + day - 694_039.09;

    let mut cycle = days / SYNODIC_MONTH;
    cycle -= cycle.floor();
    let phase_index = ((cycle * 8.0) + 0.5).floor() as u8 & 7;

    let age_days = cycle * SYNODIC_MONTH;
    let half = SYNODIC_MONTH / 2.0;
    let illuminated = (1.0 - (age_days - half).abs() / half).clamp(0.0, 1.0);

    MoonPhase {
        phase_index,
        age_days,
        illuminated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_new_moon() {
        // 2024-01-11 was a new moon
        let phase = moon_phase(NaiveDate::from_ymd_opt(2024, 1, 11).unwrap());
        assert_eq!(phase.phase_index, 0);
        assert!(phase.age_days < 1.5, "age {} too large for new", phase.age_days);
        assert!(phase.illuminated < 0.1);
        assert_eq!(phase.caption(), "New Moon");
    }

    #[test]
    fn known_full_moon() {
        // 2024-01-25 was a full moon
        let phase = moon_phase(NaiveDate::from_ymd_opt(2024, 1, 25).unwrap());
        assert_eq!(phase.phase_index, 4);
        assert!(phase.illuminated > 0.9);
    }

    #[test]
    fn waxing_crescent_a_few_days_in() {
        let phase = moon_phase(NaiveDate::from_ymd_opt(2024, 1, 14).unwrap());
        assert_eq!(phase.phase_index, 1);
        assert!(phase.age_days > 2.0 && phase.age_days < 6.0);
    }

    #[test]
    fn outputs_stay_in_range_across_a_full_cycle() {
        let mut date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut seen = [false; 8];
        for _ in 0..31 {
            let phase = moon_phase(date);
            assert!(phase.phase_index < 8);
            assert!(phase.age_days >= 0.0 && phase.age_days < SYNODIC_MONTH + 0.1);
            assert!((0.0..=1.0).contains(&phase.illuminated));
            seen[phase.phase_index as usize] = true;
            date = date.succ_opt().unwrap();
        }
        assert!(
            seen.iter().all(|&s| s),
            "31 consecutive days should visit every octant"
        );
    }
}
