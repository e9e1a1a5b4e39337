//! Adaptive scale markers for the time axis.
//!
//! The tick interval is the finest candidate that still leaves at least
//! `min_pixel_spacing` between neighbouring markers, so zooming in only ever
//! refines the scale and zooming out only ever coarsens it.

use chrono::{Datelike, Days, NaiveDate};

use super::date_parser::{date_to_fractional_year, days_in_year};

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Significant digits kept when snapping tick values.
const TICK_PRECISION: i32 = 12;

/// Month ticks closer than this to Jan 1 are treated as year boundaries.
const YEAR_BOUNDARY_EPSILON: f64 = 0.01;

/// Absorbs float error when flooring a fraction of a year to a day or month.
const FLOOR_EPSILON: f64 = 1e-6;

const DAYS_PER_YEAR: f64 = 365.25;

/// Unit a tick or label is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Year,
    Month,
    Day,
}

/// A candidate spacing between ticks, in years.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleInterval {
    pub years: f64,
    pub granularity: Granularity,
}

const fn interval(years: f64, granularity: Granularity) -> ScaleInterval {
    ScaleInterval { years, granularity }
}

/// Candidate intervals, coarsest first.
pub const INTERVALS: [ScaleInterval; 15] = [
    interval(1000.0, Granularity::Year),
    interval(500.0, Granularity::Year),
    interval(250.0, Granularity::Year),
    interval(100.0, Granularity::Year),
    interval(50.0, Granularity::Year),
    interval(25.0, Granularity::Year),
    interval(10.0, Granularity::Year),
    interval(5.0, Granularity::Year),
    interval(2.0, Granularity::Year),
    interval(1.0, Granularity::Year),
    interval(1.0 / 2.0, Granularity::Month),
    interval(1.0 / 4.0, Granularity::Month),
    interval(1.0 / 12.0, Granularity::Month),
    interval(7.0 / DAYS_PER_YEAR, Granularity::Day),
    interval(1.0 / DAYS_PER_YEAR, Granularity::Day),
];

/// A labelled marker on the scale.
#[derive(Debug, Clone, PartialEq)]
pub struct TickMark {
    pub year_value: f64,
    pub granularity: Granularity,
    pub label: String,
}

/// Pick the finest interval whose on-screen spacing is at least `min_pixel_spacing`.
///
/// Falls back to the coarsest interval when even that is too dense.
pub fn choose_interval(pixels_per_year: f64, min_pixel_spacing: f64) -> ScaleInterval {
    INTERVALS
        .iter()
        .rev()
        .find(|candidate| candidate.years * pixels_per_year >= min_pixel_spacing)
        .copied()
        .unwrap_or(INTERVALS[0])
}

/// Enumerate ticks covering `[min_year, max_year]`.
pub fn ticks(min_year: f64, max_year: f64, pixels_per_year: f64, min_pixel_spacing: f64) -> Vec<TickMark> {
    if !(pixels_per_year > 0.0) || !pixels_per_year.is_finite() || !(max_year >= min_year) {
        return Vec::new();
    }

    let ScaleInterval { years, granularity } = choose_interval(pixels_per_year, min_pixel_spacing);
    if granularity == Granularity::Day {
        return day_ticks(min_year, max_year, (years * DAYS_PER_YEAR).round() as u64);
    }

    let first = (min_year / years).ceil() as i64;

    let mut marks: Vec<TickMark> = Vec::new();
    for step in first.. {
        let value = round_to_precision(step as f64 * years, TICK_PRECISION);
        if value > max_year {
            break;
        }
        if value < min_year {
            continue;
        }
        if marks.last().is_some_and(|last| last.year_value == value) {
            continue;
        }
        marks.push(TickMark {
            year_value: value,
            granularity,
            label: label_for(value, granularity),
        });
    }
    marks
}

/// Ticks on real calendar days, every `step_days` days.
///
/// Stepping by whole dates keeps one tick per day even though years are not
/// a whole number of average-length days apart.
fn day_ticks(min_year: f64, max_year: f64, step_days: u64) -> Vec<TickMark> {
    let step_days = step_days.max(1);
    let Some(mut date) = date_at(min_year) else {
        return Vec::new();
    };

    // Weekly ticks land on the same weekday wherever the range starts
    let misalignment = (date.num_days_from_ce() as i64).rem_euclid(step_days as i64) as u64;
    if misalignment != 0 {
        match date.checked_add_days(Days::new(step_days - misalignment)) {
            Some(aligned) => date = aligned,
            None => return Vec::new(),
        }
    }

    let mut marks = Vec::new();
    loop {
        let value = date_to_fractional_year(date);
        if value > max_year {
            break;
        }
        if value >= min_year {
            marks.push(TickMark {
                year_value: value,
                granularity: Granularity::Day,
                label: day_label(date),
            });
        }
        match date.checked_add_days(Days::new(step_days)) {
            Some(next) => date = next,
            None => break,
        }
    }
    marks
}

/// Calendar day containing a fractional year.
fn date_at(fractional_year: f64) -> Option<NaiveDate> {
    if !fractional_year.is_finite() {
        return None;
    }
    let year = fractional_year.floor();
    let days = days_in_year(year as i32);
    let day_index = (((fractional_year - year) * days as f64 + FLOOR_EPSILON).floor() as u32).min(days - 1);
    NaiveDate::from_yo_opt(year as i32, day_index + 1)
}

fn day_label(date: NaiveDate) -> String {
    let month = MONTH_ABBREVIATIONS[date.month0() as usize];
    if date.day() == 1 {
        format!("{} 1, {}", month, date.year())
    } else {
        format!("{} {}", month, date.day())
    }
}

/// Round to a number of significant digits, absorbing float drift.
pub fn round_to_precision(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32 + 1;
    let scale = 10f64.powi(digits - magnitude);
    (value * scale).round() / scale
}

/// Human-readable label for a fractional year at the given granularity.
pub fn label_for(fractional_year: f64, granularity: Granularity) -> String {
    let year = fractional_year.floor();
    let remainder = fractional_year - year;
    let year = year as i32;

    match granularity {
        Granularity::Year => year.to_string(),
        Granularity::Month => {
            let month = ((remainder * 12.0 + FLOOR_EPSILON).floor() as usize).min(11);
            if remainder.abs() < YEAR_BOUNDARY_EPSILON {
                format!("{} {}", MONTH_ABBREVIATIONS[0], year)
            } else {
                MONTH_ABBREVIATIONS[month].to_string()
            }
        }
        // The day a moment falls in, never the next one
        Granularity::Day => match date_at(fractional_year) {
            Some(date) => day_label(date),
            None => year.to_string(),
        },
    }
}

/// Label for the pointer position, always at day granularity.
pub fn cursor_label(fractional_year: f64) -> String {
    label_for(fractional_year, Granularity::Day)
}
