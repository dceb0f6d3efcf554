//! Price/line crossing detection.
//!
//! The side of the line is the sign of `price - line` in {-1, 0, +1}; a date
//! is a crossing when its side differs from the previous date's side. Sitting
//! exactly on the line is its own side, so stepping onto the line and stepping
//! off it are both crossings.

use crate::domain::price::PricePoint;
use chrono::NaiveDate;
use std::cmp::Ordering;

fn side(price: f64, line: f64) -> Option<Ordering> {
    price.partial_cmp(&line)
}

/// Dates at which `prices` changes side relative to `line`.
///
/// `line[i]` is the line value on `prices[i].date`; extra elements in the
/// longer slice are ignored. A `NaN` on either side never produces a crossing
/// and resets the comparison.
pub fn find_crossings(line: &[f64], prices: &[PricePoint]) -> Vec<NaiveDate> {
    let mut crossings = Vec::new();
    let mut prev: Option<Ordering> = None;

    for (point, &level) in prices.iter().zip(line) {
        let current = side(point.close, level);
        if let (Some(p), Some(c)) = (prev, current) {
            if p != c {
                crossings.push(point.date);
            }
        }
        prev = current;
    }

    crossings
}
