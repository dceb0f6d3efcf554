//! Pressure-area strategy.
//!
//! The gap between the support and resistance lines is split into `area_num`
//! equal bands, numbered from 0 at the support side. Once price has crossed
//! the support line the signal decays from 1.0 at support towards -1.0 near
//! resistance:
//!
//! - price at or below support: 1.0
//! - band `i < area_num / 2`: `1 - i * step`
//! - band `i >= area_num / 2`: `1 - (i + 1) * step`
//!
//! with `step = 2 / area_num`, rounded to one decimal. Once price has crossed
//! the resistance line the signal is -1.0 regardless of band. Before any
//! crossing the signal stays 0.

use crate::domain::price::{Period, PricePoint};
use crate::domain::signal::cross::find_crossings;
use crate::domain::signal::JudgmentTable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

pub const DEFAULT_AREA_NUM: usize = 20;

fn default_area_num() -> usize {
    DEFAULT_AREA_NUM
}

/// Persisted strategy parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressureAreaParams {
    #[serde(default = "default_area_num")]
    pub area_num: usize,
}

impl Default for PressureAreaParams {
    fn default() -> Self {
        Self {
            area_num: DEFAULT_AREA_NUM,
        }
    }
}

/// Which line price crossed most recently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetLine {
    #[default]
    Undefined,
    Support,
    Resistance,
}

/// Whether the crossing state survives from one period's scan to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetLinePolicy {
    /// Every period starts from `MetLine::Undefined`.
    #[default]
    PerPeriod,
    /// The weekly scan starts in the state the daily scan ended in.
    CarryAcrossPeriods,
}

impl FromStr for MetLinePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "per_period" => Ok(MetLinePolicy::PerPeriod),
            "carry" | "carry_across_periods" => Ok(MetLinePolicy::CarryAcrossPeriods),
            other => Err(format!(
                "unknown met line policy '{other}' (expected per_period or carry)"
            )),
        }
    }
}

/// Price and both lines on one date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePoint {
    pub date: NaiveDate,
    pub price: f64,
    pub support: f64,
    pub resistance: f64,
}

/// Band containing `price`, or `None` when price is below support, at or
/// above resistance, or the lines are not ordered.
pub fn band_index(price: f64, support: f64, resistance: f64, area_num: usize) -> Option<usize> {
    if area_num == 0 || !(resistance > support) || price < support || price >= resistance {
        return None;
    }
    let width = (resistance - support) / area_num as f64;
    let raw = ((price - support) / width).floor();
    if !raw.is_finite() || raw < 0.0 {
        return None;
    }
    Some((raw as usize).min(area_num - 1))
}

/// Signal of `band`, rounded to one decimal on the exact binary value with
/// ties to even.
pub fn band_signal(band: usize, area_num: usize) -> f64 {
    let step = 2.0 / area_num as f64;
    let expected = if band >= area_num / 2 {
        1.0 - (band + 1) as f64 * step
    } else {
        1.0 - band as f64 * step
    };
    format!("{expected:.1}").parse().unwrap_or(expected)
}

#[derive(Debug, Clone)]
pub struct PressureAreaClassifier {
    area_num: usize,
    met_line: MetLine,
}

impl PressureAreaClassifier {
    pub fn new(area_num: usize) -> Self {
        Self {
            area_num: area_num.max(1),
            met_line: MetLine::Undefined,
        }
    }

    pub fn met_line(&self) -> MetLine {
        self.met_line
    }

    pub fn reset(&mut self) {
        self.met_line = MetLine::Undefined;
    }

    /// Scans `points` in order and returns one signal per point.
    pub fn classify(&mut self, points: &[LinePoint]) -> Vec<(NaiveDate, f64)> {
        let prices: Vec<PricePoint> = points
            .iter()
            .map(|p| PricePoint {
                date: p.date,
                close: p.price,
            })
            .collect();
        let support_line: Vec<f64> = points.iter().map(|p| p.support).collect();
        let resistance_line: Vec<f64> = points.iter().map(|p| p.resistance).collect();

        let support_cross: BTreeSet<NaiveDate> =
            find_crossings(&support_line, &prices).into_iter().collect();
        let resistance_cross: BTreeSet<NaiveDate> =
            find_crossings(&resistance_line, &prices).into_iter().collect();

        points
            .iter()
            .map(|p| {
                if support_cross.contains(&p.date) {
                    self.met_line = MetLine::Support;
                }
                // checked second so resistance wins a same-day tie
                if resistance_cross.contains(&p.date) {
                    self.met_line = MetLine::Resistance;
                }
                (p.date, self.signal(p))
            })
            .collect()
    }

    fn signal(&self, p: &LinePoint) -> f64 {
        match self.met_line {
            MetLine::Undefined => 0.0,
            MetLine::Resistance => -1.0,
            MetLine::Support if p.price <= p.support => 1.0,
            MetLine::Support => band_index(p.price, p.support, p.resistance, self.area_num)
                .map(|i| band_signal(i, self.area_num))
                .unwrap_or(0.0),
        }
    }
}

/// Runs the classifier over every period and assembles the judgment table.
pub fn judge(
    periods: &[(Period, Vec<LinePoint>)],
    area_num: usize,
    policy: MetLinePolicy,
) -> JudgmentTable {
    let mut table = JudgmentTable::new();
    let mut classifier = PressureAreaClassifier::new(area_num);

    for (period, points) in periods {
        if policy == MetLinePolicy::PerPeriod {
            classifier.reset();
        }
        table.extend_dates(points.iter().map(|p| p.date));
        for (date, value) in classifier.classify(points) {
            table.set(date, *period, value);
        }
    }

    table
}
