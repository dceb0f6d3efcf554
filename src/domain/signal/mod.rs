//! Strategy functions that turn indicator lines into bounded signals.

pub mod cross;
pub mod pressure_area;

use crate::domain::price::Period;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Signal values of one date, one per period, in [-1, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Judgment {
    pub daily: f64,
    pub weekly: f64,
}

impl Judgment {
    pub fn get(&self, period: Period) -> f64 {
        match period {
            Period::Daily => self.daily,
            Period::Weekly => self.weekly,
        }
    }

    pub fn set(&mut self, period: Period, value: f64) {
        match period {
            Period::Daily => self.daily = value,
            Period::Weekly => self.weekly = value,
        }
    }
}

/// Per-date judgments across periods. Dates absent from one period keep the
/// default 0 in that column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JudgmentTable {
    rows: BTreeMap<NaiveDate, Judgment>,
}

impl JudgmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a zero row for every date not already present.
    pub fn extend_dates(&mut self, dates: impl IntoIterator<Item = NaiveDate>) {
        for date in dates {
            self.rows.entry(date).or_default();
        }
    }

    pub fn set(&mut self, date: NaiveDate, period: Period, value: f64) {
        self.rows.entry(date).or_default().set(period, value);
    }

    pub fn get(&self, date: NaiveDate, period: Period) -> Option<f64> {
        self.rows.get(&date).map(|j| j.get(period))
    }

    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, &Judgment)> {
        self.rows.iter().map(|(d, j)| (*d, j))
    }

    pub fn column(&self, period: Period) -> Vec<(NaiveDate, f64)> {
        self.rows.iter().map(|(d, j)| (*d, j.get(period))).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
