//! Price series, periods and product types.

use crate::domain::error::GoInvestError;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Sampling granularity of a price table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Period {
    Daily,
    Weekly,
}

impl Period {
    /// Every period, in processing order.
    pub const ALL: [Period; 2] = [Period::Daily, Period::Weekly];

    pub fn label(self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
        }
    }

    /// Single-letter code used in indicator file names.
    pub fn short_code(self) -> char {
        match self {
            Period::Daily => 'D',
            Period::Weekly => 'W',
        }
    }

    pub fn from_short_code(c: char) -> Option<Period> {
        match c {
            'D' => Some(Period::Daily),
            'W' => Some(Period::Weekly),
            _ => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of tradable instrument; selects the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProductType {
    #[default]
    Stock,
}

impl ProductType {
    pub fn label(self) -> &'static str {
        match self {
            ProductType::Stock => "stock",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stock" => Ok(ProductType::Stock),
            other => Err(format!("unknown product type '{other}'")),
        }
    }
}

/// Days since 1970-01-01. Every trend-line fit and evaluation goes through
/// this conversion so that computation and re-evaluation share one epoch.
pub fn date_to_num(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
    (date - epoch).num_days() as f64
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Closing prices of one period, strictly increasing by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(period: Period, points: Vec<PricePoint>) -> Result<Self, GoInvestError> {
        if let Some(w) = points.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(GoInvestError::UnsortedPrices {
                period,
                date: w[1].date,
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    /// Weekly closes: the last close of each ISO week, dated on that week's
    /// last trading day.
    pub fn to_weekly(&self) -> PriceSeries {
        let mut weekly: Vec<PricePoint> = Vec::new();
        let mut current_week = None;

        for point in &self.points {
            let week = point.date.iso_week();
            let key = (week.year(), week.week());
            if current_week == Some(key) {
                if let Some(last) = weekly.last_mut() {
                    *last = *point;
                }
            } else {
                current_week = Some(key);
                weekly.push(*point);
            }
        }

        PriceSeries { points: weekly }
    }
}

/// Price tables keyed by period.
pub type PriceTableSet = BTreeMap<Period, PriceSeries>;
