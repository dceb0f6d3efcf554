//! Indicator identities and the tables they produce.
//!
//! - `IndicatorName`: which indicator a table or config entry belongs to
//! - `StrategyName`: which analysis function produced a judgment table
//! - `IndicatorTable`: dated rows of named `f64` columns
//! - `IndicatorTables`: one table per period

pub mod lifecycle;
pub mod srline;

use crate::domain::price::Period;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorName {
    SrLine,
}

impl IndicatorName {
    pub fn as_str(self) -> &'static str {
        match self {
            IndicatorName::SrLine => "SRLine",
        }
    }
}

impl fmt::Display for IndicatorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndicatorName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SRLine" => Ok(IndicatorName::SrLine),
            other => Err(format!("unknown indicator '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyName {
    PressureArea,
}

impl StrategyName {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyName::PressureArea => "PressureArea",
        }
    }
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub values: Vec<f64>,
}

/// Dated rows of named columns. `NaN` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorTable {
    columns: Vec<String>,
    rows: Vec<IndicatorRow>,
}

impl IndicatorTable {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_columns(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row; short rows are padded with `NaN`, long rows truncated.
    pub fn push_row(&mut self, date: NaiveDate, mut values: Vec<f64>) {
        values.resize(self.columns.len(), f64::NAN);
        self.rows.push(IndicatorRow { date, values });
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_missing(&self) -> bool {
        self.rows.iter().any(|r| r.values.iter().any(|v| v.is_nan()))
    }

    /// Replaces every `NaN` with `value` and returns how many were replaced.
    pub fn fill_missing(&mut self, value: f64) -> usize {
        let mut filled = 0;
        for row in &mut self.rows {
            for v in row.values.iter_mut().filter(|v| v.is_nan()) {
                *v = value;
                filled += 1;
            }
        }
        filled
    }

    /// Values of one column keyed by date.
    pub fn column(&self, name: &str) -> Option<BTreeMap<NaiveDate, f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| (r.date, r.values[idx])).collect())
    }
}

pub type IndicatorTables = BTreeMap<Period, IndicatorTable>;
