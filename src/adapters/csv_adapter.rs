//! CSV file price adapter.
//!
//! Reads `{data_root}/{product}/{code}/kline/{daily,weekly}.csv`. Only the
//! `date` and `close` columns are used; any other columns are ignored. A
//! missing weekly file is derived from the daily table.

use crate::domain::error::GoInvestError;
use crate::domain::price::{Period, PricePoint, PriceSeries, PriceTableSet, ProductType};
use crate::ports::data_port::PricePort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct CsvAdapter {
    data_root: PathBuf,
}

impl CsvAdapter {
    pub fn new(data_root: PathBuf) -> Self {
        Self { data_root }
    }

    pub fn kline_path(&self, product_type: ProductType, code: &str, period: Period) -> PathBuf {
        self.data_root
            .join(product_type.label())
            .join(code)
            .join("kline")
            .join(format!("{}.csv", period.label()))
    }

    fn read_closes(path: &Path, today: NaiveDate) -> Result<Vec<PricePoint>, GoInvestError> {
        let content = fs::read_to_string(path).map_err(|e| GoInvestError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| GoInvestError::DataSource {
                    reason: format!("{} has no '{}' column", path.display(), name),
                })
        };
        let date_col = column("date")?;
        let close_col = column("close")?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result?;

            let date_str = record.get(date_col).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                GoInvestError::DataSource {
                    reason: format!("invalid date '{}' in {}: {}", date_str, path.display(), e),
                }
            })?;

            if date > today {
                continue;
            }

            let close_str = record.get(close_col).unwrap_or_default().trim();
            let close: f64 = close_str.parse().map_err(|e| GoInvestError::DataSource {
                reason: format!("invalid close '{}' in {}: {}", close_str, path.display(), e),
            })?;

            points.push(PricePoint { date, close });
        }

        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}

impl PricePort for CsvAdapter {
    fn fetch_prices(
        &self,
        code: &str,
        today: NaiveDate,
        product_type: ProductType,
    ) -> Result<PriceTableSet, GoInvestError> {
        let daily_path = self.kline_path(product_type, code, Period::Daily);
        if !daily_path.exists() {
            return Err(GoInvestError::NoData {
                code: code.to_string(),
                period: Period::Daily,
            });
        }
        let daily = PriceSeries::new(Period::Daily, Self::read_closes(&daily_path, today)?)?;

        let weekly_path = self.kline_path(product_type, code, Period::Weekly);
        let weekly = if weekly_path.exists() {
            PriceSeries::new(Period::Weekly, Self::read_closes(&weekly_path, today)?)?
        } else {
            debug!(code, "no weekly table, resampling daily closes");
            daily.to_weekly()
        };

        let mut tables = PriceTableSet::new();
        tables.insert(Period::Daily, daily);
        tables.insert(Period::Weekly, weekly);
        Ok(tables)
    }
}
