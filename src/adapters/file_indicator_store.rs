//! Filesystem indicator cache.
//!
//! Layout under `{data_root}/{product}/{code}`:
//!
//! - `indicator/{code}{P}_{YYYYMMDD}_{Indicator}.csv` with `P` the period's
//!   short code (`D`, `W`)
//! - `strategy/{code}_{Indicator}{Strategy}_anlysis.csv`
//!
//! File names are parsed back into [`IndicatorKey`]s and compared field by
//! field; a name that does not parse is never read or deleted.

use crate::domain::error::GoInvestError;
use crate::domain::indicator::{IndicatorName, IndicatorTable, StrategyName};
use crate::domain::price::{Period, ProductType};
use crate::domain::signal::JudgmentTable;
use crate::ports::indicator_store_port::{IndicatorKey, IndicatorStore};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const DATE_STAMP: &str = "%Y%m%d";
const ROW_DATE: &str = "%Y-%m-%d";

pub struct FileIndicatorStore {
    data_root: PathBuf,
}

impl FileIndicatorStore {
    pub fn new(data_root: PathBuf) -> Self {
        Self { data_root }
    }

    fn instrument_dir(&self, product_type: ProductType, code: &str) -> PathBuf {
        self.data_root.join(product_type.label()).join(code)
    }

    pub fn indicator_dir(&self, product_type: ProductType, code: &str) -> PathBuf {
        self.instrument_dir(product_type, code).join("indicator")
    }

    pub fn indicator_path(&self, key: &IndicatorKey) -> PathBuf {
        self.indicator_dir(key.product_type, &key.code)
            .join(file_name(key))
    }

    pub fn judgment_path(
        &self,
        product_type: ProductType,
        code: &str,
        indicator: IndicatorName,
        strategy: StrategyName,
    ) -> PathBuf {
        self.instrument_dir(product_type, code)
            .join("strategy")
            .join(format!("{code}_{indicator}{strategy}_anlysis.csv"))
    }

    /// Every stored entry of the series named by `key`, with its path.
    fn series_entries(
        &self,
        key: &IndicatorKey,
    ) -> Result<Vec<(IndicatorKey, PathBuf)>, GoInvestError> {
        let dir = self.indicator_dir(key.product_type, &key.code);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(found) = parse_file_name(&name.to_string_lossy(), key.product_type) else {
                continue;
            };
            if found.same_series(key) {
                entries.push((found, entry.path()));
            }
        }
        entries.sort_by_key(|(k, _)| k.date);
        Ok(entries)
    }
}

/// `{code}{P}_{YYYYMMDD}_{Indicator}.csv`
pub fn file_name(key: &IndicatorKey) -> String {
    format!(
        "{}{}_{}_{}.csv",
        key.code,
        key.period.short_code(),
        key.date.format(DATE_STAMP),
        key.indicator
    )
}

/// Inverse of [`file_name`]; `None` for anything not written by this store.
pub fn parse_file_name(name: &str, product_type: ProductType) -> Option<IndicatorKey> {
    let stem = name.strip_suffix(".csv")?;
    let mut parts = stem.rsplitn(3, '_');
    let indicator: IndicatorName = parts.next()?.parse().ok()?;
    let stamp = parts.next()?;
    let code_period = parts.next()?;

    if stamp.len() != 8 {
        return None;
    }
    let date = NaiveDate::parse_from_str(stamp, DATE_STAMP).ok()?;

    let period = Period::from_short_code(code_period.chars().last()?)?;
    let code = &code_period[..code_period.len() - 1];
    if code.is_empty() {
        return None;
    }

    Some(IndicatorKey {
        product_type,
        code: code.to_string(),
        period,
        indicator,
        date,
    })
}

fn format_value(v: f64) -> String {
    if v.is_nan() { String::new() } else { v.to_string() }
}

fn write_table(path: &Path, table: &IndicatorTable) -> Result<(), GoInvestError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["date".to_string()];
    header.extend(table.columns().iter().cloned());
    wtr.write_record(&header)?;

    for row in table.rows() {
        let mut record = vec![row.date.format(ROW_DATE).to_string()];
        record.extend(row.values.iter().map(|v| format_value(*v)));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn read_table(path: &Path) -> Result<IndicatorTable, GoInvestError> {
    let mut rdr = csv::Reader::from_path(path)?;
    let columns: Vec<String> = rdr.headers()?.iter().skip(1).map(str::to_string).collect();
    let mut table = IndicatorTable::with_columns(columns);

    for result in rdr.records() {
        let record = result?;
        let date_str = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(date_str, ROW_DATE).map_err(|e| {
            GoInvestError::DataSource {
                reason: format!("invalid date '{}' in {}: {}", date_str, path.display(), e),
            }
        })?;

        let mut values = Vec::with_capacity(record.len().saturating_sub(1));
        for field in record.iter().skip(1) {
            let field = field.trim();
            let value = if field.is_empty() {
                f64::NAN
            } else {
                field.parse().map_err(|e| GoInvestError::DataSource {
                    reason: format!("invalid value '{}' in {}: {}", field, path.display(), e),
                })?
            };
            values.push(value);
        }
        table.push_row(date, values);
    }

    Ok(table)
}

impl IndicatorStore for FileIndicatorStore {
    fn put(&self, key: &IndicatorKey, table: &IndicatorTable) -> Result<(), GoInvestError> {
        write_table(&self.indicator_path(key), table)
    }

    fn get(&self, key: &IndicatorKey) -> Result<Option<IndicatorTable>, GoInvestError> {
        let path = self.indicator_path(key);
        if !path.is_file() {
            return Ok(None);
        }
        read_table(&path).map(Some)
    }

    fn latest(&self, key: &IndicatorKey) -> Result<Option<IndicatorTable>, GoInvestError> {
        let newest = self
            .series_entries(key)?
            .into_iter()
            .filter(|(k, _)| k.date <= key.date)
            .next_back();
        match newest {
            Some((_, path)) => read_table(&path).map(Some),
            None => Ok(None),
        }
    }

    fn invalidate_stale(&self, key: &IndicatorKey) -> Result<usize, GoInvestError> {
        let mut removed = 0;
        for (found, path) in self.series_entries(key)? {
            if found.date != key.date {
                debug!(file = %path.display(), "removing stale indicator file");
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn put_judgment(
        &self,
        product_type: ProductType,
        code: &str,
        indicator: IndicatorName,
        strategy: StrategyName,
        table: &JudgmentTable,
    ) -> Result<(), GoInvestError> {
        let path = self.judgment_path(product_type, code, indicator, strategy);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut wtr = csv::Writer::from_path(&path)?;
        let mut header = vec!["date"];
        header.extend(Period::ALL.iter().map(|p| p.label()));
        wtr.write_record(&header)?;

        for (date, judgment) in table.rows() {
            let mut record = vec![date.format(ROW_DATE).to_string()];
            record.extend(Period::ALL.iter().map(|p| judgment.get(*p).to_string()));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        debug!(file = %path.display(), "wrote {indicator}{strategy} analysis for {code}");
        Ok(())
    }
}
