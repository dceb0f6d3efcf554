#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use goinvest::adapters::file_indicator_store::FileIndicatorStore;
use goinvest::adapters::json_config_adapter::JsonConfigAdapter;
use goinvest::domain::error::GoInvestError;
use goinvest::domain::price::{Period, PricePoint, PriceSeries, PriceTableSet, ProductType};
use goinvest::ports::data_port::PricePort;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct MockPricePort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockPricePort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_daily(mut self, code: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(code.to_string(), points);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl PricePort for MockPricePort {
    fn fetch_prices(
        &self,
        code: &str,
        today: NaiveDate,
        _product_type: ProductType,
    ) -> Result<PriceTableSet, GoInvestError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(GoInvestError::DataSource {
                reason: reason.clone(),
            });
        }
        let points: Vec<PricePoint> = self
            .data
            .get(code)
            .ok_or_else(|| GoInvestError::NoData {
                code: code.to_string(),
                period: Period::Daily,
            })?
            .iter()
            .filter(|p| p.date <= today)
            .copied()
            .collect();

        let daily = PriceSeries::new(Period::Daily, points)?;
        let weekly = daily.to_weekly();
        let mut tables = PriceTableSet::new();
        tables.insert(Period::Daily, daily);
        tables.insert(Period::Weekly, weekly);
        Ok(tables)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `n` consecutive days from 2024-01-01 on a 0.5/day trend with a +-3 zigzag.
pub fn rising_channel(n: usize) -> Vec<PricePoint> {
    let start = date(2024, 1, 1);
    (0..n)
        .map(|i| {
            let wiggle = match i % 4 {
                0 => 3.0,
                2 => -3.0,
                _ => 0.0,
            };
            PricePoint {
                date: start + Duration::days(i as i64),
                close: 100.0 + 0.5 * i as f64 + wiggle,
            }
        })
        .collect()
}

/// Temporary data root with a bootstrapped calculation config.
pub struct Workspace {
    pub dir: TempDir,
    pub store: FileIndicatorStore,
    pub config: JsonConfigAdapter,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = FileIndicatorStore::new(dir.path().to_path_buf());
        let config = JsonConfigAdapter::new(dir.path().join("config.json"));
        config.bootstrap().unwrap();
        Self { dir, store, config }
    }

    pub fn with_config(content: &str) -> Self {
        let ws = Self::new();
        fs::write(ws.config.path(), content).unwrap();
        ws
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn indicator_files(&self, code: &str) -> Vec<String> {
        let dir = self.store.indicator_dir(ProductType::Stock, code);
        let mut names: Vec<String> = match fs::read_dir(&dir) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    pub fn config_json(&self) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(self.config.path()).unwrap()).unwrap()
    }
}

/// Writes `points` as `{root}/stock/{code}/kline/daily.csv`.
pub fn write_daily_kline(root: &Path, code: &str, points: &[PricePoint]) -> PathBuf {
    let dir = root.join("stock").join(code).join("kline");
    fs::create_dir_all(&dir).unwrap();
    let mut content = String::from("date,open,high,low,close,volume\n");
    for p in points {
        content.push_str(&format!(
            "{},{},{},{},{},1000\n",
            p.date.format("%Y-%m-%d"),
            p.close,
            p.close + 1.0,
            p.close - 1.0,
            p.close
        ));
    }
    let path = dir.join("daily.csv");
    fs::write(&path, content).unwrap();
    path
}
