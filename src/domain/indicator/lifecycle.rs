//! Indicator lifecycle shared by every indicator.
//!
//! An indicator is computed once per day and persisted, then later reloaded
//! and analysed by its strategy functions:
//!
//! 1. `compute`: purge stale files, build one table per period, save
//! 2. `analyze`: load the saved tables, run strategies, save their judgments
//!
//! The shared steps live on [`IndicatorLifecycle`], which each indicator
//! owns and exposes through [`Indicator::lifecycle`].

use crate::domain::error::GoInvestError;
use crate::domain::indicator::{IndicatorName, IndicatorTables, StrategyName};
use crate::domain::price::{Period, PriceSeries, PriceTableSet, ProductType};
use crate::domain::signal::JudgmentTable;
use crate::ports::calc_config_port::{CalcConfigPort, ConfigEntry};
use crate::ports::data_port::PricePort;
use crate::ports::indicator_store_port::{IndicatorKey, IndicatorStore};
use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// The instrument an indicator runs against.
#[derive(Debug, Clone)]
pub struct InstrumentContext {
    pub code: String,
    pub today: NaiveDate,
    pub product_type: ProductType,
    pub prices: PriceTableSet,
}

impl InstrumentContext {
    pub fn fetch(
        code: &str,
        today: NaiveDate,
        product_type: ProductType,
        price_port: &dyn PricePort,
    ) -> Result<Self, GoInvestError> {
        let prices = price_port.fetch_prices(code, today, product_type)?;
        Ok(Self {
            code: code.to_string(),
            today,
            product_type,
            prices,
        })
    }
}

pub trait Indicator {
    fn lifecycle(&self) -> &IndicatorLifecycle<'_>;

    /// Must start with [`IndicatorLifecycle::purge_stale_files`] and end with
    /// [`IndicatorLifecycle::save_indicator`].
    fn compute(&self) -> Result<IndicatorTables, GoInvestError>;

    /// Must start with [`IndicatorLifecycle::load_indicator`]; returns one
    /// judgment table per strategy function.
    fn analyze(&self) -> Result<Vec<JudgmentTable>, GoInvestError>;

    fn name(&self) -> IndicatorName {
        self.lifecycle().indicator()
    }
}

pub struct IndicatorLifecycle<'a> {
    context: InstrumentContext,
    indicator: IndicatorName,
    store: &'a dyn IndicatorStore,
    config: &'a dyn CalcConfigPort,
}

impl<'a> IndicatorLifecycle<'a> {
    pub fn new(
        context: InstrumentContext,
        indicator: IndicatorName,
        store: &'a dyn IndicatorStore,
        config: &'a dyn CalcConfigPort,
    ) -> Self {
        Self {
            context,
            indicator,
            store,
            config,
        }
    }

    pub fn context(&self) -> &InstrumentContext {
        &self.context
    }

    pub fn indicator(&self) -> IndicatorName {
        self.indicator
    }

    pub fn prices(&self, period: Period) -> Result<&PriceSeries, GoInvestError> {
        self.context
            .prices
            .get(&period)
            .ok_or_else(|| GoInvestError::NoData {
                code: self.context.code.clone(),
                period,
            })
    }

    fn key(&self, period: Period) -> IndicatorKey {
        IndicatorKey {
            product_type: self.context.product_type,
            code: self.context.code.clone(),
            period,
            indicator: self.indicator,
            date: self.context.today,
        }
    }

    /// Deletes this indicator's files for other days. Does nothing when the
    /// instrument code is empty.
    pub fn purge_stale_files(&self) -> Result<usize, GoInvestError> {
        if self.context.code.trim().is_empty() {
            warn!(indicator = %self.indicator, "instrument code is empty, skipping purge");
            return Ok(0);
        }
        let mut removed = 0;
        for period in Period::ALL {
            removed += self.store.invalidate_stale(&self.key(period))?;
        }
        Ok(removed)
    }

    /// Fills missing values with 0.0, writes every period's table, and
    /// replaces the indicator's config entry when `config_values` is given.
    pub fn save_indicator(
        &self,
        tables: &mut IndicatorTables,
        config_values: Option<ConfigEntry>,
    ) -> Result<(), GoInvestError> {
        for (period, table) in tables.iter_mut() {
            let filled = table.fill_missing(0.0);
            if filled > 0 {
                debug!(%period, filled, "filled missing indicator values");
            }
            self.store.put(&self.key(*period), table)?;
        }

        if let Some(entry) = config_values {
            self.config.write_indicator(self.indicator, entry)?;
        }
        Ok(())
    }

    /// Most recent saved table of every period. Fails with
    /// `EmptyIndicatorData` when any period has nothing saved.
    pub fn load_indicator(&self) -> Result<IndicatorTables, GoInvestError> {
        let mut tables = IndicatorTables::new();
        for period in Period::ALL {
            match self.store.latest(&self.key(period))? {
                Some(table) if !table.is_empty() => {
                    tables.insert(period, table);
                }
                _ => {
                    return Err(GoInvestError::EmptyIndicatorData {
                        code: self.context.code.clone(),
                        indicator: self.indicator.to_string(),
                        period,
                    });
                }
            }
        }
        Ok(tables)
    }

    pub fn save_strategy(
        &self,
        judgment: &JudgmentTable,
        strategy: StrategyName,
        config_values: Option<ConfigEntry>,
    ) -> Result<(), GoInvestError> {
        self.store.put_judgment(
            self.context.product_type,
            &self.context.code,
            self.indicator,
            strategy,
            judgment,
        )?;

        if let Some(entry) = config_values {
            self.config.write_strategy(self.indicator, strategy, entry)?;
        }
        Ok(())
    }

    /// The indicator's config entry, or a strategy's entry under it.
    pub fn read_config(
        &self,
        strategy: Option<StrategyName>,
    ) -> Result<Option<ConfigEntry>, GoInvestError> {
        match strategy {
            None => self.config.read_indicator(self.indicator),
            Some(s) => self.config.read_strategy(self.indicator, s),
        }
    }

    /// Typed [`read_config`](Self::read_config), falling back to `T::default()`
    /// when nothing is saved yet.
    pub fn read_params<T>(&self, strategy: Option<StrategyName>) -> Result<T, GoInvestError>
    where
        T: DeserializeOwned + Default,
    {
        match self.read_config(strategy)? {
            Some(entry) => Ok(serde_json::from_value(Value::Object(entry))?),
            None => Ok(T::default()),
        }
    }
}

/// Serialises a parameter struct into a config entry.
pub fn to_entry<T: Serialize>(params: &T) -> Result<ConfigEntry, GoInvestError> {
    match serde_json::to_value(params)? {
        Value::Object(entry) => Ok(entry),
        other => Err(GoInvestError::DataSource {
            reason: format!("parameters must serialise to an object, got {other}"),
        }),
    }
}
