//! Per-instrument pipeline and the requirement-list loop.
//!
//! Each requirement names one instrument. Its prices are fetched once, then
//! the SR-line indicator is computed and/or analysed against them. A failing
//! instrument is logged and skipped; the loop carries on with the rest.

use crate::domain::error::GoInvestError;
use crate::domain::indicator::lifecycle::{Indicator, InstrumentContext};
use crate::domain::indicator::srline::SrLine;
use crate::domain::indicator::{IndicatorName, IndicatorTables};
use crate::domain::price::{Period, ProductType};
use crate::domain::signal::pressure_area::MetLinePolicy;
use crate::domain::signal::JudgmentTable;
use crate::ports::calc_config_port::CalcConfigPort;
use crate::ports::data_port::PricePort;
use crate::ports::indicator_store_port::{IndicatorKey, IndicatorStore};
use chrono::NaiveDate;
use tracing::{info, warn};

/// One instrument to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub code: String,
    pub product_type: ProductType,
}

impl Requirement {
    pub fn new(code: &str, product_type: ProductType) -> Self {
        Self {
            code: code.to_string(),
            product_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Compute,
    Analyze,
    /// Compute then analyze.
    Full,
}

#[derive(Debug, Clone)]
pub struct SkippedInstrument {
    pub code: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub processed: Vec<String>,
    pub skipped: Vec<SkippedInstrument>,
}

pub struct Pipeline<'a> {
    prices: &'a dyn PricePort,
    store: &'a dyn IndicatorStore,
    config: &'a dyn CalcConfigPort,
    policy: MetLinePolicy,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        prices: &'a dyn PricePort,
        store: &'a dyn IndicatorStore,
        config: &'a dyn CalcConfigPort,
        policy: MetLinePolicy,
    ) -> Self {
        Self {
            prices,
            store,
            config,
            policy,
        }
    }

    fn sr_line(&self, req: &Requirement, today: NaiveDate) -> Result<SrLine<'a>, GoInvestError> {
        let context = InstrumentContext::fetch(&req.code, today, req.product_type, self.prices)?;
        Ok(SrLine::new(context, self.store, self.config, self.policy))
    }

    pub fn compute(
        &self,
        req: &Requirement,
        today: NaiveDate,
    ) -> Result<IndicatorTables, GoInvestError> {
        self.sr_line(req, today)?.compute()
    }

    pub fn analyze(
        &self,
        req: &Requirement,
        today: NaiveDate,
    ) -> Result<Vec<JudgmentTable>, GoInvestError> {
        self.sr_line(req, today)?.analyze()
    }

    /// Computes and analyses one instrument against a single price fetch.
    pub fn analyze_instrument(
        &self,
        req: &Requirement,
        today: NaiveDate,
    ) -> Result<Vec<JudgmentTable>, GoInvestError> {
        let sr_line = self.sr_line(req, today)?;
        sr_line.compute()?;
        sr_line.analyze()
    }

    pub fn run_one(
        &self,
        req: &Requirement,
        today: NaiveDate,
        phase: Phase,
    ) -> Result<(), GoInvestError> {
        match phase {
            Phase::Compute => self.compute(req, today).map(|_| ()),
            Phase::Analyze => self.analyze(req, today).map(|_| ()),
            Phase::Full => self.analyze_instrument(req, today).map(|_| ()),
        }
    }

    /// Runs `phase` for every requirement in order.
    pub fn run(&self, requirements: &[Requirement], today: NaiveDate, phase: Phase) -> RunReport {
        let mut report = RunReport::default();

        for req in requirements {
            match self.run_one(req, today, phase) {
                Ok(()) => {
                    info!(
                        code = %req.code,
                        product_type = %req.product_type,
                        ?phase,
                        "instrument done"
                    );
                    report.processed.push(req.code.clone());
                }
                Err(e) => {
                    warn!(code = %req.code, error = %e, "skipping instrument");
                    report.skipped.push(SkippedInstrument {
                        code: req.code.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        report
    }

    /// The newest persisted SR-line tables dated on or before `today`.
    pub fn latest_indicator(
        &self,
        req: &Requirement,
        today: NaiveDate,
    ) -> Result<IndicatorTables, GoInvestError> {
        let mut tables = IndicatorTables::new();
        for period in Period::ALL {
            let key = IndicatorKey {
                product_type: req.product_type,
                code: req.code.clone(),
                period,
                indicator: IndicatorName::SrLine,
                date: today,
            };
            let table = self
                .store
                .latest(&key)?
                .filter(|t| !t.is_empty())
                .ok_or_else(|| GoInvestError::EmptyIndicatorData {
                    code: req.code.clone(),
                    indicator: IndicatorName::SrLine.to_string(),
                    period,
                })?;
            tables.insert(period, table);
        }
        Ok(tables)
    }
}
