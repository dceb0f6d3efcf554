//! Support/resistance line indicator.
//!
//! Per period:
//! 1. Shear the closing prices to remove their overall drift.
//! 2. Take the `k = floor(count * threshold)` highest and lowest sheared
//!    points (at least two of each).
//! 3. Fit a line through each set against the date ordinal.
//! 4. Evaluate both lines on every date and undo the shear.
//!
//! The result is a `support`/`resistance` table aligned to the price dates.
//! Its strategy is the pressure-area classifier in
//! [`crate::domain::signal::pressure_area`].

use crate::domain::error::GoInvestError;
use crate::domain::indicator::lifecycle::{
    to_entry, Indicator, IndicatorLifecycle, InstrumentContext,
};
use crate::domain::indicator::{IndicatorName, IndicatorTable, IndicatorTables, StrategyName};
use crate::domain::price::{date_to_num, Period, PricePoint, PriceSeries};
use crate::domain::regression::{fit_line, LinearFit};
use crate::domain::shear::{shear, unshear};
use crate::domain::signal::pressure_area::{judge, LinePoint, MetLinePolicy, PressureAreaParams};
use crate::domain::signal::JudgmentTable;
use crate::ports::calc_config_port::CalcConfigPort;
use crate::ports::indicator_store_port::IndicatorStore;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const SUPPORT: &str = "support";
pub const RESISTANCE: &str = "resistance";

pub const DEFAULT_THRESHOLD: f64 = 0.05;

/// Fewest extrema a line is fitted through.
pub const MIN_FIT_POINTS: usize = 2;

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

/// Persisted indicator parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SrLineParams {
    /// Fraction of the observations used as fit points on each side.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for SrLineParams {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Number of extrema taken from each side of a `count`-point series.
pub fn fit_points_count(count: usize, threshold: f64) -> usize {
    let k = (count as f64 * threshold).floor();
    let k = if k.is_finite() && k > 0.0 { k as usize } else { 0 };
    k.max(MIN_FIT_POINTS).min(count)
}

/// The `k` highest and `k` lowest points; equal values go to the earlier
/// date first.
pub fn select_extrema(points: &[PricePoint], k: usize) -> (Vec<PricePoint>, Vec<PricePoint>) {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| b.close.total_cmp(&a.close).then(a.date.cmp(&b.date)));
    let maxima: Vec<PricePoint> = sorted.iter().take(k).copied().collect();

    sorted.sort_by(|a, b| a.close.total_cmp(&b.close).then(a.date.cmp(&b.date)));
    let minima: Vec<PricePoint> = sorted.iter().take(k).copied().collect();

    (maxima, minima)
}

fn fit_through(points: &[PricePoint], period: Period) -> Result<LinearFit, GoInvestError> {
    let xs: Vec<f64> = points.iter().map(|p| date_to_num(p.date)).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.close).collect();
    fit_line(&xs, &ys).ok_or(GoInvestError::DegenerateFit {
        period,
        points: points.len(),
    })
}

fn evaluate(fit: &LinearFit, dates: &[PricePoint]) -> Vec<PricePoint> {
    dates
        .iter()
        .map(|p| PricePoint {
            date: p.date,
            close: fit.eval(date_to_num(p.date)),
        })
        .collect()
}

/// Support and resistance lines of one period's prices.
pub fn compute_sr_lines(
    period: Period,
    prices: &PriceSeries,
    threshold: f64,
) -> Result<IndicatorTable, GoInvestError> {
    if prices.len() < MIN_FIT_POINTS {
        return Err(GoInvestError::DegenerateFit {
            period,
            points: prices.len(),
        });
    }

    let (sheared, coeff) = shear(prices.points());
    let k = fit_points_count(sheared.len(), threshold);
    let (maxima, minima) = select_extrema(&sheared, k);

    let resistance_fit = fit_through(&maxima, period)?;
    let support_fit = fit_through(&minima, period)?;

    let resistance = unshear(&evaluate(&resistance_fit, &sheared), &coeff);
    let support = unshear(&evaluate(&support_fit, &sheared), &coeff);

    let mut table = IndicatorTable::new(&[SUPPORT, RESISTANCE]);
    for (s, r) in support.iter().zip(&resistance) {
        table.push_row(s.date, vec![s.close, r.close]);
    }
    Ok(table)
}

/// Joins prices with the saved lines on date; dates missing from either side
/// are skipped.
pub fn align_lines(
    prices: &PriceSeries,
    lines: &IndicatorTable,
) -> Result<Vec<LinePoint>, GoInvestError> {
    let column = |name: &str| {
        lines.column(name).ok_or_else(|| GoInvestError::DataSource {
            reason: format!("indicator table has no '{name}' column"),
        })
    };
    let support = column(SUPPORT)?;
    let resistance = column(RESISTANCE)?;

    Ok(prices
        .points()
        .iter()
        .filter_map(|p| {
            let s = support.get(&p.date)?;
            let r = resistance.get(&p.date)?;
            Some(LinePoint {
                date: p.date,
                price: p.close,
                support: *s,
                resistance: *r,
            })
        })
        .collect())
}

pub struct SrLine<'a> {
    lifecycle: IndicatorLifecycle<'a>,
    policy: MetLinePolicy,
}

impl<'a> SrLine<'a> {
    pub fn new(
        context: InstrumentContext,
        store: &'a dyn IndicatorStore,
        config: &'a dyn CalcConfigPort,
        policy: MetLinePolicy,
    ) -> Self {
        Self {
            lifecycle: IndicatorLifecycle::new(context, IndicatorName::SrLine, store, config),
            policy,
        }
    }

    fn pressure_area_strategy(
        &self,
        lines: &IndicatorTables,
    ) -> Result<JudgmentTable, GoInvestError> {
        let params: PressureAreaParams =
            self.lifecycle.read_params(Some(StrategyName::PressureArea))?;

        let mut periods = Vec::with_capacity(Period::ALL.len());
        for period in Period::ALL {
            let prices = self.lifecycle.prices(period)?;
            let Some(table) = lines.get(&period) else {
                continue;
            };
            periods.push((period, align_lines(prices, table)?));
        }

        let judgment = judge(&periods, params.area_num, self.policy);
        self.lifecycle.save_strategy(
            &judgment,
            StrategyName::PressureArea,
            Some(to_entry(&params)?),
        )?;
        Ok(judgment)
    }
}

impl Indicator for SrLine<'_> {
    fn lifecycle(&self) -> &IndicatorLifecycle<'_> {
        &self.lifecycle
    }

    fn compute(&self) -> Result<IndicatorTables, GoInvestError> {
        let code = &self.lifecycle.context().code;
        info!(code = %code, indicator = %self.name(), "computing lines");

        self.lifecycle.purge_stale_files()?;
        let params: SrLineParams = self.lifecycle.read_params(None)?;

        let mut tables = IndicatorTables::new();
        for period in Period::ALL {
            let prices = self.lifecycle.prices(period)?;
            tables.insert(period, compute_sr_lines(period, prices, params.threshold)?);
        }

        self.lifecycle.save_indicator(&mut tables, Some(to_entry(&params)?))?;
        Ok(tables)
    }

    fn analyze(&self) -> Result<Vec<JudgmentTable>, GoInvestError> {
        let lines = self.lifecycle.load_indicator()?;
        info!(
            code = %self.lifecycle.context().code,
            indicator = %self.name(),
            "analysing lines"
        );
        let pressure_area = self.pressure_area_strategy(&lines)?;
        Ok(vec![pressure_area])
    }
}
