//! Domain error types.

use crate::domain::price::Period;
use chrono::NaiveDate;

/// Top-level error type for goinvest.
#[derive(Debug, thiserror::Error)]
pub enum GoInvestError {
    #[error("indicator {indicator} for {code} has no {period} data; run compute first")]
    EmptyIndicatorData {
        code: String,
        indicator: String,
        period: Period,
    },

    #[error("config document is missing the top-level section '{section}'")]
    MissingConfigSection { section: String },

    #[error(
        "cannot fit a trend line for {period} prices: {points} observation(s), need at least 2"
    )]
    DegenerateFit { period: Period, points: usize },

    #[error("{period} prices are not strictly increasing by date at {date}")]
    UnsortedPrices { period: Period, date: NaiveDate },

    #[error("no {period} price data for {code}")]
    NoData { code: String, period: Period },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&GoInvestError> for std::process::ExitCode {
    fn from(err: &GoInvestError) -> Self {
        let code: u8 = match err {
            GoInvestError::Io(_) | GoInvestError::Csv(_) => 1,
            GoInvestError::ConfigParse { .. }
            | GoInvestError::ConfigMissing { .. }
            | GoInvestError::ConfigInvalid { .. } => 2,
            GoInvestError::MissingConfigSection { .. } | GoInvestError::Json(_) => 3,
            GoInvestError::DegenerateFit { .. } | GoInvestError::EmptyIndicatorData { .. } => 4,
            GoInvestError::NoData { .. }
            | GoInvestError::UnsortedPrices { .. }
            | GoInvestError::DataSource { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
