//! Application settings.
//!
//! ```ini
//! [paths]
//! data_root = /srv/goinvest/data
//! config_json = /srv/goinvest/config.json
//!
//! [run]
//! codes = 600418, 000001
//! product_type = stock
//! as_of = 2024-06-28
//! met_line_policy = per_period
//! ```
//!
//! Only `[paths] data_root` is required. `config_json` defaults to
//! `config.json` under the data root, `as_of` to the local date.

use crate::domain::error::GoInvestError;
use crate::domain::price::ProductType;
use crate::domain::signal::pressure_area::MetLinePolicy;
use crate::ports::config_port::ConfigPort;
use chrono::{Local, NaiveDate};
use std::collections::HashSet;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_JSON: &str = "config.json";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_root: PathBuf,
    pub config_json: PathBuf,
    pub codes: Vec<String>,
    pub product_type: ProductType,
    pub as_of: Option<NaiveDate>,
    pub met_line_policy: MetLinePolicy,
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, GoInvestError> {
        let data_root = config
            .get_string("paths", "data_root")
            .map(PathBuf::from)
            .ok_or_else(|| GoInvestError::ConfigMissing {
                section: "paths".to_string(),
                key: "data_root".to_string(),
            })?;
        let config_json = config
            .get_string("paths", "config_json")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_root.join(DEFAULT_CONFIG_JSON));

        let codes = match config.get_string("run", "codes") {
            Some(list) => parse_codes(&list)?,
            None => Vec::new(),
        };

        let product_type = match config.get_string("run", "product_type") {
            Some(s) => s.parse().map_err(|reason| invalid("product_type", reason))?,
            None => ProductType::default(),
        };

        let as_of = config
            .get_string("run", "as_of")
            .map(|s| parse_date(&s))
            .transpose()?;

        let met_line_policy = match config.get_string("run", "met_line_policy") {
            Some(s) => s.parse().map_err(|reason| invalid("met_line_policy", reason))?,
            None => MetLinePolicy::default(),
        };

        Ok(Self {
            data_root,
            config_json,
            codes,
            product_type,
            as_of,
            met_line_policy,
        })
    }

    /// The pinned `as_of` date, or the local date.
    pub fn today(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Local::now().date_naive())
    }
}

fn invalid(key: &str, reason: String) -> GoInvestError {
    GoInvestError::ConfigInvalid {
        section: "run".to_string(),
        key: key.to_string(),
        reason,
    }
}

/// Parses a YYYY-MM-DD date as given in settings or on the command line.
pub fn parse_date(s: &str) -> Result<NaiveDate, GoInvestError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| invalid("as_of", format!("invalid date '{s}', expected YYYY-MM-DD")))
}

/// Comma separated instrument codes; empty tokens and duplicates are
/// rejected.
pub fn parse_codes(input: &str) -> Result<Vec<String>, GoInvestError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let code = token.trim();
        if code.is_empty() {
            return Err(invalid("codes", "empty token in code list".to_string()));
        }
        if !seen.insert(code.to_string()) {
            return Err(invalid("codes", format!("duplicate code: {code}")));
        }
        codes.push(code.to_string());
    }

    Ok(codes)
}
