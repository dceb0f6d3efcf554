//! JSON document holding the values each indicator and strategy ran with.
//!
//! ```json
//! {
//!     "ValueInCalculation": {
//!         "SRLine": {
//!             "threshold": 0.05,
//!             "PressureArea": { "strategy_name": "PressureArea", "area_num": 20 }
//!         }
//!     }
//! }
//! ```
//!
//! Every operation reads the whole document and, for writes, rewrites it
//! whole through a temporary sibling file and a rename. Read-modify-write
//! cycles are serialised by a mutex so one adapter shared between threads
//! never loses an update.

use crate::domain::error::GoInvestError;
use crate::domain::indicator::{IndicatorName, StrategyName};
use crate::ports::calc_config_port::{
    CalcConfigPort, ConfigEntry, CALC_SECTION, STRATEGY_NAME_FIELD,
};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

pub struct JsonConfigAdapter {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonConfigAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Creates the document, or adds a missing `ValueInCalculation` section
    /// to an existing one. Returns whether anything was written.
    pub fn bootstrap(&self) -> Result<bool, GoInvestError> {
        let _guard = self.guard();

        let mut doc = if self.path.is_file() {
            self.load()?
        } else {
            Value::Object(Map::new())
        };

        let Some(root) = doc.as_object_mut() else {
            return Err(GoInvestError::DataSource {
                reason: format!("{} is not a JSON object", self.path.display()),
            });
        };
        if root.get(CALC_SECTION).is_some_and(Value::is_object) {
            return Ok(false);
        }
        root.insert(CALC_SECTION.to_string(), Value::Object(Map::new()));

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        self.store(&doc)?;
        info!(path = %self.path.display(), "initialised calculation config");
        Ok(true)
    }

    fn load(&self) -> Result<Value, GoInvestError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn store(&self, doc: &Value) -> Result<(), GoInvestError> {
        let mut buf = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        doc.serialize(&mut ser)?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, &buf)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Applies `f` to the `ValueInCalculation` section and saves the result.
    fn update<F>(&self, f: F) -> Result<(), GoInvestError>
    where
        F: FnOnce(&mut ConfigEntry),
    {
        let _guard = self.guard();
        let mut doc = self.load()?;
        let section = doc
            .get_mut(CALC_SECTION)
            .and_then(Value::as_object_mut)
            .ok_or_else(missing_section)?;
        f(section);
        self.store(&doc)
    }

    fn read_section(&self) -> Result<ConfigEntry, GoInvestError> {
        let _guard = self.guard();
        let mut doc = self.load()?;
        match doc.get_mut(CALC_SECTION).map(Value::take) {
            Some(Value::Object(section)) => Ok(section),
            _ => Err(missing_section()),
        }
    }
}

fn missing_section() -> GoInvestError {
    GoInvestError::MissingConfigSection {
        section: CALC_SECTION.to_string(),
    }
}

impl CalcConfigPort for JsonConfigAdapter {
    fn read_indicator(
        &self,
        indicator: IndicatorName,
    ) -> Result<Option<ConfigEntry>, GoInvestError> {
        let mut section = self.read_section()?;
        Ok(match section.remove(indicator.as_str()) {
            Some(Value::Object(entry)) => Some(entry),
            _ => None,
        })
    }

    fn read_strategy(
        &self,
        indicator: IndicatorName,
        strategy: StrategyName,
    ) -> Result<Option<ConfigEntry>, GoInvestError> {
        let Some(mut entry) = self.read_indicator(indicator)? else {
            return Ok(None);
        };
        Ok(match entry.remove(strategy.as_str()) {
            Some(Value::Object(mut nested)) => {
                nested.remove(STRATEGY_NAME_FIELD);
                Some(nested)
            }
            _ => None,
        })
    }

    fn write_indicator(
        &self,
        indicator: IndicatorName,
        entry: ConfigEntry,
    ) -> Result<(), GoInvestError> {
        debug!(%indicator, "writing indicator config");
        self.update(|section| {
            section.insert(indicator.as_str().to_string(), Value::Object(entry));
        })
    }

    fn write_strategy(
        &self,
        indicator: IndicatorName,
        strategy: StrategyName,
        mut entry: ConfigEntry,
    ) -> Result<(), GoInvestError> {
        debug!(%indicator, %strategy, "writing strategy config");
        entry.insert(
            STRATEGY_NAME_FIELD.to_string(),
            Value::String(strategy.as_str().to_string()),
        );
        self.update(|section| {
            let slot = section
                .entry(indicator.as_str().to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(indicator_entry) = slot {
                indicator_entry.insert(strategy.as_str().to_string(), Value::Object(entry));
            }
        })
    }
}
