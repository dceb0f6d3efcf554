//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod file_indicator_store;
pub mod json_config_adapter;
