//! Port traits (interfaces) for the hexagonal architecture.

pub mod calc_config_port;
pub mod config_port;
pub mod data_port;
pub mod indicator_store_port;
