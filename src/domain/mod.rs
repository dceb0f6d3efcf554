//! Core domain types and logic.

pub mod price;
pub mod regression;
pub mod shear;
pub mod indicator;
pub mod signal;
pub mod settings;
pub mod pipeline;
pub mod error;
