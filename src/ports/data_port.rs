//! Price data access port trait.

use crate::domain::error::GoInvestError;
use crate::domain::price::{PriceTableSet, ProductType};
use chrono::NaiveDate;

/// Source of per-period price tables for an instrument.
pub trait PricePort {
    /// Price tables for `code` as known on `today`; every period in
    /// [`Period::ALL`](crate::domain::price::Period::ALL) is present.
    fn fetch_prices(
        &self,
        code: &str,
        today: NaiveDate,
        product_type: ProductType,
    ) -> Result<PriceTableSet, GoInvestError>;
}
