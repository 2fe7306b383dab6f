//! Price lists and price resolution.
//!
//! [`PriceResolver::get_product_price`] selects the applicable rule of a
//! price list, evaluates it (following chains of price lists based on other
//! price lists) and converts the result into the requested unit and currency.

pub mod company;
pub mod currency;
pub mod pricelist;
pub mod resolver;
pub mod selector;
pub mod store;

pub use company::{Company, change_company_currency, ensure_company_pricelist};
pub use currency::{CurrencyConverter, StaticRates};
pub use pricelist::{AppliedOn, ComputePrice, DEFAULT_SEQUENCE, Formula, PriceBase, Pricelist, PricelistItem};
pub use resolver::{PriceQuery, PriceResolver};
pub use selector::select_rule;
pub use store::{InMemoryPricelistStore, PricelistStore};
