//! Currency conversion collaborator.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use catalog_core::{CurrencyCode, DomainError, DomainResult};
use catalog_uom::float_round;

/// Converts amounts between currencies at a given date.
pub trait CurrencyConverter: Send + Sync {
    fn convert(&self, amount: f64, from: &CurrencyCode, to: &CurrencyCode, date: NaiveDate) -> DomainResult<f64>;
}

impl<C> CurrencyConverter for Arc<C>
where
    C: CurrencyConverter + ?Sized,
{
    fn convert(&self, amount: f64, from: &CurrencyCode, to: &CurrencyCode, date: NaiveDate) -> DomainResult<f64> {
        (**self).convert(amount, from, to, date)
    }
}

/// Fixed rates relative to an implicit reference currency, ignoring the date.
///
/// A rate of 2.0 for "USD" means one reference unit buys two dollars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticRates {
    #[serde(default)]
    rates: HashMap<CurrencyCode, f64>,
    /// Precision converted amounts are rounded to.
    #[serde(default = "default_rounding")]
    rounding: f64,
}

fn default_rounding() -> f64 {
    0.01
}

impl Default for StaticRates {
    fn default() -> Self {
        Self {
            rates: HashMap::new(),
            rounding: default_rounding(),
        }
    }
}

impl StaticRates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, currency: CurrencyCode, rate: f64) -> DomainResult<Self> {
        self.set_rate(currency, rate)?;
        Ok(self)
    }

    pub fn set_rate(&mut self, currency: CurrencyCode, rate: f64) -> DomainResult<()> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(DomainError::arithmetic(format!("rate for {currency} must be positive, got {rate}")));
        }
        self.rates.insert(currency, rate);
        Ok(())
    }

    fn rate(&self, currency: &CurrencyCode) -> DomainResult<f64> {
        self.rates
            .get(currency)
            .copied()
            .ok_or_else(|| DomainError::configuration(format!("no exchange rate for {currency}")))
    }
}

impl CurrencyConverter for StaticRates {
    fn convert(&self, amount: f64, from: &CurrencyCode, to: &CurrencyCode, _date: NaiveDate) -> DomainResult<f64> {
        if from == to {
            return Ok(amount);
        }
        let converted = amount / self.rate(from)? * self.rate(to)?;
        Ok(float_round(converted, self.rounding))
    }
}
