//! Catalog configuration and the explicit defaults used when creating records.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::{CategoryId, CompanyId};
use crate::value_object::CurrencyCode;

pub const ENV_MAX_PRICELIST_DEPTH: &str = "CATALOG_MAX_PRICELIST_DEPTH";
pub const ENV_DEFAULT_CURRENCY: &str = "CATALOG_DEFAULT_CURRENCY";

/// Default bound on "price list based on another price list" chains.
pub const DEFAULT_MAX_PRICELIST_DEPTH: usize = 10;

/// Process-level catalog settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Maximum number of nested price lists a single resolution may traverse.
    pub max_pricelist_depth: usize,
    /// Currency used when neither a company nor a price list provides one.
    pub default_currency: CurrencyCode,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_pricelist_depth: DEFAULT_MAX_PRICELIST_DEPTH,
            default_currency: CurrencyCode::new_unchecked("USD"),
        }
    }
}

impl CatalogConfig {
    /// Read settings from the process environment.
    ///
    /// Unset variables fall back to defaults; set-but-invalid ones are rejected.
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`CatalogConfig::from_env`], with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DomainResult<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_MAX_PRICELIST_DEPTH) {
            let depth: usize = raw.trim().parse().map_err(|_| {
                DomainError::validation(format!("{ENV_MAX_PRICELIST_DEPTH} must be a number, got {raw:?}"))
            })?;
            if depth == 0 {
                return Err(DomainError::validation(format!(
                    "{ENV_MAX_PRICELIST_DEPTH} must be at least 1"
                )));
            }
            config.max_pricelist_depth = depth;
        }

        if let Some(raw) = lookup(ENV_DEFAULT_CURRENCY) {
            config.default_currency = CurrencyCode::new(&raw)?;
        }

        tracing::debug!(
            max_pricelist_depth = config.max_pricelist_depth,
            default_currency = %config.default_currency,
            "catalog configuration loaded"
        );
        Ok(config)
    }
}

/// Values that fill in template fields the caller leaves unset.
///
/// Passed explicitly to template creation instead of being looked up from
/// ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDefaults {
    pub category: CategoryId,
    pub currency: CurrencyCode,
    pub company: Option<CompanyId>,
}

impl CatalogDefaults {
    pub fn new(category: CategoryId, currency: CurrencyCode) -> Self {
        Self {
            category,
            currency,
            company: None,
        }
    }

    pub fn with_company(mut self, company: CompanyId) -> Self {
        self.company = Some(company);
        self
    }
}
