//! Date windows shared by pricing rules and vendor price breaks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Inclusive `[date_start, date_end]` window; an unset bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Validity {
    #[serde(default)]
    pub date_start: Option<NaiveDate>,
    #[serde(default)]
    pub date_end: Option<NaiveDate>,
}

impl Validity {
    /// Window with no bounds: matches every date.
    pub fn always() -> Self {
        Self::default()
    }

    pub fn between(date_start: NaiveDate, date_end: NaiveDate) -> DomainResult<Self> {
        Self::new(Some(date_start), Some(date_end))
    }

    pub fn new(date_start: Option<NaiveDate>, date_end: Option<NaiveDate>) -> DomainResult<Self> {
        let window = Self { date_start, date_end };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let (Some(start), Some(end)) = (self.date_start, self.date_end) {
            if start > end {
                return Err(DomainError::validation(format!(
                    "validity window starts after it ends ({start} > {end})"
                )));
            }
        }
        Ok(())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.date_start.is_none_or(|start| date >= start) && self.date_end.is_none_or(|end| date <= end)
    }
}

impl ValueObject for Validity {}
