use serde::{Deserialize, Serialize};

use catalog_core::{DomainError, DomainResult, Entity, UomCategoryId, UomId};

/// Position of a unit relative to its category's reference unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UomType {
    Reference,
    Bigger,
    Smaller,
}

/// Unit category (e.g. "Unit", "Weight"). Only units of the same category convert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UomCategory {
    pub id: UomCategoryId,
    pub name: String,
}

impl UomCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: UomCategoryId::new(),
            name: name.into(),
        }
    }
}

/// Unit of measure.
///
/// `factor` is how many of this unit make one reference unit: a dozen has
/// factor 1/12, a gram (with kg as reference) has factor 1000.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UomRecord", into = "UomRecord")]
pub struct Uom {
    id: UomId,
    name: String,
    category: UomCategoryId,
    factor: f64,
    rounding: f64,
    uom_type: UomType,
}

/// Wire shape of a unit; deserialization goes through [`Uom::from_parts`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UomRecord {
    id: UomId,
    name: String,
    category: UomCategoryId,
    factor: f64,
    #[serde(default = "default_rounding")]
    rounding: f64,
    uom_type: UomType,
}

fn default_rounding() -> f64 {
    0.01
}

impl Uom {
    /// Reference unit of its category (factor 1).
    pub fn reference(name: impl Into<String>, category: UomCategoryId, rounding: f64) -> DomainResult<Self> {
        Self::from_parts(UomId::new(), name, category, 1.0, rounding, UomType::Reference)
    }

    /// Unit that holds `ratio` reference units (a dozen holds 12 units).
    pub fn bigger(
        name: impl Into<String>,
        category: UomCategoryId,
        ratio: f64,
        rounding: f64,
    ) -> DomainResult<Self> {
        ensure_positive_factor(ratio)?;
        Self::from_parts(UomId::new(), name, category, 1.0 / ratio, rounding, UomType::Bigger)
    }

    /// Unit of which `ratio` make one reference unit (1000 g per kg).
    pub fn smaller(
        name: impl Into<String>,
        category: UomCategoryId,
        ratio: f64,
        rounding: f64,
    ) -> DomainResult<Self> {
        Self::from_parts(UomId::new(), name, category, ratio, rounding, UomType::Smaller)
    }

    /// Build a unit from raw fields, rejecting degenerate factors.
    pub fn from_parts(
        id: UomId,
        name: impl Into<String>,
        category: UomCategoryId,
        factor: f64,
        rounding: f64,
        uom_type: UomType,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("unit name cannot be empty"));
        }
        ensure_positive_factor(factor)?;
        if uom_type == UomType::Reference && factor != 1.0 {
            return Err(DomainError::validation(format!(
                "reference unit {name} must have factor 1, got {factor}"
            )));
        }
        if !rounding.is_finite() || rounding < 0.0 {
            return Err(DomainError::validation(format!(
                "rounding precision of {name} must be a non-negative number"
            )));
        }
        Ok(Self {
            id,
            name,
            category,
            factor,
            rounding,
            uom_type,
        })
    }

    pub fn with_id(mut self, id: UomId) -> Self {
        self.id = id;
        self
    }

    pub fn with_rounding(mut self, rounding: f64) -> DomainResult<Self> {
        if !rounding.is_finite() || rounding < 0.0 {
            return Err(DomainError::validation(format!(
                "rounding precision of {} must be a non-negative number",
                self.name
            )));
        }
        self.rounding = rounding;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> UomCategoryId {
        self.category
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Reference units per one of this unit.
    pub fn factor_inv(&self) -> f64 {
        1.0 / self.factor
    }

    pub fn rounding(&self) -> f64 {
        self.rounding
    }

    pub fn uom_type(&self) -> UomType {
        self.uom_type
    }

    pub fn same_category(&self, other: &Uom) -> bool {
        self.category == other.category
    }
}

impl Entity for Uom {
    type Id = UomId;

    fn id(&self) -> UomId {
        self.id
    }
}

fn ensure_positive_factor(factor: f64) -> DomainResult<()> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(DomainError::arithmetic(format!(
            "conversion factor must be a positive number, got {factor}"
        )));
    }
    Ok(())
}

impl TryFrom<UomRecord> for Uom {
    type Error = DomainError;

    fn try_from(r: UomRecord) -> Result<Self, Self::Error> {
        Uom::from_parts(r.id, r.name, r.category, r.factor, r.rounding, r.uom_type)
    }
}

impl From<Uom> for UomRecord {
    fn from(u: Uom) -> Self {
        Self {
            id: u.id,
            name: u.name,
            category: u.category,
            factor: u.factor,
            rounding: u.rounding,
            uom_type: u.uom_type,
        }
    }
}
