//! Price lists and their rules.

use serde::{Deserialize, Serialize};

use catalog_core::{
    CategoryId, CompanyId, CurrencyCode, DomainError, DomainResult, Entity, PricelistId,
    PricelistItemId, TemplateId, UomId, Validity, VariantId,
};
use catalog_products::{ProductTemplate, ProductVariant};

/// Sequence given to items that do not set one.
pub const DEFAULT_SEQUENCE: i32 = 5;

/// What a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "target", rename_all = "snake_case")]
pub enum AppliedOn {
    Global,
    Category(CategoryId),
    Template(TemplateId),
    Variant(VariantId),
}

impl AppliedOn {
    /// Higher is narrower.
    pub fn specificity(&self) -> u8 {
        match self {
            AppliedOn::Global => 0,
            AppliedOn::Category(_) => 1,
            AppliedOn::Template(_) => 2,
            AppliedOn::Variant(_) => 3,
        }
    }

    pub fn matches(&self, template: &ProductTemplate, variant: &ProductVariant) -> bool {
        match self {
            AppliedOn::Global => true,
            AppliedOn::Category(category) => template.category == *category,
            AppliedOn::Template(id) => template.id == *id,
            AppliedOn::Variant(id) => variant.id == *id,
        }
    }
}

/// Source amount a percentage or formula rule starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "pricelist", rename_all = "snake_case")]
pub enum PriceBase {
    ListPrice,
    StandardPrice,
    /// The price another list computes for the same query.
    Pricelist(PricelistId),
}

/// Discount, surcharge, rounding and margin bounds applied to a base amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Formula {
    /// Percentage taken off the base.
    pub discount: f64,
    /// Amount added after the discount; may be negative.
    pub surcharge: f64,
    pub rounding: Option<f64>,
    pub min_margin: Option<f64>,
    pub max_margin: Option<f64>,
}

impl Formula {
    pub fn discount(percent: f64) -> Self {
        Self {
            discount: percent,
            ..Self::default()
        }
    }

    pub fn surcharge(amount: f64) -> Self {
        Self {
            surcharge: amount,
            ..Self::default()
        }
    }

    pub fn with_rounding(mut self, step: f64) -> Self {
        self.rounding = Some(step);
        self
    }

    pub fn with_margins(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_margin = min;
        self.max_margin = max;
        self
    }

    pub fn apply(&self, base: f64) -> f64 {
        let mut price = base * (1.0 - self.discount / 100.0) + self.surcharge;
        if let Some(min) = self.min_margin {
            price = price.max(base + min);
        }
        if let Some(max) = self.max_margin {
            price = price.min(base + max);
        }
        match self.rounding {
            Some(step) => catalog_uom::float_round(price, step),
            None => price,
        }
    }

    fn validate(&self) -> DomainResult<()> {
        let numbers = [self.discount, self.surcharge];
        let optional = [self.rounding, self.min_margin, self.max_margin];
        if numbers.iter().chain(optional.iter().flatten()).any(|n| !n.is_finite()) {
            return Err(DomainError::validation("formula values must be finite"));
        }
        if self.rounding.is_some_and(|r| r < 0.0) {
            return Err(DomainError::validation("formula rounding cannot be negative"));
        }
        if matches!((self.min_margin, self.max_margin), (Some(min), Some(max)) if min > max) {
            return Err(DomainError::validation("formula minimum margin exceeds maximum margin"));
        }
        Ok(())
    }
}

/// How a rule turns its base into a price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ComputePrice {
    /// A set price, independent of any base.
    Fixed(f64),
    /// Percentage taken off the base.
    Percentage(f64),
    Formula(Formula),
}

/// One rule of a price list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricelistItem {
    pub id: PricelistItemId,
    pub applied_on: AppliedOn,
    #[serde(default)]
    pub validity: Validity,
    /// Expressed in the product's default unit.
    #[serde(default)]
    pub min_quantity: f64,
    #[serde(default = "default_base")]
    pub base: PriceBase,
    pub compute: ComputePrice,
    /// Unit a fixed price is quoted in; the product's unit when unset.
    #[serde(default)]
    pub uom: Option<UomId>,
    #[serde(default = "default_sequence")]
    pub sequence: i32,
}

fn default_base() -> PriceBase {
    PriceBase::ListPrice
}

fn default_sequence() -> i32 {
    DEFAULT_SEQUENCE
}

impl PricelistItem {
    pub fn new(applied_on: AppliedOn, compute: ComputePrice) -> Self {
        Self {
            id: PricelistItemId::new(),
            applied_on,
            validity: Validity::always(),
            min_quantity: 0.0,
            base: PriceBase::ListPrice,
            compute,
            uom: None,
            sequence: DEFAULT_SEQUENCE,
        }
    }

    pub fn with_base(mut self, base: PriceBase) -> Self {
        self.base = base;
        self
    }

    pub fn with_min_quantity(mut self, quantity: f64) -> Self {
        self.min_quantity = quantity;
        self
    }

    pub fn with_validity(mut self, validity: Validity) -> Self {
        self.validity = validity;
        self
    }

    pub fn with_sequence(mut self, sequence: i32) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn with_uom(mut self, uom: UomId) -> Self {
        self.uom = Some(uom);
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        self.validity.validate()?;
        if !self.min_quantity.is_finite() || self.min_quantity < 0.0 {
            return Err(DomainError::validation(format!(
                "item {}: minimum quantity must be a non-negative number",
                self.id
            )));
        }
        match &self.compute {
            ComputePrice::Fixed(price) | ComputePrice::Percentage(price) if !price.is_finite() => Err(
                DomainError::validation(format!("item {}: price values must be finite", self.id)),
            ),
            ComputePrice::Formula(formula) => formula.validate(),
            _ => Ok(()),
        }
    }
}

impl Entity for PricelistItem {
    type Id = PricelistItemId;

    fn id(&self) -> PricelistItemId {
        self.id
    }
}

/// A named, ordered set of pricing rules in one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pricelist {
    pub id: PricelistId,
    pub name: String,
    pub currency: CurrencyCode,
    #[serde(default)]
    pub company: Option<CompanyId>,
    /// Evaluated in this order when sequence and scope tie.
    #[serde(default)]
    pub items: Vec<PricelistItem>,
}

impl Pricelist {
    pub fn new(name: impl Into<String>, currency: CurrencyCode) -> Self {
        Self {
            id: PricelistId::new(),
            name: name.into(),
            currency,
            company: None,
            items: Vec::new(),
        }
    }

    pub fn with_company(mut self, company: CompanyId) -> Self {
        self.company = Some(company);
        self
    }

    pub fn with_item(mut self, item: PricelistItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("price list name cannot be empty"));
        }
        self.items.iter().try_for_each(PricelistItem::validate)
    }
}

impl Entity for Pricelist {
    type Id = PricelistId;

    fn id(&self) -> PricelistId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_discount_and_surcharge() {
        assert!((Formula::discount(10.0).apply(70.0) - 63.0).abs() < 1e-9);
        assert!((Formula::surcharge(-0.5).apply(40.0) - 39.5).abs() < 1e-9);
    }

    #[test]
    fn formula_margins_clamp_around_the_base() {
        let deep = Formula::discount(50.0).with_margins(Some(-10.0), None);
        assert_eq!(deep.apply(100.0), 90.0);

        let markup = Formula::surcharge(30.0).with_margins(None, Some(20.0));
        assert_eq!(markup.apply(100.0), 120.0);
    }

    #[test]
    fn formula_rounds_last() {
        let f = Formula::discount(10.0).with_rounding(1.0);
        assert_eq!(f.apply(99.0), 89.0);
    }

    #[test]
    fn inverted_margins_are_rejected() {
        let item = PricelistItem::new(
            AppliedOn::Global,
            ComputePrice::Formula(Formula::default().with_margins(Some(5.0), Some(1.0))),
        );
        assert!(matches!(item.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn negative_min_quantity_is_rejected() {
        let item = PricelistItem::new(AppliedOn::Global, ComputePrice::Fixed(1.0)).with_min_quantity(-1.0);
        assert!(matches!(item.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn specificity_orders_scopes() {
        let scopes = [
            AppliedOn::Global,
            AppliedOn::Category(CategoryId::new()),
            AppliedOn::Template(TemplateId::new()),
            AppliedOn::Variant(VariantId::new()),
        ];
        assert!(scopes.windows(2).all(|w| w[0].specificity() < w[1].specificity()));
    }

    #[test]
    fn item_defaults_apply_when_deserializing() {
        let json = r#"{
            "id": "018f3a5e-0000-7000-8000-000000000001",
            "applied_on": { "scope": "global" },
            "compute": { "kind": "percentage", "value": 10.0 }
        }"#;
        let item: PricelistItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.sequence, DEFAULT_SEQUENCE);
        assert_eq!(item.base, PriceBase::ListPrice);
        assert_eq!(item.min_quantity, 0.0);
        assert_eq!(item.compute, ComputePrice::Percentage(10.0));
    }
}
