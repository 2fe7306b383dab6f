//! Vendor price breaks and the selection of the best one for a purchase.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use catalog_core::{
    CurrencyCode, DomainResult, PartnerId, SupplierInfoId, UomId, Validity, VariantId,
};
use catalog_uom::{compute_price, compute_quantity};

use crate::store::CatalogStore;
use crate::variant::ProductVariant;

/// One vendor price break for a template, quoted per purchase unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierInfo {
    pub id: SupplierInfoId,
    /// `None` is a default offer usable for any partner.
    #[serde(default)]
    pub partner: Option<PartnerId>,
    /// Restricts the offer to one variant of the template.
    #[serde(default)]
    pub variant: Option<VariantId>,
    #[serde(default)]
    pub min_qty: f64,
    pub price: f64,
    pub currency: CurrencyCode,
    #[serde(default)]
    pub validity: Validity,
    #[serde(default = "default_sequence")]
    pub sequence: i32,
    /// Lead time in days.
    #[serde(default)]
    pub delay: u32,
}

fn default_sequence() -> i32 {
    1
}

impl SupplierInfo {
    pub fn new(partner: Option<PartnerId>, min_qty: f64, price: f64, currency: CurrencyCode) -> Self {
        Self {
            id: SupplierInfoId::new(),
            partner,
            variant: None,
            min_qty,
            price,
            currency,
            validity: Validity::always(),
            sequence: default_sequence(),
            delay: 1,
        }
    }

    pub fn for_variant(mut self, variant: VariantId) -> Self {
        self.variant = Some(variant);
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

    fn qualifies(&self, variant: VariantId, partner: Option<PartnerId>, quantity: f64, date: NaiveDate) -> bool {
        self.variant.is_none_or(|v| v == variant)
            && match (partner, self.partner) {
                (Some(wanted), Some(own)) => wanted == own,
                _ => true,
            }
            && self.validity.contains(date)
            && quantity >= self.min_qty
    }
}

/// Ranking among qualifying breaks: partner-specific first, then the highest
/// minimum quantity, then the lowest sequence. Equal keys keep record order.
fn rank(a: &SupplierInfo, b: &SupplierInfo) -> Ordering {
    b.partner
        .is_some()
        .cmp(&a.partner.is_some())
        .then_with(|| b.min_qty.total_cmp(&a.min_qty))
        .then_with(|| a.sequence.cmp(&b.sequence))
}

/// Pick the vendor price break that applies to buying `quantity` of `variant`.
///
/// `quantity` is expressed in `uom`, or in the template's purchase unit when
/// `uom` is `None`. Returns `None` when no break qualifies.
pub fn select_seller<S>(
    store: &S,
    variant: &ProductVariant,
    partner: Option<PartnerId>,
    quantity: f64,
    date: NaiveDate,
    uom: Option<UomId>,
) -> DomainResult<Option<SupplierInfo>>
where
    S: CatalogStore + ?Sized,
{
    let template = store.template(variant.template)?;
    let quantity = match uom {
        Some(uom) if uom != template.uom_po => {
            compute_quantity(quantity, &store.uom(uom)?, &store.uom(template.uom_po)?)?
        }
        _ => quantity,
    };

    let mut candidates: Vec<&SupplierInfo> = template
        .sellers
        .iter()
        .filter(|s| s.qualifies(variant.id, partner, quantity, date))
        .collect();
    candidates.sort_by(|a, b| rank(a, b));

    let selected = candidates.first().map(|s| (*s).clone());
    tracing::debug!(
        variant = %variant.id,
        quantity,
        seller = ?selected.as_ref().map(|s| s.id),
        "seller selected"
    );
    Ok(selected)
}

/// The break's unit price converted from the purchase unit into `uom`.
pub fn seller_price<S>(store: &S, variant: &ProductVariant, seller: &SupplierInfo, uom: UomId) -> DomainResult<f64>
where
    S: CatalogStore + ?Sized,
{
    let template = store.template(variant.template)?;
    if uom == template.uom_po {
        return Ok(seller.price);
    }
    compute_price(seller.price, &store.uom(template.uom_po)?, &store.uom(uom)?)
}
