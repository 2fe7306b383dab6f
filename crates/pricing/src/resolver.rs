//! Effective unit price of a product under a price list.

use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use catalog_core::{
    CatalogConfig, CurrencyCode, DomainError, DomainResult, PartnerId, PricelistId, TemplateId, UomId,
    VariantId,
};
use catalog_products::{CatalogStore, ProductTemplate, ProductVariant};
use catalog_uom::{compute_price, compute_quantity};

use crate::currency::CurrencyConverter;
use crate::pricelist::{ComputePrice, PriceBase, Pricelist, PricelistItem};
use crate::selector::select_rule;
use crate::store::PricelistStore;

/// Everything a price depends on.
///
/// Equal queries always resolve to the same price, so a query can key a
/// caller-side cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuery {
    pub pricelist: PricelistId,
    pub variant: VariantId,
    /// In `uom`, or in the product's default unit when `uom` is unset.
    pub quantity: f64,
    #[serde(default)]
    pub partner: Option<PartnerId>,
    pub date: NaiveDate,
    /// Unit the returned price is quoted per.
    #[serde(default)]
    pub uom: Option<UomId>,
    /// Currency of the returned price; the price list's when unset.
    #[serde(default)]
    pub currency: Option<CurrencyCode>,
}

impl PriceQuery {
    pub fn new(pricelist: PricelistId, variant: VariantId, quantity: f64, date: NaiveDate) -> Self {
        Self {
            pricelist,
            variant,
            quantity,
            partner: None,
            date,
            uom: None,
            currency: None,
        }
    }

    pub fn with_partner(mut self, partner: PartnerId) -> Self {
        self.partner = Some(partner);
        self
    }

    pub fn with_uom(mut self, uom: UomId) -> Self {
        self.uom = Some(uom);
        self
    }

    pub fn with_currency(mut self, currency: CurrencyCode) -> Self {
        self.currency = Some(currency);
        self
    }

    fn key(&self) -> impl Eq + Hash + '_ {
        (
            self.pricelist,
            self.variant,
            self.quantity.to_bits(),
            self.partner,
            self.date,
            self.uom,
            &self.currency,
        )
    }
}

impl PartialEq for PriceQuery {
    fn eq(&self, other: &Self) -> bool {
        self.pricelist == other.pricelist
            && self.variant == other.variant
            && self.quantity.to_bits() == other.quantity.to_bits()
            && self.partner == other.partner
            && self.date == other.date
            && self.uom == other.uom
            && self.currency == other.currency
    }
}

impl Eq for PriceQuery {}

impl Hash for PriceQuery {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

type Accessor = fn(&ProductVariant, &ProductTemplate) -> f64;

/// Product fields a rule base can read directly, in the template's unit and currency.
const FIELD_BASES: [(PriceBase, Accessor); 2] = [
    (PriceBase::ListPrice, ProductVariant::list_price),
    (PriceBase::StandardPrice, ProductVariant::cost),
];

fn field_accessor(base: PriceBase) -> Option<Accessor> {
    FIELD_BASES.iter().find(|(b, _)| *b == base).map(|(_, f)| *f)
}

/// Product and price list records loaded once per resolution step.
struct Context {
    pricelist: Pricelist,
    template: ProductTemplate,
    variant: ProductVariant,
}

/// Resolves prices against a catalog, its price lists and a currency converter.
#[derive(Debug)]
pub struct PriceResolver<C, P, X> {
    catalog: C,
    pricelists: P,
    currencies: X,
    config: CatalogConfig,
}

impl<C, P, X> PriceResolver<C, P, X>
where
    C: CatalogStore,
    P: PricelistStore,
    X: CurrencyConverter,
{
    pub fn new(catalog: C, pricelists: P, currencies: X) -> Self {
        Self::with_config(catalog, pricelists, currencies, CatalogConfig::default())
    }

    pub fn with_config(catalog: C, pricelists: P, currencies: X, config: CatalogConfig) -> Self {
        Self {
            catalog,
            pricelists,
            currencies,
            config,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn pricelists(&self) -> &P {
        &self.pricelists
    }

    /// Unit price of the query's variant, per the query's unit, in the query's
    /// currency.
    #[instrument(skip_all, fields(pricelist = %query.pricelist, variant = %query.variant, quantity = query.quantity))]
    pub fn get_product_price(&self, query: &PriceQuery) -> DomainResult<f64> {
        let mut chain = Vec::new();
        let (mut price, ctx) = self.resolve(query, &mut chain)?;
        if let Some(uom) = query.uom.filter(|u| *u != ctx.template.uom) {
            price = compute_price(price, &self.catalog.uom(ctx.template.uom)?, &self.catalog.uom(uom)?)?;
        }
        if let Some(currency) = query.currency.as_ref() {
            price = self.currencies.convert(price, &ctx.pricelist.currency, currency, query.date)?;
        }
        tracing::debug!(price, "price resolved");
        Ok(price)
    }

    /// Price per the product's default unit, in the price list's currency.
    fn resolve(&self, query: &PriceQuery, chain: &mut Vec<PricelistId>) -> DomainResult<(f64, Context)> {
        if chain.contains(&query.pricelist) || chain.len() >= self.config.max_pricelist_depth {
            return Err(DomainError::cyclic_pricelist(query.pricelist, chain.len()));
        }
        chain.push(query.pricelist);

        let variant = self.catalog.variant(query.variant)?;
        let ctx = Context {
            pricelist: self.pricelists.pricelist(query.pricelist)?,
            template: self.catalog.template(variant.template)?,
            variant,
        };

        let quantity = match query.uom.filter(|u| *u != ctx.template.uom) {
            Some(uom) => compute_quantity(query.quantity, &self.catalog.uom(uom)?, &self.catalog.uom(ctx.template.uom)?)?,
            None => query.quantity,
        };

        let price = match select_rule(&ctx.pricelist, &ctx.template, &ctx.variant, quantity, query.date) {
            None => {
                tracing::debug!(pricelist = %ctx.pricelist.id, "no rule applies, using list price");
                self.field_price(&ctx, PriceBase::ListPrice, query.date)?
            }
            Some(item) => {
                tracing::debug!(pricelist = %ctx.pricelist.id, item = %item.id, sequence = item.sequence, "rule selected");
                self.apply_rule(&ctx, item, query, quantity, chain)?
            }
        };

        chain.pop();
        Ok((price, ctx))
    }

    fn apply_rule(
        &self,
        ctx: &Context,
        item: &PricelistItem,
        query: &PriceQuery,
        quantity: f64,
        chain: &mut Vec<PricelistId>,
    ) -> DomainResult<f64> {
        match item.compute {
            ComputePrice::Fixed(price) => match item.uom.filter(|u| *u != ctx.template.uom) {
                Some(uom) => compute_price(price, &self.catalog.uom(uom)?, &self.catalog.uom(ctx.template.uom)?),
                None => Ok(price),
            },
            ComputePrice::Percentage(percent) => {
                let base = self.base_amount(ctx, item.base, query, quantity, chain)?;
                Ok(base * (1.0 - percent / 100.0))
            }
            ComputePrice::Formula(formula) => {
                let base = self.base_amount(ctx, item.base, query, quantity, chain)?;
                Ok(formula.apply(base))
            }
        }
    }

    fn base_amount(
        &self,
        ctx: &Context,
        base: PriceBase,
        query: &PriceQuery,
        quantity: f64,
        chain: &mut Vec<PricelistId>,
    ) -> DomainResult<f64> {
        let PriceBase::Pricelist(other) = base else {
            return self.field_price(ctx, base, query.date);
        };
        // Same product, quantity and date; price per default unit.
        let nested = PriceQuery {
            pricelist: other,
            quantity,
            uom: None,
            currency: None,
            ..query.clone()
        };
        let (price, inner) = self.resolve(&nested, chain)?;
        self.currencies
            .convert(price, &inner.pricelist.currency, &ctx.pricelist.currency, query.date)
    }

    /// A product field in the price list's currency.
    fn field_price(&self, ctx: &Context, base: PriceBase, date: NaiveDate) -> DomainResult<f64> {
        let accessor = field_accessor(base)
            .ok_or_else(|| DomainError::configuration(format!("{base:?} is not a product field")))?;
        let amount = accessor(&ctx.variant, &ctx.template);
        self.currencies
            .convert(amount, &ctx.template.currency, &ctx.pricelist.currency, date)
    }

    /// Price of the template's first active variant.
    ///
    /// A zero quantity counts as one. `None` when there is no price list, the
    /// price list does not exist, or the template has no active variant.
    pub fn template_price(
        &self,
        template: TemplateId,
        pricelist: Option<PricelistId>,
        partner: Option<PartnerId>,
        quantity: f64,
        date: NaiveDate,
    ) -> DomainResult<Option<f64>> {
        let Some(pricelist) = pricelist else {
            return Ok(None);
        };
        match self.pricelists.pricelist(pricelist) {
            Ok(_) => {}
            Err(DomainError::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err),
        }
        let Some(variant) = self.catalog.variants_of(template)?.into_iter().find(|v| v.active) else {
            return Ok(None);
        };

        let quantity = if quantity == 0.0 { 1.0 } else { quantity };
        let mut query = PriceQuery::new(pricelist, variant.id, quantity, date);
        query.partner = partner;
        self.get_product_price(&query).map(Some)
    }

    /// Read a product's list price or cost per `uom`, in `currency`.
    ///
    /// A price list base resolves that list for one unit.
    pub fn price_compute(
        &self,
        variant: VariantId,
        base: PriceBase,
        uom: Option<UomId>,
        currency: Option<&CurrencyCode>,
        date: NaiveDate,
    ) -> DomainResult<f64> {
        if let PriceBase::Pricelist(pricelist) = base {
            let mut query = PriceQuery::new(pricelist, variant, 1.0, date);
            query.uom = uom;
            query.currency = currency.cloned();
            return self.get_product_price(&query);
        }

        let variant = self.catalog.variant(variant)?;
        let template = self.catalog.template(variant.template)?;
        let accessor = field_accessor(base)
            .ok_or_else(|| DomainError::configuration(format!("{base:?} is not a product field")))?;
        let mut price = accessor(&variant, &template);
        if let Some(uom) = uom.filter(|u| *u != template.uom) {
            price = compute_price(price, &self.catalog.uom(template.uom)?, &self.catalog.uom(uom)?)?;
        }
        if let Some(currency) = currency {
            price = self.currencies.convert(price, &template.currency, currency, date)?;
        }
        Ok(price)
    }
}
