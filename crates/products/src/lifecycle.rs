//! Creating, updating and copying templates.
//!
//! Every operation validates the template before writing it and keeps the
//! variants in sync with the attribute lines.

use std::collections::HashSet;

use tracing::instrument;

use catalog_core::{
    AttributeLineId, CatalogDefaults, DomainError, DomainResult, SupplierInfoId, TemplateId, UomId,
};
use catalog_uom::compute_price;

use crate::attribute::AttributeLine;
use crate::store::{CatalogStore, VariantBatch, VariantOp};
use crate::sync::{SyncReport, synchronize_variants};
use crate::template::{NewTemplate, ProductTemplate, TemplatePatch};
use crate::variant::{ProductVariant, display_name};

fn validate_units<S>(store: &S, template: &ProductTemplate) -> DomainResult<()>
where
    S: CatalogStore + ?Sized,
{
    let uom = store.uom(template.uom)?;
    let uom_po = store.uom(template.uom_po)?;
    if !uom.same_category(&uom_po) {
        return Err(DomainError::validation(
            "the default unit of measure and the purchase unit of measure must be in the same category",
        ));
    }
    Ok(())
}

/// Checks line attributes and values, and drops repeated values within a line.
fn normalize_lines<S>(store: &S, lines: &mut [AttributeLine]) -> DomainResult<()>
where
    S: CatalogStore + ?Sized,
{
    let mut attributes = HashSet::new();
    for line in lines.iter_mut() {
        let attribute = store.attribute(line.attribute)?;
        if !attributes.insert(attribute.id) {
            return Err(DomainError::validation(format!(
                "attribute '{}' appears on more than one line",
                attribute.name
            )));
        }
        let mut seen = HashSet::new();
        line.values.retain(|v| seen.insert(*v));
        for value_id in &line.values {
            let value = store.attribute_value(*value_id)?;
            if value.attribute != attribute.id {
                return Err(DomainError::validation(format!(
                    "value '{}' does not belong to attribute '{}'",
                    value.name, attribute.name
                )));
            }
        }
    }
    Ok(())
}

/// Check a template before it is written: a non-empty name, finite prices,
/// sale and purchase units of one category, and well-formed attribute lines.
///
/// Repeated values within a line are dropped.
pub fn validate_template<S>(store: &S, template: &mut ProductTemplate) -> DomainResult<()>
where
    S: CatalogStore + ?Sized,
{
    if template.name.trim().is_empty() {
        return Err(DomainError::validation("template name cannot be empty"));
    }
    if !template.list_price.is_finite() || !template.standard_price.is_finite() {
        return Err(DomainError::validation("template prices must be finite"));
    }
    validate_units(store, template)?;
    normalize_lines(store, &mut template.attribute_lines)
}

/// Variants currently visible for sale, in creation order.
fn active_variants<S>(store: &S, template: TemplateId) -> DomainResult<Vec<ProductVariant>>
where
    S: CatalogStore + ?Sized,
{
    Ok(store
        .variants_of(template)?
        .into_iter()
        .filter(|v| v.active)
        .collect())
}

fn only_variant<S>(store: &S, template: TemplateId) -> DomainResult<Option<ProductVariant>>
where
    S: CatalogStore + ?Sized,
{
    let mut variants = active_variants(store, template)?;
    Ok(if variants.len() == 1 { variants.pop() } else { None })
}

/// Create a template and its initial variants.
///
/// Barcode, internal reference, cost, weight and volume given on `new` land
/// on the variant when the template ends up with exactly one.
#[instrument(skip_all, fields(name = %new.name))]
pub fn create_template<S>(store: &S, new: NewTemplate, defaults: &CatalogDefaults) -> DomainResult<TemplateId>
where
    S: CatalogStore + ?Sized,
{
    let mut template = ProductTemplate {
        id: new.id.unwrap_or_default(),
        name: new.name,
        category: new.category.unwrap_or(defaults.category),
        currency: defaults.currency.clone(),
        company: defaults.company,
        list_price: new.list_price,
        standard_price: new.standard_price.unwrap_or_default(),
        uom: new.uom,
        uom_po: new.uom_po.unwrap_or(new.uom),
        attribute_lines: new.attribute_lines,
        sellers: new.sellers,
        sale_ok: true,
        purchase_ok: true,
        active: true,
    };
    validate_template(store, &mut template)?;
    let id = template.id;
    store.insert_template(template)?;
    let report = synchronize_variants(store, id)?;

    let writes_through = new.barcode.is_some()
        || new.default_code.is_some()
        || new.standard_price.is_some()
        || new.weight.is_some()
        || new.volume.is_some();
    if writes_through {
        if let Some(mut variant) = only_variant(store, id)? {
            variant.barcode = new.barcode.or(variant.barcode);
            variant.default_code = new.default_code.or(variant.default_code);
            variant.standard_price = new.standard_price.or(variant.standard_price);
            variant.weight = new.weight.unwrap_or(variant.weight);
            variant.volume = new.volume.unwrap_or(variant.volume);
            store.save_variant(variant)?;
        }
    }

    tracing::info!(template = %id, variants = report.created.len(), "template created");
    Ok(id)
}

/// Apply `patch` to a template.
///
/// Returns the synchronization report when the patch touched the attribute
/// lines or reactivated the template. If the variants cannot be brought in
/// line, the previous template is written back before the error returns.
#[instrument(skip_all, fields(template = %id))]
pub fn update_template<S>(store: &S, id: TemplateId, patch: TemplatePatch) -> DomainResult<Option<SyncReport>>
where
    S: CatalogStore + ?Sized,
{
    let previous = store.template(id)?;
    let mut template = previous.clone();
    let resync = patch.touches_variants();
    let writes_through = patch.writes_through();
    let deactivate = patch.active == Some(false);

    if let Some(name) = patch.name {
        template.name = name;
    }
    if let Some(price) = patch.list_price {
        template.list_price = price;
    }
    if let Some(cost) = patch.standard_price {
        template.standard_price = cost;
    }
    if let Some(uom) = patch.uom {
        template.uom = uom;
        // Keep the purchase unit aligned unless the patch sets it explicitly.
        if patch.uom_po.is_none() {
            template.uom_po = uom;
        }
    }
    if let Some(uom_po) = patch.uom_po {
        template.uom_po = uom_po;
    }
    if let Some(category) = patch.category {
        template.category = category;
    }
    if let Some(lines) = patch.attribute_lines {
        template.attribute_lines = lines;
    }
    if let Some(sellers) = patch.sellers {
        template.sellers = sellers;
    }
    if let Some(sale_ok) = patch.sale_ok {
        template.sale_ok = sale_ok;
    }
    if let Some(purchase_ok) = patch.purchase_ok {
        template.purchase_ok = purchase_ok;
    }
    if let Some(active) = patch.active {
        template.active = active;
    }

    validate_template(store, &mut template)?;
    store.save_template(template)?;

    let report = match reconcile_variants(store, id, resync, deactivate) {
        Ok(report) => report,
        Err(err) => {
            tracing::warn!(error = %err, "variants not reconciled, restoring template");
            store.save_template(previous)?;
            return Err(err);
        }
    };

    if writes_through {
        if let Some(mut variant) = only_variant(store, id)? {
            if patch.standard_price.is_some() {
                variant.standard_price = patch.standard_price;
            }
            if patch.default_code.is_some() {
                variant.default_code = patch.default_code;
            }
            if let Some(weight) = patch.weight {
                variant.weight = weight;
            }
            if let Some(volume) = patch.volume {
                variant.volume = volume;
            }
            store.save_variant(variant)?;
        }
    }
    Ok(report)
}

/// Bring the variants in line with a freshly saved template.
///
/// Each step is one batch; a failed batch leaves the variants untouched.
fn reconcile_variants<S>(store: &S, id: TemplateId, resync: bool, deactivate: bool) -> DomainResult<Option<SyncReport>>
where
    S: CatalogStore + ?Sized,
{
    let report = if resync { Some(synchronize_variants(store, id)?) } else { None };

    if deactivate {
        let mut batch = VariantBatch::new(id);
        for variant in store.variants_of(id)?.into_iter().filter(|v| v.active) {
            batch.ops.push(VariantOp::Deactivate(variant.id));
        }
        if !batch.is_empty() {
            store.apply_batch(&batch)?;
            tracing::info!(variants = batch.ops.len(), "template deactivated");
        }
    }
    Ok(report)
}

/// Duplicate a template under a new id and build the copy's variants.
///
/// The copy is named "<name> (Copy)" unless `name` is given.
#[instrument(skip_all, fields(template = %id))]
pub fn copy_template<S>(store: &S, id: TemplateId, name: Option<String>) -> DomainResult<TemplateId>
where
    S: CatalogStore + ?Sized,
{
    let source = store.template(id)?;
    let mut copy = source.clone();
    copy.id = TemplateId::new();
    copy.name = name.unwrap_or_else(|| format!("{} (Copy)", source.name));
    for line in &mut copy.attribute_lines {
        line.id = AttributeLineId::new();
    }
    for seller in &mut copy.sellers {
        seller.id = SupplierInfoId::new();
    }

    validate_template(store, &mut copy)?;
    let copy_id = copy.id;
    store.insert_template(copy)?;
    synchronize_variants(store, copy_id)?;
    Ok(copy_id)
}

/// The cost of the template's only variant, or `None` when it has several.
pub fn template_standard_price<S>(store: &S, id: TemplateId) -> DomainResult<Option<f64>>
where
    S: CatalogStore + ?Sized,
{
    let template = store.template(id)?;
    Ok(only_variant(store, id)?.map(|v| v.cost(&template)))
}

/// The internal reference of the template's only variant.
pub fn template_default_code<S>(store: &S, id: TemplateId) -> DomainResult<Option<String>>
where
    S: CatalogStore + ?Sized,
{
    Ok(only_variant(store, id)?.and_then(|v| v.default_code))
}

/// Weight of the template's only variant.
pub fn template_weight<S>(store: &S, id: TemplateId) -> DomainResult<Option<f64>>
where
    S: CatalogStore + ?Sized,
{
    Ok(only_variant(store, id)?.map(|v| v.weight))
}

/// Volume of the template's only variant.
pub fn template_volume<S>(store: &S, id: TemplateId) -> DomainResult<Option<f64>>
where
    S: CatalogStore + ?Sized,
{
    Ok(only_variant(store, id)?.map(|v| v.volume))
}

/// "[code] name" when the only variant carries an internal reference.
pub fn template_display_name<S>(store: &S, id: TemplateId) -> DomainResult<String>
where
    S: CatalogStore + ?Sized,
{
    let template = store.template(id)?;
    let code = template_default_code(store, id)?;
    Ok(display_name(&template.name, code.as_deref()))
}

/// Set the template's list price from a price expressed per `uom`.
pub fn set_template_price<S>(store: &S, id: TemplateId, price: f64, uom: Option<UomId>) -> DomainResult<()>
where
    S: CatalogStore + ?Sized,
{
    let mut template = store.template(id)?;
    template.list_price = match uom {
        Some(uom) if uom != template.uom => compute_price(price, &store.uom(uom)?, &store.uom(template.uom)?)?,
        _ => price,
    };
    store.save_template(template)
}
