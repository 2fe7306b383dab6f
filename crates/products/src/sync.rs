//! Reconciles a template's variants with its attribute lines.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;
use tracing::instrument;

use catalog_core::{AttributeId, AttributeValueId, DomainResult, TemplateId, VariantId};

use crate::matrix::{self, Signature};
use crate::store::{CatalogStore, VariantBatch, VariantOp};
use crate::variant::ProductVariant;

/// What one synchronization pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub created: Vec<VariantId>,
    pub reactivated: Vec<VariantId>,
    pub deactivated: Vec<VariantId>,
    pub removed: Vec<VariantId>,
    /// Existing variants that received pass-through values.
    pub extended: Vec<VariantId>,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
            && self.reactivated.is_empty()
            && self.deactivated.is_empty()
            && self.removed.is_empty()
            && self.extended.is_empty()
    }
}

/// Resolves the attribute of each value seen, caching store lookups.
struct AttributeIndex<'s, S: ?Sized> {
    store: &'s S,
    generating: HashMap<AttributeId, bool>,
    owner: HashMap<AttributeValueId, AttributeId>,
}

impl<'s, S> AttributeIndex<'s, S>
where
    S: CatalogStore + ?Sized,
{
    fn new(store: &'s S) -> Self {
        Self {
            store,
            generating: HashMap::new(),
            owner: HashMap::new(),
        }
    }

    fn generates(&mut self, attribute: AttributeId) -> DomainResult<bool> {
        if let Some(flag) = self.generating.get(&attribute) {
            return Ok(*flag);
        }
        let flag = self.store.attribute(attribute)?.create_variant;
        self.generating.insert(attribute, flag);
        Ok(flag)
    }

    fn attribute_of(&mut self, value: AttributeValueId) -> DomainResult<AttributeId> {
        if let Some(attribute) = self.owner.get(&value) {
            return Ok(*attribute);
        }
        let attribute = self.store.attribute_value(value)?.attribute;
        self.owner.insert(value, attribute);
        Ok(attribute)
    }

    /// The variant-generating part of a value set.
    fn signature(&mut self, values: &BTreeSet<AttributeValueId>) -> DomainResult<Signature> {
        let mut signature = Signature::empty();
        for value in values {
            let attribute = self.attribute_of(*value)?;
            if self.generates(attribute)? {
                signature = signature.with(*value);
            }
        }
        Ok(signature)
    }

    fn holds_attribute(&mut self, values: &BTreeSet<AttributeValueId>, attribute: AttributeId) -> DomainResult<bool> {
        for value in values {
            if self.attribute_of(*value)? == attribute {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Bring the variants of `template` in line with its attribute lines.
///
/// The plan is computed from one snapshot of the template and its variants and
/// handed to the store as a single batch. Running it twice in a row is a no-op.
#[instrument(skip_all, fields(template = %template))]
pub fn synchronize_variants<S>(store: &S, template: TemplateId) -> DomainResult<SyncReport>
where
    S: CatalogStore + ?Sized,
{
    let tmpl = store.template(template)?;
    let mut variants = store.variants_of(template)?;
    let mut index = AttributeIndex::new(store);
    let mut batch = VariantBatch::new(template);
    let mut report = SyncReport::default();

    // Single-value lines: stamp the value on every variant missing that attribute.
    let pass_through: Vec<(AttributeId, AttributeValueId)> = tmpl
        .attribute_lines
        .iter()
        .filter_map(|line| line.single_value().map(|value| (line.attribute, value)))
        .collect();
    for variant in &mut variants {
        let mut added = Vec::new();
        for (attribute, value) in &pass_through {
            if !index.holds_attribute(&variant.attribute_values, *attribute)? {
                added.push(*value);
            }
        }
        if !added.is_empty() {
            variant.attribute_values.extend(added.iter().copied());
            report.extended.push(variant.id);
            batch.ops.push(VariantOp::AddValues {
                variant: variant.id,
                values: added,
            });
        }
    }

    let mut participating = Vec::new();
    for line in &tmpl.attribute_lines {
        if index.generates(line.attribute)? {
            participating.push(line);
        }
    }
    let desired = matrix::build(participating);
    let wanted: HashSet<&Signature> = desired.iter().collect();
    tracing::debug!(desired = desired.len(), existing = variants.len(), "variant matrix computed");

    // Active variants claim their signature first so that an inactive twin is
    // the one disposed of.
    variants.sort_by_key(|v| !v.active);
    let mut claimed: HashMap<Signature, VariantId> = HashMap::new();
    for variant in &variants {
        let signature = index.signature(&variant.attribute_values)?;
        if wanted.contains(&signature) && !claimed.contains_key(&signature) {
            if !variant.active && tmpl.active {
                batch.ops.push(VariantOp::Reactivate(variant.id));
                report.reactivated.push(variant.id);
            }
            claimed.insert(signature, variant.id);
            continue;
        }

        if let Some(kept) = claimed.get(&signature) {
            tracing::warn!(variant = %variant.id, kept = %kept, "duplicate variant signature");
        }
        if !store.is_referenced(variant.id) {
            batch.ops.push(VariantOp::Remove(variant.id));
            report.removed.push(variant.id);
        } else if variant.active {
            batch.ops.push(VariantOp::Deactivate(variant.id));
            report.deactivated.push(variant.id);
        }
    }

    for signature in desired {
        if claimed.contains_key(&signature) {
            continue;
        }
        let mut values: BTreeSet<AttributeValueId> = signature.values().collect();
        for (attribute, value) in &pass_through {
            if !index.holds_attribute(&values, *attribute)? {
                values.insert(*value);
            }
        }
        let mut variant = ProductVariant::new(template, values);
        variant.active = tmpl.active;
        report.created.push(variant.id);
        claimed.insert(signature, variant.id);
        batch.ops.push(VariantOp::Create(variant));
    }

    if batch.is_empty() {
        tracing::debug!("variants already in sync");
        return Ok(report);
    }

    store.apply_batch(&batch)?;
    tracing::info!(
        created = report.created.len(),
        reactivated = report.reactivated.len(),
        deactivated = report.deactivated.len(),
        removed = report.removed.len(),
        extended = report.extended.len(),
        "variants synchronized"
    );
    Ok(report)
}
