//! Record access for the catalog, and an in-memory implementation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use catalog_core::{
    AttributeId, AttributeValueId, DomainError, DomainResult, Entity, TemplateId, UomId, VariantId,
};
use catalog_uom::Uom;

use crate::attribute::{Attribute, AttributeValue};
use crate::matrix::Signature;
use crate::template::ProductTemplate;
use crate::variant::ProductVariant;

/// One structural change to a template's variants.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantOp {
    /// Union pass-through values onto an existing variant.
    AddValues {
        variant: VariantId,
        values: Vec<AttributeValueId>,
    },
    Create(ProductVariant),
    Reactivate(VariantId),
    Deactivate(VariantId),
    Remove(VariantId),
}

/// Variant changes for one template, applied all-or-nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantBatch {
    pub template: TemplateId,
    pub ops: Vec<VariantOp>,
}

impl VariantBatch {
    pub fn new(template: TemplateId) -> Self {
        Self {
            template,
            ops: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Persistence collaborator for catalog records.
///
/// Implementations must apply a [`VariantBatch`] atomically: either every op
/// lands or none does.
pub trait CatalogStore: Send + Sync {
    fn uom(&self, id: UomId) -> DomainResult<Uom>;
    fn attribute(&self, id: AttributeId) -> DomainResult<Attribute>;
    fn attribute_value(&self, id: AttributeValueId) -> DomainResult<AttributeValue>;
    fn template(&self, id: TemplateId) -> DomainResult<ProductTemplate>;
    fn variant(&self, id: VariantId) -> DomainResult<ProductVariant>;

    /// Every variant of the template, active or not, in creation order.
    fn variants_of(&self, template: TemplateId) -> DomainResult<Vec<ProductVariant>>;

    /// Whether other records (order lines, stock moves...) point at the variant.
    fn is_referenced(&self, variant: VariantId) -> bool;

    /// Insert a new template; `Conflict` when the id is taken.
    fn insert_template(&self, template: ProductTemplate) -> DomainResult<()>;

    /// Overwrite an existing template; `NotFound` when absent.
    fn save_template(&self, template: ProductTemplate) -> DomainResult<()>;

    /// Overwrite an existing variant's fields; `NotFound` when absent.
    fn save_variant(&self, variant: ProductVariant) -> DomainResult<()>;

    fn apply_batch(&self, batch: &VariantBatch) -> DomainResult<()>;
}

impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    fn uom(&self, id: UomId) -> DomainResult<Uom> {
        (**self).uom(id)
    }

    fn attribute(&self, id: AttributeId) -> DomainResult<Attribute> {
        (**self).attribute(id)
    }

    fn attribute_value(&self, id: AttributeValueId) -> DomainResult<AttributeValue> {
        (**self).attribute_value(id)
    }

    fn template(&self, id: TemplateId) -> DomainResult<ProductTemplate> {
        (**self).template(id)
    }

    fn variant(&self, id: VariantId) -> DomainResult<ProductVariant> {
        (**self).variant(id)
    }

    fn variants_of(&self, template: TemplateId) -> DomainResult<Vec<ProductVariant>> {
        (**self).variants_of(template)
    }

    fn is_referenced(&self, variant: VariantId) -> bool {
        (**self).is_referenced(variant)
    }

    fn insert_template(&self, template: ProductTemplate) -> DomainResult<()> {
        (**self).insert_template(template)
    }

    fn save_template(&self, template: ProductTemplate) -> DomainResult<()> {
        (**self).save_template(template)
    }

    fn save_variant(&self, variant: ProductVariant) -> DomainResult<()> {
        (**self).save_variant(variant)
    }

    fn apply_batch(&self, batch: &VariantBatch) -> DomainResult<()> {
        (**self).apply_batch(batch)
    }
}

#[derive(Debug, Default)]
struct CatalogState {
    uoms: HashMap<UomId, Uom>,
    attributes: HashMap<AttributeId, Attribute>,
    values: HashMap<AttributeValueId, AttributeValue>,
    templates: HashMap<TemplateId, ProductTemplate>,
    variants: HashMap<TemplateId, Vec<ProductVariant>>,
    variant_index: HashMap<VariantId, TemplateId>,
    references: HashSet<VariantId>,
}

impl CatalogState {
    /// Active variants of a template must have distinct signatures and at most
    /// one value per attribute.
    fn check_variants(&self, variants: &[ProductVariant]) -> DomainResult<()> {
        let mut seen: HashSet<Signature> = HashSet::new();
        for variant in variants {
            let mut attributes = HashSet::new();
            let mut signature = Vec::new();
            for value_id in &variant.attribute_values {
                let value = self
                    .values
                    .get(value_id)
                    .ok_or_else(|| DomainError::not_found(format!("attribute value {value_id}")))?;
                if !attributes.insert(value.attribute) {
                    return Err(DomainError::invariant(format!(
                        "variant {} holds two values of attribute {}",
                        variant.id, value.attribute
                    )));
                }
                let generates = self.attributes.get(&value.attribute).is_some_and(|a| a.create_variant);
                if generates {
                    signature.push(*value_id);
                }
            }
            if variant.active && !seen.insert(signature.into_iter().collect()) {
                return Err(DomainError::invariant(format!(
                    "variant {} duplicates the signature of another active variant",
                    variant.id
                )));
            }
        }
        Ok(())
    }
}

/// In-memory catalog store for tests, benches and the CLI.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    inner: RwLock<CatalogState>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, CatalogState>> {
        self.inner
            .read()
            .map_err(|_| DomainError::invariant("catalog store lock poisoned"))
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, CatalogState>> {
        self.inner
            .write()
            .map_err(|_| DomainError::invariant("catalog store lock poisoned"))
    }

    pub fn insert_uom(&self, uom: Uom) -> DomainResult<UomId> {
        let id = uom.id();
        self.write()?.uoms.insert(id, uom);
        Ok(id)
    }

    pub fn insert_attribute(&self, attribute: Attribute) -> DomainResult<AttributeId> {
        let id = attribute.id;
        self.write()?.attributes.insert(id, attribute);
        Ok(id)
    }

    pub fn insert_attribute_value(&self, value: AttributeValue) -> DomainResult<AttributeValueId> {
        let mut state = self.write()?;
        if !state.attributes.contains_key(&value.attribute) {
            return Err(DomainError::not_found(format!("attribute {}", value.attribute)));
        }
        let id = value.id;
        state.values.insert(id, value);
        Ok(id)
    }

    /// Record that something outside the catalog points at `variant`, so it
    /// can only be deactivated, never removed.
    pub fn add_reference(&self, variant: VariantId) -> DomainResult<()> {
        self.write()?.references.insert(variant);
        Ok(())
    }

    pub fn templates(&self) -> DomainResult<Vec<ProductTemplate>> {
        Ok(self.read()?.templates.values().cloned().collect())
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn uom(&self, id: UomId) -> DomainResult<Uom> {
        self.read()?
            .uoms
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("unit of measure {id}")))
    }

    fn attribute(&self, id: AttributeId) -> DomainResult<Attribute> {
        self.read()?
            .attributes
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("attribute {id}")))
    }

    fn attribute_value(&self, id: AttributeValueId) -> DomainResult<AttributeValue> {
        self.read()?
            .values
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("attribute value {id}")))
    }

    fn template(&self, id: TemplateId) -> DomainResult<ProductTemplate> {
        self.read()?
            .templates
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("template {id}")))
    }

    fn variant(&self, id: VariantId) -> DomainResult<ProductVariant> {
        let state = self.read()?;
        state
            .variant_index
            .get(&id)
            .and_then(|t| state.variants.get(t))
            .and_then(|vs| vs.iter().find(|v| v.id == id))
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("variant {id}")))
    }

    fn variants_of(&self, template: TemplateId) -> DomainResult<Vec<ProductVariant>> {
        let state = self.read()?;
        if !state.templates.contains_key(&template) {
            return Err(DomainError::not_found(format!("template {template}")));
        }
        Ok(state.variants.get(&template).cloned().unwrap_or_default())
    }

    fn is_referenced(&self, variant: VariantId) -> bool {
        self.read().map(|s| s.references.contains(&variant)).unwrap_or(true)
    }

    fn insert_template(&self, template: ProductTemplate) -> DomainResult<()> {
        let mut state = self.write()?;
        if state.templates.contains_key(&template.id) {
            return Err(DomainError::conflict(format!("template {} already exists", template.id)));
        }
        state.templates.insert(template.id, template);
        Ok(())
    }

    fn save_template(&self, template: ProductTemplate) -> DomainResult<()> {
        let mut state = self.write()?;
        match state.templates.get_mut(&template.id) {
            Some(existing) => {
                *existing = template;
                Ok(())
            }
            None => Err(DomainError::not_found(format!("template {}", template.id))),
        }
    }

    fn save_variant(&self, variant: ProductVariant) -> DomainResult<()> {
        let mut state = self.write()?;
        let slot = state
            .variants
            .get_mut(&variant.template)
            .and_then(|vs| vs.iter_mut().find(|v| v.id == variant.id))
            .ok_or_else(|| DomainError::not_found(format!("variant {}", variant.id)))?;
        *slot = variant;
        Ok(())
    }

    fn apply_batch(&self, batch: &VariantBatch) -> DomainResult<()> {
        let mut state = self.write()?;
        if !state.templates.contains_key(&batch.template) {
            return Err(DomainError::not_found(format!("template {}", batch.template)));
        }

        // Stage on a copy; the live state is only touched once everything checks out.
        let mut staged = state.variants.get(&batch.template).cloned().unwrap_or_default();
        let mut created = Vec::new();
        let mut removed = Vec::new();

        for op in &batch.ops {
            match op {
                VariantOp::Create(variant) => {
                    if variant.template != batch.template {
                        return Err(DomainError::invariant(format!(
                            "variant {} belongs to another template",
                            variant.id
                        )));
                    }
                    if state.variant_index.contains_key(&variant.id) || created.contains(&variant.id) {
                        return Err(DomainError::conflict(format!("variant {} already exists", variant.id)));
                    }
                    created.push(variant.id);
                    staged.push(variant.clone());
                }
                VariantOp::Remove(id) => {
                    if state.references.contains(id) {
                        return Err(DomainError::conflict(format!(
                            "variant {id} is referenced and cannot be removed"
                        )));
                    }
                    let before = staged.len();
                    staged.retain(|v| v.id != *id);
                    if staged.len() == before {
                        return Err(DomainError::not_found(format!("variant {id}")));
                    }
                    removed.push(*id);
                }
                VariantOp::AddValues { variant, values } => {
                    staged_variant(&mut staged, *variant)?.attribute_values.extend(values.iter().copied());
                }
                VariantOp::Reactivate(id) => staged_variant(&mut staged, *id)?.active = true,
                VariantOp::Deactivate(id) => staged_variant(&mut staged, *id)?.active = false,
            }
        }

        state.check_variants(&staged)?;

        for id in removed {
            state.variant_index.remove(&id);
        }
        for id in created {
            state.variant_index.insert(id, batch.template);
        }
        state.variants.insert(batch.template, staged);
        Ok(())
    }
}

fn staged_variant(staged: &mut [ProductVariant], id: VariantId) -> DomainResult<&mut ProductVariant> {
    staged
        .iter_mut()
        .find(|v| v.id == id)
        .ok_or_else(|| DomainError::not_found(format!("variant {id}")))
}
