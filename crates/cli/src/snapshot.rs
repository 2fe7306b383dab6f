//! JSON catalog snapshots loaded into the in-memory stores.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use catalog_core::{CatalogConfig, PricelistId, TemplateId};
use catalog_pricing::{Company, InMemoryPricelistStore, PriceResolver, Pricelist, PricelistStore, StaticRates};
use catalog_products::{
    Attribute, AttributeValue, CatalogStore, InMemoryCatalogStore, ProductTemplate, ProductVariant, VariantBatch,
    VariantOp, synchronize_variants, validate_template,
};
use catalog_uom::Uom;

pub type Resolver = PriceResolver<Arc<InMemoryCatalogStore>, Arc<InMemoryPricelistStore>, StaticRates>;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Overrides the environment configuration when present.
    pub config: Option<CatalogConfig>,
    pub uoms: Vec<Uom>,
    pub attributes: Vec<Attribute>,
    pub attribute_values: Vec<AttributeValue>,
    pub templates: Vec<ProductTemplate>,
    /// Templates without listed variants get theirs generated on load.
    pub variants: Vec<ProductVariant>,
    pub pricelists: Vec<Pricelist>,
    pub main_pricelist: Option<PricelistId>,
    pub companies: Vec<Company>,
    pub rates: StaticRates,
}

impl Snapshot {
    pub fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse snapshot {}", path.display()))
    }

    /// Fill fresh stores and wire a resolver over them.
    pub fn load(self, fallback: CatalogConfig) -> Result<Resolver> {
        let catalog = Arc::new(InMemoryCatalogStore::new());
        let pricelists = Arc::new(InMemoryPricelistStore::new());

        for uom in self.uoms {
            catalog.insert_uom(uom)?;
        }
        for attribute in self.attributes {
            catalog.insert_attribute(attribute)?;
        }
        for value in self.attribute_values {
            let name = value.name.clone();
            catalog
                .insert_attribute_value(value)
                .with_context(|| format!("Attribute value '{name}'"))?;
        }

        let template_ids: Vec<TemplateId> = self.templates.iter().map(|t| t.id).collect();
        for mut template in self.templates {
            let name = template.name.clone();
            validate_template(&*catalog, &mut template)
                .and_then(|()| catalog.insert_template(template))
                .with_context(|| format!("Template '{name}'"))?;
        }

        let mut listed: HashMap<TemplateId, VariantBatch> = HashMap::new();
        for variant in self.variants {
            listed
                .entry(variant.template)
                .or_insert_with(|| VariantBatch::new(variant.template))
                .ops
                .push(VariantOp::Create(variant));
        }
        for id in template_ids {
            match listed.remove(&id) {
                Some(batch) => catalog.apply_batch(&batch).with_context(|| format!("Variants of template {id}"))?,
                None => {
                    synchronize_variants(&*catalog, id)?;
                }
            }
        }
        if let Some(orphan) = listed.keys().next() {
            anyhow::bail!("Variants reference unknown template {orphan}");
        }

        for pricelist in self.pricelists {
            let name = pricelist.name.clone();
            pricelists.insert_pricelist(pricelist).with_context(|| format!("Price list '{name}'"))?;
        }
        if let Some(main) = self.main_pricelist {
            pricelists.set_main_pricelist(main)?;
        }
        for company in self.companies {
            pricelists.insert_company(company)?;
        }

        tracing::info!(
            templates = catalog.templates()?.len(),
            pricelists = pricelists.pricelists()?.len(),
            "snapshot loaded"
        );
        let config = self.config.unwrap_or(fallback);
        Ok(PriceResolver::with_config(catalog, pricelists, self.rates, config))
    }
}
