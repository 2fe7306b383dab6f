use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use catalog_core::{AttributeValueId, Entity, TemplateId, VariantId};

use crate::template::ProductTemplate;

/// A concrete sellable unit of a template.
///
/// `attribute_values` holds the variant's signature plus any informational
/// values passed through from single-value lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: VariantId,
    pub template: TemplateId,
    #[serde(default)]
    pub attribute_values: BTreeSet<AttributeValueId>,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Overrides the template list price when set.
    #[serde(default)]
    pub lst_price: Option<f64>,
    /// Overrides the template cost when set.
    #[serde(default)]
    pub standard_price: Option<f64>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub default_code: Option<String>,
    /// Kilograms.
    #[serde(default)]
    pub weight: f64,
    /// Cubic meters.
    #[serde(default)]
    pub volume: f64,
}

fn default_active() -> bool {
    true
}

impl ProductVariant {
    pub fn new(template: TemplateId, attribute_values: impl IntoIterator<Item = AttributeValueId>) -> Self {
        Self {
            id: VariantId::new(),
            template,
            attribute_values: attribute_values.into_iter().collect(),
            active: true,
            lst_price: None,
            standard_price: None,
            barcode: None,
            default_code: None,
            weight: 0.0,
            volume: 0.0,
        }
    }

    /// Sale price in the template's unit and currency.
    pub fn list_price(&self, template: &ProductTemplate) -> f64 {
        self.lst_price.unwrap_or(template.list_price)
    }

    /// Cost in the template's unit and currency.
    pub fn cost(&self, template: &ProductTemplate) -> f64 {
        self.standard_price.unwrap_or(template.standard_price)
    }

    /// "[code] name", or just the template name without an internal reference.
    pub fn display_name(&self, template: &ProductTemplate) -> String {
        display_name(&template.name, self.default_code.as_deref())
    }
}

pub(crate) fn display_name(name: &str, code: Option<&str>) -> String {
    match code {
        Some(code) if !code.is_empty() => format!("[{code}] {name}"),
        _ => name.to_string(),
    }
}

impl Entity for ProductVariant {
    type Id = VariantId;

    fn id(&self) -> VariantId {
        self.id
    }
}
