use serde::{Deserialize, Serialize};

use catalog_core::{CategoryId, CompanyId, CurrencyCode, Entity, TemplateId, UomId};

use crate::attribute::AttributeLine;
use crate::seller::SupplierInfo;

/// A sellable product definition. Variants hang off it in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductTemplate {
    pub id: TemplateId,
    pub name: String,
    pub category: CategoryId,
    pub currency: CurrencyCode,
    #[serde(default)]
    pub company: Option<CompanyId>,
    /// Catalog sale price, per `uom`, in `currency`.
    pub list_price: f64,
    /// Cost, per `uom`, in `currency`.
    #[serde(default)]
    pub standard_price: f64,
    /// Default unit for sales and stock.
    pub uom: UomId,
    /// Unit vendors quote in; same category as `uom`.
    pub uom_po: UomId,
    #[serde(default)]
    pub attribute_lines: Vec<AttributeLine>,
    #[serde(default)]
    pub sellers: Vec<SupplierInfo>,
    #[serde(default = "yes")]
    pub sale_ok: bool,
    #[serde(default = "yes")]
    pub purchase_ok: bool,
    #[serde(default = "yes")]
    pub active: bool,
}

fn yes() -> bool {
    true
}

impl Entity for ProductTemplate {
    type Id = TemplateId;

    fn id(&self) -> TemplateId {
        self.id
    }
}

/// Input for creating a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTemplate {
    #[serde(default)]
    pub id: Option<TemplateId>,
    pub name: String,
    #[serde(default = "default_list_price")]
    pub list_price: f64,
    #[serde(default)]
    pub standard_price: Option<f64>,
    pub uom: UomId,
    /// Defaults to `uom`.
    #[serde(default)]
    pub uom_po: Option<UomId>,
    #[serde(default)]
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub attribute_lines: Vec<AttributeLine>,
    #[serde(default)]
    pub sellers: Vec<SupplierInfo>,
    /// Written to the variant when creation yields exactly one.
    #[serde(default)]
    pub barcode: Option<String>,
    /// Written to the variant when creation yields exactly one.
    #[serde(default)]
    pub default_code: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
}

fn default_list_price() -> f64 {
    1.0
}

impl NewTemplate {
    pub fn new(name: impl Into<String>, uom: UomId) -> Self {
        Self {
            id: None,
            name: name.into(),
            list_price: default_list_price(),
            standard_price: None,
            uom,
            uom_po: None,
            category: None,
            attribute_lines: Vec::new(),
            sellers: Vec::new(),
            barcode: None,
            default_code: None,
            weight: None,
            volume: None,
        }
    }

    pub fn with_list_price(mut self, price: f64) -> Self {
        self.list_price = price;
        self
    }

    pub fn with_standard_price(mut self, cost: f64) -> Self {
        self.standard_price = Some(cost);
        self
    }

    pub fn with_uom_po(mut self, uom_po: UomId) -> Self {
        self.uom_po = Some(uom_po);
        self
    }

    pub fn with_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_line(mut self, line: AttributeLine) -> Self {
        self.attribute_lines.push(line);
        self
    }

    pub fn with_seller(mut self, seller: SupplierInfo) -> Self {
        self.sellers.push(seller);
        self
    }

    pub fn with_default_code(mut self, code: impl Into<String>) -> Self {
        self.default_code = Some(code.into());
        self
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }
}

/// Partial update of a template. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub list_price: Option<f64>,
    /// Written to the only variant when the template has exactly one.
    pub standard_price: Option<f64>,
    /// Written to the only variant when the template has exactly one.
    pub default_code: Option<String>,
    /// Written to the only variant when the template has exactly one.
    pub weight: Option<f64>,
    /// Written to the only variant when the template has exactly one.
    pub volume: Option<f64>,
    pub uom: Option<UomId>,
    pub uom_po: Option<UomId>,
    pub category: Option<CategoryId>,
    pub attribute_lines: Option<Vec<AttributeLine>>,
    pub sellers: Option<Vec<SupplierInfo>>,
    pub sale_ok: Option<bool>,
    pub purchase_ok: Option<bool>,
    pub active: Option<bool>,
}

impl TemplatePatch {
    pub fn attribute_lines(lines: Vec<AttributeLine>) -> Self {
        Self {
            attribute_lines: Some(lines),
            ..Self::default()
        }
    }

    pub fn active(active: bool) -> Self {
        Self {
            active: Some(active),
            ..Self::default()
        }
    }

    /// Whether the patch carries values stored on the only variant.
    pub fn writes_through(&self) -> bool {
        self.standard_price.is_some() || self.default_code.is_some() || self.weight.is_some() || self.volume.is_some()
    }

    /// Whether applying this patch requires re-synchronizing variants.
    pub fn touches_variants(&self) -> bool {
        self.attribute_lines.is_some() || self.active == Some(true)
    }
}
