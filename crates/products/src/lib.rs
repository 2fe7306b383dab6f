//! Product templates, their variants and vendor price breaks.
//!
//! This crate owns the variant matrix: building it from attribute lines and
//! reconciling stored variants against it. Storage sits behind
//! [`CatalogStore`]; [`InMemoryCatalogStore`] is the reference implementation.

pub mod attribute;
pub mod lifecycle;
pub mod matrix;
pub mod seller;
pub mod store;
pub mod sync;
pub mod template;
pub mod variant;

pub use attribute::{Attribute, AttributeLine, AttributeValue};
pub use lifecycle::{
    copy_template, create_template, set_template_price, template_default_code, template_display_name,
    template_standard_price, template_volume, template_weight, update_template, validate_template,
};
pub use matrix::Signature;
pub use seller::{SupplierInfo, select_seller, seller_price};
pub use store::{CatalogStore, InMemoryCatalogStore, VariantBatch, VariantOp};
pub use sync::{SyncReport, synchronize_variants};
pub use template::{NewTemplate, ProductTemplate, TemplatePatch};
pub use variant::ProductVariant;
