//! `catalog-core`: shared building blocks for the product catalog crates.
//!
//! Identifiers, the error model, configuration and the entity/value-object
//! vocabulary. No storage, no IO beyond reading environment variables.

pub mod config;
pub mod entity;
pub mod error;
pub mod id;
pub mod validity;
pub mod value_object;

pub use config::{CatalogConfig, CatalogDefaults};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{
    AttributeId, AttributeLineId, AttributeValueId, CategoryId, CompanyId, PartnerId, PricelistId,
    PricelistItemId, SupplierInfoId, TemplateId, UomCategoryId, UomId, VariantId,
};
pub use validity::Validity;
pub use value_object::{CurrencyCode, ValueObject};
