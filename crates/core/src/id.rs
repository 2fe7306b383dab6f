//! Strongly-typed identifiers for catalog records.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

uuid_id!(
    /// Product template (the sellable definition).
    TemplateId,
    "TemplateId"
);
uuid_id!(
    /// Concrete product variant of a template.
    VariantId,
    "VariantId"
);
uuid_id!(AttributeId, "AttributeId");
uuid_id!(AttributeValueId, "AttributeValueId");
uuid_id!(AttributeLineId, "AttributeLineId");
uuid_id!(
    /// Internal product category.
    CategoryId,
    "CategoryId"
);
uuid_id!(UomId, "UomId");
uuid_id!(UomCategoryId, "UomCategoryId");
uuid_id!(PricelistId, "PricelistId");
uuid_id!(PricelistItemId, "PricelistItemId");
uuid_id!(
    /// Customer or vendor.
    PartnerId,
    "PartnerId"
);
uuid_id!(CompanyId, "CompanyId");
uuid_id!(SupplierInfoId, "SupplierInfoId");
