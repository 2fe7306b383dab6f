use serde::{Deserialize, Serialize};

use catalog_core::{AttributeId, AttributeLineId, AttributeValueId, Entity};

/// A named axis such as "Color" or "Size".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: AttributeId,
    pub name: String,
    /// When false the axis is informational and never splits a template into variants.
    #[serde(default = "default_create_variant")]
    pub create_variant: bool,
}

fn default_create_variant() -> bool {
    true
}

impl Attribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: AttributeId::new(),
            name: name.into(),
            create_variant: true,
        }
    }

    /// Informational attribute (no variant generation).
    pub fn informational(name: impl Into<String>) -> Self {
        Self {
            create_variant: false,
            ..Self::new(name)
        }
    }
}

impl Entity for Attribute {
    type Id = AttributeId;

    fn id(&self) -> AttributeId {
        self.id
    }
}

/// One value of an [`Attribute`] ("Red" for "Color").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub id: AttributeValueId,
    pub attribute: AttributeId,
    pub name: String,
}

impl AttributeValue {
    pub fn new(attribute: &Attribute, name: impl Into<String>) -> Self {
        Self {
            id: AttributeValueId::new(),
            attribute: attribute.id,
            name: name.into(),
        }
    }
}

impl Entity for AttributeValue {
    type Id = AttributeValueId;

    fn id(&self) -> AttributeValueId {
        self.id
    }
}

/// The values of one attribute selected for a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeLine {
    pub id: AttributeLineId,
    pub attribute: AttributeId,
    #[serde(default)]
    pub values: Vec<AttributeValueId>,
}

impl AttributeLine {
    pub fn new(attribute: &Attribute, values: impl IntoIterator<Item = AttributeValueId>) -> Self {
        Self {
            id: AttributeLineId::new(),
            attribute: attribute.id,
            values: values.into_iter().collect(),
        }
    }

    /// The single selected value, when exactly one is selected.
    pub fn single_value(&self) -> Option<AttributeValueId> {
        match self.values.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}
