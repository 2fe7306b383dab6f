//! Variant signatures and the cartesian matrix of attribute values.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use catalog_core::{AttributeValueId, ValueObject};

use crate::attribute::AttributeLine;

/// The set of variant-generating values identifying one variant.
///
/// Backed by an ordered set, so two signatures holding the same values are
/// equal and hash the same regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(BTreeSet<AttributeValueId>);

impl Signature {
    /// The signature of a template without variant-generating lines.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(&self, value: AttributeValueId) -> Self {
        let mut values = self.0.clone();
        values.insert(value);
        Self(values)
    }

    pub fn contains(&self, value: AttributeValueId) -> bool {
        self.0.contains(&value)
    }

    pub fn values(&self) -> impl Iterator<Item = AttributeValueId> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_values(self) -> BTreeSet<AttributeValueId> {
        self.0
    }
}

impl FromIterator<AttributeValueId> for Signature {
    fn from_iter<I: IntoIterator<Item = AttributeValueId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl ValueObject for Signature {}

/// Cartesian product of the value sets of `lines`, one value per line.
///
/// Callers pass only variant-generating lines. Output order follows line order
/// then value order. A line without values empties the product; no lines at
/// all yields the single empty signature.
pub fn build<'a>(lines: impl IntoIterator<Item = &'a AttributeLine>) -> Vec<Signature> {
    let mut matrix = vec![Signature::empty()];
    for line in lines {
        let mut seen = BTreeSet::new();
        let values: Vec<AttributeValueId> = line.values.iter().copied().filter(|v| seen.insert(*v)).collect();

        let mut next = Vec::with_capacity(matrix.len() * values.len());
        for signature in &matrix {
            for value in &values {
                next.push(signature.with(*value));
            }
        }
        matrix = next;
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{Attribute, AttributeValue};

    fn line(name: &str, n: usize) -> (AttributeLine, Vec<AttributeValueId>) {
        let attribute = Attribute::new(name);
        let values: Vec<AttributeValueId> = (0..n)
            .map(|i| AttributeValue::new(&attribute, format!("{name}-{i}")).id)
            .collect();
        (AttributeLine::new(&attribute, values.clone()), values)
    }

    #[test]
    fn no_lines_yield_one_empty_signature() {
        let matrix = build(std::iter::empty::<&AttributeLine>());
        assert_eq!(matrix, vec![Signature::empty()]);
    }

    #[test]
    fn empty_line_empties_the_matrix() {
        let (size, _) = line("Size", 3);
        let (color, _) = line("Color", 0);
        assert!(build([&size, &color]).is_empty());
    }

    #[test]
    fn two_by_three_matrix() {
        let (size, sizes) = line("Size", 3);
        let (color, colors) = line("Color", 2);
        let matrix = build([&size, &color]);
        assert_eq!(matrix.len(), 6);
        for s in &sizes {
            for c in &colors {
                let expected: Signature = [*s, *c].into_iter().collect();
                assert_eq!(matrix.iter().filter(|sig| **sig == expected).count(), 1);
            }
        }
    }

    #[test]
    fn duplicate_values_on_a_line_are_ignored() {
        let (mut size, sizes) = line("Size", 2);
        size.values.push(sizes[0]);
        assert_eq!(build([&size]).len(), 2);
    }

    #[test]
    fn signature_equality_ignores_order() {
        let (_, v) = line("Size", 3);
        let a: Signature = [v[0], v[1], v[2]].into_iter().collect();
        let b: Signature = [v[2], v[0], v[1]].into_iter().collect();
        assert_eq!(a, b);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: |matrix| is the product of the line sizes, with no duplicates.
            #[test]
            fn matrix_size_is_product_of_line_sizes(sizes in proptest::collection::vec(0usize..4, 0..4)) {
                let lines: Vec<AttributeLine> = sizes
                    .iter()
                    .enumerate()
                    .map(|(i, n)| line(&format!("A{i}"), *n).0)
                    .collect();
                let matrix = build(&lines);
                let expected: usize = sizes.iter().product();
                prop_assert_eq!(matrix.len(), expected);

                let unique: BTreeSet<&Signature> = matrix.iter().collect();
                prop_assert_eq!(unique.len(), matrix.len());
                for signature in &matrix {
                    prop_assert_eq!(signature.len(), lines.len());
                }
            }
        }
    }
}
