//! Entity trait: records that keep their identity while their fields change.

/// Catalog record with a stable identifier.
///
/// Stores key their maps by this identifier.
pub trait Entity {
    /// Strongly-typed record identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the record identifier.
    fn id(&self) -> Self::Id;
}
