//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Catalog records have no surrogate key; their identity is the natural one
/// (a producer or product name).
pub trait Entity {
    /// Identifier type, borrowed from the record.
    type Id: ?Sized + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Linear-scan lookup by identity, the way the catalog resolves names.
pub fn find_by_id<'a, E>(items: &'a [E], id: &E::Id) -> Option<&'a E>
where
    E: Entity,
{
    items.iter().find(|item| item.id() == id)
}
