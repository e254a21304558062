//! Identity primitives.

use std::fmt::Debug;
use std::hash::Hash;

/// An object defined by its identity rather than its attributes.
///
/// Two entities of the same type are the same entity when their ids are
/// equal, whatever their other fields hold. Use [`entity_identity!`] to
/// derive `PartialEq`/`Eq` from [`Entity::id`].
///
/// [`entity_identity!`]: crate::entity_identity
pub trait Entity {
    type Id: Copy + Eq + Hash + Debug;

    fn id(&self) -> Self::Id;

    fn same_identity(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

/// Implements `PartialEq` and `Eq` for an [`Entity`] by comparing ids.
#[macro_export]
macro_rules! entity_identity {
    ($ty:ty) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                $crate::Entity::id(self) == $crate::Entity::id(other)
            }
        }

        impl Eq for $ty {}
    };
}
