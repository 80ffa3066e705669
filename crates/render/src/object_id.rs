//! Object-id encoding for the pick target.
//!
//! The pick attachment is a 32-bit unsigned integer, exactly the width of an
//! [`EntityId`], so every handle the store can allocate encodes without
//! truncation. `0` is the background sentinel and never a valid handle.

use bubble_common::EntityId;

/// Value written per pixel by the object-id pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// Background / untouched pixel.
    pub const NONE: Self = Self(0);

    /// Largest entity handle the pick attachment can hold.
    pub const MAX_HANDLE: u32 = u32::MAX;

    pub const fn from_entity(entity: EntityId) -> Self {
        Self(entity.get())
    }

    /// Interpret a read-back pixel. `None` means no entity covers it.
    pub const fn entity(self) -> Option<EntityId> {
        EntityId::new(self.0)
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl From<EntityId> for ObjectId {
    fn from(entity: EntityId) -> Self {
        Self::from_entity(entity)
    }
}
