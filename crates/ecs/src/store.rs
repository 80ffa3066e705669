use bubble_common::{EntityId, Transform};
use std::collections::BTreeMap;

use crate::EcsError;
use crate::components::{Component, ComponentSet, Model, Script, Shader};

/// Read-side contract the frame orchestrator consumes.
///
/// Views are lazy, finite and restartable: calling [`EntityStore::view`]
/// again starts a fresh pass over the current entity set.
pub trait EntityStore {
    /// Entities carrying every kind in `required`, in unspecified order.
    fn view(&self, required: ComponentSet) -> impl Iterator<Item = EntityId> + '_;

    /// Typed access to one component of `entity`.
    fn get<C: Component>(&self, entity: EntityId) -> Result<&C, EcsError>;

    fn has<C: Component>(&self, entity: EntityId) -> bool {
        self.get::<C>(entity).is_ok()
    }
}

/// Component storage for all component kinds.
///
/// Signatures and handle allocation are only changed through the methods
/// below, which keep them consistent with the storage maps.
#[derive(Debug, Clone, Default)]
pub struct ComponentStore {
    /// Last handle handed out; 0 means none yet.
    last_handle: u32,
    signatures: BTreeMap<EntityId, ComponentSet>,
    pub(crate) transforms: BTreeMap<EntityId, Transform>,
    pub(crate) models: BTreeMap<EntityId, Model>,
    pub(crate) shaders: BTreeMap<EntityId, Shader>,
    pub(crate) scripts: BTreeMap<EntityId, Script>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.signatures.contains_key(&entity)
    }

    /// Kinds currently attached to `entity`.
    pub fn signature(&self, entity: EntityId) -> Option<ComponentSet> {
        self.signatures.get(&entity).copied()
    }

    /// Create an entity with no components.
    pub fn spawn(&mut self) -> Result<EntityId, EcsError> {
        let raw = self
            .last_handle
            .checked_add(1)
            .ok_or(EcsError::HandlesExhausted)?;
        let id = EntityId::new(raw).ok_or(EcsError::HandlesExhausted)?;
        self.last_handle = raw;
        self.signatures.insert(id, ComponentSet::empty());
        tracing::trace!(%id, "spawned entity");
        Ok(id)
    }

    /// Remove an entity and all of its components.
    pub fn despawn(&mut self, entity: EntityId) -> Result<(), EcsError> {
        self.signatures
            .remove(&entity)
            .ok_or(EcsError::UnknownEntity(entity))?;
        self.transforms.remove(&entity);
        self.models.remove(&entity);
        self.shaders.remove(&entity);
        self.scripts.remove(&entity);
        tracing::trace!(%entity, "despawned entity");
        Ok(())
    }

    /// Attach or replace a component. Returns the previous value, if any.
    pub fn insert<C: Component>(
        &mut self,
        entity: EntityId,
        component: C,
    ) -> Result<Option<C>, EcsError> {
        let signature = self
            .signatures
            .get_mut(&entity)
            .ok_or(EcsError::UnknownEntity(entity))?;
        signature.insert(C::KIND);
        Ok(C::storage_mut(self).insert(entity, component))
    }

    /// Detach a component. Returns it if it was present.
    pub fn remove<C: Component>(&mut self, entity: EntityId) -> Result<Option<C>, EcsError> {
        let signature = self
            .signatures
            .get_mut(&entity)
            .ok_or(EcsError::UnknownEntity(entity))?;
        signature.remove(C::KIND);
        Ok(C::storage_mut(self).remove(&entity))
    }

    pub fn get_mut<C: Component>(&mut self, entity: EntityId) -> Result<&mut C, EcsError> {
        C::storage_mut(self)
            .get_mut(&entity)
            .ok_or(EcsError::MissingComponent {
                entity,
                kind: C::NAME,
            })
    }
}

impl EntityStore for ComponentStore {
    fn view(&self, required: ComponentSet) -> impl Iterator<Item = EntityId> + '_ {
        self.signatures
            .iter()
            .filter(move |(_, signature)| signature.contains(required))
            .map(|(id, _)| *id)
    }

    fn get<C: Component>(&self, entity: EntityId) -> Result<&C, EcsError> {
        C::storage(self)
            .get(&entity)
            .ok_or(EcsError::MissingComponent {
                entity,
                kind: C::NAME,
            })
    }
}
