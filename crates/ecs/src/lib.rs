//! Entity store with filtered views and typed component access.
//!
//! Each component kind has its own storage keyed by [`EntityId`]; every live
//! entity also carries a [`ComponentSet`] signature so that views can filter
//! without probing every storage.
//!
//! # Invariants
//! - Handles are allocated monotonically from 1 and never reused.
//! - A view yields exactly the live entities whose signature contains the
//!   requested set. Its order is not part of the contract.
//! - Component access on an entity lacking the component is an
//!   [`EcsError::MissingComponent`], never a panic.

mod components;
mod store;

pub use bubble_common::{EntityId, Transform};
pub use components::{
    Component, ComponentSet, MeshHandle, Model, Script, ScriptHandle, Shader, ShaderHandle,
};
pub use store::{ComponentStore, EntityStore};

/// Errors from entity store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    #[error("entity {entity} has no {kind} component")]
    MissingComponent { entity: EntityId, kind: &'static str },
    #[error("entity {0} does not exist")]
    UnknownEntity(EntityId),
    #[error("entity handle space exhausted")]
    HandlesExhausted,
}
