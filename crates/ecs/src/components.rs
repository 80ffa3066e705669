use bitflags::bitflags;
use bubble_common::{EntityId, Transform};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::store::ComponentStore;

bitflags! {
    /// Closed set of component kinds, used both as an entity signature and
    /// as the filter of a view.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ComponentSet: u8 {
        const TRANSFORM = 1 << 0;
        const MODEL = 1 << 1;
        const SHADER = 1 << 2;
        const SCRIPT = 1 << 3;
    }
}

/// A handle referencing a mesh known to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshHandle(pub u32);

impl MeshHandle {
    /// Built-in unit cube centred on the origin.
    pub const CUBE: Self = Self(0);
}

/// A handle referencing a shader pipeline loaded by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShaderHandle(pub u32);

/// Opaque reference to a script instance owned by the script runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScriptHandle(pub u32);

/// Drawable geometry with its base color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub mesh: MeshHandle,
    pub base_color: [f32; 4],
}

impl Model {
    pub fn new(mesh: MeshHandle) -> Self {
        Self {
            mesh,
            base_color: [0.8, 0.8, 0.8, 1.0],
        }
    }

    pub fn with_color(mut self, base_color: [f32; 4]) -> Self {
        self.base_color = base_color;
        self
    }
}

/// Shader pipeline used to draw the entity in the scene pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shader(pub ShaderHandle);

/// Script attached to the entity, run once per editing tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script(pub ScriptHandle);

/// A component kind the store knows how to hold.
///
/// The set is closed: the four kinds below are the only implementors.
pub trait Component: Copy + 'static {
    const KIND: ComponentSet;
    const NAME: &'static str;

    #[doc(hidden)]
    fn storage(store: &ComponentStore) -> &BTreeMap<EntityId, Self>;
    #[doc(hidden)]
    fn storage_mut(store: &mut ComponentStore) -> &mut BTreeMap<EntityId, Self>;
}

macro_rules! impl_component {
    ($ty:ty, $kind:expr, $name:literal, $field:ident) => {
        impl Component for $ty {
            const KIND: ComponentSet = $kind;
            const NAME: &'static str = $name;

            fn storage(store: &ComponentStore) -> &BTreeMap<EntityId, Self> {
                &store.$field
            }

            fn storage_mut(store: &mut ComponentStore) -> &mut BTreeMap<EntityId, Self> {
                &mut store.$field
            }
        }
    };
}

impl_component!(Transform, ComponentSet::TRANSFORM, "Transform", transforms);
impl_component!(Model, ComponentSet::MODEL, "Model", models);
impl_component!(Shader, ComponentSet::SHADER, "Shader", shaders);
impl_component!(Script, ComponentSet::SCRIPT, "Script", scripts);
