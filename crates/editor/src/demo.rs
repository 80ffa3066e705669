use bubble_ecs::{
    ComponentStore, EcsError, EntityId, MeshHandle, Model, Script, Shader, ShaderHandle, Transform,
};
use bubble_script::NativeScriptRunner;
use glam::Vec3;

/// Starter scene: three cubes, the first one scripted.
pub fn spawn_demo_scene(
    store: &mut ComponentStore,
    shader: ShaderHandle,
    scripts: &mut NativeScriptRunner,
) -> Result<Vec<EntityId>, EcsError> {
    let cubes = [
        (Vec3::ZERO, [0.8, 0.8, 0.8, 1.0]),
        (Vec3::new(3.0, 0.0, 0.0), [0.9, 0.2, 0.2, 1.0]),
        (Vec3::new(-3.0, 0.0, 3.0), [0.2, 0.4, 0.9, 1.0]),
    ];

    let mut spawned = Vec::with_capacity(cubes.len());
    for (position, color) in cubes {
        let entity = store.spawn()?;
        store.insert(entity, Transform::from_position(position))?;
        store.insert(entity, Model::new(MeshHandle::CUBE).with_color(color))?;
        store.insert(entity, Shader(shader))?;
        spawned.push(entity);
    }

    let mut beats = 0u64;
    let heartbeat = scripts.register(move |handle| {
        beats += 1;
        if beats % 600 == 0 {
            tracing::debug!(?handle, beats, "heartbeat script");
        }
        Ok(())
    });
    store.insert(spawned[0], Script(heartbeat))?;

    tracing::info!(entities = spawned.len(), "demo scene spawned");
    Ok(spawned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubble_ecs::{ComponentSet, EntityStore};

    #[test]
    fn demo_scene_is_renderable_and_scripted() {
        let mut store = ComponentStore::new();
        let mut scripts = NativeScriptRunner::new();
        let spawned = spawn_demo_scene(&mut store, ShaderHandle(0), &mut scripts).unwrap();

        assert_eq!(spawned.len(), 3);
        assert_eq!(store.view(crate::SCENE_VIEW).count(), 3);
        assert_eq!(store.view(ComponentSet::SCRIPT).count(), 1);
        assert_eq!(scripts.len(), 1);
    }
}
