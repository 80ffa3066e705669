//! CPU rasterizer implementing [`RenderBackend`].
//!
//! Renders into plain buffers with the same conventions as the GPU path:
//! right-handed clip space with depth in `[0, 1]`, pixel centres sampled at
//! `(x + 0.5, y + 0.5)`, row 0 at the top, and a `Less` depth test. Triangles
//! are clipped against the near plane, so geometry the camera is inside of
//! still covers the pixels it would on the GPU. Every call is also appended
//! to a call log for inspection.

use bubble_common::Extent;
use bubble_ecs::{Model, ShaderHandle};
use glam::{Mat4, Vec3, Vec4};
use std::collections::HashMap;

use crate::backend::{
    ClearValue, FrameUniforms, RenderBackend, RenderError, ShaderKind, ShaderReloader,
    ShaderSource, TargetKind,
};
use crate::mesh::MeshLibrary;
use crate::object_id::ObjectId;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    FrameUniforms,
    BeginPass { target: TargetKind, clear: ClearValue },
    SetObjectId { shader: ShaderHandle, id: ObjectId },
    Draw { target: TargetKind, shader: ShaderHandle },
    EndPass { target: TargetKind },
}

struct Attachments<T> {
    color: Vec<T>,
    depth: Vec<f32>,
    binds: u64,
}

impl<T: Copy> Attachments<T> {
    fn new(extent: Extent, initial: T) -> Self {
        Self {
            color: vec![initial; extent.pixel_count()],
            depth: vec![1.0; extent.pixel_count()],
            binds: 0,
        }
    }

    fn clear(&mut self, value: T) {
        self.color.fill(value);
        self.depth.fill(1.0);
    }
}

struct LoadedShader {
    source: ShaderSource,
    object_id: ObjectId,
}

pub struct SoftwareRenderer {
    extent: Extent,
    meshes: MeshLibrary,
    shaders: HashMap<ShaderHandle, LoadedShader>,
    next_shader: u32,
    uniforms: FrameUniforms,
    scene: Attachments<[f32; 4]>,
    pick: Attachments<u32>,
    active: Option<TargetKind>,
    calls: Vec<RenderCall>,
}

impl SoftwareRenderer {
    pub fn new(extent: Extent) -> Self {
        Self::with_meshes(extent, MeshLibrary::new())
    }

    pub fn with_meshes(extent: Extent, meshes: MeshLibrary) -> Self {
        Self {
            extent,
            meshes,
            shaders: HashMap::new(),
            next_shader: 0,
            uniforms: FrameUniforms::default(),
            scene: Attachments::new(extent, [0.0; 4]),
            pick: Attachments::new(extent, ObjectId::NONE.0),
            active: None,
            calls: Vec::new(),
        }
    }

    /// Pixel of the pick target. Out-of-range coordinates read as background.
    pub fn read_object_id(&self, x: u32, y: u32) -> ObjectId {
        if !self.extent.contains(x, y) {
            return ObjectId::NONE;
        }
        ObjectId(self.pick.color[self.index(x, y)])
    }

    /// Pixel of the scene target as linear RGBA.
    pub fn read_color(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        self.extent
            .contains(x, y)
            .then(|| self.scene.color[self.index(x, y)])
    }

    /// Raw object-id buffer, row-major from the top-left.
    pub fn object_ids(&self) -> &[u32] {
        &self.pick.color
    }

    /// Number of times `target` has been bound since construction.
    pub fn bind_count(&self, target: TargetKind) -> u64 {
        match target {
            TargetKind::Scene => self.scene.binds,
            TargetKind::Pick => self.pick.binds,
        }
    }

    pub fn calls(&self) -> &[RenderCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<RenderCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn shader_source(&self, shader: ShaderHandle) -> Option<&ShaderSource> {
        self.shaders.get(&shader).map(|s| &s.source)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.extent.width as usize + x as usize
    }

    fn to_screen(&self, clip: Vec4) -> Vec3 {
        let ndc = clip.truncate() / clip.w;
        Vec3::new(
            (ndc.x + 1.0) * 0.5 * self.extent.width as f32,
            (1.0 - ndc.y) * 0.5 * self.extent.height as f32,
            ndc.z,
        )
    }

    fn shader(&self, shader: ShaderHandle) -> Result<&LoadedShader, RenderError> {
        self.shaders
            .get(&shader)
            .ok_or(RenderError::UnknownShader(shader))
    }

    fn screen_triangles(
        &self,
        model: &Model,
        world: Mat4,
    ) -> Result<Vec<[Vec3; 3]>, RenderError> {
        let mesh = self
            .meshes
            .get(model.mesh)
            .ok_or(RenderError::UnknownMesh(model.mesh))?;
        let mvp = self.uniforms.view_projection() * world;
        let clip: Vec<Vec4> = mesh
            .vertices
            .iter()
            .map(|v| mvp * Vec3::from(v.position).extend(1.0))
            .collect();

        let mut screen = Vec::new();
        for t in mesh.triangles() {
            let polygon = clip_near(t.map(|i| clip[i]));
            for k in 1..polygon.len().saturating_sub(1) {
                let fan = [polygon[0], polygon[k], polygon[k + 1]];
                screen.push(fan.map(|v| self.to_screen(v)));
            }
        }
        Ok(screen)
    }
}

/// Clip a clip-space triangle against the near plane (`z >= 0`).
///
/// Returns the vertices of the remaining convex polygon: none, three or four.
fn clip_near(tri: [Vec4; 3]) -> Vec<Vec4> {
    let mut out = Vec::with_capacity(4);
    for i in 0..3 {
        let a = tri[i];
        let b = tri[(i + 1) % 3];
        let a_in = a.z >= 0.0;
        let b_in = b.z >= 0.0;
        if a_in {
            out.push(a);
        }
        if a_in != b_in {
            let mut v = a.lerp(b, a.z / (a.z - b.z));
            v.z = 0.0;
            out.push(v);
        }
    }
    out
}

/// Rasterize one screen-space triangle into `depth`, calling `write` for
/// every covered pixel that passes the `Less` depth test.
fn raster_triangle(
    extent: Extent,
    tri: [Vec3; 3],
    depth: &mut [f32],
    mut write: impl FnMut(usize),
) {
    let [a, b, c] = tri;
    let area = edge(a, b, c);
    if area.abs() <= f32::EPSILON {
        return;
    }

    let w = extent.width as f32;
    let h = extent.height as f32;
    let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as u32;
    let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as u32;
    let max_x = a.x.max(b.x).max(c.x).ceil().clamp(0.0, w) as u32;
    let max_y = a.y.max(b.y).max(c.y).ceil().clamp(0.0, h) as u32;

    for y in min_y..max_y {
        for x in min_x..max_x {
            let p = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, 0.0);
            let w0 = edge(b, c, p) / area;
            let w1 = edge(c, a, p) / area;
            let w2 = edge(a, b, p) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }
            let z = w0 * a.z + w1 * b.z + w2 * c.z;
            if !(0.0..=1.0).contains(&z) {
                continue;
            }
            let i = y as usize * extent.width as usize + x as usize;
            if z < depth[i] {
                depth[i] = z;
                write(i);
            }
        }
    }
}

/// Twice the signed area of (a, b, p) in screen space.
fn edge(a: Vec3, b: Vec3, p: Vec3) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

impl ShaderReloader for SoftwareRenderer {
    fn reload_shader(
        &mut self,
        shader: ShaderHandle,
        source: &ShaderSource,
    ) -> Result<(), RenderError> {
        let loaded = self
            .shaders
            .get_mut(&shader)
            .ok_or(RenderError::UnknownShader(shader))?;
        if loaded.source.kind != source.kind {
            return Err(RenderError::ShaderTargetMismatch {
                shader,
                shader_format: source.kind.format(),
                target_format: loaded.source.kind.format(),
            });
        }
        loaded.source = source.clone();
        Ok(())
    }
}

impl RenderBackend for SoftwareRenderer {
    fn extent(&self) -> Extent {
        self.extent
    }

    fn load_shader(&mut self, source: &ShaderSource) -> Result<ShaderHandle, RenderError> {
        let handle = ShaderHandle(self.next_shader);
        self.next_shader += 1;
        self.shaders.insert(
            handle,
            LoadedShader {
                source: source.clone(),
                object_id: ObjectId::NONE,
            },
        );
        tracing::debug!(label = %source.label, ?handle, "software shader loaded");
        Ok(handle)
    }

    fn set_frame_uniforms(&mut self, uniforms: &FrameUniforms) {
        self.uniforms = *uniforms;
        self.calls.push(RenderCall::FrameUniforms);
    }

    fn begin_pass(&mut self, target: TargetKind, clear: ClearValue) -> Result<(), RenderError> {
        if let Some(active) = self.active {
            return Err(RenderError::PassAlreadyActive(active));
        }
        match (target, clear) {
            (TargetKind::Scene, ClearValue::Color(color)) => {
                self.scene.clear(color);
                self.scene.binds += 1;
            }
            (TargetKind::Pick, ClearValue::ObjectId(id)) => {
                self.pick.clear(id.0);
                self.pick.binds += 1;
            }
            (target, clear) => {
                return Err(RenderError::ClearTargetMismatch {
                    target,
                    clear: clear.format(),
                });
            }
        }
        self.active = Some(target);
        self.calls.push(RenderCall::BeginPass { target, clear });
        Ok(())
    }

    fn set_object_id(&mut self, shader: ShaderHandle, id: ObjectId) -> Result<(), RenderError> {
        let loaded = self
            .shaders
            .get_mut(&shader)
            .ok_or(RenderError::UnknownShader(shader))?;
        if loaded.source.kind != ShaderKind::ObjectId {
            return Err(RenderError::NoObjectIdUniform(shader));
        }
        loaded.object_id = id;
        self.calls.push(RenderCall::SetObjectId { shader, id });
        Ok(())
    }

    fn draw_model(
        &mut self,
        model: &Model,
        world: Mat4,
        shader: ShaderHandle,
    ) -> Result<(), RenderError> {
        let target = self.active.ok_or(RenderError::NoActivePass)?;
        let loaded = self.shader(shader)?;
        let target_format = target.color_format();
        if loaded.source.kind.format() != target_format {
            return Err(RenderError::ShaderTargetMismatch {
                shader,
                shader_format: loaded.source.kind.format(),
                target_format,
            });
        }
        let object_id = loaded.object_id;
        let triangles = self.screen_triangles(model, world)?;

        let extent = self.extent;
        match target {
            TargetKind::Scene => {
                let Attachments { color, depth, .. } = &mut self.scene;
                for tri in triangles {
                    raster_triangle(extent, tri, depth, |i| color[i] = model.base_color);
                }
            }
            TargetKind::Pick => {
                let Attachments { color, depth, .. } = &mut self.pick;
                for tri in triangles {
                    raster_triangle(extent, tri, depth, |i| color[i] = object_id.0);
                }
            }
        }
        self.calls.push(RenderCall::Draw { target, shader });
        Ok(())
    }

    fn end_pass(&mut self) -> Result<(), RenderError> {
        let target = self.active.take().ok_or(RenderError::NoActivePass)?;
        self.calls.push(RenderCall::EndPass { target });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::FlyCamera;
    use crate::shaders;
    use bubble_ecs::MeshHandle;

    const EXTENT: Extent = Extent::new(800, 640);

    fn renderer() -> (SoftwareRenderer, ShaderHandle, ShaderHandle) {
        let mut r = SoftwareRenderer::new(EXTENT);
        let scene = r.load_shader(&shaders::scene()).unwrap();
        let pick = r.load_shader(&shaders::object_id()).unwrap();
        let cam = FlyCamera::looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, EXTENT.aspect());
        r.set_frame_uniforms(&FrameUniforms::new(cam.view_matrix(), cam.projection_matrix()));
        (r, scene, pick)
    }

    fn pick_cube(r: &mut SoftwareRenderer, pick: ShaderHandle, id: u32, at: Vec3) {
        r.set_object_id(pick, ObjectId(id)).unwrap();
        r.draw_model(
            &Model::new(MeshHandle::CUBE),
            Mat4::from_translation(at),
            pick,
        )
        .unwrap();
    }

    #[test]
    fn fresh_targets_are_background() {
        let r = SoftwareRenderer::new(EXTENT);
        assert!(r.object_ids().iter().all(|&id| id == 0));
        assert_eq!(r.bind_count(TargetKind::Scene), 0);
        assert_eq!(r.bind_count(TargetKind::Pick), 0);
    }

    #[test]
    fn cube_covers_centre_not_corner() {
        let (mut r, _, pick) = renderer();
        r.begin_pass(TargetKind::Pick, ClearValue::ObjectId(ObjectId::NONE))
            .unwrap();
        pick_cube(&mut r, pick, 7, Vec3::ZERO);
        r.end_pass().unwrap();

        assert_eq!(r.read_object_id(400, 320), ObjectId(7));
        assert_eq!(r.read_object_id(0, 0), ObjectId::NONE);
        assert_eq!(r.read_object_id(799, 639), ObjectId::NONE);
    }

    #[test]
    fn nearer_surface_wins_regardless_of_draw_order() {
        for near_first in [true, false] {
            let (mut r, _, pick) = renderer();
            r.begin_pass(TargetKind::Pick, ClearValue::ObjectId(ObjectId::NONE))
                .unwrap();
            let near = (3, Vec3::new(0.0, 0.0, 1.0));
            let far = (9, Vec3::new(0.0, 0.0, -1.0));
            let order = if near_first { [near, far] } else { [far, near] };
            for (id, at) in order {
                pick_cube(&mut r, pick, id, at);
            }
            r.end_pass().unwrap();
            assert_eq!(r.read_object_id(400, 320), ObjectId(3));
        }
    }

    #[test]
    fn scene_pass_writes_base_color_over_clear() {
        let (mut r, scene, _) = renderer();
        r.begin_pass(TargetKind::Scene, ClearValue::Color(crate::SCENE_CLEAR_COLOR))
            .unwrap();
        let red = [1.0, 0.0, 0.0, 1.0];
        r.draw_model(&Model::new(MeshHandle::CUBE).with_color(red), Mat4::IDENTITY, scene)
            .unwrap();
        r.end_pass().unwrap();
        assert_eq!(r.read_color(400, 320), Some(red));
        assert_eq!(r.read_color(0, 0), Some(crate::SCENE_CLEAR_COLOR));
    }

    #[test]
    fn clear_resets_previous_ids() {
        let (mut r, _, pick) = renderer();
        r.begin_pass(TargetKind::Pick, ClearValue::ObjectId(ObjectId::NONE))
            .unwrap();
        pick_cube(&mut r, pick, 5, Vec3::ZERO);
        r.end_pass().unwrap();
        r.begin_pass(TargetKind::Pick, ClearValue::ObjectId(ObjectId::NONE))
            .unwrap();
        r.end_pass().unwrap();
        assert!(r.object_ids().iter().all(|&id| id == 0));
        assert_eq!(r.bind_count(TargetKind::Pick), 2);
    }

    #[test]
    fn color_shader_rejected_on_pick_target() {
        let (mut r, scene, _) = renderer();
        r.begin_pass(TargetKind::Pick, ClearValue::ObjectId(ObjectId::NONE))
            .unwrap();
        let err = r
            .draw_model(&Model::new(MeshHandle::CUBE), Mat4::IDENTITY, scene)
            .unwrap_err();
        assert!(matches!(err, RenderError::ShaderTargetMismatch { .. }));
    }

    #[test]
    fn mismatched_clear_is_rejected() {
        let (mut r, _, _) = renderer();
        let err = r
            .begin_pass(TargetKind::Scene, ClearValue::ObjectId(ObjectId::NONE))
            .unwrap_err();
        assert!(matches!(err, RenderError::ClearTargetMismatch { .. }));
        assert_eq!(r.bind_count(TargetKind::Scene), 0);
    }

    #[test]
    fn draws_require_an_active_pass() {
        let (mut r, scene, _) = renderer();
        assert_eq!(
            r.draw_model(&Model::new(MeshHandle::CUBE), Mat4::IDENTITY, scene),
            Err(RenderError::NoActivePass)
        );
        assert_eq!(r.end_pass(), Err(RenderError::NoActivePass));
    }

    #[test]
    fn object_id_uniform_only_on_pick_shaders() {
        let (mut r, scene, _) = renderer();
        assert_eq!(
            r.set_object_id(scene, ObjectId(1)),
            Err(RenderError::NoObjectIdUniform(scene))
        );
    }

    #[test]
    fn unknown_shader_and_mesh() {
        let (mut r, scene, _) = renderer();
        r.begin_pass(TargetKind::Scene, ClearValue::Color([0.0; 4]))
            .unwrap();
        let ghost = ShaderHandle(99);
        assert_eq!(
            r.draw_model(&Model::new(MeshHandle::CUBE), Mat4::IDENTITY, ghost),
            Err(RenderError::UnknownShader(ghost))
        );
        assert_eq!(
            r.draw_model(&Model::new(MeshHandle(42)), Mat4::IDENTITY, scene),
            Err(RenderError::UnknownMesh(MeshHandle(42)))
        );
    }

    #[test]
    fn geometry_behind_camera_is_dropped() {
        let (mut r, _, pick) = renderer();
        r.begin_pass(TargetKind::Pick, ClearValue::ObjectId(ObjectId::NONE))
            .unwrap();
        pick_cube(&mut r, pick, 4, Vec3::new(0.0, 0.0, 10.0));
        r.end_pass().unwrap();
        assert!(r.object_ids().iter().all(|&id| id == 0));
    }

    #[test]
    fn faces_crossing_the_near_plane_are_clipped_not_dropped() {
        let (mut r, _, pick) = renderer();
        // Inside a 20-unit box, close to its +X wall and looking down -Z.
        let eye = Vec3::new(9.5, 0.0, 0.0);
        let cam = FlyCamera::looking_at(eye, eye + Vec3::NEG_Z, EXTENT.aspect());
        r.set_frame_uniforms(&FrameUniforms::new(cam.view_matrix(), cam.projection_matrix()));
        r.begin_pass(TargetKind::Pick, ClearValue::ObjectId(ObjectId::NONE))
            .unwrap();
        r.set_object_id(pick, ObjectId(6)).unwrap();
        r.draw_model(
            &Model::new(MeshHandle::CUBE),
            Mat4::from_scale(Vec3::splat(20.0)),
            pick,
        )
        .unwrap();
        r.end_pass().unwrap();

        // The +X wall spans the camera plane and fills the right edge.
        assert_eq!(r.read_object_id(799, 320), ObjectId(6));
        assert_eq!(r.read_object_id(400, 320), ObjectId(6));
    }

    #[test]
    fn clip_near_keeps_the_visible_part() {
        let inside = Vec4::new(0.0, 0.0, 0.5, 1.0);
        let behind = Vec4::new(0.0, 0.0, -0.5, 1.0);
        assert_eq!(clip_near([inside; 3]).len(), 3);
        assert!(clip_near([behind; 3]).is_empty());

        let quad = clip_near([inside, inside + Vec4::X, behind]);
        assert_eq!(quad.len(), 4);
        assert!(quad.iter().all(|v| v.z >= 0.0));
        let one_left = clip_near([inside, behind, behind + Vec4::X]);
        assert_eq!(one_left.len(), 3);
        assert!(one_left.iter().filter(|v| v.z == 0.0).count() == 2);
    }

    #[test]
    fn reload_keeps_kind() {
        let (mut r, scene, _) = renderer();
        let mut edited = shaders::scene();
        edited.wgsl.push_str("\n// edited");
        r.reload_shader(scene, &edited).unwrap();
        assert!(r.shader_source(scene).unwrap().wgsl.ends_with("// edited"));

        assert!(r.reload_shader(scene, &shaders::object_id()).is_err());
    }
}
