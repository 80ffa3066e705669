use bubble_common::Extent;
use bubble_render::TargetKind;
use std::sync::Arc;

pub const SCENE_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
pub const OBJECT_ID_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Uint;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// One offscreen framebuffer: a color (or id) attachment plus depth.
pub struct OffscreenTarget {
    pub color: Arc<wgpu::Texture>,
    pub color_view: wgpu::TextureView,
    pub depth_view: wgpu::TextureView,
}

/// The scene and pick targets, both sized to the editor viewport.
pub struct RenderTargetPair {
    extent: Extent,
    scene: OffscreenTarget,
    pick: OffscreenTarget,
}

impl RenderTargetPair {
    pub fn new(device: &wgpu::Device, extent: Extent) -> Self {
        let scene = create_target(
            device,
            extent,
            TargetKind::Scene.label(),
            SCENE_COLOR_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let pick = create_target(
            device,
            extent,
            TargetKind::Pick.label(),
            OBJECT_ID_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        );
        Self {
            extent,
            scene,
            pick,
        }
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn get(&self, kind: TargetKind) -> &OffscreenTarget {
        match kind {
            TargetKind::Scene => &self.scene,
            TargetKind::Pick => &self.pick,
        }
    }

    /// View of the scene color attachment, for display in the UI.
    pub fn scene_view(&self) -> &wgpu::TextureView {
        &self.scene.color_view
    }

    pub fn pick_texture(&self) -> Arc<wgpu::Texture> {
        self.pick.color.clone()
    }
}

fn create_target(
    device: &wgpu::Device,
    extent: Extent,
    label: &str,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> OffscreenTarget {
    let size = wgpu::Extent3d {
        width: extent.width.max(1),
        height: extent.height.max(1),
        depth_or_array_layers: 1,
    };
    let color = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
    let depth = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(&format!("{label}_depth")),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth.create_view(&Default::default());
    OffscreenTarget {
        color: Arc::new(color),
        color_view,
        depth_view,
    }
}
