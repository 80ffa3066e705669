use bubble_common::Extent;
use bubble_render::{ObjectId, RenderError};
use std::sync::Arc;
use std::sync::mpsc;

/// Reads single pixels of the pick target back to the CPU.
///
/// Blocks until the copy completes, so it is meant for click handling, not
/// per-frame use.
pub struct PickReader {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    texture: Arc<wgpu::Texture>,
    staging: wgpu::Buffer,
    extent: Extent,
}

impl PickReader {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        texture: Arc<wgpu::Texture>,
        extent: Extent,
    ) -> Self {
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pick_staging"),
            size: wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Self {
            device,
            queue,
            texture,
            staging,
            extent,
        }
    }

    /// Object id at pixel `(x, y)` of the pick target. Outside the target
    /// reads as [`ObjectId::NONE`].
    pub fn read(&self, x: u32, y: u32) -> Result<ObjectId, RenderError> {
        if !self.extent.contains(x, y) {
            return Ok(ObjectId::NONE);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("pick_readback"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = self.staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| RenderError::Readback(e.to_string()))?
            .map_err(|e| RenderError::Readback(e.to_string()))?;

        let value = {
            let data = slice.get_mapped_range();
            bytemuck::pod_read_unaligned::<u32>(&data[..4])
        };
        self.staging.unmap();
        Ok(ObjectId(value))
    }
}
