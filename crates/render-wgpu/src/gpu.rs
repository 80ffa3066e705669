use crate::readback::PickReader;
use crate::targets::{DEPTH_FORMAT, OBJECT_ID_FORMAT, RenderTargetPair, SCENE_COLOR_FORMAT};
use bubble_common::Extent;
use bubble_ecs::{MeshHandle, Model, ShaderHandle};
use bubble_render::{
    ClearValue, FrameUniforms, MeshLibrary, ObjectId, RenderBackend, RenderError, ShaderKind,
    ShaderReloader, ShaderSource, TargetKind,
};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use std::collections::BTreeMap;
use std::sync::Arc;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct GpuVertex {
    position: [f32; 3],
    normal: [f32; 3],
}

/// Per-draw record, bound as an instance-rate vertex buffer.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct DrawData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
    object_id: u32,
    _pad: [u32; 3],
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct GpuShader {
    kind: ShaderKind,
    pipeline: wgpu::RenderPipeline,
    object_id: ObjectId,
}

struct InstanceBuffer {
    buffer: wgpu::Buffer,
    capacity: usize,
}

struct PendingDraw {
    shader: ShaderHandle,
    mesh: MeshHandle,
    data: DrawData,
}

struct PendingPass {
    target: TargetKind,
    clear: ClearValue,
    draws: Vec<PendingDraw>,
}

const INITIAL_INSTANCES: usize = 1024;

/// wgpu implementation of [`RenderBackend`] rendering into offscreen targets.
pub struct WgpuSceneRenderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    targets: RenderTargetPair,
    pipeline_layout: wgpu::PipelineLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    meshes: BTreeMap<MeshHandle, GpuMesh>,
    shaders: BTreeMap<ShaderHandle, GpuShader>,
    next_shader: u32,
    instances: [InstanceBuffer; 2],
    pass: Option<PendingPass>,
}

impl WgpuSceneRenderer {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        extent: Extent,
        meshes: &MeshLibrary,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let meshes = meshes
            .iter()
            .map(|(handle, mesh)| {
                let vertices: Vec<GpuVertex> = mesh
                    .vertices
                    .iter()
                    .map(|v| GpuVertex {
                        position: v.position,
                        normal: v.normal,
                    })
                    .collect();
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("mesh_vertex_buffer"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("mesh_index_buffer"),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                let gpu = GpuMesh {
                    vertex_buffer,
                    index_buffer,
                    index_count: mesh.indices.len() as u32,
                };
                (handle, gpu)
            })
            .collect();

        let targets = RenderTargetPair::new(&device, extent);
        let instances = [
            create_instance_buffer(&device, INITIAL_INSTANCES),
            create_instance_buffer(&device, INITIAL_INSTANCES),
        ];
        tracing::info!(
            width = extent.width,
            height = extent.height,
            "wgpu scene renderer created"
        );

        Self {
            device,
            queue,
            targets,
            pipeline_layout,
            uniform_buffer,
            uniform_bind_group,
            meshes,
            shaders: BTreeMap::new(),
            next_shader: 0,
            instances,
            pass: None,
        }
    }

    pub fn targets(&self) -> &RenderTargetPair {
        &self.targets
    }

    /// Reader for the pick target, sharing this renderer's device and queue.
    pub fn pick_reader(&self) -> PickReader {
        PickReader::new(
            self.device.clone(),
            self.queue.clone(),
            self.targets.pick_texture(),
            self.targets.extent(),
        )
    }

    fn build_pipeline(&self, source: &ShaderSource) -> Result<wgpu::RenderPipeline, RenderError> {
        let (format, blend) = match source.kind {
            ShaderKind::Color => (SCENE_COLOR_FORMAT, Some(wgpu::BlendState::REPLACE)),
            // Integer targets cannot blend.
            ShaderKind::ObjectId => (OBJECT_ID_FORMAT, None),
        };

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&source.label),
                source: wgpu::ShaderSource::Wgsl(source.wgsl.as_str().into()),
            });
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&source.label),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[
                        wgpu::VertexBufferLayout {
                            array_stride: std::mem::size_of::<GpuVertex>() as u64,
                            step_mode: wgpu::VertexStepMode::Vertex,
                            attributes: &wgpu::vertex_attr_array![
                                0 => Float32x3,
                                1 => Float32x3,
                            ],
                        },
                        wgpu::VertexBufferLayout {
                            array_stride: std::mem::size_of::<DrawData>() as u64,
                            step_mode: wgpu::VertexStepMode::Instance,
                            attributes: &wgpu::vertex_attr_array![
                                2 => Float32x4,
                                3 => Float32x4,
                                4 => Float32x4,
                                5 => Float32x4,
                                6 => Float32x4,
                                7 => Uint32,
                            ],
                        },
                    ],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: Some(wgpu::Face::Back),
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            });

        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(RenderError::ShaderCompile {
                label: source.label.clone(),
                message: err.to_string(),
            }),
            None => Ok(pipeline),
        }
    }

    fn shader(&self, handle: ShaderHandle) -> Result<&GpuShader, RenderError> {
        self.shaders
            .get(&handle)
            .ok_or(RenderError::UnknownShader(handle))
    }

    fn encode_pass(&mut self, pass: PendingPass) {
        let data: Vec<DrawData> = pass.draws.iter().map(|d| d.data).collect();
        let slot = match pass.target {
            TargetKind::Scene => 0,
            TargetKind::Pick => 1,
        };
        if self.instances[slot].capacity < data.len() {
            let capacity = data.len().next_power_of_two();
            tracing::debug!(kind = ?pass.target, capacity, "growing instance buffer");
            self.instances[slot] = create_instance_buffer(&self.device, capacity);
        }
        if !data.is_empty() {
            self.queue.write_buffer(
                &self.instances[slot].buffer,
                0,
                bytemuck::cast_slice(&data),
            );
        }

        let target = self.targets.get(pass.target);
        let load = match pass.clear {
            ClearValue::Color([r, g, b, a]) => wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            },
            ClearValue::ObjectId(id) => wgpu::Color {
                r: id.0 as f64,
                g: 0.0,
                b: 0.0,
                a: 0.0,
            },
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(pass.target.label()),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(pass.target.label()),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(load),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            rpass.set_bind_group(0, &self.uniform_bind_group, &[]);
            rpass.set_vertex_buffer(1, self.instances[slot].buffer.slice(..));
            let mut bound: Option<ShaderHandle> = None;
            for (i, draw) in pass.draws.iter().enumerate() {
                // Both were validated when the draw was recorded.
                let (Some(shader), Some(mesh)) =
                    (self.shaders.get(&draw.shader), self.meshes.get(&draw.mesh))
                else {
                    continue;
                };
                if bound != Some(draw.shader) {
                    rpass.set_pipeline(&shader.pipeline);
                    bound = Some(draw.shader);
                }
                rpass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                rpass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                let instance = i as u32;
                rpass.draw_indexed(0..mesh.index_count, 0, instance..instance + 1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> InstanceBuffer {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("draw_instance_buffer"),
        size: (capacity * std::mem::size_of::<DrawData>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    InstanceBuffer { buffer, capacity }
}

impl ShaderReloader for WgpuSceneRenderer {
    fn reload_shader(
        &mut self,
        shader: ShaderHandle,
        source: &ShaderSource,
    ) -> Result<(), RenderError> {
        let kind = self.shader(shader)?.kind;
        if kind != source.kind {
            return Err(RenderError::ShaderTargetMismatch {
                shader,
                shader_format: source.kind.format(),
                target_format: kind.format(),
            });
        }
        let pipeline = self.build_pipeline(source)?;
        if let Some(loaded) = self.shaders.get_mut(&shader) {
            loaded.pipeline = pipeline;
        }
        tracing::info!(label = %source.label, ?shader, "shader pipeline rebuilt");
        Ok(())
    }
}

impl RenderBackend for WgpuSceneRenderer {
    fn extent(&self) -> Extent {
        self.targets.extent()
    }

    fn load_shader(&mut self, source: &ShaderSource) -> Result<ShaderHandle, RenderError> {
        let pipeline = self.build_pipeline(source)?;
        let handle = ShaderHandle(self.next_shader);
        self.next_shader += 1;
        self.shaders.insert(
            handle,
            GpuShader {
                kind: source.kind,
                pipeline,
                object_id: ObjectId::NONE,
            },
        );
        tracing::debug!(label = %source.label, ?handle, "shader pipeline created");
        Ok(handle)
    }

    fn set_frame_uniforms(&mut self, uniforms: &FrameUniforms) {
        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: uniforms.view_projection().to_cols_array_2d(),
            }),
        );
    }

    fn begin_pass(&mut self, target: TargetKind, clear: ClearValue) -> Result<(), RenderError> {
        if let Some(active) = &self.pass {
            return Err(RenderError::PassAlreadyActive(active.target));
        }
        if clear.format() != target.color_format() {
            return Err(RenderError::ClearTargetMismatch {
                target,
                clear: clear.format(),
            });
        }
        self.pass = Some(PendingPass {
            target,
            clear,
            draws: Vec::new(),
        });
        Ok(())
    }

    fn set_object_id(&mut self, shader: ShaderHandle, id: ObjectId) -> Result<(), RenderError> {
        let loaded = self
            .shaders
            .get_mut(&shader)
            .ok_or(RenderError::UnknownShader(shader))?;
        if loaded.kind != ShaderKind::ObjectId {
            return Err(RenderError::NoObjectIdUniform(shader));
        }
        loaded.object_id = id;
        Ok(())
    }

    fn draw_model(
        &mut self,
        model: &Model,
        world: Mat4,
        shader: ShaderHandle,
    ) -> Result<(), RenderError> {
        let loaded = self.shader(shader)?;
        if !self.meshes.contains_key(&model.mesh) {
            return Err(RenderError::UnknownMesh(model.mesh));
        }
        let object_id = loaded.object_id;
        let shader_format = loaded.kind.format();
        let pass = self.pass.as_mut().ok_or(RenderError::NoActivePass)?;
        let target_format = pass.target.color_format();
        if shader_format != target_format {
            return Err(RenderError::ShaderTargetMismatch {
                shader,
                shader_format,
                target_format,
            });
        }

        let cols = world.to_cols_array_2d();
        pass.draws.push(PendingDraw {
            shader,
            mesh: model.mesh,
            data: DrawData {
                model_0: cols[0],
                model_1: cols[1],
                model_2: cols[2],
                model_3: cols[3],
                color: model.base_color,
                object_id: object_id.0,
                _pad: [0; 3],
            },
        });
        Ok(())
    }

    fn end_pass(&mut self) -> Result<(), RenderError> {
        let pass = self.pass.take().ok_or(RenderError::NoActivePass)?;
        tracing::trace!(kind = ?pass.target, draws = pass.draws.len(), "submitting pass");
        self.encode_pass(pass);
        Ok(())
    }
}
