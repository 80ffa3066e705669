use crate::platform::WinitHandler;
use anyhow::{Context, bail};
use bubble_editor::{EditorConfig, EditorRequests, Window};
use bubble_input::InputState;
use std::sync::Arc;
use std::time::Duration;
use winit::dpi::PhysicalSize;
use winit::event_loop::EventLoop;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};

/// Upper bound on pumps spent waiting for the platform to create the window.
const STARTUP_PUMPS: u32 = 200;

struct GpuSurface {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
}

impl GpuSurface {
    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
    }

    fn acquire(&mut self) -> Option<wgpu::SurfaceTexture> {
        match self.surface.get_current_texture() {
            Ok(frame) => Some(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                self.surface.get_current_texture().ok()
            }
            Err(err) => {
                tracing::warn!(error = %err, "surface frame unavailable");
                None
            }
        }
    }
}

/// winit window with a wgpu surface and an egui layer.
///
/// Events are pumped without blocking so the frame orchestrator owns the
/// loop. The scene itself is rendered offscreen and shown by the UI as a
/// texture; this window only composites the UI and presents.
pub struct DesktopWindow {
    event_loop: EventLoop<()>,
    handler: WinitHandler,
    window: Arc<winit::window::Window>,
    gpu: GpuSurface,
    egui_ctx: egui::Context,
    egui_renderer: egui_wgpu::Renderer,
    background: wgpu::Color,
    frame: Option<wgpu::SurfaceTexture>,
    ui_open: bool,
    exited: bool,
}

impl DesktopWindow {
    pub fn new(config: &EditorConfig, requests: EditorRequests) -> anyhow::Result<Self> {
        let mut event_loop = EventLoop::new()?;
        let attributes = winit::window::Window::default_attributes()
            .with_title(config.window_title.clone())
            .with_inner_size(PhysicalSize::new(
                config.window_size.width,
                config.window_size.height,
            ));
        let mut handler = WinitHandler::new(attributes, requests);

        let mut pumps = 0;
        let window = loop {
            if let PumpStatus::Exit(code) =
                event_loop.pump_app_events(Some(Duration::from_millis(10)), &mut handler)
            {
                bail!("event loop exited during startup (code {code})");
            }
            if let Some(err) = handler.create_error.take() {
                bail!("creating window: {err}");
            }
            if let Some(window) = handler.window.clone() {
                break window;
            }
            pumps += 1;
            if pumps >= STARTUP_PUMPS {
                bail!("window was not created");
            }
        };

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("creating surface")?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("bubble_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("creating device")?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let egui_ctx = egui::Context::default();
        handler.egui = Some(egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        ));
        let egui_renderer = egui_wgpu::Renderer::new(&device, format, None, 1, false);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            ?format,
            "GPU initialized"
        );

        let [r, g, b, a] = config.background;
        Ok(Self {
            event_loop,
            handler,
            window,
            gpu: GpuSurface {
                surface,
                device: Arc::new(device),
                queue: Arc::new(queue),
                config: surface_config,
            },
            egui_ctx,
            egui_renderer,
            background: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            },
            frame: None,
            ui_open: false,
            exited: false,
        })
    }

    pub fn device(&self) -> Arc<wgpu::Device> {
        self.gpu.device.clone()
    }

    pub fn queue(&self) -> Arc<wgpu::Queue> {
        self.gpu.queue.clone()
    }

    pub fn egui_context(&self) -> egui::Context {
        self.egui_ctx.clone()
    }

    /// Make an offscreen color target drawable by egui.
    pub fn register_texture(&mut self, view: &wgpu::TextureView) -> egui::TextureId {
        self.egui_renderer
            .register_native_texture(&self.gpu.device, view, wgpu::FilterMode::Linear)
    }

    fn clear_frame(&self, view: &wgpu::TextureView) {
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("surface_clear"),
            });
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("surface_clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.background),
                    store: wgpu::StoreOp::Store,
                },
            })],
            ..Default::default()
        });
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
    }

    fn paint_ui(&mut self, output: egui::FullOutput, view: &wgpu::TextureView) {
        let device = &self.gpu.device;
        let queue = &self.gpu.queue;
        let paint_jobs = self
            .egui_ctx
            .tessellate(output.shapes, output.pixels_per_point);
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.config.width, self.gpu.config.height],
            pixels_per_point: output.pixels_per_point,
        };

        for (id, delta) in &output.textures_delta.set {
            self.egui_renderer.update_texture(device, queue, *id, delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        self.egui_renderer
            .update_buffers(device, queue, &mut encoder, &paint_jobs, &screen);
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.background),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer.render(&mut pass, &paint_jobs, &screen);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

impl Window for DesktopWindow {
    fn poll_events(&mut self) {
        self.handler.input.begin_frame();
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.handler);
        if let PumpStatus::Exit(code) = status {
            tracing::info!(code, "event loop exited");
            self.exited = true;
        }
        if let Some(size) = self.handler.resized.take() {
            // A configured surface may still hold last tick's frame.
            self.frame = None;
            self.gpu.resize(size);
            tracing::debug!(width = size.width, height = size.height, "surface resized");
        }
    }

    fn should_close(&self) -> bool {
        self.exited || self.handler.close_requested
    }

    fn input(&self) -> &InputState {
        &self.handler.input
    }

    fn bind_surface(&mut self) {
        if self.frame.is_none() {
            self.frame = self.gpu.acquire();
        }
    }

    fn ui_begin(&mut self) {
        let Some(egui) = self.handler.egui.as_mut() else {
            return;
        };
        let raw_input = egui.take_egui_input(&self.window);
        self.egui_ctx.begin_pass(raw_input);
        self.ui_open = true;
    }

    fn ui_end(&mut self) {
        if !std::mem::take(&mut self.ui_open) {
            return;
        }
        let mut output = self.egui_ctx.end_pass();
        if let Some(egui) = self.handler.egui.as_mut() {
            egui.handle_platform_output(&self.window, std::mem::take(&mut output.platform_output));
        }
        let Some(frame) = self.frame.take() else {
            return;
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.paint_ui(output, &view);
        self.frame = Some(frame);
    }

    fn on_update(&mut self) {
        // Running ticks never bind the surface; present a cleared frame.
        let frame = match self.frame.take() {
            Some(frame) => frame,
            None => {
                let Some(frame) = self.gpu.acquire() else {
                    return;
                };
                let view = frame
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                self.clear_frame(&view);
                frame
            }
        };
        self.window.pre_present_notify();
        frame.present();
    }
}
