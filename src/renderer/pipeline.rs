//! wgpu surface and triangle pipeline
//!
//! Vertices stay in world units; a small uniform carries the world→clip scale so
//! a resize only rewrites the uniform.

use wgpu::util::DeviceExt;

use super::vertex::{Vertex, colors};
use crate::consts::{WINDOW_HEIGHT, WINDOW_WIDTH};

/// Vertices the first buffer can hold before it has to grow
const INITIAL_VERTEX_CAPACITY: usize = 8192;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct ViewUniform {
    scale: [f32; 2],
    // uniform bindings must be 16-byte sized on WebGL
    _pad: [f32; 2],
}

impl ViewUniform {
    fn for_size(size: (u32, u32)) -> Self {
        Self {
            scale: ndc_scale(size),
            _pad: [0.0; 2],
        }
    }
}

/// GPU side of the game view
pub struct RenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    view_buffer: wgpu::Buffer,
    view_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    /// Vertices `vertex_buffer` can hold
    vertex_capacity: usize,
    /// Surface size in physical pixels
    pub size: (u32, u32),
}

impl RenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Self {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("not-suika-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await
            .expect("Failed to create device");

        let caps = surface.get_capabilities(adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(caps.formats[0]);
        log::info!("Surface format {:?}", format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let view_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("view_uniform"),
            contents: bytemuck::bytes_of(&ViewUniform::for_size((config.width, config.height))),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let view_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("view_layout"),
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
        let view_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("view_bind_group"),
            layout: &view_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: view_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_layout"),
            bind_group_layouts: &[&view_layout],
            immediate_size: 0,
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene_pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let vertex_buffer = create_vertex_buffer(&device, INITIAL_VERTEX_CAPACITY);

        Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            view_buffer,
            view_bind_group,
            vertex_buffer,
            vertex_capacity: INITIAL_VERTEX_CAPACITY,
            size: (width, height),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = (width, height);
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        let view = ViewUniform::for_size(self.size);
        self.queue
            .write_buffer(&self.view_buffer, 0, bytemuck::bytes_of(&view));
    }

    /// Draw one frame of world-space triangles
    pub fn render(&mut self, vertices: &[Vertex]) -> Result<(), wgpu::SurfaceError> {
        if vertices.len() > self.vertex_capacity {
            self.vertex_capacity = vertices.len().next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.device, self.vertex_capacity);
            log::debug!("Vertex buffer grown to {}", self.vertex_capacity);
        }
        if !vertices.is_empty() {
            self.queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(vertices));
        }

        let frame = self.surface.get_current_texture()?;
        let target = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if !vertices.is_empty() {
                let bytes = (vertices.len() * std::mem::size_of::<Vertex>()) as wgpu::BufferAddress;
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.view_bind_group, &[]);
                pass.set_vertex_buffer(0, self.vertex_buffer.slice(..bytes));
                pass.draw(0..vertices.len() as u32, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

fn create_vertex_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("scene_vertices"),
        size: (capacity * std::mem::size_of::<Vertex>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn clear_color() -> wgpu::Color {
    let [r, g, b, a] = colors::BACKGROUND.map(f64::from);
    wgpu::Color { r, g, b, a }
}

/// World→clip scale for a surface of `size` pixels.
///
/// The world is the logical window centered on the origin with y down; the
/// surface is letterboxed to the window's aspect ratio. y is negated for clip space.
pub fn ndc_scale(size: (u32, u32)) -> [f32; 2] {
    let (w, h) = (size.0.max(1) as f32, size.1.max(1) as f32);
    let fit = (w / WINDOW_WIDTH).min(h / WINDOW_HEIGHT);
    [2.0 * fit / w, -2.0 * fit / h]
}

/// Clip-space position of a world point; what the vertex shader computes
pub fn world_to_ndc(size: (u32, u32), x: f32, y: f32) -> (f32, f32) {
    let [sx, sy] = ndc_scale(size);
    (x * sx, y * sy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_to_ndc_exact_fit() {
        let size = (800, 1200);
        assert_eq!(world_to_ndc(size, 0.0, 0.0), (0.0, 0.0));
        assert_eq!(world_to_ndc(size, 400.0, 600.0), (1.0, -1.0));
        assert_eq!(world_to_ndc(size, -400.0, -600.0), (-1.0, 1.0));
    }

    #[test]
    fn test_world_to_ndc_letterboxed() {
        // Twice as wide as needed: height decides, x is squeezed
        let (x, y) = world_to_ndc((1600, 1200), 400.0, 600.0);
        assert!((x - 0.5).abs() < 1e-6);
        assert!((y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ndc_scale_zero_size() {
        let [sx, sy] = ndc_scale((0, 0));
        assert!(sx.is_finite() && sy.is_finite());
    }

    #[test]
    fn test_view_uniform_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<ViewUniform>(), 16);
    }
}
