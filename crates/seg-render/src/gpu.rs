//! wgpu renderer for vertex markers.
//!
//! A single instanced draw per frame: the shared unit circle is the vertex
//! buffer, `VertexInstance`s are the instance buffer, and `FrameUniforms`
//! carry the camera and the per-frame marker radius. The draw cost on the
//! CPU is one buffer upload, independent of polygon complexity.
//!
//! Device resources are created once and dropped on context loss; polygon
//! and camera state never live here, so `restore` only has to rebuild the
//! pipeline and buffers.

use crate::instances::{FrameUniforms, MarkerFrame, VertexInstance};
use wgpu::util::DeviceExt;

/// Triangles in the shared unit circle.
pub const CIRCLE_SEGMENTS: u32 = 24;

/// Instance buffer starts with room for this many markers.
const INITIAL_INSTANCE_CAPACITY: u64 = 1024;

const CIRCLE_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
const INSTANCE_ATTRS: [wgpu::VertexAttribute; 4] =
    wgpu::vertex_attr_array![1 => Float32x2, 2 => Float32, 3 => Uint32, 4 => Float32x4];

/// Unit circle as a triangle list (center, rim, rim).
pub fn unit_circle_vertices(segments: u32) -> Vec<[f32; 2]> {
    let segments = segments.max(3);
    let step = std::f32::consts::TAU / segments as f32;
    let mut out = Vec::with_capacity(segments as usize * 3);
    for i in 0..segments {
        let (a0, a1) = (i as f32 * step, (i + 1) as f32 * step);
        out.push([0.0, 0.0]);
        out.push([a0.cos(), a0.sin()]);
        out.push([a1.cos(), a1.sin()]);
    }
    out
}

/// Capacity (in instances) to allocate so `needed` fits, doubling from `current`.
pub fn grown_capacity(current: u64, needed: u64) -> u64 {
    let mut capacity = current.max(INITIAL_INSTANCE_CAPACITY);
    while capacity < needed {
        capacity *= 2;
    }
    capacity
}

struct GpuResources {
    pipeline: wgpu::RenderPipeline,
    circle: wgpu::Buffer,
    circle_vertices: u32,
    instances: wgpu::Buffer,
    instance_capacity: u64,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GpuResources {
    fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Vertex Marker Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/vertex_markers.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Vertex Marker Uniforms Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Vertex Marker Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Vertex Marker Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &CIRCLE_ATTRS,
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: VertexInstance::STRIDE_BYTES,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &INSTANCE_ATTRS,
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let circle_data = unit_circle_vertices(CIRCLE_SEGMENTS);
        let circle = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Unit Circle"),
            contents: bytemuck::cast_slice(&circle_data),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let instance_capacity = INITIAL_INSTANCE_CAPACITY;
        let instances = create_instance_buffer(device, instance_capacity);

        let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Marker Uniforms"),
            contents: bytemuck::bytes_of(&FrameUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Vertex Marker Uniforms"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });

        Self {
            pipeline,
            circle,
            circle_vertices: circle_data.len() as u32,
            instances,
            instance_capacity,
            uniforms,
            bind_group,
        }
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Vertex Marker Instances"),
        size: capacity * VertexInstance::STRIDE_BYTES,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Draws every marker of a `MarkerFrame` with one instanced draw call.
pub struct VertexMarkerRenderer {
    format: wgpu::TextureFormat,
    resources: Option<GpuResources>,
    instance_count: u32,
}

impl VertexMarkerRenderer {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        log::debug!("marker renderer: creating pipeline for {format:?}");
        Self {
            format,
            resources: Some(GpuResources::new(device, format)),
            instance_count: 0,
        }
    }

    /// `false` between a context loss and the matching `restore`.
    pub fn is_ready(&self) -> bool {
        self.resources.is_some()
    }

    /// Upload `frame`. Returns `false` (and uploads nothing) while the
    /// context is lost; callers then draw through the vector path.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, frame: &MarkerFrame) -> bool {
        let Some(res) = self.resources.as_mut() else {
            return false;
        };
        let needed = frame.instances.len() as u64;
        if needed > res.instance_capacity {
            res.instance_capacity = grown_capacity(res.instance_capacity, needed);
            res.instances = create_instance_buffer(device, res.instance_capacity);
            log::debug!("marker renderer: instance buffer grown to {}", res.instance_capacity);
        }
        queue.write_buffer(&res.uniforms, 0, bytemuck::bytes_of(&frame.uniforms));
        if !frame.instances.is_empty() {
            queue.write_buffer(&res.instances, 0, bytemuck::cast_slice(&frame.instances));
        }
        self.instance_count = frame.instances.len() as u32;
        true
    }

    /// Record the instanced draw into an open render pass.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(res) = self.resources.as_ref() else {
            return;
        };
        if self.instance_count == 0 {
            return;
        }
        pass.set_pipeline(&res.pipeline);
        pass.set_bind_group(0, &res.bind_group, &[]);
        pass.set_vertex_buffer(0, res.circle.slice(..));
        pass.set_vertex_buffer(1, res.instances.slice(..));
        pass.draw(0..res.circle_vertices, 0..self.instance_count);
    }

    /// Upload and draw on top of `view` (whatever the outline pass left there).
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        frame: &MarkerFrame,
    ) -> bool {
        if !self.prepare(device, queue, frame) {
            return false;
        }
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Vertex Marker Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        self.draw(&mut pass);
        true
    }

    /// Drop every device resource. Safe to call more than once.
    pub fn handle_context_lost(&mut self) {
        if self.resources.take().is_some() {
            log::warn!("marker renderer: GPU context lost, falling back to vector markers");
        }
        self.instance_count = 0;
    }

    /// Recreate pipeline and buffers on a fresh device.
    pub fn restore(&mut self, device: &wgpu::Device) {
        self.resources = Some(GpuResources::new(device, self.format));
        self.instance_count = 0;
        log::info!("marker renderer: GPU context restored");
    }
}
