//! Render pipelines and the sub-renderers that drive them.
//!
//! - `entity`: instanced, lit and fogged textured models
//! - `terrain`: blend mapped terrain tiles
//! - `skybox`: the cube map behind everything
//!
//! Face culling is part of a wgpu pipeline, so every renderer that has to
//! toggle it keeps a [`CullPipelines`] pair and picks one per draw.

pub mod entity;
pub mod skybox;
pub mod terrain;

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    depth_format: Option<wgpu::TextureFormat>,
    cull_mode: Option<wgpu::Face>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    shader: &wgpu::ShaderModule,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

/// Layout of a single uniform buffer visible to both shader stages.
pub fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
        label: Some(label),
    })
}

pub fn uniform_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
        label: Some(label),
    })
}

/// The same pipeline with back face culling on and off.
#[derive(Debug)]
pub struct CullPipelines {
    pub culled: wgpu::RenderPipeline,
    pub unculled: wgpu::RenderPipeline,
}

impl CullPipelines {
    pub fn new(mk: impl Fn(Option<wgpu::Face>) -> wgpu::RenderPipeline) -> Self {
        Self {
            culled: mk(Some(wgpu::Face::Back)),
            unculled: mk(None),
        }
    }

    pub fn select(&self, cull_mode: Option<wgpu::Face>) -> &wgpu::RenderPipeline {
        match cull_mode {
            Some(_) => &self.culled,
            None => &self.unculled,
        }
    }
}

/// Grow-only vertex buffer for per-frame instance data.
#[derive(Debug)]
pub(crate) struct InstanceBuffer {
    buffer: wgpu::Buffer,
    capacity: wgpu::BufferAddress,
    label: &'static str,
}

impl InstanceBuffer {
    const MIN_CAPACITY: wgpu::BufferAddress = 1024;

    pub fn new(device: &wgpu::Device, label: &'static str) -> Self {
        Self {
            buffer: Self::mk_buffer(device, Self::MIN_CAPACITY, label),
            capacity: Self::MIN_CAPACITY,
            label,
        }
    }

    fn mk_buffer(device: &wgpu::Device, size: wgpu::BufferAddress, label: &str) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Replace the contents with `data`, reallocating if it does not fit.
    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[u8]) {
        let size = data.len() as wgpu::BufferAddress;
        if size > self.capacity {
            self.capacity = size.next_power_of_two();
            log::debug!("growing {} to {} bytes", self.label, self.capacity);
            self.buffer = Self::mk_buffer(device, self.capacity, self.label);
        }
        if !data.is_empty() {
            queue.write_buffer(&self.buffer, 0, data);
        }
    }

    pub fn slice(&self) -> wgpu::BufferSlice<'_> {
        self.buffer.slice(..)
    }
}
