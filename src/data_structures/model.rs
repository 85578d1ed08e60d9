//! Models: geometry handles, materials and the textured models entities share.
//!
//! GPU buffers and textures live in the [`Loader`](crate::resources::Loader);
//! the types here only hold handles into it. That keeps models cheap to clone
//! and lets the batching and frame logic run without a device.

use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};

use anyhow::bail;

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Position-only vertex, used by the skybox cube.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PositionVertex {
    pub position: [f32; 3],
}

impl Vertex for PositionVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PositionVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

/// CPU-side mesh in separate attribute streams, ready to be interleaved and
/// uploaded by the loader.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Interleave the attribute streams. Fails when the streams disagree in
    /// length or an index points past the last vertex.
    pub fn vertices(&self) -> anyhow::Result<Vec<ModelVertex>> {
        let count = self.positions.len();
        if self.tex_coords.len() != count || self.normals.len() != count {
            bail!(
                "mesh attribute streams differ in length: {} positions, {} tex coords, {} normals",
                count,
                self.tex_coords.len(),
                self.normals.len()
            );
        }
        if let Some(index) = self.indices.iter().find(|&&i| i as usize >= count) {
            bail!("mesh index {} is out of bounds for {} vertices", index, count);
        }
        Ok(self
            .positions
            .iter()
            .zip(&self.tex_coords)
            .zip(&self.normals)
            .map(|((&position, &tex_coords), &normal)| ModelVertex {
                position,
                tex_coords,
                normal,
            })
            .collect())
    }
}

/// Handle to a mesh uploaded by the loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub usize);

/// Handle to a 2D texture or cube map uploaded by the loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// Geometry on the GPU: which mesh to bind and how many elements to draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawModel {
    pub mesh: MeshId,
    pub vertex_count: u32,
}

impl RawModel {
    pub fn new(mesh: MeshId, vertex_count: u32) -> Self {
        Self { mesh, vertex_count }
    }
}

/// Material of a model: its texture plus lighting parameters.
///
/// `number_of_rows` > 1 turns the texture into an atlas of
/// `number_of_rows * number_of_rows` cells that entities pick from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelTexture {
    pub texture: TextureId,
    pub shine_damper: f32,
    pub reflectivity: f32,
    /// Drawn without back-face culling, e.g. foliage or fences.
    pub has_transparency: bool,
    /// Lit as if every normal pointed straight up.
    pub use_fake_lighting: bool,
    pub number_of_rows: u32,
}

impl ModelTexture {
    pub fn new(texture: TextureId) -> Self {
        Self {
            texture,
            shine_damper: 1.0,
            reflectivity: 0.0,
            has_transparency: false,
            use_fake_lighting: false,
            number_of_rows: 1,
        }
    }

    pub fn with_specular(mut self, shine_damper: f32, reflectivity: f32) -> Self {
        self.shine_damper = shine_damper;
        self.reflectivity = reflectivity;
        self
    }

    pub fn with_transparency(mut self, has_transparency: bool) -> Self {
        self.has_transparency = has_transparency;
        self
    }

    pub fn with_fake_lighting(mut self, use_fake_lighting: bool) -> Self {
        self.use_fake_lighting = use_fake_lighting;
        self
    }

    pub fn with_atlas_rows(mut self, number_of_rows: u32) -> Self {
        self.number_of_rows = number_of_rows.max(1);
        self
    }
}

/// Identity of a [`TexturedModel`]; entities are batched by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(u32);

static NEXT_MODEL_ID: AtomicU32 = AtomicU32::new(0);

/// Geometry plus material, shared by every entity that looks the same.
///
/// Each call to [`TexturedModel::new`] creates a distinct identity, even for
/// the same mesh and texture, mirroring object identity: clone the `Arc` to
/// share a model between entities.
#[derive(Debug, PartialEq)]
pub struct TexturedModel {
    id: ModelId,
    pub raw: RawModel,
    pub texture: ModelTexture,
}

impl TexturedModel {
    pub fn new(raw: RawModel, texture: ModelTexture) -> Arc<Self> {
        let id = ModelId(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed));
        Arc::new(Self { id, raw, texture })
    }

    pub fn id(&self) -> ModelId {
        self.id
    }
}
