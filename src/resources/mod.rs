//! Loading meshes and textures onto the GPU.
//!
//! The [`Loader`] owns every buffer and texture it uploads and hands out
//! plain handles ([`MeshId`], [`TextureId`]) in return. Models and terrains
//! only carry those handles, so scene data stays cheap to clone and the
//! renderers look the GPU resources up when they draw. Everything is released
//! when the loader is dropped.

use anyhow::{Context as _, bail};
use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        model::{MeshData, MeshId, RawModel, TextureId},
        texture::Texture,
    },
};

pub mod mesh;
pub mod texture;

/// Vertex (and optional index) buffers of one uploaded mesh.
#[derive(Debug)]
pub struct GpuMesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: Option<wgpu::Buffer>,
    /// Indices to draw, or vertices for meshes without an index buffer.
    pub num_elements: u32,
}

impl GpuMesh {
    /// Record an instanced draw of the whole mesh. Vertex slot 0 is bound
    /// here; instance data must already be bound by the caller.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, instances: std::ops::Range<u32>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        match &self.index_buffer {
            Some(index_buffer) => {
                render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..self.num_elements, 0, instances);
            }
            None => render_pass.draw(0..self.num_elements, instances),
        }
    }
}

/// A texture together with the bind group the renderers sample it through.
#[derive(Debug)]
pub struct LoadedTexture {
    pub texture: Texture,
    pub bind_group: wgpu::BindGroup,
}

#[derive(Debug)]
pub struct Loader {
    meshes: Vec<GpuMesh>,
    textures: Vec<LoadedTexture>,
    texture_layout: wgpu::BindGroupLayout,
    cube_layout: wgpu::BindGroupLayout,
}

impl Loader {
    pub fn new(ctx: &Context) -> Self {
        Self {
            meshes: Vec::new(),
            textures: Vec::new(),
            texture_layout: texture::diffuse_layout(&ctx.device),
            cube_layout: texture::cube_layout(&ctx.device),
        }
    }

    /// Layout of the bind groups of 2D textures.
    pub fn texture_layout(&self) -> &wgpu::BindGroupLayout {
        &self.texture_layout
    }

    /// Layout of the bind groups of cube maps.
    pub fn cube_layout(&self) -> &wgpu::BindGroupLayout {
        &self.cube_layout
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn mesh(&self, id: MeshId) -> anyhow::Result<&GpuMesh> {
        self.meshes
            .get(id.0)
            .with_context(|| format!("mesh {:?} was not loaded by this loader", id))
    }

    pub fn texture(&self, id: TextureId) -> anyhow::Result<&LoadedTexture> {
        self.textures
            .get(id.0)
            .with_context(|| format!("texture {:?} was not loaded by this loader", id))
    }

    /// Upload an indexed mesh.
    pub fn load_mesh(&mut self, ctx: &Context, mesh: &MeshData, label: &str) -> anyhow::Result<RawModel> {
        let vertices = mesh
            .vertices()
            .with_context(|| format!("invalid mesh {}", label))?;
        if mesh.indices.is_empty() {
            bail!("mesh {} has no triangles", label);
        }
        let vertex_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Vertex Buffer", label)),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Index Buffer", label)),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        let num_elements = mesh.indices.len() as u32;
        Ok(self.push_mesh(GpuMesh {
            name: label.to_string(),
            vertex_buffer,
            index_buffer: Some(index_buffer),
            num_elements,
        }))
    }

    /// Upload bare positions drawn as a triangle list, as used by the skybox.
    pub fn load_positions(&mut self, ctx: &Context, positions: &[[f32; 3]], label: &str) -> RawModel {
        let vertex_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Vertex Buffer", label)),
                contents: bytemuck::cast_slice(positions),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.push_mesh(GpuMesh {
            name: label.to_string(),
            vertex_buffer,
            index_buffer: None,
            num_elements: positions.len() as u32,
        })
    }

    /// Load every object of an OBJ file from the assets and upload them as
    /// one mesh.
    pub async fn load_obj(&mut self, ctx: &Context, file_name: &str) -> anyhow::Result<RawModel> {
        let meshes = mesh::load_obj_meshes(file_name)
            .await
            .with_context(|| format!("could not read {}", file_name))?;
        self.load_mesh(ctx, &merge_meshes(meshes), file_name)
    }

    pub fn load_texture_image(
        &mut self,
        ctx: &Context,
        image: &image::DynamicImage,
        label: &str,
    ) -> TextureId {
        let texture = Texture::from_image(&ctx.device, &ctx.queue, image, Some(label));
        self.push_texture(ctx, texture, label, false)
    }

    pub fn load_texture_bytes(
        &mut self,
        ctx: &Context,
        bytes: &[u8],
        label: &str,
    ) -> anyhow::Result<TextureId> {
        let texture = Texture::from_bytes(&ctx.device, &ctx.queue, bytes, label, None)
            .with_context(|| format!("could not decode texture {}", label))?;
        Ok(self.push_texture(ctx, texture, label, false))
    }

    /// Load an image file from the assets as a 2D texture.
    pub async fn load_texture(&mut self, ctx: &Context, file_name: &str) -> anyhow::Result<TextureId> {
        let bytes = texture::load_binary(file_name)
            .await
            .with_context(|| format!("could not read {}", file_name))?;
        self.load_texture_bytes(ctx, &bytes, file_name)
    }

    /// Upload six faces (+X, -X, +Y, -Y, +Z, -Z) as a cube map.
    pub fn load_cube_map_images(
        &mut self,
        ctx: &Context,
        faces: &[image::DynamicImage; 6],
        label: &str,
    ) -> anyhow::Result<TextureId> {
        let texture = Texture::cube_from_images(&ctx.device, &ctx.queue, faces, Some(label))
            .with_context(|| format!("could not build cube map {}", label))?;
        Ok(self.push_texture(ctx, texture, label, true))
    }

    /// Load a cube map from six image files, ordered right, left, top,
    /// bottom, back, front.
    pub async fn load_cube_map(&mut self, ctx: &Context, files: [&str; 6]) -> anyhow::Result<TextureId> {
        let mut faces = Vec::with_capacity(6);
        for file_name in files {
            let bytes = texture::load_binary(file_name)
                .await
                .with_context(|| format!("could not read {}", file_name))?;
            let face = image::load_from_memory(&bytes)
                .with_context(|| format!("could not decode {}", file_name))?;
            faces.push(face);
        }
        let faces: [image::DynamicImage; 6] = faces
            .try_into()
            .map_err(|_| anyhow::anyhow!("a cube map needs exactly six faces"))?;
        self.load_cube_map_images(ctx, &faces, files[0])
    }

    fn push_mesh(&mut self, mesh: GpuMesh) -> RawModel {
        let id = MeshId(self.meshes.len());
        let num_elements = mesh.num_elements;
        log::debug!("uploaded mesh {} as {:?} ({} elements)", mesh.name, id, num_elements);
        self.meshes.push(mesh);
        RawModel::new(id, num_elements)
    }

    fn push_texture(&mut self, ctx: &Context, texture: Texture, label: &str, cube: bool) -> TextureId {
        let layout = if cube {
            &self.cube_layout
        } else {
            &self.texture_layout
        };
        let sampler = texture
            .sampler
            .clone()
            .unwrap_or_else(|| crate::data_structures::texture::create_default_sampler(&ctx.device));
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
            label: Some(label),
        });
        let id = TextureId(self.textures.len());
        log::debug!("uploaded texture {} as {:?}", label, id);
        self.textures.push(LoadedTexture { texture, bind_group });
        id
    }
}

/// Concatenate meshes into one, shifting the indices of each part.
pub fn merge_meshes(meshes: Vec<MeshData>) -> MeshData {
    let mut merged = MeshData::default();
    for mesh in meshes {
        let offset = merged.positions.len() as u32;
        merged.positions.extend(mesh.positions);
        merged.tex_coords.extend(mesh.tex_coords);
        merged.normals.extend(mesh.normals);
        merged.indices.extend(mesh.indices.iter().map(|i| i + offset));
    }
    merged
}
