use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        model::{ModelVertex, TextureId, Vertex},
        terrain::{TerrainRaw, TerrainTexturePack},
        texture::{Texture, create_default_sampler},
    },
    pipelines::{CullPipelines, InstanceBuffer, mk_render_pipeline, uniform_bind_group, uniform_layout},
    render::{Frame, SceneUniform},
    resources::{Loader, texture::terrain_layout},
};

type TextureKey = (TerrainTexturePack, TextureId);

/// Draws the terrain tiles of a frame.
///
/// The bind group of a texture pack and blend map is built the first time a
/// tile uses it and reused afterwards.
#[derive(Debug)]
pub struct TerrainRenderer {
    pipelines: CullPipelines,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    textures_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    texture_groups: HashMap<TextureKey, wgpu::BindGroup>,
    offsets: InstanceBuffer,
}

impl TerrainRenderer {
    pub fn new(ctx: &Context, projection: cgmath::Matrix4<f32>) -> Self {
        let device = &ctx.device;
        let scene_layout = uniform_layout(device, "terrain_scene_bind_group_layout");
        let scene_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Scene Buffer"),
            contents: bytemuck::cast_slice(&[SceneUniform::with_projection(projection)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let scene_bind_group =
            uniform_bind_group(device, &scene_layout, &scene_buffer, "terrain_scene_bind_group");
        let textures_layout = terrain_layout(device);

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Terrain Pipeline Layout"),
            bind_group_layouts: &[&scene_layout, &textures_layout],
            push_constant_ranges: &[],
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Terrain Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("terrain.wgsl").into()),
        });
        let pipelines = CullPipelines::new(|cull_mode| {
            mk_render_pipeline(
                device,
                &layout,
                ctx.config.format,
                Some(wgpu::BlendState::REPLACE),
                Some(Texture::DEPTH_FORMAT),
                cull_mode,
                &[ModelVertex::desc(), TerrainRaw::desc()],
                &shader,
                "Terrain Pipeline",
            )
        });

        Self {
            pipelines,
            scene_buffer,
            scene_bind_group,
            textures_layout,
            sampler: create_default_sampler(device),
            texture_groups: HashMap::new(),
            offsets: InstanceBuffer::new(device, "Terrain Offset Buffer"),
        }
    }

    /// Upload uniforms and tile offsets, and build missing texture bind groups.
    pub fn prepare(&mut self, ctx: &Context, loader: &Loader, frame: &Frame) -> anyhow::Result<()> {
        ctx.queue
            .write_buffer(&self.scene_buffer, 0, bytemuck::cast_slice(&[frame.scene]));
        let offsets: Vec<TerrainRaw> = frame.terrains.iter().map(|t| t.to_raw()).collect();
        self.offsets
            .write(&ctx.device, &ctx.queue, bytemuck::cast_slice(&offsets));

        for terrain in &frame.terrains {
            let key = (terrain.textures, terrain.blend_map);
            if self.texture_groups.contains_key(&key) {
                continue;
            }
            let group = self.mk_texture_group(ctx, loader, key)?;
            self.texture_groups.insert(key, group);
        }
        Ok(())
    }

    fn mk_texture_group(
        &self,
        ctx: &Context,
        loader: &Loader,
        (pack, blend_map): TextureKey,
    ) -> anyhow::Result<wgpu::BindGroup> {
        let views = [pack.background, pack.r, pack.g, pack.b, blend_map]
            .map(|id| loader.texture(id).map(|loaded| &loaded.texture.view));
        let [background, r, g, b, blend] = views;
        let entries = [background?, r?, g?, b?, blend?]
            .into_iter()
            .enumerate()
            .map(|(binding, view)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: wgpu::BindingResource::TextureView(view),
            })
            .chain(std::iter::once(wgpu::BindGroupEntry {
                binding: 5,
                resource: wgpu::BindingResource::Sampler(&self.sampler),
            }))
            .collect::<Vec<_>>();
        Ok(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.textures_layout,
            entries: &entries,
            label: Some("terrain_texture_bind_group"),
        }))
    }

    pub fn draw(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        loader: &Loader,
        frame: &Frame,
    ) -> anyhow::Result<()> {
        if frame.terrains.is_empty() {
            return Ok(());
        }
        render_pass.set_pipeline(self.pipelines.select(frame.terrain_cull_mode));
        render_pass.set_bind_group(0, &self.scene_bind_group, &[]);
        render_pass.set_vertex_buffer(1, self.offsets.slice());
        for (index, terrain) in frame.terrains.iter().enumerate() {
            let key = (terrain.textures, terrain.blend_map);
            let Some(group) = self.texture_groups.get(&key) else {
                anyhow::bail!("terrain ({}, {}) was not prepared", terrain.grid_x, terrain.grid_z);
            };
            let mesh = loader.mesh(terrain.model.mesh)?;
            render_pass.set_bind_group(1, group, &[]);
            let index = index as u32;
            mesh.draw(render_pass, index..index + 1);
        }
        Ok(())
    }
}
