use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
        texture::Texture,
    },
    pipelines::{CullPipelines, InstanceBuffer, mk_render_pipeline, uniform_bind_group, uniform_layout},
    render::{Frame, SceneUniform},
    resources::Loader,
};

/// Draws the entity batches of a frame, one instanced call per batch.
#[derive(Debug)]
pub struct EntityRenderer {
    pipelines: CullPipelines,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    instances: InstanceBuffer,
}

impl EntityRenderer {
    pub fn new(ctx: &Context, loader: &Loader, projection: cgmath::Matrix4<f32>) -> Self {
        let device = &ctx.device;
        let scene_layout = uniform_layout(device, "entity_scene_bind_group_layout");
        let scene_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Entity Scene Buffer"),
            contents: bytemuck::cast_slice(&[SceneUniform::with_projection(projection)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let scene_bind_group =
            uniform_bind_group(device, &scene_layout, &scene_buffer, "entity_scene_bind_group");

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Entity Pipeline Layout"),
            bind_group_layouts: &[&scene_layout, loader.texture_layout()],
            push_constant_ranges: &[],
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Entity Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("entity.wgsl").into()),
        });
        let pipelines = CullPipelines::new(|cull_mode| {
            mk_render_pipeline(
                device,
                &layout,
                ctx.config.format,
                Some(wgpu::BlendState::ALPHA_BLENDING),
                Some(Texture::DEPTH_FORMAT),
                cull_mode,
                &[ModelVertex::desc(), InstanceRaw::desc()],
                &shader,
                "Entity Pipeline",
            )
        });

        Self {
            pipelines,
            scene_buffer,
            scene_bind_group,
            instances: InstanceBuffer::new(device, "Entity Instance Buffer"),
        }
    }

    /// Upload the uniforms and instance data of `frame`.
    pub fn prepare(&mut self, ctx: &Context, frame: &Frame) {
        ctx.queue
            .write_buffer(&self.scene_buffer, 0, bytemuck::cast_slice(&[frame.scene]));
        self.instances
            .write(&ctx.device, &ctx.queue, bytemuck::cast_slice(&frame.instances));
    }

    pub fn draw(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        loader: &Loader,
        frame: &Frame,
    ) -> anyhow::Result<()> {
        if frame.batches.is_empty() {
            return Ok(());
        }
        render_pass.set_bind_group(0, &self.scene_bind_group, &[]);
        render_pass.set_vertex_buffer(1, self.instances.slice());
        for batch in &frame.batches {
            if batch.instances.is_empty() {
                log::warn!("you attempted to render a model with zero instances");
                continue;
            }
            let mesh = loader.mesh(batch.model.raw.mesh)?;
            let texture = loader.texture(batch.model.texture.texture)?;
            render_pass.set_pipeline(self.pipelines.select(batch.cull_mode));
            render_pass.set_bind_group(1, &texture.bind_group, &[]);
            // the mesh binds slot 0, which leaves the instance buffer in slot 1
            mesh.draw(render_pass, batch.instances.clone());
        }
        Ok(())
    }
}
