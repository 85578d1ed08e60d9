use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        model::{PositionVertex, RawModel, TextureId, Vertex},
        texture::Texture,
    },
    pipelines::{mk_render_pipeline, uniform_bind_group, uniform_layout},
    render::{Frame, SkyboxUniform},
    resources::Loader,
};

/// The 36 corners of a cube with half extent `size`, wound to face inwards.
pub fn cube_vertices(size: f32) -> Vec<[f32; 3]> {
    #[rustfmt::skip]
    const UNIT: [[f32; 3]; 36] = [
        [-1.0,  1.0, -1.0], [-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0],
        [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [-1.0,  1.0, -1.0],

        [-1.0, -1.0,  1.0], [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0],
        [-1.0,  1.0, -1.0], [-1.0,  1.0,  1.0], [-1.0, -1.0,  1.0],

        [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0],
        [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0], [ 1.0, -1.0, -1.0],

        [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0],
        [ 1.0,  1.0,  1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0],

        [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0],
        [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0],

        [-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0, -1.0],
        [ 1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0],
    ];
    UNIT.iter().map(|v| v.map(|c| c * size)).collect()
}

/// Draws the cube map around the camera. The cube is seen from inside, so it
/// is never culled.
#[derive(Debug)]
pub struct SkyboxRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    cube: RawModel,
    cube_map: TextureId,
}

impl SkyboxRenderer {
    pub fn new(
        ctx: &Context,
        loader: &mut Loader,
        cube_map: TextureId,
        size: f32,
        projection: cgmath::Matrix4<f32>,
    ) -> anyhow::Result<Self> {
        // fail early rather than on the first frame
        loader.texture(cube_map)?;
        let cube = loader.load_positions(ctx, &cube_vertices(size), "skybox");

        let device = &ctx.device;
        let layout = uniform_layout(device, "skybox_bind_group_layout");
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Skybox Buffer"),
            contents: bytemuck::cast_slice(&[SkyboxUniform::with_projection(projection)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_bind_group = uniform_bind_group(device, &layout, &uniform_buffer, "skybox_bind_group");

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Skybox Pipeline Layout"),
            bind_group_layouts: &[&layout, loader.cube_layout()],
            push_constant_ranges: &[],
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Skybox Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("skybox.wgsl").into()),
        });
        let pipeline = mk_render_pipeline(
            device,
            &pipeline_layout,
            ctx.config.format,
            Some(wgpu::BlendState::REPLACE),
            Some(Texture::DEPTH_FORMAT),
            None,
            &[PositionVertex::desc()],
            &shader,
            "Skybox Pipeline",
        );

        Ok(Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            cube,
            cube_map,
        })
    }

    pub fn prepare(&self, ctx: &Context, frame: &Frame) {
        ctx.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[frame.skybox]));
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, loader: &Loader) -> anyhow::Result<()> {
        let mesh = loader.mesh(self.cube.mesh)?;
        let cube_map = loader.texture(self.cube_map)?;
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_bind_group(1, &cube_map.bind_group, &[]);
        mesh.draw(render_pass, 0..1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3};

    #[test]
    fn cube_has_36_scaled_corners() {
        let cube = cube_vertices(500.0);
        assert_eq!(cube.len(), 36);
        assert!(cube.iter().flatten().all(|c| c.abs() == 500.0));
    }

    #[test]
    fn every_face_points_inwards() {
        let cube = cube_vertices(1.0);
        for tri in cube.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(Vector3::from);
            let normal = (b - a).cross(c - a);
            let centre = (a + b + c) / 3.0;
            // counter-clockwise front faces look towards the centre of the cube
            assert!(normal.dot(centre) < 0.0, "triangle {:?} faces outwards", tri);
        }
    }
}
