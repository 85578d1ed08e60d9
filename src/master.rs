//! The master renderer.
//!
//! [`MasterRenderer`] is the single entry point a game loop talks to. Each
//! frame, entities and terrains are submitted with
//! [`process_entity`](MasterRenderer::process_entity) and
//! [`process_terrain`](MasterRenderer::process_terrain), then
//! [`render`](MasterRenderer::render) clears the target to the sky colour,
//! runs the entity, terrain and skybox passes and empties the queues.
//!
//! GPU resources belong to the sub-renderers and the [`Loader`] and are
//! released when they are dropped.

use std::iter;

use anyhow::Context as _;

use crate::{
    camera::Camera,
    config::RenderConfig,
    context::Context,
    data_structures::{entity::Entity, light::Light, model::TextureId, terrain::Terrain},
    pipelines::{entity::EntityRenderer, skybox::SkyboxRenderer, terrain::TerrainRenderer},
    render::{Frame, FrameBuilder, Pass},
    resources::Loader,
};

#[derive(Debug)]
pub struct MasterRenderer {
    frame: FrameBuilder,
    entity_renderer: EntityRenderer,
    terrain_renderer: TerrainRenderer,
    skybox_renderer: SkyboxRenderer,
}

impl MasterRenderer {
    /// Build the projection and the three sub-renderers. `sky` must be a
    /// cube map loaded by `loader`.
    pub fn new(
        ctx: &Context,
        loader: &mut Loader,
        sky: TextureId,
        config: RenderConfig,
    ) -> anyhow::Result<Self> {
        let (width, height) = ctx.size();
        let frame = FrameBuilder::new(config, width, height);
        let projection = frame.projection_matrix();
        let skybox_size = frame.config().skybox_size;

        let entity_renderer = EntityRenderer::new(ctx, loader, projection);
        let terrain_renderer = TerrainRenderer::new(ctx, projection);
        let skybox_renderer = SkyboxRenderer::new(ctx, loader, sky, skybox_size, projection)
            .context("could not set up the skybox")?;

        log::info!("master renderer ready at {}x{}", width, height);
        Ok(Self {
            frame,
            entity_renderer,
            terrain_renderer,
            skybox_renderer,
        })
    }

    /// Load the six skybox faces (right, left, top, bottom, back, front) from
    /// the assets and build the renderer.
    pub async fn load(
        ctx: &Context,
        loader: &mut Loader,
        sky_faces: [&str; 6],
        config: RenderConfig,
    ) -> anyhow::Result<Self> {
        let sky = loader.load_cube_map(ctx, sky_faces).await?;
        Self::new(ctx, loader, sky, config)
    }

    pub fn config(&self) -> &RenderConfig {
        self.frame.config()
    }

    pub fn process_entity(&mut self, entity: &Entity) {
        self.frame.process_entity(entity);
    }

    pub fn process_terrain(&mut self, terrain: &Terrain) {
        self.frame.process_terrain(terrain);
    }

    pub fn enable_culling(&mut self) {
        self.frame.enable_culling();
    }

    pub fn disable_culling(&mut self) {
        self.frame.disable_culling();
    }

    pub fn projection_matrix(&self) -> cgmath::Matrix4<f32> {
        self.frame.projection_matrix()
    }

    /// Resize the context's surface and depth buffer together with the
    /// projection, so the next frame renders at the new size. Zero sized
    /// requests (a minimised window) change nothing and return `false`.
    pub fn resize(&mut self, ctx: &mut Context, width: u32, height: u32) -> bool {
        if !ctx.resize(width, height) {
            return false;
        }
        self.frame.resize(width, height);
        true
    }

    /// Render everything submitted since the last frame into `view`, then
    /// empty the queues.
    pub fn render(
        &mut self,
        ctx: &Context,
        loader: &Loader,
        lights: &[Light],
        camera: &Camera,
        view: &wgpu::TextureView,
    ) -> anyhow::Result<()> {
        let frame = self.frame.build(lights, camera);
        self.execute(ctx, loader, &frame, view)
    }

    /// Queue `terrains` and `entities`, then [`render`](Self::render).
    pub fn render_scene(
        &mut self,
        ctx: &Context,
        loader: &Loader,
        entities: &[Entity],
        terrains: &[Terrain],
        lights: &[Light],
        camera: &Camera,
        view: &wgpu::TextureView,
    ) -> anyhow::Result<()> {
        let frame = self.frame.build_scene(entities, terrains, lights, camera);
        self.execute(ctx, loader, &frame, view)
    }

    /// [`render`](Self::render) into the window surface and present it.
    pub fn render_to_surface(
        &mut self,
        ctx: &Context,
        loader: &Loader,
        lights: &[Light],
        camera: &Camera,
    ) -> anyhow::Result<()> {
        let surface = ctx
            .surface
            .as_ref()
            .context("this context has no window surface")?;
        let output = match surface.get_current_texture() {
            Ok(output) => output,
            Err(e) if needs_reconfigure(&e) => {
                log::warn!("skipping frame and reconfiguring the surface: {}", e);
                surface.configure(&ctx.device, &ctx.config);
                let _ = self.frame.build(lights, camera);
                return Ok(());
            }
            Err(e) => return Err(e).context("could not acquire the next surface texture"),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.render(ctx, loader, lights, camera, &view)?;
        if let Some(window) = ctx.window() {
            window.pre_present_notify();
        }
        output.present();
        Ok(())
    }

    fn execute(
        &mut self,
        ctx: &Context,
        loader: &Loader,
        frame: &Frame,
        view: &wgpu::TextureView,
    ) -> anyhow::Result<()> {
        self.entity_renderer.prepare(ctx, frame);
        self.terrain_renderer.prepare(ctx, loader, frame)?;
        self.skybox_renderer.prepare(ctx, frame);

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame.clear_depth),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            for pass in frame.passes() {
                match pass {
                    Pass::Entities => self.entity_renderer.draw(&mut render_pass, loader, frame)?,
                    Pass::Terrain => self.terrain_renderer.draw(&mut render_pass, loader, frame)?,
                    Pass::Skybox => self.skybox_renderer.draw(&mut render_pass, loader)?,
                }
            }
        }
        ctx.queue.submit(iter::once(encoder.finish()));
        Ok(())
    }
}

/// A lost or outdated surface is usable again once it is reconfigured.
fn needs_reconfigure(e: &wgpu::SurfaceError) -> bool {
    matches!(e, wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)
}
