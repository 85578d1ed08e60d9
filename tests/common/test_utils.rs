#![allow(dead_code)]

use flow_render::{
    camera::Camera,
    capture::read_texture,
    config::RenderConfig,
    context::Context,
    data_structures::{light::Light, model::TextureId},
    master::MasterRenderer,
    resources::Loader,
};

pub const WIDTH: u32 = 64;
pub const HEIGHT: u32 = 64;

/// Everything a golden image test needs: a headless context, a loader and a
/// master renderer with a solid coloured sky.
pub struct Harness {
    pub ctx: Context,
    pub loader: Loader,
    pub renderer: MasterRenderer,
}

impl Harness {
    pub async fn new(config: RenderConfig, sky: [u8; 4]) -> anyhow::Result<Self> {
        flow_render::init_logger();
        let ctx = Context::headless(WIDTH, HEIGHT).await?;
        let mut loader = Loader::new(&ctx);
        let sky = solid_cube_map(&ctx, &mut loader, sky)?;
        let renderer = MasterRenderer::new(&ctx, &mut loader, sky, config)?;
        Ok(Self {
            ctx,
            loader,
            renderer,
        })
    }

    /// Render whatever has been submitted and read the frame back.
    pub async fn capture(&mut self, lights: &[Light], camera: &Camera) -> anyhow::Result<image::RgbaImage> {
        let target = self.ctx.create_target();
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());
        self.renderer
            .render(&self.ctx, &self.loader, lights, camera, &view)?;
        read_texture(&self.ctx, &target).await
    }

    pub fn solid_texture(&mut self, colour: [u8; 4]) -> TextureId {
        self.loader
            .load_texture_image(&self.ctx, &solid_image(colour), "solid")
    }
}

pub fn solid_image(colour: [u8; 4]) -> image::DynamicImage {
    image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(4, 4, image::Rgba(colour)))
}

pub fn solid_cube_map(ctx: &Context, loader: &mut Loader, colour: [u8; 4]) -> anyhow::Result<TextureId> {
    let faces = std::array::from_fn(|_| solid_image(colour));
    loader.load_cube_map_images(ctx, &faces, "solid sky")
}

pub fn centre(image: &image::RgbaImage) -> image::Rgba<u8> {
    *image.get_pixel(image.width() / 2, image.height() / 2)
}
