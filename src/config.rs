//! Renderer configuration.
//!
//! [`RenderConfig`] bundles the constants the master renderer needs every
//! frame: the field of view and clip planes used to build the projection, the
//! sky colour used for clearing, fog and the skybox horizon, and the base
//! raster state. Everything has a sensible default so most callers only
//! override a field or two via the `with_*` setters.

use cgmath::Deg;

/// Horizontal field of view in degrees.
pub const FOV: f32 = 70.0;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 1000.0;

/// Default sky colour (red, green, blue).
pub const SKY_COLOUR: [f32; 3] = [0.5, 0.5, 0.5];

pub const FOG_DENSITY: f32 = 0.0035;
pub const FOG_GRADIENT: f32 = 5.0;

/// Half the edge length of the skybox cube.
pub const SKYBOX_SIZE: f32 = 500.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderConfig {
    pub fov: Deg<f32>,
    pub near: f32,
    pub far: f32,
    pub sky_colour: [f32; 3],
    pub fog_density: f32,
    pub fog_gradient: f32,
    pub skybox_size: f32,
    /// Whether back faces are culled when a frame starts.
    pub cull_back_faces: bool,
}

impl RenderConfig {
    pub fn with_fov<F: Into<Deg<f32>>>(mut self, fov: F) -> Self {
        self.fov = fov.into();
        self
    }

    pub fn with_clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    pub fn with_sky_colour(mut self, red: f32, green: f32, blue: f32) -> Self {
        self.sky_colour = [red, green, blue];
        self
    }

    pub fn with_fog(mut self, density: f32, gradient: f32) -> Self {
        self.fog_density = density;
        self.fog_gradient = gradient;
        self
    }

    pub fn with_skybox_size(mut self, size: f32) -> Self {
        self.skybox_size = size;
        self
    }

    pub fn with_culling(mut self, cull_back_faces: bool) -> Self {
        self.cull_back_faces = cull_back_faces;
        self
    }

    /// The colour every frame is cleared to: the sky colour, fully opaque.
    pub fn clear_colour(&self) -> wgpu::Color {
        let [r, g, b] = self.sky_colour;
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fov: Deg(FOV),
            near: NEAR_PLANE,
            far: FAR_PLANE,
            sky_colour: SKY_COLOUR,
            fog_density: FOG_DENSITY,
            fog_gradient: FOG_GRADIENT,
            skybox_size: SKYBOX_SIZE,
            cull_back_faces: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_renderer_constants() {
        let config = RenderConfig::default();
        assert_eq!(config.fov, Deg(70.0));
        assert_eq!(config.near, 0.1);
        assert_eq!(config.far, 1000.0);
        assert_eq!(config.sky_colour, [0.5, 0.5, 0.5]);
        assert!(config.cull_back_faces);
    }

    #[test]
    fn clear_colour_is_opaque_sky() {
        let config = RenderConfig::default().with_sky_colour(0.25, 0.5, 1.0);
        let colour = config.clear_colour();
        assert_eq!(colour.r, 0.25);
        assert_eq!(colour.g, 0.5);
        assert_eq!(colour.b, 1.0);
        assert_eq!(colour.a, 1.0);
    }

    #[test]
    fn setters_only_touch_their_field() {
        let config = RenderConfig::default()
            .with_fov(Deg(90.0))
            .with_clip_planes(1.0, 50.0);
        assert_eq!(config.fov, Deg(90.0));
        assert_eq!((config.near, config.far), (1.0, 50.0));
        assert_eq!(config.sky_colour, SKY_COLOUR);
        assert_eq!(config.fog_density, FOG_DENSITY);
    }
}
