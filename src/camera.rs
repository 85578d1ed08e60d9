//! Camera and projection.
//!
//! The [`Camera`] produces the per-frame view matrix and [`Projection`] the
//! perspective matrix the master renderer hands to every sub-renderer. Both
//! work in the right-handed, OpenGL-style clip space; [`Projection::to_wgpu`]
//! remaps depth to the `[0, 1]` range wgpu expects right before upload.

use cgmath::{Angle, Deg, Matrix4, Point3, Rad, SquareMatrix, Vector3};

/// Remaps OpenGL clip-space depth (`-1..1`) to wgpu's `0..1`.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// A first-person camera described by a position and two angles.
///
/// `pitch` rotates around the X axis (looking up/down), `yaw` around the Y
/// axis (turning left/right). With both at zero the camera looks down `-Z`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
        }
    }

    /// Rotate by pitch, then yaw, then move the world by `-position`.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_angle_x(self.pitch)
            * Matrix4::from_angle_y(self.yaw)
            * Matrix4::from_translation(-Vector3::new(
                self.position.x,
                self.position.y,
                self.position.z,
            ))
    }

    /// The view matrix with its translation removed, so the skybox stays
    /// centred on the camera however far it moves.
    pub fn skybox_view_matrix(&self) -> Matrix4<f32> {
        let mut view = self.view_matrix();
        view.w.x = 0.0;
        view.w.y = 0.0;
        view.w.z = 0.0;
        view
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new((0.0, 0.0, 0.0), Deg(0.0), Deg(0.0))
    }
}

/// Perspective projection with a horizontal field of view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    fov: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fov: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fov: fov.into(),
            znear,
            zfar,
        }
    }

    /// Update the aspect ratio. Zero-sized surfaces (minimised windows) are
    /// ignored and keep the previous ratio.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::warn!("ignoring projection resize to {}x{}", width, height);
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// The OpenGL-convention perspective matrix.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        let y_scale = (1.0 / (self.fov / 2.0).tan()) * self.aspect;
        let x_scale = y_scale / self.aspect;
        let frustum_length = self.zfar - self.znear;

        let mut matrix = Matrix4::identity();
        matrix.x.x = x_scale;
        matrix.y.y = y_scale;
        matrix.z.z = -((self.zfar + self.znear) / frustum_length);
        matrix.z.w = -1.0;
        matrix.w.z = -((2.0 * self.znear * self.zfar) / frustum_length);
        matrix.w.w = 0.0;
        matrix
    }

    pub fn to_wgpu(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * self.calc_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::{Vector4, Zero};

    #[test]
    fn projection_matches_the_frustum_formula() {
        let projection = Projection::new(1600, 900, Deg(70.0), 0.1, 1000.0);
        let matrix = projection.calc_matrix();

        let aspect = 1600.0 / 900.0;
        let y_scale = (1.0 / Deg(35.0f32).tan()) * aspect;
        let x_scale = y_scale / aspect;
        assert_relative_eq!(matrix.x.x, x_scale, epsilon = 1e-5);
        assert_relative_eq!(matrix.y.y, y_scale, epsilon = 1e-5);
        assert_relative_eq!(matrix.z.z, -(1000.1 / 999.9), epsilon = 1e-5);
        assert_relative_eq!(matrix.z.w, -1.0);
        assert_relative_eq!(matrix.w.z, -(200.0 / 999.9), epsilon = 1e-5);
        assert_relative_eq!(matrix.w.w, 0.0);
        // everything else stays zero
        assert_eq!(matrix.x.y, 0.0);
        assert_eq!(matrix.y.x, 0.0);
        assert_eq!(matrix.w.x, 0.0);
        assert_eq!(matrix.z.x, 0.0);
    }

    #[test]
    fn near_and_far_planes_land_on_clip_bounds() {
        let projection = Projection::new(800, 600, Deg(70.0), 0.1, 1000.0);
        let gl = projection.calc_matrix();
        let near = gl * Vector4::new(0.0, 0.0, -0.1, 1.0);
        let far = gl * Vector4::new(0.0, 0.0, -1000.0, 1.0);
        assert_relative_eq!(near.z / near.w, -1.0, epsilon = 1e-4);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-4);

        let wgpu = projection.to_wgpu();
        let near = wgpu * Vector4::new(0.0, 0.0, -0.1, 1.0);
        let far = wgpu * Vector4::new(0.0, 0.0, -1000.0, 1.0);
        assert_relative_eq!(near.z / near.w, 0.0, epsilon = 1e-4);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn resize_ignores_zero_sizes() {
        let mut projection = Projection::new(800, 600, Deg(70.0), 0.1, 1000.0);
        projection.resize(0, 600);
        assert_relative_eq!(projection.aspect(), 800.0 / 600.0);
        projection.resize(1000, 500);
        assert_relative_eq!(projection.aspect(), 2.0);
    }

    #[test]
    fn view_moves_the_world_opposite_to_the_camera() {
        let camera = Camera::new((3.0, 4.0, 5.0), Deg(0.0), Deg(0.0));
        let eye = camera.view_matrix() * Vector4::new(3.0, 4.0, 5.0, 1.0);
        assert_relative_eq!(eye, Vector4::new(0.0, 0.0, 0.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn yaw_turns_the_camera_to_the_right() {
        // Turning right by 90 degrees makes +X the forward (-Z in eye space) direction.
        let camera = Camera::new((0.0, 0.0, 0.0), Deg(90.0), Deg(0.0));
        let eye = camera.view_matrix() * Vector4::new(1.0, 0.0, 0.0, 0.0);
        assert_relative_eq!(eye, Vector4::new(0.0, 0.0, -1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn skybox_view_drops_translation() {
        let camera = Camera::new((10.0, 20.0, -30.0), Deg(45.0), Deg(-10.0));
        let view = camera.skybox_view_matrix();
        assert!(view.w.truncate().is_zero());
        assert_eq!(view.w.w, 1.0);
        assert_eq!(view.x, camera.view_matrix().x);
    }
}
