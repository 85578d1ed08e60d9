//! Instance transformation data for GPU rendering.
//!
//! Every entity drawn by the entity renderer contributes one [`InstanceRaw`]
//! to a frame-wide instance buffer. Batches then draw a contiguous range of
//! that buffer in a single instanced call.

use cgmath::{Deg, One, Rotation3};

use crate::data_structures::model;

/// Per-instance transformation: position, rotation (as quaternion), and scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Build an instance from euler angles applied in X, Y, Z order and a
    /// uniform scale.
    pub fn from_euler(
        position: cgmath::Vector3<f32>,
        rot_x: Deg<f32>,
        rot_y: Deg<f32>,
        rot_z: Deg<f32>,
        scale: f32,
    ) -> Self {
        let rotation = cgmath::Quaternion::from_angle_x(rot_x)
            * cgmath::Quaternion::from_angle_y(rot_y)
            * cgmath::Quaternion::from_angle_z(rot_z);
        Self {
            position,
            rotation,
            scale: cgmath::Vector3::new(scale, scale, scale),
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/**
 * The raw instance is the actual data stored on the GPU.
 *
 * Besides the model matrix it carries the texture-atlas cell of the entity
 * (`atlas = [offset_x, offset_y, number_of_rows, 0]`) and the material
 * parameters of its model (`material = [shine_damper, reflectivity,
 * fake_lighting, 0]`), so one buffer can serve every batch in a frame.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub atlas: [f32; 4],
    pub material: [f32; 4],
}

/**
 * Stride layout: the model matrix as four vec4s (locations 5-8), then the
 * atlas and material vec4s (locations 9 and 10).
 */
impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Shaders advance to the next element once per instance, not per vertex
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // A mat4 takes up 4 vertex slots as it is technically 4 vec4s.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 20]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::{Vector3, Vector4};

    #[test]
    fn identity_instance_has_identity_matrix() {
        use cgmath::SquareMatrix;
        assert_eq!(Instance::new().to_matrix(), cgmath::Matrix4::identity());
    }

    #[test]
    fn matrix_scales_then_rotates_then_translates() {
        let instance = Instance::from_euler(
            Vector3::new(10.0, 0.0, 0.0),
            Deg(0.0),
            Deg(90.0),
            Deg(0.0),
            2.0,
        );
        let point = instance.to_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        // scaled to (2, 0, 0), rotated about Y to (0, 0, -2), then moved by +10 on X
        assert_relative_eq!(point, Vector4::new(10.0, 0.0, -2.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn raw_layout_matches_the_vertex_description() {
        use crate::data_structures::model::Vertex;
        let desc = InstanceRaw::desc();
        assert_eq!(desc.array_stride, 96);
        assert_eq!(desc.attributes.len(), 6);
        assert_eq!(desc.step_mode, wgpu::VertexStepMode::Instance);
    }
}
