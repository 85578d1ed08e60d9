//! Frame composition and pass sequencing.
//!
//! [`FrameBuilder`] is the CPU half of the master renderer. During a frame,
//! entities and terrains are queued with [`FrameBuilder::process_entity`] and
//! [`FrameBuilder::process_terrain`]; [`FrameBuilder::build`] then drains both
//! queues into a [`Frame`]: plain data describing exactly what the GPU passes
//! will draw and with which uniforms.
//!
//! # Pass order
//!
//! 1. prepare: clear colour (the sky colour) and depth
//! 2. [`Pass::Entities`]: every batch, one instanced draw each
//! 3. [`Pass::Terrain`]: every terrain tile
//! 4. [`Pass::Skybox`]: the cube map around the camera
//!
//! Because building a frame empties the queues, nothing submitted for one
//! frame leaks into the next.

use std::ops::Range;
use std::sync::Arc;

use crate::{
    camera::{Camera, Projection},
    config::RenderConfig,
    data_structures::{
        batch::EntityBatches,
        entity::Entity,
        instance::InstanceRaw,
        light::{Light, LightRaw, MAX_LIGHTS, pack_lights},
        model::TexturedModel,
        terrain::Terrain,
    },
};

/// The passes of a frame, in the order they are recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pass {
    Entities,
    Terrain,
    Skybox,
}

/// Uniforms shared by the entity and terrain shaders.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub sky_colour: [f32; 4],
    /// `[density, gradient, 0, 0]`
    pub fog: [f32; 4],
    pub lights: [LightRaw; MAX_LIGHTS],
}

impl SceneUniform {
    /// Uniform contents before the first frame: projection only.
    pub fn with_projection(projection: cgmath::Matrix4<f32>) -> Self {
        use cgmath::SquareMatrix;
        Self {
            projection: projection.into(),
            view: cgmath::Matrix4::identity().into(),
            camera_position: [0.0, 0.0, 0.0, 1.0],
            sky_colour: [0.0; 4],
            fog: [0.0; 4],
            lights: [LightRaw::EMPTY; MAX_LIGHTS],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyboxUniform {
    pub projection: [[f32; 4]; 4],
    /// The camera view without translation.
    pub view: [[f32; 4]; 4],
    pub fog_colour: [f32; 4],
}

impl SkyboxUniform {
    pub fn with_projection(projection: cgmath::Matrix4<f32>) -> Self {
        use cgmath::SquareMatrix;
        Self {
            projection: projection.into(),
            view: cgmath::Matrix4::identity().into(),
            fog_colour: [0.0; 4],
        }
    }
}

/// One instanced draw of the entity pass.
#[derive(Clone, Debug)]
pub struct EntityDraw {
    pub model: Arc<TexturedModel>,
    /// Face culling to draw with; `None` for models with transparent textures.
    pub cull_mode: Option<wgpu::Face>,
    /// Range of [`Frame::instances`] belonging to this batch.
    pub instances: Range<u32>,
}

/// Everything the GPU passes of one frame need.
#[derive(Clone, Debug)]
pub struct Frame {
    pub clear_colour: wgpu::Color,
    pub clear_depth: f32,
    pub scene: SceneUniform,
    pub batches: Vec<EntityDraw>,
    /// Instance data of every batch, batch after batch.
    pub instances: Vec<InstanceRaw>,
    pub terrains: Vec<Terrain>,
    /// Culling used for terrain tiles.
    pub terrain_cull_mode: Option<wgpu::Face>,
    pub skybox: SkyboxUniform,
}

impl Frame {
    pub const PASSES: [Pass; 3] = [Pass::Entities, Pass::Terrain, Pass::Skybox];

    pub fn passes(&self) -> [Pass; 3] {
        Self::PASSES
    }

    pub fn entity_count(&self) -> usize {
        self.instances.len()
    }
}

/// Collects a frame's entities and terrains and turns them into a [`Frame`].
#[derive(Debug)]
pub struct FrameBuilder {
    config: RenderConfig,
    projection: Projection,
    cull_mode: Option<wgpu::Face>,
    entities: EntityBatches,
    terrains: Vec<Terrain>,
}

impl FrameBuilder {
    pub fn new(config: RenderConfig, width: u32, height: u32) -> Self {
        let projection = Projection::new(width, height, config.fov, config.near, config.far);
        let cull_mode = config.cull_back_faces.then_some(wgpu::Face::Back);
        Self {
            config,
            projection,
            cull_mode,
            entities: EntityBatches::new(),
            terrains: Vec::new(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// The projection as uploaded to the GPU.
    pub fn projection_matrix(&self) -> cgmath::Matrix4<f32> {
        self.projection.to_wgpu()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
    }

    pub fn enable_culling(&mut self) {
        self.cull_mode = Some(wgpu::Face::Back);
    }

    pub fn disable_culling(&mut self) {
        self.cull_mode = None;
    }

    pub fn cull_mode(&self) -> Option<wgpu::Face> {
        self.cull_mode
    }

    pub fn process_entity(&mut self, entity: &Entity) {
        self.entities.process(entity);
    }

    pub fn process_terrain(&mut self, terrain: &Terrain) {
        self.terrains.push(terrain.clone());
    }

    pub fn entities(&self) -> &EntityBatches {
        &self.entities
    }

    pub fn terrains(&self) -> &[Terrain] {
        &self.terrains
    }

    /// Drain the queued entities and terrains into a frame seen through
    /// `camera` and lit by `lights`.
    pub fn build(&mut self, lights: &[Light], camera: &Camera) -> Frame {
        let [r, g, b] = self.config.sky_colour;
        let projection: [[f32; 4]; 4] = self.projection_matrix().into();
        let scene = SceneUniform {
            projection,
            view: camera.view_matrix().into(),
            camera_position: [camera.position.x, camera.position.y, camera.position.z, 1.0],
            sky_colour: [r, g, b, 1.0],
            fog: [self.config.fog_density, self.config.fog_gradient, 0.0, 0.0],
            lights: pack_lights(lights),
        };
        let skybox = SkyboxUniform {
            projection,
            view: camera.skybox_view_matrix().into(),
            fog_colour: [r, g, b, 1.0],
        };

        let mut batches = Vec::with_capacity(self.entities.batch_count());
        let mut instances = Vec::with_capacity(self.entities.entity_count());
        for batch in self.entities.drain() {
            let start = instances.len() as u32;
            instances.extend(batch.entities.iter().map(Entity::to_raw));
            let cull_mode = if batch.model.texture.has_transparency {
                None
            } else {
                self.cull_mode
            };
            batches.push(EntityDraw {
                model: batch.model,
                cull_mode,
                instances: start..instances.len() as u32,
            });
        }
        let terrains = std::mem::take(&mut self.terrains);

        log::debug!(
            "frame: {} batches, {} entities, {} terrains, {} lights",
            batches.len(),
            instances.len(),
            terrains.len(),
            lights.len().min(MAX_LIGHTS)
        );

        Frame {
            clear_colour: self.config.clear_colour(),
            clear_depth: 1.0,
            scene,
            batches,
            instances,
            terrains,
            terrain_cull_mode: self.cull_mode,
            skybox,
        }
    }

    /// Queue all `terrains`, then all `entities`, and build the frame.
    pub fn build_scene(
        &mut self,
        entities: &[Entity],
        terrains: &[Terrain],
        lights: &[Light],
        camera: &Camera,
    ) -> Frame {
        for terrain in terrains {
            self.process_terrain(terrain);
        }
        for entity in entities {
            self.process_entity(entity);
        }
        self.build(lights, camera)
    }
}
