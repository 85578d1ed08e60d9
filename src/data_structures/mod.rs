//! Scene data: everything the renderers draw, independent of the GPU.
//!
//! - `model` contains vertex layouts, mesh data and textured model definitions
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `instance` holds per-instance transformation data
//! - `entity` places a textured model in the world
//! - `batch` groups entities by the model they share
//! - `light` holds point lights and their uniform layout
//! - `terrain` contains heightmaps and terrain tiles

pub mod batch;
pub mod entity;
pub mod instance;
pub mod light;
pub mod model;
pub mod terrain;
pub mod texture;
