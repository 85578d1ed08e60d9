//! flow-render
//!
//! A batching master renderer for small 3D games on top of wgpu, running
//! natively and on the web. Entities that share a textured model are batched
//! and drawn with one instanced call; terrain tiles and a cube-mapped skybox
//! get dedicated renderers. The frame logic (batching, pass order, uniforms,
//! culling) is plain data and runs without a GPU.
//!
//! High-level modules
//! - `camera`: camera and projection matrices
//! - `config`: renderer settings (field of view, clip planes, fog, sky colour)
//! - `context`: GPU device, queue and window surface, or a headless target
//! - `data_structures`: models, entities, lights, terrain and batching
//! - `render`: frame composition and pass sequencing
//! - `pipelines`: the entity, terrain and skybox renderers
//! - `master`: the master renderer tying everything together
//! - `resources`: the loader for meshes, textures and cube maps
//! - `capture`: reading rendered frames back to the CPU
//!

pub mod camera;
pub mod capture;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod master;
pub mod pipelines;
pub mod render;
pub mod resources;

pub use cgmath;
pub use wgpu;

/// Install the platform logger: `env_logger` natively, the browser console
/// on wasm. Calling it more than once is harmless.
pub fn init_logger() {
    #[cfg(target_arch = "wasm32")]
    {
        let _ = console_log::init_with_level(log::Level::Warn);
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = env_logger::try_init();
    }
}
