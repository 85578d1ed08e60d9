use std::sync::Arc;

use approx::assert_relative_eq;
use cgmath::{Deg, Vector3};
use flow_render::{
    camera::Camera,
    config::RenderConfig,
    data_structures::{
        entity::Entity,
        instance::Instance,
        light::{Light, MAX_LIGHTS},
        model::{MeshId, ModelTexture, RawModel, TextureId, TexturedModel},
        terrain::{HeightMap, Terrain, TerrainTexturePack},
    },
    render::{FrameBuilder, Pass},
};

fn model(mesh: usize, transparent: bool) -> Arc<TexturedModel> {
    TexturedModel::new(
        RawModel::new(MeshId(mesh), 36),
        ModelTexture::new(TextureId(mesh)).with_transparency(transparent),
    )
}

fn place(model: &Arc<TexturedModel>, x: f32, z: f32) -> Entity {
    Entity::new(model.clone(), Instance::from(Vector3::new(x, 0.0, z)))
}

fn terrain(grid_x: i32, grid_z: i32) -> Terrain {
    Terrain::new(
        grid_x,
        grid_z,
        RawModel::new(MeshId(99), 6),
        TerrainTexturePack {
            background: TextureId(10),
            r: TextureId(11),
            g: TextureId(12),
            b: TextureId(13),
        },
        TextureId(14),
        Arc::new(HeightMap::flat(2).unwrap()),
    )
}

#[test]
fn a_game_loop_renders_independent_frames() {
    let (tree, fern, grass) = (model(0, false), model(1, true), model(2, true));
    let mut frames = FrameBuilder::new(RenderConfig::default(), 1920, 1080);
    let camera = Camera::new((0.0, 5.0, 0.0), Deg(45.0), Deg(10.0));
    let sun = Light::new(Vector3::new(0.0, 10000.0, -7000.0), Vector3::new(0.4, 0.4, 0.4));

    for frame_no in 0..3 {
        frames.process_terrain(&terrain(0, -1));
        frames.process_terrain(&terrain(-1, -1));
        for i in 0..10 {
            frames.process_entity(&place(&tree, i as f32, -10.0));
            if i % 2 == 0 {
                frames.process_entity(&place(&fern, i as f32, -20.0));
            }
        }
        if frame_no == 1 {
            frames.process_entity(&place(&grass, 0.0, -5.0));
        }

        let frame = frames.build(&[sun], &camera);
        assert_eq!(frame.passes(), [Pass::Entities, Pass::Terrain, Pass::Skybox]);
        assert_eq!(frame.terrains.len(), 2);

        let expected_batches = if frame_no == 1 { 3 } else { 2 };
        assert_eq!(frame.batches.len(), expected_batches);
        assert_eq!(frame.batches[0].model.id(), tree.id());
        assert_eq!(frame.batches[0].instances, 0..10);
        assert_eq!(frame.batches[0].cull_mode, Some(wgpu::Face::Back));
        assert_eq!(frame.batches[1].model.id(), fern.id());
        assert_eq!(frame.batches[1].instances, 10..15);
        assert_eq!(frame.batches[1].cull_mode, None);
        assert_eq!(frame.instances.len(), if frame_no == 1 { 16 } else { 15 });

        assert_eq!(frame.scene.lights.len(), MAX_LIGHTS);
        assert_eq!(frame.scene.lights[0].colour, [0.4, 0.4, 0.4, 0.0]);
    }

    // no frame keeps a reference to the model
    assert_eq!(Arc::strong_count(&tree), 1);
}

#[test]
fn projection_follows_the_configured_field_of_view() {
    let config = RenderConfig::default().with_fov(Deg(90.0)).with_clip_planes(1.0, 100.0);
    let frames = FrameBuilder::new(config, 200, 100);
    let m = frames.projection().calc_matrix();

    // horizontal fov of 90 degrees: x_scale = 1 / tan(45) = 1
    assert_relative_eq!(m.x.x, 1.0, epsilon = 1e-6);
    assert_relative_eq!(m.y.y, 2.0, epsilon = 1e-6);
    assert_relative_eq!(m.z.z, -101.0 / 99.0, epsilon = 1e-6);
    assert_relative_eq!(m.z.w, -1.0);
    assert_relative_eq!(m.w.z, -200.0 / 99.0, epsilon = 1e-5);
    assert_relative_eq!(m.w.w, 0.0);
}

#[test]
fn culling_toggles_apply_from_the_next_frame() {
    let rock = model(0, false);
    let mut frames = FrameBuilder::new(RenderConfig::default(), 800, 600);
    let camera = Camera::default();

    frames.process_entity(&place(&rock, 0.0, -3.0));
    frames.disable_culling();
    let frame = frames.build(&[], &camera);
    assert_eq!(frame.batches[0].cull_mode, None);
    assert_eq!(frame.terrain_cull_mode, None);

    frames.enable_culling();
    frames.process_entity(&place(&rock, 0.0, -3.0));
    let frame = frames.build(&[], &camera);
    assert_eq!(frame.batches[0].cull_mode, Some(wgpu::Face::Back));
}

#[test]
fn skybox_ignores_camera_position() {
    let mut frames = FrameBuilder::new(RenderConfig::default(), 800, 600);
    let near = frames.build(&[], &Camera::new((0.0, 0.0, 0.0), Deg(30.0), Deg(0.0)));
    let far = frames.build(&[], &Camera::new((500.0, 20.0, -300.0), Deg(30.0), Deg(0.0)));
    assert_eq!(near.skybox.view, far.skybox.view);
    assert_ne!(near.scene.view, far.scene.view);
}
