#[cfg(feature = "integration-tests")]
mod common;

#[tokio::test]
#[cfg(feature = "integration-tests")]
async fn should_render_the_cube_map_above_the_horizon() -> anyhow::Result<()> {
    use cgmath::Deg;
    use common::test_utils::{Harness, centre};
    use flow_render::{camera::Camera, config::RenderConfig};

    let mut harness = Harness::new(RenderConfig::default(), [255, 0, 0, 255]).await?;
    let camera = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(-90.0));
    let image = harness.capture(&[], &camera).await?;

    assert_eq!(centre(&image), image::Rgba([255, 0, 0, 255]));
    Ok(())
}

#[tokio::test]
#[cfg(feature = "integration-tests")]
async fn should_render_an_entity_in_front_of_the_sky() -> anyhow::Result<()> {
    use cgmath::{Deg, Vector3};
    use common::test_utils::{Harness, centre};
    use flow_render::{
        camera::Camera,
        config::RenderConfig,
        data_structures::{
            entity::Entity,
            instance::Instance,
            model::{MeshData, ModelTexture, TexturedModel},
        },
    };

    let config = RenderConfig::default().with_sky_colour(1.0, 1.0, 1.0);
    let mut harness = Harness::new(config, [255, 255, 255, 255]).await?;
    let texture = harness.solid_texture([0, 0, 0, 255]);
    let quad = MeshData {
        positions: vec![[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [1.0, 1.0, 0.0], [-1.0, 1.0, 0.0]],
        tex_coords: vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
        normals: vec![[0.0, 0.0, 1.0]; 4],
        indices: vec![0, 1, 2, 0, 2, 3],
    };
    let raw = harness.loader.load_mesh(&harness.ctx, &quad, "quad")?;
    let model = TexturedModel::new(raw, ModelTexture::new(texture));
    let sign = Entity::new(model, Instance::from(Vector3::new(0.0, 0.0, -5.0)));

    harness.renderer.process_entity(&sign);
    let image = harness.capture(&[], &Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(0.0))).await?;

    assert_eq!(centre(&image), image::Rgba([0, 0, 0, 255]));
    // the corners still show the sky
    assert_eq!(*image.get_pixel(0, 0), image::Rgba([255, 255, 255, 255]));
    Ok(())
}

#[tokio::test]
#[cfg(feature = "integration-tests")]
async fn should_render_lit_terrain() -> anyhow::Result<()> {
    use cgmath::{Deg, Vector3};
    use common::test_utils::{Harness, centre};
    use flow_render::{
        camera::Camera,
        config::RenderConfig,
        data_structures::{
            light::Light,
            terrain::{HeightMap, Terrain, TerrainTexturePack},
        },
    };

    let mut harness = Harness::new(RenderConfig::default(), [255, 255, 255, 255]).await?;
    let grass = harness.solid_texture([0, 255, 0, 255]);
    let mud = harness.solid_texture([255, 0, 0, 255]);
    let blend_map = harness.solid_texture([0, 0, 0, 255]);
    let textures = TerrainTexturePack {
        background: grass,
        r: mud,
        g: mud,
        b: mud,
    };
    let terrain = Terrain::generate(
        &harness.ctx,
        &mut harness.loader,
        0,
        0,
        textures,
        blend_map,
        HeightMap::flat(16)?,
    )?;
    let sun = Light::new(Vector3::new(400.0, 1000.0, 400.0), Vector3::new(1.0, 1.0, 1.0));

    harness.renderer.process_terrain(&terrain);
    let camera = Camera::new((400.0, 10.0, 400.0), Deg(0.0), Deg(90.0));
    let image = harness.capture(&[sun], &camera).await?;

    let pixel = centre(&image);
    assert!(pixel[1] > 200, "expected grass, got {:?}", pixel);
    assert!(pixel[0] < 30 && pixel[2] < 30, "expected grass, got {:?}", pixel);
    Ok(())
}
