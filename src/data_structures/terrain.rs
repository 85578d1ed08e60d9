//! Heightmap terrain.
//!
//! A [`Terrain`] is one square tile of ground, [`TERRAIN_SIZE`] world units
//! wide, placed on a grid. Its shape comes from a [`HeightMap`] which also
//! answers height queries so objects can stand on the ground.

use std::sync::Arc;

use anyhow::{Context as _, bail};
use image::GenericImageView;

use crate::{
    context::Context,
    data_structures::model::{MeshData, RawModel, TextureId, Vertex},
    resources::Loader,
};

/// Edge length of one terrain tile in world units.
pub const TERRAIN_SIZE: f32 = 800.0;
/// Largest height (and deepest depth) a heightmap image can express.
pub const MAX_HEIGHT: f32 = 40.0;

const HALF_PIXEL_COLOUR: f32 = (256 * 256 * 256 / 2) as f32;

/// Square grid of heights, indexed by `(x, z)` grid coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightMap {
    size: usize,
    heights: Vec<f32>,
}

impl HeightMap {
    /// Sample `height(x, z)` on a `size` by `size` grid.
    pub fn from_fn(size: usize, height: impl Fn(usize, usize) -> f32) -> anyhow::Result<Self> {
        if size < 2 {
            bail!("a heightmap needs at least 2x2 vertices, got {}", size);
        }
        let mut heights = Vec::with_capacity(size * size);
        for z in 0..size {
            for x in 0..size {
                heights.push(height(x, z));
            }
        }
        Ok(Self { size, heights })
    }

    /// A completely flat map.
    pub fn flat(size: usize) -> anyhow::Result<Self> {
        Self::from_fn(size, |_, _| 0.0)
    }

    /// Read heights from a square greyscale (or colour) image. The packed RGB
    /// value of each pixel maps linearly onto `-MAX_HEIGHT..MAX_HEIGHT`.
    pub fn from_image(image: &image::DynamicImage) -> anyhow::Result<Self> {
        let (width, height) = image.dimensions();
        if width != height {
            bail!("heightmap images must be square, got {}x{}", width, height);
        }
        let rgb = image.to_rgb8();
        Self::from_fn(height as usize, |x, z| {
            let pixel = rgb.get_pixel(x as u32, z as u32);
            pixel_height(pixel.0)
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let image = image::load_from_memory(bytes).context("could not decode heightmap image")?;
        Self::from_image(&image)
    }

    /// Vertices along one edge.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Height at a grid vertex; `0.0` outside the grid.
    pub fn get(&self, x: i64, z: i64) -> f32 {
        if x < 0 || z < 0 || x >= self.size as i64 || z >= self.size as i64 {
            return 0.0;
        }
        self.heights[z as usize * self.size + x as usize]
    }

    fn normal(&self, x: i64, z: i64) -> cgmath::Vector3<f32> {
        use cgmath::InnerSpace;
        let left = self.get(x - 1, z);
        let right = self.get(x + 1, z);
        let down = self.get(x, z - 1);
        let up = self.get(x, z + 1);
        cgmath::Vector3::new(left - right, 2.0, down - up).normalize()
    }

    /// Build the tile mesh: one vertex per grid point spanning `size` world
    /// units, two counter-clockwise triangles per grid square.
    pub fn to_mesh(&self, size: f32) -> MeshData {
        let count = self.size;
        let last = (count - 1) as f32;
        let mut mesh = MeshData {
            positions: Vec::with_capacity(count * count),
            tex_coords: Vec::with_capacity(count * count),
            normals: Vec::with_capacity(count * count),
            indices: Vec::with_capacity(6 * (count - 1) * (count - 1)),
        };
        for z in 0..count {
            for x in 0..count {
                let (u, v) = (x as f32 / last, z as f32 / last);
                mesh.positions
                    .push([u * size, self.get(x as i64, z as i64), v * size]);
                mesh.tex_coords.push([u, v]);
                mesh.normals.push(self.normal(x as i64, z as i64).into());
            }
        }
        for gz in 0..count - 1 {
            for gx in 0..count - 1 {
                let top_left = (gz * count + gx) as u32;
                let top_right = top_left + 1;
                let bottom_left = ((gz + 1) * count + gx) as u32;
                let bottom_right = bottom_left + 1;
                mesh.indices.extend_from_slice(&[
                    top_left,
                    bottom_left,
                    top_right,
                    top_right,
                    bottom_left,
                    bottom_right,
                ]);
            }
        }
        mesh
    }
}

fn pixel_height([r, g, b]: [u8; 3]) -> f32 {
    let packed = ((r as u32) << 16 | (g as u32) << 8 | b as u32) as f32;
    (packed / HALF_PIXEL_COLOUR - 1.0) * MAX_HEIGHT
}

/// The four ground textures a blend map mixes between.
///
/// Black areas of the blend map show `background`; the red, green and blue
/// channels fade in the matching textures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TerrainTexturePack {
    pub background: TextureId,
    pub r: TextureId,
    pub g: TextureId,
    pub b: TextureId,
}

#[derive(Clone, Debug)]
pub struct Terrain {
    pub grid_x: i32,
    pub grid_z: i32,
    pub model: RawModel,
    pub textures: TerrainTexturePack,
    pub blend_map: TextureId,
    pub heights: Arc<HeightMap>,
}

impl Terrain {
    pub fn new(
        grid_x: i32,
        grid_z: i32,
        model: RawModel,
        textures: TerrainTexturePack,
        blend_map: TextureId,
        heights: Arc<HeightMap>,
    ) -> Self {
        Self {
            grid_x,
            grid_z,
            model,
            textures,
            blend_map,
            heights,
        }
    }

    /// Generate the tile mesh from `heights` and upload it.
    pub fn generate(
        ctx: &Context,
        loader: &mut Loader,
        grid_x: i32,
        grid_z: i32,
        textures: TerrainTexturePack,
        blend_map: TextureId,
        heights: HeightMap,
    ) -> anyhow::Result<Self> {
        let model = loader
            .load_mesh(ctx, &heights.to_mesh(TERRAIN_SIZE), "terrain")
            .with_context(|| format!("could not upload terrain ({}, {})", grid_x, grid_z))?;
        Ok(Self::new(
            grid_x,
            grid_z,
            model,
            textures,
            blend_map,
            Arc::new(heights),
        ))
    }

    /// World position of the tile's corner.
    pub fn origin(&self) -> cgmath::Vector3<f32> {
        cgmath::Vector3::new(
            self.grid_x as f32 * TERRAIN_SIZE,
            0.0,
            self.grid_z as f32 * TERRAIN_SIZE,
        )
    }

    pub fn to_raw(&self) -> TerrainRaw {
        TerrainRaw {
            offset: self.origin().extend(0.0).into(),
        }
    }

    /// Ground height below a world position, interpolated across the grid
    /// triangle containing it. Positions off this tile yield `0.0`.
    pub fn height_at(&self, world_x: f32, world_z: f32) -> f32 {
        let origin = self.origin();
        let terrain_x = world_x - origin.x;
        let terrain_z = world_z - origin.z;
        let square = TERRAIN_SIZE / (self.heights.size() - 1) as f32;
        let grid_x = (terrain_x / square).floor();
        let grid_z = (terrain_z / square).floor();
        let last = (self.heights.size() - 1) as f32;
        if grid_x < 0.0 || grid_z < 0.0 || grid_x >= last || grid_z >= last {
            return 0.0;
        }
        let x_coord = (terrain_x - grid_x * square) / square;
        let z_coord = (terrain_z - grid_z * square) / square;
        let (gx, gz) = (grid_x as i64, grid_z as i64);
        let h = |dx: i64, dz: i64| self.heights.get(gx + dx, gz + dz);
        let point = cgmath::Vector2::new(x_coord, z_coord);
        if x_coord <= 1.0 - z_coord {
            barycentric(
                cgmath::Vector3::new(0.0, h(0, 0), 0.0),
                cgmath::Vector3::new(1.0, h(1, 0), 0.0),
                cgmath::Vector3::new(0.0, h(0, 1), 1.0),
                point,
            )
        } else {
            barycentric(
                cgmath::Vector3::new(1.0, h(1, 0), 0.0),
                cgmath::Vector3::new(1.0, h(1, 1), 1.0),
                cgmath::Vector3::new(0.0, h(0, 1), 1.0),
                point,
            )
        }
    }
}

/// Per-tile data of the terrain pass: where the tile's mesh is placed.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TerrainRaw {
    pub offset: [f32; 4],
}

impl Vertex for TerrainRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TerrainRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 5,
                format: wgpu::VertexFormat::Float32x4,
            }],
        }
    }
}

/// Interpolate the `y` of a triangle (given in x/z with heights in y) at `pos`.
fn barycentric(
    p1: cgmath::Vector3<f32>,
    p2: cgmath::Vector3<f32>,
    p3: cgmath::Vector3<f32>,
    pos: cgmath::Vector2<f32>,
) -> f32 {
    let det = (p2.z - p3.z) * (p1.x - p3.x) + (p3.x - p2.x) * (p1.z - p3.z);
    let l1 = ((p2.z - p3.z) * (pos.x - p3.x) + (p3.x - p2.x) * (pos.y - p3.z)) / det;
    let l2 = ((p3.z - p1.z) * (pos.x - p3.x) + (p1.x - p3.x) * (pos.y - p3.z)) / det;
    let l3 = 1.0 - l1 - l2;
    l1 * p1.y + l2 * p2.y + l3 * p3.y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::model::MeshId;
    use approx::assert_relative_eq;

    fn pack() -> TerrainTexturePack {
        TerrainTexturePack {
            background: TextureId(0),
            r: TextureId(1),
            g: TextureId(2),
            b: TextureId(3),
        }
    }

    fn terrain(grid_x: i32, grid_z: i32, heights: HeightMap) -> Terrain {
        Terrain::new(
            grid_x,
            grid_z,
            RawModel::new(MeshId(0), 0),
            pack(),
            TextureId(4),
            Arc::new(heights),
        )
    }

    #[test]
    fn rejects_degenerate_maps() {
        assert!(HeightMap::flat(1).is_err());
        let image = image::DynamicImage::new_rgb8(4, 3);
        assert!(HeightMap::from_image(&image).is_err());
    }

    #[test]
    fn pixel_colours_span_the_height_range() {
        assert_relative_eq!(pixel_height([0, 0, 0]), -MAX_HEIGHT);
        assert_relative_eq!(pixel_height([128, 0, 0]), 0.0);
        assert!(pixel_height([255, 255, 255]) < MAX_HEIGHT);
        assert_relative_eq!(pixel_height([255, 255, 255]), MAX_HEIGHT, epsilon = 1e-3);
    }

    #[test]
    fn reads_heights_from_images() {
        let mut image = image::RgbImage::new(2, 2);
        image.put_pixel(1, 0, image::Rgb([128, 0, 0]));
        let map = HeightMap::from_image(&image::DynamicImage::ImageRgb8(image)).unwrap();
        assert_eq!(map.size(), 2);
        assert_relative_eq!(map.get(0, 0), -MAX_HEIGHT);
        assert_relative_eq!(map.get(1, 0), 0.0);
        assert_eq!(map.get(5, 0), 0.0);
    }

    #[test]
    fn mesh_covers_the_tile() {
        let map = HeightMap::from_fn(3, |x, z| (x + z) as f32).unwrap();
        let mesh = map.to_mesh(TERRAIN_SIZE);
        assert_eq!(mesh.positions.len(), 9);
        assert_eq!(mesh.indices.len(), 6 * 4);
        assert_eq!(mesh.positions[0], [0.0, 0.0, 0.0]);
        assert_eq!(mesh.positions[8], [TERRAIN_SIZE, 4.0, TERRAIN_SIZE]);
        assert_eq!(mesh.tex_coords[4], [0.5, 0.5]);
        assert_eq!(&mesh.indices[..6], &[0, 3, 1, 1, 3, 4]);
        assert!(mesh.vertices().is_ok());
    }

    #[test]
    fn flat_ground_points_up() {
        let mesh = HeightMap::flat(4).unwrap().to_mesh(10.0);
        assert!(mesh.normals.iter().all(|n| *n == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn triangles_wind_counter_clockwise_from_above() {
        use cgmath::{InnerSpace, Vector3};
        let mesh = HeightMap::flat(2).unwrap().to_mesh(1.0);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vector3::from(mesh.positions[i as usize]));
            let normal = (b - a).cross(c - a);
            assert!(normal.dot(Vector3::unit_y()) > 0.0);
        }
    }

    #[test]
    fn height_interpolates_inside_a_square() {
        // a ramp rising one unit per grid square along x
        let map = HeightMap::from_fn(5, |x, _| x as f32).unwrap();
        let terrain = terrain(0, 0, map);
        let square = TERRAIN_SIZE / 4.0;
        assert_relative_eq!(terrain.height_at(0.0, 0.0), 0.0);
        assert_relative_eq!(terrain.height_at(square * 1.5, square * 0.25), 1.5, epsilon = 1e-4);
        assert_relative_eq!(terrain.height_at(square * 2.75, square * 0.9), 2.75, epsilon = 1e-4);
    }

    #[test]
    fn tiles_are_offset_by_their_grid_cell() {
        let terrain = terrain(-1, 2, HeightMap::flat(2).unwrap());
        assert_eq!(terrain.to_raw().offset, [-TERRAIN_SIZE, 0.0, 2.0 * TERRAIN_SIZE, 0.0]);
        assert_eq!(std::mem::size_of::<TerrainRaw>(), 16);
    }

    #[test]
    fn height_respects_the_grid_position() {
        let map = HeightMap::from_fn(3, |_, _| 7.0).unwrap();
        let terrain = terrain(1, -1, map);
        assert_relative_eq!(terrain.height_at(900.0, -700.0), 7.0, epsilon = 1e-4);
        assert_eq!(terrain.height_at(100.0, -700.0), 0.0);
        assert_eq!(terrain.height_at(900.0, 100.0), 0.0);
    }
}
