//! Entities: positioned instances of a shared textured model.

use std::sync::Arc;

use crate::data_structures::{
    instance::{Instance, InstanceRaw},
    model::TexturedModel,
};

/// A renderable game object.
///
/// Entities are cheap to clone: the model is shared through an `Arc` and
/// everything else is plain data.
#[derive(Clone, Debug)]
pub struct Entity {
    pub model: Arc<TexturedModel>,
    pub transform: Instance,
    /// Cell of the model's texture atlas, counted row by row from the top left.
    pub texture_index: u32,
}

impl Entity {
    pub fn new(model: Arc<TexturedModel>, transform: Instance) -> Self {
        Self {
            model,
            transform,
            texture_index: 0,
        }
    }

    pub fn with_texture_index(mut self, texture_index: u32) -> Self {
        self.texture_index = texture_index;
        self
    }

    /// Offset of this entity's atlas cell in texture coordinates. Indices
    /// past the last cell wrap around to the start of the atlas.
    pub fn texture_offset(&self) -> cgmath::Vector2<f32> {
        let rows = self.model.texture.number_of_rows.max(1);
        let index = self.texture_index % (rows * rows);
        let column = index % rows;
        let row = index / rows;
        cgmath::Vector2::new(column as f32 / rows as f32, row as f32 / rows as f32)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        let texture = &self.model.texture;
        let offset = self.texture_offset();
        InstanceRaw {
            model: self.transform.to_matrix().into(),
            atlas: [offset.x, offset.y, texture.number_of_rows.max(1) as f32, 0.0],
            material: [
                texture.shine_damper,
                texture.reflectivity,
                if texture.use_fake_lighting { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::model::{MeshId, ModelTexture, RawModel, TextureId};

    fn model(rows: u32) -> Arc<TexturedModel> {
        TexturedModel::new(
            RawModel::new(MeshId(0), 6),
            ModelTexture::new(TextureId(0))
                .with_atlas_rows(rows)
                .with_specular(10.0, 0.5)
                .with_fake_lighting(true),
        )
    }

    #[test]
    fn atlas_offsets_walk_rows_left_to_right() {
        let entity = Entity::new(model(2), Instance::new());
        assert_eq!(entity.texture_offset(), cgmath::Vector2::new(0.0, 0.0));
        let entity = entity.with_texture_index(1);
        assert_eq!(entity.texture_offset(), cgmath::Vector2::new(0.5, 0.0));
        let entity = entity.with_texture_index(3);
        assert_eq!(entity.texture_offset(), cgmath::Vector2::new(0.5, 0.5));
    }

    #[test]
    fn single_cell_textures_have_no_offset() {
        let entity = Entity::new(model(1), Instance::new()).with_texture_index(5);
        assert_eq!(entity.texture_offset(), cgmath::Vector2::new(0.0, 0.0));
    }

    #[test]
    fn indices_past_the_atlas_wrap_around() {
        let entity = Entity::new(model(2), Instance::new()).with_texture_index(5);
        assert_eq!(entity.texture_offset(), cgmath::Vector2::new(0.5, 0.0));
        let entity = entity.with_texture_index(4);
        assert_eq!(entity.texture_offset(), cgmath::Vector2::new(0.0, 0.0));
    }

    #[test]
    fn raw_instance_carries_material() {
        let entity = Entity::new(model(4), cgmath::Vector3::new(1.0, 2.0, 3.0).into())
            .with_texture_index(6);
        let raw = entity.to_raw();
        assert_eq!(raw.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(raw.atlas, [0.5, 0.25, 4.0, 0.0]);
        assert_eq!(raw.material, [10.0, 0.5, 1.0, 0.0]);
    }
}
