use std::io::{BufReader, Cursor};

use crate::{data_structures::model::MeshData, resources::texture::load_string};

/// Read every object of an OBJ file as mesh data. Materials are ignored; the
/// texture of a model is chosen by the caller.
pub async fn load_obj_meshes(file_name: &str) -> anyhow::Result<Vec<MeshData>> {
    let obj_text = load_string(file_name).await?;
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));

    let (models, _materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| async move { Err(tobj::LoadError::OpenFileFailed) },
    )
    .await?;

    Ok(models.iter().map(|m| to_mesh_data(&m.mesh)).collect())
}

pub fn to_mesh_data(mesh: &tobj::Mesh) -> MeshData {
    let count = mesh.positions.len() / 3;
    MeshData {
        positions: (0..count)
            .map(|i| [mesh.positions[i * 3], mesh.positions[i * 3 + 1], mesh.positions[i * 3 + 2]])
            .collect(),
        // OBJ puts v = 0 at the bottom of the image, wgpu at the top
        tex_coords: (0..count)
            .map(|i| {
                [
                    mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                    1.0 - mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
                ]
            })
            .collect(),
        normals: (0..count)
            .map(|i| {
                [
                    mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                    mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                    mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
                ]
            })
            .collect(),
        indices: mesh.indices.clone(),
    }
}
