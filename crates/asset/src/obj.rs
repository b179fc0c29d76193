//! OBJ/MTL loading via `tobj`, flattened into non-indexed triangle lists.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use corelib::{ViewerError, ViewerResult};

use crate::mesh::{MaterialInfo, Mesh, MeshPart, ModelData};

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    }
}

/// Load an OBJ model; `mtllib` files are resolved against `material_dir`.
pub fn load_model(path: impl AsRef<Path>, material_dir: impl AsRef<Path>) -> ViewerResult<ModelData> {
    let path = path.as_ref();
    let material_dir = material_dir.as_ref();
    log::info!("Loading model from {:?} (materials in {:?})", path, material_dir);

    let file = File::open(path).map_err(|e| ViewerError::asset(path, e))?;
    let mut reader = BufReader::new(file);
    load_model_from_reader(&mut reader, path, |mtl| {
        tobj::load_mtl(material_dir.join(mtl))
    })
}

/// Load an OBJ model from any reader. `source` is only used in messages.
pub fn load_model_from_reader<R, ML>(
    reader: &mut R,
    source: &Path,
    material_loader: ML,
) -> ViewerResult<ModelData>
where
    R: BufRead,
    ML: Fn(&Path) -> tobj::MTLLoadResult,
{
    let (models, materials) = tobj::load_obj_buf(reader, &load_options(), material_loader)
        .map_err(|e| ViewerError::asset(source, e))?;

    let materials = match materials {
        Ok(materials) => materials,
        Err(e) => {
            log::warn!("Material library for {:?} not loaded: {}", source, e);
            Vec::new()
        }
    };

    let materials: Vec<MaterialInfo> = materials
        .into_iter()
        .map(|m| MaterialInfo {
            name: m.name,
            diffuse_texture: m.diffuse_texture.filter(|t| !t.is_empty()),
        })
        .collect();

    let mut parts = Vec::with_capacity(models.len());
    for model in models {
        let mesh = flatten_mesh(&model.mesh)
            .map_err(|reason| ViewerError::asset(source, format!("shape '{}': {reason}", model.name)))?;
        if mesh.vertex_count() == 0 {
            log::warn!("Skipping shape '{}' without triangles", model.name);
            continue;
        }
        let material = model.mesh.material_id.filter(|&id| id < materials.len());
        log::debug!(
            "Shape '{}': {} triangles, material {:?}",
            model.name,
            mesh.triangle_count(),
            material
        );
        parts.push(MeshPart {
            name: model.name,
            mesh,
            material,
        });
    }

    if parts.is_empty() {
        return Err(ViewerError::asset(source, "OBJ contained no triangles"));
    }

    let data = ModelData { parts, materials };
    log::info!(
        "Loaded {} shape(s), {} material(s), {} vertices",
        data.parts.len(),
        data.materials.len(),
        data.total_vertices()
    );
    Ok(data)
}

/// Expand an indexed `tobj` mesh into a flat triangle list.
///
/// Faces without texture coordinates get raw UV (0, 0).
pub fn flatten_mesh(mesh: &tobj::Mesh) -> Result<Mesh, String> {
    if mesh.indices.len() % 3 != 0 {
        return Err(format!(
            "index count {} is not a multiple of 3",
            mesh.indices.len()
        ));
    }

    let mut out = Mesh::with_capacity(mesh.indices.len());
    for (corner, &pi) in mesh.indices.iter().enumerate() {
        let p = pi as usize * 3;
        let position = mesh
            .positions
            .get(p..p + 3)
            .ok_or_else(|| format!("position index {pi} out of bounds"))?;

        let uv = if mesh.texcoords.is_empty() {
            [0.0, 0.0]
        } else {
            // Single-indexed meshes leave texcoord_indices empty.
            let ti = mesh.texcoord_indices.get(corner).copied().unwrap_or(pi);
            let t = ti as usize * 2;
            let uv = mesh
                .texcoords
                .get(t..t + 2)
                .ok_or_else(|| format!("texcoord index {ti} out of bounds"))?;
            [uv[0], uv[1]]
        };

        out.push_vertex([position[0], position[1], position[2]], uv);
    }
    Ok(out)
}
