//! CPU-side mesh representation produced by the OBJ loader.

/// Non-indexed triangle list: every three vertices form one triangle.
///
/// `positions` holds 3 floats per vertex and `texcoords` 2 floats per vertex,
/// index-aligned. The V component is already flipped (`1.0 - v`) so that
/// OBJ's bottom-left texture origin matches wgpu's top-left one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<f32>,
    pub texcoords: Vec<f32>,
}

impl Mesh {
    pub fn with_capacity(vertices: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices * 3),
            texcoords: Vec::with_capacity(vertices * 2),
        }
    }

    /// Append one vertex. `uv` is the raw OBJ coordinate, flipped here.
    pub fn push_vertex(&mut self, position: [f32; 3], uv: [f32; 2]) {
        self.positions.extend_from_slice(&position);
        self.texcoords.push(uv[0]);
        self.texcoords.push(1.0 - uv[1]);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }

    /// Returns `true` if the arrays are aligned and hold whole triangles.
    pub fn is_valid(&self) -> bool {
        self.positions.len() % 3 == 0
            && self.texcoords.len() % 2 == 0
            && self.positions.len() / 3 == self.texcoords.len() / 2
            && self.vertex_count() % 3 == 0
            && self.vertex_count() > 0
    }
}

/// One shape of a model together with the material it is drawn with.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshPart {
    pub name: String,
    pub mesh: Mesh,
    /// Index into [`ModelData::materials`].
    pub material: Option<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialInfo {
    pub name: String,
    /// Diffuse texture file name, relative to the texture directory.
    pub diffuse_texture: Option<String>,
}

/// Everything the viewer needs from one OBJ file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelData {
    pub parts: Vec<MeshPart>,
    pub materials: Vec<MaterialInfo>,
}

impl ModelData {
    pub fn total_vertices(&self) -> usize {
        self.parts.iter().map(|p| p.mesh.vertex_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_vertex_flips_v() {
        let mut mesh = Mesh::default();
        mesh.push_vertex([1.0, 2.0, 3.0], [0.5, 0.25]);
        assert_eq!(mesh.positions, vec![1.0, 2.0, 3.0]);
        assert_eq!(mesh.texcoords, vec![0.5, 0.75]);
    }

    #[test]
    fn validity_requires_whole_triangles() {
        let mut mesh = Mesh::default();
        assert!(!mesh.is_valid());
        for _ in 0..3 {
            mesh.push_vertex([0.0; 3], [0.0; 2]);
        }
        assert!(mesh.is_valid());
        assert_eq!(mesh.triangle_count(), 1);

        mesh.texcoords.pop();
        assert!(!mesh.is_valid());
    }
}
