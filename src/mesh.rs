use anyhow::{anyhow, Context, Result};
use glam::{Vec2, Vec3};
use gltf::mesh::Mode;
use std::path::Path;

#[derive(Clone, Copy, Debug)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self { position: position.to_array(), normal: normal.to_array(), uv: uv.to_array() }
    }
}

/// CPU-side triangle mesh imported from a generated glTF/GLB file. The host
/// renderer owns any GPU representation.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub bounds: MeshBounds,
}

#[derive(Clone, Debug)]
pub struct MeshBounds {
    pub min: Vec3,
    pub max: Vec3,
    pub center: Vec3,
    pub radius: f32,
}

impl Mesh {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        let bounds = MeshBounds::from_vertices(&vertices);
        Self { vertices, indices, bounds }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Placeholder stand-in for a model whose source file could not be
    /// parsed; keeps the entity alive and pickable.
    pub fn cube(size: f32) -> Self {
        let hs = size * 0.5;
        let positions = [
            Vec3::new(-hs, -hs, -hs),
            Vec3::new(hs, -hs, -hs),
            Vec3::new(hs, hs, -hs),
            Vec3::new(-hs, hs, -hs),
            Vec3::new(-hs, -hs, hs),
            Vec3::new(hs, -hs, hs),
            Vec3::new(hs, hs, hs),
            Vec3::new(-hs, hs, hs),
        ];
        let normals = [
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
        ];

        let uv_quad = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)];
        let mut vertices = Vec::with_capacity(24);
        let mut write_face = |corner_indices: [usize; 4], normal: Vec3| {
            for (i, &index) in corner_indices.iter().enumerate() {
                vertices.push(MeshVertex::new(positions[index], normal, uv_quad[i]));
            }
        };

        write_face([0, 3, 2, 1], normals[0]); // back
        write_face([4, 5, 6, 7], normals[1]); // front
        write_face([0, 4, 7, 3], normals[2]); // left
        write_face([1, 2, 6, 5], normals[3]); // right
        write_face([3, 7, 6, 2], normals[4]); // top
        write_face([0, 1, 5, 4], normals[5]); // bottom

        let mut indices = Vec::with_capacity(36);
        for face in 0..6u32 {
            let base = face * 4;
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::new(vertices, indices)
    }

    /// Imports every triangle primitive of every mesh in the file into one
    /// flat vertex/index list. Generated environment GLBs often contain more
    /// than one node.
    pub fn load_gltf(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let (document, buffers, _images) = gltf::import(path_ref)
            .with_context(|| format!("Failed to import glTF from {}", path_ref.display()))?;

        let mut vertices: Vec<MeshVertex> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();

        for mesh in document.meshes() {
            for primitive in mesh.primitives() {
                if primitive.mode() != Mode::Triangles {
                    continue;
                }
                let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
                let positions_iter = reader
                    .read_positions()
                    .ok_or_else(|| anyhow!("POSITION attribute missing in {}", path_ref.display()))?;
                let positions: Vec<Vec3> = positions_iter.map(Vec3::from_array).collect();
                if positions.is_empty() {
                    continue;
                }

                let mut normals: Vec<Vec3> = reader
                    .read_normals()
                    .map(|it| it.map(Vec3::from_array).collect())
                    .unwrap_or_default();

                let mut tex_coords: Vec<Vec2> = reader
                    .read_tex_coords(0)
                    .map(|coords| coords.into_f32().map(Vec2::from_array).collect())
                    .unwrap_or_else(|| vec![Vec2::ZERO; positions.len()]);

                let local_indices: Vec<u32> = reader
                    .read_indices()
                    .map(|read| read.into_u32().collect())
                    .unwrap_or_else(|| (0..positions.len() as u32).collect());

                if normals.len() != positions.len()
                    || normals.iter().all(|n| n.length_squared() == 0.0)
                {
                    normals = compute_normals(&positions, &local_indices);
                }
                if tex_coords.len() != positions.len() {
                    tex_coords.resize(positions.len(), Vec2::ZERO);
                }

                let base_vertex = vertices.len() as u32;
                vertices.extend(positions.iter().enumerate().map(|(i, pos)| {
                    let normal = normals.get(i).copied().unwrap_or(Vec3::Y).normalize_or_zero();
                    let uv = tex_coords.get(i).copied().unwrap_or(Vec2::ZERO);
                    MeshVertex::new(*pos, normal, uv)
                }));
                indices.extend(local_indices.iter().map(|idx| idx + base_vertex));
            }
        }

        if indices.is_empty() {
            return Err(anyhow!("{} contains no triangle primitives", path_ref.display()));
        }

        Ok(Self::new(vertices, indices))
    }
}

fn compute_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks(3) {
        if tri.len() < 3 {
            continue;
        }
        let i0 = tri[0] as usize;
        let i1 = tri[1] as usize;
        let i2 = tri[2] as usize;
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }
        let normal = (positions[i1] - positions[i0]).cross(positions[i2] - positions[i0]);
        normals[i0] += normal;
        normals[i1] += normal;
        normals[i2] += normal;
    }
    for normal in &mut normals {
        if normal.length_squared() > 0.0 {
            *normal = normal.normalize();
        } else {
            *normal = Vec3::Y;
        }
    }
    normals
}

impl MeshBounds {
    pub fn from_vertices(vertices: &[MeshVertex]) -> Self {
        if vertices.is_empty() {
            return MeshBounds { min: Vec3::ZERO, max: Vec3::ZERO, center: Vec3::ZERO, radius: 0.0 };
        }
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for vertex in vertices {
            let pos = Vec3::from_array(vertex.position);
            min = min.min(pos);
            max = max.max(pos);
        }
        let center = (min + max) * 0.5;
        let mut radius: f32 = 0.0;
        for vertex in vertices {
            let pos = Vec3::from_array(vertex.position);
            radius = radius.max((pos - center).length());
        }
        MeshBounds { min, max, center, radius }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_bounds_are_symmetric() {
        let mesh = Mesh::cube(2.0);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        assert!((mesh.bounds.min - Vec3::splat(-1.0)).length() < 1e-6);
        assert!((mesh.bounds.max - Vec3::splat(1.0)).length() < 1e-6);
        assert!((mesh.bounds.center).length() < 1e-6);
        assert!((mesh.bounds.radius - Vec3::splat(1.0).length()).abs() < 1e-5);
    }

    #[test]
    fn computed_normals_face_outward_for_ccw_triangle() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let normals = compute_normals(&positions, &[0, 1, 2]);
        for normal in normals {
            assert!((normal - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn load_gltf_rejects_junk_bytes() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("broken.glb");
        std::fs::write(&path, b"not a mesh").expect("write junk");
        assert!(Mesh::load_gltf(&path).is_err());
    }
}
