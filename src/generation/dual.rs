//! Dual tiling generation: pentagon/hexagon fans from a subdivided icosphere
//!
//! The dual of a subdivided icosahedron is a Goldberg-style tiling: one tile
//! per triangle-mesh vertex, with the tile's corners at the adjacent face
//! centroids. Tiles around the 12 original icosahedron vertices have five
//! corners, all others six. The output encodes every tile as a consecutive
//! triangle fan whose first index is the tile's center vertex, which is the
//! layout the fan-based mesh builder consumes.

use glam::DVec3;

use crate::error::Result;
use crate::generation::icosphere;

const EPS: f64 = 1e-12;

/// A fan-encoded dual sphere tiling with per-vertex shading attributes
#[derive(Debug, Clone)]
pub struct TiledSphere {
    /// Base icosphere vertices first, then one centroid per base face
    pub vertices: Vec<DVec3>,
    /// Flat triangle index list; consecutive triangles sharing a first
    /// index form one tile fan
    pub triangles: Vec<usize>,
    /// Unit outward normal per vertex
    pub normals: Vec<DVec3>,
    /// Equirectangular UV per vertex
    pub uvs: Vec<[f64; 2]>,
    /// Tangent per vertex, orthogonal to the normal
    pub tangents: Vec<DVec3>,
}

impl TiledSphere {
    /// Number of triangles in the fan encoding
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }
}

/// Generate the dual pentagon/hexagon tiling of a subdivided icosphere
///
/// # Errors
///
/// Returns `InvalidConfig` if `radius` is not strictly positive.
pub fn generate_tiled_sphere(subdivisions: u32, radius: f64) -> Result<TiledSphere> {
    let base = icosphere::generate(subdivisions, radius)?;
    let base_vertex_count = base.vertices.len();

    let face_centers: Vec<DVec3> = base
        .faces
        .iter()
        .map(|&[a, b, c]| {
            ((base.vertices[a] + base.vertices[b] + base.vertices[c]) / 3.0).normalize() * radius
        })
        .collect();

    let mut vertices = Vec::with_capacity(base_vertex_count + face_centers.len());
    vertices.extend_from_slice(&base.vertices);
    vertices.extend_from_slice(&face_centers);

    let mut faces_by_vertex: Vec<Vec<usize>> = vec![Vec::new(); base_vertex_count];
    for (face_index, &[a, b, c]) in base.faces.iter().enumerate() {
        faces_by_vertex[a].push(face_index);
        faces_by_vertex[b].push(face_index);
        faces_by_vertex[c].push(face_index);
    }

    let mut triangles = Vec::new();
    for (vertex_index, adjacent_faces) in faces_by_vertex.iter().enumerate() {
        if adjacent_faces.len() < 3 {
            continue;
        }
        let ordered = sort_faces_around_vertex(
            vertices[vertex_index],
            &face_centers,
            adjacent_faces,
        );
        let ring: Vec<usize> = ordered.iter().map(|&f| base_vertex_count + f).collect();
        for i in 0..ring.len() {
            triangles.push(vertex_index);
            triangles.push(ring[i]);
            triangles.push(ring[(i + 1) % ring.len()]);
        }
    }

    let mut normals = Vec::with_capacity(vertices.len());
    let mut uvs = Vec::with_capacity(vertices.len());
    let mut tangents = Vec::with_capacity(vertices.len());
    for &p in &vertices {
        let n = p.normalize();
        normals.push(n);
        uvs.push(spherical_uv(n));
        tangents.push(default_tangent(n));
    }

    Ok(TiledSphere {
        vertices,
        triangles,
        normals,
        uvs,
        tangents,
    })
}

/// Order a vertex's adjacent face centroids by angle around its radial axis
fn sort_faces_around_vertex(
    vertex: DVec3,
    face_centers: &[DVec3],
    adjacent_faces: &[usize],
) -> Vec<usize> {
    let normal = vertex.normalize();
    let mut reference = project_to_tangent_plane(face_centers[adjacent_faces[0]], normal);
    if reference.length() < EPS {
        reference = fallback_tangent(normal);
    } else {
        reference = reference.normalize();
    }

    let mut ordered: Vec<(usize, f64)> = adjacent_faces
        .iter()
        .map(|&face_index| {
            (
                face_index,
                angle_around(face_centers[face_index], normal, reference),
            )
        })
        .collect();
    ordered.sort_by(|a, b| a.1.total_cmp(&b.1));
    ordered.into_iter().map(|(face_index, _)| face_index).collect()
}

fn angle_around(point: DVec3, normal: DVec3, reference: DVec3) -> f64 {
    let mut projected = project_to_tangent_plane(point, normal);
    if projected.length() < EPS {
        projected = reference;
    } else {
        projected = projected.normalize();
    }
    let x = reference.dot(projected);
    let y = normal.dot(reference.cross(projected));
    y.atan2(x)
}

fn project_to_tangent_plane(p: DVec3, normal: DVec3) -> DVec3 {
    p - normal * p.dot(normal)
}

fn fallback_tangent(normal: DVec3) -> DVec3 {
    let axis = if normal.y.abs() < 0.9 {
        DVec3::Y
    } else {
        DVec3::X
    };
    axis.cross(normal).normalize()
}

fn default_tangent(normal: DVec3) -> DVec3 {
    let mut t = DVec3::Y.cross(normal);
    if t.length() < EPS {
        t = DVec3::X.cross(normal);
    }
    t.normalize()
}

fn spherical_uv(normal: DVec3) -> [f64; 2] {
    let clamped_y = normal.y.clamp(-1.0, 1.0);
    let u = normal.z.atan2(normal.x) / std::f64::consts::TAU + 0.5;
    let v = 0.5 - clamped_y.asin() / std::f64::consts::PI;
    [u, v]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{from_triangle_fans, TileType};

    #[test]
    fn test_tiled_icosahedron_structure() {
        let sphere = generate_tiled_sphere(0, 1.0).unwrap();
        // 12 base vertices + 20 face centroids
        assert_eq!(sphere.vertices.len(), 32);
        // every base vertex fans into 5 triangles
        assert_eq!(sphere.triangle_count(), 60);
        assert_eq!(sphere.normals.len(), sphere.vertices.len());
        assert_eq!(sphere.uvs.len(), sphere.vertices.len());
        assert_eq!(sphere.tangents.len(), sphere.vertices.len());
    }

    #[test]
    fn test_pentagon_and_hexagon_counts() {
        let sphere = generate_tiled_sphere(1, 1.0).unwrap();
        let built = from_triangle_fans(&sphere.vertices, &sphere.triangles);
        let tiles = built.mesh.tiles();
        // 42 base vertices: 12 pentagons around the original icosahedron
        // vertices, 30 hexagons around the inserted midpoints
        assert_eq!(tiles.len(), 42);
        let pentagons = tiles.iter().filter(|t| t.kind == TileType::Pentagon).count();
        assert_eq!(pentagons, 12);
        assert_eq!(tiles.len() - pentagons, 30);
        // the pentagon fans come first, centered on the original vertices
        for tile in &tiles[..12] {
            assert_eq!(tile.kind, TileType::Pentagon);
        }
    }

    #[test]
    fn test_all_attribute_vectors_unit_length() {
        let sphere = generate_tiled_sphere(1, 2.0).unwrap();
        for (n, t) in sphere.normals.iter().zip(&sphere.tangents) {
            assert!((n.length() - 1.0).abs() < 1e-9);
            assert!((t.length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_uv_range() {
        let sphere = generate_tiled_sphere(1, 1.0).unwrap();
        for [u, v] in &sphere.uvs {
            assert!((0.0..=1.0).contains(u));
            assert!((0.0..=1.0).contains(v));
        }
    }
}
