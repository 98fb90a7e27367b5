//! Icosphere generation by recursive icosahedron subdivision
//!
//! Builds the 12-vertex golden-ratio icosahedron, then refines each of its
//! 20 triangular faces by splitting every triangle into four, inserting one
//! shared midpoint vertex per edge. The midpoint cache is what keeps the
//! subdivision manifold: adjacent triangles that share an edge share the
//! inserted vertex instead of each creating their own.

use std::collections::HashMap;

use glam::DVec3;

use crate::error::{RelaxError, Result};

/// A subdivided icosphere: vertex positions plus triangular faces
///
/// Vertex order is significant downstream: the original 12 icosahedron
/// vertices come first, followed by inserted midpoints in creation order.
/// Tile inference treats the leading vertices as potential polygon centers.
#[derive(Debug, Clone)]
pub struct IcosphereMesh {
    /// Vertex positions, all at distance `radius` from the origin
    pub vertices: Vec<DVec3>,
    /// Triangular faces as vertex index triples
    pub faces: Vec<[usize; 3]>,
}

/// Generate a subdivided icosphere
///
/// Each subdivision pass splits every face into four, so the vertex count
/// grows as `12 + 10·(4^subdivisions − 1)` and the face count as
/// `20·4^subdivisions`. After all passes every vertex is re-normalized to
/// exactly `radius` to remove accumulated floating-point drift.
///
/// # Errors
///
/// Returns `InvalidConfig` if `radius` is not strictly positive.
///
/// # Example
///
/// ```rust
/// use hexsphere_relax::generation::icosphere;
///
/// let mesh = icosphere::generate(2, 1.0).unwrap();
/// assert_eq!(mesh.vertices.len(), 162);
/// assert_eq!(mesh.faces.len(), 320);
/// ```
pub fn generate(subdivisions: u32, radius: f64) -> Result<IcosphereMesh> {
    if !(radius > 0.0) {
        return Err(RelaxError::InvalidConfig(format!(
            "radius must be positive (got {})",
            radius
        )));
    }

    let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let mut vertices = vec![
        DVec3::new(-1.0, phi, 0.0),
        DVec3::new(1.0, phi, 0.0),
        DVec3::new(-1.0, -phi, 0.0),
        DVec3::new(1.0, -phi, 0.0),
        DVec3::new(0.0, -1.0, phi),
        DVec3::new(0.0, 1.0, phi),
        DVec3::new(0.0, -1.0, -phi),
        DVec3::new(0.0, 1.0, -phi),
        DVec3::new(phi, 0.0, -1.0),
        DVec3::new(phi, 0.0, 1.0),
        DVec3::new(-phi, 0.0, -1.0),
        DVec3::new(-phi, 0.0, 1.0),
    ];
    for v in vertices.iter_mut() {
        *v = v.normalize() * radius;
    }

    let mut faces: Vec<[usize; 3]> = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut midpoint_cache: HashMap<(usize, usize), usize> = HashMap::new();
        let mut refined = Vec::with_capacity(faces.len() * 4);
        for &[a, b, c] in &faces {
            let ab = midpoint(a, b, &mut vertices, &mut midpoint_cache, radius);
            let bc = midpoint(b, c, &mut vertices, &mut midpoint_cache, radius);
            let ca = midpoint(c, a, &mut vertices, &mut midpoint_cache, radius);

            refined.push([a, ab, ca]);
            refined.push([b, bc, ab]);
            refined.push([c, ca, bc]);
            refined.push([ab, bc, ca]);
        }
        faces = refined;
    }

    for v in vertices.iter_mut() {
        *v = v.normalize() * radius;
    }

    Ok(IcosphereMesh { vertices, faces })
}

/// Generate only the vertex positions of a subdivided icosphere
pub fn generate_vertices(subdivisions: u32, radius: f64) -> Result<Vec<DVec3>> {
    Ok(generate(subdivisions, radius)?.vertices)
}

/// Shared midpoint lookup keyed by the unordered endpoint pair
fn midpoint(
    a: usize,
    b: usize,
    vertices: &mut Vec<DVec3>,
    cache: &mut HashMap<(usize, usize), usize>,
    radius: f64,
) -> usize {
    let key = (a.min(b), a.max(b));
    if let Some(&index) = cache.get(&key) {
        return index;
    }
    let mid = ((vertices[a] + vertices[b]) * 0.5).normalize() * radius;
    let index = vertices.len();
    vertices.push(mid);
    cache.insert(key, index);
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected_vertex_count(subdivisions: u32) -> usize {
        12 + 10 * (4usize.pow(subdivisions) - 1)
    }

    #[test]
    fn test_zero_subdivisions_is_icosahedron() {
        let mesh = generate(0, 1.0).unwrap();
        assert_eq!(mesh.vertices.len(), 12);
        assert_eq!(mesh.faces.len(), 20);
    }

    #[test]
    fn test_vertex_counts_per_level() {
        for subdivisions in 0..4 {
            let mesh = generate(subdivisions, 1.0).unwrap();
            assert_eq!(
                mesh.vertices.len(),
                expected_vertex_count(subdivisions),
                "vertex count at subdivision level {}",
                subdivisions
            );
            assert_eq!(mesh.faces.len(), 20 * 4usize.pow(subdivisions));
        }
    }

    #[test]
    fn test_all_vertices_on_sphere() {
        for &radius in &[1.0, 10.0, 450.0] {
            let mesh = generate(2, radius).unwrap();
            for v in &mesh.vertices {
                assert!((v.length() - radius).abs() < 1e-9 * radius.max(1.0));
            }
        }
    }

    #[test]
    fn test_faces_reference_valid_vertices() {
        let mesh = generate(3, 1.0).unwrap();
        for face in &mesh.faces {
            for &i in face {
                assert!(i < mesh.vertices.len());
            }
        }
    }

    #[test]
    fn test_shared_edges_share_midpoints() {
        // every undirected edge should be used by exactly two faces, which
        // only holds when midpoints are deduplicated
        let mesh = generate(2, 1.0).unwrap();
        let mut edge_uses: std::collections::HashMap<(usize, usize), usize> =
            std::collections::HashMap::new();
        for &[a, b, c] in &mesh.faces {
            for (lo, hi) in [(a.min(b), a.max(b)), (b.min(c), b.max(c)), (c.min(a), c.max(a))] {
                *edge_uses.entry((lo, hi)).or_insert(0) += 1;
            }
        }
        assert!(edge_uses.values().all(|&uses| uses == 2));
    }

    #[test]
    fn test_invalid_radius() {
        assert!(generate(1, 0.0).is_err());
        assert!(generate(1, -2.0).is_err());
    }

    #[test]
    fn test_edge_length_of_unit_icosahedron() {
        // circumscribed radius 1 gives edge length 4 / sqrt(10 + 2*sqrt(5))
        let mesh = generate(0, 1.0).unwrap();
        let expected = 4.0 / (10.0 + 2.0 * 5.0_f64.sqrt()).sqrt();
        let d = mesh.vertices[0].distance(mesh.vertices[11]);
        assert!((d - expected).abs() < 1e-12);
        assert!((d - 1.051_462).abs() < 1e-6);
    }
}
