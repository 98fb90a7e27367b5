//! Mesh quality metrics
//!
//! Edge-length distribution statistics and per-tile-type polygon area
//! means, computed from a mesh snapshot. Used both for periodic solver
//! diagnostics and for the final relaxation result.

use glam::DVec3;

use crate::mesh::{Mesh, TileType};

/// Quality statistics for one mesh snapshot
///
/// Empty groups (no edges, or no tiles of a type) yield 0.0 for the
/// corresponding statistic rather than NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxationMetrics {
    /// Shortest edge length
    pub edge_min: f64,
    /// Longest edge length
    pub edge_max: f64,
    /// Mean edge length
    pub edge_mean: f64,
    /// Population standard deviation of edge lengths
    pub edge_std_dev: f64,
    /// Mean polygon area over pentagon tiles
    pub pentagon_area_mean: f64,
    /// Mean polygon area over hexagon tiles
    pub hexagon_area_mean: f64,
}

/// Compute edge and tile-area statistics for a mesh snapshot
pub fn collect_metrics(mesh: &Mesh) -> RelaxationMetrics {
    let vertices = mesh.vertices();

    let mut min = f64::INFINITY;
    let mut max = 0.0_f64;
    let mut sum = 0.0;
    let mut lengths = Vec::with_capacity(mesh.edges().len());
    for &[a, b] in mesh.edges() {
        let len = vertices[a].distance(vertices[b]);
        lengths.push(len);
        sum += len;
        min = min.min(len);
        max = max.max(len);
    }
    let mean = if lengths.is_empty() {
        0.0
    } else {
        sum / lengths.len() as f64
    };
    let variance: f64 = lengths.iter().map(|len| (len - mean) * (len - mean)).sum();
    let std_dev = if lengths.is_empty() {
        0.0
    } else {
        (variance / lengths.len() as f64).sqrt()
    };

    let mut pentagon_area = 0.0;
    let mut pentagon_count = 0usize;
    let mut hexagon_area = 0.0;
    let mut hexagon_count = 0usize;
    for tile in mesh.tiles() {
        let area = polygon_area(vertices, &tile.vertex_ids);
        match tile.kind {
            TileType::Pentagon => {
                pentagon_area += area;
                pentagon_count += 1;
            }
            TileType::Hexagon => {
                hexagon_area += area;
                hexagon_count += 1;
            }
        }
    }

    RelaxationMetrics {
        edge_min: if min.is_finite() { min } else { 0.0 },
        edge_max: max,
        edge_mean: mean,
        edge_std_dev: std_dev,
        pentagon_area_mean: if pentagon_count == 0 {
            0.0
        } else {
            pentagon_area / pentagon_count as f64
        },
        hexagon_area_mean: if hexagon_count == 0 {
            0.0
        } else {
            hexagon_area / hexagon_count as f64
        },
    }
}

/// Unsigned triangle-fan area of a polygon ring
///
/// Valid for convex, near-planar rings, which relaxed spherical tiles
/// approximate. Rings shorter than three vertices have zero area.
fn polygon_area(vertices: &[DVec3], ring: &[usize]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let origin = vertices[ring[0]];
    let mut area = 0.0;
    for i in 1..ring.len() - 1 {
        let ab = vertices[ring[i]] - origin;
        let ac = vertices[ring[i + 1]] - origin;
        area += ab.cross(ac).length() * 0.5;
    }
    area
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Tile;
    use approx::assert_abs_diff_eq;
    use std::collections::HashSet;

    /// A regular hexagon of unit-length edges around a center vertex,
    /// with the six spokes as the edge set
    fn regular_hex_patch() -> Mesh {
        let mut vertices = vec![DVec3::ZERO];
        let mut edges = Vec::new();
        let mut neighbors = vec![Vec::new(); 7];
        for k in 0..6usize {
            let angle = k as f64 * std::f64::consts::TAU / 6.0;
            vertices.push(DVec3::new(angle.cos(), angle.sin(), 0.0));
            edges.push([0, k + 1]);
            neighbors[0].push(k + 1);
            neighbors[k + 1].push(0);
        }
        let tile = Tile {
            id: 0,
            kind: TileType::Hexagon,
            vertex_ids: vec![1, 2, 3, 4, 5, 6],
        };
        Mesh::new(
            vertices,
            vec![false; 7],
            edges,
            vec![tile],
            neighbors,
            HashSet::new(),
        )
    }

    #[test]
    fn test_regular_hexagon_patch() {
        let metrics = collect_metrics(&regular_hex_patch());
        assert_abs_diff_eq!(metrics.edge_min, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.edge_max, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.edge_mean, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.edge_std_dev, 0.0, epsilon = 1e-12);
        // regular unit hexagon area: 3*sqrt(3)/2
        let expected = 3.0 * 3.0_f64.sqrt() / 2.0;
        assert_abs_diff_eq!(metrics.hexagon_area_mean, expected, epsilon = 1e-12);
        assert_eq!(metrics.pentagon_area_mean, 0.0);
    }

    #[test]
    fn test_empty_mesh_yields_zeros() {
        let mesh = Mesh::new(
            vec![DVec3::X],
            vec![false],
            Vec::new(),
            Vec::new(),
            vec![Vec::new()],
            HashSet::new(),
        );
        let metrics = collect_metrics(&mesh);
        assert_eq!(metrics.edge_min, 0.0);
        assert_eq!(metrics.edge_max, 0.0);
        assert_eq!(metrics.edge_mean, 0.0);
        assert_eq!(metrics.edge_std_dev, 0.0);
        assert_eq!(metrics.pentagon_area_mean, 0.0);
        assert_eq!(metrics.hexagon_area_mean, 0.0);
    }

    #[test]
    fn test_degenerate_ring_has_zero_area() {
        let mut mesh = regular_hex_patch();
        // area computation tolerates short rings
        let short = Tile {
            id: 1,
            kind: TileType::Pentagon,
            vertex_ids: vec![1, 2],
        };
        mesh = Mesh::new(
            mesh.vertices().to_vec(),
            mesh.pinned().to_vec(),
            mesh.edges().to_vec(),
            vec![mesh.tiles()[0].clone(), short],
            mesh.neighbors().to_vec(),
            HashSet::new(),
        );
        let metrics = collect_metrics(&mesh);
        assert_eq!(metrics.pentagon_area_mean, 0.0);
    }

    #[test]
    fn test_icosahedron_edge_statistics() {
        let base = crate::generation::icosphere::generate(0, 1.0).unwrap();
        let built = crate::mesh::from_triangle_fans(
            &base.vertices,
            &base
                .faces
                .iter()
                .flat_map(|f| f.iter().copied())
                .collect::<Vec<_>>(),
        );
        let metrics = collect_metrics(&built.mesh);
        // 30 identical edges at the icosahedral edge length for unit radius
        assert_eq!(built.mesh.edges().len(), 30);
        assert_abs_diff_eq!(metrics.edge_mean, 1.051_462, epsilon = 1e-6);
        assert_abs_diff_eq!(metrics.edge_std_dev, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(metrics.edge_min, metrics.edge_max, epsilon = 1e-9);
    }
}
