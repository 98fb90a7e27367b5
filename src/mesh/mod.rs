//! Tiled sphere mesh topology
//!
//! The central aggregate shared by the builders, the relaxation solver, and
//! the metrics collector. Topology (edges, tiles, neighbors) is fixed at
//! construction; only vertex positions move afterwards.

pub(crate) mod builder;

pub use builder::{from_document, from_triangle_fans, to_document, FanMeshBuild, QUANTIZE_SCALE};

use std::collections::HashSet;

use glam::DVec3;

/// Tile classification in the pentagon/hexagon sphere tiling
///
/// A closed two-variant tag. Loose external type strings are folded into it
/// by [`TileType::parse`]; anything unrecognized is a hexagon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileType {
    /// Five-sided tile (12 per sphere, at the former icosahedron vertices)
    Pentagon,
    /// Six-sided tile (everything else)
    Hexagon,
}

impl TileType {
    /// Parse a loosely typed tile-type string
    ///
    /// Case-insensitive prefix match: anything starting with "pent" is a
    /// pentagon, everything else (including empty input) is a hexagon.
    pub fn parse(value: &str) -> TileType {
        if value.trim().to_ascii_uppercase().starts_with("PENT") {
            TileType::Pentagon
        } else {
            TileType::Hexagon
        }
    }

    /// Canonical uppercase name, as used in exported documents
    pub fn name(self) -> &'static str {
        match self {
            TileType::Pentagon => "PENTAGON",
            TileType::Hexagon => "HEXAGON",
        }
    }
}

/// A single polygon tile of the sphere tiling
#[derive(Debug, Clone)]
pub struct Tile {
    /// Stable tile identifier
    pub id: u32,
    /// Pentagon or hexagon
    pub kind: TileType,
    /// Ordered ring of vertex indices (consistent winding, length 5 or 6
    /// for well-formed tilings)
    pub vertex_ids: Vec<usize>,
}

/// A tiled sphere mesh: vertex positions plus fixed topology
///
/// Constructed once per relaxation run by [`from_document`] or
/// [`from_triangle_fans`], then owned exclusively by the solver. Vertex
/// positions are the only mutable state; the edge set, tiles, neighbor
/// lists, and pinned flags never change after construction.
///
/// # Invariants
///
/// - every edge endpoint and tile vertex index is `< vertex_count()`
/// - `neighbors` is symmetric with `edges`: `i ∈ neighbors[j]` iff
///   `j ∈ neighbors[i]` iff `{i, j} ∈ edges`
/// - `pinned` is parallel to `vertices`
#[derive(Debug, Clone)]
pub struct Mesh {
    vertices: Vec<DVec3>,
    pinned: Vec<bool>,
    edges: Vec<[usize; 2]>,
    tiles: Vec<Tile>,
    neighbors: Vec<Vec<usize>>,
    pentagon_vertices: HashSet<usize>,
}

impl Mesh {
    pub(crate) fn new(
        vertices: Vec<DVec3>,
        pinned: Vec<bool>,
        edges: Vec<[usize; 2]>,
        tiles: Vec<Tile>,
        neighbors: Vec<Vec<usize>>,
        pentagon_vertices: HashSet<usize>,
    ) -> Self {
        debug_assert_eq!(vertices.len(), pinned.len());
        debug_assert_eq!(vertices.len(), neighbors.len());
        Self {
            vertices,
            pinned,
            edges,
            tiles,
            neighbors,
            pentagon_vertices,
        }
    }

    /// Number of vertices
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Vertex positions, index-addressed
    #[inline]
    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    /// Mutable vertex positions (slice, so the array can never be resized)
    #[inline]
    pub fn vertices_mut(&mut self) -> &mut [DVec3] {
        &mut self.vertices
    }

    /// Per-vertex pinned flags; a pinned vertex is never moved by relaxation
    #[inline]
    pub fn pinned(&self) -> &[bool] {
        &self.pinned
    }

    /// Deduplicated undirected edge set
    #[inline]
    pub fn edges(&self) -> &[[usize; 2]] {
        &self.edges
    }

    /// All tiles in construction order
    #[inline]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Per-vertex adjacency lists, symmetric with [`Mesh::edges`]
    #[inline]
    pub fn neighbors(&self) -> &[Vec<usize>] {
        &self.neighbors
    }

    /// Indices of vertices that belong to at least one pentagon tile
    #[inline]
    pub fn pentagon_vertices(&self) -> &HashSet<usize> {
        &self.pentagon_vertices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_type_parse() {
        assert_eq!(TileType::parse("PENTAGON"), TileType::Pentagon);
        assert_eq!(TileType::parse("pentagon"), TileType::Pentagon);
        assert_eq!(TileType::parse("  Pent "), TileType::Pentagon);
        assert_eq!(TileType::parse("HEXAGON"), TileType::Hexagon);
        // unrecognized and empty both default to hexagon
        assert_eq!(TileType::parse("heptagon"), TileType::Hexagon);
        assert_eq!(TileType::parse(""), TileType::Hexagon);
    }

    #[test]
    fn test_tile_type_name_round_trip() {
        assert_eq!(TileType::parse(TileType::Pentagon.name()), TileType::Pentagon);
        assert_eq!(TileType::parse(TileType::Hexagon.name()), TileType::Hexagon);
    }

    #[test]
    fn test_mesh_accessors() {
        let vertices = vec![
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
        ];
        let mesh = Mesh::new(
            vertices,
            vec![false, true, false],
            vec![[0, 1], [1, 2], [0, 2]],
            vec![Tile {
                id: 0,
                kind: TileType::Hexagon,
                vertex_ids: vec![0, 1, 2],
            }],
            vec![vec![1, 2], vec![0, 2], vec![0, 1]],
            HashSet::new(),
        );

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.edges().len(), 3);
        assert_eq!(mesh.tiles().len(), 1);
        assert!(mesh.pinned()[1]);
        // neighbor symmetry
        for (i, nbs) in mesh.neighbors().iter().enumerate() {
            for &n in nbs {
                assert!(mesh.neighbors()[n].contains(&i));
            }
        }
    }
}
