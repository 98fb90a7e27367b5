//! Mesh construction from documents and from triangle fans
//!
//! Two independent builders produce a [`Mesh`]: one resolves an explicit
//! vertex/tile document, the other infers tiles from fan-encoded triangle
//! data, merging coincident vertices first. Both derive the deduplicated
//! edge set and the symmetric neighbor lists the solver relies on.

use std::collections::{HashMap, HashSet};

use glam::DVec3;

use crate::error::{RelaxError, Result};
use crate::io::{MeshDocument, TileRecord, VertexRecord};
use crate::mesh::{Mesh, Tile, TileType};

/// Coordinate quantization scale used to merge near-duplicate vertices.
///
/// Positions are scaled by this factor and rounded to integers before being
/// compared, so vertices closer than ~1e-6 per axis collapse into one.
/// Raising the scale preserves more genuinely distinct vertices; lowering it
/// merges more aggressively.
pub const QUANTIZE_SCALE: f64 = 1e6;

/// Result of building a mesh from fan-encoded triangles
///
/// `original_to_unique` maps every input vertex index to its merged index in
/// the mesh, so callers can write relaxed positions back into the original
/// (duplicated) vertex layout.
#[derive(Debug, Clone)]
pub struct FanMeshBuild {
    /// The deduplicated mesh
    pub mesh: Mesh,
    /// Input vertex index -> mesh vertex index
    pub original_to_unique: Vec<usize>,
}

/// Build a mesh from an explicit vertex/tile document
///
/// Vertex ids are resolved to dense indices in document order. Every tile's
/// ring contributes its boundary edges to the deduplicated edge set, and
/// pentagon tiles contribute their vertices to the pentagon set.
///
/// # Errors
///
/// Returns `InvalidMesh` if the vertex or tile list is empty, and
/// `UnknownVertex` if a tile references an id that is not in the vertex
/// list.
pub fn from_document(document: &MeshDocument) -> Result<Mesh> {
    if document.vertices.is_empty() {
        return Err(RelaxError::InvalidMesh("input has no vertices".to_string()));
    }
    if document.tiles.is_empty() {
        return Err(RelaxError::InvalidMesh("input has no tiles".to_string()));
    }

    let vertex_count = document.vertices.len();
    let mut vertices = Vec::with_capacity(vertex_count);
    let mut pinned = Vec::with_capacity(vertex_count);
    let mut id_to_index: HashMap<u32, usize> = HashMap::with_capacity(vertex_count);

    for (i, v) in document.vertices.iter().enumerate() {
        id_to_index.insert(v.id, i);
        vertices.push(DVec3::new(v.x, v.y, v.z));
        pinned.push(v.fixed);
    }

    let mut tiles = Vec::with_capacity(document.tiles.len());
    let mut edges = EdgeAccumulator::new(vertex_count);
    let mut pentagon_vertices = HashSet::new();

    for record in &document.tiles {
        let mut ring = Vec::with_capacity(record.vertex_ids.len());
        for &vertex_id in &record.vertex_ids {
            let index = *id_to_index.get(&vertex_id).ok_or(RelaxError::UnknownVertex {
                tile: record.id,
                vertex: vertex_id,
            })?;
            ring.push(index);
        }

        let kind = TileType::parse(&record.kind);
        if kind == TileType::Pentagon {
            pentagon_vertices.extend(ring.iter().copied());
        }
        let n = ring.len();
        for i in 0..n {
            edges.add(ring[i], ring[(i + 1) % n]);
        }
        tiles.push(Tile {
            id: record.id,
            kind,
            vertex_ids: ring,
        });
    }

    let (edges, neighbors) = edges.finish();
    Ok(Mesh::new(vertices, pinned, edges, tiles, neighbors, pentagon_vertices))
}

/// Export a mesh back to document form with updated positions
///
/// Vertices are re-identified by their dense index; tile ids and rings are
/// carried through unchanged.
pub fn to_document(mesh: &Mesh, radius: f64) -> MeshDocument {
    let vertices = mesh
        .vertices()
        .iter()
        .enumerate()
        .map(|(i, p)| VertexRecord {
            id: i as u32,
            x: p.x,
            y: p.y,
            z: p.z,
            fixed: mesh.pinned()[i],
        })
        .collect();

    let tiles = mesh
        .tiles()
        .iter()
        .map(|t| TileRecord {
            id: t.id,
            kind: t.kind.name().to_string(),
            vertex_ids: t.vertex_ids.iter().map(|&i| i as u32).collect(),
        })
        .collect();

    MeshDocument {
        radius,
        vertices,
        tiles,
    }
}

/// Build a mesh from fan-encoded triangle data
///
/// `triangles` is a flat index array; each consecutive run of triangles
/// sharing the same first index is one fan, whose first index is the fan's
/// center vertex. Near-duplicate positions (within the [`QUANTIZE_SCALE`]
/// precision) are merged before edges and neighbors are derived, so
/// independently indexed but coincident input vertices share one topology
/// slot. A fan of 5 ring vertices becomes a pentagon tile; any other size is
/// classified as a hexagon.
///
/// No vertex is pinned; fan input carries no pin flags.
pub fn from_triangle_fans(positions: &[DVec3], triangles: &[usize]) -> FanMeshBuild {
    let (unique, original_to_unique) = merge_coincident(positions);

    let mut edges = EdgeAccumulator::new(unique.len());
    let mut i = 0;
    while i + 2 < triangles.len() {
        let a = original_to_unique[triangles[i]];
        let b = original_to_unique[triangles[i + 1]];
        let c = original_to_unique[triangles[i + 2]];
        edges.add(a, b);
        edges.add(b, c);
        edges.add(c, a);
        i += 3;
    }

    let tiles = tiles_from_fans(triangles, &original_to_unique);
    let mut pentagon_vertices = HashSet::new();
    for tile in &tiles {
        if tile.kind == TileType::Pentagon {
            pentagon_vertices.extend(tile.vertex_ids.iter().copied());
        }
    }

    let pinned = vec![false; unique.len()];
    let (edges, neighbors) = edges.finish();
    FanMeshBuild {
        mesh: Mesh::new(unique, pinned, edges, tiles, neighbors, pentagon_vertices),
        original_to_unique,
    }
}

/// Merge positions that quantize to the same integer key
fn merge_coincident(positions: &[DVec3]) -> (Vec<DVec3>, Vec<usize>) {
    let mut key_to_unique: HashMap<(i64, i64, i64), usize> = HashMap::new();
    let mut unique = Vec::new();
    let mut original_to_unique = Vec::with_capacity(positions.len());

    for &p in positions {
        let key = quantize(p);
        let index = *key_to_unique.entry(key).or_insert_with(|| {
            unique.push(p);
            unique.len() - 1
        });
        original_to_unique.push(index);
    }
    (unique, original_to_unique)
}

pub(crate) fn quantize(p: DVec3) -> (i64, i64, i64) {
    (
        (p.x * QUANTIZE_SCALE).round() as i64,
        (p.y * QUANTIZE_SCALE).round() as i64,
        (p.z * QUANTIZE_SCALE).round() as i64,
    )
}

/// Group consecutive same-center triangles into fans and rebuild each ring
fn tiles_from_fans(triangles: &[usize], original_to_unique: &[usize]) -> Vec<Tile> {
    let mut tiles = Vec::new();
    let mut i = 0;
    let mut tile_id = 0u32;

    while i + 2 < triangles.len() {
        let center = triangles[i];
        let mut pairs = Vec::new();
        while i + 2 < triangles.len() && triangles[i] == center {
            pairs.push((triangles[i + 1], triangles[i + 2]));
            i += 3;
        }

        let original_ring = ring_from_pairs(center, &pairs);
        let ring: Vec<usize> = original_ring
            .iter()
            .map(|&v| original_to_unique[v])
            .collect();
        let kind = if ring.len() == 5 {
            TileType::Pentagon
        } else {
            TileType::Hexagon
        };
        tiles.push(Tile {
            id: tile_id,
            kind,
            vertex_ids: ring,
        });
        tile_id += 1;
    }
    tiles
}

/// Walk the fan's directed boundary edges into an ordered ring
///
/// A triangle `(center, a, b)` contributes the directed edge `b -> a`. The
/// walk starts at an arbitrary pair's second vertex and follows the chain
/// for at most `pairs.len()` steps; a fan whose chain never returns to the
/// start yields a truncated ring (flagged on stderr) rather than looping.
pub(crate) fn ring_from_pairs(center: usize, pairs: &[(usize, usize)]) -> Vec<usize> {
    if pairs.is_empty() {
        return Vec::new();
    }
    let mut next_by_current: HashMap<usize, usize> = HashMap::with_capacity(pairs.len());
    for &(a, b) in pairs {
        next_by_current.insert(b, a);
    }

    let start = pairs[0].1;
    let mut ring = vec![start];
    let mut current = start;
    for _ in 0..pairs.len() {
        match next_by_current.get(&current) {
            Some(&next) if next != start => {
                ring.push(next);
                current = next;
            }
            _ => break,
        }
    }

    // a closed fan of n triangles returns to start after exactly n steps
    if ring.len() != pairs.len() {
        eprintln!(
            "[Mesh] fan around vertex {} did not close; ring has {} vertices for {} triangles",
            center,
            ring.len(),
            pairs.len()
        );
    }
    ring
}

/// Accumulates deduplicated undirected edges and the neighbor lists derived
/// from them, preserving first-seen order for determinism
struct EdgeAccumulator {
    seen: HashSet<(usize, usize)>,
    edges: Vec<[usize; 2]>,
    neighbors: Vec<Vec<usize>>,
}

impl EdgeAccumulator {
    fn new(vertex_count: usize) -> Self {
        Self {
            seen: HashSet::new(),
            edges: Vec::new(),
            neighbors: vec![Vec::new(); vertex_count],
        }
    }

    fn add(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let key = (a.min(b), a.max(b));
        if self.seen.insert(key) {
            self.edges.push([key.0, key.1]);
            self.neighbors[a].push(b);
            self.neighbors[b].push(a);
        }
    }

    fn finish(self) -> (Vec<[usize; 2]>, Vec<Vec<usize>>) {
        (self.edges, self.neighbors)
    }
}
