//! Per-tile CSV export tables
//!
//! Reconstructs the tile structure of a fan-encoded payload (or freshly
//! generated tiled sphere) and writes a fixed family of CSV tables sharing
//! one filename prefix: tile summaries, centers, ring vertices with
//! positions/normals/UVs/tangents, tile triangles, the triangle-to-tile
//! index, and position-keyed tile adjacency.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use glam::DVec3;
use serde_json::Value;

use crate::error::{RelaxError, Result};
use crate::mesh::builder::ring_from_pairs;
use crate::mesh::TileType;
use crate::unreal::format::{
    is_engine_payload, parse_index_array, parse_tangent_array, parse_vector3_array, TangentEntry,
};

/// One reconstructed tile with its source fan
#[derive(Debug, Clone)]
struct TileInfo {
    tile_id: usize,
    kind: TileType,
    center_vertex: usize,
    center: DVec3,
    ring: Vec<usize>,
    triangles: Vec<usize>,
}

/// Everything the CSV writers need, reconstructed from one mesh item
struct TileTables {
    tiles: Vec<TileInfo>,
    triangle_to_tile: Vec<i64>,
    neighbors: Vec<Vec<usize>>,
    triangles: Vec<usize>,
    vertices: Vec<DVec3>,
    normals: Option<Vec<DVec3>>,
    uvs: Option<Vec<[f64; 2]>>,
    tangents: Option<Vec<TangentEntry>>,
}

/// Export CSV tables for every mesh item of an engine payload
///
/// When the payload holds more than one item, each item's tables get an
/// `_itemN` infix after the prefix.
///
/// # Errors
///
/// Returns `ParseFailed` if the tree is not an engine payload or an
/// encoded array cannot be parsed.
pub fn export(root: &Value, output_prefix: &Path) -> Result<()> {
    let items = match root.as_array() {
        Some(items) if is_engine_payload(root) => items,
        _ => {
            return Err(RelaxError::ParseFailed(
                "input is not an engine payload (expected array with Vertiches/Triangles)"
                    .to_string(),
            ))
        }
    };
    for (i, item) in items.iter().enumerate() {
        if !item.is_object() {
            continue;
        }
        let prefix = if items.len() > 1 {
            append_suffix(output_prefix, &format!("_item{}", i))
        } else {
            output_prefix.to_path_buf()
        };
        export_item(item, &prefix)?;
    }
    Ok(())
}

/// Export CSV tables for raw generated tiling data
///
/// Used by the from-scratch generation path, where normals, UVs, and
/// tangents are always present and tangents carry no flip flag.
pub fn export_raw(
    output_prefix: &Path,
    vertices: &[DVec3],
    triangles: &[usize],
    normals: &[DVec3],
    uvs: &[[f64; 2]],
    tangents: &[DVec3],
) -> Result<()> {
    let tangent_entries = tangents
        .iter()
        .map(|&tangent| TangentEntry {
            tangent,
            flip_y: false,
        })
        .collect();
    let tables = build_tables(
        vertices.to_vec(),
        triangles.to_vec(),
        Some(normals.to_vec()),
        Some(uvs.to_vec()),
        Some(tangent_entries),
    );
    write_all(output_prefix, &tables)
}

fn export_item(item: &Value, prefix: &Path) -> Result<()> {
    let vertices = parse_vector3_array(required_array(item, "Vertiches")?)?;
    let triangles = parse_index_array(required_array(item, "Triangles")?)?;
    let normals = match item.get("Normals").and_then(Value::as_array) {
        Some(array) => Some(parse_vector3_array(array)?),
        None => None,
    };
    let uvs = uv_array(item).map(|array| parse_uv_array(array)).transpose()?;
    let tangents = item
        .get("Tangents")
        .and_then(Value::as_array)
        .map(|array| parse_tangent_array(array));

    let tables = build_tables(vertices, triangles, normals, uvs, tangents);
    write_all(prefix, &tables)
}

fn required_array<'a>(item: &'a Value, key: &str) -> Result<&'a Vec<Value>> {
    item.get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| RelaxError::ParseFailed(format!("expected array field: {}", key)))
}

fn uv_array(item: &Value) -> Option<&Vec<Value>> {
    for key in ["UV0", "UV", "UVs"] {
        if let Some(array) = item.get(key).and_then(Value::as_array) {
            return Some(array);
        }
    }
    None
}

fn parse_uv_array(array: &[Value]) -> Result<Vec<[f64; 2]>> {
    use std::sync::OnceLock;
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        regex::Regex::new(r"\(X=([-0-9.Ee+]+),Y=([-0-9.Ee+]+)\)").expect("bad regex")
    });
    array
        .iter()
        .map(|v| {
            let raw = v.as_str().unwrap_or_default();
            let captures = pattern
                .captures(raw)
                .ok_or_else(|| RelaxError::ParseFailed(format!("cannot parse uv: {}", raw)))?;
            Ok([
                captures[1].parse().unwrap_or(0.0),
                captures[2].parse().unwrap_or(0.0),
            ])
        })
        .collect()
}

fn append_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}{}", prefix.display(), suffix))
}

/// Reconstruct tiles, triangle ownership, and position-keyed adjacency
fn build_tables(
    vertices: Vec<DVec3>,
    triangles: Vec<usize>,
    normals: Option<Vec<DVec3>>,
    uvs: Option<Vec<[f64; 2]>>,
    tangents: Option<Vec<TangentEntry>>,
) -> TileTables {
    let triangle_count = triangles.len() / 3;
    let mut triangle_to_tile = vec![-1i64; triangle_count];
    let mut tiles = Vec::new();

    let mut i = 0;
    let mut triangle_index = 0;
    let mut tile_id = 0usize;
    while i + 2 < triangles.len() {
        let center_vertex = triangles[i];
        let mut pairs = Vec::new();
        let mut tile_triangles = Vec::new();
        while i + 2 < triangles.len() && triangles[i] == center_vertex {
            pairs.push((triangles[i + 1], triangles[i + 2]));
            tile_triangles.push(triangle_index);
            triangle_to_tile[triangle_index] = tile_id as i64;
            triangle_index += 1;
            i += 3;
        }
        let ring = ring_from_pairs(center_vertex, &pairs);
        let kind = if ring.len() == 5 {
            TileType::Pentagon
        } else {
            TileType::Hexagon
        };
        tiles.push(TileInfo {
            tile_id,
            kind,
            center_vertex,
            center: vertices[center_vertex],
            ring,
            triangles: tile_triangles,
        });
        tile_id += 1;
    }

    // tiles that share a boundary edge (keyed by quantized endpoint
    // positions, so duplicated-but-coincident vertices still match)
    let mut edge_to_tiles: HashMap<(PosKey, PosKey), Vec<usize>> = HashMap::new();
    for tile in &tiles {
        let n = tile.ring.len();
        for k in 0..n {
            let a = pos_key(vertices[tile.ring[k]]);
            let b = pos_key(vertices[tile.ring[(k + 1) % n]]);
            let key = if a <= b { (a, b) } else { (b, a) };
            edge_to_tiles.entry(key).or_default().push(tile.tile_id);
        }
    }
    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); tiles.len()];
    for shared in edge_to_tiles.values() {
        for (x, &ta) in shared.iter().enumerate() {
            for &tb in shared.iter().skip(x + 1) {
                if ta != tb {
                    neighbors[ta].push(tb);
                    neighbors[tb].push(ta);
                }
            }
        }
    }
    for list in neighbors.iter_mut() {
        list.sort_unstable();
        list.dedup();
    }

    TileTables {
        tiles,
        triangle_to_tile,
        neighbors,
        triangles,
        vertices,
        normals,
        uvs,
        tangents,
    }
}

type PosKey = (i64, i64, i64);

fn pos_key(p: DVec3) -> PosKey {
    crate::mesh::builder::quantize(p)
}

fn kind_label(kind: TileType) -> &'static str {
    match kind {
        TileType::Pentagon => "PENT",
        TileType::Hexagon => "HEX",
    }
}

fn write_all(prefix: &Path, tables: &TileTables) -> Result<()> {
    write_tiles(prefix, tables)?;
    write_tile_centers(prefix, tables)?;
    write_tile_vertices(prefix, tables)?;
    write_tile_vertex_positions(prefix, tables)?;
    write_tile_vertex_normals(prefix, tables)?;
    write_tile_vertex_uvs(prefix, tables)?;
    write_tile_vertex_tangents(prefix, tables)?;
    write_tile_triangles(prefix, tables)?;
    write_triangle_to_tile(prefix, tables)?;
    write_tile_neighbors(prefix, tables)?;
    Ok(())
}

fn write_lines(prefix: &Path, suffix: &str, lines: Vec<String>) -> Result<()> {
    let path = PathBuf::from(format!("{}{}", prefix.display(), suffix));
    fs::write(path, lines.join("\n") + "\n")?;
    Ok(())
}

fn write_tiles(prefix: &Path, tables: &TileTables) -> Result<()> {
    let mut lines = vec!["tile_id,type,center_vertex,vertex_count,triangle_count".to_string()];
    for t in &tables.tiles {
        lines.push(format!(
            "{},{},{},{},{}",
            t.tile_id,
            kind_label(t.kind),
            t.center_vertex,
            t.ring.len(),
            t.triangles.len()
        ));
    }
    write_lines(prefix, "_tiles.csv", lines)
}

fn write_tile_centers(prefix: &Path, tables: &TileTables) -> Result<()> {
    let mut lines = vec!["tile_id,center_vertex,center_x,center_y,center_z".to_string()];
    for t in &tables.tiles {
        lines.push(format!(
            "{},{},{:.9},{:.9},{:.9}",
            t.tile_id, t.center_vertex, t.center.x, t.center.y, t.center.z
        ));
    }
    write_lines(prefix, "_tile_centers.csv", lines)
}

fn write_tile_vertices(prefix: &Path, tables: &TileTables) -> Result<()> {
    let mut lines = vec!["tile_id,vertex_order,vertex_index".to_string()];
    for t in &tables.tiles {
        for (order, &vi) in t.ring.iter().enumerate() {
            lines.push(format!("{},{},{}", t.tile_id, order, vi));
        }
    }
    write_lines(prefix, "_tile_vertices.csv", lines)
}

fn write_tile_vertex_positions(prefix: &Path, tables: &TileTables) -> Result<()> {
    let mut lines = vec!["tile_id,vertex_order,vertex_index,x,y,z".to_string()];
    for t in &tables.tiles {
        for (order, &vi) in t.ring.iter().enumerate() {
            let p = tables.vertices[vi];
            lines.push(format!(
                "{},{},{},{:.9},{:.9},{:.9}",
                t.tile_id, order, vi, p.x, p.y, p.z
            ));
        }
    }
    write_lines(prefix, "_tile_vertex_positions.csv", lines)
}

fn write_tile_vertex_normals(prefix: &Path, tables: &TileTables) -> Result<()> {
    let mut lines = vec!["tile_id,vertex_order,vertex_index,nx,ny,nz".to_string()];
    for t in &tables.tiles {
        for (order, &vi) in t.ring.iter().enumerate() {
            let n = match &tables.normals {
                Some(normals) if vi < normals.len() => normals[vi],
                _ => tables.vertices[vi].normalize(),
            };
            lines.push(format!(
                "{},{},{},{:.9},{:.9},{:.9}",
                t.tile_id, order, vi, n.x, n.y, n.z
            ));
        }
    }
    write_lines(prefix, "_tile_vertex_normals.csv", lines)
}

fn write_tile_vertex_uvs(prefix: &Path, tables: &TileTables) -> Result<()> {
    let mut lines = vec!["tile_id,vertex_order,vertex_index,u,v".to_string()];
    for t in &tables.tiles {
        for (order, &vi) in t.ring.iter().enumerate() {
            let (u, v) = match &tables.uvs {
                Some(uvs) if vi < uvs.len() => {
                    (format!("{:.9}", uvs[vi][0]), format!("{:.9}", uvs[vi][1]))
                }
                _ => (String::new(), String::new()),
            };
            lines.push(format!("{},{},{},{},{}", t.tile_id, order, vi, u, v));
        }
    }
    write_lines(prefix, "_tile_vertex_uv.csv", lines)
}

fn write_tile_vertex_tangents(prefix: &Path, tables: &TileTables) -> Result<()> {
    let mut lines = vec!["tile_id,vertex_order,vertex_index,tangent_x,tangent_y,tangent_z,flip_y".to_string()];
    for t in &tables.tiles {
        for (order, &vi) in t.ring.iter().enumerate() {
            match &tables.tangents {
                Some(tangents) if vi < tangents.len() => {
                    let entry = &tangents[vi];
                    lines.push(format!(
                        "{},{},{},{:.9},{:.9},{:.9},{}",
                        t.tile_id,
                        order,
                        vi,
                        entry.tangent.x,
                        entry.tangent.y,
                        entry.tangent.z,
                        if entry.flip_y { "1" } else { "0" }
                    ));
                }
                _ => lines.push(format!("{},{},{},,,,", t.tile_id, order, vi)),
            }
        }
    }
    write_lines(prefix, "_tile_vertex_tangents.csv", lines)
}

fn write_tile_triangles(prefix: &Path, tables: &TileTables) -> Result<()> {
    let mut lines = vec!["tile_id,tile_triangle_order,triangle_index,v0,v1,v2".to_string()];
    for t in &tables.tiles {
        for (order, &tri) in t.triangles.iter().enumerate() {
            let base = tri * 3;
            lines.push(format!(
                "{},{},{},{},{},{}",
                t.tile_id,
                order,
                tri,
                tables.triangles[base],
                tables.triangles[base + 1],
                tables.triangles[base + 2]
            ));
        }
    }
    write_lines(prefix, "_tile_triangles.csv", lines)
}

fn write_triangle_to_tile(prefix: &Path, tables: &TileTables) -> Result<()> {
    let mut lines = vec!["triangle_index,tile_id".to_string()];
    for (i, tile) in tables.triangle_to_tile.iter().enumerate() {
        lines.push(format!("{},{}", i, tile));
    }
    write_lines(prefix, "_triangle_to_tile.csv", lines)
}

fn write_tile_neighbors(prefix: &Path, tables: &TileTables) -> Result<()> {
    let mut lines = vec!["tile_id,neighbor_tile_id".to_string()];
    for t in &tables.tiles {
        for &n in &tables.neighbors[t.tile_id] {
            lines.push(format!("{},{}", t.tile_id, n));
        }
    }
    write_lines(prefix, "_tile_neighbors.csv", lines)
}
