//! Mesh document model and JSON file helpers
//!
//! The document is the explicit external representation of a tiled sphere:
//! a radius, an ordered vertex list, and an ordered tile list. Field names
//! follow the wire format (`type`, `vertexIds`) rather than Rust
//! conventions.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One vertex of a mesh document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexRecord {
    /// Vertex identifier, referenced by tile rings
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Pinned flag; a fixed vertex is never moved by relaxation
    #[serde(default)]
    pub fixed: bool,
}

/// One tile of a mesh document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileRecord {
    /// Tile identifier
    pub id: u32,
    /// Loose tile-type string; parsed with a "PENT" prefix match, anything
    /// else is a hexagon
    #[serde(rename = "type", default = "default_tile_type")]
    pub kind: String,
    /// Ordered ring of vertex ids
    #[serde(rename = "vertexIds", default)]
    pub vertex_ids: Vec<u32>,
}

/// An explicit vertex/tile mesh document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshDocument {
    /// Target sphere radius; defaults to 1.0 when absent
    #[serde(default = "default_radius")]
    pub radius: f64,
    #[serde(default)]
    pub vertices: Vec<VertexRecord>,
    #[serde(default)]
    pub tiles: Vec<TileRecord>,
}

fn default_radius() -> f64 {
    1.0
}

fn default_tile_type() -> String {
    "HEXAGON".to_string()
}

/// Read a mesh document from a JSON file
pub fn read_document(path: &Path) -> Result<MeshDocument> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Write a mesh document to a JSON file, pretty-printed
pub fn write_document(path: &Path, document: &MeshDocument) -> Result<()> {
    let text = serde_json::to_string_pretty(document)?;
    fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_deserialization_defaults() {
        let json = r#"{
            "vertices": [
                {"id": 0, "x": 1.0, "y": 0.0, "z": 0.0},
                {"id": 1, "x": 0.0, "y": 1.0, "z": 0.0, "fixed": true}
            ],
            "tiles": [
                {"id": 0, "vertexIds": [0, 1]}
            ]
        }"#;
        let doc: MeshDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.radius, 1.0);
        assert!(!doc.vertices[0].fixed);
        assert!(doc.vertices[1].fixed);
        assert_eq!(doc.tiles[0].kind, "HEXAGON");
        assert_eq!(doc.tiles[0].vertex_ids, vec![0, 1]);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = std::env::temp_dir().join("hexsphere_io_test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("mesh.json");

        let doc = MeshDocument {
            radius: 1.5,
            vertices: vec![VertexRecord {
                id: 0,
                x: 1.0,
                y: 0.0,
                z: 0.0,
                fixed: false,
            }],
            tiles: Vec::new(),
        };
        write_document(&path, &doc).unwrap();
        let restored = read_document(&path).unwrap();
        assert_eq!(doc, restored);
    }

    #[test]
    fn test_document_round_trip() {
        let doc = MeshDocument {
            radius: 2.0,
            vertices: vec![VertexRecord {
                id: 3,
                x: 0.5,
                y: -0.5,
                z: 0.25,
                fixed: true,
            }],
            tiles: vec![TileRecord {
                id: 9,
                kind: "PENTAGON".to_string(),
                vertex_ids: vec![3],
            }],
        };
        let json = serde_json::to_string(&doc).unwrap();
        // wire field names are preserved
        assert!(json.contains("\"vertexIds\""));
        assert!(json.contains("\"type\""));
        let restored: MeshDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, restored);
    }
}
