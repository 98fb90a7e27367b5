//! Engine payload processing: parse, relax, re-encode
//!
//! The payload is a JSON array of objects carrying text-encoded vertex and
//! tangent arrays (`"(X=…,Y=…,Z=…)"`) plus a flat fan-encoded triangle
//! index list. Processing merges coincident vertices, relaxes the resulting
//! mesh, and writes re-encoded positions, normals, tangents, and optionally
//! spherical UVs back into the same JSON tree.

use std::sync::OnceLock;

use glam::DVec3;
use regex::Regex;
use serde_json::Value;

use crate::config::RelaxationConfig;
use crate::error::{RelaxError, Result};
use crate::mesh::from_triangle_fans;
use crate::metrics::RelaxationMetrics;
use crate::solver::relax;

const EPS: f64 = 1e-9;

fn vector3_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\(X=([-0-9.Ee+]+),Y=([-0-9.Ee+]+),Z=([-0-9.Ee+]+)\)").expect("bad regex")
    })
}

fn tangent_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"\(TangentX=\(X=([-0-9.Ee+]+),Y=([-0-9.Ee+]+),Z=([-0-9.Ee+]+)\),bFlipTangentY=(True|False)\)",
        )
        .expect("bad regex")
    })
}

/// A parsed tangent entry: direction plus the flip-Y flag
#[derive(Debug, Clone, Copy)]
pub struct TangentEntry {
    pub tangent: DVec3,
    pub flip_y: bool,
}

/// Check whether a JSON tree is an engine payload
///
/// The payload is a non-empty array whose first element carries the
/// `Vertiches` and `Triangles` fields (the misspelling is part of the wire
/// format).
pub fn is_engine_payload(root: &Value) -> bool {
    match root.as_array().and_then(|items| items.first()) {
        Some(first) => first.get("Vertiches").is_some() && first.get("Triangles").is_some(),
        None => false,
    }
}

/// Relax every mesh item of an engine payload in place
///
/// For each object item: parse the vertex, triangle, and (optional)
/// tangent arrays, build the deduplicated fan mesh, relax it, and write
/// re-encoded positions, unit normals, recomputed tangents, and spherical
/// UVs (when `emit_uv` is set or the item already has a UV array) back
/// into the item. Returns the metrics of the last item relaxed, or all
/// zeros when the payload contains no mesh items.
pub fn process(root: &mut Value, config: &RelaxationConfig, emit_uv: bool) -> Result<RelaxationMetrics> {
    let items = root
        .as_array_mut()
        .ok_or_else(|| RelaxError::ParseFailed("payload is not an array".to_string()))?;

    let mut last_metrics = None;
    for item in items.iter_mut() {
        if !item.is_object() {
            continue;
        }
        let original_vertices = parse_vector3_array(required_array(item, "Vertiches")?)?;
        let triangles = parse_index_array(required_array(item, "Triangles")?)?;
        let tangents = match item.get("Tangents").and_then(Value::as_array) {
            Some(array) => parse_tangent_array(array),
            None => Vec::new(),
        };

        let built = from_triangle_fans(&original_vertices, &triangles);
        let mut mesh = built.mesh;
        last_metrics = Some(relax(&mut mesh, config)?);

        let relaxed = mesh.vertices();
        let mut out_vertices = Vec::with_capacity(original_vertices.len());
        let mut out_normals = Vec::with_capacity(original_vertices.len());
        let mut out_tangents = Vec::with_capacity(original_vertices.len());
        let mut out_uvs = Vec::with_capacity(original_vertices.len());

        for i in 0..original_vertices.len() {
            let p = relaxed[built.original_to_unique[i]];
            let n = p.normalize();
            let t = tangent_from_spherical(n);
            let flip = tangents.get(i).map(|t| t.flip_y).unwrap_or(true);

            out_vertices.push(Value::String(format_vector3(p)));
            out_normals.push(Value::String(format_vector3(n)));
            out_tangents.push(Value::String(format_tangent(t, flip)));
            out_uvs.push(Value::String(format_uv(n)));
        }

        if let Some(object) = item.as_object_mut() {
            let uv_key = detect_uv_key(object);
            let has_existing_uv = object.contains_key(uv_key);
            object.insert("Vertiches".to_string(), Value::Array(out_vertices));
            object.insert("Normals".to_string(), Value::Array(out_normals));
            if emit_uv || has_existing_uv {
                object.insert(uv_key.to_string(), Value::Array(out_uvs));
            }
            object.insert("Tangents".to_string(), Value::Array(out_tangents));
        }
    }

    Ok(last_metrics.unwrap_or(RelaxationMetrics {
        edge_min: 0.0,
        edge_max: 0.0,
        edge_mean: 0.0,
        edge_std_dev: 0.0,
        pentagon_area_mean: 0.0,
        hexagon_area_mean: 0.0,
    }))
}

fn detect_uv_key(object: &serde_json::Map<String, Value>) -> &'static str {
    for key in ["UV0", "UV", "UVs"] {
        if object.contains_key(key) {
            return key;
        }
    }
    "UV0"
}

fn required_array<'a>(item: &'a Value, key: &str) -> Result<&'a Vec<Value>> {
    item.get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| RelaxError::ParseFailed(format!("expected array field: {}", key)))
}

/// Parse a text-encoded `(X=…,Y=…,Z=…)` vector
pub fn parse_vector3(raw: &str) -> Result<DVec3> {
    let captures = vector3_pattern()
        .captures(raw)
        .ok_or_else(|| RelaxError::ParseFailed(format!("cannot parse vector: {}", raw)))?;
    Ok(DVec3::new(
        parse_component(&captures[1])?,
        parse_component(&captures[2])?,
        parse_component(&captures[3])?,
    ))
}

fn parse_component(text: &str) -> Result<f64> {
    text.parse::<f64>()
        .map_err(|_| RelaxError::ParseFailed(format!("bad number: {}", text)))
}

pub(crate) fn parse_vector3_array(array: &[Value]) -> Result<Vec<DVec3>> {
    array
        .iter()
        .map(|v| parse_vector3(v.as_str().unwrap_or_default()))
        .collect()
}

pub(crate) fn parse_index_array(array: &[Value]) -> Result<Vec<usize>> {
    array
        .iter()
        .map(|v| {
            v.as_u64()
                .map(|n| n as usize)
                .ok_or_else(|| RelaxError::ParseFailed(format!("bad triangle index: {}", v)))
        })
        .collect()
}

/// Parse a tangent array; entries that do not match the tangent shape fall
/// back to +X with flip enabled
pub(crate) fn parse_tangent_array(array: &[Value]) -> Vec<TangentEntry> {
    array
        .iter()
        .map(|v| {
            let raw = v.as_str().unwrap_or_default();
            match tangent_pattern().captures(raw) {
                Some(captures) => TangentEntry {
                    tangent: DVec3::new(
                        captures[1].parse().unwrap_or(0.0),
                        captures[2].parse().unwrap_or(0.0),
                        captures[3].parse().unwrap_or(0.0),
                    ),
                    flip_y: &captures[4] == "True",
                },
                None => TangentEntry {
                    tangent: DVec3::X,
                    flip_y: true,
                },
            }
        })
        .collect()
}

/// Longitude-aligned tangent for a unit surface normal
pub(crate) fn tangent_from_spherical(n: DVec3) -> DVec3 {
    let lon = n.z.atan2(n.x);
    let t = DVec3::new(-lon.sin(), 0.0, lon.cos());
    let mut ortho = t - n * t.dot(n);
    let mut len = ortho.length();
    if len < EPS {
        ortho = DVec3::Z - n * n.z;
        len = ortho.length();
        if len < EPS {
            ortho = DVec3::X;
            len = 1.0;
        }
    }
    ortho / len
}

pub(crate) fn format_vector3(v: DVec3) -> String {
    format!("(X={:.6},Y={:.6},Z={:.6})", v.x, v.y, v.z)
}

pub(crate) fn format_tangent(tangent: DVec3, flip_y: bool) -> String {
    format!(
        "(TangentX=(X={:.6},Y={:.6},Z={:.6}),bFlipTangentY={})",
        tangent.x,
        tangent.y,
        tangent.z,
        if flip_y { "True" } else { "False" }
    )
}

pub(crate) fn format_uv(n: DVec3) -> String {
    let mut u = 0.5 + n.z.atan2(n.x) / std::f64::consts::TAU;
    if u < 0.0 {
        u += 1.0;
    }
    if u > 1.0 {
        u -= 1.0;
    }
    let v = 0.5 - n.y.clamp(-1.0, 1.0).asin() / std::f64::consts::PI;
    format!("(X={:.6},Y={:.6})", u, v)
}
