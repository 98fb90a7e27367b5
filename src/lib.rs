//! Pentagon/hexagon sphere tiling and relaxation
//!
//! A standalone library for generating subdivided icosphere tilings and
//! relaxing their vertices toward a geometrically regular configuration
//! (near-equal edge lengths and tile areas, preserved spherical radius),
//! suitable for feeding tile-based sphere meshes to any game engine.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use hexsphere_relax::*;
//!
//! // Generate the dual pentagon/hexagon tiling of a subdivided icosphere
//! let sphere = generation::generate_tiled_sphere(3, 1.0).unwrap();
//!
//! // Build the topology and relax it
//! let mut mesh = mesh::from_triangle_fans(&sphere.vertices, &sphere.triangles).mesh;
//! let config = RelaxationConfigBuilder::new()
//!     .iterations(350)
//!     .build()
//!     .unwrap();
//! let metrics = solver::relax(&mut mesh, &config).unwrap();
//! println!("edge std dev: {}", metrics.edge_std_dev);
//! ```

// Modules
pub mod error;
pub mod config;
pub mod mesh;
pub mod generation;
pub mod solver;
pub mod metrics;
pub mod io;
pub mod unreal;

// Re-export core types for convenience
pub use error::{RelaxError, Result};
pub use config::{RelaxationConfig, RelaxationConfigBuilder};
pub use mesh::{Mesh, Tile, TileType};
pub use metrics::{collect_metrics, RelaxationMetrics};
pub use solver::relax;
pub use io::{MeshDocument, TileRecord, VertexRecord};

// Re-export glam::DVec3 for convenience
pub use glam::DVec3;
