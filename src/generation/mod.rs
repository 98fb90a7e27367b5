//! Sphere mesh generation
//!
//! Builds subdivided icospheres and their dual pentagon/hexagon tilings,
//! the two from-scratch inputs to the relaxation pipeline.

pub mod dual;
pub mod icosphere;

pub use dual::{generate_tiled_sphere, TiledSphere};
pub use icosphere::IcosphereMesh;
