//! Core primitive types for rendering
//!
//! Geometry, procedural shapes and the camera. Nothing here depends on a
//! graphics API.

pub mod camera;
pub mod mesh;
pub mod sphere;

pub use camera::{Camera, Movement, PITCH_LIMIT};
pub use mesh::{Mesh, Vertex, VertexAttribute, VertexLayout};
pub use sphere::generate_sphere;
