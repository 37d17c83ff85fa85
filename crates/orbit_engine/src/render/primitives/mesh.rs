//! Mesh representation
//!
//! Backend-agnostic geometry: interleaved vertices plus a triangle-list index
//! buffer. The Vulkan backend derives its vertex input state from
//! [`Vertex::layout`], so this module has no graphics API types.

use crate::render::{RenderError, RenderResult};

/// Vertex with position and texture coordinate
///
/// `#[repr(C)]` keeps the layout fixed at five tightly packed floats so the
/// slice can be uploaded as raw bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Texture coordinate
    pub tex_coord: [f32; 2],
}

// Only f32 arrays, no padding
unsafe impl bytemuck::Pod for Vertex {}
unsafe impl bytemuck::Zeroable for Vertex {}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            tex_coord,
        }
    }

    /// Interleaved attribute layout of this vertex type
    pub fn layout() -> VertexLayout {
        const FLOAT: u32 = std::mem::size_of::<f32>() as u32;
        VertexLayout {
            stride: std::mem::size_of::<Self>() as u32,
            attributes: vec![
                VertexAttribute {
                    location: 0,
                    components: 3,
                    offset: 0,
                },
                VertexAttribute {
                    location: 1,
                    components: 2,
                    offset: 3 * FLOAT,
                },
            ],
        }
    }
}

/// One float vector attribute inside an interleaved vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader input location
    pub location: u32,
    /// Number of f32 components (1 to 4)
    pub components: u32,
    /// Byte offset from the start of the vertex
    pub offset: u32,
}

/// Description of an interleaved vertex buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    /// Bytes between consecutive vertices
    pub stride: u32,
    /// Attributes in location order
    pub attributes: Vec<VertexAttribute>,
}

/// Triangle-list mesh
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Vertex data; a vertex's index here is its id
    pub vertices: Vec<Vertex>,
    /// Three indices per triangle
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a mesh, checking that it is a well-formed triangle list
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> RenderResult<Self> {
        let mesh = Self { vertices, indices };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Check index bounds and triangle grouping
    pub fn validate(&self) -> RenderResult<()> {
        if self.indices.len() % 3 != 0 {
            return Err(RenderError::InvalidParameter(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }

        let vertex_count = self.vertices.len();
        if let Some(bad) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(RenderError::InvalidParameter(format!(
                "index {bad} out of bounds for {vertex_count} vertices"
            )));
        }
        Ok(())
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Unit cube seen from the inside, for cube-map sky boxes
    ///
    /// Positions double as sampling directions, so texcoords are unused.
    pub fn skybox_cube() -> Self {
        let corners = [
            [-1.0, -1.0, -1.0],
            [1.0, -1.0, -1.0],
            [1.0, 1.0, -1.0],
            [-1.0, 1.0, -1.0],
            [-1.0, -1.0, 1.0],
            [1.0, -1.0, 1.0],
            [1.0, 1.0, 1.0],
            [-1.0, 1.0, 1.0],
        ];
        let vertices = corners
            .iter()
            .map(|&position| Vertex::new(position, [0.0, 0.0]))
            .collect();

        #[rustfmt::skip]
        let indices = vec![
            // -Z
            0, 1, 2, 2, 3, 0,
            // +Z
            4, 7, 6, 6, 5, 4,
            // -X
            0, 3, 7, 7, 4, 0,
            // +X
            1, 5, 6, 6, 2, 1,
            // -Y
            0, 4, 5, 5, 1, 0,
            // +Y
            3, 2, 6, 6, 7, 3,
        ];

        Self { vertices, indices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout_is_five_packed_floats() {
        let layout = Vertex::layout();
        assert_eq!(layout.stride, 20);
        assert_eq!(layout.attributes.len(), 2);
        assert_eq!(layout.attributes[0], VertexAttribute { location: 0, components: 3, offset: 0 });
        assert_eq!(layout.attributes[1], VertexAttribute { location: 1, components: 2, offset: 12 });
    }

    #[test]
    fn test_vertex_bytes() {
        let vertices = [Vertex::new([1.0, 2.0, 3.0], [4.0, 5.0])];
        let floats: &[f32] = bytemuck::cast_slice(&vertices);
        assert_eq!(floats, &[1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_new_rejects_out_of_bounds_index() {
        let vertices = vec![Vertex::default(); 3];
        assert!(Mesh::new(vertices.clone(), vec![0, 1, 2]).is_ok());
        assert!(matches!(
            Mesh::new(vertices.clone(), vec![0, 1, 3]),
            Err(RenderError::InvalidParameter(_))
        ));
        assert!(matches!(
            Mesh::new(vertices, vec![0, 1]),
            Err(RenderError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_skybox_cube() {
        let cube = Mesh::skybox_cube();
        assert!(cube.validate().is_ok());
        assert_eq!(cube.vertices.len(), 8);
        assert_eq!(cube.triangle_count(), 12);
    }
}
