use std::fmt::Debug;

use bytemuck::{Pod, Zeroable};

use crate::quad::quad_indices;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
}

/// Something the renderer can turn into vertex and index buffers.
/// Meshes whose vertices live in a storage buffer return empty `contents`.
pub trait Geometry: Debug {
    fn contents(&self) -> &[u8];

    fn length(&self) -> u32;

    fn indices(&self) -> Option<&[u32]>;
}

#[derive(Debug, Clone)]
pub struct BasicGeometry {
    pub vertices: Vec<Vertex>,
    pub indices: Option<Vec<u32>>,
}

impl Geometry for BasicGeometry {
    fn contents(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    fn length(&self) -> u32 {
        self.vertices.len() as u32
    }

    fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }
}

/// Index-only geometry: vertices are generated in the shader from `vertex_index`.
#[derive(Debug, Clone)]
pub struct IndexGeometry {
    pub indices: Vec<u32>,
}

impl IndexGeometry {
    /// The static quad index template for `capacity` quads.
    pub fn quads(capacity: u32) -> Self {
        Self {
            indices: quad_indices(capacity),
        }
    }
}

impl Geometry for IndexGeometry {
    fn contents(&self) -> &[u8] {
        &[]
    }

    fn length(&self) -> u32 {
        0
    }

    fn indices(&self) -> Option<&[u32]> {
        Some(&self.indices)
    }
}

pub fn triangle_geometry() -> BasicGeometry {
    BasicGeometry {
        vertices: vec![
            Vertex {
                pos: [-0.5, -0.5, 0.0],
            },
            Vertex {
                pos: [0.5, -0.5, 0.0],
            },
            Vertex {
                pos: [0.0, 0.5, 0.0],
            },
        ],
        indices: None,
    }
}

pub fn quad_geometry() -> BasicGeometry {
    BasicGeometry {
        vertices: vec![
            Vertex {
                pos: [-0.5, -0.5, 0.0],
            },
            Vertex {
                pos: [0.5, -0.5, 0.0],
            },
            Vertex {
                pos: [0.5, 0.5, 0.0],
            },
            Vertex {
                pos: [-0.5, 0.5, 0.0],
            },
        ],
        indices: Some(quad_indices(1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_bytes() {
        let triangle = triangle_geometry();
        assert_eq!(triangle.length(), 3);
        assert_eq!(triangle.contents().len(), 3 * 12);
        assert!(triangle.indices().is_none());

        let quad = quad_geometry();
        assert_eq!(quad.indices(), Some(&[0, 1, 2, 0, 2, 3][..]));
    }

    #[test]
    fn index_only_geometry_has_no_vertices() {
        let quads = IndexGeometry::quads(4);
        assert!(quads.contents().is_empty());
        assert_eq!(quads.indices().map(|i| i.len()), Some(24));
    }
}
