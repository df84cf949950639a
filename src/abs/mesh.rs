//! Mesh management module.
//!
//! This module defines the CPU side [`MeshData`] with its [`VertexLayout`], and the [`Mesh`]
//! struct for managing the uploaded copy on the GPU side. Vertex data is a flat, interleaved
//! sequence of `f32` values.

use std::sync::Arc;

use glow::HasContext;

const FLOAT_SIZE: i32 = std::mem::size_of::<f32>() as i32;

/// Errors produced while describing or validating mesh data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    #[error("attribute {index} has {components} components, expected 1 to 4")]
    InvalidComponents { index: usize, components: i32 },
    #[error("attribute {index} starts at byte {offset}, expected {expected}")]
    OffsetMismatch {
        index: usize,
        offset: i32,
        expected: i32,
    },
    #[error("vertex layout has no attributes")]
    EmptyLayout,
    #[error("mesh has no vertices")]
    Empty,
    #[error("{len} floats do not split into vertices of {per_vertex} floats")]
    TrailingData { len: usize, per_vertex: usize },
    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        position: usize,
        index: u32,
        vertex_count: usize,
    },
    #[error("failed to create GPU buffers: {0}")]
    Create(String),
}

/// A single vertex attribute: how many floats it spans and where it starts in a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub components: i32,
    pub offset: i32,
}

/// The interleaving of vertex attributes, all sharing one stride.
///
/// Attribute `i` is bound to shader location `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
    stride: i32,
}

impl VertexLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute directly after the previous one. `components` must be 1 to 4.
    pub fn with_attribute(mut self, components: i32) -> Self {
        debug_assert!(
            (1..=4).contains(&components),
            "vertex attribute with {components} components"
        );
        self.attributes.push(VertexAttribute {
            components,
            offset: self.stride,
        });
        self.stride += components * FLOAT_SIZE;
        self
    }

    /// Builds a layout from explicit `(components, byte offset)` pairs.
    ///
    /// The offsets must describe tightly packed floats in declaration order, which is how
    /// every mesh in this crate is authored.
    pub fn from_attributes(attributes: &[(i32, i32)]) -> Result<Self, MeshError> {
        if attributes.is_empty() {
            return Err(MeshError::EmptyLayout);
        }
        let mut layout = Self::new();
        for (index, &(components, offset)) in attributes.iter().enumerate() {
            if !(1..=4).contains(&components) {
                return Err(MeshError::InvalidComponents { index, components });
            }
            if offset != layout.stride {
                return Err(MeshError::OffsetMismatch {
                    index,
                    offset,
                    expected: layout.stride,
                });
            }
            layout = layout.with_attribute(components);
        }
        Ok(layout)
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Size of one vertex in bytes.
    pub fn stride(&self) -> i32 {
        self.stride
    }

    /// Number of floats in one vertex.
    pub fn floats_per_vertex(&self) -> usize {
        (self.stride / FLOAT_SIZE) as usize
    }

    /// Declares the layout against the currently bound vertex array and buffer.
    fn apply(&self, gl: &glow::Context) {
        for (location, attribute) in self.attributes.iter().enumerate() {
            unsafe {
                gl.vertex_attrib_pointer_f32(
                    location as u32,
                    attribute.components,
                    glow::FLOAT,
                    false,
                    self.stride,
                    attribute.offset,
                );
                gl.enable_vertex_attrib_array(location as u32);
            }
        }
    }
}

/// Validated vertex and index data, ready to be uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    vertices: Vec<f32>,
    layout: VertexLayout,
    indices: Option<Vec<u32>>,
}

impl MeshData {
    /// Checks that `vertices` splits evenly into vertices of `layout` and that every index
    /// refers to an existing vertex.
    pub fn new(
        vertices: Vec<f32>,
        layout: VertexLayout,
        indices: Option<Vec<u32>>,
    ) -> Result<Self, MeshError> {
        if let Some((index, attribute)) = layout
            .attributes
            .iter()
            .enumerate()
            .find(|(_, attribute)| !(1..=4).contains(&attribute.components))
        {
            return Err(MeshError::InvalidComponents {
                index,
                components: attribute.components,
            });
        }
        let per_vertex = layout.floats_per_vertex();
        if per_vertex == 0 {
            return Err(MeshError::EmptyLayout);
        }
        if vertices.is_empty() {
            return Err(MeshError::Empty);
        }
        if vertices.len() % per_vertex != 0 {
            return Err(MeshError::TrailingData {
                len: vertices.len(),
                per_vertex,
            });
        }
        let vertex_count = vertices.len() / per_vertex;
        if let Some(indices) = &indices {
            if let Some((position, &index)) = indices
                .iter()
                .enumerate()
                .find(|(_, index)| **index as usize >= vertex_count)
            {
                return Err(MeshError::IndexOutOfRange {
                    position,
                    index,
                    vertex_count,
                });
            }
        }
        Ok(Self {
            vertices,
            layout,
            indices,
        })
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / self.layout.floats_per_vertex()
    }

    /// Returns the `components` floats of attribute `attribute` of vertex `vertex`.
    pub fn attribute(&self, vertex: usize, attribute: usize) -> Option<&[f32]> {
        let attr = self.layout.attributes.get(attribute)?;
        let start = vertex * self.layout.floats_per_vertex() + (attr.offset / FLOAT_SIZE) as usize;
        self.vertices.get(start..start + attr.components as usize)
    }

    /// How many elements a draw call over this data covers.
    pub fn element_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len(),
            None => self.vertex_count(),
        }
    }

    /// Groups the draw order into triangles of vertex indices.
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        let order: Vec<u32> = match &self.indices {
            Some(indices) => indices.clone(),
            None => (0..self.vertex_count() as u32).collect(),
        };
        order
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
            .collect()
    }
}

/// Represents a mesh stored on the GPU side.
pub struct Mesh {
    gl: Arc<glow::Context>,
    draw_mode: u32,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ebo: Option<glow::Buffer>,
    element_count: usize,
    float_count: usize,
}

impl Mesh {
    /// Uploads the given mesh data and records its layout in a vertex array.
    pub fn new(gl: &Arc<glow::Context>, data: &MeshData, draw_mode: u32) -> Result<Self, MeshError> {
        unsafe {
            let vao = gl.create_vertex_array().map_err(MeshError::Create)?;
            let vbo = gl.create_buffer().map_err(MeshError::Create)?;

            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(data.vertices()),
                glow::STATIC_DRAW,
            );

            let ebo = match data.indices() {
                Some(indices) => {
                    let ebo = gl.create_buffer().map_err(MeshError::Create)?;
                    gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
                    gl.buffer_data_u8_slice(
                        glow::ELEMENT_ARRAY_BUFFER,
                        bytemuck::cast_slice(indices),
                        glow::STATIC_DRAW,
                    );
                    Some(ebo)
                }
                None => None,
            };

            data.layout().apply(gl);

            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);

            log::debug!(
                "uploaded mesh: {} vertices, {} elements, indexed: {}",
                data.vertex_count(),
                data.element_count(),
                ebo.is_some()
            );

            Ok(Self {
                gl: Arc::clone(gl),
                draw_mode,
                vao,
                vbo,
                ebo,
                element_count: data.element_count(),
                float_count: data.vertices().len(),
            })
        }
    }

    /// Draws the mesh with whatever program and textures are bound.
    pub fn draw(&self) {
        unsafe {
            self.gl.bind_vertex_array(Some(self.vao));
            if self.ebo.is_some() {
                self.gl.draw_elements(
                    self.draw_mode,
                    self.element_count as i32,
                    glow::UNSIGNED_INT,
                    0,
                );
            } else {
                self.gl
                    .draw_arrays(self.draw_mode, 0, self.element_count as i32);
            }
            self.gl.bind_vertex_array(None);
        }
    }

    /// Reads the vertex buffer back from the GPU.
    pub fn read_vertices(&self) -> Vec<f32> {
        let mut floats = vec![0.0f32; self.float_count];
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
            self.gl.get_buffer_sub_data(
                glow::ARRAY_BUFFER,
                0,
                bytemuck::cast_slice_mut(floats.as_mut_slice()),
            );
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
        floats
    }

    /// Returns whether draws go through the index buffer.
    pub fn is_indexed(&self) -> bool {
        self.ebo.is_some()
    }

    /// Returns the amount of indices, or vertices for non-indexed meshes, used by a draw.
    pub fn element_count(&self) -> usize {
        self.element_count
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        log::debug!("deleting mesh {:?}", self.vao);
        unsafe {
            self.gl.delete_buffer(self.vbo);
            if let Some(ebo) = self.ebo {
                self.gl.delete_buffer(ebo);
            }
            self.gl.delete_vertex_array(self.vao);
        }
    }
}
