use crate::renderer::{
    primitives, BufferManager, BufferOptions, BufferResult, BufferUsage, GpuDevice, TypedBuffer,
    Vertex,
};

/// Geometry a drawable instance can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Shape {
    Quad,
}

impl Shape {
    pub fn name(self) -> &'static str {
        match self {
            Shape::Quad => "quad",
        }
    }

    pub fn geometry(self) -> (Vec<Vertex>, Vec<u16>) {
        match self {
            Shape::Quad => primitives::quad_mesh(),
        }
    }
}

/// Vertex and index buffers of one shape, shared by every instance of it.
#[derive(Debug)]
pub struct Mesh {
    vertices: TypedBuffer<Vertex>,
    indices: TypedBuffer<u16>,
}

impl Mesh {
    pub fn from_shape<D: GpuDevice>(
        manager: &mut BufferManager<D>,
        shape: Shape,
    ) -> BufferResult<Self> {
        let (vertices, indices) = shape.geometry();
        Self::from_vertices(manager, shape.name(), vertices, indices)
    }

    pub fn from_vertices<D: GpuDevice>(
        manager: &mut BufferManager<D>,
        name: &str,
        vertices: Vec<Vertex>,
        indices: Vec<u16>,
    ) -> BufferResult<Self> {
        let vertices = TypedBuffer::new(
            manager,
            vertices,
            BufferOptions::new(format!("{name} VertexBuffer"))
                .with_usage(BufferUsage::Vertex)
                .static_mode(),
        )?;
        let indices = TypedBuffer::new(
            manager,
            indices,
            BufferOptions::new(format!("{name} IndexBuffer"))
                .with_usage(BufferUsage::Index)
                .static_mode(),
        )?;

        Ok(Self { vertices, indices })
    }

    pub fn vertex_buffer(&self) -> &TypedBuffer<Vertex> {
        &self.vertices
    }

    pub fn index_buffer(&self) -> &TypedBuffer<u16> {
        &self.indices
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::HeadlessDevice;

    #[test]
    fn quad_mesh_uploads_static_buffers() {
        let mut manager = BufferManager::new(HeadlessDevice::new());
        let mesh = Mesh::from_shape(&mut manager, Shape::Quad).unwrap();

        assert_eq!(mesh.index_count(), 6);
        assert_eq!(mesh.vertex_buffer().len(), 4);
        assert!(mesh.vertex_buffer().is_static());
        assert!(!mesh.index_buffer().is_dirty());
        assert_eq!(manager.len(), 2);
    }
}
