use super::{BufferHandle, CameraUniform, TextureInstance};
use crate::asset::Shape;

/// One instanced draw, as produced by traversing the scene graph.
///
/// All buffer handles are flushed: their GPU contents match the CPU side at
/// the time the draw list was built.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Depth of the owning scene in the tree, the root being 0.
    pub scene_depth: usize,
    pub material_index: usize,
    pub shader: String,
    /// Material colour, normalized to 0..1.
    pub base_color: [f32; 4],
    /// Alpha-blended materials are drawn after all opaque ones.
    pub blended: bool,
    /// View-projection of the owning scene's camera.
    pub view_proj: CameraUniform,
    pub drawable: String,
    pub shape: Shape,
    pub vertex_buffer: BufferHandle,
    pub index_buffer: BufferHandle,
    pub index_count: u32,
    pub model_buffer: BufferHandle,
    pub model_binding: u32,
    pub model_offset: u64,
    pub instance_count: u32,
    pub textures: Vec<TextureInstance>,
}

impl DrawCall {
    pub fn instances(&self) -> std::ops::Range<u32> {
        0..self.instance_count
    }
}
