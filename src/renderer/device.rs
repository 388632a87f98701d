// renderer/device.rs
//
// The graphics context as seen by the buffer manager: an allocator that can
// create-and-populate buffers, write byte ranges into them, and upload decoded
// images as textures.

use super::error::{BufferError, TextureError};
use super::texture::TextureImage;

/// Offsets and sizes of buffer writes must be multiples of this.
pub const COPY_ALIGNMENT: u64 = wgpu::COPY_BUFFER_ALIGNMENT;

/// Round `size` up to the next multiple of [`COPY_ALIGNMENT`].
pub fn align_to_copy(size: u64) -> u64 {
    size.div_ceil(COPY_ALIGNMENT) * COPY_ALIGNMENT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Vertex,
    Index,
    Uniform,
    Storage,
}

impl BufferUsage {
    pub fn to_wgpu(self) -> wgpu::BufferUsages {
        let usage = match self {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::Index => wgpu::BufferUsages::INDEX,
            BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM,
            BufferUsage::Storage => wgpu::BufferUsages::STORAGE,
        };
        usage | wgpu::BufferUsages::COPY_DST
    }
}

/// Shader stage a buffer is bound to when drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShaderStage {
    #[default]
    Vertex,
    Fragment,
}

#[derive(Debug, Clone, Copy)]
pub struct DeviceBufferDescriptor<'a> {
    pub label: &'a str,
    /// Allocation size in bytes, already aligned to [`COPY_ALIGNMENT`].
    pub size: u64,
    pub usage: BufferUsage,
}

pub trait GpuDevice {
    type Buffer;
    type Texture;

    /// Allocate a buffer of `desc.size` bytes and copy `contents` to its start.
    fn create_buffer(
        &mut self,
        desc: &DeviceBufferDescriptor<'_>,
        contents: &[u8],
    ) -> Result<Self::Buffer, BufferError>;

    /// Overwrite `bytes.len()` bytes of `buffer` starting at `offset`.
    fn write_buffer(&mut self, buffer: &Self::Buffer, offset: u64, bytes: &[u8]);

    fn create_texture(
        &mut self,
        label: &str,
        image: &TextureImage,
    ) -> Result<Self::Texture, TextureError>;
}
