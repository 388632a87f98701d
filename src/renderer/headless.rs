// renderer/headless.rs
//
// Host-memory implementation of `GpuDevice`. Every allocation is a plain byte
// vector, so uploads can be inspected without an adapter.

use super::device::{DeviceBufferDescriptor, GpuDevice};
use super::error::{BufferError, TextureError};
use super::texture::TextureImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostBuffer {
    slot: usize,
    size: u64,
}

impl HostBuffer {
    pub fn size(&self) -> u64 {
        self.size
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTexture {
    pub label: String,
    pub width: u32,
    pub height: u32,
}

/// Counters for device traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub allocations: usize,
    pub writes: usize,
    pub bytes_written: u64,
    pub textures: usize,
}

#[derive(Debug, Default)]
pub struct HeadlessDevice {
    memory: Vec<Vec<u8>>,
    stats: DeviceStats,
    max_buffer_size: Option<u64>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse allocations larger than `max` bytes, the way a real adapter
    /// rejects sizes above its limits.
    pub fn with_max_buffer_size(max: u64) -> Self {
        Self {
            max_buffer_size: Some(max),
            ..Self::default()
        }
    }

    pub fn contents(&self, buffer: &HostBuffer) -> &[u8] {
        &self.memory[buffer.slot]
    }

    pub fn stats(&self) -> DeviceStats {
        self.stats
    }
}

impl GpuDevice for HeadlessDevice {
    type Buffer = HostBuffer;
    type Texture = HostTexture;

    fn create_buffer(
        &mut self,
        desc: &DeviceBufferDescriptor<'_>,
        contents: &[u8],
    ) -> Result<HostBuffer, BufferError> {
        if let Some(max) = self.max_buffer_size {
            if desc.size > max {
                return Err(BufferError::AllocationFailed {
                    label: desc.label.to_string(),
                    size: desc.size,
                    reason: format!("exceeds maximum buffer size of {max} bytes"),
                });
            }
        }

        let mut bytes = vec![0u8; desc.size as usize];
        let len = contents.len().min(bytes.len());
        bytes[..len].copy_from_slice(&contents[..len]);

        let slot = self.memory.len();
        self.memory.push(bytes);
        self.stats.allocations += 1;

        Ok(HostBuffer {
            slot,
            size: desc.size,
        })
    }

    fn write_buffer(&mut self, buffer: &HostBuffer, offset: u64, bytes: &[u8]) {
        let start = offset as usize;
        let end = start + bytes.len();
        let memory = &mut self.memory[buffer.slot];
        assert!(
            end <= memory.len(),
            "write of {} bytes at offset {} overflows buffer of {} bytes",
            bytes.len(),
            offset,
            memory.len()
        );
        memory[start..end].copy_from_slice(bytes);

        self.stats.writes += 1;
        self.stats.bytes_written += bytes.len() as u64;
    }

    fn create_texture(
        &mut self,
        label: &str,
        image: &TextureImage,
    ) -> Result<HostTexture, TextureError> {
        self.stats.textures += 1;
        Ok(HostTexture {
            label: label.to_string(),
            width: image.width,
            height: image.height,
        })
    }
}
