// renderer/buffer_manager.rs
//
// Registry of every GPU buffer the engine owns. Buffers are addressed by an
// opaque `BufferHandle`; a handle stays valid (and keeps pointing at the same
// logical buffer) across reallocations.

use std::collections::HashMap;

use super::device::{
    align_to_copy, BufferUsage, DeviceBufferDescriptor, GpuDevice, ShaderStage, COPY_ALIGNMENT,
};
use super::error::{BufferError, BufferResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(u32);

impl BufferHandle {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Everything the manager needs to (re)allocate a buffer.
#[derive(Debug, Clone, Copy)]
pub struct BufferRequest<'a> {
    pub label: &'a str,
    /// Minimum allocation size in bytes, used to reserve room for growth.
    pub capacity_bytes: u64,
    pub binding: u32,
    pub offset: u64,
    pub usage: BufferUsage,
    pub stage: ShaderStage,
    /// Static buffers regrow to the exact size, dynamic ones geometrically.
    pub static_mode: bool,
}

#[derive(Debug)]
pub struct BufferAllocation<B> {
    buffer: B,
    size: u64,
    binding: u32,
    offset: u64,
    stage: ShaderStage,
}

impl<B> BufferAllocation<B> {
    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn binding(&self) -> u32 {
        self.binding
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}

pub struct BufferManager<D: GpuDevice> {
    device: D,
    buffers: HashMap<BufferHandle, BufferAllocation<D::Buffer>>,
    next_handle: u32,
}

impl<D: GpuDevice> BufferManager<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            buffers: HashMap::new(),
            next_handle: 0,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Upload `contents` into a GPU buffer.
    ///
    /// Without `existing` a new buffer is allocated and registered under a
    /// fresh handle. With `existing` the buffer behind that handle is
    /// repopulated in place, or reallocated when it is too small, and the same
    /// handle is returned.
    pub fn create_buffer(
        &mut self,
        contents: &[u8],
        request: &BufferRequest<'_>,
        existing: Option<BufferHandle>,
    ) -> BufferResult<BufferHandle> {
        let required = align_to_copy((contents.len() as u64).max(request.capacity_bytes))
            .max(COPY_ALIGNMENT);

        let Some(handle) = existing else {
            let buffer = self.device.create_buffer(
                &DeviceBufferDescriptor {
                    label: request.label,
                    size: required,
                    usage: request.usage,
                },
                contents,
            )?;

            let handle = BufferHandle(self.next_handle);
            self.next_handle += 1;
            self.buffers.insert(
                handle,
                BufferAllocation {
                    buffer,
                    size: required,
                    binding: request.binding,
                    offset: request.offset,
                    stage: request.stage,
                },
            );
            log::debug!(
                "Allocated buffer {:?} for {:?}: {} bytes",
                handle,
                request.label,
                required
            );
            return Ok(handle);
        };

        let allocation = self
            .buffers
            .get_mut(&handle)
            .ok_or(BufferError::UnknownHandle(handle))?;
        allocation.binding = request.binding;
        allocation.offset = request.offset;
        allocation.stage = request.stage;

        if allocation.size >= required {
            if !contents.is_empty() {
                self.device.write_buffer(&allocation.buffer, 0, contents);
            }
            return Ok(handle);
        }

        let new_size = if request.static_mode {
            required
        } else {
            required.max(allocation.size * 2)
        };
        log::info!(
            "Growing buffer {:?} ({:?}): {} -> {} bytes",
            handle,
            request.label,
            allocation.size,
            new_size
        );

        allocation.buffer = self.device.create_buffer(
            &DeviceBufferDescriptor {
                label: request.label,
                size: new_size,
                usage: request.usage,
            },
            contents,
        )?;
        allocation.size = new_size;

        Ok(handle)
    }

    /// Write `bytes` into the buffer behind `handle` at byte `offset`.
    ///
    /// # Panics
    /// Panics if the handle is unknown or the range overflows the allocation.
    pub fn write_range(&mut self, handle: BufferHandle, offset: u64, bytes: &[u8]) {
        let allocation = self
            .buffers
            .get(&handle)
            .unwrap_or_else(|| panic!("{}", BufferError::UnknownHandle(handle)));
        assert!(
            offset + bytes.len() as u64 <= allocation.size,
            "write of {} bytes at offset {} overflows buffer {:?} of {} bytes",
            bytes.len(),
            offset,
            handle,
            allocation.size
        );
        self.device.write_buffer(&allocation.buffer, offset, bytes);
    }

    pub fn try_get_buffer(&self, handle: BufferHandle) -> BufferResult<&D::Buffer> {
        self.allocation(handle).map(BufferAllocation::buffer)
    }

    /// # Panics
    /// Every handle in use must have been issued by [`Self::create_buffer`];
    /// an unknown handle is a programming error.
    pub fn get_buffer(&self, handle: BufferHandle) -> &D::Buffer {
        self.try_get_buffer(handle)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn allocation(&self, handle: BufferHandle) -> BufferResult<&BufferAllocation<D::Buffer>> {
        self.buffers
            .get(&handle)
            .ok_or(BufferError::UnknownHandle(handle))
    }
}
