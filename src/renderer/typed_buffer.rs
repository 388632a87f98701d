// renderer/typed_buffer.rs
//
// A CPU-side `Vec<T>` mirrored into one GPU allocation. Mutations mark the
// buffer dirty; the full re-upload is deferred until the handle is read or
// `finish` is called. Single-element replaces go straight to the GPU.

use std::mem;

use bytemuck::Pod;

use super::buffer_manager::{BufferHandle, BufferManager, BufferRequest};
use super::device::{BufferUsage, GpuDevice, ShaderStage, COPY_ALIGNMENT};
use super::error::BufferResult;

#[derive(Debug, Clone)]
pub struct BufferOptions {
    pub label: String,
    pub binding: u32,
    /// Byte offset used when the buffer is bound for drawing.
    pub offset: u64,
    /// Number of elements to reserve up front.
    pub reserve: usize,
    pub usage: BufferUsage,
    pub stage: ShaderStage,
    pub static_mode: bool,
}

impl Default for BufferOptions {
    fn default() -> Self {
        Self {
            label: "TypedBuffer".to_string(),
            binding: 0,
            offset: 0,
            reserve: 1,
            usage: BufferUsage::Storage,
            stage: ShaderStage::Vertex,
            static_mode: false,
        }
    }
}

impl BufferOptions {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn with_binding(mut self, binding: u32) -> Self {
        self.binding = binding;
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_reserve(mut self, reserve: usize) -> Self {
        self.reserve = reserve;
        self
    }

    pub fn with_usage(mut self, usage: BufferUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_stage(mut self, stage: ShaderStage) -> Self {
        self.stage = stage;
        self
    }

    pub fn static_mode(mut self) -> Self {
        self.static_mode = true;
        self
    }
}

fn request_for<T>(options: &BufferOptions, capacity: usize) -> BufferRequest<'_> {
    BufferRequest {
        label: &options.label,
        capacity_bytes: (capacity * mem::size_of::<T>()) as u64,
        binding: options.binding,
        offset: options.offset,
        usage: options.usage,
        stage: options.stage,
        static_mode: options.static_mode,
    }
}

#[derive(Debug)]
pub struct TypedBuffer<T: Pod> {
    data: Vec<T>,
    handle: BufferHandle,
    reserved: usize,
    options: BufferOptions,
    dirty: bool,
}

impl<T: Pod> TypedBuffer<T> {
    /// Allocate the GPU mirror and upload `data` immediately.
    pub fn new<D: GpuDevice>(
        manager: &mut BufferManager<D>,
        mut data: Vec<T>,
        options: BufferOptions,
    ) -> BufferResult<Self> {
        let reserved = options.reserve.max(data.len());
        data.reserve(reserved - data.len());

        let handle = manager.create_buffer(
            bytemuck::cast_slice(&data),
            &request_for::<T>(&options, reserved),
            None,
        )?;

        Ok(Self {
            data,
            handle,
            reserved,
            options,
            dirty: false,
        })
    }

    pub fn with_value<D: GpuDevice>(
        manager: &mut BufferManager<D>,
        value: T,
        options: BufferOptions,
    ) -> BufferResult<Self> {
        Self::new(manager, vec![value], options)
    }

    /// Push `value` and return its index. The upload is deferred.
    pub fn append(&mut self, value: T) -> usize {
        self.data.push(value);
        self.dirty = true;
        self.data.len() - 1
    }

    /// Overwrite one element and write just its bytes to the GPU.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn replace_at<D: GpuDevice>(
        &mut self,
        manager: &mut BufferManager<D>,
        index: usize,
        value: T,
    ) -> BufferResult<()> {
        assert!(
            index < self.data.len(),
            "replace_at index {} out of range for {:?} of length {}",
            index,
            self.options.label,
            self.data.len()
        );
        self.data[index] = value;

        if self.dirty {
            return self.upload(manager);
        }

        let stride = mem::size_of::<T>() as u64;
        let offset = index as u64 * stride;
        if offset % COPY_ALIGNMENT != 0 || stride % COPY_ALIGNMENT != 0 {
            return self.upload(manager);
        }

        manager.write_range(self.handle, offset, bytemuck::bytes_of(&self.data[index]));
        Ok(())
    }

    /// Replace the whole sequence.
    ///
    /// With an unchanged length the new contents are written immediately.
    /// Otherwise the sequence is resized and the next read or `finish`
    /// re-uploads it.
    pub fn replace_all<D: GpuDevice>(
        &mut self,
        manager: &mut BufferManager<D>,
        values: Vec<T>,
    ) -> BufferResult<()> {
        if values.len() != self.data.len() {
            log::debug!(
                "Resizing {:?}: {} -> {} elements",
                self.options.label,
                self.data.len(),
                values.len()
            );
            self.data = values;
            self.dirty = true;
            return Ok(());
        }

        self.data = values;
        if self.dirty {
            return self.upload(manager);
        }
        if !self.data.is_empty() {
            manager.write_range(self.handle, 0, bytemuck::cast_slice(&self.data));
        }
        Ok(())
    }

    /// Grow the reserved capacity to `size` elements.
    pub fn reserve(&mut self, size: usize) {
        if size > self.reserved {
            self.data.reserve(size.saturating_sub(self.data.len()));
            self.reserved = size;
        }
        self.dirty = true;
    }

    pub fn finish<D: GpuDevice>(&mut self, manager: &mut BufferManager<D>) -> BufferResult<()> {
        if self.dirty {
            self.upload(manager)?;
        }
        Ok(())
    }

    /// Handle of the GPU mirror, uploading pending changes first.
    pub fn buffer<D: GpuDevice>(
        &mut self,
        manager: &mut BufferManager<D>,
    ) -> BufferResult<BufferHandle> {
        self.finish(manager)?;
        Ok(self.handle)
    }

    pub fn gpu_buffer<'m, D: GpuDevice>(
        &mut self,
        manager: &'m mut BufferManager<D>,
    ) -> BufferResult<&'m D::Buffer> {
        self.finish(manager)?;
        manager.try_get_buffer(self.handle)
    }

    fn upload<D: GpuDevice>(&mut self, manager: &mut BufferManager<D>) -> BufferResult<()> {
        let request = request_for::<T>(&self.options, self.capacity());
        manager.create_buffer(bytemuck::cast_slice(&self.data), &request, Some(self.handle))?;
        log::debug!(
            "Uploaded {:?}: {} elements",
            self.options.label,
            self.data.len()
        );
        self.dirty = false;
        Ok(())
    }

    /// Handle without flushing; the GPU copy may be stale if dirty.
    pub fn handle(&self) -> BufferHandle {
        self.handle
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.reserved.max(self.data.len())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn binding(&self) -> u32 {
        self.options.binding
    }

    pub fn set_binding(&mut self, binding: u32) {
        self.options.binding = binding;
    }

    pub fn offset(&self) -> u64 {
        self.options.offset
    }

    pub fn set_offset(&mut self, offset: u64) {
        self.options.offset = offset;
    }

    pub fn stage(&self) -> ShaderStage {
        self.options.stage
    }

    pub fn is_static(&self) -> bool {
        self.options.static_mode
    }

    pub fn usage(&self) -> BufferUsage {
        self.options.usage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{HeadlessDevice, HostBuffer};

    fn manager() -> BufferManager<HeadlessDevice> {
        BufferManager::new(HeadlessDevice::new())
    }

    fn gpu_bytes<'a>(manager: &'a BufferManager<HeadlessDevice>, buffer: &TypedBuffer<u32>) -> &'a [u8] {
        let host: &HostBuffer = manager.get_buffer(buffer.handle());
        &manager.device().contents(host)[..buffer.len() * 4]
    }

    #[test]
    fn create_uploads_immediately() {
        let mut manager = manager();
        let buffer = TypedBuffer::new(&mut manager, vec![1u32, 2, 3], BufferOptions::default()).unwrap();
        assert!(!buffer.is_dirty());
        assert_eq!(gpu_bytes(&manager, &buffer), bytemuck::cast_slice::<u32, u8>(&[1, 2, 3]));
    }

    #[test]
    fn reserve_option_sizes_the_allocation() {
        let mut manager = manager();
        let buffer = TypedBuffer::with_value(
            &mut manager,
            7u32,
            BufferOptions::default().with_reserve(8),
        )
        .unwrap();
        assert_eq!(buffer.capacity(), 8);
        assert_eq!(manager.allocation(buffer.handle()).unwrap().size(), 32);
    }

    #[test]
    fn append_defers_upload_until_read() {
        let mut manager = manager();
        let mut buffer = TypedBuffer::with_value(&mut manager, 1u32, BufferOptions::default()).unwrap();
        let writes = manager.device().stats().writes;

        assert_eq!(buffer.append(2), 1);
        assert_eq!(buffer.append(3), 2);
        assert!(buffer.is_dirty());
        assert_eq!(manager.device().stats().writes, writes);

        let handle = buffer.buffer(&mut manager).unwrap();
        assert_eq!(handle, buffer.handle());
        assert!(!buffer.is_dirty());
        assert_eq!(gpu_bytes(&manager, &buffer), bytemuck::cast_slice::<u32, u8>(&[1, 2, 3]));
    }

    #[test]
    fn finish_is_idempotent() {
        let mut manager = manager();
        let mut buffer = TypedBuffer::with_value(&mut manager, 1u32, BufferOptions::default()).unwrap();
        buffer.append(2);

        buffer.finish(&mut manager).unwrap();
        let stats = manager.device().stats();
        buffer.finish(&mut manager).unwrap();

        assert!(!buffer.is_dirty());
        assert_eq!(manager.device().stats(), stats);
    }

    #[test]
    fn replace_at_writes_only_the_element() {
        let mut manager = manager();
        let mut buffer = TypedBuffer::new(&mut manager, vec![1u32, 2, 3, 4], BufferOptions::default()).unwrap();
        let before = manager.device().stats();

        buffer.replace_at(&mut manager, 2, 30).unwrap();

        let after = manager.device().stats();
        assert_eq!(after.writes, before.writes + 1);
        assert_eq!(after.bytes_written, before.bytes_written + 4);
        assert_eq!(gpu_bytes(&manager, &buffer), bytemuck::cast_slice::<u32, u8>(&[1, 2, 30, 4]));
    }

    #[test]
    fn replace_at_on_dirty_buffer_flushes_everything() {
        let mut manager = manager();
        let mut buffer = TypedBuffer::with_value(&mut manager, 1u32, BufferOptions::default()).unwrap();
        buffer.append(2);
        buffer.replace_at(&mut manager, 0, 10).unwrap();

        assert!(!buffer.is_dirty());
        assert_eq!(gpu_bytes(&manager, &buffer), bytemuck::cast_slice::<u32, u8>(&[10, 2]));
    }

    #[test]
    fn unaligned_elements_fall_back_to_full_upload() {
        let mut manager = manager();
        let mut buffer = TypedBuffer::new(&mut manager, vec![1u16, 2, 3], BufferOptions::default()).unwrap();
        buffer.replace_at(&mut manager, 1, 20).unwrap();

        let host = manager.get_buffer(buffer.handle());
        assert_eq!(
            &manager.device().contents(host)[..6],
            bytemuck::cast_slice::<u16, u8>(&[1, 20, 3])
        );
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn replace_at_out_of_range_panics() {
        let mut manager = manager();
        let mut buffer = TypedBuffer::with_value(&mut manager, 1u32, BufferOptions::default()).unwrap();
        let _ = buffer.replace_at(&mut manager, 1, 2);
    }

    #[test]
    fn replace_all_with_same_length_writes_now() {
        let mut manager = manager();
        let mut buffer = TypedBuffer::new(&mut manager, vec![1u32, 2], BufferOptions::default()).unwrap();
        buffer.replace_all(&mut manager, vec![5, 6]).unwrap();

        assert!(!buffer.is_dirty());
        assert_eq!(gpu_bytes(&manager, &buffer), bytemuck::cast_slice::<u32, u8>(&[5, 6]));
    }

    #[test]
    fn replace_all_with_new_length_resizes_on_next_read() {
        let mut manager = manager();
        let mut buffer = TypedBuffer::new(&mut manager, vec![1u32, 2], BufferOptions::default()).unwrap();
        buffer.replace_all(&mut manager, vec![5, 6, 7]).unwrap();

        assert!(buffer.is_dirty());
        assert_eq!(buffer.data(), &[5, 6, 7]);

        let handle = buffer.buffer(&mut manager).unwrap();
        assert_eq!(handle, buffer.handle());
        assert_eq!(gpu_bytes(&manager, &buffer), bytemuck::cast_slice::<u32, u8>(&[5, 6, 7]));
    }

    #[test]
    fn reserve_grows_capacity_and_keeps_handle() {
        let mut manager = manager();
        let mut buffer = TypedBuffer::with_value(&mut manager, 1u32, BufferOptions::default()).unwrap();
        let handle = buffer.handle();

        buffer.reserve(64);
        assert_eq!(buffer.len(), 1);
        assert!(buffer.is_dirty());

        assert_eq!(buffer.buffer(&mut manager).unwrap(), handle);
        assert_eq!(manager.allocation(handle).unwrap().size(), 256);
    }

    #[test]
    fn binding_metadata_is_forwarded() {
        let mut manager = manager();
        let mut buffer = TypedBuffer::with_value(
            &mut manager,
            1u32,
            BufferOptions::new("Models")
                .with_binding(2)
                .with_offset(16)
                .with_stage(ShaderStage::Fragment),
        )
        .unwrap();
        buffer.set_binding(3);
        buffer.reserve(2);
        buffer.finish(&mut manager).unwrap();

        let allocation = manager.allocation(buffer.handle()).unwrap();
        assert_eq!(allocation.binding(), 3);
        assert_eq!(allocation.offset(), 16);
        assert_eq!(allocation.stage(), ShaderStage::Fragment);
    }
}
