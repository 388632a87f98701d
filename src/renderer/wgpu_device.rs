// renderer/wgpu_device.rs

use std::borrow::Cow;

use super::device::{align_to_copy, DeviceBufferDescriptor, GpuDevice, COPY_ALIGNMENT};
use super::error::{BufferError, TextureError};
use super::texture::TextureImage;

/// `GpuDevice` backed by an already initialised wgpu device and queue.
#[derive(Debug, Clone)]
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

#[derive(Debug)]
pub struct WgpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl WgpuDevice {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

/// Queue writes must cover a multiple of four bytes.
fn padded(bytes: &[u8]) -> Cow<'_, [u8]> {
    let aligned = align_to_copy(bytes.len() as u64) as usize;
    if aligned == bytes.len() {
        Cow::Borrowed(bytes)
    } else {
        let mut owned = bytes.to_vec();
        owned.resize(aligned, 0);
        Cow::Owned(owned)
    }
}

impl GpuDevice for WgpuDevice {
    type Buffer = wgpu::Buffer;
    type Texture = WgpuTexture;

    fn create_buffer(
        &mut self,
        desc: &DeviceBufferDescriptor<'_>,
        contents: &[u8],
    ) -> Result<wgpu::Buffer, BufferError> {
        let max = self.device.limits().max_buffer_size;
        if desc.size > max {
            return Err(BufferError::AllocationFailed {
                label: desc.label.to_string(),
                size: desc.size,
                reason: format!("device limit is {max} bytes"),
            });
        }

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(desc.label),
            size: desc.size,
            usage: desc.usage.to_wgpu(),
            mapped_at_creation: false,
        });

        if !contents.is_empty() {
            self.queue.write_buffer(&buffer, 0, &padded(contents));
        }

        Ok(buffer)
    }

    fn write_buffer(&mut self, buffer: &wgpu::Buffer, offset: u64, bytes: &[u8]) {
        debug_assert_eq!(offset % COPY_ALIGNMENT, 0, "unaligned buffer write");
        self.queue.write_buffer(buffer, offset, &padded(bytes));
    }

    fn create_texture(
        &mut self,
        label: &str,
        image: &TextureImage,
    ) -> Result<WgpuTexture, TextureError> {
        let limit = self.device.limits().max_texture_dimension_2d;
        if image.width > limit || image.height > limit {
            return Err(TextureError::Device {
                name: label.to_string(),
                reason: format!(
                    "{}x{} exceeds the {limit} pixel texture limit",
                    image.width, image.height
                ),
            });
        }

        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width),
                rows_per_image: Some(image.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler_label = format!("{label} Sampler");
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&sampler_label),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(WgpuTexture {
            texture,
            view,
            sampler,
        })
    }
}
