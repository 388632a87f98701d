pub mod buffer_manager;
pub mod device;
pub mod draw;
pub mod error;
pub mod headless;
pub mod material;
pub mod primitives;
pub mod texture;
pub mod typed_buffer;
pub mod uniforms;
pub mod vertex;
pub mod wgpu_device;

pub use buffer_manager::{BufferAllocation, BufferHandle, BufferManager, BufferRequest};
pub use device::{BufferUsage, DeviceBufferDescriptor, GpuDevice, ShaderStage};
pub use draw::DrawCall;
pub use error::{BufferError, BufferResult, TextureError};
pub use headless::{DeviceStats, HeadlessDevice, HostBuffer, HostTexture};
pub use material::{Material, MaterialFlags};
pub use texture::{Texture, TextureImage, TextureInstance};
pub use typed_buffer::{BufferOptions, TypedBuffer};
pub use uniforms::{CameraUniform, ModelUniform};
pub use vertex::Vertex;
pub use wgpu_device::{WgpuDevice, WgpuTexture};
