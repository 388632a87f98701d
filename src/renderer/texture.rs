// renderer/texture.rs

use std::path::Path;

use super::error::TextureError;

/// Decoded RGBA8 pixels, ready to be uploaded by a [`GpuDevice`](super::GpuDevice).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureImage {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let path = path.as_ref();
        log::info!("Loading texture: {:?}", path);

        let bytes = std::fs::read(path).map_err(|source| TextureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&path.to_string_lossy(), &bytes)
    }

    /// Decode an encoded image (PNG, JPEG, ...) held in memory.
    pub fn from_bytes(name: &str, bytes: &[u8]) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes).map_err(|source| TextureError::Decode {
            name: name.to_string(),
            source,
        })?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixels = color
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }
}

/// A loaded texture. Immutable once created; its identity is its name.
#[derive(Debug)]
pub struct Texture<T> {
    name: String,
    width: u32,
    height: u32,
    gpu: T,
}

impl<T> Texture<T> {
    pub fn new(name: impl Into<String>, image: &TextureImage, gpu: T) -> Self {
        Self {
            name: name.into(),
            width: image.width,
            height: image.height,
            gpu,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn gpu(&self) -> &T {
        &self.gpu
    }
}

/// Binds a texture, by name, to a slot of a material.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureInstance {
    pub slot: u32,
    pub texture: String,
}

impl TextureInstance {
    pub fn new(slot: u32, texture: impl Into<String>) -> Self {
        Self {
            slot,
            texture: texture.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encoded_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decodes_png_to_rgba8() {
        let image = TextureImage::from_bytes("test", &encoded_png(3, 2)).unwrap();
        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(image.pixels.len(), 3 * 2 * 4);
        assert_eq!(&image.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = TextureImage::from_bytes("broken", b"not an image").unwrap_err();
        assert!(matches!(err, TextureError::Decode { ref name, .. } if name == "broken"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = TextureImage::from_path("does/not/exist.png").unwrap_err();
        assert!(matches!(err, TextureError::Io { .. }));
    }

    #[test]
    fn solid_fills_every_pixel() {
        let image = TextureImage::solid(2, 2, [1, 2, 3, 4]);
        assert_eq!(image.pixels, [1, 2, 3, 4].repeat(4));
    }
}
