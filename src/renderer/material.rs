// renderer/material.rs

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaterialFlags: u32 {
        const TEXTURED = 1 << 0;
        const ALPHA_BLEND = 1 << 1;
        const DOUBLE_SIDED = 1 << 2;
    }
}

/// Shader the engine registers for quads out of the box.
pub const DIFFUSE_SHADER: &str = "diffuse";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Material {
    pub shader: String,
    pub base_color: [u8; 4],
    pub flags: MaterialFlags,
}

impl Material {
    pub fn new(shader: impl Into<String>) -> Self {
        Self {
            shader: shader.into(),
            base_color: [255, 255, 255, 255],
            flags: MaterialFlags::empty(),
        }
    }

    pub fn diffuse() -> Self {
        Self::new(DIFFUSE_SHADER)
    }

    pub fn with_color(mut self, color: [u8; 4]) -> Self {
        self.base_color = color;
        self
    }

    pub fn textured(mut self) -> Self {
        self.flags |= MaterialFlags::TEXTURED;
        self
    }

    pub fn with_alpha(mut self) -> Self {
        self.flags |= MaterialFlags::ALPHA_BLEND;
        self
    }

    pub fn double_sided(mut self) -> Self {
        self.flags |= MaterialFlags::DOUBLE_SIDED;
        self
    }

    pub fn color_f32(&self) -> [f32; 4] {
        self.base_color.map(|c| c as f32 / 255.0)
    }

    pub fn requires_separate_pass(&self) -> bool {
        self.flags.contains(MaterialFlags::ALPHA_BLEND)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::diffuse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diffuse_is_opaque_white() {
        let material = Material::default();
        assert_eq!(material.shader, DIFFUSE_SHADER);
        assert_eq!(material.color_f32(), [1.0; 4]);
        assert!(!material.requires_separate_pass());
    }

    #[test]
    fn flags_accumulate() {
        let material = Material::diffuse().textured().with_alpha();
        assert!(material.flags.contains(MaterialFlags::TEXTURED | MaterialFlags::ALPHA_BLEND));
        assert!(!material.flags.contains(MaterialFlags::DOUBLE_SIDED));
        assert!(material.requires_separate_pass());
    }
}
