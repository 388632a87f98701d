use glam::{Mat4, Vec2, Vec3};

use crate::renderer::CameraUniform;

/// Orthographic camera looking down -Z at a viewport of `size` world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub size: Vec2,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn with_viewport(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            ..Self::default()
        }
    }

    pub fn change_size(&mut self, width: f32, height: f32) {
        self.size = Vec2::new(width, height);
    }

    pub fn aspect(&self) -> f32 {
        self.size.x / self.size.y
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn proj(&self) -> Mat4 {
        let half = self.size * 0.5;
        Mat4::orthographic_rh(-half.x, half.x, -half.y, half.y, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj() * self.view()
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform::from_matrix(self.view_proj())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            size: Vec2::new(1280.0, 720.0),
            near: 0.1,
            far: 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_proj_is_invertible() {
        let vp = Camera::with_viewport(800.0, 600.0).view_proj();
        let id = vp * vp.inverse();
        assert!(id.abs_diff_eq(Mat4::IDENTITY, 1e-4));
    }

    #[test]
    fn viewport_corner_maps_to_ndc_corner() {
        let cam = Camera::with_viewport(800.0, 600.0);
        let ndc = cam.view_proj().project_point3(Vec3::new(400.0, 300.0, 0.0));
        assert!((ndc.x - 1.0).abs() < 1e-5);
        assert!((ndc.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn change_size_updates_aspect() {
        let mut cam = Camera::default();
        cam.change_size(400.0, 200.0);
        assert_eq!(cam.aspect(), 2.0);
    }
}
