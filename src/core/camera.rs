//! Orbit camera for viewing the scene

use crate::core::types::{Mat4, Vec3, Vec4};

/// Camera orbiting a target point, with perspective projection parameters.
pub struct Camera {
    /// Point the camera orbits
    pub target: Vec3,
    /// Distance from the target
    pub distance: f32,
    /// Yaw around the Y axis, radians
    pub yaw: f32,
    /// Pitch above the horizon, radians
    pub pitch: f32,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

impl Camera {
    /// Create a camera orbiting `target` at `distance`.
    pub fn new(target: Vec3, distance: f32, aspect: f32) -> Self {
        Self {
            target,
            distance,
            yaw: 0.4,
            pitch: 0.3,
            fov_y: 55.0_f32.to_radians(),
            aspect,
            near: 0.1,
            far: 200.0,
        }
    }

    /// World-space eye position
    pub fn eye(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + self.distance * Vec3::new(cp * sy, sp, cp * cy)
    }

    /// World-space eye position as a homogeneous point
    pub fn eye_world(&self) -> Vec4 {
        self.eye().extend(1.0)
    }

    /// Get view matrix (world to camera space)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    /// Get projection matrix (camera to clip space)
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Get combined view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update the aspect ratio after a window resize
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eye_distance() {
        let cam = Camera::new(Vec3::new(0.0, -2.0, 0.0), 18.0, 16.0 / 9.0);
        let d = (cam.eye() - cam.target).length();
        assert!((d - 18.0).abs() < 1e-4);
    }

    #[test]
    fn test_view_moves_eye_to_origin() {
        let cam = Camera::new(Vec3::ZERO, 10.0, 1.0);
        let eye_view = cam.view_matrix() * cam.eye_world();
        assert!(eye_view.truncate().length() < 1e-4);
    }
}
