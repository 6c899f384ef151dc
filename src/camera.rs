use crate::wrap_angle;
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

const DEFAULT_UP: Vec3 = Vec3::Y;
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn aspect(&self) -> f32 {
        if self.height > 0 {
            self.width as f32 / self.height as f32
        } else {
            1.0
        }
    }
}

/// Simple perspective camera backing picking and manipulation math.
#[derive(Debug, Clone)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera3D {
    pub fn new(position: Vec3, target: Vec3, fov_y_radians: f32, near: f32, far: f32) -> Self {
        Self { position, target, up: DEFAULT_UP, fov_y_radians, near, far }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_radians, aspect.max(0.0001), self.near, self.far)
    }

    pub fn view_projection(&self, viewport: Viewport) -> Mat4 {
        self.projection_matrix(viewport.aspect()) * self.view_matrix()
    }

    /// Generates a world-space ray originating from the camera through a
    /// screen-space position.
    pub fn screen_ray(&self, screen: Vec2, viewport: Viewport) -> Option<(Vec3, Vec3)> {
        if viewport.width == 0 || viewport.height == 0 {
            return None;
        }
        let ndc_x = (2.0 * screen.x / viewport.width as f32) - 1.0;
        let ndc_y = 1.0 - (2.0 * screen.y / viewport.height as f32);
        let clip = Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let inv_view_proj = self.view_projection(viewport).inverse();
        let world = inv_view_proj * clip;
        if world.w.abs() < f32::EPSILON {
            return None;
        }
        let world_pos = (world.truncate() / world.w) - self.position;
        let dir = world_pos.normalize();
        Some((self.position, dir))
    }

    pub fn project_point(&self, point: Vec3, viewport: Viewport) -> Option<Vec2> {
        if viewport.width == 0 || viewport.height == 0 {
            return None;
        }
        let clip = self.view_projection(viewport) * point.extend(1.0);
        if clip.w.abs() < f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let x = (ndc.x + 1.0) * 0.5 * viewport.width as f32;
        let y = (1.0 - ndc.y) * 0.5 * viewport.height as f32;
        Some(Vec2::new(x, y))
    }
}

/// Orbit-style controller storing yaw/pitch around a target. Doubles as the
/// slow showcase shot behind the main menu via `advance`.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub radius: f32,
    pub yaw_radians: f32,
    pub pitch_radians: f32,
}

impl OrbitCamera {
    pub fn new(target: Vec3, radius: f32) -> Self {
        Self { target, radius: radius.max(0.01), yaw_radians: 0.0, pitch_radians: 0.0 }
    }

    pub fn to_camera(&self, fov_y_radians: f32, near: f32, far: f32) -> Camera3D {
        let rotation = Quat::from_euler(glam::EulerRot::YXZ, self.yaw_radians, self.pitch_radians, 0.0);
        let offset = rotation * Vec3::new(0.0, 0.0, self.radius);
        let position = self.target + offset;
        Camera3D::new(position, self.target, fov_y_radians, near, far)
    }

    pub fn orbit(&mut self, delta: Vec2) {
        self.yaw_radians += delta.x;
        self.pitch_radians = (self.pitch_radians + delta.y).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Constant-rate rotation around the target.
    pub fn advance(&mut self, dt: f32, angular_speed_radians: f32) {
        self.yaw_radians = wrap_angle(self.yaw_radians + angular_speed_radians * dt);
    }

    pub fn zoom(&mut self, factor: f32) {
        self.radius = (self.radius * factor).clamp(0.1, 10_000.0);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FlyInput {
    pub forward: f32,
    pub strafe: f32,
    pub lift: f32,
}

/// Free-fly controller used while editing.
#[derive(Debug, Clone)]
pub struct FreeflyCamera {
    pub position: Vec3,
    pub yaw_radians: f32,
    pub pitch_radians: f32,
    pub speed: f32,
}

impl FreeflyCamera {
    pub fn new(position: Vec3) -> Self {
        Self { position, yaw_radians: 0.0, pitch_radians: 0.0, speed: 4.0 }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(glam::EulerRot::YXZ, self.yaw_radians, self.pitch_radians, 0.0)
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::NEG_Z
    }

    pub fn look(&mut self, delta: Vec2) {
        self.yaw_radians = wrap_angle(self.yaw_radians + delta.x);
        self.pitch_radians = (self.pitch_radians + delta.y).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn update(&mut self, input: FlyInput, dt: f32) {
        let rotation = self.rotation();
        let mut movement =
            rotation * Vec3::NEG_Z * input.forward + rotation * Vec3::X * input.strafe;
        movement += Vec3::Y * input.lift;
        if movement.length_squared() > 1.0 {
            movement = movement.normalize();
        }
        self.position += movement * self.speed * dt;
    }

    pub fn to_camera(&self, fov_y_radians: f32, near: f32, far: f32) -> Camera3D {
        Camera3D::new(self.position, self.position + self.forward(), fov_y_radians, near, far)
    }
}

/// Rotation that turns a marker at `position` about the Y axis to face the
/// camera. Audio markers stay upright, so only yaw participates.
pub fn billboard_rotation(position: Vec3, camera_position: Vec3) -> Quat {
    let to_camera = camera_position - position;
    if to_camera.length_squared() < f32::EPSILON {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_y(to_camera.x.atan2(to_camera.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera3d_view_projection_is_finite() {
        let camera = Camera3D::new(Vec3::new(0.0, 1.0, 5.0), Vec3::ZERO, 60.0_f32.to_radians(), 0.1, 1000.0);
        let vp = camera.view_projection(Viewport::new(1280, 720));
        assert!(!vp.to_cols_array().iter().any(|v| v.is_nan() || v.is_infinite()));
    }

    #[test]
    fn orbit_camera_orbits_target() {
        let mut orbit = OrbitCamera::new(Vec3::ZERO, 5.0);
        orbit.orbit(Vec2::new(0.5, 0.25));
        let camera = orbit.to_camera(45.0f32.to_radians(), 0.1, 500.0);
        assert!(camera.position.distance(Vec3::ZERO) > 1.0);
        assert!(camera.position.distance(Vec3::ZERO) < 10.0);
    }

    #[test]
    fn advance_keeps_radius_constant() {
        let mut orbit = OrbitCamera::new(Vec3::new(1.0, 0.0, 1.0), 3.0);
        let before = orbit.to_camera(1.0, 0.1, 100.0).position;
        orbit.advance(0.5, 0.4);
        let after = orbit.to_camera(1.0, 0.1, 100.0).position;
        assert!(before != after);
        assert!((after.distance(orbit.target) - 3.0).abs() < 1e-4);
    }

    #[test]
    fn freefly_moves_along_view_direction() {
        let mut camera = FreeflyCamera::new(Vec3::ZERO);
        camera.update(FlyInput { forward: 1.0, ..FlyInput::default() }, 0.5);
        assert!((camera.position - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-4);
    }

    #[test]
    fn screen_center_ray_points_at_target() {
        let camera = Camera3D::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 60.0_f32.to_radians(), 0.1, 100.0);
        let (origin, dir) = camera
            .screen_ray(Vec2::new(640.0, 360.0), Viewport::new(1280, 720))
            .expect("center ray exists");
        assert_eq!(origin, camera.position);
        assert!((dir - Vec3::NEG_Z).length() < 1e-3);
    }

    #[test]
    fn billboard_faces_camera() {
        let rotation = billboard_rotation(Vec3::ZERO, Vec3::new(3.0, 0.0, 3.0));
        let facing = rotation * Vec3::Z;
        let expected = Vec3::new(3.0, 0.0, 3.0).normalize();
        assert!((facing - expected).length() < 1e-4);
    }
}
