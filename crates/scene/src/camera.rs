use glam::{Mat4, Vec3};

/// How far the target may sit above or below the eye.
pub const PITCH_LIMIT: f32 = 8.0;
/// Mouse motion units per radian of look.
pub const LOOK_SCALE: f32 = 1000.0;
pub const MIN_FOV: f32 = 1.0;
pub const MAX_FOV: f32 = 90.0;

/// Eye/target camera. Movement stays in the XZ plane; looking up and down
/// raises or lowers the target instead of tilting around the eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 1.0, 8.0),
            target: Vec3::new(0.0, 1.0, 0.0),
            up: Vec3::Y,
            fov: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize_or_zero()
    }

    fn planar(&self) -> Vec3 {
        let d = self.target - self.eye;
        Vec3::new(d.x, 0.0, d.z)
    }

    /// Translate eye and target along the view direction, scaled by the
    /// eye-target distance. Negative amounts move backwards.
    pub fn move_forward(&mut self, amount: f32) {
        let step = self.planar() * amount;
        self.eye += step;
        self.target += step;
    }

    /// Translate sideways; positive amounts move right.
    pub fn strafe(&mut self, amount: f32) {
        let d = self.planar();
        let step = Vec3::new(-d.z, 0.0, d.x) * amount;
        self.eye += step;
        self.target += step;
    }

    /// Swing the target around the eye about the Y axis. Positive angles
    /// turn right.
    pub fn rotate(&mut self, angle: f32) {
        let x = self.target.x - self.eye.x;
        let z = self.target.z - self.eye.z;
        let (sin, cos) = angle.sin_cos();
        self.target.x = self.eye.x + cos * x - sin * z;
        self.target.z = self.eye.z + sin * x + cos * z;
    }

    /// Apply relative mouse motion.
    pub fn look(&mut self, dx: f32, dy: f32) {
        let yaw = -dx / LOOK_SCALE;
        let pitch = -dy / LOOK_SCALE;
        self.target.y = (self.target.y + pitch * 2.0)
            .clamp(self.eye.y - PITCH_LIMIT, self.eye.y + PITCH_LIMIT);
        self.rotate(-yaw);
    }

    /// Widen (positive) or narrow (negative) the field of view.
    pub fn zoom(&mut self, degrees: f32) {
        self.fov = (self.fov + degrees).clamp(MIN_FOV, MAX_FOV);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect, self.near, self.far)
    }
}

/// Per-second rates for frame-rate independent camera control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    /// Fraction of the eye-target distance travelled per second.
    pub move_speed: f32,
    /// Degrees of field of view per second while a zoom button is held.
    pub zoom_rate: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            move_speed: 0.6,
            zoom_rate: 15.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn default_camera() {
        let cam = Camera::default();
        assert_eq!(cam.forward(), Vec3::NEG_Z);
        let vp = cam.projection_matrix(800.0 / 600.0) * cam.view_matrix();
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn forward_then_back_restores_position() {
        let mut cam = Camera::default();
        cam.rotate(0.7);
        let start = cam;
        cam.move_forward(0.05);
        assert!(cam.eye.z < start.eye.z);
        cam.move_forward(-0.05);
        assert!(cam.eye.distance(start.eye) < EPS);
        assert!(cam.target.distance(start.target) < EPS);
    }

    #[test]
    fn moving_keeps_height() {
        let mut cam = Camera::default();
        cam.look(0.0, -300.0);
        let height = cam.eye.y;
        cam.move_forward(0.1);
        cam.strafe(0.1);
        assert_eq!(cam.eye.y, height);
    }

    #[test]
    fn strafe_is_orthogonal_to_view() {
        let mut cam = Camera::default();
        cam.rotate(0.3);
        let before = cam.eye;
        cam.strafe(0.1);
        let step = cam.eye - before;
        assert!(step.dot(cam.forward()).abs() < EPS);
        // positive strafe goes to the right of the view direction
        assert!(cam.forward().cross(step).y < 0.0);
    }

    #[test]
    fn rotate_preserves_distance() {
        let mut cam = Camera::default();
        let distance = cam.eye.distance(cam.target);
        for _ in 0..10 {
            cam.rotate(0.37);
        }
        assert!((cam.eye.distance(cam.target) - distance).abs() < EPS);
    }

    #[test]
    fn look_right_turns_right() {
        let mut cam = Camera::default();
        cam.look(100.0, 0.0);
        assert!(cam.target.x > 0.0);
    }

    #[test]
    fn look_clamps_target_height() {
        let mut cam = Camera::default();
        cam.look(0.0, -100_000.0);
        assert_eq!(cam.target.y, cam.eye.y + PITCH_LIMIT);
        cam.look(0.0, 100_000.0);
        assert_eq!(cam.target.y, cam.eye.y - PITCH_LIMIT);
    }

    #[test]
    fn zoom_stays_in_bounds() {
        let mut cam = Camera::default();
        cam.zoom(500.0);
        assert_eq!(cam.fov, MAX_FOV);
        cam.zoom(-500.0);
        assert_eq!(cam.fov, MIN_FOV);
    }
}
