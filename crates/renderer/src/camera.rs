use std::f32::consts::FRAC_PI_2;

use crate::input::InputTick;

/// Step and speed constants applied to input each tick.
///
/// Movement is per tick, not per second: a faster frame rate moves the
/// camera faster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTuning {
    /// Distance moved per tick while a movement key is held.
    pub move_step: f32,
    /// Radians of yaw/pitch per pixel of pointer drag.
    pub look_speed: f32,
    /// Radians of field of view per scroll line.
    pub zoom_speed: f32,
    /// Lower bound on field of view in radians.
    pub fov_min: f32,
    /// Upper bound on field of view in radians.
    pub fov_max: f32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            move_step: 0.1,
            look_speed: 0.005,
            zoom_speed: 0.05,
            fov_min: 0.1,
            fov_max: 3.0,
        }
    }
}

impl CameraTuning {
    /// Field-of-view bounds in ascending order; `None` when either is NaN.
    pub fn fov_range(&self) -> Option<(f32, f32)> {
        if self.fov_min.is_nan() || self.fov_max.is_nan() {
            return None;
        }
        Some((self.fov_min.min(self.fov_max), self.fov_min.max(self.fov_max)))
    }
}

/// Navigation state pushed to the compute kernel every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Field of view in radians.
    pub fov: f32,
    pub yaw: f32,
    /// Always within `[-π/2, π/2]`.
    pub pitch: f32,
    pub position: [f32; 3],
}

/// Camera values in the shape the kernel's uniform block expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraParams {
    pub position: [f32; 3],
    pub fov: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl Camera {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            viewport_width,
            viewport_height,
            fov: FRAC_PI_2,
            yaw: 0.0,
            pitch: 0.0,
            position: [0.0; 3],
        }
    }

    pub fn with_position(mut self, position: [f32; 3]) -> Self {
        self.position = position;
        self
    }

    pub fn with_fov(mut self, fov: f32) -> Self {
        self.fov = fov;
        self
    }

    pub fn params(&self) -> CameraParams {
        CameraParams {
            position: self.position,
            fov: self.fov,
            yaw: self.yaw,
            pitch: self.pitch,
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport_width = width;
        self.viewport_height = height;
    }

    /// Horizontal unit vector the camera walks along.
    pub fn forward(&self) -> [f32; 2] {
        let x = -(-self.pitch).cos() * (-self.yaw).cos();
        let y = -(-self.pitch).cos() * (-self.yaw).sin();
        let length = (x * x + y * y).sqrt();
        if length > 1e-6 {
            [x / length, y / length]
        } else {
            // Looking straight up or down: fall back to the yaw heading.
            [-(-self.yaw).cos(), -(-self.yaw).sin()]
        }
    }

    /// Forward rotated by -90° in the horizontal plane.
    pub fn side(&self) -> [f32; 2] {
        let [x, y] = self.forward();
        [y, -x]
    }

    /// Applies one tick of input: movement, then look, then zoom.
    pub fn apply(&mut self, tick: &InputTick, tuning: &CameraTuning) {
        let forward = self.forward();
        let side = self.side();
        let advance = f32::from(tick.forward_axis) * tuning.move_step;
        let strafe = f32::from(tick.strafe_axis) * tuning.move_step;
        self.position[0] += forward[0] * advance + side[0] * strafe;
        self.position[1] += forward[1] * advance + side[1] * strafe;

        self.look(tick.pointer_delta, tuning.look_speed);
        self.zoom(tick.scroll, tuning);
    }

    pub fn look(&mut self, delta: [f32; 2], look_speed: f32) {
        self.yaw += delta[0] * look_speed;
        self.pitch = (self.pitch + delta[1] * look_speed).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    pub fn zoom(&mut self, scroll: f32, tuning: &CameraTuning) {
        let fov = self.fov + scroll * tuning.zoom_speed;
        self.fov = match tuning.fov_range() {
            Some((low, high)) => fov.clamp(low, high),
            None => fov,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn forward_tick_moves_against_view_axis() {
        let mut camera = Camera::new(800, 600);
        let tick = InputTick {
            forward_axis: 1,
            ..InputTick::default()
        };
        camera.apply(&tick, &CameraTuning::default());

        assert!(approx(camera.position[0], -0.1));
        assert!(approx(camera.position[1], 0.0));
        assert!(approx(camera.position[2], 0.0));
        assert_eq!(camera.yaw, 0.0);
        assert_eq!(camera.pitch, 0.0);
    }

    #[test]
    fn backward_and_strafe_combine() {
        let mut camera = Camera::new(800, 600);
        let tick = InputTick {
            forward_axis: -1,
            strafe_axis: 1,
            ..InputTick::default()
        };
        camera.apply(&tick, &CameraTuning::default());

        // forward = (-1, 0), side = (0, 1)
        assert!(approx(camera.position[0], 0.1));
        assert!(approx(camera.position[1], 0.1));
    }

    #[test]
    fn yaw_rotates_movement_direction() {
        let mut camera = Camera::new(800, 600);
        camera.yaw = FRAC_PI_2;
        let [x, y] = camera.forward();
        assert!(approx(x, 0.0));
        assert!(approx(y, 1.0));
    }

    #[test]
    fn pitch_never_exceeds_quarter_turn() {
        let mut camera = Camera::new(800, 600);
        let tuning = CameraTuning::default();
        let mut previous = camera.pitch;
        for _ in 0..1_000 {
            camera.look([0.0, 37.0], tuning.look_speed);
            assert!(camera.pitch.abs() <= FRAC_PI_2);
            assert!(camera.pitch >= previous);
            previous = camera.pitch;
        }
        assert_eq!(camera.pitch, FRAC_PI_2);

        for _ in 0..1_000 {
            camera.look([5.0, -91.0], tuning.look_speed);
            assert!(camera.pitch.abs() <= FRAC_PI_2);
        }
        assert_eq!(camera.pitch, -FRAC_PI_2);
    }

    #[test]
    fn movement_at_vertical_pitch_uses_yaw_heading() {
        let mut camera = Camera::new(800, 600);
        camera.pitch = FRAC_PI_2;
        let tick = InputTick {
            forward_axis: 1,
            ..InputTick::default()
        };
        camera.apply(&tick, &CameraTuning::default());
        assert!(approx(camera.position[0], -0.1));
        assert!(camera.position.iter().all(|value| value.is_finite()));
    }

    #[test]
    fn scroll_zoom_is_clamped() {
        let mut camera = Camera::new(800, 600);
        let tuning = CameraTuning::default();
        camera.zoom(2.0, &tuning);
        assert!(approx(camera.fov, FRAC_PI_2 + 0.1));

        camera.zoom(1_000.0, &tuning);
        assert_eq!(camera.fov, tuning.fov_max);
        camera.zoom(-1_000.0, &tuning);
        assert_eq!(camera.fov, tuning.fov_min);
    }

    #[test]
    fn inverted_or_nan_fov_bounds_do_not_panic() {
        let mut camera = Camera::new(800, 600);
        let inverted = CameraTuning {
            fov_min: 2.0,
            fov_max: 1.0,
            ..CameraTuning::default()
        };
        camera.zoom(10.0, &inverted);
        assert_eq!(camera.fov, 2.0);
        camera.zoom(-10.0, &inverted);
        assert_eq!(camera.fov, 1.0);

        let unbounded = CameraTuning {
            fov_max: f32::NAN,
            ..CameraTuning::default()
        };
        camera.zoom(1.0, &unbounded);
        assert!(approx(camera.fov, 1.05));
    }

    #[test]
    fn params_mirror_state() {
        let camera = Camera::new(640, 480).with_position([1.0, 2.0, 3.0]);
        let params = camera.params();
        assert_eq!(params.position, [1.0, 2.0, 3.0]);
        assert_eq!(params.fov, FRAC_PI_2);
    }
}
