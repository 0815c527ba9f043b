use std::path::PathBuf;

use crate::camera::CameraTuning;

/// Size of the drawable area in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Both sides are at most `max_dimension`.
    pub fn fits_within(self, max_dimension: u32) -> bool {
        self.width <= max_dimension && self.height <= max_dimension
    }
}

/// Paths of the three GLSL stages the renderer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderPaths {
    pub compute: PathBuf,
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl Default for ShaderPaths {
    fn default() -> Self {
        Self {
            compute: PathBuf::from("shaders/pathtrace.glsl"),
            vertex: PathBuf::from("shaders/vertex.glsl"),
            fragment: PathBuf::from("shaders/fragment.glsl"),
        }
    }
}

/// Which scene the compute kernel is fed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneKind {
    /// Triangles assembled from the structured point buffers.
    Mesh,
    /// A single static triangle passed through one-time uniforms.
    Triangle(StaticTriangle),
}

impl Default for SceneKind {
    fn default() -> Self {
        Self::Mesh
    }
}

/// One-time uniforms of the minimal fixed-geometry kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticTriangle {
    pub camera_direction: [f32; 3],
    pub points: [[f32; 3]; 3],
}

impl Default for StaticTriangle {
    fn default() -> Self {
        Self {
            camera_direction: [-1.0, 0.0, 0.0],
            points: [[-2.0, -0.5, -0.5], [-2.0, 0.5, -0.5], [-2.0, 0.0, 0.5]],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    Low,
    #[default]
    High,
}

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub surface_size: Viewport,
    pub title: String,
    pub vsync: bool,
    pub power: GpuPowerPreference,
    pub camera_tuning: CameraTuning,
    /// Starting field of view in radians.
    pub initial_fov: f32,
    pub initial_position: [f32; 3],
    pub scene: SceneKind,
}

impl Default for RendererConfig {
    /// 800x600 window titled "Ray Tracer" rendering the mesh scene.
    fn default() -> Self {
        Self {
            surface_size: Viewport::new(800, 600),
            title: "Ray Tracer".to_string(),
            vsync: true,
            power: GpuPowerPreference::default(),
            camera_tuning: CameraTuning::default(),
            initial_fov: std::f32::consts::FRAC_PI_2,
            initial_position: [0.0; 3],
            scene: SceneKind::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_limits_apply_to_both_sides() {
        assert!(Viewport::new(8192, 8192).fits_within(8192));
        assert!(!Viewport::new(8193, 600).fits_within(8192));
        assert!(!Viewport::new(800, 8193).fits_within(8192));
        assert!(Viewport::new(0, 0).is_empty());
    }
}
