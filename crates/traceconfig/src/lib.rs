//! TOML configuration for the compute ray tracer.
//!
//! Every section is optional; an empty document yields the compiled-in
//! defaults. [`TraceConfig::from_toml_str`] parses and validates in one go.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: u32 = 1;
pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;
pub const DEFAULT_TITLE: &str = "Ray Tracer";
pub const DEFAULT_COMPUTE_SHADER: &str = "shaders/pathtrace.glsl";
pub const DEFAULT_TRIANGLE_SHADER: &str = "shaders/triangle.glsl";
pub const DEFAULT_VERTEX_SHADER: &str = "shaders/vertex.glsl";
pub const DEFAULT_FRAGMENT_SHADER: &str = "shaders/fragment.glsl";

/// Largest window edge accepted from configuration.
const MAX_DIMENSION: u32 = 16_384;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TraceConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub window: WindowSection,
    #[serde(default)]
    pub shaders: ShaderSection,
    #[serde(default)]
    pub camera: CameraSection,
    #[serde(default)]
    pub scene: SceneSection,
    #[serde(default)]
    pub gpu: GpuSection,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            window: WindowSection::default(),
            shaders: ShaderSection::default(),
            camera: CameraSection::default(),
            scene: SceneSection::default(),
            gpu: GpuSection::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WindowSection {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_true")]
    pub vsync: bool,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            title: default_title(),
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ShaderSection {
    /// Compute kernel; defaults depend on the scene kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute: Option<PathBuf>,
    #[serde(default = "default_vertex_shader")]
    pub vertex: PathBuf,
    #[serde(default = "default_fragment_shader")]
    pub fragment: PathBuf,
}

impl Default for ShaderSection {
    fn default() -> Self {
        Self {
            compute: None,
            vertex: default_vertex_shader(),
            fragment: default_fragment_shader(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CameraSection {
    /// Starting field of view in radians.
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_move_step")]
    pub move_step: f32,
    #[serde(default = "default_look_speed")]
    pub look_speed: f32,
    #[serde(default = "default_zoom_speed")]
    pub zoom_speed: f32,
    #[serde(default = "default_fov_min")]
    pub fov_min: f32,
    #[serde(default = "default_fov_max")]
    pub fov_max: f32,
    #[serde(default)]
    pub position: [f32; 3],
}

impl Default for CameraSection {
    fn default() -> Self {
        Self {
            fov: default_fov(),
            move_step: default_move_step(),
            look_speed: default_look_speed(),
            zoom_speed: default_zoom_speed(),
            fov_min: default_fov_min(),
            fov_max: default_fov_max(),
            position: [0.0; 3],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneKind {
    #[default]
    Mesh,
    Triangle,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SceneSection {
    #[serde(default)]
    pub kind: SceneKind,
    /// Only read by the triangle kernel.
    #[serde(default = "default_camera_direction")]
    pub camera_direction: [f32; 3],
    #[serde(default = "default_triangle")]
    pub points: [[f32; 3]; 3],
}

impl Default for SceneSection {
    fn default() -> Self {
        Self {
            kind: SceneKind::default(),
            camera_direction: default_camera_direction(),
            points: default_triangle(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSetting {
    Low,
    #[default]
    High,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GpuSection {
    #[serde(default, deserialize_with = "deserialize_power")]
    pub power: PowerSetting,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_vertex_shader() -> PathBuf {
    PathBuf::from(DEFAULT_VERTEX_SHADER)
}

fn default_fragment_shader() -> PathBuf {
    PathBuf::from(DEFAULT_FRAGMENT_SHADER)
}

fn default_fov() -> f32 {
    std::f32::consts::FRAC_PI_2
}

fn default_move_step() -> f32 {
    0.1
}

fn default_look_speed() -> f32 {
    0.005
}

fn default_zoom_speed() -> f32 {
    0.05
}

fn default_fov_min() -> f32 {
    0.1
}

fn default_fov_max() -> f32 {
    3.0
}

fn default_camera_direction() -> [f32; 3] {
    [-1.0, 0.0, 0.0]
}

fn default_triangle() -> [[f32; 3]; 3] {
    [[-2.0, -0.5, -0.5], [-2.0, 0.5, -0.5], [-2.0, 0.0, 0.5]]
}

fn deserialize_power<'de, D>(deserializer: D) -> Result<PowerSetting, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_power(&raw).map_err(de::Error::custom)
}

fn parse_power(raw: &str) -> Result<PowerSetting, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "low" | "low-power" | "integrated" => Ok(PowerSetting::Low),
        "high" | "high-performance" | "discrete" => Ok(PowerSetting::High),
        other => Err(format!("invalid gpu power setting '{other}'")),
    }
}

impl TraceConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: TraceConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Compute kernel to build: the configured path, or the bundled kernel
    /// matching the scene kind.
    pub fn compute_shader(&self) -> PathBuf {
        match (&self.shaders.compute, self.scene.kind) {
            (Some(path), _) => path.clone(),
            (None, SceneKind::Mesh) => PathBuf::from(DEFAULT_COMPUTE_SHADER),
            (None, SceneKind::Triangle) => PathBuf::from(DEFAULT_TRIANGLE_SHADER),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected {CONFIG_VERSION}",
                self.version
            )));
        }

        let window = &self.window;
        for (name, value) in [("width", window.width), ("height", window.height)] {
            if value == 0 || value > MAX_DIMENSION {
                return Err(ConfigError::Invalid(format!(
                    "window.{name} must be between 1 and {MAX_DIMENSION}, got {value}"
                )));
            }
        }

        let shaders = [
            ("compute", self.shaders.compute.as_deref()),
            ("vertex", Some(self.shaders.vertex.as_path())),
            ("fragment", Some(self.shaders.fragment.as_path())),
        ];
        for (name, path) in shaders {
            if path.is_some_and(|path| path.as_os_str().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "shaders.{name} may not be empty"
                )));
            }
        }

        self.camera.validate()?;
        if self.scene.kind == SceneKind::Triangle {
            self.scene.validate()?;
        }

        Ok(())
    }
}

impl CameraSection {
    fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("fov", self.fov),
            ("move_step", self.move_step),
            ("look_speed", self.look_speed),
            ("zoom_speed", self.zoom_speed),
            ("fov_min", self.fov_min),
            ("fov_max", self.fov_max),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "camera.{name} must be a finite number"
                )));
            }
        }
        if self.position.iter().any(|value| !value.is_finite()) {
            return Err(ConfigError::Invalid(
                "camera.position must be finite".into(),
            ));
        }

        if self.move_step < 0.0 {
            return Err(ConfigError::Invalid("camera.move_step must be >= 0".into()));
        }
        if self.fov_min <= 0.0 || self.fov_min >= self.fov_max {
            return Err(ConfigError::Invalid(format!(
                "camera.fov_min ({}) must be positive and below camera.fov_max ({})",
                self.fov_min, self.fov_max
            )));
        }
        if self.fov_max >= std::f32::consts::PI {
            return Err(ConfigError::Invalid(
                "camera.fov_max must be below pi radians".into(),
            ));
        }
        if self.fov < self.fov_min || self.fov > self.fov_max {
            return Err(ConfigError::Invalid(format!(
                "camera.fov {} lies outside [{}, {}]",
                self.fov, self.fov_min, self.fov_max
            )));
        }
        Ok(())
    }
}

impl SceneSection {
    fn validate(&self) -> Result<(), ConfigError> {
        let [dx, dy, dz] = self.camera_direction;
        if dx * dx + dy * dy + dz * dz <= f32::EPSILON {
            return Err(ConfigError::Invalid(
                "scene.camera_direction must not be the zero vector".into(),
            ));
        }

        let [a, b, c] = self.points;
        let ab = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let ac = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        let normal = [
            ab[1] * ac[2] - ab[2] * ac[1],
            ab[2] * ac[0] - ab[0] * ac[2],
            ab[0] * ac[1] - ab[1] * ac[0],
        ];
        let area = normal.iter().map(|v| v * v).sum::<f32>();
        if area <= f32::EPSILON {
            return Err(ConfigError::Invalid(
                "scene.points describe a degenerate triangle".into(),
            ));
        }
        Ok(())
    }
}
