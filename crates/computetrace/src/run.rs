use std::process::ExitCode;

use renderer::{
    BuildError, CameraTuning, GpuPowerPreference, ProgramBuilder, ProgramKind, RendererConfig,
    SceneKind, ShaderPaths, StageKind, StartupError, StaticTriangle, Viewport,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use traceconfig::{ConfigError, PowerSetting, TraceConfig};

use crate::cli::{parse_surface_size, Args};
use crate::paths::{self, ConfigSource};

/// Everything that can stop the program, each with its own exit status.
#[derive(Debug, Error)]
enum RunError {
    #[error("{}", describe_build(ProgramKind::Compute, .0))]
    ComputeBuild(#[source] BuildError),
    #[error("{}", describe_build(ProgramKind::Render, .0))]
    RenderBuild(#[source] BuildError),
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid --size: {0}")]
    Size(String),
}

impl RunError {
    fn exit_code(&self) -> u8 {
        match self {
            RunError::Startup(StartupError::ContextInit(_)) => 2,
            RunError::Startup(_) => 1,
            RunError::ComputeBuild(_) => 3,
            RunError::RenderBuild(_) => 4,
            RunError::Config(_) | RunError::Size(_) => 5,
        }
    }
}

fn stage_title(stage: StageKind) -> &'static str {
    match stage {
        StageKind::Compute => "Compute",
        StageKind::Vertex => "Vertex",
        StageKind::Fragment => "Fragment",
    }
}

fn describe_build(kind: ProgramKind, err: &BuildError) -> String {
    let program = match kind {
        ProgramKind::Compute => "Compute",
        ProgramKind::Render => "Render",
    };
    match err {
        BuildError::ResourceNotFound { stage, path, .. } => format!(
            "{} shader file not found: {}",
            stage_title(*stage),
            path.display()
        ),
        BuildError::ResourceRead {
            stage,
            path,
            source,
        } => format!(
            "Failed to read {stage} shader file {}: {source}",
            path.display()
        ),
        BuildError::Compile { diagnostics } => {
            format!("{program} program compilation error:\n{diagnostics}")
        }
        BuildError::Link { diagnostics } => {
            format!("{program} program link error:\n{diagnostics}")
        }
    }
}

pub fn run(args: Args) -> ExitCode {
    initialise_tracing(args.log_filter.as_deref());

    match try_run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            tracing::debug!(code = err.exit_code(), "exiting after failure");
            ExitCode::from(err.exit_code())
        }
    }
}

fn initialise_tracing(directive: Option<&str>) {
    let filter = match directive {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn try_run(args: &Args) -> Result<(), RunError> {
    let source = paths::discover_config(args.config.as_deref());
    let mut config = match source.path() {
        Some(path) => {
            info!(path = %path.display(), origin = ?source, "loading configuration");
            TraceConfig::from_path(path)?
        }
        None => TraceConfig::default(),
    };
    if matches!(source, ConfigSource::Defaults) {
        info!("no configuration file found; using defaults");
    }

    apply_overrides(&mut config, args)?;
    config.validate()?;

    let renderer_config = renderer_config(&config);
    let primitives = match renderer_config.scene {
        SceneKind::Mesh => renderer::reference_cube(),
        SceneKind::Triangle(_) => renderer::PrimitiveSet::new(),
    };

    let shaders = shader_paths(&config);
    let mut builder = ProgramBuilder::new();
    let compute = builder
        .build_compute(&shaders.compute)
        .map_err(RunError::ComputeBuild)?;
    info!(
        path = %shaders.compute.display(),
        handle = compute.handle().get(),
        "compute program linked"
    );

    let render = builder
        .build_render(&shaders.vertex, &shaders.fragment)
        .map_err(RunError::RenderBuild)?;
    info!(
        vertex = %shaders.vertex.display(),
        fragment = %shaders.fragment.display(),
        handle = render.handle().get(),
        "render program linked"
    );

    renderer::run(&renderer_config, &compute, &render, &primitives)?;
    Ok(())
}

fn apply_overrides(config: &mut TraceConfig, args: &Args) -> Result<(), RunError> {
    if let Some(spec) = args.size.as_deref() {
        let (width, height) = parse_surface_size(spec).map_err(RunError::Size)?;
        config.window.width = width;
        config.window.height = height;
    }
    if let Some(path) = &args.compute {
        config.shaders.compute = Some(path.clone());
    }
    if let Some(path) = &args.vertex {
        config.shaders.vertex = path.clone();
    }
    if let Some(path) = &args.fragment {
        config.shaders.fragment = path.clone();
    }
    if args.triangle {
        config.scene.kind = traceconfig::SceneKind::Triangle;
    }
    Ok(())
}

fn shader_paths(config: &TraceConfig) -> ShaderPaths {
    ShaderPaths {
        compute: config.compute_shader(),
        vertex: config.shaders.vertex.clone(),
        fragment: config.shaders.fragment.clone(),
    }
}

fn renderer_config(config: &TraceConfig) -> RendererConfig {
    let camera = &config.camera;
    let scene = match config.scene.kind {
        traceconfig::SceneKind::Mesh => SceneKind::Mesh,
        traceconfig::SceneKind::Triangle => SceneKind::Triangle(StaticTriangle {
            camera_direction: config.scene.camera_direction,
            points: config.scene.points,
        }),
    };

    RendererConfig {
        surface_size: Viewport::new(config.window.width, config.window.height),
        title: config.window.title.clone(),
        vsync: config.window.vsync,
        power: match config.gpu.power {
            PowerSetting::Low => GpuPowerPreference::Low,
            PowerSetting::High => GpuPowerPreference::High,
        },
        camera_tuning: CameraTuning {
            move_step: camera.move_step,
            look_speed: camera.look_speed,
            zoom_speed: camera.zoom_speed,
            fov_min: camera.fov_min,
            fov_max: camera.fov_max,
        },
        initial_fov: camera.fov,
        initial_position: camera.position,
        scene,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn exit_codes_follow_failure_kind() {
        let missing = || BuildError::ResourceNotFound {
            stage: StageKind::Compute,
            path: PathBuf::from("k.glsl"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(RunError::ComputeBuild(missing()).exit_code(), 3);
        assert_eq!(RunError::RenderBuild(missing()).exit_code(), 4);
        assert_eq!(
            RunError::Startup(StartupError::WindowCreation("no display".into())).exit_code(),
            1
        );
        assert_eq!(
            RunError::Startup(StartupError::ContextInit(anyhow::anyhow!("no adapter")))
                .exit_code(),
            2
        );
        assert_eq!(
            RunError::Config(ConfigError::Invalid("bad".into())).exit_code(),
            5
        );
    }

    #[test]
    fn messages_name_the_failing_stage() {
        let err = RunError::RenderBuild(BuildError::ResourceNotFound {
            stage: StageKind::Fragment,
            path: PathBuf::from("f.glsl"),
            source: io::Error::from(io::ErrorKind::NotFound),
        });
        assert_eq!(err.to_string(), "Fragment shader file not found: f.glsl");

        let err = RunError::ComputeBuild(BuildError::Compile {
            diagnostics: "compute stage (k.glsl):\n  1:1: oops\n".into(),
        });
        assert!(err
            .to_string()
            .starts_with("Compute program compilation error:\n"));
    }

    #[test]
    fn overrides_apply_to_config() {
        let mut config = TraceConfig::default();
        let args = Args {
            size: Some("320x240".into()),
            triangle: true,
            ..Args::default()
        };
        apply_overrides(&mut config, &args).unwrap();
        assert_eq!(config.window.width, 320);
        assert_eq!(config.compute_shader(), PathBuf::from("shaders/triangle.glsl"));

        let converted = renderer_config(&config);
        assert_eq!(converted.surface_size, Viewport::new(320, 240));
        assert!(matches!(converted.scene, SceneKind::Triangle(_)));
    }

    #[test]
    fn defaults_match_renderer_defaults() {
        let config = TraceConfig::default();
        config.validate().unwrap();
        assert_eq!(shader_paths(&config), ShaderPaths::default());

        let converted = renderer_config(&config);
        let expected = RendererConfig::default();
        assert_eq!(converted.surface_size, expected.surface_size);
        assert_eq!(converted.title, expected.title);
        assert_eq!(converted.camera_tuning, expected.camera_tuning);
        assert_eq!(converted.initial_fov, expected.initial_fov);
        assert_eq!(converted.scene, expected.scene);
    }
}
