//! GPU compute ray tracer with a full-screen raster present pass.
//!
//! Every frame a compute kernel writes one pixel per work group into a
//! floating-point frame target; a barrier makes those writes visible; a
//! full-screen quad then samples the target onto the window surface:
//!
//! ```text
//!   computetrace CLI
//!          │ RendererConfig + shader paths
//!          ▼
//!   ProgramBuilder ──▶ Program (compute), Program (render)
//!          │
//!          ▼
//!   run() ──▶ winit event loop ──▶ InputQueue ──▶ FrameOrchestrator::tick
//!                                                     │ FramePlan
//!                                                     ▼
//!                                   GpuState: dispatch ─▶ barrier ─▶ draw quad
//! ```
//!
//! Programs are compiled and linked on the CPU with naga before any window
//! exists, so build failures surface without a display. `run` owns the window
//! and the GPU context; everything upstream of it is plain data and testable
//! without a device.

mod camera;
mod compile;
mod error;
mod frame;
mod geometry;
mod gpu;
mod input;
mod program;
mod source;
mod types;
mod window;

pub use camera::{Camera, CameraParams, CameraTuning};
pub use compile::ProgramBuilder;
pub use error::{BuildError, StartupError};
pub use frame::{
    DispatchDomain, FrameBackend, FrameCommand, FrameError, FrameOrchestrator, FrameOutcome,
    FramePlan,
};
pub use geometry::{reference_cube, Point, PrimitiveBuffer, PrimitiveSet, GEOMETRY_SLOTS};
pub use input::{InputEvent, InputQueue, InputTick, NavKey};
pub use program::{BuildState, LinkedStage, Program, ProgramHandle, ProgramKind, StageKind};
pub use source::{load_source, ShaderSource};
pub use types::{
    GpuPowerPreference, RendererConfig, SceneKind, ShaderPaths, StaticTriangle, Viewport,
};

/// Opens the window and renders until the user closes it.
///
/// `compute` must be a linked compute program and `render` a linked
/// vertex/fragment program. Returns once the loop ends; failures to create
/// the window or the GPU context are reported before the first frame.
pub fn run(
    config: &RendererConfig,
    compute: &Program,
    render: &Program,
    primitives: &PrimitiveSet,
) -> Result<(), StartupError> {
    window::run_window(config, compute, render, primitives)
}
