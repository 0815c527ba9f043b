//! Device-side realisation of programs, geometry and frame plans.
//!
//! - `context` owns the wgpu instance, device and surface, and reconfigures
//!   the swapchain when the window resizes.
//! - `pipeline` turns linked programs into compute and raster pipelines with
//!   their bind group layouts.
//! - `storage` uploads the primitive buffers as read-only storage buffers.
//! - `target` is the float image the kernel writes and the quad samples.
//! - `uniforms` mirrors the kernel's uniform blocks.
//! - `state` glues everything together and executes a `FramePlan` command
//!   by command.

mod context;
mod pipeline;
mod state;
mod storage;
mod target;
mod uniforms;

pub(crate) use state::GpuState;
