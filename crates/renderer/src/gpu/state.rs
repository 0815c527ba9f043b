use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, trace, warn};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::camera::CameraParams;
use crate::frame::{DispatchDomain, FrameBackend, FrameCommand, FrameError, FramePlan};
use crate::geometry::PrimitiveSet;
use crate::program::Program;
use crate::types::{RendererConfig, Viewport};

use super::context::GpuContext;
use super::pipeline::{ComputePipeline, RasterPipeline, QUAD_VERTEX_COUNT};
use super::storage::StorageBuffers;
use super::target::FrameTarget;
use super::uniforms::{CameraUniforms, SceneUniforms};

/// Pass currently open on the frame's encoder.
enum OpenPass {
    None,
    Compute(wgpu::ComputePass<'static>),
    Render(wgpu::RenderPass<'static>),
}

/// Every GPU resource the frame loop touches.
pub(crate) struct GpuState {
    context: GpuContext,
    target: FrameTarget,
    storage: StorageBuffers,
    camera_buffer: wgpu::Buffer,
    scene_buffer: wgpu::Buffer,
    compute: ComputePipeline,
    raster: RasterPipeline,
    compute_bind_group: wgpu::BindGroup,
    raster_bind_group: wgpu::BindGroup,
    /// Largest side the surface, target and dispatch can all take.
    max_extent: u32,
}

impl GpuState {
    pub(crate) fn new(
        window: Arc<Window>,
        viewport: Viewport,
        config: &RendererConfig,
        initial_camera: CameraParams,
        compute_program: &Program,
        render_program: &Program,
        primitives: &PrimitiveSet,
    ) -> Result<Self> {
        let context = GpuContext::new(window, viewport, config.power, config.vsync)?;
        let device = &context.device;
        let limits = device.limits();
        let max_extent = limits
            .max_texture_dimension_2d
            .min(limits.max_compute_workgroups_per_dimension);

        let compute = ComputePipeline::new(device, compute_program)?;
        let raster = RasterPipeline::new(device, render_program, context.surface_format)?;
        debug!(
            compute = compute_program.handle().get(),
            render = render_program.handle().get(),
            "realised programs on device"
        );

        let storage = StorageBuffers::upload(device, primitives);
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera uniforms"),
            contents: bytemuck::bytes_of(&CameraUniforms::from(initial_camera)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let scene = SceneUniforms::new(config.scene, primitives.primitive_count());
        let scene_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scene uniforms"),
            contents: bytemuck::bytes_of(&scene),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        debug!(
            primitives = scene.primitive_count,
            "uploaded scene uniforms"
        );

        let target = FrameTarget::create(device, viewport);
        let compute_bind_group =
            compute.bind_group(device, &target, &storage, &camera_buffer, &scene_buffer)?;
        let raster_bind_group = raster.bind_group(device, &target);

        Ok(Self {
            context,
            target,
            storage,
            camera_buffer,
            scene_buffer,
            compute,
            raster,
            compute_bind_group,
            raster_bind_group,
            max_extent,
        })
    }

    fn acquire(&self) -> Result<wgpu::SurfaceTexture, FrameError> {
        match self.context.surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                Err(FrameError::SurfaceLost)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(FrameError::OutOfMemory),
            Err(other) => Err(FrameError::Skipped(other.to_string())),
        }
    }

    fn check_domain(&self, domain: DispatchDomain) -> Result<(), FrameError> {
        let viewport = self.target.viewport();
        if domain.z != 1 {
            return Err(FrameError::InvalidPlan(format!(
                "dispatch depth must be 1, got {}",
                domain.z
            )));
        }
        if domain.x > viewport.width || domain.y > viewport.height {
            return Err(FrameError::Skipped(format!(
                "dispatch {}x{} does not fit frame target {}x{}",
                domain.x, domain.y, viewport.width, viewport.height
            )));
        }
        Ok(())
    }
}

fn out_of_order(command: &FrameCommand) -> FrameError {
    FrameError::InvalidPlan(format!("{command:?} issued out of order"))
}

impl FrameBackend for GpuState {
    fn recreate_target(&mut self, viewport: Viewport) {
        if viewport.is_empty() {
            return;
        }
        if !viewport.fits_within(self.max_extent) {
            warn!(
                width = viewport.width,
                height = viewport.height,
                max = self.max_extent,
                "viewport exceeds device limits; keeping the current frame target"
            );
            return;
        }

        self.context.resize(viewport);
        let device = &self.context.device;
        self.target.recreate(device, viewport);
        match self.compute.bind_group(
            device,
            &self.target,
            &self.storage,
            &self.camera_buffer,
            &self.scene_buffer,
        ) {
            Ok(group) => self.compute_bind_group = group,
            Err(err) => warn!(error = %err, "failed to rebind compute resources"),
        }
        self.raster_bind_group = self.raster.bind_group(device, &self.target);
    }

    fn execute(&mut self, plan: &FramePlan) -> Result<(), FrameError> {
        if let Some(domain) = plan.dispatch_domain() {
            self.check_domain(domain)?;
        }
        let frame = match self.acquire() {
            Ok(frame) => frame,
            Err(FrameError::SurfaceLost) => {
                self.context.reconfigure();
                return Err(FrameError::SurfaceLost);
            }
            Err(err) => return Err(err),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame encoder"),
                });

        let mut pass = OpenPass::None;
        let mut storage_visible = false;
        let mut presented = false;

        for command in plan.commands() {
            match (command, &mut pass) {
                (FrameCommand::BindCompute, OpenPass::None) => {
                    let mut compute = encoder
                        .begin_compute_pass(&wgpu::ComputePassDescriptor {
                            label: Some("trace pass"),
                            timestamp_writes: None,
                        })
                        .forget_lifetime();
                    compute.set_pipeline(&self.compute.pipeline);
                    compute.set_bind_group(0, &self.compute_bind_group, &[]);
                    pass = OpenPass::Compute(compute);
                    storage_visible = false;
                }
                (FrameCommand::PushCamera(params), _) => {
                    // Queue writes land before the encoder's commands on submit.
                    self.context.queue.write_buffer(
                        &self.camera_buffer,
                        0,
                        bytemuck::bytes_of(&CameraUniforms::from(*params)),
                    );
                }
                (FrameCommand::Dispatch(domain), OpenPass::Compute(compute)) => {
                    self.check_domain(*domain)?;
                    compute.dispatch_workgroups(domain.x, domain.y, domain.z);
                }
                (FrameCommand::Barrier, OpenPass::Compute(_)) => {
                    // Ending the compute pass orders its storage writes before
                    // any later pass samples the target.
                    pass = OpenPass::None;
                    storage_visible = true;
                }
                (FrameCommand::Clear, OpenPass::None) if storage_visible => {
                    let render = encoder
                        .begin_render_pass(&wgpu::RenderPassDescriptor {
                            label: Some("present pass"),
                            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                view: &view,
                                depth_slice: None,
                                resolve_target: None,
                                ops: wgpu::Operations {
                                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                                    store: wgpu::StoreOp::Store,
                                },
                            })],
                            depth_stencil_attachment: None,
                            timestamp_writes: None,
                            occlusion_query_set: None,
                        })
                        .forget_lifetime();
                    pass = OpenPass::Render(render);
                }
                (FrameCommand::BindRaster, OpenPass::Render(render)) => {
                    render.set_pipeline(&self.raster.pipeline);
                    render.set_bind_group(0, &self.raster_bind_group, &[]);
                    render.set_vertex_buffer(0, self.raster.quad.slice(..));
                }
                (FrameCommand::DrawQuad, OpenPass::Render(render)) => {
                    render.draw(0..QUAD_VERTEX_COUNT, 0..1);
                }
                (FrameCommand::Present, OpenPass::Render(_)) => {
                    pass = OpenPass::None;
                    presented = true;
                    break;
                }
                (other, _) => return Err(out_of_order(other)),
            }
        }
        drop(pass);

        if !presented {
            return Err(FrameError::InvalidPlan(
                "frame plan never reached Present".to_string(),
            ));
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        trace!(viewport = ?self.target.viewport(), "submitted frame");
        Ok(())
    }
}
