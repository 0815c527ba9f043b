//! Per-frame sequencing.
//!
//! The orchestrator owns the camera and the notion of the current viewport,
//! turns one tick of input into a [`FramePlan`], and hands the plan to a
//! [`FrameBackend`]. The plan order is fixed:
//!
//! ```text
//!   BindCompute ─▶ PushCamera ─▶ Dispatch(w,h,1) ─▶ Barrier
//!        ─▶ Clear ─▶ BindRaster ─▶ DrawQuad ─▶ Present
//! ```

use thiserror::Error;

use crate::camera::{Camera, CameraParams, CameraTuning};
use crate::input::InputTick;
use crate::types::Viewport;

/// Work-group counts of a compute dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchDomain {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl From<Viewport> for DispatchDomain {
    /// One work group per output pixel.
    fn from(viewport: Viewport) -> Self {
        Self {
            x: viewport.width,
            y: viewport.height,
            z: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameCommand {
    BindCompute,
    PushCamera(CameraParams),
    Dispatch(DispatchDomain),
    /// Makes every image write of the dispatch visible to later sampling.
    Barrier,
    Clear,
    BindRaster,
    /// Four-vertex triangle strip covering the viewport.
    DrawQuad,
    Present,
}

/// Ordered commands for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    commands: Vec<FrameCommand>,
}

impl FramePlan {
    pub fn new(camera: CameraParams, viewport: Viewport) -> Self {
        Self {
            commands: vec![
                FrameCommand::BindCompute,
                FrameCommand::PushCamera(camera),
                FrameCommand::Dispatch(DispatchDomain::from(viewport)),
                FrameCommand::Barrier,
                FrameCommand::Clear,
                FrameCommand::BindRaster,
                FrameCommand::DrawQuad,
                FrameCommand::Present,
            ],
        }
    }

    pub fn commands(&self) -> &[FrameCommand] {
        &self.commands
    }

    pub fn dispatch_domain(&self) -> Option<DispatchDomain> {
        self.commands.iter().find_map(|command| match command {
            FrameCommand::Dispatch(domain) => Some(*domain),
            _ => None,
        })
    }
}

/// Failures a backend can report while executing a frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The presentation surface must be reconfigured; the frame is dropped.
    #[error("presentation surface lost or outdated")]
    SurfaceLost,
    /// The frame could not be produced this time; try again next tick.
    #[error("frame skipped: {0}")]
    Skipped(String),
    #[error("GPU out of memory")]
    OutOfMemory,
    #[error("invalid frame plan: {0}")]
    InvalidPlan(String),
}

/// Seam between frame sequencing and the GPU.
pub trait FrameBackend {
    /// Discards the frame target and allocates one matching `viewport`.
    fn recreate_target(&mut self, viewport: Viewport);

    /// Records and submits every command of `plan`, in order.
    fn execute(&mut self, plan: &FramePlan) -> Result<(), FrameError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// A frame was executed with this plan.
    Rendered(FramePlan),
    /// Nothing drawn (zero-sized viewport or a recoverable backend error).
    Skipped,
    /// A close was requested; the loop should stop.
    Exit,
}

/// Drives the single per-frame sequence.
#[derive(Debug)]
pub struct FrameOrchestrator {
    camera: Camera,
    tuning: CameraTuning,
    viewport: Viewport,
    frames: u64,
}

impl FrameOrchestrator {
    pub fn new(camera: Camera, tuning: CameraTuning) -> Self {
        let viewport = Viewport::new(camera.viewport_width, camera.viewport_height);
        Self {
            camera,
            tuning,
            viewport,
            frames: 0,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Size the frame target currently has.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Runs one iteration: close check, resize, camera update, frame.
    pub fn tick<B: FrameBackend>(
        &mut self,
        input: &InputTick,
        backend: &mut B,
    ) -> Result<FrameOutcome, FrameError> {
        if input.close {
            tracing::debug!(frames = self.frames, "close requested");
            return Ok(FrameOutcome::Exit);
        }

        if let Some(size) = input.resize {
            self.resize(size, backend);
        }

        self.camera.apply(input, &self.tuning);

        if self.viewport.is_empty() {
            return Ok(FrameOutcome::Skipped);
        }

        let plan = FramePlan::new(self.camera.params(), self.viewport);
        match backend.execute(&plan) {
            Ok(()) => {
                self.frames += 1;
                tracing::trace!(frame = self.frames, ?self.viewport, "frame presented");
                Ok(FrameOutcome::Rendered(plan))
            }
            // The backend has already reconfigured the surface.
            Err(FrameError::SurfaceLost) => {
                tracing::debug!("surface lost; frame skipped");
                Ok(FrameOutcome::Skipped)
            }
            Err(FrameError::Skipped(reason)) => {
                tracing::warn!(%reason, "frame skipped");
                Ok(FrameOutcome::Skipped)
            }
            Err(err) => Err(err),
        }
    }

    fn resize<B: FrameBackend>(&mut self, size: Viewport, backend: &mut B) {
        if size.is_empty() {
            // Minimised: keep the last target and stop drawing until restored.
            self.viewport = size;
            return;
        }

        let previous = self.viewport;
        self.viewport = size;
        self.camera.set_viewport(size.width, size.height);
        if previous != size {
            tracing::debug!(
                from = ?previous,
                to = ?size,
                "viewport changed; recreating frame target"
            );
            backend.recreate_target(size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Recreate(Viewport),
        Execute(FramePlan),
    }

    #[derive(Default)]
    struct RecordingBackend {
        calls: Vec<Call>,
        fail_next: Option<FrameError>,
    }

    impl RecordingBackend {
        fn dispatches(&self) -> Vec<DispatchDomain> {
            self.calls
                .iter()
                .filter_map(|call| match call {
                    Call::Execute(plan) => plan.dispatch_domain(),
                    Call::Recreate(_) => None,
                })
                .collect()
        }
    }

    impl FrameBackend for RecordingBackend {
        fn recreate_target(&mut self, viewport: Viewport) {
            self.calls.push(Call::Recreate(viewport));
        }

        fn execute(&mut self, plan: &FramePlan) -> Result<(), FrameError> {
            if let Some(err) = self.fail_next.take() {
                return Err(err);
            }
            self.calls.push(Call::Execute(plan.clone()));
            Ok(())
        }
    }

    fn orchestrator(width: u32, height: u32) -> FrameOrchestrator {
        FrameOrchestrator::new(Camera::new(width, height), CameraTuning::default())
    }

    fn position(commands: &[FrameCommand], wanted: fn(&FrameCommand) -> bool) -> usize {
        commands.iter().position(wanted).unwrap()
    }

    #[test]
    fn barrier_sits_between_dispatch_and_draw_every_frame() {
        let mut frames = orchestrator(800, 600);
        let mut backend = RecordingBackend::default();

        for index in 0..5u32 {
            let input = InputTick {
                resize: (index == 2).then_some(Viewport::new(320, 240)),
                forward_axis: 1,
                ..InputTick::default()
            };
            frames.tick(&input, &mut backend).unwrap();
        }

        for call in &backend.calls {
            let Call::Execute(plan) = call else {
                continue;
            };
            let commands = plan.commands();
            let dispatch = position(commands, |c| matches!(c, FrameCommand::Dispatch(_)));
            let barrier = position(commands, |c| matches!(c, FrameCommand::Barrier));
            let draw = position(commands, |c| matches!(c, FrameCommand::DrawQuad));
            assert!(dispatch < barrier && barrier < draw);
            assert_eq!(commands.first(), Some(&FrameCommand::BindCompute));
            assert_eq!(commands.last(), Some(&FrameCommand::Present));
        }
        assert_eq!(frames.frames_rendered(), 5);
    }

    #[test]
    fn dispatch_follows_resized_target() {
        let mut frames = orchestrator(800, 600);
        let mut backend = RecordingBackend::default();

        frames.tick(&InputTick::default(), &mut backend).unwrap();
        let resize = InputTick {
            resize: Some(Viewport::new(1280, 720)),
            ..InputTick::default()
        };
        frames.tick(&resize, &mut backend).unwrap();
        frames.tick(&InputTick::default(), &mut backend).unwrap();

        assert_eq!(
            backend.dispatches(),
            vec![
                DispatchDomain { x: 800, y: 600, z: 1 },
                DispatchDomain { x: 1280, y: 720, z: 1 },
                DispatchDomain { x: 1280, y: 720, z: 1 },
            ]
        );
        assert_eq!(backend.calls[1], Call::Recreate(Viewport::new(1280, 720)));
        assert_eq!(frames.camera().viewport_width, 1280);
    }

    #[test]
    fn unchanged_size_does_not_recreate() {
        let mut frames = orchestrator(800, 600);
        let mut backend = RecordingBackend::default();
        let input = InputTick {
            resize: Some(Viewport::new(800, 600)),
            ..InputTick::default()
        };
        frames.tick(&input, &mut backend).unwrap();
        assert!(!backend
            .calls
            .iter()
            .any(|call| matches!(call, Call::Recreate(_))));
    }

    #[test]
    fn camera_update_precedes_dispatch() {
        let mut frames = orchestrator(800, 600);
        let mut backend = RecordingBackend::default();
        let input = InputTick {
            forward_axis: 1,
            ..InputTick::default()
        };
        let FrameOutcome::Rendered(plan) = frames.tick(&input, &mut backend).unwrap() else {
            panic!("expected a rendered frame");
        };

        let FrameCommand::PushCamera(params) = plan.commands()[1] else {
            panic!("second command must push the camera");
        };
        assert!((params.position[0] + 0.1).abs() < 1e-5);
    }

    #[test]
    fn close_stops_without_rendering() {
        let mut frames = orchestrator(800, 600);
        let mut backend = RecordingBackend::default();
        let input = InputTick {
            close: true,
            ..InputTick::default()
        };
        assert_eq!(frames.tick(&input, &mut backend).unwrap(), FrameOutcome::Exit);
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn minimised_viewport_skips_until_restored() {
        let mut frames = orchestrator(800, 600);
        let mut backend = RecordingBackend::default();

        let minimise = InputTick {
            resize: Some(Viewport::new(0, 0)),
            ..InputTick::default()
        };
        assert_eq!(
            frames.tick(&minimise, &mut backend).unwrap(),
            FrameOutcome::Skipped
        );
        assert!(backend.calls.is_empty());

        let restore = InputTick {
            resize: Some(Viewport::new(800, 600)),
            ..InputTick::default()
        };
        frames.tick(&restore, &mut backend).unwrap();
        assert_eq!(backend.calls[0], Call::Recreate(Viewport::new(800, 600)));
        assert_eq!(
            backend.dispatches(),
            vec![DispatchDomain { x: 800, y: 600, z: 1 }]
        );
    }

    #[test]
    fn lost_surface_skips_without_recreating_target() {
        let mut frames = orchestrator(640, 480);
        let mut backend = RecordingBackend {
            fail_next: Some(FrameError::SurfaceLost),
            ..RecordingBackend::default()
        };

        let outcome = frames.tick(&InputTick::default(), &mut backend).unwrap();
        assert_eq!(outcome, FrameOutcome::Skipped);
        assert!(backend.calls.is_empty());
        assert_eq!(frames.frames_rendered(), 0);

        frames.tick(&InputTick::default(), &mut backend).unwrap();
        assert_eq!(frames.frames_rendered(), 1);
    }

    #[test]
    fn declined_resize_skips_frames_instead_of_failing() {
        let mut frames = orchestrator(640, 480);
        let mut backend = RecordingBackend {
            fail_next: Some(FrameError::Skipped(
                "dispatch 20000x480 does not fit frame target 640x480".into(),
            )),
            ..RecordingBackend::default()
        };
        let oversized = InputTick {
            resize: Some(Viewport::new(20_000, 480)),
            ..InputTick::default()
        };

        let outcome = frames.tick(&oversized, &mut backend).unwrap();
        assert_eq!(outcome, FrameOutcome::Skipped);
        assert_eq!(backend.calls, vec![Call::Recreate(Viewport::new(20_000, 480))]);

        let restore = InputTick {
            resize: Some(Viewport::new(640, 480)),
            ..InputTick::default()
        };
        frames.tick(&restore, &mut backend).unwrap();
        assert_eq!(
            backend.dispatches(),
            vec![DispatchDomain { x: 640, y: 480, z: 1 }]
        );
    }

    #[test]
    fn plan_reports_its_dispatch_domain() {
        let plan = FramePlan::new(Camera::new(32, 16).params(), Viewport::new(32, 16));
        assert_eq!(
            plan.dispatch_domain(),
            Some(DispatchDomain { x: 32, y: 16, z: 1 })
        );
    }

    #[test]
    fn out_of_memory_is_fatal() {
        let mut frames = orchestrator(640, 480);
        let mut backend = RecordingBackend {
            fail_next: Some(FrameError::OutOfMemory),
            ..RecordingBackend::default()
        };
        assert!(matches!(
            frames.tick(&InputTick::default(), &mut backend),
            Err(FrameError::OutOfMemory)
        ));
    }
}
