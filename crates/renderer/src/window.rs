use std::sync::Arc;

use tracing::{error, info, warn};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowBuilder};

use crate::camera::Camera;
use crate::error::StartupError;
use crate::frame::{FrameOrchestrator, FrameOutcome};
use crate::geometry::PrimitiveSet;
use crate::gpu::GpuState;
use crate::input::{InputEvent, InputQueue, NavKey};
use crate::program::Program;
use crate::types::{RendererConfig, Viewport};

/// Pixel-precise scroll (touchpads) is converted to lines at this rate.
const PIXELS_PER_SCROLL_LINE: f32 = 20.0;

/// Opens the window, realises both programs on the device and runs the frame
/// loop until a close is requested.
pub(crate) fn run_window(
    config: &RendererConfig,
    compute: &Program,
    render: &Program,
    primitives: &PrimitiveSet,
) -> Result<(), StartupError> {
    let event_loop = EventLoop::new().map_err(StartupError::window)?;
    let requested = config.surface_size;
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(PhysicalSize::new(requested.width, requested.height))
        .build(&event_loop)
        .map_err(StartupError::window)?;
    let window = Arc::new(window);

    let size = window.inner_size();
    let viewport = if size.width == 0 || size.height == 0 {
        requested
    } else {
        Viewport::new(size.width, size.height)
    };
    info!(
        width = viewport.width,
        height = viewport.height,
        title = %config.title,
        "window created"
    );

    let camera = Camera::new(viewport.width, viewport.height)
        .with_position(config.initial_position)
        .with_fov(config.initial_fov);
    let mut gpu = GpuState::new(
        window.clone(),
        viewport,
        config,
        camera.params(),
        compute,
        render,
        primitives,
    )
    .map_err(StartupError::ContextInit)?;
    info!("GPU context ready; entering frame loop");

    let mut frames = FrameOrchestrator::new(camera, config.camera_tuning);
    let mut input = InputQueue::new();
    let mut fatal = None;

    event_loop
        .run(|event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::RedrawRequested => {
                    let tick = input.drain_tick();
                    match frames.tick(&tick, &mut gpu) {
                        Ok(FrameOutcome::Exit) => elwt.exit(),
                        Ok(FrameOutcome::Rendered(_) | FrameOutcome::Skipped) => {
                            if tick.recenter_pointer && input.is_dragging() {
                                recenter_pointer(&window, &mut input, frames.viewport());
                            }
                        }
                        Err(err) => {
                            error!(error = %err, "frame failed; leaving the render loop");
                            fatal = Some(err);
                            elwt.exit();
                        }
                    }
                }
                other => {
                    if let Some(translated) = translate(&other) {
                        // Redraws may be throttled while hidden; never wait on one to close.
                        if translated.ends_loop() {
                            info!("close requested");
                            elwt.exit();
                        }
                        input.push(translated);
                    }
                }
            },
            Event::AboutToWait => {
                elwt.set_control_flow(ControlFlow::Poll);
                window.request_redraw();
            }
            _ => {}
        })
        .map_err(StartupError::window)?;

    info!(frames = frames.frames_rendered(), "frame loop finished");
    match fatal {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

/// Warps the pointer back to the middle of the window after a drag step.
fn recenter_pointer(window: &Window, input: &mut InputQueue, viewport: Viewport) {
    if viewport.is_empty() {
        return;
    }
    let center = [viewport.width as f32 / 2.0, viewport.height as f32 / 2.0];
    let position = PhysicalPosition::new(f64::from(center[0]), f64::from(center[1]));
    match window.set_cursor_position(position) {
        Ok(()) => input.pointer_recentered(center),
        Err(err) => warn!(error = %err, "pointer warp refused; deltas stay incremental"),
    }
}

fn translate(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::CloseRequested | WindowEvent::Destroyed => Some(InputEvent::CloseRequested),
        WindowEvent::Resized(size) => Some(InputEvent::Resized(Viewport::new(
            size.width,
            size.height,
        ))),
        WindowEvent::KeyboardInput { event, .. } => key_event(event),
        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::PointerMoved {
            x: position.x as f32,
            y: position.y as f32,
        }),
        WindowEvent::MouseInput {
            state,
            button: MouseButton::Left,
            ..
        } => Some(InputEvent::PointerButton {
            pressed: *state == ElementState::Pressed,
        }),
        WindowEvent::MouseWheel { delta, .. } => Some(InputEvent::Scroll {
            delta: scroll_lines(*delta),
        }),
        _ => None,
    }
}

fn key_event(event: &KeyEvent) -> Option<InputEvent> {
    if event.repeat {
        return None;
    }
    let PhysicalKey::Code(code) = event.physical_key else {
        return None;
    };
    nav_key(code).map(|key| InputEvent::Key {
        key,
        pressed: event.state == ElementState::Pressed,
    })
}

/// Navigation keys are matched by physical position, so WASD works on any
/// keyboard layout.
fn nav_key(code: KeyCode) -> Option<NavKey> {
    match code {
        KeyCode::KeyW => Some(NavKey::Forward),
        KeyCode::KeyS => Some(NavKey::Backward),
        KeyCode::KeyA => Some(NavKey::Left),
        KeyCode::KeyD => Some(NavKey::Right),
        KeyCode::Escape => Some(NavKey::Escape),
        _ => None,
    }
}

fn scroll_lines(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, lines) => lines,
        MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_SCROLL_LINE,
    }
}
