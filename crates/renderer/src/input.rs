//! Input events queued by the window layer and drained once per frame tick.

use std::collections::VecDeque;

use crate::types::Viewport;

/// Keys the navigation model reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Forward,
    Backward,
    Left,
    Right,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key { key: NavKey, pressed: bool },
    /// Absolute pointer position in physical pixels.
    PointerMoved { x: f32, y: f32 },
    /// Primary button; holding it drags the view.
    PointerButton { pressed: bool },
    /// Vertical scroll in lines.
    Scroll { delta: f32 },
    Resized(Viewport),
    CloseRequested,
}

impl InputEvent {
    /// Events that end the frame loop without waiting for the next tick.
    pub fn ends_loop(&self) -> bool {
        matches!(
            self,
            InputEvent::CloseRequested
                | InputEvent::Key {
                    key: NavKey::Escape,
                    pressed: true,
                }
        )
    }
}

/// Everything one frame tick needs from the input queue.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputTick {
    /// +1 forward, -1 backward, 0 when neither or both are held.
    pub forward_axis: i8,
    /// +1 right, -1 left.
    pub strafe_axis: i8,
    /// Pointer travel accumulated while dragging.
    pub pointer_delta: [f32; 2],
    pub scroll: f32,
    /// Latest viewport size reported during the tick.
    pub resize: Option<Viewport>,
    pub close: bool,
    /// The pointer moved while dragging and should be warped back.
    pub recenter_pointer: bool,
}

#[derive(Debug, Default)]
struct HeldKeys {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
}

impl HeldKeys {
    fn set(&mut self, key: NavKey, pressed: bool) {
        match key {
            NavKey::Forward => self.forward = pressed,
            NavKey::Backward => self.backward = pressed,
            NavKey::Left => self.left = pressed,
            NavKey::Right => self.right = pressed,
            NavKey::Escape => {}
        }
    }

    fn axes(&self) -> (i8, i8) {
        let forward = i8::from(self.forward) - i8::from(self.backward);
        let strafe = i8::from(self.right) - i8::from(self.left);
        (forward, strafe)
    }
}

/// FIFO of input events plus the state that outlives a single tick.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: VecDeque<InputEvent>,
    held: HeldKeys,
    dragging: bool,
    last_pointer: Option<[f32; 2]>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an event. Consecutive pointer moves collapse into the latest
    /// one; drag deltas telescope, so nothing is lost while ticks stall.
    pub fn push(&mut self, event: InputEvent) {
        if let (Some(InputEvent::PointerMoved { .. }), InputEvent::PointerMoved { .. }) =
            (self.events.back(), event)
        {
            self.events.pop_back();
        }
        self.events.push_back(event);
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Records that the pointer was warped, so the warp itself is not
    /// mistaken for user movement.
    pub fn pointer_recentered(&mut self, position: [f32; 2]) {
        self.last_pointer = Some(position);
    }

    /// Consumes every queued event and summarises them for one tick.
    pub fn drain_tick(&mut self) -> InputTick {
        let mut tick = InputTick::default();

        while let Some(event) = self.events.pop_front() {
            match event {
                InputEvent::Key {
                    key: NavKey::Escape,
                    pressed: true,
                } => tick.close = true,
                InputEvent::Key { key, pressed } => self.held.set(key, pressed),
                InputEvent::PointerMoved { x, y } => {
                    if self.dragging {
                        if let Some([last_x, last_y]) = self.last_pointer {
                            tick.pointer_delta[0] += x - last_x;
                            tick.pointer_delta[1] += y - last_y;
                            tick.recenter_pointer = true;
                        }
                    }
                    self.last_pointer = Some([x, y]);
                }
                InputEvent::PointerButton { pressed } => self.dragging = pressed,
                InputEvent::Scroll { delta } => tick.scroll += delta,
                InputEvent::Resized(viewport) => tick.resize = Some(viewport),
                InputEvent::CloseRequested => tick.close = true,
            }
        }

        let (forward, strafe) = self.held.axes();
        tick.forward_axis = forward;
        tick.strafe_axis = strafe;
        tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_keys_persist_across_ticks() {
        let mut queue = InputQueue::new();
        queue.push(InputEvent::Key {
            key: NavKey::Forward,
            pressed: true,
        });
        assert_eq!(queue.drain_tick().forward_axis, 1);
        assert_eq!(queue.drain_tick().forward_axis, 1);

        queue.push(InputEvent::Key {
            key: NavKey::Forward,
            pressed: false,
        });
        assert_eq!(queue.drain_tick().forward_axis, 0);
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut queue = InputQueue::new();
        queue.push(InputEvent::Key {
            key: NavKey::Left,
            pressed: true,
        });
        queue.push(InputEvent::Key {
            key: NavKey::Right,
            pressed: true,
        });
        assert_eq!(queue.drain_tick().strafe_axis, 0);
    }

    #[test]
    fn pointer_delta_only_accumulates_while_dragging() {
        let mut queue = InputQueue::new();
        queue.push(InputEvent::PointerMoved { x: 10.0, y: 10.0 });
        queue.push(InputEvent::PointerMoved { x: 30.0, y: 10.0 });
        let tick = queue.drain_tick();
        assert_eq!(tick.pointer_delta, [0.0, 0.0]);
        assert!(!tick.recenter_pointer);

        queue.push(InputEvent::PointerButton { pressed: true });
        queue.push(InputEvent::PointerMoved { x: 35.0, y: 12.0 });
        queue.push(InputEvent::PointerMoved { x: 40.0, y: 20.0 });
        let tick = queue.drain_tick();
        assert_eq!(tick.pointer_delta, [10.0, 10.0]);
        assert!(tick.recenter_pointer);
    }

    #[test]
    fn recentering_is_not_movement() {
        let mut queue = InputQueue::new();
        queue.push(InputEvent::PointerButton { pressed: true });
        queue.push(InputEvent::PointerMoved { x: 100.0, y: 100.0 });
        queue.push(InputEvent::PointerMoved { x: 110.0, y: 100.0 });
        assert_eq!(queue.drain_tick().pointer_delta, [10.0, 0.0]);

        queue.pointer_recentered([50.0, 50.0]);
        queue.push(InputEvent::PointerMoved { x: 50.0, y: 50.0 });
        let tick = queue.drain_tick();
        assert_eq!(tick.pointer_delta, [0.0, 0.0]);
    }

    #[test]
    fn last_resize_wins_and_close_is_reported() {
        let mut queue = InputQueue::new();
        queue.push(InputEvent::Resized(Viewport::new(640, 480)));
        queue.push(InputEvent::Scroll { delta: 1.0 });
        queue.push(InputEvent::Resized(Viewport::new(1024, 768)));
        queue.push(InputEvent::Scroll { delta: 0.5 });
        queue.push(InputEvent::Key {
            key: NavKey::Escape,
            pressed: true,
        });

        let tick = queue.drain_tick();
        assert_eq!(tick.resize, Some(Viewport::new(1024, 768)));
        assert_eq!(tick.scroll, 1.5);
        assert!(tick.close);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn stalled_ticks_do_not_grow_the_queue_with_pointer_moves() {
        let mut queue = InputQueue::new();
        queue.push(InputEvent::PointerMoved { x: 0.0, y: 0.0 });
        queue.push(InputEvent::PointerButton { pressed: true });
        for step in 1..=500 {
            queue.push(InputEvent::PointerMoved {
                x: step as f32,
                y: 0.0,
            });
        }
        assert_eq!(queue.pending(), 3);

        let tick = queue.drain_tick();
        assert_eq!(tick.pointer_delta, [500.0, 0.0]);
        assert!(queue.is_dragging());

        queue.push(InputEvent::PointerButton { pressed: false });
        queue.drain_tick();
        assert!(!queue.is_dragging());
    }

    #[test]
    fn close_and_escape_end_the_loop_immediately() {
        assert!(InputEvent::CloseRequested.ends_loop());
        assert!(InputEvent::Key {
            key: NavKey::Escape,
            pressed: true,
        }
        .ends_loop());
        assert!(!InputEvent::Key {
            key: NavKey::Escape,
            pressed: false,
        }
        .ends_loop());
        assert!(!InputEvent::Resized(Viewport::new(0, 0)).ends_loop());
    }
}
