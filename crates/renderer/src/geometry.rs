use std::collections::BTreeMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

/// Binding slots the compute kernel reads points from.
pub const GEOMETRY_SLOTS: [u32; 3] = [1, 2, 3];

/// Four-component point as laid out in a structured buffer (`w` unused).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, w: 0.0 }
    }
}

/// Ordered points bound at one slot. Immutable once uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveBuffer {
    slot: u32,
    points: Arc<[Point]>,
}

impl PrimitiveBuffer {
    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bytes handed to the GPU. An empty sequence still yields one zero
    /// point since storage bindings cannot be zero sized.
    pub fn contents(&self) -> &[u8] {
        const ZERO: [Point; 1] = [Point::new(0.0, 0.0, 0.0)];
        if self.points.is_empty() {
            bytemuck::cast_slice(&ZERO)
        } else {
            bytemuck::cast_slice(&self.points)
        }
    }
}

/// Point sequences keyed by binding slot.
///
/// The contents are opaque to this type; only the kernel gives them meaning.
#[derive(Debug, Clone, Default)]
pub struct PrimitiveSet {
    buffers: BTreeMap<u32, PrimitiveBuffer>,
}

impl PrimitiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `points` at `slot`, returning whatever was bound there before.
    pub fn upload(&mut self, slot: u32, points: &[Point]) -> Option<PrimitiveBuffer> {
        let buffer = PrimitiveBuffer {
            slot,
            points: Arc::from(points),
        };
        tracing::debug!(slot, points = points.len(), "uploading primitive buffer");
        self.buffers.insert(slot, buffer)
    }

    pub fn get(&self, slot: u32) -> Option<&PrimitiveBuffer> {
        self.buffers.get(&slot)
    }

    pub fn buffers(&self) -> impl Iterator<Item = &PrimitiveBuffer> {
        self.buffers.values()
    }

    /// Triangles the kernel can assemble: point `i` of every geometry slot
    /// forms triangle `i`, so the shortest slot bounds the count.
    pub fn primitive_count(&self) -> u32 {
        GEOMETRY_SLOTS
            .iter()
            .map(|slot| self.buffers.get(slot).map_or(0, PrimitiveBuffer::len))
            .min()
            .unwrap_or(0) as u32
    }
}

/// The reference cube: twelve triangles split across slots 1, 2 and 3.
pub fn reference_cube() -> PrimitiveSet {
    const H: f32 = 0.5;
    let first = [
        Point::new(H, -H, H),
        Point::new(H, -H, H),
        Point::new(H, H, H),
        Point::new(H, H, H),
        Point::new(-H, H, H),
        Point::new(-H, H, H),
        Point::new(-H, -H, H),
        Point::new(-H, -H, H),
        Point::new(-H, -H, H),
        Point::new(-H, -H, H),
        Point::new(H, -H, -H),
        Point::new(H, -H, -H),
    ];
    let second = [
        Point::new(H, -H, -H),
        Point::new(H, H, -H),
        Point::new(H, H, -H),
        Point::new(-H, H, -H),
        Point::new(-H, H, -H),
        Point::new(-H, -H, -H),
        Point::new(-H, -H, -H),
        Point::new(H, -H, -H),
        Point::new(H, -H, H),
        Point::new(H, H, H),
        Point::new(-H, -H, -H),
        Point::new(-H, H, -H),
    ];
    let third = [
        Point::new(H, H, -H),
        Point::new(H, H, H),
        Point::new(-H, H, -H),
        Point::new(-H, H, H),
        Point::new(-H, -H, -H),
        Point::new(-H, -H, H),
        Point::new(H, -H, -H),
        Point::new(H, -H, H),
        Point::new(H, H, H),
        Point::new(-H, H, H),
        Point::new(-H, H, -H),
        Point::new(H, H, -H),
    ];

    let mut set = PrimitiveSet::new();
    set.upload(GEOMETRY_SLOTS[0], &first);
    set.upload(GEOMETRY_SLOTS[1], &second);
    set.upload(GEOMETRY_SLOTS[2], &third);
    set
}
