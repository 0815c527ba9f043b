use std::collections::BTreeMap;

use wgpu::util::DeviceExt;

use crate::geometry::{Point, PrimitiveSet, GEOMETRY_SLOTS};

/// Device-resident copies of the primitive buffers, keyed by binding slot.
pub(crate) struct StorageBuffers {
    buffers: BTreeMap<u32, wgpu::Buffer>,
}

impl StorageBuffers {
    /// Uploads every buffer of `set`; geometry slots nobody uploaded get a
    /// single zero point so the kernel's bindings stay valid.
    pub fn upload(device: &wgpu::Device, set: &PrimitiveSet) -> Self {
        let mut buffers = BTreeMap::new();
        for primitive in set.buffers() {
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("primitive buffer {}", primitive.slot())),
                contents: primitive.contents(),
                usage: wgpu::BufferUsages::STORAGE,
            });
            buffers.insert(primitive.slot(), buffer);
        }

        for slot in GEOMETRY_SLOTS {
            buffers.entry(slot).or_insert_with(|| {
                tracing::warn!(slot, "no primitives uploaded for slot; binding an empty buffer");
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("empty primitive buffer"),
                    contents: bytemuck::bytes_of(&Point::new(0.0, 0.0, 0.0)),
                    usage: wgpu::BufferUsages::STORAGE,
                })
            });
        }

        Self { buffers }
    }

    pub fn get(&self, slot: u32) -> Option<&wgpu::Buffer> {
        self.buffers.get(&slot)
    }
}
