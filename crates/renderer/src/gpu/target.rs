use crate::types::Viewport;

pub(crate) const FRAME_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// Image the compute kernel writes and the raster pass samples.
///
/// One texture serves both roles; there is no ping-pong. Dimensions always
/// equal the viewport it was created for.
pub(crate) struct FrameTarget {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    viewport: Viewport,
}

impl FrameTarget {
    pub fn create(device: &wgpu::Device, viewport: Viewport) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("frame target"),
            size: wgpu::Extent3d {
                width: viewport.width.max(1),
                height: viewport.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FRAME_TARGET_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        tracing::debug!(width = viewport.width, height = viewport.height, "created frame target");

        Self {
            _texture: texture,
            view,
            viewport,
        }
    }

    /// Replaces this target with a fresh one; the old texture is released.
    pub fn recreate(&mut self, device: &wgpu::Device, viewport: Viewport) {
        *self = Self::create(device, viewport);
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}
