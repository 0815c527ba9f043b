use bytemuck::{Pod, Zeroable};

use crate::camera::CameraParams;
use crate::types::{SceneKind, StaticTriangle};

/// Mirrors the kernel's std140 `CameraParams` block:
///
/// ```glsl
/// vec3 camPos; float camFOV; float camYaw; float camPitch;
/// ```
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct CameraUniforms {
    pub cam_pos: [f32; 3],
    pub cam_fov: f32,
    pub cam_yaw: f32,
    pub cam_pitch: f32,
    pub padding: [f32; 2],
}

impl From<CameraParams> for CameraUniforms {
    fn from(params: CameraParams) -> Self {
        Self {
            cam_pos: params.position,
            cam_fov: params.fov,
            cam_yaw: params.yaw,
            cam_pitch: params.pitch,
            padding: [0.0; 2],
        }
    }
}

/// Mirrors the std140 `SceneParams` block, written once at start-up.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct SceneUniforms {
    pub cam_dir: [f32; 4],
    pub tri_point0: [f32; 4],
    pub tri_point1: [f32; 4],
    pub tri_point2: [f32; 4],
    pub primitive_count: u32,
    pub padding: [u32; 3],
}

impl SceneUniforms {
    pub fn new(scene: SceneKind, primitive_count: u32) -> Self {
        let triangle = match scene {
            SceneKind::Mesh => StaticTriangle::default(),
            SceneKind::Triangle(triangle) => triangle,
        };
        let extend = |v: [f32; 3]| [v[0], v[1], v[2], 0.0];
        Self {
            cam_dir: extend(triangle.camera_direction),
            tri_point0: extend(triangle.points[0]),
            tri_point1: extend(triangle.points[1]),
            tri_point2: extend(triangle.points[2]),
            primitive_count,
            padding: [0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_match_std140_blocks() {
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 32);
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 80);
    }

    #[test]
    fn camera_fields_land_at_block_offsets() {
        let uniforms = CameraUniforms::from(CameraParams {
            position: [1.0, 2.0, 3.0],
            fov: 4.0,
            yaw: 5.0,
            pitch: 6.0,
        });
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&uniforms));
        // camFOV shares the vec3's 16-byte slot.
        assert_eq!(&floats[..6], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn mesh_scene_carries_primitive_count() {
        let uniforms = SceneUniforms::new(SceneKind::Mesh, 12);
        assert_eq!(uniforms.primitive_count, 12);
        assert_eq!(uniforms.cam_dir[3], 0.0);
    }
}
