use std::borrow::Cow;

use anyhow::{Context, Result};
use wgpu::util::DeviceExt;

use crate::geometry::GEOMETRY_SLOTS;
use crate::program::{Program, ProgramKind, StageKind};

use super::storage::StorageBuffers;
use super::target::{FrameTarget, FRAME_TARGET_FORMAT};

pub(crate) const FRAME_TARGET_BINDING: u32 = 0;
pub(crate) const CAMERA_BINDING: u32 = 4;
pub(crate) const SCENE_BINDING: u32 = 5;

/// Full-screen quad as a triangle strip: position (xyz) then uv.
const QUAD_VERTICES: [f32; 20] = [
    -1.0, 1.0, 0.0, 0.0, 1.0, //
    -1.0, -1.0, 0.0, 0.0, 0.0, //
    1.0, 1.0, 0.0, 1.0, 1.0, //
    1.0, -1.0, 0.0, 1.0, 0.0, //
];
pub(crate) const QUAD_VERTEX_COUNT: u32 = 4;

fn stage_module(
    device: &wgpu::Device,
    program: &Program,
    kind: StageKind,
) -> Result<wgpu::ShaderModule> {
    let stage = program
        .stage(kind)
        .with_context(|| format!("program has no {kind} stage"))?;
    let label = format!("{kind} stage ({})", stage.origin.display());
    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&label),
        source: wgpu::ShaderSource::Naga(Cow::Owned(stage.module().clone())),
    }))
}

/// Runs `build` inside a validation scope so device-side rejections surface
/// as errors instead of the uncaptured-error panic.
fn validated<T>(device: &wgpu::Device, what: &str, build: impl FnOnce() -> T) -> Result<T> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = build();
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        anyhow::bail!("{what} rejected by the device: {err}");
    }
    Ok(value)
}

pub(crate) struct ComputePipeline {
    pub pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
}

impl ComputePipeline {
    pub fn new(device: &wgpu::Device, program: &Program) -> Result<Self> {
        anyhow::ensure!(
            program.kind() == ProgramKind::Compute,
            "expected a compute program, got {:?}",
            program.kind()
        );

        validated(device, "compute pipeline", || {
            let module = stage_module(device, program, StageKind::Compute)?;

            let mut entries = vec![wgpu::BindGroupLayoutEntry {
                binding: FRAME_TARGET_BINDING,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::StorageTexture {
                    access: wgpu::StorageTextureAccess::WriteOnly,
                    format: FRAME_TARGET_FORMAT,
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            }];
            entries.extend(GEOMETRY_SLOTS.iter().map(|&slot| wgpu::BindGroupLayoutEntry {
                binding: slot,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }));
            entries.extend([CAMERA_BINDING, SCENE_BINDING].map(|binding| {
                wgpu::BindGroupLayoutEntry {
                    binding,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }
            }));

            let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("compute layout"),
                entries: &entries,
            });
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("compute pipeline layout"),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });
            let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("compute pipeline"),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some("main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            });

            Ok(Self { pipeline, layout })
        })?
    }

    pub fn bind_group(
        &self,
        device: &wgpu::Device,
        target: &FrameTarget,
        storage: &StorageBuffers,
        camera: &wgpu::Buffer,
        scene: &wgpu::Buffer,
    ) -> Result<wgpu::BindGroup> {
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: FRAME_TARGET_BINDING,
            resource: wgpu::BindingResource::TextureView(&target.view),
        }];
        for slot in GEOMETRY_SLOTS {
            let buffer = storage
                .get(slot)
                .with_context(|| format!("no storage buffer bound at slot {slot}"))?;
            entries.push(wgpu::BindGroupEntry {
                binding: slot,
                resource: buffer.as_entire_binding(),
            });
        }
        entries.push(wgpu::BindGroupEntry {
            binding: CAMERA_BINDING,
            resource: camera.as_entire_binding(),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: SCENE_BINDING,
            resource: scene.as_entire_binding(),
        });

        Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("compute bind group"),
            layout: &self.layout,
            entries: &entries,
        }))
    }
}

pub(crate) struct RasterPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub quad: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl RasterPipeline {
    pub fn new(
        device: &wgpu::Device,
        program: &Program,
        surface_format: wgpu::TextureFormat,
    ) -> Result<Self> {
        anyhow::ensure!(
            program.kind() == ProgramKind::Render,
            "expected a render program, got {:?}",
            program.kind()
        );

        validated(device, "raster pipeline", || {
            let vertex_module = stage_module(device, program, StageKind::Vertex)?;
            let fragment_module = stage_module(device, program, StageKind::Fragment)?;

            let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("raster layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            // Rgba32Float is only filterable behind an optional feature.
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                        count: None,
                    },
                ],
            });

            let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("frame target sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Nearest,
                min_filter: wgpu::FilterMode::Nearest,
                mipmap_filter: wgpu::FilterMode::Nearest,
                ..Default::default()
            });

            let quad = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("full-screen quad"),
                contents: bytemuck::cast_slice(&QUAD_VERTICES),
                usage: wgpu::BufferUsages::VERTEX,
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("raster pipeline layout"),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });

            let attributes = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];
            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("raster pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex_module,
                    entry_point: Some("main"),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: (5 * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &attributes,
                    }],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: &fragment_module,
                    entry_point: Some("main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multiview: None,
                cache: None,
            });

            Ok(Self {
                pipeline,
                quad,
                layout,
                sampler,
            })
        })?
    }

    pub fn bind_group(&self, device: &wgpu::Device, target: &FrameTarget) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("raster bind group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&target.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}
