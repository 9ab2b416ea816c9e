//! Camera pass pipelines: Phong, Phong with shadow lookup, and unlit.
//!
//! The three share one layout and vertex stage and differ only in the
//! fragment entry point.

use crate::material::ShaderVariant;

use super::canvas::OffscreenCanvas;
use super::mesh::vertex_layout;

pub struct ShadedPipeline {
    pub phong: wgpu::RenderPipeline,
    pub shadowed: wgpu::RenderPipeline,
    pub unlit: wgpu::RenderPipeline,
}

impl ShadedPipeline {
    pub fn new(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        scene_layout: &wgpu::BindGroupLayout,
        shadow_layout: &wgpu::BindGroupLayout,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shaded-pipeline-layout"),
            bind_group_layouts: &[scene_layout, shadow_layout],
            immediate_size: 0,
        });

        let build = |label: &str, fragment_entry: &str| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &[vertex_layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    // The sky dome is seen from inside.
                    cull_mode: None,
                    unclipped_depth: false,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: OffscreenCanvas::DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some(fragment_entry),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: color_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multiview_mask: None,
                cache: None,
            })
        };

        Self {
            phong: build("phong-pipeline", "fs_phong"),
            shadowed: build("shadowed-pipeline", "fs_shadowed"),
            unlit: build("unlit-pipeline", "fs_unlit"),
        }
    }

    /// Pipeline for a camera-pass variant. `DepthOnly` has none here.
    pub fn for_variant(&self, variant: ShaderVariant) -> Option<&wgpu::RenderPipeline> {
        match variant {
            ShaderVariant::Phong => Some(&self.phong),
            ShaderVariant::Shadowed => Some(&self.shadowed),
            ShaderVariant::Unlit => Some(&self.unlit),
            ShaderVariant::DepthOnly => None,
        }
    }
}
