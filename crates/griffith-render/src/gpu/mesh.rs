//! Vertex/index buffers for the primitive meshes, keyed by [`MeshKind`].

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::mesh::{MeshKind, MeshVertex};

/// Vertex and index buffers of one mesh.
pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl MeshBuffer {
    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    }
}

/// Vertex buffer layout of [`MeshVertex`].
pub fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    use wgpu::{VertexAttribute, VertexFormat};

    const ATTRIBUTES: [VertexAttribute; 2] = [
        VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: VertexFormat::Float32x3,
        },
        VertexAttribute {
            offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
            shader_location: 1,
            format: VertexFormat::Float32x3,
        },
    ];

    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

/// Every [`MeshKind`] uploaded once at startup.
pub struct MeshRegistry {
    meshes: HashMap<MeshKind, MeshBuffer>,
}

impl MeshRegistry {
    pub fn new(device: &wgpu::Device) -> Self {
        let meshes = MeshKind::ALL
            .into_iter()
            .map(|kind| {
                let data = kind.build();
                let label = kind.label();
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{label}-vertices")),
                    contents: bytemuck::cast_slice(&data.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{label}-indices")),
                    contents: bytemuck::cast_slice(&data.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                let buffer = MeshBuffer {
                    vertex_buffer,
                    index_buffer,
                    index_count: data.indices.len() as u32,
                };
                (kind, buffer)
            })
            .collect();
        Self { meshes }
    }

    pub fn get(&self, kind: MeshKind) -> Option<&MeshBuffer> {
        self.meshes.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}
