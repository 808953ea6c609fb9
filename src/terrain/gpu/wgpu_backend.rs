// ============================================
// GPU Mesh Backend - Буферы чанков на GPU
// ============================================

use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::terrain::mesh::TerrainVertex;
use crate::terrain::voxel::ChunkKey;
use super::backend::ChunkMeshBackend;

/// GPU буферы одного меша чанка
pub struct GpuChunkMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

/// Бэкенд поверх wgpu устройства
pub struct WgpuMeshBackend {
    device: Arc<wgpu::Device>,
}

impl WgpuMeshBackend {
    pub fn new(device: Arc<wgpu::Device>) -> Self {
        Self { device }
    }
}

impl ChunkMeshBackend for WgpuMeshBackend {
    type Mesh = GpuChunkMesh;

    fn create_mesh(
        &mut self,
        key: ChunkKey,
        vertices: &[TerrainVertex],
        indices: &[u32],
    ) -> Self::Mesh {
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("Chunk {:?} Vertices", key)),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("Chunk {:?} Indices", key)),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        GpuChunkMesh {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    fn destroy_mesh(&mut self, mesh: Self::Mesh) {
        mesh.vertex_buffer.destroy();
        mesh.index_buffer.destroy();
    }
}
