// ============================================
// GPU Module - Бэкенды хранения мешей
// ============================================

mod backend;
mod wgpu_backend;

pub use backend::{ChunkMeshBackend, ChunkMeshes, NullMeshBackend};
pub use wgpu_backend::{GpuChunkMesh, WgpuMeshBackend};
