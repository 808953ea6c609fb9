// ============================================
// Terrain Module - Мир из вокселей
// ============================================

pub mod generation;
pub mod gpu;
pub mod manager;
pub mod mesh;
pub mod voxel;

// Re-exports
pub use generation::{GeneratorConfig, WorldGenerator, SEA_LEVEL};
pub use gpu::{ChunkMeshBackend, NullMeshBackend, WgpuMeshBackend};
pub use manager::{ChunkDiagnostics, ChunkManager, ManagerConfig, RaycastHit};
pub use mesh::{MeshData, TerrainVertex};
pub use voxel::{ChunkKey, ChunkState, VoxelChunk, CHUNK_SIZE, CHUNK_VOLUME};
