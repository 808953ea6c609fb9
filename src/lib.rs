// ============================================
// Karst - Воксельный движок чанков
// ============================================
// Жизненный цикл чанков 16x16x16: генерация в пуле потоков,
// жадная сборка мешей, загрузка на GPU порциями по кадрам.

pub mod biomes;
pub mod blocks;
pub mod config;
pub mod math;
pub mod terrain;

// Re-exports
pub use blocks::BlockType;
pub use config::EngineConfig;
pub use math::{Aabb, FrustumPlanes};
pub use terrain::{ChunkKey, ChunkManager, ChunkState, VoxelChunk, WorldGenerator, CHUNK_SIZE};
