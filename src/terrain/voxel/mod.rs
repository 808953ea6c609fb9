// ============================================
// Voxel Module - Чанки и ключи
// ============================================

mod chunk;
mod key;

pub use chunk::{
    block_index, BlockArray, ChunkState, VoxelChunk, CHUNK_AREA, CHUNK_SIZE, CHUNK_VOLUME,
    NEIGHBOR_COUNT, NEIGHBOR_NEG_X, NEIGHBOR_NEG_Y, NEIGHBOR_NEG_Z, NEIGHBOR_OFFSETS,
    NEIGHBOR_POS_X, NEIGHBOR_POS_Y, NEIGHBOR_POS_Z,
};
pub use key::ChunkKey;
