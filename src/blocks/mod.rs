// ============================================
// Blocks Module - Типы блоков
// ============================================

mod layers;
mod types;

pub use layers::TextureLayerTable;
pub use types::BlockType;
