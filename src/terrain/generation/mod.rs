// ============================================
// Generation Module - Генерация мира
// ============================================

mod config;
mod generator;
mod noise;
mod trees;

pub use config::{CaveParams, GeneratorConfig, TreeParams};
pub use generator::{GeneratedChunk, WorldGenerator, SEA_LEVEL, SNOW_LEVEL};
pub use noise::{hash_position, SimplexNoise};
