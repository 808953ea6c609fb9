// ============================================
// Biomes Module - Биомы и климат
// ============================================

mod climate;
mod types;

pub use climate::{ClimateMap, ClimateSample};
pub use types::Biome;
