// ============================================
// Climate Map - Температура и влажность
// ============================================
//
// Два независимых fBm-поля поверх одного seed, разнесённые
// смещением координат. Биом выводится порогами из пары
// (температура, влажность).

use super::Biome;
use crate::terrain::generation::SimplexNoise;

const BIOME_OCTAVES: u32 = 3;
const BIOME_PERSISTENCE: f64 = 0.5;
const BIOME_SCALE: f64 = 0.002;

// Смещения разводят поля по разным участкам шума
const TEMPERATURE_OFFSET: f64 = 5000.0;
const MOISTURE_OFFSET: f64 = 10000.0;

/// Климат в одной мировой колонке
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClimateSample {
    pub temperature: f64,
    pub moisture: f64,
}

/// Климатическая карта мира
pub struct ClimateMap {
    noise: SimplexNoise,
}

impl ClimateMap {
    pub fn new(seed: u64) -> Self {
        Self {
            noise: SimplexNoise::new(seed),
        }
    }

    /// Температура и влажность в мировой колонке (wx, wz)
    pub fn sample(&self, wx: f64, wz: f64) -> ClimateSample {
        let temperature = self.noise.fbm2(
            wx + TEMPERATURE_OFFSET,
            wz + TEMPERATURE_OFFSET,
            BIOME_OCTAVES,
            BIOME_PERSISTENCE,
            BIOME_SCALE,
        );
        let moisture = self.noise.fbm2(
            wx + MOISTURE_OFFSET,
            wz + MOISTURE_OFFSET,
            BIOME_OCTAVES,
            BIOME_PERSISTENCE,
            BIOME_SCALE,
        );
        ClimateSample {
            temperature,
            moisture,
        }
    }

    /// Биом мировой колонки (wx, wz)
    #[inline]
    pub fn biome_at(&self, wx: f64, wz: f64) -> Biome {
        classify(self.sample(wx, wz))
    }
}

/// Пороговая классификация климата в биом
pub fn classify(climate: ClimateSample) -> Biome {
    if climate.temperature > 0.3 {
        if climate.moisture < 0.0 {
            Biome::Desert
        } else {
            Biome::Plains
        }
    } else if climate.temperature < -0.3 {
        Biome::Tundra
    } else if climate.moisture > -0.1 {
        Biome::Forest
    } else {
        Biome::Plains
    }
}
