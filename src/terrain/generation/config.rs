// ============================================
// Generator Config - Настройки генератора
// ============================================
//
// Значения по умолчанию дают эталонный ландшафт; serde(default)
// позволяет переопределять в JSON только нужные поля.

use serde::{Deserialize, Serialize};

use crate::biomes::Biome;

/// Параметры вырезания пещер 3D шумом
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveParams {
    /// Масштаб координат при выборке шума
    pub scale: f64,
    /// Порог |шума|, выше которого блок вырезается
    pub threshold: f64,
}

impl Default for CaveParams {
    fn default() -> Self {
        Self {
            scale: 0.04,
            threshold: 0.55,
        }
    }
}

/// Параметры расстановки деревьев
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    /// На сколько блоков за границу чанка искать стволы
    pub check_radius: i32,
    /// Радиус кроны в блоках
    pub canopy_radius: i32,
    /// Минимальная высота ствола
    pub trunk_min: i32,
    /// Максимальная высота ствола
    pub trunk_max: i32,
    /// Пороги плотности: колонка получает дерево при
    /// хеш-плотности >= порога
    pub density_forest: f64,
    pub density_plains: f64,
    pub density_tundra: f64,
}

impl TreeParams {
    /// Порог плотности для биома; в пустыне деревьев нет
    #[inline]
    pub fn density_threshold(&self, biome: Biome) -> f64 {
        match biome {
            Biome::Forest => self.density_forest,
            Biome::Plains => self.density_plains,
            Biome::Tundra => self.density_tundra,
            Biome::Desert => 1.0,
        }
    }
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            check_radius: 4,
            canopy_radius: 2,
            trunk_min: 4,
            trunk_max: 6,
            density_forest: 0.15,
            density_plains: 0.75,
            density_tundra: 0.85,
        }
    }
}

/// Полная конфигурация генератора мира
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub caves: CaveParams,
    pub trees: TreeParams,
}
