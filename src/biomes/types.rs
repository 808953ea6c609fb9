// ============================================
// Biome Types - Закрытый набор биомов
// ============================================

use crate::blocks::BlockType;

/// Биом мировой колонки. Вычисляется из климата по запросу,
/// нигде не хранится
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Biome {
    Plains,
    Forest,
    Desert,
    Tundra,
}

impl Biome {
    /// Амплитуда рельефа в блоках
    #[inline]
    pub const fn height_range(self) -> f64 {
        match self {
            Self::Plains => 30.0,
            Self::Forest => 35.0,
            Self::Desert => 15.0,
            Self::Tundra => 25.0,
        }
    }

    /// Могут ли в биоме расти деревья
    #[inline]
    pub const fn supports_trees(self) -> bool {
        !matches!(self, Self::Desert)
    }

    /// Блок кроны дерева
    #[inline]
    pub const fn canopy_block(self) -> BlockType {
        match self {
            Self::Tundra => BlockType::Snow,
            _ => BlockType::Leaves,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desert_has_no_trees() {
        assert!(!Biome::Desert.supports_trees());
        assert!(Biome::Forest.supports_trees());
        assert!(Biome::Plains.supports_trees());
        assert!(Biome::Tundra.supports_trees());
    }

    #[test]
    fn test_tundra_canopy_is_snow() {
        assert_eq!(Biome::Tundra.canopy_block(), BlockType::Snow);
        assert_eq!(Biome::Forest.canopy_block(), BlockType::Leaves);
    }
}
