// ============================================
// Block Types - Закрытый набор блоков
// ============================================
//
// Все свойства блока выводятся из варианта enum, без внешних
// реестров. Неизвестный id всегда декодируется в Air.

/// Тип блока воксельной сетки. Air имеет id 0
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlockType {
    #[default]
    Air = 0,
    Grass = 1,
    Dirt = 2,
    Stone = 3,
    Sand = 4,
    Gold = 5,
    Snow = 6,
    Water = 7,
    Lava = 8,
    Brick = 9,
    Wood = 10,
    Leaves = 11,
    Log = 12,
    Moss = 13,
    Iron = 14,
    Marble = 15,
}

impl BlockType {
    /// Число вариантов, включая Air
    pub const COUNT: usize = 16;

    /// Все варианты в порядке id
    pub const ALL: [BlockType; Self::COUNT] = [
        Self::Air,
        Self::Grass,
        Self::Dirt,
        Self::Stone,
        Self::Sand,
        Self::Gold,
        Self::Snow,
        Self::Water,
        Self::Lava,
        Self::Brick,
        Self::Wood,
        Self::Leaves,
        Self::Log,
        Self::Moss,
        Self::Iron,
        Self::Marble,
    ];

    /// Декодирует id блока; вне диапазона возвращает Air
    #[inline]
    pub const fn from_id(id: u8) -> Self {
        match id {
            1 => Self::Grass,
            2 => Self::Dirt,
            3 => Self::Stone,
            4 => Self::Sand,
            5 => Self::Gold,
            6 => Self::Snow,
            7 => Self::Water,
            8 => Self::Lava,
            9 => Self::Brick,
            10 => Self::Wood,
            11 => Self::Leaves,
            12 => Self::Log,
            13 => Self::Moss,
            14 => Self::Iron,
            15 => Self::Marble,
            _ => Self::Air,
        }
    }

    #[inline]
    pub const fn id(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn is_air(self) -> bool {
        matches!(self, Self::Air)
    }

    /// Твёрдый блок: участвует в коллизиях и загораживает соседей
    #[inline]
    pub const fn is_solid(self) -> bool {
        !matches!(self, Self::Air | Self::Water)
    }

    /// Прозрачный блок не скрывает грани соседних непрозрачных блоков
    #[inline]
    pub const fn is_transparent(self) -> bool {
        matches!(self, Self::Air | Self::Water)
    }

    #[inline]
    pub const fn is_opaque(self) -> bool {
        self.is_solid() && !self.is_transparent()
    }

    /// Грани этого блока попадают в водный поток меша
    #[inline]
    pub const fn is_water(self) -> bool {
        matches!(self, Self::Water)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        for block in BlockType::ALL {
            assert_eq!(BlockType::from_id(block.id()), block);
        }
    }

    #[test]
    fn test_out_of_range_id_is_air() {
        assert_eq!(BlockType::from_id(16), BlockType::Air);
        assert_eq!(BlockType::from_id(255), BlockType::Air);
    }

    #[test]
    fn test_opacity_classes() {
        assert!(!BlockType::Air.is_solid());
        assert!(BlockType::Air.is_transparent());
        assert!(!BlockType::Air.is_opaque());

        assert!(BlockType::Stone.is_solid());
        assert!(!BlockType::Stone.is_transparent());
        assert!(BlockType::Stone.is_opaque());

        assert!(!BlockType::Water.is_solid());
        assert!(BlockType::Water.is_transparent());
        assert!(!BlockType::Water.is_opaque());
        assert!(BlockType::Water.is_water());

        // Лава твёрдая и непрозрачная, в водный поток не попадает
        assert!(BlockType::Lava.is_solid());
        assert!(!BlockType::Lava.is_transparent());
        assert!(BlockType::Lava.is_opaque());
        assert!(!BlockType::Lava.is_water());
    }
}
