// ============================================
// Chunk Key - Координаты чанка
// ============================================
//
// Каноничная упаковка в u64: 21 бит x | 22 бита y | 21 бит z,
// знак сохраняется. pack и unpack взаимно обратны на всём
// допустимом диапазоне координат.

/// Координаты чанка в сетке чанков (мировая позиция = key * 16)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkKey {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkKey {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Упаковывает координаты в один u64 для хранения в HashMap
    #[inline]
    pub const fn pack(self) -> u64 {
        ((self.x as u64) & 0x1F_FFFF)
            | (((self.y as u64) & 0x3F_FFFF) << 21)
            | (((self.z as u64) & 0x1F_FFFF) << 43)
    }

    /// Распаковывает ключ со знаковым расширением каждого поля
    #[inline]
    pub const fn unpack(packed: u64) -> Self {
        let x = ((packed as i64) << 43) >> 43;
        let y = ((packed as i64) << 21) >> 42;
        let z = (packed as i64) >> 43;
        Self {
            x: x as i32,
            y: y as i32,
            z: z as i32,
        }
    }

    /// Ключ соседнего чанка по смещению в чанках
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }
}
