// ============================================
// Texture Layers - Слои текстурного массива
// ============================================
//
// Каждый не-воздушный блок получает свой слой в texture array.
// Мешер записывает индекс слоя в вершину, шейдер выбирает
// текстуру одним bind на весь чанк.

use super::BlockType;

/// Отображение типа блока в слой текстурного массива
#[derive(Clone, Copy, Debug)]
pub struct TextureLayerTable {
    layers: [Option<u32>; BlockType::COUNT],
}

impl TextureLayerTable {
    /// Таблица по умолчанию: не-воздушные блоки получают
    /// последовательные слои в порядке объявления
    pub fn with_default_layout() -> Self {
        let mut layers = [None; BlockType::COUNT];
        let mut next = 0u32;
        for block in BlockType::ALL {
            if !block.is_air() {
                layers[block.id() as usize] = Some(next);
                next += 1;
            }
        }
        Self { layers }
    }

    /// Число занятых слоёв
    pub fn layer_count(&self) -> u32 {
        self.layers.iter().flatten().count() as u32
    }

    /// Назначает блоку произвольный слой
    pub fn set_layer(&mut self, block: BlockType, layer: u32) {
        self.layers[block.id() as usize] = Some(layer);
    }

    /// Слой блока; для неназначенных (включая Air) возвращает 0
    #[inline]
    pub fn layer_index_of(&self, block: BlockType) -> u32 {
        self.layers[block.id() as usize].unwrap_or(0)
    }
}

impl Default for TextureLayerTable {
    fn default() -> Self {
        Self::with_default_layout()
    }
}
