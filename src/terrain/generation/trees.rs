// ============================================
// Trees - Детерминированная расстановка деревьев
// ============================================
//
// Кандидаты стволов лежат на сетке 5x5 с джиттером из хеша
// позиции. Решение о дереве в любой мировой колонке зависит
// только от её координат, поэтому соседние чанки приходят к
// одному результату и кроны сходятся на границах без обмена
// данными.

use super::config::TreeParams;
use super::noise::hash_position;
use crate::blocks::BlockType;
use crate::terrain::voxel::{block_index, BlockArray, CHUNK_SIZE};

/// Шаг сетки кандидатов в блоках
const TREE_GRID: i32 = 5;

/// Есть ли кандидат ствола в этой мировой колонке
pub(super) fn is_tree_position(wx: i32, wz: i32) -> bool {
    let grid_x = wx.div_euclid(TREE_GRID);
    let grid_z = wz.div_euclid(TREE_GRID);
    let hash = hash_position(grid_x, grid_z);
    let candidate_x = grid_x * TREE_GRID + ((hash & 0xF) % TREE_GRID as i64) as i32;
    let candidate_z = grid_z * TREE_GRID + (((hash >> 4) & 0xF) % TREE_GRID as i64) as i32;
    wx == candidate_x && wz == candidate_z
}

/// Проходит ли колонка хеш-порог плотности
pub(super) fn passes_density(wx: i32, wz: i32, threshold: f64) -> bool {
    let hash = hash_position(wx.wrapping_mul(7), wz.wrapping_mul(13));
    let density = (hash & 0xFF) as f64 / 255.0;
    density >= threshold
}

/// Высота ствола для колонки, в пределах [trunk_min, trunk_max]
pub(super) fn trunk_height(wx: i32, wz: i32, params: &TreeParams) -> i32 {
    let hash = hash_position(
        wx.wrapping_mul(3).wrapping_add(7),
        wz.wrapping_mul(3).wrapping_add(13),
    );
    let span = ((params.trunk_max - params.trunk_min + 1).max(1)) as i64;
    params.trunk_min + ((hash & 0x7) % span) as i32
}

/// Пишет блоки дерева по мировым координатам, отбрасывая всё,
/// что не попадает в текущий чанк
pub(super) struct ChunkWriter<'a> {
    blocks: &'a mut BlockArray,
    origin_x: i32,
    origin_y: i32,
    origin_z: i32,
}

impl<'a> ChunkWriter<'a> {
    pub(super) fn new(blocks: &'a mut BlockArray, origin_x: i32, origin_y: i32, origin_z: i32) -> Self {
        Self {
            blocks,
            origin_x,
            origin_y,
            origin_z,
        }
    }

    #[inline]
    fn local_index(&self, wx: i32, wy: i32, wz: i32) -> Option<usize> {
        let lx = wx - self.origin_x;
        let ly = wy - self.origin_y;
        let lz = wz - self.origin_z;
        if lx < 0 || lx >= CHUNK_SIZE || ly < 0 || ly >= CHUNK_SIZE || lz < 0 || lz >= CHUNK_SIZE {
            return None;
        }
        Some(block_index(lx, ly, lz))
    }

    /// Сегмент ствола: пишется только в воздух
    fn place_trunk(&mut self, wx: i32, wy: i32, wz: i32) {
        if let Some(idx) = self.local_index(wx, wy, wz) {
            if self.blocks[idx].is_air() {
                self.blocks[idx] = BlockType::Log;
            }
        }
    }

    /// Блок кроны: пишется в воздух или воду
    fn place_leaf(&mut self, wx: i32, wy: i32, wz: i32, leaf: BlockType) {
        if let Some(idx) = self.local_index(wx, wy, wz) {
            let existing = self.blocks[idx];
            if existing.is_air() || existing == BlockType::Water {
                self.blocks[idx] = leaf;
            }
        }
    }
}

/// Ставит одно дерево: ствол и крону. Блоки вне чанка writer
/// молча отбрасывает
pub(super) fn place_tree(
    writer: &mut ChunkWriter<'_>,
    trunk_x: i32,
    trunk_base_y: i32,
    trunk_z: i32,
    trunk_height: i32,
    canopy_radius: i32,
    leaf: BlockType,
) {
    for y in trunk_base_y..(trunk_base_y + trunk_height) {
        writer.place_trunk(trunk_x, y, trunk_z);
    }

    let canopy_base = trunk_base_y + trunk_height - 2;
    let canopy_top = trunk_base_y + trunk_height + 1;

    for cy in canopy_base..=canopy_top {
        // Крона сужается в нижнем и верхнем слоях
        let mut layer_r = canopy_radius;
        if cy == canopy_base || cy == canopy_top {
            layer_r = canopy_radius - 1;
        }
        if layer_r < 0 {
            layer_r = 0;
        }

        for cx in (trunk_x - layer_r)..=(trunk_x + layer_r) {
            for cz in (trunk_z - layer_r)..=(trunk_z + layer_r) {
                let dx = cx - trunk_x;
                let dz = cz - trunk_z;
                // Углы срезаются для округлой формы
                if dx.abs() == layer_r && dz.abs() == layer_r {
                    continue;
                }
                writer.place_leaf(cx, cy, cz, leaf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::voxel::CHUNK_VOLUME;

    #[test]
    fn test_tree_positions_one_per_grid_cell() {
        // В каждой ячейке 5x5 ровно один кандидат
        for grid_x in -4..4 {
            for grid_z in -4..4 {
                let mut found = 0;
                for wx in (grid_x * TREE_GRID)..((grid_x + 1) * TREE_GRID) {
                    for wz in (grid_z * TREE_GRID)..((grid_z + 1) * TREE_GRID) {
                        if is_tree_position(wx, wz) {
                            found += 1;
                        }
                    }
                }
                assert_eq!(found, 1, "grid cell ({grid_x}, {grid_z})");
            }
        }
    }

    #[test]
    fn test_trunk_height_in_range() {
        let params = TreeParams::default();
        for wx in -50..50 {
            for wz in -50..50 {
                let h = trunk_height(wx, wz, &params);
                assert!(h >= params.trunk_min && h <= params.trunk_max);
            }
        }
    }

    #[test]
    fn test_density_is_deterministic() {
        assert_eq!(passes_density(17, -3, 0.5), passes_density(17, -3, 0.5));
        // Нулевой порог пропускает всё
        assert!(passes_density(17, -3, 0.0));
    }

    #[test]
    fn test_writer_discards_out_of_chunk() {
        let mut blocks = [BlockType::Air; CHUNK_VOLUME];
        let mut writer = ChunkWriter::new(&mut blocks, 0, 0, 0);
        writer.place_trunk(-1, 0, 0);
        writer.place_trunk(0, 16, 0);
        writer.place_leaf(0, 0, 99, BlockType::Leaves);
        assert!(blocks.iter().all(|b| b.is_air()));
    }

    #[test]
    fn test_trunk_only_replaces_air() {
        let mut blocks = [BlockType::Air; CHUNK_VOLUME];
        blocks[block_index(5, 3, 5)] = BlockType::Stone;
        let mut writer = ChunkWriter::new(&mut blocks, 0, 0, 0);
        writer.place_trunk(5, 3, 5);
        writer.place_trunk(5, 4, 5);
        assert_eq!(blocks[block_index(5, 3, 5)], BlockType::Stone);
        assert_eq!(blocks[block_index(5, 4, 5)], BlockType::Log);
    }

    #[test]
    fn test_leaves_replace_air_and_water_only() {
        let mut blocks = [BlockType::Air; CHUNK_VOLUME];
        blocks[block_index(1, 1, 1)] = BlockType::Water;
        blocks[block_index(2, 1, 1)] = BlockType::Log;
        let mut writer = ChunkWriter::new(&mut blocks, 0, 0, 0);
        writer.place_leaf(0, 1, 1, BlockType::Leaves);
        writer.place_leaf(1, 1, 1, BlockType::Leaves);
        writer.place_leaf(2, 1, 1, BlockType::Leaves);
        assert_eq!(blocks[block_index(0, 1, 1)], BlockType::Leaves);
        assert_eq!(blocks[block_index(1, 1, 1)], BlockType::Leaves);
        assert_eq!(blocks[block_index(2, 1, 1)], BlockType::Log);
    }

    #[test]
    fn test_tree_shape_in_chunk_center() {
        let mut blocks = [BlockType::Air; CHUNK_VOLUME];
        let mut writer = ChunkWriter::new(&mut blocks, 0, 0, 0);
        // Ствол высоты 4 с базой y=1: сегменты 1..=4, крона 3..=6
        place_tree(&mut writer, 8, 1, 8, 4, 2, BlockType::Leaves);

        for y in 1..=2 {
            assert_eq!(blocks[block_index(8, y, 8)], BlockType::Log);
        }
        // Внутри кроны ствол уже стоит, листья его не перекрывают
        for y in 3..=4 {
            assert_eq!(blocks[block_index(8, y, 8)], BlockType::Log);
        }
        // Центральная колонка кроны над стволом
        assert_eq!(blocks[block_index(8, 5, 8)], BlockType::Leaves);
        assert_eq!(blocks[block_index(8, 6, 8)], BlockType::Leaves);

        // Нижний слой кроны: радиус 1, углы срезаны
        assert_eq!(blocks[block_index(9, 3, 8)], BlockType::Leaves);
        assert_eq!(blocks[block_index(9, 3, 9)], BlockType::Air);
        // Средние слои: радиус 2, угол (2,2) срезан, (2,1) есть
        assert_eq!(blocks[block_index(10, 4, 9)], BlockType::Leaves);
        assert_eq!(blocks[block_index(10, 4, 10)], BlockType::Air);
        // За пределами радиуса пусто
        assert_eq!(blocks[block_index(11, 4, 8)], BlockType::Air);
    }
}
