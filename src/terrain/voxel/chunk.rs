// ============================================
// Voxel Chunk - Чанк 16x16x16
// ============================================
//
// Блоки лежат в плоском массиве за Arc: мешер забирает дешёвый
// снимок, редактирование на главном потоке идёт через
// copy-on-write. index = x + z*SIZE + y*SIZE^2.

use std::sync::Arc;

use ultraviolet::Vec3;

use super::ChunkKey;
use crate::blocks::BlockType;
use crate::math::Aabb;

/// Ребро чанка в блоках
pub const CHUNK_SIZE: i32 = 16;
/// Блоков в одном горизонтальном слое
pub const CHUNK_AREA: i32 = CHUNK_SIZE * CHUNK_SIZE;
/// Блоков в чанке
pub const CHUNK_VOLUME: usize = (CHUNK_SIZE * CHUNK_AREA) as usize;

/// Плоская сетка блоков одного чанка
pub type BlockArray = [BlockType; CHUNK_VOLUME];

/// Состояния жизненного цикла. Порядок вариантов значим:
/// сосед готов к мешингу при state >= Generated
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChunkState {
    Created,
    Generating,
    Generated,
    Meshing,
    Ready,
}

pub const NEIGHBOR_COUNT: usize = 6;

// Индексы соседей; противоположное направление получается как i ^ 1
pub const NEIGHBOR_NEG_X: usize = 0;
pub const NEIGHBOR_POS_X: usize = 1;
pub const NEIGHBOR_NEG_Y: usize = 2;
pub const NEIGHBOR_POS_Y: usize = 3;
pub const NEIGHBOR_NEG_Z: usize = 4;
pub const NEIGHBOR_POS_Z: usize = 5;

/// Смещения координат чанка по индексу соседа
pub const NEIGHBOR_OFFSETS: [(i32, i32, i32); NEIGHBOR_COUNT] = [
    (-1, 0, 0),
    (1, 0, 0),
    (0, -1, 0),
    (0, 1, 0),
    (0, 0, -1),
    (0, 0, 1),
];

/// Индекс блока в плоском массиве чанка. Координаты должны быть
/// в пределах 0..CHUNK_SIZE
#[inline]
pub const fn block_index(x: i32, y: i32, z: i32) -> usize {
    (x + z * CHUNK_SIZE + y * CHUNK_AREA) as usize
}

/// Чанк 16x16x16 блоков с состоянием жизненного цикла
pub struct VoxelChunk {
    key: ChunkKey,
    /// Монотонный идентификатор экземпляра. Результат воркера
    /// применяется только если id совпал: защита от устаревших
    /// результатов после выгрузки и повторной загрузки чанка
    id: u64,
    aabb: Aabb,
    blocks: Arc<BlockArray>,
    state: ChunkState,
    dirty: bool,
    non_air: u32,
    /// Упакованные ключи соседей; разрешаются через карту менеджера
    neighbors: [Option<u64>; NEIGHBOR_COUNT],
}

impl VoxelChunk {
    pub fn new(key: ChunkKey, id: u64) -> Self {
        let origin = Vec3::new(
            (key.x * CHUNK_SIZE) as f32,
            (key.y * CHUNK_SIZE) as f32,
            (key.z * CHUNK_SIZE) as f32,
        );
        let size = CHUNK_SIZE as f32;
        Self {
            key,
            id,
            aabb: Aabb::new(origin, origin + Vec3::new(size, size, size)),
            blocks: Arc::new([BlockType::Air; CHUNK_VOLUME]),
            state: ChunkState::Created,
            dirty: true,
            non_air: 0,
            neighbors: [None; NEIGHBOR_COUNT],
        }
    }

    #[inline]
    pub fn key(&self) -> ChunkKey {
        self.key
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    #[inline]
    pub fn state(&self) -> ChunkState {
        self.state
    }

    #[inline]
    pub fn set_state(&mut self, state: ChunkState) {
        self.state = state;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.non_air == 0
    }

    #[inline]
    pub fn non_air_count(&self) -> u32 {
        self.non_air
    }

    /// Снимок сетки блоков для воркера
    #[inline]
    pub fn snapshot(&self) -> Arc<BlockArray> {
        Arc::clone(&self.blocks)
    }

    #[inline]
    fn index(x: i32, y: i32, z: i32) -> usize {
        block_index(x, y, z)
    }

    #[inline]
    fn in_bounds(x: i32, y: i32, z: i32) -> bool {
        x >= 0 && x < CHUNK_SIZE && y >= 0 && y < CHUNK_SIZE && z >= 0 && z < CHUNK_SIZE
    }

    /// Блок по локальным координатам; вне диапазона возвращает Air
    #[inline]
    pub fn get(&self, x: i32, y: i32, z: i32) -> BlockType {
        if !Self::in_bounds(x, y, z) {
            return BlockType::Air;
        }
        self.blocks[Self::index(x, y, z)]
    }

    /// Ставит блок, поддерживая счётчик не-воздуха и dirty флаг.
    /// Возвращает true если содержимое изменилось
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: BlockType) -> bool {
        if !Self::in_bounds(x, y, z) {
            return false;
        }
        let idx = Self::index(x, y, z);
        let old = self.blocks[idx];
        if old == block {
            return false;
        }

        if old.is_air() && !block.is_air() {
            self.non_air += 1;
        } else if !old.is_air() && block.is_air() {
            self.non_air -= 1;
        }

        Arc::make_mut(&mut self.blocks)[idx] = block;
        self.dirty = true;
        true
    }

    /// Массовая запись без dirty-оповещения; после серии вызовов
    /// нужно вызвать finish_bulk_set
    pub fn set_block_fast(&mut self, x: i32, y: i32, z: i32, block: BlockType) {
        if !Self::in_bounds(x, y, z) {
            return;
        }
        let idx = Self::index(x, y, z);
        let old = self.blocks[idx];
        if old == block {
            return;
        }

        if old.is_air() && !block.is_air() {
            self.non_air += 1;
        } else if !old.is_air() && block.is_air() {
            self.non_air -= 1;
        }

        Arc::make_mut(&mut self.blocks)[idx] = block;
    }

    /// Завершает серию set_block_fast
    #[inline]
    pub fn finish_bulk_set(&mut self) {
        self.dirty = true;
    }

    /// Устанавливает готовую сетку из генератора целиком
    pub fn install_generated(&mut self, blocks: Arc<BlockArray>, non_air: u32) {
        self.blocks = blocks;
        self.non_air = non_air;
        self.dirty = true;
    }

    #[inline]
    pub fn neighbor(&self, side: usize) -> Option<u64> {
        self.neighbors[side]
    }

    #[inline]
    pub fn set_neighbor(&mut self, side: usize, neighbor: Option<u64>) {
        self.neighbors[side] = neighbor;
    }

    #[inline]
    pub fn neighbors(&self) -> &[Option<u64>; NEIGHBOR_COUNT] {
        &self.neighbors
    }
}
