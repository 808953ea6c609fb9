// ============================================
// Meshing Context - Zero-allocation буферы
// ============================================
//
// Контекст для генерации мешей с переиспользуемыми буферами.
// Принцип "Alloc Once, Reuse Forever" - память выделяется один раз,
// затем только очищается через clear() сохраняя capacity.

use std::cell::RefCell;

use crate::blocks::BlockType;
use crate::terrain::voxel::CHUNK_AREA;
use super::mesher::MeshData;
use super::vertex::TerrainVertex;

/// Размер маски одного среза (16x16)
const LAYER_SIZE: usize = CHUNK_AREA as usize;

/// Контекст генерации меша - содержит все переиспользуемые буферы
pub struct MeshingContext {
    /// Маска видимых граней текущего среза, Air = грани нет
    pub mask: Vec<BlockType>,

    /// Выходные буферы непрозрачного потока
    pub opaque_vertices: Vec<TerrainVertex>,
    pub opaque_indices: Vec<u32>,
    /// Выходные буферы водного потока
    pub water_vertices: Vec<TerrainVertex>,
    pub water_indices: Vec<u32>,

    /// Временный буфер для результатов greedy meshing
    pub greedy_results: Vec<(usize, usize, usize, usize, BlockType)>,
}

impl MeshingContext {
    /// Создаёт новый контекст с преаллоцированными буферами
    pub fn new() -> Self {
        Self {
            mask: vec![BlockType::Air; LAYER_SIZE],
            opaque_vertices: Vec::with_capacity(8000),
            opaque_indices: Vec::with_capacity(12000),
            water_vertices: Vec::with_capacity(1000),
            water_indices: Vec::with_capacity(1500),
            greedy_results: Vec::with_capacity(256),
        }
    }

    /// Очищает выходные буферы перед генерацией нового меша
    #[inline]
    pub fn clear_output(&mut self) {
        self.opaque_vertices.clear();
        self.opaque_indices.clear();
        self.water_vertices.clear();
        self.water_indices.clear();
    }

    /// Очищает маску среза, сохраняя её длину
    #[inline]
    pub fn clear_mask(&mut self) {
        self.mask[..LAYER_SIZE].fill(BlockType::Air);
    }

    /// Возвращает результаты и очищает внутренние буферы
    #[inline]
    pub fn take_results(&mut self) -> MeshData {
        let data = MeshData {
            opaque_vertices: std::mem::take(&mut self.opaque_vertices),
            opaque_indices: std::mem::take(&mut self.opaque_indices),
            water_vertices: std::mem::take(&mut self.water_vertices),
            water_indices: std::mem::take(&mut self.water_indices),
        };

        // Восстанавливаем capacity для следующего использования
        self.opaque_vertices = Vec::with_capacity(8000);
        self.opaque_indices = Vec::with_capacity(12000);
        self.water_vertices = Vec::with_capacity(1000);
        self.water_indices = Vec::with_capacity(1500);

        data
    }
}

impl Default for MeshingContext {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static MESHING_CONTEXT: RefCell<MeshingContext> = RefCell::new(MeshingContext::new());
}

/// Выполняет замыкание с контекстом текущего потока. Каждый
/// воркер пула держит свой контекст, буферы живут между чанками
#[inline]
pub fn with_meshing_context<F, R>(f: F) -> R
where
    F: FnOnce(&mut MeshingContext) -> R,
{
    MESHING_CONTEXT.with(|ctx| f(&mut ctx.borrow_mut()))
}
