// ============================================
// Mesh Backend - Абстракция над хранилищем мешей
// ============================================

use crate::terrain::mesh::TerrainVertex;
use crate::terrain::voxel::ChunkKey;

/// Создаёт и освобождает меши чанков. Реализация для GPU
/// держит буферы, нулевая реализация нужна тестам и headless режиму.
pub trait ChunkMeshBackend {
    type Mesh;

    fn create_mesh(
        &mut self,
        key: ChunkKey,
        vertices: &[TerrainVertex],
        indices: &[u32],
    ) -> Self::Mesh;

    fn destroy_mesh(&mut self, mesh: Self::Mesh);
}

/// Пара мешей чанка: непрозрачный и водный проходы
#[derive(Debug)]
pub struct ChunkMeshes<M> {
    pub opaque: Option<M>,
    pub water: Option<M>,
}

impl<M> Default for ChunkMeshes<M> {
    fn default() -> Self {
        Self {
            opaque: None,
            water: None,
        }
    }
}

impl<M> ChunkMeshes<M> {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.opaque.is_none() && self.water.is_none()
    }
}

/// Бэкенд без GPU: считает живые меши, данные не хранит
#[derive(Debug, Default)]
pub struct NullMeshBackend {
    created: usize,
    destroyed: usize,
}

impl NullMeshBackend {
    /// Сколько мешей создано и ещё не освобождено
    #[inline]
    pub fn live(&self) -> usize {
        self.created - self.destroyed
    }

    #[inline]
    pub fn created(&self) -> usize {
        self.created
    }
}

impl ChunkMeshBackend for NullMeshBackend {
    type Mesh = ();

    fn create_mesh(
        &mut self,
        _key: ChunkKey,
        _vertices: &[TerrainVertex],
        _indices: &[u32],
    ) -> Self::Mesh {
        self.created += 1;
    }

    fn destroy_mesh(&mut self, _mesh: Self::Mesh) {
        self.destroyed += 1;
    }
}
