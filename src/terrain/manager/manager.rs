// ============================================
// Chunk Manager - Жизненный цикл чанков
// ============================================
//
// Главный поток владеет картой чанков, фоновые потоки работают
// по снимкам. Зона загрузки пересчитывается только при смене
// клетки наблюдателя: круг по XZ радиусом render_distance и
// вертикальная полоса [min_chunk_y, max_chunk_y). Каждый
// результат из пула несёт chunk_id и отбрасывается, если чанк
// с тех пор выгружен или пересоздан.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use ultraviolet::Vec3;

use crate::blocks::{BlockType, TextureLayerTable};
use crate::math::Aabb;
use crate::terrain::generation::{GeneratedChunk, WorldGenerator};
use crate::terrain::gpu::{ChunkMeshBackend, ChunkMeshes};
use crate::terrain::mesh::{build_mesh, with_meshing_context, ChunkView, MeshData};
use crate::terrain::voxel::{
    BlockArray, ChunkKey, ChunkState, VoxelChunk, CHUNK_SIZE, CHUNK_VOLUME, NEIGHBOR_COUNT,
    NEIGHBOR_OFFSETS,
};
use super::pool::{Task, TaskResult, WorkerPool};

/// Клетка-страж: гарантированно не совпадает с реальной позицией,
/// первый update всегда пересчитывает зону
const OBSERVER_SENTINEL: (i32, i32, i32) = (i32::MIN, i32::MIN, i32::MIN);

/// Настройки менеджера чанков
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Радиус загрузки в чанках по XZ
    pub render_distance: i32,
    /// Нижняя граница вертикальной полосы (включительно)
    pub min_chunk_y: i32,
    /// Верхняя граница вертикальной полосы (исключительно)
    pub max_chunk_y: i32,
    /// Лимит применяемых мешей за один кадр
    pub max_uploads_per_frame: usize,
    /// Число фоновых потоков, None - автоматически
    pub worker_threads: Option<usize>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            render_distance: 10,
            min_chunk_y: -2,
            max_chunk_y: 8,
            max_uploads_per_frame: 32,
            worker_threads: None,
        }
    }
}

/// Счётчики состояния мира для отладочного оверлея
#[derive(Clone, Copy, Debug, Default)]
pub struct ChunkDiagnostics {
    pub loaded: usize,
    pub meshed: usize,
    /// Чанки в состояниях Created и Generating
    pub pending_generation: usize,
    /// Очередь мешей плюс очередь загрузки
    pub pending_meshes: usize,
}

/// Менеджер чанков: загрузка, генерация, меши, выгрузка
pub struct ChunkManager<B: ChunkMeshBackend> {
    backend: B,
    generator: Arc<WorldGenerator>,
    pool: WorkerPool,
    config: ManagerConfig,
    layers: TextureLayerTable,

    pub(super) chunks: HashMap<u64, VoxelChunk>,
    meshes: HashMap<u64, ChunkMeshes<B::Mesh>>,
    needs_mesh: HashSet<u64>,
    upload_queue: VecDeque<(u64, u64, Option<MeshData>)>,

    next_chunk_id: u64,
    observer_cell: (i32, i32, i32),
}

impl<B: ChunkMeshBackend> ChunkManager<B> {
    pub fn new(
        backend: B,
        generator: WorldGenerator,
        config: ManagerConfig,
        layers: TextureLayerTable,
    ) -> Self {
        let generator = Arc::new(generator);
        let threads = config.worker_threads.unwrap_or_else(WorkerPool::default_thread_count);
        let pool = WorkerPool::new(Arc::clone(&generator), threads);

        Self {
            backend,
            generator,
            pool,
            config,
            layers,
            chunks: HashMap::with_capacity(1024),
            meshes: HashMap::with_capacity(1024),
            needs_mesh: HashSet::new(),
            upload_queue: VecDeque::new(),
            next_chunk_id: 1,
            observer_cell: OBSERVER_SENTINEL,
        }
    }

    /// Кадровый шаг: зона, результаты пула, очередь мешей, загрузка
    pub fn update(&mut self, observer: Vec3) {
        let cell = cell_of(observer);
        if cell != self.observer_cell {
            self.observer_cell = cell;
            self.refresh_loaded_set(true);
        }
        self.drain_results();
        self.process_needs_mesh();
        self.apply_uploads();
    }

    /// Синхронно генерирует и мешит стартовую зону через rayon.
    /// Лимит кадра не действует, вызывается до игрового цикла
    pub fn preload(&mut self, observer: Vec3) {
        use rayon::prelude::*;

        let started = std::time::Instant::now();
        self.observer_cell = cell_of(observer);
        self.refresh_loaded_set(false);

        let pending: Vec<u64> = self
            .chunks
            .iter()
            .filter(|(_, c)| c.state() == ChunkState::Created)
            .map(|(packed, _)| *packed)
            .collect();
        let generator = Arc::clone(&self.generator);
        let generated: Vec<(u64, GeneratedChunk)> = pending
            .par_iter()
            .map(|&packed| (packed, generator.generate(ChunkKey::unpack(packed))))
            .collect();
        for (packed, data) in generated {
            self.install_generated(packed, data);
        }

        let queued: Vec<u64> = self.needs_mesh.iter().copied().collect();
        let mut jobs: Vec<(u64, ChunkView)> = Vec::with_capacity(queued.len());
        for packed in queued {
            let Some((_, _, view)) = self.mesh_view(packed) else { continue };
            if let Some(chunk) = self.chunks.get_mut(&packed) {
                chunk.set_state(ChunkState::Meshing);
                chunk.clear_dirty();
            }
            self.needs_mesh.remove(&packed);
            jobs.push((packed, view));
        }

        let layers = self.layers;
        let built: Vec<(u64, Option<MeshData>)> = jobs
            .into_par_iter()
            .map(|(packed, view)| {
                let mesh = with_meshing_context(|ctx| build_mesh(&view, &layers, ctx));
                (packed, mesh)
            })
            .collect();
        for (packed, mesh) in built {
            self.replace_meshes(packed, mesh);
            if let Some(chunk) = self.chunks.get_mut(&packed) {
                chunk.set_state(ChunkState::Ready);
            }
        }

        log::info!(
            "прелоад: {} чанков, {} мешей за {:.0} мс",
            self.chunks.len(),
            self.meshes.len(),
            started.elapsed().as_secs_f64() * 1000.0
        );
    }

    /// Обходит непрозрачные меши, прошедшие тест видимости.
    /// Возвращает число вызовов draw
    pub fn render<F, D>(&self, is_visible: F, mut draw: D) -> usize
    where
        F: Fn(&Aabb) -> bool,
        D: FnMut(ChunkKey, &B::Mesh),
    {
        let mut drawn = 0;
        for (packed, entry) in &self.meshes {
            let Some(mesh) = entry.opaque.as_ref() else { continue };
            let Some(chunk) = self.chunks.get(packed) else { continue };
            if !is_visible(chunk.aabb()) {
                continue;
            }
            draw(chunk.key(), mesh);
            drawn += 1;
        }
        drawn
    }

    /// То же для водных мешей, рисуются отдельным проходом
    pub fn render_water<F, D>(&self, is_visible: F, mut draw: D) -> usize
    where
        F: Fn(&Aabb) -> bool,
        D: FnMut(ChunkKey, &B::Mesh),
    {
        let mut drawn = 0;
        for (packed, entry) in &self.meshes {
            let Some(mesh) = entry.water.as_ref() else { continue };
            let Some(chunk) = self.chunks.get(packed) else { continue };
            if !is_visible(chunk.aabb()) {
                continue;
            }
            draw(chunk.key(), mesh);
            drawn += 1;
        }
        drawn
    }

    pub fn diagnostics(&self) -> ChunkDiagnostics {
        let pending_generation = self
            .chunks
            .values()
            .filter(|c| matches!(c.state(), ChunkState::Created | ChunkState::Generating))
            .count();
        ChunkDiagnostics {
            loaded: self.chunks.len(),
            meshed: self.meshes.len(),
            pending_generation,
            pending_meshes: self.needs_mesh.len() + self.upload_queue.len(),
        }
    }

    pub fn render_distance(&self) -> i32 {
        self.config.render_distance
    }

    /// Меняет радиус на лету, зона пересчитается на следующем update
    pub fn set_render_distance(&mut self, distance: i32) {
        let distance = distance.max(1);
        if distance != self.config.render_distance {
            self.config.render_distance = distance;
            self.observer_cell = OBSERVER_SENTINEL;
        }
    }

    pub fn generator(&self) -> &WorldGenerator {
        &self.generator
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn chunk_state(&self, key: ChunkKey) -> Option<ChunkState> {
        self.chunks.get(&key.pack()).map(|c| c.state())
    }

    pub fn is_loaded(&self, key: ChunkKey) -> bool {
        self.chunks.contains_key(&key.pack())
    }

    /// Останавливает пул и освобождает все чанки с мешами
    pub fn shutdown(&mut self) {
        self.pool.shutdown();
        self.needs_mesh.clear();
        self.upload_queue.clear();
        let keys: Vec<u64> = self.meshes.keys().copied().collect();
        for packed in keys {
            self.free_meshes(packed);
        }
        self.chunks.clear();
        log::info!("менеджер чанков остановлен");
    }

    // --- Зона загрузки ---

    fn refresh_loaded_set(&mut self, submit_generation: bool) {
        let (cx, _, cz) = self.observer_cell;
        let r = self.config.render_distance.max(1);

        let mut desired = HashSet::with_capacity((r * r * 4) as usize);
        for dz in -r..=r {
            for dx in -r..=r {
                if dx * dx + dz * dz > r * r {
                    continue;
                }
                for cy in self.config.min_chunk_y..self.config.max_chunk_y {
                    desired.insert(ChunkKey::new(cx + dx, cy, cz + dz).pack());
                }
            }
        }

        let stale: Vec<u64> = self
            .chunks
            .keys()
            .filter(|packed| !desired.contains(packed))
            .copied()
            .collect();
        let unloaded = stale.len();
        for packed in stale {
            self.unload_chunk(packed);
        }

        let mut loaded = 0;
        for packed in desired {
            if !self.chunks.contains_key(&packed) {
                self.load_chunk(packed, submit_generation);
                loaded += 1;
            }
        }

        if loaded > 0 || unloaded > 0 {
            log::debug!("зона ({}, {}): +{} -{} чанков", cx, cz, loaded, unloaded);
        }
    }

    fn load_chunk(&mut self, packed: u64, submit_generation: bool) {
        let key = ChunkKey::unpack(packed);
        let id = self.next_chunk_id;
        self.next_chunk_id += 1;

        let mut chunk = VoxelChunk::new(key, id);
        if submit_generation {
            chunk.set_state(ChunkState::Generating);
        }
        self.chunks.insert(packed, chunk);
        self.link_neighbors(packed, key);

        if submit_generation && !self.pool.submit(Task::Generate { key, chunk_id: id }) {
            log::error!("пул не принял генерацию чанка {:?}", key);
            if let Some(chunk) = self.chunks.get_mut(&packed) {
                chunk.set_state(ChunkState::Created);
            }
        }
    }

    fn unload_chunk(&mut self, packed: u64) {
        let Some(chunk) = self.chunks.remove(&packed) else { return };
        for (side, link) in chunk.neighbors().iter().enumerate() {
            if let Some(neighbor) = link {
                if let Some(n) = self.chunks.get_mut(neighbor) {
                    n.set_neighbor(side ^ 1, None);
                }
            }
        }
        self.needs_mesh.remove(&packed);
        self.free_meshes(packed);
    }

    /// Связывает чанк с уже загруженными соседями в обе стороны
    fn link_neighbors(&mut self, packed: u64, key: ChunkKey) {
        for (side, (dx, dy, dz)) in NEIGHBOR_OFFSETS.iter().enumerate() {
            let neighbor_packed = key.offset(*dx, *dy, *dz).pack();
            if !self.chunks.contains_key(&neighbor_packed) {
                continue;
            }
            if let Some(chunk) = self.chunks.get_mut(&packed) {
                chunk.set_neighbor(side, Some(neighbor_packed));
            }
            if let Some(neighbor) = self.chunks.get_mut(&neighbor_packed) {
                neighbor.set_neighbor(side ^ 1, Some(packed));
            }
        }
    }

    // --- Результаты пула ---

    fn drain_results(&mut self) {
        while let Some(result) = self.pool.try_recv() {
            match result {
                TaskResult::Generated { key, chunk_id, chunk } => {
                    let packed = key.pack();
                    if self.chunk_matches(packed, chunk_id) {
                        self.install_generated(packed, chunk);
                    }
                }
                TaskResult::GenerateFailed { key, chunk_id } => {
                    let packed = key.pack();
                    if self.chunk_matches(packed, chunk_id) {
                        log::warn!("чанк {:?} остался пустым после сбоя генерации", key);
                        self.install_generated(
                            packed,
                            GeneratedChunk {
                                blocks: Arc::new([BlockType::Air; CHUNK_VOLUME]),
                                non_air: 0,
                            },
                        );
                        // Сбой не равен пустому чанку: оставляем Generated
                        if let Some(chunk) = self.chunks.get_mut(&packed) {
                            chunk.set_state(ChunkState::Generated);
                        }
                        self.needs_mesh.remove(&packed);
                    }
                }
                TaskResult::Meshed { key, chunk_id, mesh } => {
                    let packed = key.pack();
                    if self.chunk_matches(packed, chunk_id) {
                        self.upload_queue.push_back((packed, chunk_id, mesh));
                    }
                }
                TaskResult::MeshFailed { key, chunk_id } => {
                    let packed = key.pack();
                    if self.chunk_matches(packed, chunk_id) {
                        log::warn!("меш чанка {:?} не собрался, пробуем ещё раз", key);
                        if let Some(chunk) = self.chunks.get_mut(&packed) {
                            chunk.set_state(ChunkState::Generated);
                        }
                        self.needs_mesh.insert(packed);
                    }
                }
            }
        }
    }

    #[inline]
    fn chunk_matches(&self, packed: u64, chunk_id: u64) -> bool {
        self.chunks.get(&packed).map_or(false, |c| c.id() == chunk_id)
    }

    fn install_generated(&mut self, packed: u64, data: GeneratedChunk) {
        let Some(chunk) = self.chunks.get_mut(&packed) else { return };
        let empty = data.non_air == 0;
        chunk.install_generated(data.blocks, data.non_air);
        if empty {
            // Пустому чанку нечего мешить
            chunk.set_state(ChunkState::Ready);
        } else {
            chunk.set_state(ChunkState::Generated);
            self.needs_mesh.insert(packed);
        }
    }

    // --- Очередь мешей ---

    fn process_needs_mesh(&mut self) {
        if self.needs_mesh.is_empty() {
            return;
        }
        let candidates: Vec<u64> = self.needs_mesh.iter().copied().collect();
        for packed in candidates {
            match self.chunks.get(&packed).map(|c| c.state()) {
                Some(ChunkState::Generated) => {
                    // Ждём, пока все связанные соседи будут сгенерированы
                    if self.can_mesh(packed) && self.submit_mesh(packed) {
                        self.needs_mesh.remove(&packed);
                    }
                }
                _ => {
                    self.needs_mesh.remove(&packed);
                }
            }
        }
    }

    fn can_mesh(&self, packed: u64) -> bool {
        let Some(chunk) = self.chunks.get(&packed) else { return false };
        for link in chunk.neighbors() {
            if let Some(neighbor) = link {
                if let Some(n) = self.chunks.get(neighbor) {
                    if n.state() < ChunkState::Generated {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Снимок чанка и соседей для фонового мешера
    fn mesh_view(&self, packed: u64) -> Option<(ChunkKey, u64, ChunkView)> {
        let chunk = self.chunks.get(&packed)?;
        let mut neighbors: [Option<Arc<BlockArray>>; NEIGHBOR_COUNT] = Default::default();
        for (side, link) in chunk.neighbors().iter().enumerate() {
            if let Some(neighbor) = link {
                neighbors[side] = self.chunks.get(neighbor).map(|n| n.snapshot());
            }
        }
        Some((chunk.key(), chunk.id(), ChunkView::new(chunk.snapshot(), neighbors)))
    }

    fn submit_mesh(&mut self, packed: u64) -> bool {
        let Some((key, chunk_id, view)) = self.mesh_view(packed) else { return false };

        // Флаг dirty снимается при отправке: правка во время сборки
        // снова поднимет его, и чанк вернётся в очередь при применении
        if let Some(chunk) = self.chunks.get_mut(&packed) {
            chunk.set_state(ChunkState::Meshing);
            chunk.clear_dirty();
        }

        let accepted = self.pool.submit(Task::Mesh {
            key,
            chunk_id,
            view,
            layers: self.layers,
        });
        if !accepted {
            if let Some(chunk) = self.chunks.get_mut(&packed) {
                chunk.set_state(ChunkState::Generated);
            }
        }
        accepted
    }

    fn apply_uploads(&mut self) {
        let cap = self.config.max_uploads_per_frame.max(1);
        let mut uploaded = 0;
        while uploaded < cap {
            let Some((packed, chunk_id, mesh)) = self.upload_queue.pop_front() else { break };

            // Устаревший результат не тратит слот кадра
            if !self.chunk_matches(packed, chunk_id) {
                continue;
            }
            uploaded += 1;
            self.replace_meshes(packed, mesh);

            let Some(chunk) = self.chunks.get_mut(&packed) else { continue };
            if chunk.is_dirty() {
                // Чанк правили во время сборки, меш уже устарел
                chunk.set_state(ChunkState::Generated);
                self.needs_mesh.insert(packed);
            } else {
                chunk.set_state(ChunkState::Ready);
            }
        }
    }

    /// Ставит чанк на повторную сборку меша после правки блоков
    pub(super) fn schedule_remesh(&mut self, packed: u64) {
        let Some(chunk) = self.chunks.get_mut(&packed) else { return };
        chunk.mark_dirty();
        match chunk.state() {
            ChunkState::Ready | ChunkState::Generated => {
                chunk.set_state(ChunkState::Generated);
                self.needs_mesh.insert(packed);
            }
            // Сборка уже идёт, dirty вернёт чанк в очередь при применении
            ChunkState::Meshing => {}
            // Генерация ещё не закончилась, правка пропадёт вместе с сеткой
            _ => {}
        }
    }

    // --- Меши ---

    fn replace_meshes(&mut self, packed: u64, data: Option<MeshData>) {
        self.free_meshes(packed);
        let Some(data) = data else { return };

        let key = ChunkKey::unpack(packed);
        let mut entry = ChunkMeshes::default();
        if data.has_opaque() {
            entry.opaque = Some(self.backend.create_mesh(
                key,
                &data.opaque_vertices,
                &data.opaque_indices,
            ));
        }
        if data.has_water() {
            entry.water = Some(self.backend.create_mesh(
                key,
                &data.water_vertices,
                &data.water_indices,
            ));
        }
        if !entry.is_empty() {
            self.meshes.insert(packed, entry);
        }
    }

    fn free_meshes(&mut self, packed: u64) {
        if let Some(entry) = self.meshes.remove(&packed) {
            if let Some(mesh) = entry.opaque {
                self.backend.destroy_mesh(mesh);
            }
            if let Some(mesh) = entry.water {
                self.backend.destroy_mesh(mesh);
            }
        }
    }
}

#[inline]
fn cell_of(pos: Vec3) -> (i32, i32, i32) {
    (
        (pos.x / CHUNK_SIZE as f32).floor() as i32,
        (pos.y / CHUNK_SIZE as f32).floor() as i32,
        (pos.z / CHUNK_SIZE as f32).floor() as i32,
    )
}
