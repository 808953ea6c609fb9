// ============================================
// Chunk Mesher - Greedy meshing чанка
// ============================================
//
// Строит меш по снимку чанка и его шести соседей. Грань видима,
// если соседний блок воздух, либо прозрачный рядом с непрозрачным.
// Видимые грани одного среза жадно сливаются в прямоугольники,
// вода уходит в отдельный поток вершин.

use std::sync::Arc;

use crate::blocks::{BlockType, TextureLayerTable};
use crate::terrain::voxel::{
    block_index, BlockArray, CHUNK_SIZE, NEIGHBOR_COUNT, NEIGHBOR_NEG_X, NEIGHBOR_NEG_Y,
    NEIGHBOR_NEG_Z, NEIGHBOR_POS_X, NEIGHBOR_POS_Y, NEIGHBOR_POS_Z,
};
use super::context::MeshingContext;
use super::vertex::TerrainVertex;

/// Нормали граней в порядке сторон соседей: -X,+X,-Y,+Y,-Z,+Z
const FACE_NORMALS: [[i32; 3]; 6] = [
    [-1, 0, 0],
    [1, 0, 0],
    [0, -1, 0],
    [0, 1, 0],
    [0, 0, -1],
    [0, 0, 1],
];

/// Оси грани: [ось нормали, ось U, ось V]
const FACE_AXES: [[usize; 3]; 6] = [
    [0, 2, 1], // X: U вдоль Z, V вдоль Y
    [0, 2, 1],
    [1, 0, 2], // Y: U вдоль X, V вдоль Z
    [1, 0, 2],
    [2, 1, 0], // Z: U вдоль Y, V вдоль X
    [2, 1, 0],
];

/// Тангенты по оси нормали (X, Y, Z)
const FACE_TANGENTS: [[f32; 3]; 3] = [[0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

/// Готовые потоки вершин одного чанка
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub opaque_vertices: Vec<TerrainVertex>,
    pub opaque_indices: Vec<u32>,
    pub water_vertices: Vec<TerrainVertex>,
    pub water_indices: Vec<u32>,
}

impl MeshData {
    #[inline]
    pub fn has_opaque(&self) -> bool {
        !self.opaque_indices.is_empty()
    }

    #[inline]
    pub fn has_water(&self) -> bool {
        !self.water_indices.is_empty()
    }

    /// Число слитых прямоугольников (6 индексов на квад)
    #[inline]
    pub fn opaque_quad_count(&self) -> usize {
        self.opaque_indices.len() / 6
    }

    #[inline]
    pub fn water_quad_count(&self) -> usize {
        self.water_indices.len() / 6
    }
}

/// Снимок сетки чанка и его соседей для мешера.
/// Отсутствующий сосед читается как воздух
pub struct ChunkView {
    center: Arc<BlockArray>,
    neighbors: [Option<Arc<BlockArray>>; NEIGHBOR_COUNT],
}

impl ChunkView {
    pub fn new(center: Arc<BlockArray>, neighbors: [Option<Arc<BlockArray>>; NEIGHBOR_COUNT]) -> Self {
        Self { center, neighbors }
    }

    /// Снимок без соседей, все границы считаются открытыми
    pub fn solo(center: Arc<BlockArray>) -> Self {
        Self { center, neighbors: [None, None, None, None, None, None] }
    }

    /// Блок центрального чанка, вне границ - воздух
    #[inline]
    pub fn get(&self, x: i32, y: i32, z: i32) -> BlockType {
        if in_bounds(x, y, z) {
            self.center[block_index(x, y, z)]
        } else {
            BlockType::Air
        }
    }

    /// Блок с заходом за границу в соседний чанк
    #[inline]
    pub fn get_or_neighbor(&self, x: i32, y: i32, z: i32) -> BlockType {
        if in_bounds(x, y, z) {
            return self.center[block_index(x, y, z)];
        }
        let (side, nx, ny, nz) = if x < 0 {
            (NEIGHBOR_NEG_X, x + CHUNK_SIZE, y, z)
        } else if x >= CHUNK_SIZE {
            (NEIGHBOR_POS_X, x - CHUNK_SIZE, y, z)
        } else if y < 0 {
            (NEIGHBOR_NEG_Y, x, y + CHUNK_SIZE, z)
        } else if y >= CHUNK_SIZE {
            (NEIGHBOR_POS_Y, x, y - CHUNK_SIZE, z)
        } else if z < 0 {
            (NEIGHBOR_NEG_Z, x, y, z + CHUNK_SIZE)
        } else {
            (NEIGHBOR_POS_Z, x, y, z - CHUNK_SIZE)
        };
        match &self.neighbors[side] {
            Some(blocks) if in_bounds(nx, ny, nz) => blocks[block_index(nx, ny, nz)],
            _ => BlockType::Air,
        }
    }
}

#[inline]
const fn in_bounds(x: i32, y: i32, z: i32) -> bool {
    x >= 0 && x < CHUNK_SIZE && y >= 0 && y < CHUNK_SIZE && z >= 0 && z < CHUNK_SIZE
}

/// Видимость грани блока относительно соседнего блока
#[inline]
fn face_visible(block: BlockType, adjacent: BlockType) -> bool {
    adjacent.is_air() || (adjacent.is_transparent() && block.is_opaque())
}

/// Строит меш чанка. None если не вышло ни одной грани
pub fn build_mesh(
    view: &ChunkView,
    layers: &TextureLayerTable,
    ctx: &mut MeshingContext,
) -> Option<MeshData> {
    ctx.clear_output();

    for face in 0..6 {
        let positive = (face & 1) == 1;
        let normal = FACE_NORMALS[face];
        let axes = FACE_AXES[face];

        for d in 0..CHUNK_SIZE {
            // Маска видимых граней этого среза
            ctx.clear_mask();
            let mut any = false;
            for v in 0..CHUNK_SIZE {
                for u in 0..CHUNK_SIZE {
                    let mut pos = [0i32; 3];
                    pos[axes[0]] = d;
                    pos[axes[1]] = u;
                    pos[axes[2]] = v;

                    let block = view.get(pos[0], pos[1], pos[2]);
                    if block.is_air() {
                        continue;
                    }
                    let adjacent = view.get_or_neighbor(
                        pos[0] + normal[0],
                        pos[1] + normal[1],
                        pos[2] + normal[2],
                    );
                    if face_visible(block, adjacent) {
                        ctx.mask[(u + v * CHUNK_SIZE) as usize] = block;
                        any = true;
                    }
                }
            }
            if !any {
                continue;
            }

            greedy_mesh_layer_into(&mut ctx.mask, &mut ctx.greedy_results);

            for &(u, v, width, height, block) in &ctx.greedy_results {
                let (vertices, indices) = if block.is_water() {
                    (&mut ctx.water_vertices, &mut ctx.water_indices)
                } else {
                    (&mut ctx.opaque_vertices, &mut ctx.opaque_indices)
                };
                emit_quad(
                    vertices, indices, layers, block, face, positive, d, u, v, width, height,
                );
            }
        }
    }

    if ctx.opaque_indices.is_empty() && ctx.water_indices.is_empty() {
        None
    } else {
        Some(ctx.take_results())
    }
}

/// Жадно сливает маску среза в прямоугольники.
/// Поглощённые ячейки обнуляются в Air
fn greedy_mesh_layer_into(
    mask: &mut [BlockType],
    results: &mut Vec<(usize, usize, usize, usize, BlockType)>,
) {
    results.clear();
    let size = CHUNK_SIZE as usize;

    for v in 0..size {
        let mut u = 0;
        while u < size {
            let block = mask[u + v * size];
            if block.is_air() {
                u += 1;
                continue;
            }

            // Расширяем по U
            let mut width = 1;
            while u + width < size && mask[u + width + v * size] == block {
                width += 1;
            }

            // Расширяем по V, строка должна совпасть целиком
            let mut height = 1;
            'outer: while v + height < size {
                for du in 0..width {
                    if mask[u + du + (v + height) * size] != block {
                        break 'outer;
                    }
                }
                height += 1;
            }

            // Обнуляем поглощённые ячейки
            for dv in 0..height {
                for du in 0..width {
                    mask[u + du + (v + dv) * size] = BlockType::Air;
                }
            }

            results.push((u, v, width, height, block));
            u += width;
        }
    }
}

/// Добавляет слитый прямоугольник: 4 вершины и 6 индексов
#[inline]
#[allow(clippy::too_many_arguments)]
fn emit_quad(
    vertices: &mut Vec<TerrainVertex>,
    indices: &mut Vec<u32>,
    layers: &TextureLayerTable,
    block: BlockType,
    face: usize,
    positive: bool,
    d: i32,
    u: usize,
    v: usize,
    width: usize,
    height: usize,
) {
    let axes = FACE_AXES[face];
    let n = FACE_NORMALS[face];

    let mut corner = [0.0f32; 3];
    corner[axes[0]] = if positive { (d + 1) as f32 } else { d as f32 };
    corner[axes[1]] = u as f32;
    corner[axes[2]] = v as f32;

    let mut du = [0.0f32; 3];
    du[axes[1]] = width as f32;
    let mut dv = [0.0f32; 3];
    dv[axes[2]] = height as f32;

    let normal = [n[0] as f32, n[1] as f32, n[2] as f32];
    let tangent = FACE_TANGENTS[axes[0]];
    let layer = layers.layer_index_of(block) as f32;

    let w = width as f32;
    let h = height as f32;
    let quad = [
        (corner, [0.0, 0.0]),
        (add3(corner, du), [w, 0.0]),
        (add3(add3(corner, du), dv), [w, h]),
        (add3(corner, dv), [0.0, h]),
    ];

    let base = vertices.len() as u32;
    for (position, uv) in quad {
        vertices.push(TerrainVertex { position, uv, normal, tangent, layer });
    }

    // Обход против часовой стрелки с лицевой стороны
    if positive {
        indices.extend_from_slice(&[base, base + 3, base + 2, base, base + 2, base + 1]);
    } else {
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

#[inline]
fn add3(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::generation::{GeneratorConfig, WorldGenerator};
    use crate::terrain::voxel::{ChunkKey, CHUNK_VOLUME};

    fn empty_grid() -> Box<BlockArray> {
        Box::new([BlockType::Air; CHUNK_VOLUME])
    }

    fn solid_grid(block: BlockType) -> Arc<BlockArray> {
        Arc::from(Box::new([block; CHUNK_VOLUME]))
    }

    fn grid_with(cells: &[((i32, i32, i32), BlockType)]) -> Arc<BlockArray> {
        let mut grid = empty_grid();
        for &((x, y, z), block) in cells {
            grid[block_index(x, y, z)] = block;
        }
        Arc::from(grid)
    }

    /// Сумма площадей квадов по UV третьей вершины каждой четвёрки
    fn quad_area(vertices: &[TerrainVertex]) -> i32 {
        vertices
            .chunks_exact(4)
            .map(|q| (q[2].uv[0] * q[2].uv[1]) as i32)
            .sum()
    }

    /// Наивный подсчёт видимых граней тем же правилом видимости
    fn naive_face_count(view: &ChunkView) -> i32 {
        let mut count = 0;
        for z in 0..CHUNK_SIZE {
            for y in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    let block = view.get(x, y, z);
                    if block.is_air() {
                        continue;
                    }
                    for n in FACE_NORMALS {
                        let adjacent = view.get_or_neighbor(x + n[0], y + n[1], z + n[2]);
                        if face_visible(block, adjacent) {
                            count += 1;
                        }
                    }
                }
            }
        }
        count
    }

    #[test]
    fn test_empty_chunk_yields_none() {
        let view = ChunkView::solo(Arc::from(empty_grid()));
        let mut ctx = MeshingContext::new();
        assert!(build_mesh(&view, &TextureLayerTable::default(), &mut ctx).is_none());
    }

    #[test]
    fn test_isolated_block_has_six_faces() {
        let view = ChunkView::solo(grid_with(&[((8, 8, 8), BlockType::Stone)]));
        let mut ctx = MeshingContext::new();
        let data = build_mesh(&view, &TextureLayerTable::default(), &mut ctx).unwrap();

        assert_eq!(data.opaque_quad_count(), 6);
        assert_eq!(data.opaque_vertices.len(), 24);
        assert_eq!(data.opaque_indices.len(), 36);
        assert!(!data.has_water());
    }

    #[test]
    fn test_enclosed_block_is_hidden() {
        // Куб 3x3x3: внутренний блок не даёт ни одной грани,
        // каждая сторона куба сливается в один квад
        let mut cells = Vec::new();
        for z in 7..=9 {
            for y in 7..=9 {
                for x in 7..=9 {
                    cells.push(((x, y, z), BlockType::Stone));
                }
            }
        }
        let view = ChunkView::solo(grid_with(&cells));
        let mut ctx = MeshingContext::new();
        let data = build_mesh(&view, &TextureLayerTable::default(), &mut ctx).unwrap();

        assert_eq!(data.opaque_quad_count(), 6);
        assert_eq!(quad_area(&data.opaque_vertices), 6 * 9);
    }

    #[test]
    fn test_full_chunk_merges_each_side() {
        let view = ChunkView::solo(solid_grid(BlockType::Stone));
        let mut ctx = MeshingContext::new();
        let data = build_mesh(&view, &TextureLayerTable::default(), &mut ctx).unwrap();

        assert_eq!(data.opaque_quad_count(), 6);
        // Каждая сторона - один квад 16x16
        assert_eq!(data.opaque_vertices[2].uv, [16.0, 16.0]);
        assert_eq!(quad_area(&data.opaque_vertices), 6 * 256);
    }

    #[test]
    fn test_solid_neighbor_culls_boundary_faces() {
        let center = solid_grid(BlockType::Stone);
        let mut neighbors: [Option<Arc<BlockArray>>; NEIGHBOR_COUNT] = Default::default();
        neighbors[NEIGHBOR_POS_X] = Some(solid_grid(BlockType::Stone));

        let view = ChunkView::new(center.clone(), neighbors);
        let mut ctx = MeshingContext::new();
        let data = build_mesh(&view, &TextureLayerTable::default(), &mut ctx).unwrap();
        // Грань +X закрыта соседом, остальные пять на месте
        assert_eq!(data.opaque_quad_count(), 5);

        // Полное окружение - меша нет вовсе
        let all = [
            Some(solid_grid(BlockType::Stone)),
            Some(solid_grid(BlockType::Stone)),
            Some(solid_grid(BlockType::Stone)),
            Some(solid_grid(BlockType::Stone)),
            Some(solid_grid(BlockType::Stone)),
            Some(solid_grid(BlockType::Stone)),
        ];
        let view = ChunkView::new(center, all);
        assert!(build_mesh(&view, &TextureLayerTable::default(), &mut ctx).is_none());
    }

    #[test]
    fn test_carving_one_block_adds_inner_faces() {
        let mut grid = Box::new([BlockType::Stone; CHUNK_VOLUME]);
        grid[block_index(8, 8, 8)] = BlockType::Air;
        let view = ChunkView::solo(Arc::from(grid));
        let mut ctx = MeshingContext::new();
        let data = build_mesh(&view, &TextureLayerTable::default(), &mut ctx).unwrap();

        // 6 внешних сторон плюс 6 граней полости 1x1
        assert_eq!(data.opaque_quad_count(), 12);
        assert_eq!(quad_area(&data.opaque_vertices), 6 * 256 + 6);
    }

    #[test]
    fn test_water_goes_to_separate_stream() {
        let view = ChunkView::solo(grid_with(&[
            ((8, 7, 8), BlockType::Stone),
            ((8, 8, 8), BlockType::Water),
        ]));
        let mut ctx = MeshingContext::new();
        let data = build_mesh(&view, &TextureLayerTable::default(), &mut ctx).unwrap();

        // Камень виден со всех шести сторон, в том числе под водой
        assert_eq!(data.opaque_quad_count(), 6);
        // Вода: верх и четыре бока, грань к камню скрыта
        assert_eq!(data.water_quad_count(), 5);
    }

    #[test]
    fn test_lava_is_solid_and_opaque() {
        // Лава в отличие от воды непрозрачна: стык камень-лава
        // скрыт с обеих сторон, водный поток пуст
        let view = ChunkView::solo(grid_with(&[
            ((8, 8, 8), BlockType::Stone),
            ((9, 8, 8), BlockType::Lava),
        ]));
        let mut ctx = MeshingContext::new();
        let data = build_mesh(&view, &TextureLayerTable::default(), &mut ctx).unwrap();

        // По 5 граней на блок, разные типы не сливаются
        assert_eq!(data.opaque_quad_count(), 10);
        assert!(!data.has_water());
        assert!(BlockType::Lava.is_solid());
    }

    #[test]
    fn test_transparent_same_type_faces_culled() {
        // Столб воды: внутренние грани между водой не выпускаются
        let view = ChunkView::solo(grid_with(&[
            ((8, 6, 8), BlockType::Water),
            ((8, 7, 8), BlockType::Water),
            ((8, 8, 8), BlockType::Water),
        ]));
        let mut ctx = MeshingContext::new();
        let data = build_mesh(&view, &TextureLayerTable::default(), &mut ctx).unwrap();

        assert!(!data.has_opaque());
        // 3 блока по 6 граней минус 4 внутренних = 14 ячеек,
        // боковые грани столба сливаются вертикально
        assert_eq!(quad_area(&data.water_vertices), 14);
        assert_eq!(data.water_quad_count(), 6);
    }

    #[test]
    fn test_greedy_area_matches_naive_count() {
        let generator = WorldGenerator::new(42, GeneratorConfig::default());
        let generated = generator.generate(ChunkKey::new(0, 1, 0));
        let view = ChunkView::solo(generated.blocks);

        let mut ctx = MeshingContext::new();
        let data = build_mesh(&view, &TextureLayerTable::default(), &mut ctx)
            .expect("рельефный чанк не может быть пустым");

        let merged = quad_area(&data.opaque_vertices) + quad_area(&data.water_vertices);
        assert_eq!(merged, naive_face_count(&view));
        assert!(data.has_opaque());
    }

    #[test]
    fn test_ground_chunk_opaque_without_water() {
        let generator = WorldGenerator::new(42, GeneratorConfig::default());
        let generated = generator.generate(ChunkKey::new(0, 0, 0));
        let view = ChunkView::solo(generated.blocks);

        let mut ctx = MeshingContext::new();
        let data = build_mesh(&view, &TextureLayerTable::default(), &mut ctx)
            .expect("приземный чанк не может быть пустым");
        assert!(data.has_opaque());

        // Вода попадает в этот чанк только при рельефе ниже его крыши
        let mut min_height = i32::MAX;
        for z in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                let biome = generator.biome_at(x, z);
                min_height = min_height.min(generator.terrain_height(x, z, biome));
            }
        }
        if min_height >= CHUNK_SIZE {
            assert!(!data.has_water());
        }
    }

    #[test]
    fn test_quad_attributes() {
        let view = ChunkView::solo(grid_with(&[((8, 8, 8), BlockType::Stone)]));
        let mut ctx = MeshingContext::new();
        let layers = TextureLayerTable::default();
        let data = build_mesh(&view, &layers, &mut ctx).unwrap();

        // Первый квад - грань -X: срез x=8, нормаль (-1,0,0), тангент (0,0,1)
        let first = &data.opaque_vertices[0..4];
        assert!(first.iter().all(|vx| vx.position[0] == 8.0));
        assert!(first.iter().all(|vx| vx.normal == [-1.0, 0.0, 0.0]));
        assert!(first.iter().all(|vx| vx.tangent == [0.0, 0.0, 1.0]));
        let expected_layer = layers.layer_index_of(BlockType::Stone) as f32;
        assert!(first.iter().all(|vx| vx.layer == expected_layer));
        // Отрицательная грань: обход (0,1,2),(0,2,3)
        assert_eq!(&data.opaque_indices[0..6], &[0, 1, 2, 0, 2, 3]);

        // Второй квад - грань +X: срез x=9, обход (0,3,2),(0,2,1)
        let second = &data.opaque_vertices[4..8];
        assert!(second.iter().all(|vx| vx.position[0] == 9.0));
        assert!(second.iter().all(|vx| vx.normal == [1.0, 0.0, 0.0]));
        assert_eq!(&data.opaque_indices[6..12], &[4, 7, 6, 4, 6, 5]);
    }

    #[test]
    fn test_two_blocks_merge_into_one_quad_per_side() {
        // Два камня рядом по X: верхние грани сливаются в 1x... квад
        let view = ChunkView::solo(grid_with(&[
            ((8, 8, 8), BlockType::Stone),
            ((9, 8, 8), BlockType::Stone),
        ]));
        let mut ctx = MeshingContext::new();
        let data = build_mesh(&view, &TextureLayerTable::default(), &mut ctx).unwrap();

        // Наивно 12 граней минус 2 внутренних = 10 видимых ячеек,
        // слияние даёт по одному кваду на сторону: 2 торца + 4 длинных
        assert_eq!(data.opaque_quad_count(), 6);
        assert_eq!(quad_area(&data.opaque_vertices), 10);
    }
}
