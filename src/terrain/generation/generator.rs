// ============================================
// World Generator - Процедурный рельеф
// ============================================
//
// Детерминированный генератор: (seed, координаты чанка) всегда
// дают одну и ту же сетку. План колонки: высота из двух fBm
// полей, поверхность по биому, пещеры 3D шумом, руды в глубине,
// деревья вторым проходом по области с запасом на кроны.

use std::sync::Arc;

use super::config::GeneratorConfig;
use super::noise::SimplexNoise;
use super::trees::{self, ChunkWriter};
use crate::biomes::{Biome, ClimateMap};
use crate::blocks::BlockType;
use crate::terrain::voxel::{block_index, BlockArray, ChunkKey, CHUNK_SIZE, CHUNK_VOLUME};

/// Уровень моря в мировых координатах
pub const SEA_LEVEL: i32 = 32;
/// Базовая отметка рельефа, к которой прибавляется шум
const BASE_HEIGHT: i32 = 28;
/// Выше этой отметки поверхность засыпана снегом
pub const SNOW_LEVEL: i32 = 55;

// Основное поле высот
const HEIGHT_OCTAVES: u32 = 5;
const HEIGHT_PERSISTENCE: f64 = 0.5;
const HEIGHT_SCALE: f64 = 0.008;

// Мелкие холмы и долины
const DETAIL_OCTAVES: u32 = 3;
const DETAIL_PERSISTENCE: f64 = 0.4;
const DETAIL_SCALE: f64 = 0.03;
const DETAIL_OFFSET: f64 = 1000.0;
const DETAIL_AMPLITUDE: f64 = 6.0;

// Рудные жилы в глубине
const ORE_SCALE: f64 = 0.1;
const ORE_GOLD_THRESHOLD: f64 = 0.75;
const ORE_IRON_THRESHOLD: f64 = 0.65;

// Мох на лесной подстилке
const MOSS_SCALE: f64 = 0.1;
const MOSS_THRESHOLD: f64 = 0.5;

/// Результат генерации одного чанка
pub struct GeneratedChunk {
    pub blocks: Arc<BlockArray>,
    pub non_air: u32,
}

/// Генератор мира. После создания только читается, поэтому его
/// можно разделять между воркерами через Arc
pub struct WorldGenerator {
    seed: u64,
    noise: SimplexNoise,
    climate: ClimateMap,
    config: GeneratorConfig,
}

impl WorldGenerator {
    pub fn new(seed: u64, config: GeneratorConfig) -> Self {
        Self {
            seed,
            noise: SimplexNoise::new(seed),
            climate: ClimateMap::new(seed),
            config,
        }
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Биом мировой колонки
    #[inline]
    pub fn biome_at(&self, wx: i32, wz: i32) -> Biome {
        self.climate.biome_at(wx as f64, wz as f64)
    }

    /// Высота рельефа в мировой колонке
    pub fn terrain_height(&self, wx: i32, wz: i32, biome: Biome) -> i32 {
        let height = self.noise.fbm2(
            wx as f64,
            wz as f64,
            HEIGHT_OCTAVES,
            HEIGHT_PERSISTENCE,
            HEIGHT_SCALE,
        );
        let detail = self.noise.fbm2(
            wx as f64 + DETAIL_OFFSET,
            wz as f64 + DETAIL_OFFSET,
            DETAIL_OCTAVES,
            DETAIL_PERSISTENCE,
            DETAIL_SCALE,
        );
        BASE_HEIGHT + (height * biome.height_range() * 0.5 + detail * DETAIL_AMPLITUDE) as i32
    }

    /// Генерирует сетку блоков чанка
    pub fn generate(&self, key: ChunkKey) -> GeneratedChunk {
        let world_x = key.x * CHUNK_SIZE;
        let world_y = key.y * CHUNK_SIZE;
        let world_z = key.z * CHUNK_SIZE;

        let mut blocks: Box<BlockArray> = Box::new([BlockType::Air; CHUNK_VOLUME]);

        // Первый проход: рельеф по колонкам
        for lx in 0..CHUNK_SIZE {
            for lz in 0..CHUNK_SIZE {
                let wx = world_x + lx;
                let wz = world_z + lz;
                let biome = self.biome_at(wx, wz);
                let terrain_height = self.terrain_height(wx, wz, biome);

                for ly in 0..CHUNK_SIZE {
                    let wy = world_y + ly;
                    let block = self.block_at(wx, wy, wz, terrain_height, biome);
                    if !block.is_air() {
                        blocks[block_index(lx, ly, lz)] = block;
                    }
                }
            }
        }

        // Второй проход: деревья, включая стволы из соседних колонок
        self.place_trees(&mut blocks, world_x, world_y, world_z);

        let non_air = blocks.iter().filter(|b| !b.is_air()).count() as u32;
        GeneratedChunk {
            blocks: Arc::from(blocks),
            non_air,
        }
    }

    /// Тип блока в мировой позиции при известной высоте колонки
    fn block_at(&self, wx: i32, wy: i32, wz: i32, terrain_height: i32, biome: Biome) -> BlockType {
        if wy > terrain_height {
            // Над рельефом: вода до уровня моря, выше воздух
            if wy <= SEA_LEVEL {
                if biome == Biome::Desert {
                    return BlockType::Air;
                }
                if biome == Biome::Tundra && wy == SEA_LEVEL {
                    // Замёрзшая поверхность воды
                    return BlockType::Marble;
                }
                return BlockType::Water;
            }
            return BlockType::Air;
        }

        let depth = terrain_height - wy;

        // Пещеры не трогают дно мира и кромку поверхности
        if wy > 2 && wy < terrain_height - 1 {
            let scale = self.config.caves.scale;
            let cave = self
                .noise
                .noise3(wx as f64 * scale, wy as f64 * scale, wz as f64 * scale)
                .abs();
            if cave > self.config.caves.threshold {
                return BlockType::Air;
            }
        }

        if depth == 0 {
            return self.surface_block(wx, wy, wz, terrain_height, biome);
        }

        if depth <= 3 {
            return self.subsurface_block(wy, terrain_height, biome);
        }

        if depth > 20 {
            let ore = self.noise.noise3(
                wx as f64 * ORE_SCALE,
                wy as f64 * ORE_SCALE,
                wz as f64 * ORE_SCALE,
            );
            if ore > ORE_GOLD_THRESHOLD {
                return BlockType::Gold;
            }
            if ore > ORE_IRON_THRESHOLD {
                return BlockType::Iron;
            }
        }

        BlockType::Stone
    }

    /// Песчаный пляж: и сама колонка, и позиция у кромки воды
    #[inline]
    fn is_beach(wy: i32, terrain_height: i32) -> bool {
        wy <= SEA_LEVEL + 2 && terrain_height <= SEA_LEVEL + 3
    }

    fn surface_block(
        &self,
        wx: i32,
        wy: i32,
        wz: i32,
        terrain_height: i32,
        biome: Biome,
    ) -> BlockType {
        match biome {
            Biome::Plains => {
                if wy >= SNOW_LEVEL {
                    BlockType::Snow
                } else if Self::is_beach(wy, terrain_height) {
                    BlockType::Sand
                } else {
                    BlockType::Grass
                }
            }
            Biome::Forest => {
                if wy >= SNOW_LEVEL {
                    BlockType::Snow
                } else if Self::is_beach(wy, terrain_height) {
                    BlockType::Sand
                } else {
                    let moss = self
                        .noise
                        .noise2(wx as f64 * MOSS_SCALE, wz as f64 * MOSS_SCALE);
                    if moss > MOSS_THRESHOLD {
                        BlockType::Moss
                    } else {
                        BlockType::Grass
                    }
                }
            }
            Biome::Desert => BlockType::Sand,
            Biome::Tundra => BlockType::Snow,
        }
    }

    fn subsurface_block(&self, wy: i32, terrain_height: i32, biome: Biome) -> BlockType {
        match biome {
            Biome::Plains | Biome::Forest => {
                if Self::is_beach(wy, terrain_height) {
                    BlockType::Sand
                } else {
                    BlockType::Dirt
                }
            }
            Biome::Desert => BlockType::Sand,
            Biome::Tundra => BlockType::Dirt,
        }
    }

    /// Второй проход: сканирует область чанка с запасом и ставит
    /// все деревья, чьи блоки попадают в этот чанк
    fn place_trees(&self, blocks: &mut BlockArray, world_x: i32, world_y: i32, world_z: i32) {
        let tree_params = self.config.trees;
        let margin = tree_params.check_radius + tree_params.canopy_radius;
        let mut writer = ChunkWriter::new(blocks, world_x, world_y, world_z);

        for tx in (world_x - margin)..(world_x + CHUNK_SIZE + margin) {
            for tz in (world_z - margin)..(world_z + CHUNK_SIZE + margin) {
                if !trees::is_tree_position(tx, tz) {
                    continue;
                }

                let biome = self.biome_at(tx, tz);
                if !biome.supports_trees() {
                    continue;
                }
                if !trees::passes_density(tx, tz, tree_params.density_threshold(biome)) {
                    continue;
                }

                let terrain_height = self.terrain_height(tx, tz, biome);
                // Деревья не растут под водой и на снежных вершинах
                if terrain_height <= SEA_LEVEL || terrain_height >= SNOW_LEVEL {
                    continue;
                }
                if self.surface_block(tx, terrain_height, tz, terrain_height, biome)
                    == BlockType::Sand
                {
                    continue;
                }

                let trunk_height = trees::trunk_height(tx, tz, &tree_params);
                trees::place_tree(
                    &mut writer,
                    tx,
                    terrain_height + 1,
                    tz,
                    trunk_height,
                    tree_params.canopy_radius,
                    biome.canopy_block(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(seed: u64) -> WorldGenerator {
        WorldGenerator::new(seed, GeneratorConfig::default())
    }

    #[test]
    fn test_generation_deterministic() {
        let a = generator(42);
        let b = generator(42);
        for key in [
            ChunkKey::new(0, 0, 0),
            ChunkKey::new(3, 2, -5),
            ChunkKey::new(-7, 1, 4),
        ] {
            let ga = a.generate(key);
            let gb = b.generate(key);
            assert_eq!(ga.non_air, gb.non_air);
            assert!(ga.blocks.iter().eq(gb.blocks.iter()), "grids differ at {key:?}");
        }
    }

    #[test]
    fn test_origin_chunk_bottom_layers_are_solid() {
        // Пещеры начинаются строго выше wy=2, рельеф не опускается
        // ниже wy=14, поэтому нижние три слоя всегда заполнены
        let gen = generator(42);
        let chunk = gen.generate(ChunkKey::new(0, 0, 0));
        for y in 0..3 {
            for x in 0..CHUNK_SIZE {
                for z in 0..CHUNK_SIZE {
                    assert!(
                        !chunk.blocks[block_index(x, y, z)].is_air(),
                        "air at ({x}, {y}, {z})"
                    );
                }
            }
        }
        assert!(chunk.non_air >= 3 * 16 * 16);
    }

    #[test]
    fn test_high_altitude_chunk_is_empty() {
        // Максимум рельефа 28 + 17.5 + 6 < 96, деревья ниже снеговой
        // линии, поэтому чанк y=6 гарантированно пуст
        let gen = generator(42);
        let chunk = gen.generate(ChunkKey::new(0, 6, 0));
        assert_eq!(chunk.non_air, 0);
        assert!(chunk.blocks.iter().all(|b| b.is_air()));
    }

    #[test]
    fn test_desert_has_no_water_above_terrain() {
        let mut checked = 0;
        for seed in 0..8u64 {
            let gen = generator(seed);
            for wx in (-512..512).step_by(16) {
                for wz in (-512..512).step_by(16) {
                    let biome = gen.biome_at(wx, wz);
                    if biome != Biome::Desert {
                        continue;
                    }
                    let th = gen.terrain_height(wx, wz, biome);
                    for wy in (th + 1)..=SEA_LEVEL {
                        assert_eq!(
                            gen.block_at(wx, wy, wz, th, biome),
                            BlockType::Air,
                            "water in desert at ({wx}, {wy}, {wz})"
                        );
                        checked += 1;
                    }
                }
            }
        }
        assert!(checked > 0, "no submerged desert columns sampled");
    }

    #[test]
    fn test_tundra_sea_is_frozen() {
        let mut checked = 0;
        for seed in 0..8u64 {
            let gen = generator(seed);
            for wx in (-512..512).step_by(16) {
                for wz in (-512..512).step_by(16) {
                    let biome = gen.biome_at(wx, wz);
                    if biome != Biome::Tundra {
                        continue;
                    }
                    let th = gen.terrain_height(wx, wz, biome);
                    if th >= SEA_LEVEL {
                        continue;
                    }
                    // Лёд ровно на уровне моря, вода под ним
                    assert_eq!(
                        gen.block_at(wx, SEA_LEVEL, wz, th, biome),
                        BlockType::Marble
                    );
                    if th + 1 < SEA_LEVEL {
                        assert_eq!(
                            gen.block_at(wx, SEA_LEVEL - 1, wz, th, biome),
                            BlockType::Water
                        );
                    }
                    checked += 1;
                }
            }
        }
        assert!(checked > 0, "no submerged tundra columns sampled");
    }

    #[test]
    fn test_tree_canopy_crosses_chunk_boundary() {
        // Ищем дерево у восточной границы чанка и проверяем, что
        // сосед, сгенерированный независимо, получил блоки кроны
        let mut found = false;
        'seeds: for seed in 0..24u64 {
            let gen = generator(seed);
            for tx in 0..256i32 {
                if tx.rem_euclid(16) < 14 {
                    continue;
                }
                for tz in 0..256 {
                    if !trees::is_tree_position(tx, tz) {
                        continue;
                    }
                    let biome = gen.biome_at(tx, tz);
                    if !biome.supports_trees() {
                        continue;
                    }
                    if !trees::passes_density(
                        tx,
                        tz,
                        gen.config.trees.density_threshold(biome),
                    ) {
                        continue;
                    }
                    let th = gen.terrain_height(tx, tz, biome);
                    if th <= SEA_LEVEL || th >= SNOW_LEVEL {
                        continue;
                    }
                    if gen.surface_block(tx, th, tz, th, biome) == BlockType::Sand {
                        continue;
                    }

                    // Клетка кроны на полном радиусе, в соседнем чанке
                    let trunk_h = trees::trunk_height(tx, tz, &gen.config.trees);
                    let base_y = th + 1;
                    let cy = base_y + trunk_h - 1;
                    let cx = tx + 2;
                    let cz = tz;
                    assert_ne!(cx.div_euclid(16), tx.div_euclid(16));

                    // Клетка должна быть свободна от рельефа, иначе
                    // крона в неё легально не пишется
                    let nb = gen.biome_at(cx, cz);
                    let nh = gen.terrain_height(cx, cz, nb);
                    let base_block = gen.block_at(cx, cy, cz, nh, nb);
                    if !(base_block.is_air() || base_block == BlockType::Water) {
                        continue;
                    }

                    let neighbor_key = ChunkKey::new(
                        cx.div_euclid(16),
                        cy.div_euclid(16),
                        cz.div_euclid(16),
                    );
                    let neighbor = gen.generate(neighbor_key);
                    let got = neighbor.blocks[block_index(
                        cx.rem_euclid(16),
                        cy.rem_euclid(16),
                        cz.rem_euclid(16),
                    )];
                    // Клетку могло раньше занять соседнее дерево, но
                    // пустой она остаться не может
                    assert!(
                        matches!(got, BlockType::Leaves | BlockType::Snow | BlockType::Log),
                        "canopy missing across boundary at ({cx}, {cy}, {cz}): {got:?}"
                    );

                    // Чанк со стволом тоже содержит дерево
                    let trunk_key = ChunkKey::new(
                        tx.div_euclid(16),
                        base_y.div_euclid(16),
                        tz.div_euclid(16),
                    );
                    let trunk_chunk = gen.generate(trunk_key);
                    let trunk_block = trunk_chunk.blocks[block_index(
                        tx.rem_euclid(16),
                        base_y.rem_euclid(16),
                        tz.rem_euclid(16),
                    )];
                    assert!(!trunk_block.is_air());

                    found = true;
                    break 'seeds;
                }
            }
        }
        assert!(found, "no boundary tree located in sampled area");
    }

    #[test]
    fn test_tree_pass_only_adds_blocks() {
        // Деревья пишут только в воздух и воду, рельеф не трогают
        let gen = generator(7);
        let key = ChunkKey::new(1, 2, 1);
        let with_trees = gen.generate(key);

        let world_x = key.x * CHUNK_SIZE;
        let world_y = key.y * CHUNK_SIZE;
        let world_z = key.z * CHUNK_SIZE;
        for lx in 0..CHUNK_SIZE {
            for lz in 0..CHUNK_SIZE {
                let wx = world_x + lx;
                let wz = world_z + lz;
                let biome = gen.biome_at(wx, wz);
                let th = gen.terrain_height(wx, wz, biome);
                for ly in 0..CHUNK_SIZE {
                    let wy = world_y + ly;
                    let base = gen.block_at(wx, wy, wz, th, biome);
                    let got = with_trees.blocks[block_index(lx, ly, lz)];
                    if !base.is_air() && base != BlockType::Water {
                        assert_eq!(got, base, "terrain overwritten at ({wx}, {wy}, {wz})");
                    }
                }
            }
        }
    }
}
