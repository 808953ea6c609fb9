// ============================================
// World Queries - Блоки, коллизии, рейкаст
// ============================================
//
// Запросы к миру в мировых координатах. Всё, что лежит вне
// загруженных чанков, читается как воздух.

use ultraviolet::Vec3;

use crate::blocks::BlockType;
use crate::math::Aabb;
use crate::terrain::gpu::ChunkMeshBackend;
use crate::terrain::voxel::{ChunkKey, CHUNK_SIZE};
use super::manager::ChunkManager;

/// Попадание луча в блок
#[derive(Clone, Copy, Debug)]
pub struct RaycastHit {
    pub block_x: i32,
    pub block_y: i32,
    pub block_z: i32,
    pub block: BlockType,
    pub hit_pos: Vec3,
    /// Нормаль пересечённой грани; ноль, если луч начался внутри блока
    pub normal: Vec3,
    pub distance: f32,
}

impl<B: ChunkMeshBackend> ChunkManager<B> {
    /// Блок по мировым координатам
    pub fn get_block_at(&self, wx: i32, wy: i32, wz: i32) -> BlockType {
        let key = ChunkKey::new(
            wx.div_euclid(CHUNK_SIZE),
            wy.div_euclid(CHUNK_SIZE),
            wz.div_euclid(CHUNK_SIZE),
        );
        match self.chunks.get(&key.pack()) {
            Some(chunk) => chunk.get(
                wx.rem_euclid(CHUNK_SIZE),
                wy.rem_euclid(CHUNK_SIZE),
                wz.rem_euclid(CHUNK_SIZE),
            ),
            None => BlockType::Air,
        }
    }

    /// Ставит блок и возвращает true, если сетка изменилась.
    /// Правка на грани чанка перестраивает и соседний меш
    pub fn set_block_at(&mut self, wx: i32, wy: i32, wz: i32, block: BlockType) -> bool {
        let (cx, cy, cz) = (
            wx.div_euclid(CHUNK_SIZE),
            wy.div_euclid(CHUNK_SIZE),
            wz.div_euclid(CHUNK_SIZE),
        );
        let (lx, ly, lz) = (
            wx.rem_euclid(CHUNK_SIZE),
            wy.rem_euclid(CHUNK_SIZE),
            wz.rem_euclid(CHUNK_SIZE),
        );
        let packed = ChunkKey::new(cx, cy, cz).pack();

        let changed = match self.chunks.get_mut(&packed) {
            Some(chunk) => chunk.set_block(lx, ly, lz, block),
            None => false,
        };
        if !changed {
            return false;
        }
        self.schedule_remesh(packed);

        if lx == 0 {
            self.remesh_at(cx - 1, cy, cz);
        } else if lx == CHUNK_SIZE - 1 {
            self.remesh_at(cx + 1, cy, cz);
        }
        if ly == 0 {
            self.remesh_at(cx, cy - 1, cz);
        } else if ly == CHUNK_SIZE - 1 {
            self.remesh_at(cx, cy + 1, cz);
        }
        if lz == 0 {
            self.remesh_at(cx, cy, cz - 1);
        } else if lz == CHUNK_SIZE - 1 {
            self.remesh_at(cx, cy, cz + 1);
        }
        true
    }

    fn remesh_at(&mut self, cx: i32, cy: i32, cz: i32) {
        self.schedule_remesh(ChunkKey::new(cx, cy, cz).pack());
    }

    /// Пересекает ли AABB хоть один твёрдый блок.
    /// Касание по целой границе тоже считается пересечением
    pub fn has_collision(&self, aabb: &Aabb) -> bool {
        let (min, max) = block_range(aabb);
        for by in min.1..=max.1 {
            for bz in min.2..=max.2 {
                for bx in min.0..=max.0 {
                    if self.get_block_at(bx, by, bz).is_solid() {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Твёрдые блоки в объёме AABB единичными боксами
    pub fn collision_boxes(&self, aabb: &Aabb) -> Vec<Aabb> {
        let (min, max) = block_range(aabb);
        let mut boxes = Vec::new();
        for by in min.1..=max.1 {
            for bz in min.2..=max.2 {
                for bx in min.0..=max.0 {
                    if self.get_block_at(bx, by, bz).is_solid() {
                        boxes.push(Aabb::unit_block(bx, by, bz));
                    }
                }
            }
        }
        boxes
    }

    /// Шагает по сетке блоков (DDA) до первого твёрдого блока.
    /// Дистанция в длинах направляющего вектора единичной длины
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit> {
        let len = direction.mag();
        if len < 1e-8 {
            return None;
        }
        let dir = direction / len;

        let mut bx = origin.x.floor() as i32;
        let mut by = origin.y.floor() as i32;
        let mut bz = origin.z.floor() as i32;

        // Старт внутри твёрдого блока
        let start = self.get_block_at(bx, by, bz);
        if start.is_solid() {
            return Some(RaycastHit {
                block_x: bx,
                block_y: by,
                block_z: bz,
                block: start,
                hit_pos: origin,
                normal: Vec3::zero(),
                distance: 0.0,
            });
        }

        let step_x = axis_step(dir.x);
        let step_y = axis_step(dir.y);
        let step_z = axis_step(dir.z);

        let t_delta_x = axis_t_delta(dir.x);
        let t_delta_y = axis_t_delta(dir.y);
        let t_delta_z = axis_t_delta(dir.z);

        let mut t_max_x = axis_t_max(origin.x, dir.x, bx, step_x);
        let mut t_max_y = axis_t_max(origin.y, dir.y, by, step_y);
        let mut t_max_z = axis_t_max(origin.z, dir.z, bz, step_z);

        loop {
            let t;
            let normal;
            if t_max_x <= t_max_y && t_max_x <= t_max_z {
                bx += step_x;
                t = t_max_x;
                t_max_x += t_delta_x;
                normal = Vec3::new(-step_x as f32, 0.0, 0.0);
            } else if t_max_y <= t_max_z {
                by += step_y;
                t = t_max_y;
                t_max_y += t_delta_y;
                normal = Vec3::new(0.0, -step_y as f32, 0.0);
            } else {
                bz += step_z;
                t = t_max_z;
                t_max_z += t_delta_z;
                normal = Vec3::new(0.0, 0.0, -step_z as f32);
            }

            if t > max_distance {
                return None;
            }

            let block = self.get_block_at(bx, by, bz);
            if block.is_solid() {
                return Some(RaycastHit {
                    block_x: bx,
                    block_y: by,
                    block_z: bz,
                    block,
                    hit_pos: origin + dir * t,
                    normal,
                    distance: t,
                });
            }
        }
    }
}

/// Диапазон блоков, накрываемый AABB, включая обе границы
#[inline]
fn block_range(aabb: &Aabb) -> ((i32, i32, i32), (i32, i32, i32)) {
    (
        (
            aabb.min.x.floor() as i32,
            aabb.min.y.floor() as i32,
            aabb.min.z.floor() as i32,
        ),
        (
            aabb.max.x.floor() as i32,
            aabb.max.y.floor() as i32,
            aabb.max.z.floor() as i32,
        ),
    )
}

#[inline]
fn axis_step(d: f32) -> i32 {
    if d > 0.0 {
        1
    } else if d < 0.0 {
        -1
    } else {
        0
    }
}

#[inline]
fn axis_t_delta(d: f32) -> f32 {
    if d != 0.0 {
        (1.0 / d).abs()
    } else {
        f32::INFINITY
    }
}

/// Параметр луча до ближайшей границы клетки по одной оси
#[inline]
fn axis_t_max(origin: f32, dir: f32, cell: i32, step: i32) -> f32 {
    if step > 0 {
        (cell as f32 + 1.0 - origin) / dir
    } else if step < 0 {
        (cell as f32 - origin) / dir
    } else {
        f32::INFINITY
    }
}
