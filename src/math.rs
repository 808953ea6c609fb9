// ============================================
// Math - Геометрические примитивы
// ============================================

use ultraviolet::Vec3;

/// Axis-aligned bounding box в мировых координатах
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[inline]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// AABB единичного блока по целочисленным координатам
    #[inline]
    pub fn unit_block(x: i32, y: i32, z: i32) -> Self {
        let min = Vec3::new(x as f32, y as f32, z as f32);
        Self {
            min,
            max: min + Vec3::new(1.0, 1.0, 1.0),
        }
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }
}

/// Шесть плоскостей frustum из view-projection матрицы.
/// Каждая плоскость: (nx, ny, nz, d) где nx*x + ny*y + nz*z + d >= 0 означает "внутри"
#[derive(Clone, Copy, Debug)]
pub struct FrustumPlanes {
    planes: [[f32; 4]; 6],
}

impl FrustumPlanes {
    /// Извлекает 6 плоскостей из view-projection матрицы
    pub fn from_view_proj(vp: &[[f32; 4]; 4]) -> Self {
        let m = vp;
        let planes = [
            // Left:   row3 + row0
            [m[0][3] + m[0][0], m[1][3] + m[1][0], m[2][3] + m[2][0], m[3][3] + m[3][0]],
            // Right:  row3 - row0
            [m[0][3] - m[0][0], m[1][3] - m[1][0], m[2][3] - m[2][0], m[3][3] - m[3][0]],
            // Bottom: row3 + row1
            [m[0][3] + m[0][1], m[1][3] + m[1][1], m[2][3] + m[2][1], m[3][3] + m[3][1]],
            // Top:    row3 - row1
            [m[0][3] - m[0][1], m[1][3] - m[1][1], m[2][3] - m[2][1], m[3][3] - m[3][1]],
            // Near:   row3 + row2
            [m[0][3] + m[0][2], m[1][3] + m[1][2], m[2][3] + m[2][2], m[3][3] + m[3][2]],
            // Far:    row3 - row2
            [m[0][3] - m[0][2], m[1][3] - m[1][2], m[2][3] - m[2][2], m[3][3] - m[3][2]],
        ];
        Self { planes }
    }

    /// Проверяет, находится ли AABB полностью снаружи плоскости
    #[inline]
    fn is_outside_plane(plane: &[f32; 4], aabb: &Aabb) -> bool {
        let px = if plane[0] >= 0.0 { aabb.max.x } else { aabb.min.x };
        let py = if plane[1] >= 0.0 { aabb.max.y } else { aabb.min.y };
        let pz = if plane[2] >= 0.0 { aabb.max.z } else { aabb.min.z };

        plane[0] * px + plane[1] * py + plane[2] * pz + plane[3] < 0.0
    }

    /// Frustum culling: видим ли AABB
    pub fn contains(&self, aabb: &Aabb) -> bool {
        for plane in &self.planes {
            if Self::is_outside_plane(plane, aabb) {
                return false;
            }
        }
        true
    }
}
