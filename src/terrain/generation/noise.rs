// ============================================
// Simplex Noise - Детерминированный шум
// ============================================
//
// Градиентный simplex шум (2D/3D) с fBm-наложением октав.
// Таблицы перестановок строятся один раз из seed и дальше
// только читаются, поэтому экземпляр можно разделять между
// потоками без блокировок.

/// Градиенты рёбер куба для 2D/3D шума
const GRAD3: [[f64; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

// Константы скоса simplex-решётки
const F2: f64 = 0.366_025_403_784_438_6; // 0.5 * (sqrt(3) - 1)
const G2: f64 = 0.211_324_865_405_187_1; // (3 - sqrt(3)) / 6
const F3: f64 = 1.0 / 3.0;
const G3: f64 = 1.0 / 6.0;

/// PRNG для рассеивания seed в таблицу перестановок
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

/// Seeded simplex шум с собственными таблицами перестановок
pub struct SimplexNoise {
    perm: [u8; 512],
    perm_mod12: [u8; 512],
}

impl SimplexNoise {
    /// Строит таблицы перестановок из seed (Fisher-Yates поверх SplitMix64)
    pub fn new(seed: u64) -> Self {
        let mut p: [u8; 256] = [0; 256];
        for (i, v) in p.iter_mut().enumerate() {
            *v = i as u8;
        }

        let mut rng = SplitMix64::new(seed);
        for i in (1..256usize).rev() {
            let j = (rng.next() % (i as u64 + 1)) as usize;
            p.swap(i, j);
        }

        let mut perm = [0u8; 512];
        let mut perm_mod12 = [0u8; 512];
        for i in 0..512 {
            perm[i] = p[i & 255];
            perm_mod12[i] = perm[i] % 12;
        }

        Self { perm, perm_mod12 }
    }

    /// 2D шум, диапазон примерно [-1, 1]
    pub fn noise2(&self, xin: f64, yin: f64) -> f64 {
        // Скос в координаты simplex-решётки
        let s = (xin + yin) * F2;
        let i = fast_floor(xin + s);
        let j = fast_floor(yin + s);

        let t = (i + j) as f64 * G2;
        let x0 = xin - (i as f64 - t);
        let y0 = yin - (j as f64 - t);

        // Порядок обхода вершин симплекса (нижний или верхний треугольник)
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - i1 as f64 + G2;
        let y1 = y0 - j1 as f64 + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let gi0 = self.perm_mod12[ii + self.perm[jj] as usize] as usize;
        let gi1 = self.perm_mod12[ii + i1 + self.perm[jj + j1] as usize] as usize;
        let gi2 = self.perm_mod12[ii + 1 + self.perm[jj + 1] as usize] as usize;

        let mut n = 0.0;
        let t0 = 0.5 - x0 * x0 - y0 * y0;
        if t0 > 0.0 {
            let t0 = t0 * t0;
            n += t0 * t0 * dot2(&GRAD3[gi0], x0, y0);
        }
        let t1 = 0.5 - x1 * x1 - y1 * y1;
        if t1 > 0.0 {
            let t1 = t1 * t1;
            n += t1 * t1 * dot2(&GRAD3[gi1], x1, y1);
        }
        let t2 = 0.5 - x2 * x2 - y2 * y2;
        if t2 > 0.0 {
            let t2 = t2 * t2;
            n += t2 * t2 * dot2(&GRAD3[gi2], x2, y2);
        }

        70.0 * n
    }

    /// 3D шум, диапазон примерно [-1, 1]
    pub fn noise3(&self, xin: f64, yin: f64, zin: f64) -> f64 {
        let s = (xin + yin + zin) * F3;
        let i = fast_floor(xin + s);
        let j = fast_floor(yin + s);
        let k = fast_floor(zin + s);

        let t = (i + j + k) as f64 * G3;
        let x0 = xin - (i as f64 - t);
        let y0 = yin - (j as f64 - t);
        let z0 = zin - (k as f64 - t);

        // Ранжирование координат выбирает один из шести тетраэдров
        let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
            if y0 >= z0 {
                (1, 0, 0, 1, 1, 0)
            } else if x0 >= z0 {
                (1, 0, 0, 1, 0, 1)
            } else {
                (0, 0, 1, 1, 0, 1)
            }
        } else if y0 < z0 {
            (0, 0, 1, 0, 1, 1)
        } else if x0 < z0 {
            (0, 1, 0, 0, 1, 1)
        } else {
            (0, 1, 0, 1, 1, 0)
        };

        let x1 = x0 - i1 as f64 + G3;
        let y1 = y0 - j1 as f64 + G3;
        let z1 = z0 - k1 as f64 + G3;
        let x2 = x0 - i2 as f64 + 2.0 * G3;
        let y2 = y0 - j2 as f64 + 2.0 * G3;
        let z2 = z0 - k2 as f64 + 2.0 * G3;
        let x3 = x0 - 1.0 + 3.0 * G3;
        let y3 = y0 - 1.0 + 3.0 * G3;
        let z3 = z0 - 1.0 + 3.0 * G3;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let kk = (k & 255) as usize;
        let gi0 = self.perm_mod12[ii + self.perm[jj + self.perm[kk] as usize] as usize] as usize;
        let gi1 = self.perm_mod12
            [ii + i1 + self.perm[jj + j1 + self.perm[kk + k1] as usize] as usize]
            as usize;
        let gi2 = self.perm_mod12
            [ii + i2 + self.perm[jj + j2 + self.perm[kk + k2] as usize] as usize]
            as usize;
        let gi3 =
            self.perm_mod12[ii + 1 + self.perm[jj + 1 + self.perm[kk + 1] as usize] as usize] as usize;

        let mut n = 0.0;
        let t0 = 0.6 - x0 * x0 - y0 * y0 - z0 * z0;
        if t0 > 0.0 {
            let t0 = t0 * t0;
            n += t0 * t0 * dot3(&GRAD3[gi0], x0, y0, z0);
        }
        let t1 = 0.6 - x1 * x1 - y1 * y1 - z1 * z1;
        if t1 > 0.0 {
            let t1 = t1 * t1;
            n += t1 * t1 * dot3(&GRAD3[gi1], x1, y1, z1);
        }
        let t2 = 0.6 - x2 * x2 - y2 * y2 - z2 * z2;
        if t2 > 0.0 {
            let t2 = t2 * t2;
            n += t2 * t2 * dot3(&GRAD3[gi2], x2, y2, z2);
        }
        let t3 = 0.6 - x3 * x3 - y3 * y3 - z3 * z3;
        if t3 > 0.0 {
            let t3 = t3 * t3;
            n += t3 * t3 * dot3(&GRAD3[gi3], x3, y3, z3);
        }

        32.0 * n
    }

    /// Fractional Brownian motion поверх 2D шума, нормированный в [-1, 1]
    pub fn fbm2(&self, x: f64, y: f64, octaves: u32, persistence: f64, scale: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut max_amplitude = 0.0;
        let mut frequency = scale;

        for _ in 0..octaves {
            total += self.noise2(x * frequency, y * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= 2.0;
        }

        total / max_amplitude
    }

    /// Fractional Brownian motion поверх 3D шума, нормированный в [-1, 1]
    pub fn fbm3(&self, x: f64, y: f64, z: f64, octaves: u32, persistence: f64, scale: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut max_amplitude = 0.0;
        let mut frequency = scale;

        for _ in 0..octaves {
            total += self.noise3(x * frequency, y * frequency, z * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= 2.0;
        }

        total / max_amplitude
    }
}

/// Целочисленный хеш мировой XZ позиции. Не зависит от seed,
/// поэтому соседние чанки приходят к одному результату для
/// одной и той же мировой колонки
#[inline]
pub fn hash_position(x: i32, z: i32) -> i64 {
    let mut h = (x as i64)
        .wrapping_mul(374_761_393)
        .wrapping_add((z as i64).wrapping_mul(668_265_263));
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    h ^= h >> 16;
    h & 0xFFFF_FFFF
}

#[inline(always)]
fn fast_floor(x: f64) -> i32 {
    let xi = x as i32;
    if x < xi as f64 {
        xi - 1
    } else {
        xi
    }
}

#[inline(always)]
fn dot2(g: &[f64; 3], x: f64, y: f64) -> f64 {
    g[0] * x + g[1] * y
}

#[inline(always)]
fn dot3(g: &[f64; 3], x: f64, y: f64, z: f64) -> f64 {
    g[0] * x + g[1] * y + g[2] * z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_values() {
        let a = SimplexNoise::new(42);
        let b = SimplexNoise::new(42);
        for i in 0..64 {
            let x = i as f64 * 0.37 - 11.0;
            let y = i as f64 * 0.73 + 3.0;
            assert_eq!(a.noise2(x, y), b.noise2(x, y));
            assert_eq!(a.noise3(x, y, x + y), b.noise3(x, y, x + y));
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let a = SimplexNoise::new(1);
        let b = SimplexNoise::new(2);
        let mut diverged = false;
        for i in 0..64 {
            let x = i as f64 * 0.61;
            if a.noise2(x, -x) != b.noise2(x, -x) {
                diverged = true;
                break;
            }
        }
        assert!(diverged);
    }

    #[test]
    fn test_noise_range() {
        let noise = SimplexNoise::new(7);
        for i in -32..32 {
            for j in -32..32 {
                let x = i as f64 * 0.431;
                let y = j as f64 * 0.567;
                let n2 = noise.noise2(x, y);
                assert!(n2.abs() <= 1.0, "noise2({x}, {y}) = {n2}");
                let n3 = noise.noise3(x, y, (i + j) as f64 * 0.213);
                assert!(n3.abs() <= 1.0, "noise3 out of range: {n3}");
            }
        }
    }

    #[test]
    fn test_fbm_normalized() {
        let noise = SimplexNoise::new(99);
        for i in -16..16 {
            let v = noise.fbm2(i as f64 * 13.7, i as f64 * -7.1, 5, 0.5, 0.008);
            assert!(v.abs() <= 1.0);
            let w = noise.fbm3(i as f64, i as f64 * 2.0, i as f64 * 3.0, 3, 0.4, 0.03);
            assert!(w.abs() <= 1.0);
        }
    }

    #[test]
    fn test_hash_position_masked_and_stable() {
        let h = hash_position(-1234, 5678);
        assert_eq!(h, hash_position(-1234, 5678));
        assert!(h >= 0 && h <= 0xFFFF_FFFF);
        assert_ne!(hash_position(0, 0), hash_position(1, 0));
        assert_ne!(hash_position(0, 0), hash_position(0, 1));
    }
}
