// ============================================
// Karst Demo - Headless прогон движка
// ============================================
// Прогревает мир вокруг наблюдателя, копает блок, идёт на восток
// через границы чанков и печатает диагностику. GPU опционален:
// без адаптера меши считаются, но не загружаются.

use std::sync::Arc;

use ultraviolet::{Mat4, Vec3};

use karst::blocks::{BlockType, TextureLayerTable};
use karst::config::EngineConfig;
use karst::math::FrustumPlanes;
use karst::terrain::generation::WorldGenerator;
use karst::terrain::gpu::{ChunkMeshBackend, NullMeshBackend, WgpuMeshBackend};
use karst::terrain::manager::ChunkManager;

const CONFIG_PATH: &str = "karst.json";

fn main() {
    env_logger::init();

    let config = EngineConfig::load_or_default(CONFIG_PATH);
    println!("=== Karst Voxel Engine ===");
    println!(
        "[CONFIG] seed {}, радиус {} чанков, вертикаль [{}, {})",
        config.seed,
        config.manager.render_distance,
        config.manager.min_chunk_y,
        config.manager.max_chunk_y
    );

    match request_gpu_device() {
        Some(device) => {
            println!("[GPU] Устройство найдено, меши идут в видеопамять");
            run_demo(config, WgpuMeshBackend::new(device));
        }
        None => {
            println!("[GPU] Адаптер не найден, меши остаются на CPU");
            run_demo(config, NullMeshBackend::default());
        }
    }
}

/// Headless устройство: surface не нужен
fn request_gpu_device() -> Option<Arc<wgpu::Device>> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .ok()?;

    let (device, _queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("Karst Device"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::default(),
        memory_hints: Default::default(),
        trace: wgpu::Trace::Off,
    }))
    .ok()?;

    Some(Arc::new(device))
}

fn run_demo<B: ChunkMeshBackend>(config: EngineConfig, backend: B) {
    let generator = WorldGenerator::new(config.seed, config.generator);

    // Спавн на поверхности в центре мира
    let biome = generator.biome_at(8, 8);
    let surface = generator.terrain_height(8, 8, biome);
    let mut observer = Vec3::new(8.0, surface as f32 + 2.0, 8.0);
    println!(
        "[SPAWN] Биом {:?}, поверхность y={}, наблюдатель на ({:.0}, {:.0}, {:.0})",
        biome, surface, observer.x, observer.y, observer.z
    );

    let mut manager = ChunkManager::new(
        backend,
        generator,
        config.manager,
        TextureLayerTable::with_default_layout(),
    );

    manager.preload(observer);
    let diag = manager.diagnostics();
    println!("[WORLD] Чанков {}, мешей {}", diag.loaded, diag.meshed);

    // Камера смотрит на восток, считаем видимые меши
    let proj = ultraviolet::projection::perspective_wgpu_dx(
        60f32.to_radians(),
        16.0 / 9.0,
        0.1,
        1000.0,
    );
    let view = Mat4::look_at(observer, observer + Vec3::unit_x(), Vec3::unit_y());
    let view_proj: [[f32; 4]; 4] = (proj * view).into();
    let frustum = FrustumPlanes::from_view_proj(&view_proj);
    let opaque = manager.render(|aabb| frustum.contains(aabb), |_, _| {});
    let water = manager.render_water(|aabb| frustum.contains(aabb), |_, _| {});
    println!("[RENDER] В кадре {} непрозрачных и {} водных мешей", opaque, water);

    // Луч вниз: на чём стоим, этот блок и выкопаем
    if let Some(hit) = manager.raycast(observer, Vec3::new(0.0, -1.0, 0.0), 64.0) {
        println!(
            "[RAY] Под ногами {:?} на ({}, {}, {}), дистанция {:.2}",
            hit.block, hit.block_x, hit.block_y, hit.block_z, hit.distance
        );

        manager.set_block_at(hit.block_x, hit.block_y, hit.block_z, BlockType::Air);
        let mut frames = 0usize;
        while manager.diagnostics().pending_meshes > 0 && frames < 10_000 {
            manager.update(observer);
            frames += 1;
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        println!("[EDIT] Блок выкопан, меши догнали за {} кадров", frames);
    }

    // Идём на восток через несколько границ чанков
    let started = std::time::Instant::now();
    let steps = 240;
    for step in 0..steps {
        observer.x += 1.0;
        manager.update(observer);
        if step % 60 == 59 {
            let diag = manager.diagnostics();
            println!(
                "[WALK] x={:.0}: чанков {}, мешей {}, генерация {}, сборка {}",
                observer.x,
                diag.loaded,
                diag.meshed,
                diag.pending_generation,
                diag.pending_meshes
            );
        }
        std::thread::sleep(std::time::Duration::from_millis(4));
    }
    println!(
        "[WALK] {} шагов за {:.1} с",
        steps,
        started.elapsed().as_secs_f32()
    );

    manager.shutdown();
    println!("[EXIT] Потоки остановлены, меши освобождены");
}
