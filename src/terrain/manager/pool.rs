// ============================================
// Worker Pool - Фоновые потоки генерации и мешей
// ============================================
//
// Пул рабочих потоков с общим каналом задач. Потоки делят один
// Receiver под мьютексом: лок держится только на время ожидания
// задачи, сама работа идёт без лока. Паника внутри задачи не
// валит поток, наружу уходит результат-сбой.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::blocks::TextureLayerTable;
use crate::terrain::generation::{GeneratedChunk, WorldGenerator};
use crate::terrain::mesh::{build_mesh, with_meshing_context, ChunkView, MeshData};
use crate::terrain::voxel::ChunkKey;

/// Задача для фонового потока
pub enum Task {
    /// Сгенерировать сетку блоков чанка
    Generate { key: ChunkKey, chunk_id: u64 },
    /// Построить меш по снимку чанка и соседей
    Mesh {
        key: ChunkKey,
        chunk_id: u64,
        view: ChunkView,
        layers: TextureLayerTable,
    },
}

/// Результат фоновой задачи. chunk_id привязывает результат
/// к конкретному экземпляру чанка, устаревшие отбрасываются
pub enum TaskResult {
    Generated {
        key: ChunkKey,
        chunk_id: u64,
        chunk: GeneratedChunk,
    },
    GenerateFailed {
        key: ChunkKey,
        chunk_id: u64,
    },
    Meshed {
        key: ChunkKey,
        chunk_id: u64,
        /// None - в чанке не вышло ни одной грани
        mesh: Option<MeshData>,
    },
    MeshFailed {
        key: ChunkKey,
        chunk_id: u64,
    },
}

/// Пул фоновых потоков чанков
pub struct WorkerPool {
    task_tx: Option<Sender<Task>>,
    result_rx: Receiver<TaskResult>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Число потоков по умолчанию: ядра минус два, в пределах 1..=4
    pub fn default_thread_count() -> usize {
        let cores = thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
        cores.saturating_sub(2).clamp(1, 4)
    }

    pub fn new(generator: Arc<WorldGenerator>, threads: usize) -> Self {
        let threads = threads.max(1);
        let (task_tx, task_rx) = channel::<Task>();
        let (result_tx, result_rx) = channel::<TaskResult>();
        let task_rx = Arc::new(Mutex::new(task_rx));

        let mut workers = Vec::with_capacity(threads);
        for index in 0..threads {
            let task_rx = Arc::clone(&task_rx);
            let result_tx = result_tx.clone();
            let generator = Arc::clone(&generator);

            let handle = thread::Builder::new()
                .name(format!("chunk-worker-{}", index))
                .spawn(move || loop {
                    let task = {
                        let guard = match task_rx.lock() {
                            Ok(guard) => guard,
                            Err(_) => break,
                        };
                        guard.recv()
                    };
                    match task {
                        Ok(task) => {
                            let result = run_task(&generator, task);
                            if result_tx.send(result).is_err() {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                });

            match handle {
                Ok(handle) => workers.push(handle),
                Err(e) => log::error!("не удалось запустить chunk-worker-{}: {}", index, e),
            }
        }

        log::info!("пул чанков: {} потоков", workers.len());
        Self {
            task_tx: Some(task_tx),
            result_rx,
            workers,
        }
    }

    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    /// Отправляет задачу в пул. false если пул уже остановлен
    pub fn submit(&self, task: Task) -> bool {
        match &self.task_tx {
            Some(tx) => tx.send(task).is_ok(),
            None => false,
        }
    }

    /// Забирает готовый результат без ожидания
    pub fn try_recv(&self) -> Option<TaskResult> {
        match self.result_rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Останавливает пул: закрывает канал задач и ждёт потоки.
    /// Повторный вызов безопасен
    pub fn shutdown(&mut self) {
        if self.task_tx.take().is_none() {
            return;
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("chunk-worker завершился паникой");
            }
        }
        log::info!("пул чанков остановлен");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Выполняет задачу, перехватывая панику
fn run_task(generator: &WorldGenerator, task: Task) -> TaskResult {
    match task {
        Task::Generate { key, chunk_id } => {
            match catch_unwind(AssertUnwindSafe(|| generator.generate(key))) {
                Ok(chunk) => TaskResult::Generated { key, chunk_id, chunk },
                Err(_) => {
                    log::error!("генерация чанка {:?} упала", key);
                    TaskResult::GenerateFailed { key, chunk_id }
                }
            }
        }
        Task::Mesh { key, chunk_id, view, layers } => {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                with_meshing_context(|ctx| build_mesh(&view, &layers, ctx))
            }));
            match outcome {
                Ok(mesh) => TaskResult::Meshed { key, chunk_id, mesh },
                Err(_) => {
                    log::error!("меш чанка {:?} упал", key);
                    TaskResult::MeshFailed { key, chunk_id }
                }
            }
        }
    }
}
