// ============================================
// Manager Module - Жизненный цикл чанков
// ============================================

mod manager;
mod pool;
mod queries;

pub use manager::{ChunkDiagnostics, ChunkManager, ManagerConfig};
pub use pool::{Task, TaskResult, WorkerPool};
pub use queries::RaycastHit;
