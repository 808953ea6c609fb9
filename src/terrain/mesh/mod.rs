// ============================================
// Mesh Module - Построение мешей чанков
// ============================================

mod context;
mod mesher;
mod vertex;

pub use context::{with_meshing_context, MeshingContext};
pub use mesher::{build_mesh, ChunkView, MeshData};
pub use vertex::{TerrainVertex, VERTEX_FLOATS};
