//! Chunk meshing: the face-culling cube mesher, the halo volume it reads,
//! the opacity table deciding occlusion, and the scheduler that decides when
//! a cached column is ready to mesh.

pub mod bordered;
pub mod consumer;
pub mod face_direction;
pub mod invalidation;
pub mod mesher;
pub mod opacity;
pub mod scheduler;
pub mod vertex;
pub mod visible_faces;

pub use bordered::{BORDERED_SIZE, BorderedVolume};
pub use consumer::MeshConsumer;
pub use face_direction::FaceDirection;
pub use invalidation::{MeshInvalidator, MeshTarget};
pub use mesher::{SubChunkMesh, VERTICES_PER_FACE, mesh_subchunk, subchunk_origin};
pub use opacity::{BARRIER_BLOCK_ID, BlockOpacity, OpacityTable};
pub use scheduler::{BuildPassResult, BuildScheduler, EditRebuild};
pub use vertex::{ChunkVertex, debug_color};
pub use visible_faces::VisibleFaces;
