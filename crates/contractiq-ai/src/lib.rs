//! AI inference layer: ONNX Runtime sentence embeddings and exemplar
//! similarity detection for contract clauses.

mod backend;
#[cfg(feature = "onnx")]
mod embedder;
mod index;
mod semantic;
#[cfg(test)]
mod testing;
mod vector;

pub use backend::{detector_or_noop, embedding_detector, select_detector};
#[cfg(feature = "onnx")]
pub use embedder::{Embedder, MODEL_NAME};
pub use index::EmbeddingIndex;
pub use semantic::{EmbeddingDetector, MIN_SEGMENT_CHARS, segment};
pub use vector::{TextEmbedder, cosine_sim, normalize};
