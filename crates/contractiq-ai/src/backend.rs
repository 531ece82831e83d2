//! Start-up selection of the semantic detector.
//!
//! If a model loads and the exemplar index builds, analyses use the
//! embedding detector. Any failure here is logged and semantic detection is
//! disabled for the life of the process; analyses then run on rules alone.

use std::path::Path;
use std::sync::Arc;

use contractiq_core::{EngineConfig, ExemplarLibrary, NoopDetector, SemanticDetector};
use tracing::{info, warn};

use crate::index::EmbeddingIndex;
use crate::semantic::EmbeddingDetector;
use crate::vector::TextEmbedder;

/// Build an [`EmbeddingDetector`] over `embedder`, embedding the library once.
pub fn embedding_detector(
    embedder: Arc<dyn TextEmbedder>,
    library: &ExemplarLibrary,
    config: EngineConfig,
) -> anyhow::Result<EmbeddingDetector> {
    let index = EmbeddingIndex::build(library, embedder.as_ref())?;
    Ok(EmbeddingDetector::new(embedder, Arc::new(index), config))
}

/// Use `embedder` if the exemplar index builds, otherwise disable semantic detection.
pub fn detector_or_noop(
    embedder: Arc<dyn TextEmbedder>,
    library: &ExemplarLibrary,
    config: EngineConfig,
) -> Arc<dyn SemanticDetector> {
    match embedding_detector(embedder, library, config) {
        Ok(detector) => Arc::new(detector),
        Err(e) => {
            warn!(error = %e, "could not build exemplar index, semantic detection disabled");
            Arc::new(NoopDetector)
        }
    }
}

/// Pick the semantic detector for this process from an optional model directory.
#[cfg(feature = "onnx")]
pub fn select_detector(
    model_dir: Option<&Path>,
    library: &ExemplarLibrary,
    config: EngineConfig,
) -> Arc<dyn SemanticDetector> {
    use std::sync::Mutex;

    use crate::embedder::Embedder;

    let Some(dir) = model_dir else {
        info!("no model directory given, semantic detection disabled");
        return Arc::new(NoopDetector);
    };

    match Embedder::load(dir) {
        Ok(embedder) => detector_or_noop(Arc::new(Mutex::new(embedder)), library, config),
        Err(e) => {
            warn!(error = %e, dir = %dir.display(), "embedding model unavailable, semantic detection disabled");
            Arc::new(NoopDetector)
        }
    }
}

/// Pick the semantic detector for this process from an optional model directory.
#[cfg(not(feature = "onnx"))]
pub fn select_detector(
    model_dir: Option<&Path>,
    _library: &ExemplarLibrary,
    _config: EngineConfig,
) -> Arc<dyn SemanticDetector> {
    match model_dir {
        Some(dir) => warn!(
            dir = %dir.display(),
            "built without the `onnx` feature, semantic detection disabled"
        ),
        None => info!("semantic detection disabled"),
    }
    Arc::new(NoopDetector)
}
