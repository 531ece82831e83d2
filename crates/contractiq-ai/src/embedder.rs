//! ONNX Runtime sentence embeddings for contract clauses and exemplars.
//!
//! Mean-pooled all-MiniLM-L6-v2 (384 dimensions), the model the exemplar
//! thresholds were tuned against. The model directory must contain
//! `model.onnx` and `tokenizer.json`.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::info;

use crate::vector::{TextEmbedder, normalize};

pub const MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Sentence embedding generator using ONNX Runtime.
///
/// Produces unit-length vectors, so cosine similarity is a dot product.
/// Inference needs `&mut self`; share it as `Mutex<Embedder>`, which
/// implements [`TextEmbedder`].
pub struct Embedder {
    session: Session,
    tokenizer: Tokenizer,
    dim: usize,
}

impl Embedder {
    /// Load an embedding model from a directory containing `model.onnx` and `tokenizer.json`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;

        // Infer embedding dimension from model output shape.
        let dim = infer_dim(session.outputs()[0].dtype()).unwrap_or(384);

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;

        // Configure truncation to model's max length (256 for MiniLM).
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: 256,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;

        // Configure padding to pad all inputs in a batch to the same length.
        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            ..Default::default()
        }));

        info!(dim, model = %model_path.display(), "loaded embedding model");
        Ok(Self {
            session,
            tokenizer,
            dim,
        })
    }

    /// Embedding dimensionality (384 for all-MiniLM-L6-v2).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Embed a single text string, returning a normalized vector.
    pub fn embed(&mut self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("model returned no embedding"))
    }

    /// Embed a batch of texts, returning one normalized vector per input.
    pub fn embed_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;
        let batch = TokenBatch::from_encodings(&encodings);
        let shape = [batch.rows as i64, batch.seq_len as i64];

        let ids_tensor = Tensor::from_array((shape, batch.input_ids.into_boxed_slice()))?;
        let mask_tensor =
            Tensor::from_array((shape, batch.attention_mask.clone().into_boxed_slice()))?;
        let type_tensor = Tensor::from_array((shape, batch.token_type_ids.into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs![
            "input_ids" => ids_tensor,
            "attention_mask" => mask_tensor,
            "token_type_ids" => type_tensor,
        ])?;

        // Token embeddings: [rows, seq_len, dim].
        let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[0] as usize == batch.rows && dims[2] as usize == self.dim,
            "unexpected output shape: {dims:?}, expected [{}, {}, {}]",
            batch.rows,
            batch.seq_len,
            self.dim
        );

        Ok(mean_pool(
            output_data,
            &batch.attention_mask,
            batch.seq_len,
            dims[1] as usize,
            self.dim,
        ))
    }
}

/// Flattened, padded model inputs for one tokenized batch.
struct TokenBatch {
    rows: usize,
    seq_len: usize,
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
    token_type_ids: Vec<i64>,
}

impl TokenBatch {
    fn from_encodings(encodings: &[tokenizers::Encoding]) -> Self {
        let rows = encodings.len();
        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut input_ids = vec![0i64; rows * seq_len];
        let mut attention_mask = vec![0i64; rows * seq_len];
        let mut token_type_ids = vec![0i64; rows * seq_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let row = i * seq_len;
            let tokens = encoding
                .get_ids()
                .iter()
                .zip(encoding.get_attention_mask())
                .zip(encoding.get_type_ids());
            for (j, ((&id, &mask), &tid)) in tokens.enumerate() {
                input_ids[row + j] = id as i64;
                attention_mask[row + j] = mask as i64;
                token_type_ids[row + j] = tid as i64;
            }
        }

        Self {
            rows,
            seq_len,
            input_ids,
            attention_mask,
            token_type_ids,
        }
    }
}

/// Attention-masked mean over token embeddings, L2-normalized per row.
///
/// `mask` is laid out `[rows, mask_len]`; `tokens` is `[rows, out_len, dim]`.
fn mean_pool(
    tokens: &[f32],
    mask: &[i64],
    mask_len: usize,
    out_len: usize,
    dim: usize,
) -> Vec<Vec<f32>> {
    let rows = if mask_len == 0 { 0 } else { mask.len() / mask_len };
    let mut embeddings = Vec::with_capacity(rows);

    for i in 0..rows {
        let mut pooled = vec![0.0f32; dim];
        let mut weight = 0.0f32;

        for j in 0..out_len.min(mask_len) {
            let m = mask[i * mask_len + j] as f32;
            if m > 0.0 {
                let offset = (i * out_len + j) * dim;
                for (p, &t) in pooled.iter_mut().zip(&tokens[offset..offset + dim]) {
                    *p += t * m;
                }
                weight += m;
            }
        }

        if weight > 0.0 {
            for p in &mut pooled {
                *p /= weight;
            }
        }
        normalize(&mut pooled);
        embeddings.push(pooled);
    }

    embeddings
}

impl TextEmbedder for Mutex<Embedder> {
    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        let mut embedder = self
            .lock()
            .map_err(|_| anyhow::anyhow!("embedder lock poisoned"))?;
        embedder.embed_batch(texts)
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }
}

/// Try to infer the embedding dimension from the ONNX model output type.
fn infer_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => {
            // Last dimension is the embedding dim.
            shape
                .last()
                .and_then(|&d| if d > 0 { Some(d as usize) } else { None })
        }
        _ => None,
    }
}
