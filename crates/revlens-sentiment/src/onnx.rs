//! ONNX-based sequence classifier for sentiment.
//!
//! Loads a HuggingFace sequence-classification export (model, tokenizer,
//! and the `config.json` carrying `id2label`) and maps the argmax class
//! through the label schemes in [`crate::labels`]. Requires the `onnx`
//! feature.

#[cfg(feature = "onnx")]
mod inner {
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Arc;

    use ort::session::Session;
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use tokenizers::Tokenizer;
    use tracing::info;

    use revlens_core::{Error, Result};

    use crate::classifier::{map_winning_class, SentimentBackend, SentimentPrediction};
    use crate::labels::{argmax, softmax};

    /// Maximum token sequence length fed to the model.
    const MAX_SEQ_LEN: usize = 256;

    /// ONNX sentiment classifier.
    pub struct OnnxSentimentClassifier {
        session: Arc<Mutex<Session>>,
        tokenizer: Tokenizer,
        model_name: String,
        num_labels: usize,
        id2label: HashMap<usize, String>,
    }

    impl OnnxSentimentClassifier {
        /// Load a model directory.
        ///
        /// Expects:
        /// - `model_dir/model.onnx` — the ONNX export
        /// - `model_dir/tokenizer.json` — the HuggingFace tokenizer
        /// - `model_dir/config.json` — model config with `id2label`
        pub fn load(model_dir: &Path) -> Result<Self> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");
            let config_path = model_dir.join("config.json");

            if !model_path.exists() {
                return Err(Error::Config(format!(
                    "Model not found: {}",
                    model_path.display()
                )));
            }
            if !tokenizer_path.exists() {
                return Err(Error::Config(format!(
                    "Tokenizer not found: {}",
                    tokenizer_path.display()
                )));
            }

            // With load-dynamic, ORT_DYLIB_PATH must point to libonnxruntime.
            ort::init().commit();

            let session = Session::builder()
                .map_err(|e| Error::Classification(format!("session builder: {}", e)))?
                .with_intra_threads(2)
                .map_err(|e| Error::Classification(format!("session threads: {}", e)))?
                .commit_from_file(&model_path)
                .map_err(|e| Error::Classification(format!("model load: {}", e)))?;

            let tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| Error::Classification(format!("tokenizer load: {}", e)))?;

            let id2label = load_id2label(&config_path)?;
            let num_labels = id2label.len();

            let model_name = model_dir
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("onnx-sentiment")
                .to_string();

            info!(
                "ONNX sentiment classifier loaded: labels={}, model={}",
                num_labels,
                model_path.display()
            );

            Ok(Self {
                session: Arc::new(Mutex::new(session)),
                tokenizer,
                model_name,
                num_labels,
                id2label,
            })
        }

        /// Tokenize and run one text, returning class probabilities.
        fn infer(&self, text: &str) -> Result<Vec<f32>> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| Error::Classification(format!("tokenization: {}", e)))?;

            let input_ids = encoding.get_ids();
            let attention_mask = encoding.get_attention_mask();

            let seq_len = input_ids.len().min(MAX_SEQ_LEN);
            let ids_data: Vec<i64> = input_ids[..seq_len].iter().map(|&id| id as i64).collect();
            let mask_data: Vec<i64> = attention_mask[..seq_len].iter().map(|&m| m as i64).collect();
            let type_ids_data: Vec<i64> = vec![0i64; seq_len];

            let ids_tensor = Tensor::from_array(([1usize, seq_len], ids_data))
                .map_err(|e| Error::Classification(format!("ids tensor: {}", e)))?;
            let mask_tensor = Tensor::from_array(([1usize, seq_len], mask_data))
                .map_err(|e| Error::Classification(format!("mask tensor: {}", e)))?;
            let type_ids_tensor = Tensor::from_array(([1usize, seq_len], type_ids_data))
                .map_err(|e| Error::Classification(format!("type_ids tensor: {}", e)))?;

            let mut session = self.session.lock();
            let outputs = session
                .run(ort::inputs![ids_tensor, mask_tensor, type_ids_tensor])
                .map_err(|e| Error::Classification(format!("inference: {}", e)))?;

            // Logits come back as [1, num_labels].
            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| Error::Classification(format!("output tensor: {}", e)))?;

            let shape_dims: Vec<i64> = shape.iter().copied().collect();
            let n = match shape_dims.as_slice() {
                [_, n] => *n as usize,
                [n] => *n as usize,
                other => {
                    return Err(Error::Classification(format!(
                        "unexpected logits shape: {:?}",
                        other
                    )))
                }
            };

            Ok(softmax(&data[..n]))
        }
    }

    fn load_id2label(config_path: &Path) -> Result<HashMap<usize, String>> {
        let text = std::fs::read_to_string(config_path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", config_path.display(), e)))?;
        let value: serde_json::Value = serde_json::from_str(&text)?;

        let mut map = HashMap::new();
        if let Some(obj) = value.get("id2label").and_then(|v| v.as_object()) {
            for (k, v) in obj {
                if let (Ok(idx), Some(name)) = (k.parse::<usize>(), v.as_str()) {
                    map.insert(idx, name.to_string());
                }
            }
        }
        if map.is_empty() {
            return Err(Error::Config(format!(
                "no id2label in {}",
                config_path.display()
            )));
        }
        Ok(map)
    }

    impl SentimentBackend for OnnxSentimentClassifier {
        fn classify(&self, texts: &[&str]) -> Result<Vec<SentimentPrediction>> {
            let mut results = Vec::with_capacity(texts.len());
            for text in texts {
                let probs = self.infer(text)?;
                let (index, confidence) = argmax(&probs)
                    .ok_or_else(|| Error::Classification("empty probability vector".into()))?;
                let id2label = |i: usize| self.id2label.get(&i).cloned();
                results.push(map_winning_class(self.num_labels, &id2label, index, confidence));
            }
            Ok(results)
        }

        fn model_name(&self) -> &str {
            &self.model_name
        }

        fn is_available(&self) -> bool {
            true
        }
    }
}

#[cfg(feature = "onnx")]
pub use inner::OnnxSentimentClassifier;
