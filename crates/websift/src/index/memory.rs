//! In-memory vector index ranked by cosine similarity.

use std::sync::Arc;

use tracing::trace;

use super::{Embedder, IndexFuture, IndexProvider, VectorIndex};
use crate::error::{Error, Result};

/// Cosine similarity of two vectors. Mismatched lengths or zero vectors
/// score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Stores `(text, vector)` pairs and answers top-k similarity queries.
pub struct MemoryIndex {
    embedder: Arc<dyn Embedder>,
    entries: Vec<(String, Vec<f32>)>,
    min_score: f32,
}

impl MemoryIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            entries: Vec::new(),
            min_score: 0.0,
        }
    }

    /// Drop matches scoring below `min_score`.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    async fn embed_checked(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = self.embedder.embed(texts).await?;
        if vectors.len() != texts.len() {
            return Err(Error::Index(format!(
                "embedder returned {} vectors for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }
}

impl VectorIndex for MemoryIndex {
    fn add<'a>(&'a mut self, text: &'a str) -> IndexFuture<'a, ()> {
        Box::pin(async move {
            let texts = [text.to_string()];
            let mut vectors = self.embed_checked(&texts).await?;
            let [text] = texts;
            if let Some(vector) = vectors.pop() {
                self.entries.push((text, vector));
            }
            Ok(())
        })
    }

    fn add_all<'a>(&'a mut self, texts: &'a [String]) -> IndexFuture<'a, ()> {
        Box::pin(async move {
            if texts.is_empty() {
                return Ok(());
            }
            let vectors = self.embed_checked(texts).await?;
            self.entries.extend(texts.iter().cloned().zip(vectors));
            Ok(())
        })
    }

    fn query<'a>(&'a self, text: &'a str, k: usize) -> IndexFuture<'a, Vec<String>> {
        Box::pin(async move {
            if self.entries.is_empty() || k == 0 {
                return Ok(Vec::new());
            }
            let question = [text.to_string()];
            let query_vec = self
                .embed_checked(&question)
                .await?
                .pop()
                .unwrap_or_default();

            let mut scored: Vec<(f32, &str)> = self
                .entries
                .iter()
                .map(|(doc, vec)| (cosine_similarity(&query_vec, vec), doc.as_str()))
                .filter(|(score, _)| *score >= self.min_score)
                .collect();
            scored.sort_by(|a, b| b.0.total_cmp(&a.0));
            scored.truncate(k);
            trace!(
                "index query: {} of {} documents matched",
                scored.len(),
                self.entries.len()
            );
            Ok(scored.into_iter().map(|(_, doc)| doc.to_string()).collect())
        })
    }

    fn clear(&mut self) -> IndexFuture<'_, ()> {
        self.entries.clear();
        Box::pin(async { Ok(()) })
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Hands out a fresh [`MemoryIndex`] per call, all sharing one embedder.
#[derive(Clone)]
pub struct EmbeddingIndexProvider {
    embedder: Arc<dyn Embedder>,
    min_score: f32,
}

impl EmbeddingIndexProvider {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            min_score: 0.0,
        }
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }
}

impl IndexProvider for EmbeddingIndexProvider {
    fn create(&self) -> Box<dyn VectorIndex> {
        Box::new(MemoryIndex::new(Arc::clone(&self.embedder)).with_min_score(self.min_score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const VOCAB: &[&str] = &["rust", "ownership", "python", "garbage", "borrow"];

    /// Bag-of-keywords embedding over a tiny vocabulary.
    #[derive(Default)]
    struct KeywordEmbedder {
        calls: AtomicUsize,
    }

    impl Embedder for KeywordEmbedder {
        fn embed<'a>(&'a self, texts: &'a [String]) -> IndexFuture<'a, Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                Ok(texts
                    .iter()
                    .map(|t| {
                        let lower = t.to_lowercase();
                        VOCAB
                            .iter()
                            .map(|w| lower.matches(w).count() as f32)
                            .collect()
                    })
                    .collect())
            })
        }
    }

    struct ShortEmbedder;

    impl Embedder for ShortEmbedder {
        fn embed<'a>(&'a self, _texts: &'a [String]) -> IndexFuture<'a, Vec<Vec<f32>>> {
            Box::pin(async { Ok(Vec::new()) })
        }
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[tokio::test]
    async fn query_ranks_by_similarity() {
        let embedder = Arc::new(KeywordEmbedder::default());
        let mut index = MemoryIndex::new(embedder.clone());
        let docs = vec![
            "Python uses garbage collection.".to_string(),
            "Rust ownership and the borrow checker.".to_string(),
            "Rust is fast.".to_string(),
        ];
        index.add_all(&docs).await.unwrap();
        assert_eq!(index.len(), 3);
        // Batched: one embed call for all three documents.
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);

        let hits = index.query("rust ownership borrow", 2).await.unwrap();
        assert_eq!(hits[0], "Rust ownership and the borrow checker.");
        assert_eq!(hits[1], "Rust is fast.");
    }

    #[tokio::test]
    async fn min_score_filters_unrelated() {
        let mut index =
            MemoryIndex::new(Arc::new(KeywordEmbedder::default())).with_min_score(0.1);
        index.add("Python garbage collector").await.unwrap();
        index.add("Rust ownership").await.unwrap();
        let hits = index.query("rust", 5).await.unwrap();
        assert_eq!(hits, vec!["Rust ownership".to_string()]);
    }

    #[tokio::test]
    async fn clear_empties_index() {
        let mut index = MemoryIndex::new(Arc::new(KeywordEmbedder::default()));
        index.add("rust").await.unwrap();
        index.clear().await.unwrap();
        assert!(index.is_empty());
        assert!(index.query("rust", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn vector_count_mismatch_is_index_error() {
        let mut index = MemoryIndex::new(Arc::new(ShortEmbedder));
        let err = index.add("anything").await.unwrap_err();
        assert!(matches!(err, Error::Index(_)));
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn provider_creates_independent_indices() {
        let provider = EmbeddingIndexProvider::new(Arc::new(KeywordEmbedder::default()));
        let mut a = provider.create();
        let b = provider.create();
        a.add("rust").await.unwrap();
        assert_eq!(a.len(), 1);
        assert!(b.is_empty());
    }
}
