//! Ephemeral semantic storage used by the budget compressor.
//!
//! A [`VectorIndex`] lives for exactly one compression call: the
//! [`IndexProvider`] hands out a fresh one, the compressor fills it with
//! sentence groups, queries it with the question, and clears it before
//! returning. Nothing is shared between compressions or requests.
//!
//! The shipped implementation is [`MemoryIndex`] over an [`Embedder`]
//! ([`OpenAiEmbedder`] for any OpenAI-compatible `/embeddings` endpoint).

pub mod embedding;
pub mod memory;

pub use embedding::OpenAiEmbedder;
pub use memory::{EmbeddingIndexProvider, MemoryIndex, cosine_similarity};

use futures::future::BoxFuture;

use crate::error::Result;

pub type IndexFuture<'a, T> = BoxFuture<'a, Result<T>>;

/// Request-scoped semantic store.
pub trait VectorIndex: Send + Sync {
    /// Ingest one document.
    fn add<'a>(&'a mut self, text: &'a str) -> IndexFuture<'a, ()>;

    /// Ingest several documents. Implementations may batch the work.
    fn add_all<'a>(&'a mut self, texts: &'a [String]) -> IndexFuture<'a, ()> {
        Box::pin(async move {
            for text in texts {
                self.add(text).await?;
            }
            Ok(())
        })
    }

    /// Up to `k` stored documents most similar to `text`, best first.
    fn query<'a>(&'a self, text: &'a str, k: usize) -> IndexFuture<'a, Vec<String>>;

    /// Drop everything stored.
    fn clear(&mut self) -> IndexFuture<'_, ()>;

    /// Number of stored documents.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Creates a fresh, empty [`VectorIndex`] per call.
pub trait IndexProvider: Send + Sync {
    fn create(&self) -> Box<dyn VectorIndex>;
}

/// Text → vector embedding model.
pub trait Embedder: Send + Sync {
    /// One vector per input, in input order.
    fn embed<'a>(&'a self, texts: &'a [String]) -> IndexFuture<'a, Vec<Vec<f32>>>;
}
