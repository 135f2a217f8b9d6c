//! Embedding providers.
//!
//! A provider turns text into fixed-width vectors. The same provider and
//! model must be used to build a collection and to query it.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};

use docroute_core::{AppError, AppResult};
use tracing::debug;

/// Embed texts in provider-sized batches, preserving input order.
pub async fn embed_in_batches(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    batch_size: usize,
) -> AppResult<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let batch_size = batch_size.max(1);
    let mut embeddings = Vec::with_capacity(texts.len());

    for (i, batch) in texts.chunks(batch_size).enumerate() {
        debug!("Embedding batch {} ({} texts)", i + 1, batch.len());
        let vectors = provider.embed_batch(batch).await?;
        if vectors.len() != batch.len() {
            return Err(AppError::Embedding(format!(
                "Provider '{}' returned {} embeddings for {} texts",
                provider.provider_name(),
                vectors.len(),
                batch.len()
            )));
        }
        embeddings.extend(vectors);
    }

    Ok(embeddings)
}

#[cfg(test)]
mod tests {
    use super::providers::TrigramProvider;
    use super::*;

    #[tokio::test]
    async fn test_embed_in_batches_preserves_order() {
        let provider = TrigramProvider::new(64);
        let texts: Vec<String> = (0..7).map(|i| format!("grounding electrode number {}", i)).collect();

        let batched = embed_in_batches(&provider, &texts, 3).await.unwrap();
        let single = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(batched.len(), 7);
        assert_eq!(batched, single);
    }

    #[tokio::test]
    async fn test_embed_in_batches_empty() {
        let provider = TrigramProvider::new(64);
        let out = embed_in_batches(&provider, &[], 10).await.unwrap();
        assert!(out.is_empty());
    }
}
