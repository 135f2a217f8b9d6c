//! Offline embedding provider built from character trigrams.

use crate::embeddings::provider::EmbeddingProvider;
use docroute_core::AppResult;
use std::collections::HashMap;

/// Words too common to help tell documents apart.
const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "does", "about",
];

/// Deterministic hashed-feature embeddings.
///
/// Each word above two characters contributes its trigrams and itself to
/// hashed dimensions; the result is L2-normalized. No network access and
/// no credential are needed, which makes it suitable for tests and local
/// development. Quality is far below a neural model.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn slot(&self, token: &str, seed: u64) -> usize {
        let hash = token
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(seed).wrapping_add(b as u64));
        (hash % self.dimensions as u64) as usize
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        let lower = text.to_lowercase();

        let mut freq: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        {
            *freq.entry(word).or_insert(0) += 1;
        }

        for (word, count) in &freq {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                embedding[self.slot(&trigram, 37)] += (*count as f32).sqrt();
            }
            embedding[self.slot(word, 31)] += *count as f32;
        }

        let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|v| *v /= norm);
        }
        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
    }

    #[tokio::test]
    async fn test_unit_length() {
        let provider = TrigramProvider::new(384);
        let embedding = provider.embed("grounding electrode conductor").await.unwrap();
        assert_eq!(embedding.len(), 384);
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let provider = TrigramProvider::new(384);
        let a = provider.embed("service turnaround times").await.unwrap();
        let b = provider.embed("service turnaround times").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let provider = TrigramProvider::new(32);
        let embedding = provider.embed("").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_related_text_is_closer() {
        let provider = TrigramProvider::new(512);
        let query = provider.embed("grounding electrode requirements").await.unwrap();
        let related = provider
            .embed("Article 250 covers grounding and bonding, including the grounding electrode system.")
            .await
            .unwrap();
        let unrelated = provider.embed("Our design team offers fast plan sets.").await.unwrap();

        assert!(squared_l2(&query, &related) < squared_l2(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_multibyte_text() {
        let provider = TrigramProvider::new(128);
        let embedding = provider.embed("Gamedex é um aplicativo 🎮 brasileiro").await.unwrap();
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }
}
