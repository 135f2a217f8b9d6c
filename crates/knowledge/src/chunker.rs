//! Split extracted documents into overlapping chunks.

use crate::parser::SourceDocument;
use crate::types::Chunk;
use docroute_core::config::IndexConfig;
use docroute_core::{AppError, AppResult};
use sha2::{Digest, Sha256};
use text_splitter::{ChunkConfig, TextSplitter};

/// SHA-256 of text as lowercase hex.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn splitter(config: &IndexConfig) -> AppResult<TextSplitter<text_splitter::Characters>> {
    if config.chunk_size == 0 {
        return Err(AppError::Config("chunk_size must be positive".to_string()));
    }
    let chunk_config = ChunkConfig::new(config.chunk_size)
        .with_overlap(config.chunk_overlap)
        .map_err(|e| AppError::Config(format!("Invalid chunk settings: {}", e)))?;
    Ok(TextSplitter::new(chunk_config))
}

fn split_with(splitter: &TextSplitter<text_splitter::Characters>, doc: &SourceDocument) -> Vec<Chunk> {
    splitter
        .chunk_indices(&doc.text)
        .filter(|(_, text)| !text.trim().is_empty())
        .enumerate()
        .map(|(chunk_index, (start, text))| {
            let id = content_hash(&format!("{}:{}", doc.source, start));
            Chunk::new(&id[..16], text, doc.source.as_str())
                .with_metadata("source", doc.source.as_str())
                .with_metadata("file", doc.file.as_str())
                .with_metadata("content_type", doc.content_type.as_str())
                .with_metadata("start_index", start)
                .with_metadata("chunk_index", chunk_index)
                .with_metadata("content_hash", content_hash(text))
        })
        .collect()
}

/// Split one document.
pub fn split_document(doc: &SourceDocument, config: &IndexConfig) -> AppResult<Vec<Chunk>> {
    Ok(split_with(&splitter(config)?, doc))
}

/// Split documents in order, keeping at most `max_chunks` chunks overall.
pub fn split_documents(docs: &[SourceDocument], config: &IndexConfig) -> AppResult<Vec<Chunk>> {
    let splitter = splitter(config)?;
    let mut chunks: Vec<Chunk> = docs.iter().flat_map(|d| split_with(&splitter, d)).collect();

    if let Some(max) = config.max_chunks {
        if chunks.len() > max {
            tracing::info!("Keeping first {} of {} chunks", max, chunks.len());
            chunks.truncate(max);
        }
    }

    tracing::debug!(
        "Split {} documents into {} chunks (size: {}, overlap: {})",
        docs.len(),
        chunks.len(),
        config.chunk_size,
        config.chunk_overlap
    );
    Ok(chunks)
}
