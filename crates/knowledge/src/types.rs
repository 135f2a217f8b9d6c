//! Core types for retrieval and routing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Free-form chunk metadata, kept ordered so serialized output is stable.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A retrievable unit of text stored in a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable identifier within the collection.
    pub id: String,

    /// Text content.
    pub text: String,

    /// Source reference (usually the document path).
    #[serde(default)]
    pub source: String,

    /// Extra attributes such as `file`, `start_index` or `content_hash`.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Chunk {
    pub fn new(id: impl Into<String>, text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            source: source.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// String-valued metadata entry, if present.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// A chunk paired with its relevance score in (0, 1].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Topical category of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    /// Electrical code and regulatory material.
    #[serde(rename = "nec")]
    Regulatory,

    /// Organization policy, pricing and services.
    #[serde(rename = "wattmonk")]
    Organization,

    #[serde(rename = "general")]
    General,
}

impl Intent {
    /// Wire label for this intent.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Regulatory => "nec",
            Intent::Organization => "wattmonk",
            Intent::General => "general",
        }
    }

    /// True for intents bound to a single collection.
    pub fn is_topical(&self) -> bool {
        !matches!(self, Intent::General)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an answer should be grounded in retrieved documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "rag")]
    Grounded,

    #[serde(rename = "general")]
    Ungrounded,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Grounded => "rag",
            Mode::Ungrounded => "general",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn of the conversation supplied with a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Why a collection could not be searched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailable {
    /// No persisted collection exists at the expected location.
    Missing,

    /// The collection was built from zero chunks.
    Empty,

    /// The embedding backend needs a credential that was not supplied.
    MissingCredential,

    /// The persisted collection could not be opened.
    Corrupt(String),

    /// The embedding backend could not be constructed.
    Backend(String),
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailable::Missing => f.write_str("not built"),
            Unavailable::Empty => f.write_str("empty"),
            Unavailable::MissingCredential => f.write_str("missing credential"),
            Unavailable::Corrupt(msg) => write!(f, "unreadable: {}", msg),
            Unavailable::Backend(msg) => write!(f, "embedding backend unavailable: {}", msg),
        }
    }
}

/// Outcome of consulting one collection for a request.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionState {
    Searched { candidates: usize },
    Unavailable(Unavailable),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionStatus {
    pub name: String,
    pub state: CollectionState,
}

/// Fused retrieval output for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    /// Top chunks ordered by descending score.
    pub chunks: Vec<ScoredChunk>,

    /// Routing decision derived from the scores.
    pub mode: Mode,

    /// Per-collection outcome, in search order.
    pub collections: Vec<CollectionStatus>,
}

impl RetrievalResult {
    pub fn empty() -> Self {
        Self {
            chunks: Vec::new(),
            mode: Mode::Ungrounded,
            collections: Vec::new(),
        }
    }

    pub fn documents(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter().map(|c| &c.chunk)
    }

    pub fn scores(&self) -> Vec<f32> {
        self.chunks.iter().map(|c| c.score).collect()
    }

    /// Highest score, or 0.0 when nothing was retrieved.
    pub fn max_score(&self) -> f32 {
        self.chunks
            .iter()
            .map(|c| c.score)
            .fold(None, |acc: Option<f32>, s| Some(acc.map_or(s, |m| m.max(s))))
            .unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
