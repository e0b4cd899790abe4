//! In-process lexical backend
//!
//! Ranks corpus fragments with BM25 so the whole system can run without a
//! managed RAG service. Fragments are the tagged blocks of the staged corpus
//! file; header lines are indexed along with the question text, which is
//! what lets id and concept queries land on the right block.

use super::{CorpusImporter, ScoredFragment, SearchBackend};
use crate::codec::split_corpus;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{info, warn};

const BM25_K1: f64 = 1.2;
const BM25_B: f64 = 0.75;

/// Scheme prefix of locations produced by the local object store
pub const FILE_SCHEME: &str = "file://";

struct IndexedFragment {
    text: String,
    term_freq: HashMap<String, u32>,
    len: usize,
}

#[derive(Default)]
struct LexicalIndex {
    fragments: Vec<IndexedFragment>,
    doc_freqs: HashMap<String, usize>,
    avg_len: f64,
}

impl LexicalIndex {
    fn build(fragments: Vec<String>) -> Self {
        let mut doc_freqs: HashMap<String, usize> = HashMap::new();
        let mut indexed = Vec::with_capacity(fragments.len());

        for text in fragments {
            let tokens = tokenize(&text);
            let mut term_freq: HashMap<String, u32> = HashMap::new();
            for token in &tokens {
                *term_freq.entry(token.clone()).or_insert(0) += 1;
            }
            for token in term_freq.keys() {
                *doc_freqs.entry(token.clone()).or_insert(0) += 1;
            }
            indexed.push(IndexedFragment {
                text,
                term_freq,
                len: tokens.len(),
            });
        }

        let avg_len = if indexed.is_empty() {
            0.0
        } else {
            indexed.iter().map(|f| f.len).sum::<usize>() as f64 / indexed.len() as f64
        };

        Self {
            fragments: indexed,
            doc_freqs,
            avg_len,
        }
    }

    fn score(&self, query_tokens: &[String], fragment: &IndexedFragment) -> f64 {
        if fragment.len == 0 {
            return 0.0;
        }

        let total = self.fragments.len() as f64;
        let mut seen = HashSet::new();
        let mut score = 0.0;

        for token in query_tokens {
            if !seen.insert(token) {
                continue;
            }
            let Some(tf) = fragment.term_freq.get(token) else {
                continue;
            };
            let df = *self.doc_freqs.get(token).unwrap_or(&0) as f64;
            let idf = ((total - df + 0.5) / (df + 0.5)).ln_1p().max(0.0);
            let tf = *tf as f64;
            let length_norm = 1.0 - BM25_B + BM25_B * fragment.len as f64 / self.avg_len.max(1.0);
            score += idf * (tf * (BM25_K1 + 1.0)) / (tf + BM25_K1 * length_norm);
        }

        score
    }

    fn search(&self, query: &str, top_k: usize) -> Vec<ScoredFragment> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let mut hits: Vec<(usize, f64)> = self
            .fragments
            .iter()
            .enumerate()
            .map(|(idx, fragment)| (idx, self.score(&query_tokens, fragment)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        // Stable sort keeps corpus order among equal scores
        hits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);

        hits.into_iter()
            .map(|(idx, raw)| {
                // Normalize to 0-1 range
                ScoredFragment::new(self.fragments[idx].text.clone(), raw / (raw + 1.0))
            })
            .collect()
    }
}

/// Lower-cased alphanumeric runs; `_` is a word character so ids stay whole
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
        .collect()
}

/// BM25 backend over an in-memory fragment set
pub struct LocalCorpusBackend {
    index: RwLock<LexicalIndex>,
}

impl LocalCorpusBackend {
    /// Backend with nothing indexed
    pub fn empty() -> Self {
        Self {
            index: RwLock::new(LexicalIndex::default()),
        }
    }

    /// Backend over pre-split fragments
    pub fn from_fragments(fragments: Vec<String>) -> Self {
        Self {
            index: RwLock::new(LexicalIndex::build(fragments)),
        }
    }

    /// Backend over a corpus blob
    pub fn from_corpus(blob: &str) -> Self {
        Self::from_fragments(split_corpus(blob))
    }

    /// Load the staged corpus file; a missing file yields an empty index
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(blob) => {
                let fragments = split_corpus(&blob);
                info!(
                    path = %path.display(),
                    fragments = fragments.len(),
                    "Local corpus loaded"
                );
                Ok(Self::from_fragments(fragments))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Local corpus file not found, index is empty");
                Ok(Self::empty())
            }
            Err(e) => Err(AppError::backend(format!(
                "Failed to read corpus {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Number of indexed fragments
    pub async fn fragment_count(&self) -> usize {
        self.index.read().await.fragments.len()
    }
}

#[async_trait]
impl SearchBackend for LocalCorpusBackend {
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<ScoredFragment>> {
        Ok(self.index.read().await.search(text, top_k))
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[async_trait]
impl CorpusImporter for LocalCorpusBackend {
    /// Replace the whole index with the fragments of `locations`
    async fn import(&self, corpus: &str, locations: &[String]) -> Result<()> {
        let mut fragments = Vec::new();

        for location in locations {
            let path = location
                .strip_prefix(FILE_SCHEME)
                .ok_or_else(|| AppError::Import {
                    message: format!("Unsupported location for local backend: {}", location),
                })?;
            let blob = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| AppError::Import {
                    message: format!("Failed to read {}: {}", path, e),
                })?;
            fragments.extend(split_corpus(&blob));
        }

        let count = fragments.len();
        *self.index.write().await = LexicalIndex::build(fragments);

        info!(corpus, files = locations.len(), fragments = count, "Local corpus imported");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_fragment, render_corpus};
    use crate::document::Document;

    fn corpus() -> String {
        render_corpus(&[
            Document::new(
                "q_001",
                "Describe the main strategic risks facing a bank.",
                "Strategic Risk",
                vec!["Strategic Risk".into(), "Banking".into()],
            ),
            Document::new(
                "q_002",
                "How is liquidity coverage measured?",
                "Liquidity",
                vec!["Liquidity".into()],
            ),
            Document::new(
                "q_003",
                "What does the board oversee?",
                "Governance",
                vec!["Governance".into(), "Strategic Risk".into()],
            ),
        ])
    }

    #[test]
    fn test_tokenize_keeps_ids_whole() {
        assert_eq!(tokenize("[ID: q_001]"), vec!["id", "q_001"]);
        assert_eq!(tokenize("Risk; SSBR"), vec!["risk", "ssbr"]);
    }

    #[tokio::test]
    async fn test_id_query_ranks_block_first() {
        let backend = LocalCorpusBackend::from_corpus(&corpus());
        let hits = backend.query("q_002", 10).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(decode_fragment(&hits[0].text).id, "q_002");
        assert!(hits[0].score > 0.0 && hits[0].score < 1.0);
    }

    #[tokio::test]
    async fn test_concept_query_and_limit() {
        let backend = LocalCorpusBackend::from_corpus(&corpus());

        let hits = backend.query("strategic risk", 10).await.unwrap();
        let ids: Vec<String> = hits.iter().map(|h| decode_fragment(&h.text).id).collect();
        assert!(ids.contains(&"q_001".to_string()));
        assert!(ids.contains(&"q_003".to_string()));

        let limited = backend.query("strategic risk", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_query_and_empty_index() {
        let backend = LocalCorpusBackend::from_corpus(&corpus());
        assert!(backend.query("  ;; ", 5).await.unwrap().is_empty());

        let empty = LocalCorpusBackend::empty();
        assert!(empty.query("risk", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_replaces_index() {
        let dir = std::env::temp_dir().join(format!("qrag-local-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("corpus.txt");
        std::fs::write(&path, corpus()).unwrap();

        let backend = LocalCorpusBackend::from_fragments(vec!["[ID: old]\n".into()]);
        let location = format!("{}{}", FILE_SCHEME, path.display());
        backend.import("local", &[location]).await.unwrap();

        assert_eq!(backend.fragment_count().await, 3);
        assert!(backend.query("old", 5).await.unwrap().is_empty());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_import_rejects_remote_locations() {
        let backend = LocalCorpusBackend::empty();
        let err = backend
            .import("local", &["gs://bucket/file.txt".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Import { .. }));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let path = std::env::temp_dir().join(format!("qrag-missing-{}.txt", uuid::Uuid::new_v4()));
        let backend = LocalCorpusBackend::load(&path).await.unwrap();
        assert_eq!(backend.fragment_count().await, 0);
    }
}
