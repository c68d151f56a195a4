//! Text vectorizers
//!
//! - [`CountVectorizer`]: bag-of-words term counts over a fitted vocabulary
//! - [`TfidfVectorizer`]: term counts scaled by smoothed inverse document
//!   frequency, then L2-normalized
//!
//! Vocabulary indices follow sorted token order, so fitting the same corpus
//! always yields the same feature layout. Tokens outside the vocabulary are
//! ignored at transform time.

use super::tokenizer::Tokenizer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Sparse feature vector: `(feature index, value)` pairs sorted by index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    /// Build from a map of index -> value (already index-ordered).
    fn from_map(map: BTreeMap<usize, f64>) -> Self {
        Self {
            entries: map.into_iter().collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().copied()
    }

    /// Number of non-zero features
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v).sum()
    }

    pub fn squared_norm(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v * v).sum()
    }

    /// Dot product with a dense vector. Indices past its end count as zero.
    pub fn dot(&self, dense: &[f64]) -> f64 {
        self.entries
            .iter()
            .filter_map(|&(i, v)| dense.get(i).map(|d| d * v))
            .sum()
    }

    pub fn to_dense(&self, dim: usize) -> Vec<f64> {
        let mut out = vec![0.0; dim];
        for &(i, v) in &self.entries {
            if i < dim {
                out[i] = v;
            }
        }
        out
    }

    fn scale(&mut self, factor: f64) {
        for (_, v) in &mut self.entries {
            *v *= factor;
        }
    }
}

/// Bag-of-words vectorizer producing raw term counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountVectorizer {
    tokenizer: Tokenizer,
    vocabulary: BTreeMap<String, usize>,
}

impl CountVectorizer {
    /// Learn the vocabulary of `docs`.
    pub fn fit<S: AsRef<str>>(docs: &[S], tokenizer: Tokenizer) -> Self {
        let terms: BTreeSet<String> = docs
            .iter()
            .flat_map(|d| tokenizer.tokenize(d.as_ref()).collect::<Vec<_>>())
            .collect();

        let vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(i, t)| (t, i))
            .collect();

        Self {
            tokenizer,
            vocabulary,
        }
    }

    pub fn transform(&self, doc: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in self.tokenizer.tokenize(doc) {
            if let Some(&idx) = self.vocabulary.get(&token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }
        SparseVector::from_map(counts)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn tokenizer(&self) -> Tokenizer {
        self.tokenizer
    }
}

/// TF-IDF vectorizer with smoothed idf and L2 row normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    counts: CountVectorizer,
    /// idf weight per vocabulary index
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learn vocabulary and document frequencies of `docs`.
    ///
    /// `idf(t) = ln((1 + n) / (1 + df(t))) + 1`, so a term present in every
    /// document still carries weight 1.
    pub fn fit<S: AsRef<str>>(docs: &[S], tokenizer: Tokenizer) -> Self {
        let counts = CountVectorizer::fit(docs, tokenizer);

        let mut df = vec![0usize; counts.vocabulary_size()];
        for doc in docs {
            for (idx, _) in counts.transform(doc.as_ref()).iter() {
                df[idx] += 1;
            }
        }

        let n = docs.len() as f64;
        let idf = df
            .into_iter()
            .map(|d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        Self { counts, idf }
    }

    pub fn transform(&self, doc: &str) -> SparseVector {
        let mut vector = self.counts.transform(doc);
        for (idx, value) in &mut vector.entries {
            *value *= self.idf[*idx];
        }

        let norm = vector.squared_norm().sqrt();
        if norm > 0.0 {
            vector.scale(1.0 / norm);
        }
        vector
    }

    pub fn vocabulary_size(&self) -> usize {
        self.counts.vocabulary_size()
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.counts.index_of(term).map(|i| self.idf[i])
    }
}
