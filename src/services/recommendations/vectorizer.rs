//! TF-IDF vectorizer over catalog fusion text.
//!
//! Rows are L2-normalized so cosine similarity between two rows is a plain
//! dot product.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{AppError, AppResult};

/// English function words dropped before counting
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "became", "because", "been", "before", "being", "below", "between",
    "both", "but", "by", "can", "cannot", "could", "did", "do", "does", "doing", "down",
    "during", "each", "either", "else", "even", "ever", "every", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "however", "i", "if", "in", "into", "is", "it", "its", "itself",
    "just", "least", "less", "may", "me", "might", "more", "most", "much", "must", "my",
    "myself", "neither", "no", "nor", "not", "now", "of", "off", "often", "on", "once", "one",
    "only", "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over",
    "own", "per", "perhaps", "rather", "same", "she", "should", "since", "so", "some", "still",
    "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there",
    "these", "they", "this", "those", "though", "through", "thus", "to", "too", "under",
    "until", "up", "upon", "us", "very", "was", "we", "well", "were", "what", "whatever",
    "when", "where", "whether", "which", "while", "who", "whoever", "whole", "whom", "whose",
    "why", "will", "with", "within", "without", "would", "yet", "you", "your", "yours",
    "yourself", "yourselves",
];

/// Splits text into lowercase word tokens of two or more characters,
/// without stop words
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| w.chars().count() > 1)
        .filter(|w| !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Sparse row: `(dimension, weight)` pairs sorted by dimension
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f32)>,
}

impl SparseVector {
    pub fn entries(&self) -> &[(usize, f32)] {
        &self.entries
    }

    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
    }

    /// Dot product with a dense vector of the model's dimensionality
    pub fn dot(&self, dense: &[f32]) -> f32 {
        self.entries
            .iter()
            .map(|&(dim, w)| w * dense.get(dim).copied().unwrap_or(0.0))
            .sum()
    }

    /// `dense += weight * self`
    pub fn add_scaled_to(&self, dense: &mut [f32], weight: f32) {
        for &(dim, w) in &self.entries {
            if let Some(slot) = dense.get_mut(dim) {
                *slot += weight * w;
            }
        }
    }
}

/// Fitted term-weighting model: vocabulary, IDF weights and one normalized
/// row per document
#[derive(Debug, Clone)]
pub struct VectorModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    rows: Vec<SparseVector>,
}

impl VectorModel {
    /// Fits the model over every document, in order
    ///
    /// Row `i` of the result corresponds to `documents[i]`. Vocabulary
    /// dimensions are assigned in lexical term order, so fitting the same
    /// documents twice yields the same model.
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> AppResult<Self> {
        if documents.is_empty() {
            return Err(AppError::InvalidInput(
                "Cannot fit a vector model on an empty catalog".to_string(),
            ));
        }

        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d.as_ref())).collect();

        let terms: BTreeSet<&str> = tokenized
            .iter()
            .flat_map(|tokens| tokens.iter().map(String::as_str))
            .collect();
        let vocabulary: HashMap<String, usize> = terms
            .iter()
            .enumerate()
            .map(|(dim, term)| (term.to_string(), dim))
            .collect();

        let mut doc_freq = vec![0usize; vocabulary.len()];
        let mut counts: Vec<BTreeMap<usize, f32>> = Vec::with_capacity(tokenized.len());
        for tokens in &tokenized {
            let mut tf: BTreeMap<usize, f32> = BTreeMap::new();
            for token in tokens {
                if let Some(&dim) = vocabulary.get(token) {
                    *tf.entry(dim).or_insert(0.0) += 1.0;
                }
            }
            for &dim in tf.keys() {
                doc_freq[dim] += 1;
            }
            counts.push(tf);
        }

        // Smoothed IDF: ln((1 + n) / (1 + df)) + 1
        let n = documents.len() as f32;
        let idf: Vec<f32> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0)
            .collect();

        let rows = counts
            .into_iter()
            .map(|tf| {
                let mut entries: Vec<(usize, f32)> =
                    tf.into_iter().map(|(dim, count)| (dim, count * idf[dim])).collect();
                let norm = entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
                if norm > 0.0 {
                    for (_, w) in entries.iter_mut() {
                        *w /= norm;
                    }
                }
                SparseVector { entries }
            })
            .collect();

        let model = Self {
            vocabulary,
            idf,
            rows,
        };

        tracing::info!(
            documents = model.len(),
            vocabulary = model.dimensions(),
            "Vector model fitted"
        );

        Ok(model)
    }

    /// Number of document rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Vocabulary size
    pub fn dimensions(&self) -> usize {
        self.idf.len()
    }

    pub fn row(&self, index: usize) -> Option<&SparseVector> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> &[SparseVector] {
        &self.rows
    }

    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.term_index(term).map(|dim| self.idf[dim])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<&'static str> {
        vec![
            "Romance School a shy girl falls in love at school",
            "Romance Drama a boy and a girl meet again after years",
            "Comedy School students run a chaotic club",
        ]
    }

    #[test]
    fn test_tokenize_drops_stop_words_and_single_chars() {
        let tokens = tokenize("The Girl and a Boy: x-ray, Love!");
        assert_eq!(tokens, vec!["girl", "boy", "ray", "love"]);
    }

    #[test]
    fn test_fit_empty_catalog_fails() {
        let documents: Vec<String> = Vec::new();
        let result = VectorModel::fit(&documents);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_rows_are_unit_length() {
        let model = VectorModel::fit(&corpus()).unwrap();
        assert_eq!(model.len(), 3);
        for row in model.rows() {
            assert!((row.norm() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_stop_words_are_not_in_vocabulary() {
        let model = VectorModel::fit(&corpus()).unwrap();
        assert!(model.term_index("the").is_none());
        assert!(model.term_index("and").is_none());
        assert!(model.term_index("romance").is_some());
    }

    #[test]
    fn test_rarer_terms_weigh_more() {
        let model = VectorModel::fit(&corpus()).unwrap();
        // "school" appears in two documents, "chaotic" in one
        assert!(model.idf("chaotic").unwrap() > model.idf("school").unwrap());
    }

    #[test]
    fn test_fit_is_deterministic() {
        let first = VectorModel::fit(&corpus()).unwrap();
        let second = VectorModel::fit(&corpus()).unwrap();
        assert_eq!(first.rows(), second.rows());
        assert_eq!(first.term_index("girl"), second.term_index("girl"));
    }

    #[test]
    fn test_document_without_terms_has_empty_row() {
        let model = VectorModel::fit(&["romance story", "the and of"]).unwrap();
        assert!(model.row(1).unwrap().entries().is_empty());
        assert_eq!(model.row(1).unwrap().norm(), 0.0);
    }

    #[test]
    fn test_sparse_dot_and_accumulate() {
        let model = VectorModel::fit(&corpus()).unwrap();
        let row = model.row(0).unwrap();

        let mut dense = vec![0.0; model.dimensions()];
        row.add_scaled_to(&mut dense, 2.0);
        assert!((row.dot(&dense) - 2.0).abs() < 1e-5);
    }
}
