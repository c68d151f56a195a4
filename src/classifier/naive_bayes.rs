//! Multinomial naive Bayes over term-count features
//!
//! `log P(c | x) ∝ log P(c) + Σ_t x_t · log P(t | c)` with Laplace-smoothed
//! term likelihoods `P(t | c) = (N_tc + α) / (N_c + α·V)`. Smoothing keeps
//! every likelihood non-zero, so single-example classes train fine and a
//! document with no known terms falls back to the class priors.

use super::vectorizer::SparseVector;
use super::ClassifierError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_ALPHA: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultinomialNb {
    /// Class labels in sorted order
    classes: Vec<String>,
    /// log P(c), parallel to `classes`
    class_log_prior: Vec<f64>,
    /// log P(t | c): one dense row per class
    feature_log_prob: Vec<Vec<f64>>,
    alpha: f64,
}

impl MultinomialNb {
    /// Fit on count vectors with their labels.
    ///
    /// `n_features` is the vocabulary size of the vectorizer that produced
    /// `samples`.
    pub fn fit(
        samples: &[SparseVector],
        labels: &[&str],
        n_features: usize,
        alpha: f64,
    ) -> Result<Self, ClassifierError> {
        if samples.is_empty() {
            return Err(ClassifierError::EmptyCorpus);
        }
        if samples.len() != labels.len() {
            return Err(ClassifierError::InvalidCorpus(format!(
                "sample count ({}) does not match label count ({})",
                samples.len(),
                labels.len()
            )));
        }
        if alpha <= 0.0 {
            return Err(ClassifierError::InvalidCorpus(format!(
                "smoothing alpha must be positive, got {alpha}"
            )));
        }

        let classes: Vec<String> = labels
            .iter()
            .map(|l| l.to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut class_count = vec![0usize; classes.len()];
        let mut feature_count = vec![vec![0.0f64; n_features]; classes.len()];

        for (sample, label) in samples.iter().zip(labels) {
            // classes came from labels, so the search always succeeds
            let Ok(c) = classes.binary_search_by(|probe| probe.as_str().cmp(*label)) else {
                continue;
            };
            class_count[c] += 1;
            for (idx, value) in sample.iter() {
                if idx < n_features {
                    feature_count[c][idx] += value;
                }
            }
        }

        let total = samples.len() as f64;
        let class_log_prior = class_count
            .iter()
            .map(|&n| (n as f64 / total).ln())
            .collect();

        let feature_log_prob = feature_count
            .into_iter()
            .map(|row| {
                let denom = (row.iter().sum::<f64>() + alpha * n_features as f64).ln();
                row.into_iter().map(|n| (n + alpha).ln() - denom).collect()
            })
            .collect();

        Ok(Self {
            classes,
            class_log_prior,
            feature_log_prob,
            alpha,
        })
    }

    /// Unnormalized log posterior per class, parallel to [`Self::classes`].
    pub fn joint_log_likelihood(&self, x: &SparseVector) -> Vec<f64> {
        self.class_log_prior
            .iter()
            .zip(&self.feature_log_prob)
            .map(|(prior, row)| prior + x.dot(row))
            .collect()
    }

    /// Most probable label. Ties go to the label that sorts first.
    pub fn predict(&self, x: &SparseVector) -> &str {
        let scores = self.joint_log_likelihood(x);
        let mut best = 0;
        for (i, &s) in scores.iter().enumerate().skip(1) {
            if s > scores[best] {
                best = i;
            }
        }
        &self.classes[best]
    }

    /// Posterior probabilities per class, parallel to [`Self::classes`].
    pub fn predict_proba(&self, x: &SparseVector) -> Vec<f64> {
        let scores = self.joint_log_likelihood(x);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let sum: f64 = exp.iter().sum();
        exp.into_iter().map(|e| e / sum).collect()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::tokenizer::Tokenizer;
    use crate::classifier::vectorizer::CountVectorizer;

    fn fit(docs: &[&str], labels: &[&str]) -> (CountVectorizer, MultinomialNb) {
        let v = CountVectorizer::fit(docs, Tokenizer::new());
        let xs: Vec<_> = docs.iter().map(|d| v.transform(d)).collect();
        let nb = MultinomialNb::fit(&xs, labels, v.vocabulary_size(), DEFAULT_ALPHA).unwrap();
        (v, nb)
    }

    #[test]
    fn test_one_example_per_class() {
        let (v, nb) = fit(
            &["apple banana", "carrot potato", "salmon tuna"],
            &["fruit", "vegetable", "fish"],
        );
        assert_eq!(nb.classes(), ["fish", "fruit", "vegetable"]);
        assert_eq!(nb.predict(&v.transform("banana apple")), "fruit");
        assert_eq!(nb.predict(&v.transform("tuna")), "fish");
    }

    #[test]
    fn test_unknown_tokens_fall_back_to_prior() {
        let (v, nb) = fit(
            &["aa bb", "cc dd", "ee ff", "gg hh"],
            &["minor", "major", "major", "major"],
        );
        assert_eq!(nb.predict(&v.transform("zz yy")), "major");
        assert_eq!(nb.predict(&v.transform("")), "major");
    }

    #[test]
    fn test_equal_priors_tie_breaks_on_sorted_label() {
        let (v, nb) = fit(&["aa", "bb"], &["zeta", "alpha"]);
        assert_eq!(nb.predict(&v.transform("")), "alpha");
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (v, nb) = fit(&["aa bb", "bb cc", "cc dd"], &["x", "y", "z"]);
        let p = nb.predict_proba(&v.transform("bb cc"));
        assert_eq!(p.len(), 3);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(p.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_fit_validation() {
        assert!(matches!(
            MultinomialNb::fit(&[], &[], 0, 1.0),
            Err(ClassifierError::EmptyCorpus)
        ));
        let x = SparseVector::default();
        assert!(matches!(
            MultinomialNb::fit(&[x.clone()], &["a", "b"], 0, 1.0),
            Err(ClassifierError::InvalidCorpus(_))
        ));
        assert!(matches!(
            MultinomialNb::fit(&[x], &["a"], 0, 0.0),
            Err(ClassifierError::InvalidCorpus(_))
        ));
    }
}
