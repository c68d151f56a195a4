//! Seeded k-means clustering over sparse feature vectors
//!
//! k-means++ seeding from a `ChaCha8Rng`, then Lloyd iterations. Several
//! restarts (`n_init`) draw from the same generator and the run with the
//! lowest inertia is kept, so a given corpus, `k` and seed always produce the
//! same centroids.

use super::vectorizer::SparseVector;
use super::{ClassifierError, Deadline};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_N_INIT: usize = 10;
pub const DEFAULT_MAX_ITER: usize = 300;
pub const DEFAULT_TOL: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KMeansConfig {
    /// Number of clusters
    pub k: usize,
    pub seed: u64,
    /// Independent restarts; the lowest-inertia run wins
    pub n_init: usize,
    pub max_iter: usize,
    /// Stop once the summed squared centroid shift drops to this value
    pub tol: f64,
}

impl KMeansConfig {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            seed: DEFAULT_SEED,
            n_init: DEFAULT_N_INIT,
            max_iter: DEFAULT_MAX_ITER,
            tol: DEFAULT_TOL,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Fitted clustering: one dense centroid per cluster id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeans {
    centroids: Vec<Vec<f64>>,
    centroid_sq_norms: Vec<f64>,
    /// Cluster id of each training sample, in corpus order
    labels: Vec<usize>,
    inertia: f64,
    n_iter: usize,
    config: KMeansConfig,
}

impl KMeans {
    pub fn fit(
        samples: &[SparseVector],
        n_features: usize,
        config: KMeansConfig,
        deadline: &Deadline,
    ) -> Result<Self, ClassifierError> {
        if samples.is_empty() {
            return Err(ClassifierError::EmptyCorpus);
        }
        if config.k == 0 || config.k > samples.len() {
            return Err(ClassifierError::InvalidClusterCount {
                k: config.k,
                samples: samples.len(),
            });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut best: Option<Run> = None;

        for _ in 0..config.n_init.max(1) {
            let seeds = kmeans_plus_plus(samples, n_features, config.k, &mut rng);
            let run = lloyd(samples, seeds, &config, deadline)?;
            if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
                best = Some(run);
            }
        }

        let run = best.ok_or(ClassifierError::EmptyCorpus)?;
        tracing::debug!(
            "k-means converged: k={}, inertia={:.6}, iterations={}",
            config.k,
            run.inertia,
            run.n_iter
        );

        let centroid_sq_norms = run.centroids.iter().map(|c| sq_norm(c)).collect();
        Ok(Self {
            centroids: run.centroids,
            centroid_sq_norms,
            labels: run.labels,
            inertia: run.inertia,
            n_iter: run.n_iter,
            config,
        })
    }

    /// Id of the nearest centroid by squared Euclidean distance (ties: lowest id).
    pub fn predict(&self, x: &SparseVector) -> usize {
        nearest(x, x.squared_norm(), &self.centroids, &self.centroid_sq_norms).0
    }

    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn inertia(&self) -> f64 {
        self.inertia
    }
}

struct Run {
    centroids: Vec<Vec<f64>>,
    labels: Vec<usize>,
    inertia: f64,
    n_iter: usize,
}

fn sq_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum()
}

/// `||x - c||²` expanded so the sparse side is only walked once.
fn sq_distance(x: &SparseVector, x_sq: f64, c: &[f64], c_sq: f64) -> f64 {
    (x_sq - 2.0 * x.dot(c) + c_sq).max(0.0)
}

fn nearest(x: &SparseVector, x_sq: f64, centroids: &[Vec<f64>], c_sq: &[f64]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, (c, &n)) in centroids.iter().zip(c_sq).enumerate() {
        let d = sq_distance(x, x_sq, c, n);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

/// k-means++ seeding: each new centre is drawn with probability proportional
/// to its squared distance from the closest centre chosen so far.
fn kmeans_plus_plus(
    samples: &[SparseVector],
    n_features: usize,
    k: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<Vec<f64>> {
    let n = samples.len();
    let x_sq: Vec<f64> = samples.iter().map(|x| x.squared_norm()).collect();

    let first = rng.random_range(0..n);
    let mut chosen = vec![first];
    let mut centres = vec![samples[first].to_dense(n_features)];

    let first_sq = sq_norm(&centres[0]);
    let mut closest: Vec<f64> = samples
        .iter()
        .zip(&x_sq)
        .map(|(x, &xs)| sq_distance(x, xs, &centres[0], first_sq))
        .collect();

    while centres.len() < k {
        let total: f64 = closest.iter().sum();
        let next = if total > 0.0 {
            let mut target = rng.random::<f64>() * total;
            let mut pick = closest.iter().rposition(|&d| d > 0.0).unwrap_or(0);
            for (i, &d) in closest.iter().enumerate() {
                if d <= 0.0 {
                    continue;
                }
                if target < d {
                    pick = i;
                    break;
                }
                target -= d;
            }
            pick
        } else {
            // every sample sits on a centre already; take the first unused one
            (0..n).find(|i| !chosen.contains(i)).unwrap_or(0)
        };

        chosen.push(next);
        let centre = samples[next].to_dense(n_features);
        let centre_sq = sq_norm(&centre);
        for ((d, x), &xs) in closest.iter_mut().zip(samples).zip(&x_sq) {
            *d = d.min(sq_distance(x, xs, &centre, centre_sq));
        }
        centres.push(centre);
    }

    centres
}

fn lloyd(
    samples: &[SparseVector],
    mut centroids: Vec<Vec<f64>>,
    config: &KMeansConfig,
    deadline: &Deadline,
) -> Result<Run, ClassifierError> {
    let x_sq: Vec<f64> = samples.iter().map(|x| x.squared_norm()).collect();
    let n_features = centroids.first().map_or(0, Vec::len);
    let mut n_iter = 0;

    for _ in 0..config.max_iter {
        deadline.check()?;
        n_iter += 1;

        let c_sq: Vec<f64> = centroids.iter().map(|c| sq_norm(c)).collect();
        let mut sums = vec![vec![0.0; n_features]; centroids.len()];
        let mut counts = vec![0usize; centroids.len()];

        for (x, &xs) in samples.iter().zip(&x_sq) {
            let (label, _) = nearest(x, xs, &centroids, &c_sq);
            counts[label] += 1;
            for (idx, v) in x.iter() {
                sums[label][idx] += v;
            }
        }

        let mut shift = 0.0;
        for ((centroid, sum), &count) in centroids.iter_mut().zip(sums).zip(&counts) {
            // an empty cluster keeps its previous centre
            if count == 0 {
                continue;
            }
            let updated: Vec<f64> = sum.into_iter().map(|s| s / count as f64).collect();
            shift += centroid
                .iter()
                .zip(&updated)
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f64>();
            *centroid = updated;
        }

        if shift <= config.tol {
            break;
        }
    }

    let c_sq: Vec<f64> = centroids.iter().map(|c| sq_norm(c)).collect();
    let mut labels = Vec::with_capacity(samples.len());
    let mut inertia = 0.0;
    for (x, &xs) in samples.iter().zip(&x_sq) {
        let (label, d) = nearest(x, xs, &centroids, &c_sq);
        labels.push(label);
        inertia += d;
    }

    Ok(Run {
        centroids,
        labels,
        inertia,
        n_iter,
    })
}
