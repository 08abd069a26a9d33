use ndarray::{Array1, Array2, Axis};
use std::sync::RwLock;
use tracing::{info, warn};

/// Process-wide principal-components model reducing description embeddings
/// to 3-D coordinates for visualization.
///
/// The model is lazily fitted on the first embedding it sees and is immutable
/// afterwards from the projection path; `fit` may still be called for an
/// offline batch refit. Projection is deterministic for a fitted model.
pub struct PcaProjector {
    state: RwLock<Option<FittedPca>>,
}

struct FittedPca {
    mean: Array1<f64>,
    components: Vec<Array1<f64>>,
}

impl Default for PcaProjector {
    fn default() -> Self {
        Self::new()
    }
}

impl PcaProjector {
    pub const OUTPUT_DIMS: usize = 3;

    const POWER_ITERATIONS: usize = 100;
    const CONVERGENCE_EPS: f64 = 1e-9;

    pub fn new() -> Self {
        Self {
            state: RwLock::new(None),
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.state.read().expect("pca lock poisoned").is_some()
    }

    /// Fit (or refit) the model on a batch of embeddings. A single-sample fit
    /// is tolerated: it yields a degenerate but deterministic basis.
    pub fn fit(&self, samples: &[Vec<f64>]) {
        let Some(first) = samples.first() else {
            return;
        };
        let dims = first.len();
        if dims == 0 || samples.iter().any(|s| s.len() != dims) {
            warn!("refusing to fit projection on inconsistent embedding dimensions");
            return;
        }

        let n = samples.len();
        let mut data = Array2::<f64>::zeros((n, dims));
        for (i, sample) in samples.iter().enumerate() {
            for (j, v) in sample.iter().enumerate() {
                data[[i, j]] = *v;
            }
        }

        let mean = data.mean_axis(Axis(0)).expect("non-empty sample matrix");
        let mut centered = data - &mean;

        let mut components = Vec::with_capacity(Self::OUTPUT_DIMS);
        for k in 0..Self::OUTPUT_DIMS {
            match Self::dominant_axis(&centered, k) {
                Some(axis) => {
                    // Deflate so the next pass finds the next component.
                    let scores = centered.dot(&axis);
                    for (i, score) in scores.iter().enumerate() {
                        let mut row = centered.row_mut(i);
                        row.scaled_add(-score, &axis);
                    }
                    components.push(axis);
                }
                None => components.push(Self::basis_axis(dims, k, &components)),
            }
        }

        let mut state = self.state.write().expect("pca lock poisoned");
        *state = Some(FittedPca { mean, components });
        info!(samples = n, dims, "projection model fitted");
    }

    /// Project an embedding to 3-D. Lazily fits on this embedding if the
    /// model has never been fitted. Dimension mismatches project to origin.
    pub fn project(&self, embedding: &[f64]) -> (f64, f64, f64) {
        if embedding.is_empty() {
            return (0.0, 0.0, 0.0);
        }
        if !self.is_fitted() {
            self.fit(&[embedding.to_vec()]);
        }

        let state = self.state.read().expect("pca lock poisoned");
        let Some(fitted) = state.as_ref() else {
            return (0.0, 0.0, 0.0);
        };
        if embedding.len() != fitted.mean.len() {
            warn!(
                got = embedding.len(),
                expected = fitted.mean.len(),
                "embedding dimension mismatch, projecting to origin"
            );
            return (0.0, 0.0, 0.0);
        }

        let x = Array1::from_iter(embedding.iter().copied()) - &fitted.mean;
        let mut coords = [0.0; Self::OUTPUT_DIMS];
        for (k, component) in fitted.components.iter().enumerate() {
            coords[k] = x.dot(component);
        }
        (coords[0], coords[1], coords[2])
    }

    /// Dominant principal axis of the (already deflated) centered matrix via
    /// power iteration on the implicit covariance. Returns None when the
    /// remaining variance is effectively zero.
    fn dominant_axis(centered: &Array2<f64>, k: usize) -> Option<Array1<f64>> {
        let dims = centered.ncols();
        let denom = (centered.nrows().max(2) - 1) as f64;

        // Deterministic start: ones plus a nudge on the k-th coordinate so
        // consecutive components do not share a starting point.
        let mut v = Array1::<f64>::ones(dims);
        if k < dims {
            v[k] += 1.0;
        }
        let norm = v.dot(&v).sqrt();
        v.mapv_inplace(|x| x / norm);

        for _ in 0..Self::POWER_ITERATIONS {
            let scores = centered.dot(&v);
            let mut next = centered.t().dot(&scores);
            next.mapv_inplace(|x| x / denom);

            let norm = next.dot(&next).sqrt();
            if norm < Self::CONVERGENCE_EPS {
                return None;
            }
            next.mapv_inplace(|x| x / norm);

            let delta = (&next - &v).mapv(|x| x.abs()).sum();
            v = next;
            if delta < Self::CONVERGENCE_EPS {
                break;
            }
        }
        Some(v)
    }

    /// Fallback axis when no variance remains: the first standard basis
    /// vector orthogonal to every component found so far.
    fn basis_axis(dims: usize, k: usize, existing: &[Array1<f64>]) -> Array1<f64> {
        for i in k..dims {
            let mut axis = Array1::<f64>::zeros(dims);
            axis[i] = 1.0;
            for comp in existing {
                let proj = axis.dot(comp);
                axis.scaled_add(-proj, comp);
            }
            let norm = axis.dot(&axis).sqrt();
            if norm > 1e-6 {
                axis.mapv_inplace(|x| x / norm);
                return axis;
            }
        }
        Array1::<f64>::zeros(dims)
    }
}

/// Recency-weighted, L2-normalized centroid of a set of embeddings. Weights
/// follow 1/(i+1) over the input order (most recent first).
pub fn recency_weighted_centroid(embeddings: &[Vec<f64>]) -> Vec<f64> {
    let Some(first) = embeddings.first() else {
        return Vec::new();
    };
    let dims = first.len();
    let mut acc = vec![0.0; dims];
    let mut total_weight = 0.0;

    for (i, emb) in embeddings.iter().enumerate() {
        if emb.len() != dims {
            continue;
        }
        let weight = 1.0 / (i as f64 + 1.0);
        total_weight += weight;
        for (a, v) in acc.iter_mut().zip(emb.iter()) {
            *a += weight * v;
        }
    }

    if total_weight > 0.0 {
        for a in acc.iter_mut() {
            *a /= total_weight;
        }
    }

    let norm = acc.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for a in acc.iter_mut() {
            *a /= norm;
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_projection_lazily_fits_and_lands_on_origin() {
        let pca = PcaProjector::new();
        assert!(!pca.is_fitted());

        // A single-sample fit centers on that sample, so it projects to 0.
        let (x, y, z) = pca.project(&[0.5, 0.1, 0.9, 0.3]);
        assert!(pca.is_fitted());
        assert!(x.abs() < 1e-9 && y.abs() < 1e-9 && z.abs() < 1e-9);
    }

    #[test]
    fn projection_is_deterministic_after_fit() {
        let pca = PcaProjector::new();
        pca.fit(&[
            vec![1.0, 0.0, 0.0, 0.0],
            vec![2.0, 0.1, 0.0, 0.0],
            vec![3.0, 0.0, 0.1, 0.0],
        ]);
        let a = pca.project(&[1.5, 0.05, 0.02, 0.0]);
        let b = pca.project(&[1.5, 0.05, 0.02, 0.0]);
        assert_eq!(a, b);
    }

    #[test]
    fn first_component_captures_the_dominant_direction() {
        // Points spread along the first coordinate only.
        let samples: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64, 0.0, 0.0, 0.0, 0.0]).collect();
        let pca = PcaProjector::new();
        pca.fit(&samples);

        let (low, _, _) = pca.project(&[0.0, 0.0, 0.0, 0.0, 0.0]);
        let (high, _, _) = pca.project(&[9.0, 0.0, 0.0, 0.0, 0.0]);
        // The two extremes separate along the first axis.
        assert!((high - low).abs() > 5.0);
    }

    #[test]
    fn dimension_mismatch_projects_to_origin() {
        let pca = PcaProjector::new();
        pca.fit(&[vec![1.0, 2.0, 3.0], vec![2.0, 1.0, 0.0]]);
        assert_eq!(pca.project(&[1.0, 2.0]), (0.0, 0.0, 0.0));
    }

    #[test]
    fn centroid_weights_recent_items_higher() {
        let centroid = recency_weighted_centroid(&[vec![1.0, 0.0], vec![0.0, 1.0]]);
        // Weight 1.0 on the first, 0.5 on the second, then L2-normalized.
        assert!(centroid[0] > centroid[1]);
        let norm: f64 = centroid.iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn centroid_of_empty_input_is_empty() {
        assert!(recency_weighted_centroid(&[]).is_empty());
    }
}
