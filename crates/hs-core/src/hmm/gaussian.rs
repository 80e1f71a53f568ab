//! Diagonal-covariance Gaussian HMM trained with Baum-Welch EM.
//!
//! All recursions run in log space. Each sequence of a
//! [`ConcatenatedSequences`] is an independent segment: the forward pass
//! restarts from the start distribution at every segment boundary, and the
//! expected counts of all segments are pooled before each M-step.

use hs_common::ConcatenatedSequences;
use hs_config::TrainerConfig;
use hs_math::{column_moments, diag_gaussian_log_pdf, log_sum_exp, normalize_in_place, safe_ln};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::kmeans::kmeans_centroids;
use super::{ModelTrainer, ScoringError, SequenceModel, TrainingError};
use crate::logging::Stage;

/// Number of free parameters the BIC criterion charges a model with
/// `n_states` states over `dim` features: `K² + 2·K·D − 1`.
pub fn bic_parameter_count(n_states: usize, dim: usize) -> usize {
    (n_states * n_states + 2 * n_states * dim).saturating_sub(1)
}

/// A fitted Gaussian HMM with diagonal covariances.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianHmm {
    n_states: usize,
    dim: usize,
    /// ln π, length K.
    log_start: Vec<f64>,
    /// ln A, row-major K × K.
    log_trans: Vec<f64>,
    /// Row-major K × D.
    means: Vec<f64>,
    /// Row-major K × D, every entry > 0.
    vars: Vec<f64>,
}

impl GaussianHmm {
    /// Build a model from explicit probabilities and emission parameters.
    ///
    /// `start` has K entries, `trans` K × K, `means` and `vars` K × D.
    /// Probabilities are normalized; variances must be positive.
    pub fn from_parameters(
        start: Vec<f64>,
        trans: Vec<f64>,
        means: Vec<f64>,
        vars: Vec<f64>,
    ) -> Result<Self, TrainingError> {
        let n_states = start.len();
        if n_states == 0 {
            return Err(TrainingError::ZeroStates);
        }
        if trans.len() != n_states * n_states {
            return Err(TrainingError::DimensionMismatch {
                expected: n_states * n_states,
                got: trans.len(),
            });
        }
        if means.is_empty() || means.len() % n_states != 0 {
            return Err(TrainingError::EmptyInput);
        }
        let dim = means.len() / n_states;
        if vars.len() != means.len() {
            return Err(TrainingError::DimensionMismatch {
                expected: means.len(),
                got: vars.len(),
            });
        }
        if let Some(pos) = vars.iter().position(|v| !(*v > 0.0 && v.is_finite())) {
            return Err(TrainingError::DegenerateCovariance {
                state: pos / dim,
            });
        }

        let mut start = start;
        normalize_in_place(&mut start);
        let mut trans = trans;
        for row in trans.chunks_exact_mut(n_states) {
            normalize_in_place(row);
        }

        Ok(Self {
            n_states,
            dim,
            log_start: start.iter().map(|p| safe_ln(*p)).collect(),
            log_trans: trans.iter().map(|p| safe_ln(*p)).collect(),
            means,
            vars,
        })
    }

    /// Observation dimension D.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Start distribution π.
    pub fn start_probs(&self) -> Vec<f64> {
        self.log_start.iter().map(|lp| lp.exp()).collect()
    }

    /// Transition matrix A, row-major K × K.
    pub fn transition_probs(&self) -> Vec<f64> {
        self.log_trans.iter().map(|lp| lp.exp()).collect()
    }

    /// Mean vector of one state.
    pub fn mean(&self, state: usize) -> &[f64] {
        &self.means[state * self.dim..(state + 1) * self.dim]
    }

    /// Diagonal variances of one state.
    pub fn variance(&self, state: usize) -> &[f64] {
        &self.vars[state * self.dim..(state + 1) * self.dim]
    }

    /// Per-row, per-state emission log densities, row-major T × K.
    fn emission_log_probs(&self, segment: &[f64]) -> Vec<f64> {
        let k = self.n_states;
        let d = self.dim;
        let mut log_b = Vec::with_capacity(segment.len() / d * k);
        for x in segment.chunks_exact(d) {
            for s in 0..k {
                log_b.push(diag_gaussian_log_pdf(
                    x,
                    &self.means[s * d..(s + 1) * d],
                    &self.vars[s * d..(s + 1) * d],
                ));
            }
        }
        log_b
    }

    /// Forward pass. Returns ln α (T × K) and the segment log-likelihood.
    fn forward(&self, log_b: &[f64], t_len: usize) -> (Vec<f64>, f64) {
        let k = self.n_states;
        let mut alpha = vec![f64::NEG_INFINITY; t_len * k];
        for s in 0..k {
            alpha[s] = self.log_start[s] + log_b[s];
        }

        let mut buf = vec![0.0; k];
        for t in 1..t_len {
            for j in 0..k {
                for (i, b) in buf.iter_mut().enumerate() {
                    *b = alpha[(t - 1) * k + i] + self.log_trans[i * k + j];
                }
                alpha[t * k + j] = log_sum_exp(&buf) + log_b[t * k + j];
            }
        }

        let log_likelihood = log_sum_exp(&alpha[(t_len - 1) * k..]);
        (alpha, log_likelihood)
    }

    /// Backward pass. Returns ln β (T × K).
    fn backward(&self, log_b: &[f64], t_len: usize) -> Vec<f64> {
        let k = self.n_states;
        let mut beta = vec![0.0; t_len * k];
        let mut buf = vec![0.0; k];
        for t in (0..t_len.saturating_sub(1)).rev() {
            for i in 0..k {
                for (j, b) in buf.iter_mut().enumerate() {
                    *b = self.log_trans[i * k + j] + log_b[(t + 1) * k + j] + beta[(t + 1) * k + j];
                }
                beta[t * k + i] = log_sum_exp(&buf);
            }
        }
        beta
    }

    /// E-step over every segment.
    fn expected_counts(&self, data: &ConcatenatedSequences) -> Result<SufficientStats, TrainingError> {
        let k = self.n_states;
        let d = self.dim;
        let mut stats = SufficientStats::zeros(k, d);

        for segment in data.segments() {
            let t_len = segment.len() / d;
            let log_b = self.emission_log_probs(segment);
            let (alpha, log_likelihood) = self.forward(&log_b, t_len);
            if !log_likelihood.is_finite() {
                return Err(TrainingError::NonFiniteLikelihood);
            }
            let beta = self.backward(&log_b, t_len);
            stats.log_likelihood += log_likelihood;

            for t in 0..t_len {
                let x = &segment[t * d..(t + 1) * d];
                for s in 0..k {
                    let gamma = (alpha[t * k + s] + beta[t * k + s] - log_likelihood).exp();
                    if t == 0 {
                        stats.start[s] += gamma;
                    }
                    stats.post[s] += gamma;
                    for (f, xf) in x.iter().enumerate() {
                        stats.obs[s * d + f] += gamma * xf;
                        stats.obs_sq[s * d + f] += gamma * xf * xf;
                    }
                }
            }

            for t in 0..t_len.saturating_sub(1) {
                for i in 0..k {
                    for j in 0..k {
                        stats.trans[i * k + j] += (alpha[t * k + i]
                            + self.log_trans[i * k + j]
                            + log_b[(t + 1) * k + j]
                            + beta[(t + 1) * k + j]
                            - log_likelihood)
                            .exp();
                    }
                }
            }
        }

        Ok(stats)
    }

    /// M-step: re-estimate every parameter from pooled expected counts.
    fn maximize(&mut self, stats: &SufficientStats, min_covar: f64) -> Result<(), TrainingError> {
        let k = self.n_states;
        let d = self.dim;

        let mut start = stats.start.clone();
        if normalize_in_place(&mut start) > 0.0 {
            self.log_start = start.iter().map(|p| safe_ln(*p)).collect();
        }

        // A state never left keeps its previous outgoing row.
        for i in 0..k {
            let mut row = stats.trans[i * k..(i + 1) * k].to_vec();
            if normalize_in_place(&mut row) > 0.0 {
                for (lp, p) in self.log_trans[i * k..(i + 1) * k].iter_mut().zip(&row) {
                    *lp = safe_ln(*p);
                }
            }
        }

        for s in 0..k {
            let denom = stats.post[s];
            if !(denom > 0.0 && denom.is_finite()) {
                return Err(TrainingError::DegenerateCovariance { state: s });
            }
            for f in 0..d {
                let idx = s * d + f;
                let mean = stats.obs[idx] / denom;
                let spread = (stats.obs_sq[idx] - 2.0 * mean * stats.obs[idx]
                    + mean * mean * denom)
                    / denom;
                self.means[idx] = mean;
                self.vars[idx] = spread.max(0.0) + min_covar;
            }
        }

        Ok(())
    }

    fn total_log_likelihood(&self, data: &ConcatenatedSequences) -> f64 {
        data.segments()
            .map(|segment| {
                let log_b = self.emission_log_probs(segment);
                self.forward(&log_b, segment.len() / self.dim).1
            })
            .sum()
    }
}

impl SequenceModel for GaussianHmm {
    fn score(&self, data: &ConcatenatedSequences) -> Result<f64, ScoringError> {
        if data.dim() != self.dim {
            return Err(ScoringError::DimensionMismatch {
                expected: self.dim,
                got: data.dim(),
            });
        }
        if data.n_rows() == 0 || data.lengths().contains(&0) {
            return Err(ScoringError::EmptySequence);
        }
        let log_likelihood = self.total_log_likelihood(data);
        if log_likelihood.is_finite() {
            Ok(log_likelihood)
        } else {
            Err(ScoringError::NonFinite)
        }
    }

    fn n_states(&self) -> usize {
        self.n_states
    }
}

/// Pooled expected counts from one E-step.
struct SufficientStats {
    log_likelihood: f64,
    start: Vec<f64>,
    trans: Vec<f64>,
    post: Vec<f64>,
    obs: Vec<f64>,
    obs_sq: Vec<f64>,
}

impl SufficientStats {
    fn zeros(k: usize, d: usize) -> Self {
        Self {
            log_likelihood: 0.0,
            start: vec![0.0; k],
            trans: vec![0.0; k * k],
            post: vec![0.0; k],
            obs: vec![0.0; k * d],
            obs_sq: vec![0.0; k * d],
        }
    }
}

/// Baum-Welch trainer for [`GaussianHmm`].
#[derive(Debug, Clone, Default)]
pub struct GaussianHmmTrainer {
    config: TrainerConfig,
}

impl GaussianHmmTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Uniform π and A, k-means means, global variance plus the floor.
    fn initial_model(
        &self,
        data: &ConcatenatedSequences,
        n_states: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<GaussianHmm, TrainingError> {
        let dim = data.dim();
        let (_, global_var) =
            column_moments(data.data(), dim).ok_or(TrainingError::EmptyInput)?;

        let means = kmeans_centroids(data.data(), dim, n_states, self.config.kmeans_iters, rng);
        let vars: Vec<f64> = (0..n_states)
            .flat_map(|_| global_var.iter().map(|v| v + self.config.min_covar))
            .collect();

        let uniform = -(n_states as f64).ln();
        Ok(GaussianHmm {
            n_states,
            dim,
            log_start: vec![uniform; n_states],
            log_trans: vec![uniform; n_states * n_states],
            means,
            vars,
        })
    }
}

impl ModelTrainer for GaussianHmmTrainer {
    type Model = GaussianHmm;

    fn train(
        &self,
        data: &ConcatenatedSequences,
        n_states: usize,
        seed: u64,
    ) -> Result<GaussianHmm, TrainingError> {
        if n_states == 0 {
            return Err(TrainingError::ZeroStates);
        }
        let rows = data.n_rows();
        if rows == 0 {
            return Err(TrainingError::EmptyInput);
        }
        if rows < n_states {
            return Err(TrainingError::InsufficientData { rows, n_states });
        }

        let span = tracing::debug_span!("train", stage = %Stage::Train, n_states);
        let _entered = span.enter();

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut model = self.initial_model(data, n_states, &mut rng)?;

        let mut log_likelihood = f64::NEG_INFINITY;
        let mut converged = false;
        let mut iterations = 0;
        while iterations < self.config.n_iter {
            let stats = model.expected_counts(data)?;
            iterations += 1;
            let improvement = stats.log_likelihood - log_likelihood;
            log_likelihood = stats.log_likelihood;
            if improvement < self.config.tol {
                converged = true;
                break;
            }
            model.maximize(&stats, self.config.min_covar)?;
        }

        // The last M-step has not been evaluated yet when the budget ran out.
        if !converged {
            log_likelihood = model.total_log_likelihood(data);
        }
        if !log_likelihood.is_finite() {
            return Err(TrainingError::NonFiniteLikelihood);
        }

        tracing::debug!(
            target: "hmm.train",
            n_states,
            iterations,
            converged,
            log_likelihood,
            "EM finished"
        );

        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_regime_data() -> ConcatenatedSequences {
        // Two sequences alternating between a low and a high regime.
        let mut seqs = Vec::new();
        for offset in [0.0, 0.05] {
            let mut seq = Vec::new();
            for t in 0..12 {
                let level = if (t / 3) % 2 == 0 { 0.0 } else { 5.0 };
                seq.push(vec![level + offset + 0.01 * t as f64, -level + offset]);
            }
            seqs.push(seq);
        }
        ConcatenatedSequences::from_sequences(&seqs).unwrap()
    }

    fn quick_trainer() -> GaussianHmmTrainer {
        GaussianHmmTrainer::new(TrainerConfig {
            n_iter: 50,
            ..TrainerConfig::default()
        })
    }

    #[test]
    fn bic_parameter_count_formula() {
        assert_eq!(bic_parameter_count(2, 2), 4 + 8 - 1);
        assert_eq!(bic_parameter_count(3, 1), 9 + 6 - 1);
        assert_eq!(bic_parameter_count(0, 4), 0);
    }

    #[test]
    fn training_succeeds_with_finite_self_score() {
        let data = two_regime_data();
        let model = quick_trainer().train(&data, 2, 14).unwrap();
        assert_eq!(model.n_states(), 2);
        assert_eq!(model.dim(), 2);
        assert!(model.score(&data).unwrap().is_finite());
    }

    #[test]
    fn trained_probabilities_are_stochastic() {
        let model = quick_trainer().train(&two_regime_data(), 3, 1).unwrap();
        let start: f64 = model.start_probs().iter().sum();
        assert!((start - 1.0).abs() < 1e-9);
        for row in model.transition_probs().chunks_exact(3) {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
        }
        for s in 0..3 {
            assert!(model.variance(s).iter().all(|v| *v >= 1e-3));
        }
    }

    #[test]
    fn two_states_recover_regimes() {
        let model = quick_trainer().train(&two_regime_data(), 2, 14).unwrap();
        let mut first_dims: Vec<f64> = (0..2).map(|s| model.mean(s)[0]).collect();
        first_dims.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!(first_dims[0] < 1.0);
        assert!(first_dims[1] > 4.0);
    }

    #[test]
    fn training_is_deterministic_per_seed() {
        let data = two_regime_data();
        let a = quick_trainer().train(&data, 2, 7).unwrap();
        let b = quick_trainer().train(&data, 2, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_zero_states() {
        let err = quick_trainer().train(&two_regime_data(), 0, 14).unwrap_err();
        assert_eq!(err, TrainingError::ZeroStates);
    }

    #[test]
    fn rejects_more_states_than_rows() {
        let data = ConcatenatedSequences::from_sequence(&vec![vec![1.0], vec![2.0]]).unwrap();
        let err = quick_trainer().train(&data, 3, 14).unwrap_err();
        assert_eq!(
            err,
            TrainingError::InsufficientData {
                rows: 2,
                n_states: 3
            }
        );
    }

    #[test]
    fn score_rejects_dimension_mismatch() {
        let model = quick_trainer().train(&two_regime_data(), 2, 14).unwrap();
        let other = ConcatenatedSequences::from_sequence(&vec![vec![1.0]]).unwrap();
        assert_eq!(
            model.score(&other).unwrap_err(),
            ScoringError::DimensionMismatch {
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn score_is_sum_over_segments() {
        let model = quick_trainer().train(&two_regime_data(), 2, 14).unwrap();
        let a = vec![vec![0.0, 0.0], vec![5.0, -5.0]];
        let b = vec![vec![5.0, -5.0], vec![5.1, -5.0], vec![0.0, 0.1]];
        let joint = ConcatenatedSequences::from_sequences([&a, &b]).unwrap();
        let separate = model.score(&ConcatenatedSequences::from_sequence(&a).unwrap()).unwrap()
            + model.score(&ConcatenatedSequences::from_sequence(&b).unwrap()).unwrap();
        assert!((model.score(&joint).unwrap() - separate).abs() < 1e-9);
    }

    #[test]
    fn single_state_score_matches_gaussian_density() {
        let model =
            GaussianHmm::from_parameters(vec![1.0], vec![1.0], vec![0.0], vec![1.0]).unwrap();
        let data = ConcatenatedSequences::from_sequence(&vec![vec![0.0], vec![1.0]]).unwrap();
        let expected = diag_gaussian_log_pdf(&[0.0], &[0.0], &[1.0])
            + diag_gaussian_log_pdf(&[1.0], &[0.0], &[1.0]);
        assert!((model.score(&data).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn from_parameters_validates_shapes() {
        assert_eq!(
            GaussianHmm::from_parameters(vec![], vec![], vec![], vec![]).unwrap_err(),
            TrainingError::ZeroStates
        );
        assert!(matches!(
            GaussianHmm::from_parameters(vec![0.5, 0.5], vec![1.0], vec![0.0, 1.0], vec![1.0, 1.0]),
            Err(TrainingError::DimensionMismatch { .. })
        ));
        assert_eq!(
            GaussianHmm::from_parameters(
                vec![0.5, 0.5],
                vec![0.5; 4],
                vec![0.0, 1.0],
                vec![1.0, 0.0]
            )
            .unwrap_err(),
            TrainingError::DegenerateCovariance { state: 1 }
        );
    }
}
