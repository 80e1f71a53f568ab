//! Seeded k-means used to place the initial state means.

use hs_math::squared_distance;
use rand::Rng;

/// Cluster `rows × dim` data into `k` centroids (row-major `k × dim`).
///
/// Seeding follows k-means++, then runs at most `iters` Lloyd updates.
/// Empty clusters keep their previous centroid. Requires `1 <= k <= rows`.
pub(crate) fn kmeans_centroids<R: Rng>(
    data: &[f64],
    dim: usize,
    k: usize,
    iters: usize,
    rng: &mut R,
) -> Vec<f64> {
    let n = data.len() / dim;
    let row = |i: usize| &data[i * dim..(i + 1) * dim];

    let mut centroids = Vec::with_capacity(k * dim);
    let first = rng.random_range(0..n);
    centroids.extend_from_slice(row(first));

    let mut nearest_d2: Vec<f64> = (0..n)
        .map(|i| squared_distance(row(i), row(first)))
        .collect();

    for _ in 1..k {
        let total: f64 = nearest_d2.iter().sum();
        let pick = if total > 0.0 {
            let mut target = rng.random::<f64>() * total;
            let mut chosen = None;
            for (i, d) in nearest_d2.iter().enumerate() {
                if target < *d {
                    chosen = Some(i);
                    break;
                }
                target -= d;
            }
            // Rounding can walk off the end; fall back to the last candidate.
            chosen
                .or_else(|| nearest_d2.iter().rposition(|d| *d > 0.0))
                .unwrap_or(0)
        } else {
            rng.random_range(0..n)
        };

        let center = row(pick).to_vec();
        for (i, d2) in nearest_d2.iter_mut().enumerate() {
            *d2 = d2.min(squared_distance(row(i), &center));
        }
        centroids.extend_from_slice(&center);
    }

    let mut labels = vec![usize::MAX; n];
    for _ in 0..iters {
        let mut changed = false;
        for (i, label) in labels.iter_mut().enumerate() {
            let best = nearest_centroid(row(i), &centroids, dim);
            if *label != best {
                *label = best;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        let mut sums = vec![0.0; k * dim];
        let mut counts = vec![0usize; k];
        for (i, &label) in labels.iter().enumerate() {
            counts[label] += 1;
            for (s, x) in sums[label * dim..(label + 1) * dim].iter_mut().zip(row(i)) {
                *s += x;
            }
        }
        for c in 0..k {
            if counts[c] == 0 {
                continue;
            }
            let count = counts[c] as f64;
            for (centroid, s) in centroids[c * dim..(c + 1) * dim]
                .iter_mut()
                .zip(&sums[c * dim..(c + 1) * dim])
            {
                *centroid = s / count;
            }
        }
    }

    centroids
}

fn nearest_centroid(x: &[f64], centroids: &[f64], dim: usize) -> usize {
    let mut best = 0;
    let mut best_d2 = f64::INFINITY;
    for (c, centroid) in centroids.chunks_exact(dim).enumerate() {
        let d2 = squared_distance(x, centroid);
        if d2 < best_d2 {
            best = c;
            best_d2 = d2;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn separates_two_clusters() {
        let data = vec![0.0, 0.1, -0.1, 0.05, 10.0, 10.1, 9.9, 10.05];
        let mut rng = ChaCha8Rng::seed_from_u64(14);
        let mut centroids = kmeans_centroids(&data, 1, 2, 10, &mut rng);
        centroids.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!(centroids[0].abs() < 0.2);
        assert!((centroids[1] - 10.0).abs() < 0.2);
    }

    #[test]
    fn same_seed_same_centroids() {
        let data: Vec<f64> = (0..40).map(|i| (i as f64 * 0.37).sin()).collect();
        let a = kmeans_centroids(&data, 2, 3, 10, &mut ChaCha8Rng::seed_from_u64(3));
        let b = kmeans_centroids(&data, 2, 3, 10, &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(a, b);
        assert_eq!(a.len(), 6);
    }

    #[test]
    fn identical_points_still_yield_k_centroids() {
        let data = vec![1.0; 6];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let centroids = kmeans_centroids(&data, 2, 3, 5, &mut rng);
        assert_eq!(centroids, vec![1.0; 6]);
    }
}
