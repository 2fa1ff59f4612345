use ndarray::Array1;

/// Numerically stable softmax. Empty input yields an empty vector.
pub(crate) fn softmax(logits: &Array1<f32>) -> Array1<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return Array1::zeros(logits.len());
    }
    let exp = logits.mapv(|x| (x - max).exp());
    let sum = exp.sum();
    exp / sum
}

/// Indices of the `k` highest scores, highest first. Equal scores keep
/// ascending index order.
pub(crate) fn top_k_indices(scores: &Array1<f32>, k: usize) -> Vec<usize> {
    let mut indexed: Vec<(usize, f32)> = scores.iter().cloned().enumerate().collect();
    indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
    indexed.into_iter().take(k).map(|(i, _)| i).collect()
}
