use mf_core::matrix::FeatureMatrix;

/// Regression half-window N used for deltas.
pub const DELTA_WINDOW: usize = 2;

/// Regression deltas of `matrix` along time:
/// `d[t] = Σ n·(c[t+n] - c[t-n]) / (2 Σ n²)` for n in 1..=N.
///
/// Frames outside the matrix are replaced by the nearest edge frame.
///
/// # Example
/// ```
/// use mf_audio::deltas::deltas;
/// use mf_core::matrix::FeatureMatrix;
/// let ramp = FeatureMatrix::from_rows((0..6).map(|t| vec![t as f32]).collect(), 1, 0.01).unwrap();
/// let d = deltas(&ramp, 2);
/// assert!((d.frame(3).unwrap()[0] - 1.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn deltas(matrix: &FeatureMatrix, window: usize) -> FeatureMatrix {
    let width = matrix.width();
    let frames = matrix.len();
    let mut out = FeatureMatrix::new(width, matrix.hop_secs());
    if frames == 0 || window == 0 {
        let zeros = vec![0.0; width];
        for _ in 0..frames {
            out.push(&zeros);
        }
        return out;
    }

    let denom = 2.0 * (1..=window).map(|n| (n * n) as f32).sum::<f32>();
    let rows: Vec<&[f32]> = matrix.iter().collect();
    let mut row = vec![0.0f32; width];
    for t in 0..frames {
        row.fill(0.0);
        for n in 1..=window {
            let next = rows[(t + n).min(frames - 1)];
            let prev = rows[t.saturating_sub(n)];
            for (d, (a, b)) in row.iter_mut().zip(next.iter().zip(prev)) {
                *d += n as f32 * (a - b);
            }
        }
        row.iter_mut().for_each(|d| *d /= denom);
        out.push(&row);
    }
    out
}

/// Concatenate `statics` with its first `order` delta orders, frame by frame.
///
/// Width becomes `statics.width() * (1 + order)`.
#[must_use]
pub fn append_deltas(statics: &FeatureMatrix, order: usize) -> FeatureMatrix {
    if order == 0 {
        return statics.clone();
    }
    let mut layers = vec![statics.clone()];
    for _ in 0..order {
        let next = deltas(&layers[layers.len() - 1], DELTA_WINDOW);
        layers.push(next);
    }

    let width = statics.width() * (1 + order);
    let mut out = FeatureMatrix::new(width, statics.hop_secs());
    let mut row = Vec::with_capacity(width);
    for t in 0..statics.len() {
        row.clear();
        for layer in &layers {
            if let Some(r) = layer.frame(t) {
                row.extend_from_slice(r);
            }
        }
        out.push(&row);
    }
    out
}
