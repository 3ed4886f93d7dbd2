use std::f32::consts::PI;

use mf_core::config::WindowFunction;

/// Window coefficients of length `len` (symmetric form).
///
/// A length-1 window is `[1.0]` for every shape.
///
/// # Example
/// ```
/// use mf_audio::window::window_coefficients;
/// use mf_core::config::WindowFunction;
/// let w = window_coefficients(WindowFunction::Hamming, 5);
/// assert!((w[0] - 0.08).abs() < 1e-6);
/// assert!((w[2] - 1.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn window_coefficients(kind: WindowFunction, len: usize) -> Vec<f32> {
    if len == 0 {
        return Vec::new();
    }
    if len == 1 {
        return vec![1.0];
    }
    let denom = (len - 1) as f32;
    (0..len)
        .map(|i| {
            let phase = 2.0 * PI * i as f32 / denom;
            match kind {
                WindowFunction::Hamming => 0.54 - 0.46 * phase.cos(),
                WindowFunction::Hann => 0.5 - 0.5 * phase.cos(),
                WindowFunction::Blackman => 0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos(),
                WindowFunction::Povey => (0.5 - 0.5 * phase.cos()).max(0.0).powf(0.85),
                WindowFunction::Rectangular => 1.0,
            }
        })
        .collect()
}
