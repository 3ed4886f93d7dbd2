//! Mel scale and triangular Mel filterbank.
//!
//! Two independent steps: [`mel_bin_edges`] maps Mel-spaced frequencies to FFT
//! bins, [`TriangularFilter::from_edges`] builds one filter from three of those
//! bins. [`MelFilterbank`] is built once and only ever read afterwards.

use mf_core::config::FrameGeometry;
use mf_core::error::MfccError;

/// Hz to Mel scale conversion.
#[inline]
#[must_use]
pub fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Mel to Hz conversion, exact inverse of [`hz_to_mel`].
#[inline]
#[must_use]
pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}

/// FFT bin holding frequency `hz`: `floor((fft_size + 1) * hz / sample_rate)`,
/// clamped to the Nyquist bin.
#[inline]
#[must_use]
pub fn hz_to_bin(hz: f32, fft_size: usize, sample_rate: u32) -> usize {
    let bin = ((fft_size + 1) as f32 * hz / sample_rate as f32).floor().max(0.0) as usize;
    bin.min(fft_size / 2)
}

/// `num_filters + 2` FFT bins at Mel-equidistant frequencies between
/// `low_hz` and `high_hz` (both included).
///
/// Filter `m` spans `edges[m]..=edges[m + 2]` and peaks at `edges[m + 1]`.
///
/// # Errors
/// Returns [`MfccError::InvalidConfiguration`] if `num_filters` is 0, the
/// bounds are inverted or negative, or `high_hz` exceeds Nyquist.
///
/// # Example
/// ```
/// use mf_audio::mel::mel_bin_edges;
/// let edges = mel_bin_edges(16_000, 512, 26, 0.0, 8000.0).unwrap();
/// assert_eq!(edges.len(), 28);
/// assert_eq!(edges[0], 0);
/// assert_eq!(edges[27], 256);
/// ```
pub fn mel_bin_edges(
    sample_rate: u32,
    fft_size: usize,
    num_filters: usize,
    low_hz: f32,
    high_hz: f32,
) -> Result<Vec<usize>, MfccError> {
    if num_filters < 1 {
        return Err(MfccError::config("the filterbank needs at least one filter"));
    }
    if fft_size == 0 || sample_rate == 0 {
        return Err(MfccError::config("FFT size and sample rate must be > 0"));
    }
    let nyquist = sample_rate as f32 / 2.0;
    if !low_hz.is_finite() || !high_hz.is_finite() || low_hz < 0.0 || low_hz >= high_hz {
        return Err(MfccError::config(format!(
            "filterbank bounds {low_hz}..{high_hz} Hz are inverted or negative"
        )));
    }
    if high_hz > nyquist {
        return Err(MfccError::config(format!(
            "filterbank upper bound {high_hz} Hz exceeds Nyquist ({nyquist} Hz)"
        )));
    }

    let mel_low = hz_to_mel(low_hz);
    let mel_high = hz_to_mel(high_hz);
    let steps = (num_filters + 1) as f32;
    Ok((0..num_filters + 2)
        .map(|i| {
            let mel = mel_low + (mel_high - mel_low) * i as f32 / steps;
            hz_to_bin(mel_to_hz(mel), fft_size, sample_rate)
        })
        .collect())
}

/// One triangular filter: contiguous weights starting at `start_bin`.
#[derive(Clone, Debug, PartialEq)]
pub struct TriangularFilter {
    start_bin: usize,
    center_bin: usize,
    weights: Vec<f32>,
}

impl TriangularFilter {
    /// Triangle rising linearly from 0 at `left` to 1 at `center`, falling
    /// back to 0 at `right`.
    ///
    /// # Errors
    /// Returns [`MfccError::InvalidConfiguration`] unless
    /// `left < center < right`: a zero-width side would turn the triangle
    /// into a step.
    ///
    /// # Example
    /// ```
    /// use mf_audio::mel::TriangularFilter;
    /// let f = TriangularFilter::from_edges(2, 4, 8).unwrap();
    /// assert_eq!(f.weight(2), 0.0);
    /// assert_eq!(f.weight(3), 0.5);
    /// assert_eq!(f.weight(4), 1.0);
    /// assert_eq!(f.weight(6), 0.5);
    /// assert_eq!(f.weight(8), 0.0);
    /// assert!(TriangularFilter::from_edges(3, 3, 5).is_err());
    /// ```
    pub fn from_edges(left: usize, center: usize, right: usize) -> Result<Self, MfccError> {
        if left >= center || center >= right {
            return Err(MfccError::config(format!(
                "triangular filter edges {left} < {center} < {right} do not hold"
            )));
        }
        let weights = (left..=right)
            .map(|k| {
                if k <= center {
                    (k - left) as f32 / (center - left) as f32
                } else {
                    (right - k) as f32 / (right - center) as f32
                }
            })
            .collect();
        Ok(Self {
            start_bin: left,
            center_bin: center,
            weights,
        })
    }

    /// Weight at FFT bin `bin`, 0.0 outside the support.
    #[must_use]
    pub fn weight(&self, bin: usize) -> f32 {
        bin.checked_sub(self.start_bin)
            .and_then(|i| self.weights.get(i))
            .copied()
            .unwrap_or(0.0)
    }

    #[must_use]
    pub fn start_bin(&self) -> usize {
        self.start_bin
    }

    #[must_use]
    pub fn center_bin(&self) -> usize {
        self.center_bin
    }

    /// Last bin of the support (inclusive).
    #[must_use]
    pub fn end_bin(&self) -> usize {
        self.start_bin + self.weights.len().saturating_sub(1)
    }

    /// Weights over `start_bin..=end_bin`.
    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Band energy: weighted sum of `spectrum` over the support.
    ///
    /// Bins past the end of `spectrum` contribute nothing.
    #[inline]
    #[must_use]
    pub fn apply(&self, spectrum: &[f32]) -> f32 {
        spectrum
            .iter()
            .skip(self.start_bin)
            .zip(&self.weights)
            .map(|(s, w)| s * w)
            .sum()
    }
}

/// Bank of M triangular filters on Mel-equidistant centres.
///
/// Built once per (sample rate, FFT size, filter count, frequency range) and
/// shared read-only by every frame.
///
/// # Example
/// ```
/// use mf_audio::mel::MelFilterbank;
/// let bank = MelFilterbank::new(16_000, 512, 26, 0.0, 8000.0).unwrap();
/// assert_eq!(bank.len(), 26);
/// let energies = bank.apply(&vec![1.0; 257]);
/// assert!(energies.iter().all(|&e| e > 0.0));
/// ```
#[derive(Clone, Debug)]
pub struct MelFilterbank {
    filters: Vec<TriangularFilter>,
    fft_size: usize,
    sample_rate: u32,
}

impl MelFilterbank {
    /// # Errors
    /// Returns [`MfccError::InvalidConfiguration`] under the conditions listed
    /// on [`mel_bin_edges`], or when two Mel edges land on the same FFT bin
    /// (too many filters for the FFT resolution).
    pub fn new(
        sample_rate: u32,
        fft_size: usize,
        num_filters: usize,
        low_hz: f32,
        high_hz: f32,
    ) -> Result<Self, MfccError> {
        let edges = mel_bin_edges(sample_rate, fft_size, num_filters, low_hz, high_hz)?;

        if let Some(m) = edges.windows(2).position(|w| w[0] == w[1]) {
            return Err(MfccError::config(format!(
                "{num_filters} Mel filters are too many for FFT {fft_size} @ {sample_rate} Hz: \
                 edges {m} and {} share FFT bin {}",
                m + 1,
                edges[m]
            )));
        }

        let filters = edges
            .windows(3)
            .map(|w| TriangularFilter::from_edges(w[0], w[1], w[2]))
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "Banc Mel construit : {num_filters} filtres, {low_hz}..{high_hz} Hz, FFT {fft_size}"
        );

        Ok(Self {
            filters,
            fft_size,
            sample_rate,
        })
    }

    /// Build from resolved frame geometry.
    ///
    /// # Errors
    /// See [`MelFilterbank::new`].
    pub fn from_geometry(geo: &FrameGeometry, num_filters: usize) -> Result<Self, MfccError> {
        Self::new(
            geo.sample_rate,
            geo.fft_size,
            num_filters,
            geo.low_freq,
            geo.high_freq,
        )
    }

    /// Number of filters M.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    #[must_use]
    pub fn filters(&self) -> &[TriangularFilter] {
        &self.filters
    }

    #[must_use]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Spectrum length this bank expects, `fft_size / 2 + 1`.
    #[must_use]
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Centre frequency of filter `m` in Hz.
    #[must_use]
    pub fn center_hz(&self, m: usize) -> Option<f32> {
        self.filters
            .get(m)
            .map(|f| f.center_bin as f32 * self.sample_rate as f32 / (self.fft_size + 1) as f32)
    }

    /// Band energies of `spectrum` written into `out` (length M).
    pub fn apply_into(&self, spectrum: &[f32], out: &mut [f32]) {
        for (e, f) in out.iter_mut().zip(&self.filters) {
            *e = f.apply(spectrum);
        }
    }

    /// Band energies of `spectrum`, one per filter.
    #[must_use]
    pub fn apply(&self, spectrum: &[f32]) -> Vec<f32> {
        let mut out = vec![0.0; self.filters.len()];
        self.apply_into(spectrum, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mel_conversions_are_inverse() {
        for hz in [0.0f32, 100.0, 440.0, 1000.0, 4000.0, 8000.0, 22_050.0] {
            let back = mel_to_hz(hz_to_mel(hz));
            assert!((back - hz).abs() < hz.max(1.0) * 1e-4, "{hz} -> {back}");
        }
        assert!((hz_to_mel(1000.0) - 1000.0).abs() < 0.5);
    }

    #[test]
    fn edges_are_monotonic() {
        let edges = mel_bin_edges(16_000, 512, 40, 20.0, 7600.0).unwrap();
        assert!(edges.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn edges_reject_bad_bounds() {
        assert!(mel_bin_edges(16_000, 512, 0, 0.0, 8000.0).is_err());
        assert!(mel_bin_edges(16_000, 512, 26, 5000.0, 1000.0).is_err());
        assert!(mel_bin_edges(16_000, 512, 26, 0.0, 8001.0).is_err());
        assert!(mel_bin_edges(16_000, 512, 26, -1.0, 8000.0).is_err());
    }

    #[test]
    fn every_filter_is_triangular() {
        let bank = MelFilterbank::new(16_000, 512, 26, 0.0, 8000.0).unwrap();
        for (m, f) in bank.filters().iter().enumerate() {
            assert!(
                (f.weight(f.center_bin()) - 1.0).abs() < 1e-6,
                "filtre {m} : centre != 1"
            );
            assert!(f.start_bin() < f.center_bin() && f.center_bin() < f.end_bin());
            assert!(f.weight(f.start_bin()).abs() < 1e-6, "filtre {m} : bord gauche");
            assert!(f.weight(f.end_bin()).abs() < 1e-6, "filtre {m} : bord droit");
            let w = f.weights();
            let c = f.center_bin() - f.start_bin();
            assert!(w[..=c].windows(2).all(|p| p[0] <= p[1]), "filtre {m} : montée");
            assert!(w[c..].windows(2).all(|p| p[0] >= p[1]), "filtre {m} : descente");
        }
    }

    #[test]
    fn filters_stay_below_nyquist() {
        let bank = MelFilterbank::new(8000, 256, 23, 64.0, 4000.0).unwrap();
        assert!(bank.filters().iter().all(|f| f.end_bin() <= 128));
    }

    #[test]
    fn centres_are_increasing() {
        let bank = MelFilterbank::new(16_000, 512, 26, 0.0, 8000.0).unwrap();
        let centres: Vec<f32> = (0..bank.len()).filter_map(|m| bank.center_hz(m)).collect();
        assert!(centres.windows(2).all(|w| w[0] < w[1]));
        assert!(bank.center_hz(26).is_none());
    }

    #[test]
    fn zero_width_side_is_rejected() {
        for (l, c, r) in [(3, 3, 3), (3, 3, 5), (3, 5, 5), (5, 3, 8)] {
            assert!(matches!(
                TriangularFilter::from_edges(l, c, r),
                Err(MfccError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn too_many_filters_for_fft_resolution_is_rejected() {
        // 80 bands over 257 bins: the low edges fall on bins 0, 0, 1, 2, 2, ...
        let edges = mel_bin_edges(16_000, 512, 80, 0.0, 8000.0).unwrap();
        assert!(edges.windows(2).any(|w| w[0] == w[1]));
        assert!(matches!(
            MelFilterbank::new(16_000, 512, 80, 0.0, 8000.0),
            Err(MfccError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn eighty_filters_fit_a_larger_fft() {
        let bank = MelFilterbank::new(16_000, 2048, 80, 0.0, 8000.0).unwrap();
        assert_eq!(bank.len(), 80);
        for (m, f) in bank.filters().iter().enumerate() {
            assert_eq!(f.weight(f.start_bin()), 0.0, "filtre {m}");
            assert_eq!(f.weight(f.center_bin()), 1.0, "filtre {m}");
            assert_eq!(f.weight(f.end_bin()), 0.0, "filtre {m}");
        }
    }

    #[test]
    fn apply_weights_spectrum() {
        let f = TriangularFilter::from_edges(1, 2, 3).unwrap();
        assert!((f.apply(&[9.0, 2.0, 4.0, 6.0, 9.0]) - 4.0).abs() < 1e-6);
        assert!(f.apply(&[1.0]).abs() < 1e-6);
    }

    #[test]
    fn pure_tone_lands_in_its_filter() {
        let bank = MelFilterbank::new(16_000, 512, 26, 0.0, 8000.0).unwrap();
        let mut spectrum = vec![0.0f32; 257];
        // 440 Hz ~ bin 14
        spectrum[14] = 1.0;
        let energies = bank.apply(&spectrum);
        let best = energies
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(m, _)| m)
            .unwrap();
        let hz = bank.center_hz(best).unwrap();
        assert!((300.0..600.0).contains(&hz), "centre {hz} Hz");
    }
}
