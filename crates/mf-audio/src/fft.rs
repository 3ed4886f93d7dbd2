use std::sync::Arc;

use mf_core::config::SpectrumKind;
use mf_core::error::MfccError;
use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};

/// Spectral analyzer: real FFT of windowed frames using realfft.
///
/// Pre-allocates the FFT plan and scratch buffers; frames shorter than
/// `fft_size` are zero-padded. Only bins `0..=fft_size/2` are produced.
/// Cloning shares the plan and allocates fresh buffers, one clone per worker.
///
/// # Example
/// ```
/// use mf_audio::fft::SpectralAnalyzer;
/// let analyzer = SpectralAnalyzer::new(512).unwrap();
/// assert_eq!(analyzer.num_bins(), 257);
/// ```
pub struct SpectralAnalyzer {
    fft_size: usize,
    input_buf: Vec<f32>,
    spectrum_buf: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    plan: Arc<dyn RealToComplex<f32>>,
}

impl SpectralAnalyzer {
    /// Plan a forward real FFT of `fft_size` points.
    ///
    /// # Errors
    /// Returns [`MfccError::InvalidConfiguration`] if `fft_size` is 0.
    pub fn new(fft_size: usize) -> Result<Self, MfccError> {
        if fft_size == 0 {
            return Err(MfccError::config("FFT size must be > 0"));
        }
        let mut planner = RealFftPlanner::<f32>::new();
        let plan = planner.plan_fft_forward(fft_size);
        Ok(Self::with_plan(fft_size, plan))
    }

    fn with_plan(fft_size: usize, plan: Arc<dyn RealToComplex<f32>>) -> Self {
        Self {
            fft_size,
            input_buf: plan.make_input_vec(),
            spectrum_buf: plan.make_output_vec(),
            scratch: plan.make_scratch_vec(),
            plan,
        }
    }

    /// FFT window size.
    #[must_use]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of non-negative frequency bins, N/2 + 1.
    #[must_use]
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Copy, zero-pad and transform `frame`.
    fn transform(&mut self, frame: &[f32]) -> Result<&[Complex<f32>], MfccError> {
        let n = self.fft_size.min(frame.len());
        self.input_buf[..n].copy_from_slice(&frame[..n]);
        self.input_buf[n..].fill(0.0);

        self.plan
            .process_with_scratch(&mut self.input_buf, &mut self.spectrum_buf, &mut self.scratch)
            .map_err(|e| MfccError::Transform(e.to_string()))?;
        Ok(&self.spectrum_buf)
    }

    /// Spectrum of `frame` as `kind` (|X| or |X|²), written into `out`.
    ///
    /// `out` is resized to [`num_bins`](Self::num_bins).
    ///
    /// # Errors
    /// Returns [`MfccError::Transform`] if the FFT backend fails.
    pub fn spectrum_into(
        &mut self,
        frame: &[f32],
        kind: SpectrumKind,
        out: &mut Vec<f32>,
    ) -> Result<(), MfccError> {
        let bins = self.transform(frame)?;
        out.clear();
        out.extend(bins.iter().map(|c| match kind {
            SpectrumKind::Magnitude => c.norm(),
            SpectrumKind::Power => c.norm_sqr(),
        }));
        Ok(())
    }

    /// Magnitude spectrum `|X[k]|`, k in 0..=N/2.
    ///
    /// # Errors
    /// Returns [`MfccError::Transform`] if the FFT backend fails.
    ///
    /// # Example
    /// ```
    /// use mf_audio::fft::SpectralAnalyzer;
    /// let mut fft = SpectralAnalyzer::new(256).unwrap();
    /// let spectrum = fft.magnitude(&[0.0f32; 256]).unwrap();
    /// assert_eq!(spectrum.len(), 129); // N/2 + 1
    /// ```
    pub fn magnitude(&mut self, frame: &[f32]) -> Result<Vec<f32>, MfccError> {
        let mut out = Vec::with_capacity(self.num_bins());
        self.spectrum_into(frame, SpectrumKind::Magnitude, &mut out)?;
        Ok(out)
    }

    /// Power spectrum `|X[k]|²`, k in 0..=N/2.
    ///
    /// # Errors
    /// Returns [`MfccError::Transform`] if the FFT backend fails.
    pub fn power(&mut self, frame: &[f32]) -> Result<Vec<f32>, MfccError> {
        let mut out = Vec::with_capacity(self.num_bins());
        self.spectrum_into(frame, SpectrumKind::Power, &mut out)?;
        Ok(out)
    }

    /// Log-magnitude spectrogram row: `log10(max(|X[k]|, floor))`.
    ///
    /// Zero-magnitude bins map to `log10(floor)`, never to -inf. NaN stays NaN.
    ///
    /// # Errors
    /// Returns [`MfccError::Transform`] if the FFT backend fails.
    ///
    /// # Example
    /// ```
    /// use mf_audio::fft::SpectralAnalyzer;
    /// let mut fft = SpectralAnalyzer::new(64).unwrap();
    /// let row = fft.log_magnitude(&[0.0f32; 64], 1e-10).unwrap();
    /// assert!(row.iter().all(|&v| (v + 10.0).abs() < 1e-4));
    /// ```
    pub fn log_magnitude(&mut self, frame: &[f32], floor: f32) -> Result<Vec<f32>, MfccError> {
        let mut out = self.magnitude(frame)?;
        for v in &mut out {
            *v = floored_log10(*v, floor);
        }
        Ok(out)
    }
}

/// `log10(max(v, floor))` that lets NaN through instead of flooring it.
#[inline]
pub(crate) fn floored_log10(v: f32, floor: f32) -> f32 {
    if v < floor { floor.log10() } else { v.log10() }
}

impl Clone for SpectralAnalyzer {
    fn clone(&self) -> Self {
        Self::with_plan(self.fft_size, Arc::clone(&self.plan))
    }
}
