use mf_core::config::{FrameGeometry, MfccConfig, SpectrumKind};
use mf_core::error::MfccError;
use mf_core::matrix::{FeatureMatrix, MfccMatrix};
use mf_core::signal::Signal;
use rayon::prelude::*;

use crate::cepstrum::CepstralProjector;
use crate::deltas::append_deltas;
use crate::fft::{SpectralAnalyzer, floored_log10};
use crate::frames::FrameSegmenter;
use crate::mel::MelFilterbank;

/// Analyseur MFCC complet pour le traitement offline d'un signal.
///
/// Every parameter is validated in [`MfccPipeline::new`]; the Mel filterbank
/// is built there once and shared read-only by every frame of every run.
///
/// # Example
/// ```
/// use mf_audio::pipeline::MfccPipeline;
/// use mf_core::{MfccConfig, Signal};
///
/// let pipeline = MfccPipeline::new(&MfccConfig::default(), 16_000).unwrap();
/// let tone = Signal::sine(440.0, 0.5, 1.0, 16_000).unwrap();
/// let mfcc = pipeline.compute(&tone).unwrap();
/// assert_eq!(mfcc.len(), 99);
/// assert_eq!(mfcc.width(), 13);
/// ```
pub struct MfccPipeline {
    config: MfccConfig,
    geometry: FrameGeometry,
    segmenter: FrameSegmenter,
    analyzer: SpectralAnalyzer,
    filterbank: MelFilterbank,
    projector: CepstralProjector,
}

/// Per-worker buffers.
struct FrameWork {
    analyzer: SpectralAnalyzer,
    frame: Vec<f32>,
    spectrum: Vec<f32>,
    energies: Vec<f32>,
}

/// What each frame is reduced to.
#[derive(Clone, Copy)]
enum Output {
    Cepstrum,
    LogMel,
    LogSpectrogram,
}

impl MfccPipeline {
    /// Validate `config` against `sample_rate` and precompute every table.
    ///
    /// # Errors
    /// Returns [`MfccError::InvalidConfiguration`] for any invalid parameter.
    pub fn new(config: &MfccConfig, sample_rate: u32) -> Result<Self, MfccError> {
        let geometry = config.validate(sample_rate)?;

        let segmenter = FrameSegmenter::new(
            geometry.frame_len,
            geometry.hop_len,
            config.window,
            config.edge_policy,
        )?
        .with_dc_removal(config.remove_dc_offset)
        .with_preemphasis(config.preemphasis);
        let analyzer = SpectralAnalyzer::new(geometry.fft_size)?;
        let filterbank = MelFilterbank::from_geometry(&geometry, config.num_filters)?;
        let projector = CepstralProjector::new(
            config.num_filters,
            config.num_coeffs,
            config.lifter,
            config.log_floor,
        )?;

        log::debug!(
            "Pipeline MFCC : {} Hz, frame {} / hop {} échantillons, FFT {}, M={} K={}",
            sample_rate,
            geometry.frame_len,
            geometry.hop_len,
            geometry.fft_size,
            config.num_filters,
            config.num_coeffs
        );

        Ok(Self {
            config: config.clone(),
            geometry,
            segmenter,
            analyzer,
            filterbank,
            projector,
        })
    }

    #[must_use]
    pub fn config(&self) -> &MfccConfig {
        &self.config
    }

    #[must_use]
    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    /// The shared, read-only filterbank.
    #[must_use]
    pub fn filterbank(&self) -> &MelFilterbank {
        &self.filterbank
    }

    /// Frames a signal of `len` mono samples will produce.
    #[must_use]
    pub fn frame_count(&self, len: usize) -> usize {
        self.segmenter.frame_count(len)
    }

    /// MFCC matrix of `signal`, one vector of `config.output_width()` values
    /// per frame, in temporal order.
    ///
    /// Either the whole matrix is produced or the call fails.
    ///
    /// # Errors
    /// - [`MfccError::EmptySignal`] if `signal` has no samples.
    /// - [`MfccError::InvalidConfiguration`] if the sample rate differs from
    ///   the one the pipeline was built for, or the signal is shorter than one
    ///   frame with padding disabled.
    /// - [`MfccError::NumericDegenerate`] if a non-finite value is produced.
    pub fn compute(&self, signal: &Signal) -> Result<MfccMatrix, MfccError> {
        let statics = self.run(signal, Output::Cepstrum)?;
        if self.config.delta_order == 0 {
            return Ok(statics);
        }
        Ok(append_deltas(&statics, self.config.delta_order))
    }

    /// Log Mel filterbank energies `ln(E_m + ε)`, M values per frame.
    ///
    /// # Errors
    /// Same conditions as [`compute`](Self::compute).
    pub fn log_mel_energies(&self, signal: &Signal) -> Result<FeatureMatrix, MfccError> {
        self.run(signal, Output::LogMel)
    }

    /// Log-magnitude spectrogram `log10(max(|X[k]|, ε))`, N/2+1 values per frame.
    ///
    /// # Errors
    /// Same conditions as [`compute`](Self::compute).
    pub fn log_spectrogram(&self, signal: &Signal) -> Result<FeatureMatrix, MfccError> {
        self.run(signal, Output::LogSpectrogram)
    }

    fn width(&self, output: Output) -> usize {
        match output {
            Output::Cepstrum => self.config.num_coeffs,
            Output::LogMel => self.config.num_filters,
            Output::LogSpectrogram => self.geometry.num_bins(),
        }
    }

    fn workspace(&self) -> FrameWork {
        FrameWork {
            analyzer: self.analyzer.clone(),
            frame: vec![0.0; self.geometry.frame_len],
            spectrum: Vec::with_capacity(self.geometry.num_bins()),
            energies: vec![0.0; self.config.num_filters],
        }
    }

    fn run(&self, signal: &Signal, output: Output) -> Result<FeatureMatrix, MfccError> {
        if signal.is_empty() {
            return Err(MfccError::EmptySignal);
        }
        if signal.sample_rate() != self.geometry.sample_rate {
            return Err(MfccError::config(format!(
                "signal sample rate {} Hz does not match the pipeline ({} Hz)",
                signal.sample_rate(),
                self.geometry.sample_rate
            )));
        }

        let samples = signal.to_mono();
        self.segmenter.check_len(samples.len())?;
        let count = self.segmenter.frame_count(samples.len());
        let width = self.width(output);

        let rows: Vec<Vec<f32>> = if self.config.parallel {
            (0..count)
                .into_par_iter()
                .map_init(
                    || self.workspace(),
                    |work, idx| {
                        self.segmenter.frame_into(&samples, idx, &mut work.frame);
                        self.reduce_frame(work, output, width)
                    },
                )
                .collect::<Result<Vec<_>, MfccError>>()?
        } else {
            let mut work = self.workspace();
            let mut rows = Vec::with_capacity(count);
            for frame in self.segmenter.frames(&samples) {
                work.frame.copy_from_slice(&frame);
                rows.push(self.reduce_frame(&mut work, output, width)?);
            }
            rows
        };

        let matrix = FeatureMatrix::from_rows(rows, width, self.geometry.hop_secs())
            .ok_or_else(|| MfccError::NumericDegenerate("ragged feature rows".into()))?;
        if !matrix.is_finite() {
            return Err(MfccError::NumericDegenerate(
                "non-finite value in output matrix".into(),
            ));
        }

        log::debug!(
            "{} frames analysées ({} valeurs par frame, {:.2} s de signal)",
            matrix.len(),
            width,
            signal.duration_secs()
        );
        Ok(matrix)
    }

    /// Spectrum and projection of the windowed frame held in `work.frame`.
    fn reduce_frame(
        &self,
        work: &mut FrameWork,
        output: Output,
        width: usize,
    ) -> Result<Vec<f32>, MfccError> {
        let mut row = vec![0.0; width];
        match output {
            Output::LogSpectrogram => {
                work.analyzer
                    .spectrum_into(&work.frame, SpectrumKind::Magnitude, &mut work.spectrum)?;
                for (r, m) in row.iter_mut().zip(&work.spectrum) {
                    *r = floored_log10(*m, self.config.log_floor);
                }
            }
            Output::LogMel => {
                work.analyzer
                    .spectrum_into(&work.frame, self.config.spectrum, &mut work.spectrum)?;
                self.projector
                    .log_energies_into(&self.filterbank, &work.spectrum, &mut row)?;
            }
            Output::Cepstrum => {
                work.analyzer
                    .spectrum_into(&work.frame, self.config.spectrum, &mut work.spectrum)?;
                self.projector.project_into(
                    &self.filterbank,
                    &work.spectrum,
                    &mut work.energies,
                    &mut row,
                )?;
            }
        }
        Ok(row)
    }
}
