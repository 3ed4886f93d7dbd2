use crate::error::MfccError;

/// Decoded PCM audio owned by the caller of the pipeline.
///
/// Samples are interleaved when `channels > 1`. Immutable once built.
///
/// # Example
/// ```
/// use mf_core::signal::Signal;
/// let signal = Signal::new(vec![0.5, -0.5, 0.25, -0.25], 16_000, 2).unwrap();
/// assert_eq!(signal.frames(), 2);
/// assert_eq!(signal.to_mono(), vec![0.0, 0.0]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Signal {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl Signal {
    /// Build a signal from interleaved samples.
    ///
    /// # Errors
    /// Returns [`MfccError::InvalidConfiguration`] if the sample rate or channel
    /// count is zero, or if the sample count is not a multiple of `channels`.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self, MfccError> {
        if sample_rate == 0 {
            return Err(MfccError::config("sample rate must be > 0"));
        }
        if channels == 0 {
            return Err(MfccError::config("channel count must be > 0"));
        }
        if samples.len() % usize::from(channels) != 0 {
            return Err(MfccError::config(format!(
                "{} samples cannot be split into {channels} interleaved channels",
                samples.len()
            )));
        }
        Ok(Self {
            samples,
            sample_rate,
            channels,
        })
    }

    /// Single-channel signal.
    ///
    /// # Errors
    /// Returns [`MfccError::InvalidConfiguration`] if `sample_rate` is zero.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, MfccError> {
        Self::new(samples, sample_rate, 1)
    }

    /// Sine tone, mono.
    ///
    /// # Errors
    /// Returns [`MfccError::InvalidConfiguration`] if `sample_rate` is zero.
    ///
    /// # Example
    /// ```
    /// use mf_core::signal::Signal;
    /// let tone = Signal::sine(440.0, 0.5, 1.0, 16_000).unwrap();
    /// assert_eq!(tone.len(), 16_000);
    /// ```
    pub fn sine(
        freq_hz: f32,
        amplitude: f32,
        duration_secs: f32,
        sample_rate: u32,
    ) -> Result<Self, MfccError> {
        let n = (duration_secs.max(0.0) * sample_rate as f32).round() as usize;
        let step = std::f64::consts::TAU * f64::from(freq_hz) / f64::from(sample_rate.max(1));
        let samples = (0..n)
            .map(|i| amplitude * (step * i as f64).sin() as f32)
            .collect();
        Self::mono(samples, sample_rate)
    }

    /// All-zero mono signal.
    ///
    /// # Errors
    /// Returns [`MfccError::InvalidConfiguration`] if `sample_rate` is zero.
    pub fn silence(duration_secs: f32, sample_rate: u32) -> Result<Self, MfccError> {
        let n = (duration_secs.max(0.0) * sample_rate as f32).round() as usize;
        Self::mono(vec![0.0; n], sample_rate)
    }

    /// Interleaved samples.
    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[must_use]
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Total number of interleaved samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of sample frames (samples per channel).
    #[must_use]
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    /// Duration in seconds.
    #[must_use]
    pub fn duration_secs(&self) -> f32 {
        self.frames() as f32 / self.sample_rate as f32
    }

    /// Downmix to mono by averaging channels.
    #[must_use]
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels == 1 {
            return self.samples.clone();
        }
        let ch = usize::from(self.channels);
        let inv = 1.0 / f32::from(self.channels);
        self.samples
            .chunks_exact(ch)
            .map(|frame| frame.iter().sum::<f32>() * inv)
            .collect()
    }

    /// Returns a copy with every sample multiplied by `gain`.
    #[must_use]
    pub fn scaled(&self, gain: f32) -> Self {
        Self {
            samples: self.samples.iter().map(|s| s * gain).collect(),
            ..*self
        }
    }
}
