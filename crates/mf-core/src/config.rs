use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::MfccError;

/// Configuration complète de l'extraction MFCC.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut documentée.
///
/// # Example
/// ```
/// use mf_core::config::MfccConfig;
/// let config = MfccConfig::default();
/// assert_eq!(config.num_filters, 26);
/// assert_eq!(config.num_coeffs, 13);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct MfccConfig {
    // === Découpage ===
    /// Analysis frame length. Default 25 ms.
    pub frame_length: Span,
    /// Distance between consecutive frame starts. Default 10 ms.
    pub hop_length: Span,
    /// Window applied to each frame. Default Hamming.
    pub window: WindowFunction,
    /// What to do with the final partial frame. Default Pad.
    pub edge_policy: EdgePolicy,
    /// Subtract each frame's mean before windowing.
    pub remove_dc_offset: bool,
    /// Pre-emphasis coefficient in [0, 1). 0.0 = disabled.
    pub preemphasis: f32,

    // === Spectre ===
    /// FFT size in samples; must be >= frame length. Default 512.
    pub fft_size: usize,
    /// Quantity fed to the filterbank. Default Power.
    pub spectrum: SpectrumKind,

    // === Banc de filtres Mel ===
    /// Number of triangular filters M. Default 26.
    pub num_filters: usize,
    /// Lower edge of the first filter, Hz. Default 0.
    pub low_freq: f32,
    /// Upper edge of the last filter, Hz. None = Nyquist.
    pub high_freq: Option<f32>,

    // === Cepstre ===
    /// Retained coefficients K, 1 <= K <= M. Default 13.
    ///
    /// K < M is the usual truncating setting; K == M is accepted and keeps
    /// the whole DCT.
    pub num_coeffs: usize,
    /// Sinusoidal lifter parameter L. 0.0 = disabled. Default 22.
    pub lifter: f32,
    /// Floor ε added before every logarithm. Default 1e-10.
    pub log_floor: f32,
    /// Appended regression deltas: 0, 1 or 2. Default 0.
    pub delta_order: usize,

    // === Exécution ===
    /// Distribute frames across the rayon pool.
    pub parallel: bool,
}

/// A duration expressed either in milliseconds or in samples.
///
/// In TOML: `frame_length = { ms = 25.0 }` or `hop_length = { samples = 160 }`.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Span {
    /// Milliseconds, converted with the signal's sample rate.
    Ms(f32),
    /// Exact sample count.
    Samples(usize),
}

impl Span {
    /// Resolve to a sample count at `sample_rate`.
    ///
    /// # Example
    /// ```
    /// use mf_core::config::Span;
    /// assert_eq!(Span::Ms(25.0).to_samples(16_000), 400);
    /// assert_eq!(Span::Samples(160).to_samples(44_100), 160);
    /// ```
    #[must_use]
    pub fn to_samples(self, sample_rate: u32) -> usize {
        match self {
            Self::Ms(ms) if ms.is_finite() && ms > 0.0 => {
                (f64::from(ms) * f64::from(sample_rate) / 1000.0).round() as usize
            }
            Self::Ms(_) => 0,
            Self::Samples(n) => n,
        }
    }
}

/// Analysis window shape (symmetric forms).
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum WindowFunction {
    /// 0.54 - 0.46 cos(2πn/(N-1)).
    #[default]
    Hamming,
    /// 0.5 - 0.5 cos(2πn/(N-1)).
    Hann,
    /// Three-term Blackman (α = 0.16).
    Blackman,
    /// Hann raised to the power 0.85.
    Povey,
    /// No tapering.
    Rectangular,
}

/// Policy for the last segment when it is shorter than a frame.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum EdgePolicy {
    /// Zero-pad the final partial frame to full length.
    #[default]
    Pad,
    /// Discard the final partial frame.
    Drop,
}

/// Spectral quantity handed to the Mel filterbank.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum SpectrumKind {
    /// |X[k]|
    Magnitude,
    /// |X[k]|²
    #[default]
    Power,
}

/// Frame and filterbank parameters resolved against a sample rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameGeometry {
    pub sample_rate: u32,
    /// Frame length in samples.
    pub frame_len: usize,
    /// Hop in samples.
    pub hop_len: usize,
    pub fft_size: usize,
    pub low_freq: f32,
    pub high_freq: f32,
}

impl FrameGeometry {
    /// Hop in seconds.
    #[must_use]
    pub fn hop_secs(&self) -> f32 {
        self.hop_len as f32 / self.sample_rate as f32
    }

    /// Number of non-negative frequency bins, `fft_size / 2 + 1`.
    #[must_use]
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            frame_length: Span::Ms(25.0),
            hop_length: Span::Ms(10.0),
            window: WindowFunction::Hamming,
            edge_policy: EdgePolicy::Pad,
            remove_dc_offset: false,
            preemphasis: 0.0,
            fft_size: 512,
            spectrum: SpectrumKind::Power,
            num_filters: 26,
            low_freq: 0.0,
            high_freq: None,
            num_coeffs: 13,
            lifter: 22.0,
            log_floor: 1e-10,
            delta_order: 0,
            parallel: false,
        }
    }
}

impl MfccConfig {
    /// Check every parameter against `sample_rate` and resolve sample counts.
    ///
    /// Called before any frame is processed.
    ///
    /// # Errors
    /// Returns [`MfccError::InvalidConfiguration`] describing the first
    /// offending parameter.
    ///
    /// # Example
    /// ```
    /// use mf_core::config::MfccConfig;
    /// let geo = MfccConfig::default().validate(16_000).unwrap();
    /// assert_eq!((geo.frame_len, geo.hop_len), (400, 160));
    /// assert!((geo.high_freq - 8000.0).abs() < f32::EPSILON);
    /// ```
    pub fn validate(&self, sample_rate: u32) -> Result<FrameGeometry, MfccError> {
        if sample_rate == 0 {
            return Err(MfccError::config("sample rate must be > 0"));
        }
        let frame_len = self.frame_length.to_samples(sample_rate);
        let hop_len = self.hop_length.to_samples(sample_rate);
        if frame_len == 0 {
            return Err(MfccError::config(format!(
                "frame length {:?} resolves to 0 samples",
                self.frame_length
            )));
        }
        if hop_len == 0 {
            return Err(MfccError::config(format!(
                "hop length {:?} resolves to 0 samples",
                self.hop_length
            )));
        }
        if self.fft_size < frame_len {
            return Err(MfccError::config(format!(
                "fft_size {} is smaller than the frame length ({frame_len} samples)",
                self.fft_size
            )));
        }
        if self.num_filters < 1 {
            return Err(MfccError::config("num_filters must be >= 1"));
        }
        if self.num_coeffs < 1 || self.num_coeffs > self.num_filters {
            return Err(MfccError::config(format!(
                "num_coeffs must be in 1..={}, got {}",
                self.num_filters, self.num_coeffs
            )));
        }

        let nyquist = sample_rate as f32 / 2.0;
        let high_freq = self.high_freq.unwrap_or(nyquist);
        if !self.low_freq.is_finite() || self.low_freq < 0.0 {
            return Err(MfccError::config(format!(
                "low_freq must be >= 0 Hz, got {}",
                self.low_freq
            )));
        }
        if !high_freq.is_finite() || high_freq > nyquist {
            return Err(MfccError::config(format!(
                "high_freq {high_freq} Hz exceeds Nyquist ({nyquist} Hz)"
            )));
        }
        if self.low_freq >= high_freq {
            return Err(MfccError::config(format!(
                "low_freq {} Hz must be below high_freq {high_freq} Hz",
                self.low_freq
            )));
        }

        if !(0.0..1.0).contains(&self.preemphasis) {
            return Err(MfccError::config(format!(
                "preemphasis must be in [0, 1), got {}",
                self.preemphasis
            )));
        }
        if !self.lifter.is_finite() || self.lifter < 0.0 {
            return Err(MfccError::config(format!(
                "lifter must be >= 0, got {}",
                self.lifter
            )));
        }
        if !self.log_floor.is_finite() || self.log_floor <= 0.0 {
            return Err(MfccError::config(format!(
                "log_floor must be a positive finite value, got {}",
                self.log_floor
            )));
        }
        if self.delta_order > 2 {
            return Err(MfccError::config(format!(
                "delta_order must be 0, 1 or 2, got {}",
                self.delta_order
            )));
        }

        Ok(FrameGeometry {
            sample_rate,
            frame_len,
            hop_len,
            fft_size: self.fft_size,
            low_freq: self.low_freq,
            high_freq,
        })
    }

    /// Width of each output vector, deltas included.
    #[must_use]
    pub fn output_width(&self) -> usize {
        self.num_coeffs * (1 + self.delta_order)
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    frames: Option<FramesSection>,
    spectrum: Option<SpectrumSection>,
    mel: Option<MelSection>,
    cepstrum: Option<CepstrumSection>,
    runtime: Option<RuntimeSection>,
}

#[derive(Deserialize)]
struct FramesSection {
    frame_length: Option<Span>,
    hop_length: Option<Span>,
    window: Option<WindowFunction>,
    edge_policy: Option<EdgePolicy>,
    remove_dc_offset: Option<bool>,
    preemphasis: Option<f32>,
}

#[derive(Deserialize)]
struct SpectrumSection {
    fft_size: Option<usize>,
    kind: Option<SpectrumKind>,
}

#[derive(Deserialize)]
struct MelSection {
    num_filters: Option<usize>,
    low_freq: Option<f32>,
    high_freq: Option<f32>,
}

#[derive(Deserialize)]
struct CepstrumSection {
    num_coeffs: Option<usize>,
    lifter: Option<f32>,
    log_floor: Option<f32>,
    delta_order: Option<usize>,
}

#[derive(Deserialize)]
struct RuntimeSection {
    parallel: Option<bool>,
}

/// Parse TOML text and merge it over the defaults.
///
/// # Errors
/// Returns an error if the text is not valid TOML for this schema.
///
/// # Example
/// ```
/// use mf_core::config::{parse_config, Span};
/// let config = parse_config("[mel]\nnum_filters = 40\n[frames]\nhop_length = { samples = 128 }").unwrap();
/// assert_eq!(config.num_filters, 40);
/// assert_eq!(config.hop_length, Span::Samples(128));
/// assert_eq!(config.num_coeffs, 13);
/// ```
pub fn parse_config(content: &str) -> Result<MfccConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;
    let mut config = MfccConfig::default();

    if let Some(f) = file.frames {
        if let Some(v) = f.frame_length {
            config.frame_length = v;
        }
        if let Some(v) = f.hop_length {
            config.hop_length = v;
        }
        if let Some(v) = f.window {
            config.window = v;
        }
        if let Some(v) = f.edge_policy {
            config.edge_policy = v;
        }
        if let Some(v) = f.remove_dc_offset {
            config.remove_dc_offset = v;
        }
        if let Some(v) = f.preemphasis {
            config.preemphasis = v;
        }
    }

    if let Some(s) = file.spectrum {
        if let Some(v) = s.fft_size {
            config.fft_size = v;
        }
        if let Some(v) = s.kind {
            config.spectrum = v;
        }
    }

    if let Some(m) = file.mel {
        if let Some(v) = m.num_filters {
            config.num_filters = v;
        }
        if let Some(v) = m.low_freq {
            config.low_freq = v;
        }
        if m.high_freq.is_some() {
            config.high_freq = m.high_freq;
        }
    }

    if let Some(c) = file.cepstrum {
        if let Some(v) = c.num_coeffs {
            config.num_coeffs = v;
        }
        if let Some(v) = c.lifter {
            config.lifter = v;
        }
        if let Some(v) = c.log_floor {
            config.log_floor = v;
        }
        if let Some(v) = c.delta_order {
            config.delta_order = v;
        }
    }

    if let Some(r) = file.runtime {
        if let Some(v) = r.parallel {
            config.parallel = v;
        }
    }

    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// Validation against a sample rate happens later, in [`MfccConfig::validate`].
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use mf_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<MfccConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    let config = parse_config(&content)
        .with_context(|| format!("Configuration invalide dans {}", path.display()))?;
    log::debug!(
        "Configuration chargée depuis {} : {} filtres, K = {}, FFT {}",
        path.display(),
        config.num_filters,
        config.num_coeffs,
        config.fft_size
    );
    Ok(config)
}
