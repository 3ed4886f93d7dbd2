use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use mf_core::config::MfccConfig;

/// melcep — Mel-frequency cepstral coefficients of a synthetic test signal.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Fréquence du signal sinusoïdal de test (Hz). Absent = silence.
    #[arg(long)]
    pub tone: Option<f32>,

    /// Amplitude crête du signal de test.
    #[arg(long, default_value_t = 0.5)]
    pub amplitude: f32,

    /// Durée du signal de test (secondes).
    #[arg(long, default_value_t = 1.0)]
    pub duration: f32,

    /// Taux d'échantillonnage du signal de test (Hz).
    #[arg(long, default_value_t = 16_000)]
    pub sample_rate: u32,

    /// Nombre de filtres Mel (remplace la config).
    #[arg(long)]
    pub filters: Option<usize>,

    /// Nombre de coefficients conservés (remplace la config).
    #[arg(long)]
    pub coeffs: Option<usize>,

    /// Taille de FFT (remplace la config).
    #[arg(long)]
    pub fft_size: Option<usize>,

    /// Ordre des deltas ajoutés : 0, 1 ou 2.
    #[arg(long)]
    pub deltas: Option<usize>,

    /// Répartir les frames sur plusieurs threads.
    #[arg(long, default_value_t = false)]
    pub parallel: bool,

    /// Features à calculer.
    #[arg(long, value_enum, default_value_t = FeatureKind::Mfcc)]
    pub features: FeatureKind,

    /// Format de sortie.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// Per-frame representation printed by the binary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FeatureKind {
    /// Cepstral coefficients.
    Mfcc,
    /// Log Mel filterbank energies.
    Fbank,
    /// Log10 magnitude spectrogram.
    Spectrogram,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tab-separated rows: frame, time, values.
    Table,
    /// The serialized feature matrix.
    Json,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut MfccConfig) {
        if let Some(v) = self.filters {
            config.num_filters = v;
        }
        if let Some(v) = self.coeffs {
            config.num_coeffs = v;
        }
        if let Some(v) = self.fft_size {
            config.fft_size = v;
        }
        if let Some(v) = self.deltas {
            config.delta_order = v;
        }
        if self.parallel {
            config.parallel = true;
        }
    }
}
