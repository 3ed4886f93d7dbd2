use thiserror::Error;

/// Errors produced while configuring or running the MFCC pipeline.
///
/// Aucune erreur n'est transitoire : le calcul est pur et déterministe.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MfccError {
    /// Non-positive or inconsistent frame, hop, filter or frequency parameters.
    #[error("Configuration invalide : {0}")]
    InvalidConfiguration(String),

    /// The input signal contains no samples.
    #[error("Signal vide : aucun échantillon à analyser")]
    EmptySignal,

    /// A NaN or infinite value reached the output despite the log floor.
    #[error("Valeur numérique dégénérée : {0}")]
    NumericDegenerate(String),

    /// The FFT backend rejected its buffers.
    #[error("Erreur de transformée : {0}")]
    Transform(String),
}

impl MfccError {
    /// Shorthand for [`MfccError::InvalidConfiguration`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}
