//! Configuration, signal and matrix types shared across the melcep workspace.
//!
//! This crate holds everything the numeric pipeline (`mf-audio`) and the
//! binary (`mf-app`) agree on: the input [`Signal`], the output
//! [`FeatureMatrix`], the [`MfccConfig`] and the [`MfccError`] enum.

pub mod config;
pub mod error;
pub mod matrix;
pub mod signal;

pub use config::{EdgePolicy, FrameGeometry, MfccConfig, Span, SpectrumKind, WindowFunction};
pub use error::MfccError;
pub use matrix::{FeatureMatrix, MfccMatrix};
pub use signal::Signal;
