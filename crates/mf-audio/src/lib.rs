// Frame segmentation, spectral analysis and Mel-cepstral projection for melcep.

pub mod cepstrum;
pub mod deltas;
pub mod fft;
pub mod frames;
pub mod mel;
pub mod pipeline;
pub mod window;

pub use pipeline::MfccPipeline;
