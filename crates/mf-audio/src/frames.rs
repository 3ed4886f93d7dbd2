use mf_core::config::{EdgePolicy, WindowFunction};
use mf_core::error::MfccError;

use crate::window::window_coefficients;

/// Number of frames produced for `signal_len` samples.
///
/// - `Pad`: every sample is covered; the last frame is zero-padded.
/// - `Drop`: only frames lying entirely inside the signal.
///
/// # Example
/// ```
/// use mf_audio::frames::expected_frame_count;
/// use mf_core::config::EdgePolicy;
/// assert_eq!(expected_frame_count(16_000, 400, 160, EdgePolicy::Pad), 99);
/// assert_eq!(expected_frame_count(16_000, 400, 160, EdgePolicy::Drop), 98);
/// ```
#[must_use]
pub fn expected_frame_count(
    signal_len: usize,
    frame_len: usize,
    hop_len: usize,
    policy: EdgePolicy,
) -> usize {
    if signal_len == 0 || frame_len == 0 || hop_len == 0 {
        return 0;
    }
    match policy {
        EdgePolicy::Pad => 1 + signal_len.saturating_sub(frame_len).div_ceil(hop_len),
        EdgePolicy::Drop if signal_len < frame_len => 0,
        EdgePolicy::Drop => 1 + (signal_len - frame_len) / hop_len,
    }
}

/// Découpe un signal mono en frames fenêtrées qui se chevauchent.
///
/// Per frame, in order: optional DC removal, optional pre-emphasis, window.
/// Frame length and hop are fixed for the lifetime of the segmenter.
///
/// # Example
/// ```
/// use mf_audio::frames::FrameSegmenter;
/// use mf_core::config::{EdgePolicy, WindowFunction};
/// let seg = FrameSegmenter::new(4, 2, WindowFunction::Rectangular, EdgePolicy::Pad).unwrap();
/// let frames: Vec<Vec<f32>> = seg.frames(&[1.0, 2.0, 3.0, 4.0, 5.0]).collect();
/// assert_eq!(frames, vec![vec![1.0, 2.0, 3.0, 4.0], vec![3.0, 4.0, 5.0, 0.0]]);
/// ```
#[derive(Clone, Debug)]
pub struct FrameSegmenter {
    frame_len: usize,
    hop_len: usize,
    policy: EdgePolicy,
    window: Vec<f32>,
    remove_dc_offset: bool,
    preemphasis: f32,
}

impl FrameSegmenter {
    /// # Errors
    /// Returns [`MfccError::InvalidConfiguration`] if `frame_len` or `hop_len` is 0.
    pub fn new(
        frame_len: usize,
        hop_len: usize,
        window: WindowFunction,
        policy: EdgePolicy,
    ) -> Result<Self, MfccError> {
        if frame_len == 0 {
            return Err(MfccError::config("frame length must be > 0 samples"));
        }
        if hop_len == 0 {
            return Err(MfccError::config("hop length must be > 0 samples"));
        }
        Ok(Self {
            frame_len,
            hop_len,
            policy,
            window: window_coefficients(window, frame_len),
            remove_dc_offset: false,
            preemphasis: 0.0,
        })
    }

    /// Enable per-frame DC offset removal.
    #[must_use]
    pub fn with_dc_removal(mut self, enabled: bool) -> Self {
        self.remove_dc_offset = enabled;
        self
    }

    /// Set the pre-emphasis coefficient (0.0 disables).
    #[must_use]
    pub fn with_preemphasis(mut self, coeff: f32) -> Self {
        self.preemphasis = coeff;
        self
    }

    #[must_use]
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    #[must_use]
    pub fn hop_len(&self) -> usize {
        self.hop_len
    }

    #[must_use]
    pub fn policy(&self) -> EdgePolicy {
        self.policy
    }

    /// Frames produced for a signal of `signal_len` samples.
    #[must_use]
    pub fn frame_count(&self, signal_len: usize) -> usize {
        expected_frame_count(signal_len, self.frame_len, self.hop_len, self.policy)
    }

    /// Fail-fast check that `signal_len` yields at least one frame.
    ///
    /// # Errors
    /// - [`MfccError::EmptySignal`] for an empty signal.
    /// - [`MfccError::InvalidConfiguration`] if the signal is shorter than one
    ///   frame and padding is disabled.
    pub fn check_len(&self, signal_len: usize) -> Result<(), MfccError> {
        if signal_len == 0 {
            return Err(MfccError::EmptySignal);
        }
        if self.frame_count(signal_len) == 0 {
            return Err(MfccError::config(format!(
                "signal of {signal_len} samples is shorter than one frame ({} samples) and padding is disabled",
                self.frame_len
            )));
        }
        Ok(())
    }

    /// Write windowed frame `index` of `samples` into `out` (length `frame_len`).
    ///
    /// Samples past the end of the signal read as zero. DC removal and
    /// pre-emphasis only see the real samples, so that padding stays zero.
    pub fn frame_into(&self, samples: &[f32], index: usize, out: &mut [f32]) {
        let start = (index * self.hop_len).min(samples.len());
        let end = (start + self.frame_len).min(samples.len());
        let avail = end - start;

        out[..avail].copy_from_slice(&samples[start..end]);
        out[avail..self.frame_len].fill(0.0);

        let real = &mut out[..avail];
        if self.remove_dc_offset && avail > 0 {
            let mean = real.iter().sum::<f32>() / avail as f32;
            real.iter_mut().for_each(|s| *s -= mean);
        }
        if self.preemphasis > 0.0 && avail > 0 {
            for i in (1..avail).rev() {
                real[i] -= self.preemphasis * real[i - 1];
            }
            real[0] -= self.preemphasis * real[0];
        }

        let frame = &mut out[..self.frame_len];
        for (s, w) in frame.iter_mut().zip(&self.window) {
            *s *= w;
        }
    }

    /// Lazy sequence of windowed frames in temporal order.
    pub fn frames<'a>(&'a self, samples: &'a [f32]) -> Frames<'a> {
        Frames {
            segmenter: self,
            samples,
            next: 0,
            count: self.frame_count(samples.len()),
        }
    }
}

/// Iterator returned by [`FrameSegmenter::frames`].
pub struct Frames<'a> {
    segmenter: &'a FrameSegmenter,
    samples: &'a [f32],
    next: usize,
    count: usize,
}

impl Iterator for Frames<'_> {
    type Item = Vec<f32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let mut frame = vec![0.0; self.segmenter.frame_len];
        self.segmenter.frame_into(self.samples, self.next, &mut frame);
        self.next += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.count - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Frames<'_> {}
