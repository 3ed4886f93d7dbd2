use std::io::Write;

use serde::{Deserialize, Serialize};

/// Per-frame feature vectors in temporal order.
///
/// Stockage à plat, ligne par ligne : la frame `i` occupe
/// `values[i * width..(i + 1) * width]`.
///
/// # Example
/// ```
/// use mf_core::matrix::FeatureMatrix;
/// let m = FeatureMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]], 2, 0.01).unwrap();
/// assert_eq!(m.len(), 2);
/// assert_eq!(m.frame(1), Some(&[3.0, 4.0][..]));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    values: Vec<f32>,
    width: usize,
    /// Seconds between consecutive frame starts.
    hop_secs: f32,
}

/// The pipeline's primary output: one cepstral coefficient vector per frame.
pub type MfccMatrix = FeatureMatrix;

impl FeatureMatrix {
    /// Empty matrix with a fixed row width.
    #[must_use]
    pub fn new(width: usize, hop_secs: f32) -> Self {
        Self {
            values: Vec::new(),
            width,
            hop_secs,
        }
    }

    /// Build from owned rows. Returns `None` if any row has the wrong width.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<f32>>, width: usize, hop_secs: f32) -> Option<Self> {
        let mut m = Self::new(width, hop_secs);
        m.values.reserve(rows.len() * width);
        for row in rows {
            if row.len() != width {
                return None;
            }
            m.values.extend_from_slice(&row);
        }
        Some(m)
    }

    /// Append a row. Rows of the wrong width are rejected.
    pub fn push(&mut self, row: &[f32]) -> bool {
        if row.len() != self.width {
            return false;
        }
        self.values.extend_from_slice(row);
        true
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.values.len() / self.width
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values per frame.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn hop_secs(&self) -> f32 {
        self.hop_secs
    }

    /// Row `index`, if it exists.
    #[must_use]
    pub fn frame(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(self.width)?;
        self.values.get(start..start + self.width)
    }

    /// Rows in temporal order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[f32]> {
        self.values.chunks_exact(self.width.max(1))
    }

    /// Column `coeff` across all frames.
    #[must_use]
    pub fn column(&self, coeff: usize) -> Vec<f32> {
        if coeff >= self.width {
            return Vec::new();
        }
        self.iter().map(|row| row[coeff]).collect()
    }

    /// Start time of frame `index`, in seconds.
    #[must_use]
    pub fn time_of(&self, index: usize) -> f32 {
        index as f32 * self.hop_secs
    }

    /// Flat row-major view.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// True if every value is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    /// Write a tab-separated table: `frame  time  c0  c1 ...`.
    ///
    /// # Errors
    /// Propagates I/O errors from `out`.
    ///
    /// # Example
    /// ```
    /// use mf_core::matrix::FeatureMatrix;
    /// let m = FeatureMatrix::from_rows(vec![vec![1.5, -2.0]], 2, 0.01).unwrap();
    /// let mut buf = Vec::new();
    /// m.write_table(&mut buf).unwrap();
    /// let text = String::from_utf8(buf).unwrap();
    /// assert!(text.lines().nth(1).unwrap().starts_with("0\t0.0000\t1.500000\t-2.000000"));
    /// ```
    pub fn write_table<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write!(out, "frame\ttime")?;
        for c in 0..self.width {
            write!(out, "\tc{c}")?;
        }
        writeln!(out)?;
        for (i, row) in self.iter().enumerate() {
            write!(out, "{i}\t{:.4}", self.time_of(i))?;
            for v in row {
                write!(out, "\t{v:.6}")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}
