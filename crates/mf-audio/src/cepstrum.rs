use std::f32::consts::PI;

use mf_core::error::MfccError;

use crate::mel::MelFilterbank;

/// Projection d'un spectre sur le cepstre Mel.
///
/// Band energies (filterbank weighted sums), `ln(energy + ε)`, orthonormal
/// DCT-II over the M log-energies, truncation to the first K coefficients,
/// then optional sinusoidal liftering `1 + (L/2) sin(πn/L)`.
///
/// The DCT matrix and lifter are precomputed; the projector holds no
/// per-frame state and the filterbank is passed in explicitly.
///
/// # Example
/// ```
/// use mf_audio::cepstrum::CepstralProjector;
/// use mf_audio::mel::MelFilterbank;
/// let bank = MelFilterbank::new(16_000, 512, 26, 0.0, 8000.0).unwrap();
/// let proj = CepstralProjector::new(26, 13, 22.0, 1e-10).unwrap();
/// let coeffs = proj.project(&bank, &vec![1.0; 257]).unwrap();
/// assert_eq!(coeffs.len(), 13);
/// ```
#[derive(Clone, Debug)]
pub struct CepstralProjector {
    num_filters: usize,
    num_coeffs: usize,
    /// Row-major K × M.
    dct: Vec<f32>,
    lifter: Vec<f32>,
    log_floor: f32,
}

impl CepstralProjector {
    /// # Errors
    /// Returns [`MfccError::InvalidConfiguration`] unless
    /// `1 <= num_coeffs <= num_filters`, `lifter >= 0` and `log_floor > 0`.
    pub fn new(
        num_filters: usize,
        num_coeffs: usize,
        lifter: f32,
        log_floor: f32,
    ) -> Result<Self, MfccError> {
        if num_filters < 1 {
            return Err(MfccError::config("num_filters must be >= 1"));
        }
        if num_coeffs < 1 || num_coeffs > num_filters {
            return Err(MfccError::config(format!(
                "num_coeffs must be in 1..={num_filters}, got {num_coeffs}"
            )));
        }
        if !lifter.is_finite() || lifter < 0.0 {
            return Err(MfccError::config(format!("lifter must be >= 0, got {lifter}")));
        }
        if !log_floor.is_finite() || log_floor <= 0.0 {
            return Err(MfccError::config(format!(
                "log floor must be positive, got {log_floor}"
            )));
        }

        Ok(Self {
            num_filters,
            num_coeffs,
            dct: dct_matrix(num_coeffs, num_filters),
            lifter: lifter_coefficients(num_coeffs, lifter),
            log_floor,
        })
    }

    #[must_use]
    pub fn num_filters(&self) -> usize {
        self.num_filters
    }

    /// Retained coefficient count K.
    #[must_use]
    pub fn num_coeffs(&self) -> usize {
        self.num_coeffs
    }

    fn check_bank(&self, bank: &MelFilterbank, spectrum: &[f32]) -> Result<(), MfccError> {
        if spectrum.len() != bank.num_bins() {
            return Err(MfccError::config(format!(
                "spectrum has {} bins, filterbank was built for {} (FFT {})",
                spectrum.len(),
                bank.num_bins(),
                bank.fft_size()
            )));
        }
        if bank.len() != self.num_filters {
            return Err(MfccError::config(format!(
                "filterbank has {} filters, projector expects {}",
                bank.len(),
                self.num_filters
            )));
        }
        Ok(())
    }

    /// Log band energies `ln(bank(spectrum) + ε)` written into `out` (length M).
    ///
    /// # Errors
    /// Returns [`MfccError::InvalidConfiguration`] if `bank` does not have M
    /// filters, `spectrum` does not match the bank's FFT size or `out` is not
    /// M long.
    pub fn log_energies_into(
        &self,
        bank: &MelFilterbank,
        spectrum: &[f32],
        out: &mut [f32],
    ) -> Result<(), MfccError> {
        self.check_bank(bank, spectrum)?;
        check_len("log energy buffer", out.len(), self.num_filters)?;
        bank.apply_into(spectrum, out);
        for e in out.iter_mut() {
            *e = (*e + self.log_floor).ln();
        }
        Ok(())
    }

    /// DCT-II plus lifter over precomputed log energies, written into `out` (length K).
    ///
    /// # Errors
    /// Returns [`MfccError::InvalidConfiguration`] unless `log_energies` has
    /// M values and `out` has room for exactly K.
    pub fn cepstrum_into(&self, log_energies: &[f32], out: &mut [f32]) -> Result<(), MfccError> {
        check_len("log energies", log_energies.len(), self.num_filters)?;
        check_len("cepstrum buffer", out.len(), self.num_coeffs)?;
        for (k, (c, row)) in out
            .iter_mut()
            .zip(self.dct.chunks_exact(self.num_filters))
            .enumerate()
        {
            let sum: f32 = row.iter().zip(log_energies).map(|(d, e)| d * e).sum();
            *c = sum * self.lifter[k];
        }
        Ok(())
    }

    /// Full projection of one linear spectrum into `out` (length K).
    ///
    /// `scratch` holds the M log energies and is overwritten.
    ///
    /// # Errors
    /// Returns [`MfccError::InvalidConfiguration`] if `bank` does not have M
    /// filters or `spectrum` does not match the bank's FFT size.
    pub fn project_into(
        &self,
        bank: &MelFilterbank,
        spectrum: &[f32],
        scratch: &mut [f32],
        out: &mut [f32],
    ) -> Result<(), MfccError> {
        self.log_energies_into(bank, spectrum, scratch)?;
        self.cepstrum_into(scratch, out)
    }

    /// Allocating variant of [`project_into`](Self::project_into).
    ///
    /// # Errors
    /// Returns [`MfccError::InvalidConfiguration`] if `bank` does not have M
    /// filters or `spectrum` does not match the bank's FFT size.
    pub fn project(&self, bank: &MelFilterbank, spectrum: &[f32]) -> Result<Vec<f32>, MfccError> {
        let mut scratch = vec![0.0; self.num_filters];
        let mut out = vec![0.0; self.num_coeffs];
        self.project_into(bank, spectrum, &mut scratch, &mut out)?;
        Ok(out)
    }
}

fn check_len(what: &str, got: usize, expected: usize) -> Result<(), MfccError> {
    if got == expected {
        Ok(())
    } else {
        Err(MfccError::config(format!(
            "{what} has {got} values, expected {expected}"
        )))
    }
}

/// Orthonormal DCT-II basis, `rows` × `cols`, row-major.
fn dct_matrix(rows: usize, cols: usize) -> Vec<f32> {
    let n = cols as f32;
    let k0 = (1.0 / n).sqrt();
    let kn = (2.0 / n).sqrt();
    let mut m = Vec::with_capacity(rows * cols);
    for k in 0..rows {
        let scale = if k == 0 { k0 } else { kn };
        for j in 0..cols {
            m.push(scale * (PI * k as f32 * (j as f32 + 0.5) / n).cos());
        }
    }
    m
}

/// Sinusoidal lifter weights; all ones when `lifter` is 0.
fn lifter_coefficients(len: usize, lifter: f32) -> Vec<f32> {
    if lifter == 0.0 {
        return vec![1.0; len];
    }
    (0..len)
        .map(|n| 1.0 + 0.5 * lifter * (PI * n as f32 / lifter).sin())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> MelFilterbank {
        MelFilterbank::new(16_000, 512, 26, 0.0, 8000.0).unwrap()
    }

    #[test]
    fn rejects_more_coeffs_than_filters() {
        assert!(CepstralProjector::new(26, 27, 0.0, 1e-10).is_err());
        assert!(CepstralProjector::new(26, 0, 0.0, 1e-10).is_err());
        assert!(CepstralProjector::new(0, 0, 0.0, 1e-10).is_err());
        assert!(CepstralProjector::new(26, 13, -1.0, 1e-10).is_err());
        assert!(CepstralProjector::new(26, 13, 22.0, 0.0).is_err());
    }

    #[test]
    fn rejects_mismatched_bank() {
        let proj = CepstralProjector::new(40, 13, 22.0, 1e-10).unwrap();
        assert!(matches!(
            proj.project(&bank(), &[1.0; 257]),
            Err(MfccError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn rejects_spectrum_from_another_fft_size() {
        let proj = CepstralProjector::new(26, 13, 22.0, 1e-10).unwrap();
        assert!(proj.project(&bank(), &[1.0; 513]).is_err());
    }

    #[test]
    fn dct_rows_are_orthonormal() {
        let m = 26;
        let d = dct_matrix(m, m);
        for a in 0..m {
            for b in 0..m {
                let dot: f32 = (0..m).map(|j| d[a * m + j] * d[b * m + j]).sum();
                let expected = if a == b { 1.0 } else { 0.0 };
                assert!((dot - expected).abs() < 1e-4, "({a},{b}) = {dot}");
            }
        }
    }

    #[test]
    fn zero_spectrum_yields_floor_cepstrum() {
        let proj = CepstralProjector::new(26, 13, 0.0, 1e-10).unwrap();
        let c = proj.project(&bank(), &[0.0; 257]).unwrap();
        assert!(c.iter().all(|v| v.is_finite()));
        let expected_c0 = (26.0f32).sqrt() * (1e-10f32).ln();
        assert!((c[0] - expected_c0).abs() < 1e-2, "c0 = {}", c[0]);
        assert!(c[1..].iter().all(|v| v.abs() < 1e-3));
    }

    #[test]
    fn lifter_leaves_c0_and_scales_the_rest() {
        let w = lifter_coefficients(13, 22.0);
        assert!((w[0] - 1.0).abs() < f32::EPSILON);
        assert!((w[11] - 12.0).abs() < 1e-4);
        assert!(w.iter().all(|&x| x >= 1.0));
        assert_eq!(lifter_coefficients(4, 0.0), vec![1.0; 4]);
    }

    #[test]
    fn constant_log_energies_only_feed_c0() {
        let proj = CepstralProjector::new(26, 13, 22.0, 1e-10).unwrap();
        let mut out = [0.0f32; 13];
        proj.cepstrum_into(&[2.0; 26], &mut out).unwrap();
        assert!((out[0] - 2.0 * (26.0f32).sqrt()).abs() < 1e-4);
        assert!(out[1..].iter().all(|v| v.abs() < 1e-3));
    }

    #[test]
    fn buffers_of_the_wrong_length_are_rejected() {
        let proj = CepstralProjector::new(26, 13, 22.0, 1e-10).unwrap();
        let mut out = [0.0f32; 13];
        assert!(matches!(
            proj.cepstrum_into(&[2.0; 20], &mut out),
            Err(MfccError::InvalidConfiguration(_))
        ));
        assert!(proj.cepstrum_into(&[2.0; 40], &mut out).is_err());
        assert!(proj.cepstrum_into(&[2.0; 26], &mut [0.0f32; 12]).is_err());
        assert!(out.iter().all(|&c| c == 0.0), "nothing written on error");

        let mut energies = [0.0f32; 20];
        assert!(proj.log_energies_into(&bank(), &[1.0; 257], &mut energies).is_err());
    }
}
