// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Filter settings: the twelve tonal and colour adjustments applied to a page,
// with their bounds and the stable fingerprint used in cache keys.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{QuireError, Result};

/// Length of the hex fingerprint embedded in cache keys.
const FINGERPRINT_HEX_LEN: usize = 16;

/// Adjustments for one page. `FilterSettings::default()` is the identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Additive offset, -100..=100.
    pub brightness: f64,
    /// Gain around mid-grey, -100..=100.
    pub contrast: f64,
    pub highlights: f64,
    pub midtones: f64,
    pub shadows: f64,
    /// Stops, -3..=3.
    pub exposure: f64,
    pub saturation: f64,
    pub vibrance: f64,
    pub sharpness: f64,
    /// Input level mapped to black, 0..=255.
    pub black_point: u8,
    /// Input level mapped to white, 0..=255. Must exceed `black_point`.
    pub white_point: u8,
    /// Output power curve, 0.1..=3.0.
    pub gamma: f64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 0.0,
            highlights: 0.0,
            midtones: 0.0,
            shadows: 0.0,
            exposure: 0.0,
            saturation: 0.0,
            vibrance: 0.0,
            sharpness: 0.0,
            black_point: 0,
            white_point: 255,
            gamma: 1.0,
        }
    }
}

impl FilterSettings {
    /// True when applying these settings is a no-op.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Reject any field outside its documented bounds.
    pub fn validate(&self) -> Result<()> {
        let percent_fields = [
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("highlights", self.highlights),
            ("midtones", self.midtones),
            ("shadows", self.shadows),
            ("saturation", self.saturation),
            ("vibrance", self.vibrance),
            ("sharpness", self.sharpness),
        ];
        for (name, value) in percent_fields {
            check_range(name, value, -100.0, 100.0)?;
        }
        check_range("exposure", self.exposure, -3.0, 3.0)?;
        check_range("gamma", self.gamma, 0.1, 3.0)?;
        if self.black_point >= self.white_point {
            return Err(QuireError::validation(format!(
                "black_point {} must be below white_point {}",
                self.black_point, self.white_point
            )));
        }
        Ok(())
    }

    /// Stable hex digest over all twelve fields in declaration order.
    ///
    /// Floats are hashed by bit pattern (with `-0.0` folded into `0.0`), so
    /// two settings compare equal here exactly when their values do,
    /// independent of how they were formatted on the wire.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for value in [
            self.brightness,
            self.contrast,
            self.highlights,
            self.midtones,
            self.shadows,
            self.exposure,
            self.saturation,
            self.vibrance,
            self.sharpness,
        ] {
            hasher.update(canonical_bits(value).to_le_bytes());
        }
        hasher.update([self.black_point, self.white_point]);
        hasher.update(canonical_bits(self.gamma).to_le_bytes());
        let digest = hasher.finalize();
        let mut hex = hex::encode(digest);
        hex.truncate(FINGERPRINT_HEX_LEN);
        hex
    }
}

fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 { 0.0f64.to_bits() } else { value.to_bits() }
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(QuireError::validation(format!(
            "{name} = {value} outside [{min}, {max}]"
        )))
    }
}
