// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Redaction classification — decides whether an embedded image is a solid
// near-black overlay (discard) or legitimate content (keep).
//
// The signal is the mean sample value over every channel of every pixel.
// Redaction boxes are uniform black fills; real content has a lighter mean
// even where it contains dark regions. Mid-gray or coloured fills and very
// dark photographs are known misclassifications.

use unredact_core::config::EngineConfig;
use unredact_core::error::{Result, UnredactError};
use unredact_core::types::Decision;

use crate::image::samples::RasterSamples;

/// Decision plus the brightness it was based on. `brightness` is `None` when
/// box removal is disabled and nothing was measured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub decision: Decision,
    pub brightness: Option<f64>,
}

impl Classification {
    pub fn keep_unmeasured() -> Self {
        Self {
            decision: Decision::Keep,
            brightness: None,
        }
    }
}

/// Mean sample value of a buffer on the 0-255 scale, or `None` for an empty
/// buffer.
pub fn brightness(samples: &[u8]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let total: u64 = samples.iter().map(|&value| value as u64).sum();
    Some(total as f64 / samples.len() as f64)
}

/// The keep/discard policy for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationPolicy {
    remove_boxes: bool,
    threshold: f64,
}

impl ClassificationPolicy {
    pub fn new(remove_boxes: bool, threshold: f64) -> Self {
        Self {
            remove_boxes,
            threshold,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.remove_boxes, config.brightness_threshold)
    }

    /// Whether classification needs pixel data at all.
    pub fn is_active(&self) -> bool {
        self.remove_boxes
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Classify an already-normalised sample buffer (at most three channels).
    pub fn classify_samples(&self, samples: &[u8]) -> Result<Classification> {
        if !self.remove_boxes {
            return Ok(Classification::keep_unmeasured());
        }
        let mean = brightness(samples)
            .ok_or_else(|| UnredactError::ImageError("image has no samples".into()))?;
        let decision = if mean <= self.threshold {
            Decision::Discard
        } else {
            Decision::Keep
        };
        Ok(Classification {
            decision,
            brightness: Some(mean),
        })
    }

    /// Classify decoded image samples, normalising colour first. The
    /// normalised copy lives only for the duration of this call.
    pub fn classify(&self, raster: &RasterSamples) -> Result<Classification> {
        if !self.remove_boxes {
            return Ok(Classification::keep_unmeasured());
        }
        let normalized = raster.normalized();
        self.classify_samples(&normalized)
    }
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(components: u8, value: u8) -> RasterSamples {
        RasterSamples {
            width: 8,
            height: 4,
            components,
            data: vec![value; 32 * components as usize],
        }
    }

    #[test]
    fn near_black_is_discarded() {
        let policy = ClassificationPolicy::default();
        for value in 0..=15u8 {
            for components in [1, 3] {
                let result = policy.classify(&uniform(components, value)).unwrap();
                assert_eq!(result.decision, Decision::Discard, "value {value}");
                assert_eq!(result.brightness, Some(value as f64));
            }
        }
    }

    #[test]
    fn bright_content_is_kept() {
        let policy = ClassificationPolicy::default();
        for value in [16u8, 128, 200, 255] {
            let result = policy.classify(&uniform(3, value)).unwrap();
            assert_eq!(result.decision, Decision::Keep, "value {value}");
        }
    }

    #[test]
    fn dark_photo_with_light_background_is_kept() {
        // Half black, half white: mean 127.5.
        let mut samples = vec![0u8; 50];
        samples.extend(vec![255u8; 50]);
        let result = ClassificationPolicy::default()
            .classify_samples(&samples)
            .unwrap();
        assert_eq!(result.decision, Decision::Keep);
        assert_eq!(result.brightness, Some(127.5));
    }

    #[test]
    fn disabled_policy_keeps_everything_unmeasured() {
        let policy = ClassificationPolicy::new(false, 15.0);
        for value in [0u8, 5, 200] {
            let result = policy.classify(&uniform(1, value)).unwrap();
            assert_eq!(result, Classification::keep_unmeasured());
        }
        // Even an empty buffer is fine: nothing is measured.
        assert!(policy.classify_samples(&[]).is_ok());
    }

    #[test]
    fn black_cmyk_box_is_discarded_after_normalisation() {
        let black = RasterSamples {
            width: 2,
            height: 2,
            components: 4,
            data: [0u8, 0, 0, 255].repeat(4),
        };
        let result = ClassificationPolicy::default().classify(&black).unwrap();
        assert_eq!(result.decision, Decision::Discard);
    }

    #[test]
    fn empty_buffer_cannot_be_classified() {
        assert!(matches!(
            ClassificationPolicy::default().classify_samples(&[]),
            Err(UnredactError::ImageError(_))
        ));
    }

    #[test]
    fn threshold_is_configurable() {
        let policy = ClassificationPolicy::new(true, 60.0);
        let result = policy.classify(&uniform(1, 50)).unwrap();
        assert_eq!(result.decision, Decision::Discard);
        assert_eq!(policy.threshold(), 60.0);
    }
}
