//! Planned batches of identically-configured calibration exposures.

use serde::{Deserialize, Serialize};
use skydarks_theskyx::ImageType;

/// Columns the plan and session tables display per frame set.
pub const NUMBER_OF_DISPLAY_FIELDS: usize = 5;

/// A batch of zero-exposure bias frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasFrameSet {
    pub frames_wanted: u32,
    pub binning: u32,
    pub frames_complete: u32,
}

/// A batch of dark frames of one exposure length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DarkFrameSet {
    pub frames_wanted: u32,
    pub exposure_seconds: f64,
    pub binning: u32,
    pub frames_complete: u32,
}

/// A batch of identical exposures with a target count and a completed count.
///
/// Only the session engine increments `frames_complete`, once per
/// successfully acquired frame; the caller reads it back after each
/// `FrameAcquired` event and persists it if desired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FrameSet {
    Bias(BiasFrameSet),
    Dark(DarkFrameSet),
}

impl FrameSet {
    pub fn bias(frames_wanted: u32, binning: u32) -> Self {
        FrameSet::Bias(BiasFrameSet {
            frames_wanted,
            binning,
            frames_complete: 0,
        })
    }

    pub fn dark(frames_wanted: u32, exposure_seconds: f64, binning: u32) -> Self {
        FrameSet::Dark(DarkFrameSet {
            frames_wanted,
            exposure_seconds,
            binning,
            frames_complete: 0,
        })
    }

    pub fn frames_wanted(&self) -> u32 {
        match self {
            FrameSet::Bias(set) => set.frames_wanted,
            FrameSet::Dark(set) => set.frames_wanted,
        }
    }

    pub fn binning(&self) -> u32 {
        match self {
            FrameSet::Bias(set) => set.binning,
            FrameSet::Dark(set) => set.binning,
        }
    }

    pub fn frames_complete(&self) -> u32 {
        match self {
            FrameSet::Bias(set) => set.frames_complete,
            FrameSet::Dark(set) => set.frames_complete,
        }
    }

    /// Exposure length in seconds; always zero for bias frames.
    pub fn exposure_seconds(&self) -> f64 {
        match self {
            FrameSet::Bias(_) => 0.0,
            FrameSet::Dark(set) => set.exposure_seconds,
        }
    }

    /// The server's numeric type code for this kind of frame.
    pub fn image_type(&self) -> ImageType {
        match self {
            FrameSet::Bias(_) => ImageType::Bias,
            FrameSet::Dark(_) => ImageType::Dark,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FrameSet::Bias(_) => "Bias",
            FrameSet::Dark(_) => "Dark",
        }
    }

    /// Frames still to acquire, crediting already-completed ones. A set with
    /// `frames_complete >= frames_wanted` contributes nothing to a session.
    pub fn remaining(&self) -> u32 {
        self.frames_wanted().saturating_sub(self.frames_complete())
    }

    /// Credit one successfully acquired frame.
    pub fn record_frame_complete(&mut self) {
        match self {
            FrameSet::Bias(set) => set.frames_complete += 1,
            FrameSet::Dark(set) => set.frames_complete += 1,
        }
    }

    /// Table cell text for the given display column: count, type, exposure,
    /// binning, completed.
    pub fn display_field(&self, field: usize) -> String {
        match field {
            0 => self.frames_wanted().to_string(),
            1 => self.type_name().to_string(),
            2 => match self {
                FrameSet::Bias(_) => String::new(),
                FrameSet::Dark(set) => set.exposure_seconds.to_string(),
            },
            3 => format!("{0} x {0}", self.binning()),
            4 => self.frames_complete().to_string(),
            _ => "invalid".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bias_exposure_is_zero() {
        let set = FrameSet::bias(16, 2);
        assert_eq!(set.exposure_seconds(), 0.0);
        assert_eq!(set.image_type(), ImageType::Bias);
        assert_eq!(set.type_name(), "Bias");
    }

    #[test]
    fn test_dark_carries_exposure() {
        let set = FrameSet::dark(8, 300.0, 1);
        assert_eq!(set.exposure_seconds(), 300.0);
        assert_eq!(set.image_type(), ImageType::Dark);
        assert_eq!(set.type_name(), "Dark");
    }

    #[test]
    fn test_remaining_saturates() {
        let mut set = FrameSet::bias(2, 1);
        assert_eq!(set.remaining(), 2);
        set.record_frame_complete();
        set.record_frame_complete();
        assert_eq!(set.remaining(), 0);
        // Over-complete sets still contribute nothing.
        set.record_frame_complete();
        assert_eq!(set.remaining(), 0);
    }

    #[test]
    fn test_display_fields() {
        let dark = FrameSet::dark(8, 120.0, 2);
        assert_eq!(dark.display_field(0), "8");
        assert_eq!(dark.display_field(1), "Dark");
        assert_eq!(dark.display_field(2), "120");
        assert_eq!(dark.display_field(3), "2 x 2");
        assert_eq!(dark.display_field(4), "0");
        assert_eq!(dark.display_field(NUMBER_OF_DISPLAY_FIELDS), "invalid");

        let bias = FrameSet::bias(16, 1);
        assert_eq!(bias.display_field(2), "");
    }
}
