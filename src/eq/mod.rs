pub mod presets;
pub mod state;

#[cfg(feature = "eq-editor")]
pub mod editor;

/// Center frequencies of the ten bands, in Hz.
pub const EQ_FREQUENCIES: [u32; NUM_BANDS] =
    [60, 170, 310, 600, 1000, 3000, 6000, 12000, 14000, 16000];

pub const NUM_BANDS: usize = 10;
pub const GAIN_MIN: i32 = -50;
pub const GAIN_MAX: i32 = 50;

/// Commands sent from hotkeys and menus to the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EqCommand {
    ApplyPreset(String),
    Reset,
}

/// Label shown under a band slider, e.g. `"1000Hz"`.
pub fn band_label(index: usize) -> String {
    format!("{}Hz", EQ_FREQUENCIES[index])
}

/// Label shown for a gain value, e.g. `"-15dB"`.
pub fn gain_label(gain: i32) -> String {
    format!("{}dB", gain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequencies_ascend() {
        assert!(EQ_FREQUENCIES.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn labels() {
        assert_eq!(band_label(0), "60Hz");
        assert_eq!(band_label(9), "16000Hz");
        assert_eq!(gain_label(-15), "-15dB");
        assert_eq!(gain_label(0), "0dB");
    }
}
