use super::presets::{self, EqPreset};
use super::{EqCommand, GAIN_MAX, GAIN_MIN, NUM_BANDS};
use crate::audio::VolumeControl;

/// Volume shown while the system volume is unknown.
pub const DEFAULT_VOLUME: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Active,
    PresetApplied,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
}

impl Status {
    fn active() -> Self {
        Status {
            kind: StatusKind::Active,
            text: "Status: Active - Modifies system sound".to_string(),
        }
    }
}

/// Everything the panel shows. The band gains are display values only; the
/// system volume is the one value forwarded to the OS.
pub struct Equalizer {
    gains: [i32; NUM_BANDS],
    /// Last volume read from or accepted by the OS.
    volume: Option<f32>,
    current_preset: String,
    status: Status,
    volume_control: Option<Box<dyn VolumeControl>>,
}

impl Equalizer {
    pub fn new(volume_control: Option<Box<dyn VolumeControl>>) -> Self {
        let volume = match volume_control.as_ref().map(|c| c.master_volume()) {
            Some(Ok(level)) => Some(level),
            Some(Err(e)) => {
                tracing::error!("Reading the system volume failed: {e}");
                None
            }
            None => None,
        };
        Equalizer {
            gains: [0; NUM_BANDS],
            volume,
            current_preset: presets::NORMAL.to_string(),
            status: Status::active(),
            volume_control,
        }
    }

    pub fn gains(&self) -> &[i32; NUM_BANDS] {
        &self.gains
    }

    pub fn current_preset(&self) -> &str {
        &self.current_preset
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn has_audio_control(&self) -> bool {
        self.volume_control.is_some()
    }

    /// Last volume known to be set on the OS, or [`DEFAULT_VOLUME`] if none is known.
    pub fn volume(&self) -> f32 {
        self.volume.unwrap_or(DEFAULT_VOLUME)
    }

    pub fn volume_is_known(&self) -> bool {
        self.volume.is_some()
    }

    pub fn volume_percent(&self) -> u8 {
        (self.volume() * 100.0).round().clamp(0.0, 100.0) as u8
    }

    pub fn set_gain(&mut self, index: usize, gain: i32) {
        if let Some(slot) = self.gains.get_mut(index) {
            *slot = gain.clamp(GAIN_MIN, GAIN_MAX);
        }
    }

    /// Forwards `percent / 100` to the OS. The stored volume only changes once the OS accepted it.
    pub fn set_volume_percent(&mut self, percent: u8) {
        let level = f32::from(percent.min(100)) / 100.0;
        let Some(control) = self.volume_control.as_mut() else {
            return;
        };
        match control.set_master_volume(level) {
            Ok(()) => self.volume = Some(level),
            Err(e) => tracing::error!("Changing the system volume failed: {e}"),
        }
    }

    pub fn apply_preset(&mut self, preset: &EqPreset) {
        for (index, &gain) in preset.bands.iter().enumerate() {
            self.set_gain(index, gain);
        }
        self.current_preset = preset.name.clone();
        self.status = Status {
            kind: StatusKind::PresetApplied,
            text: format!("Preset applied: {}", preset.name),
        };
        tracing::info!("Applied preset {}", preset.name);
    }

    /// Flattens the bands and pushes the last known volume back to the slider and the OS.
    /// An unknown volume is never written.
    pub fn reset(&mut self) {
        self.apply_preset(&EqPreset::new(presets::NORMAL, [0; NUM_BANDS]));
        if self.volume_is_known() {
            self.set_volume_percent(self.volume_percent());
        }
        self.status = Status {
            kind: StatusKind::Reset,
            text: "Settings reset".to_string(),
        };
    }

    /// Runs a hotkey or menu command against the given preset list.
    pub fn execute(&mut self, command: &EqCommand, available: &[EqPreset]) {
        match command {
            EqCommand::Reset => self.reset(),
            EqCommand::ApplyPreset(name) => match presets::find_preset(available, name) {
                Some(preset) => self.apply_preset(preset),
                None => tracing::warn!("Unknown preset {name}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioError, MemoryVolume};
    use crate::eq::presets::builtin_presets;
    use std::sync::{Arc, Mutex};

    /// Endpoint whose reads fail; writes land in a shared level.
    struct WriteOnly(Arc<Mutex<f32>>);

    impl VolumeControl for WriteOnly {
        fn master_volume(&self) -> Result<f32, AudioError> {
            Err(AudioError::Os("read failed".into()))
        }

        fn set_master_volume(&mut self, level: f32) -> Result<(), AudioError> {
            *self.0.lock().unwrap() = level;
            Ok(())
        }

        fn name(&self) -> &str {
            "write-only"
        }
    }

    fn with_volume(level: f32) -> Equalizer {
        Equalizer::new(Some(Box::new(MemoryVolume::new(level))))
    }

    #[test]
    fn starts_flat_and_active() {
        let eq = with_volume(0.42);
        assert_eq!(eq.gains(), &[0; NUM_BANDS]);
        assert_eq!(eq.current_preset(), "Normal");
        assert_eq!(eq.status().kind, StatusKind::Active);
        assert_eq!(eq.volume_percent(), 42);
    }

    #[test]
    fn without_endpoint_volume_is_full_and_fixed() {
        let mut eq = Equalizer::new(None);
        assert!(!eq.has_audio_control());
        assert_eq!(eq.volume_percent(), 100);
        eq.set_volume_percent(10);
        assert_eq!(eq.volume_percent(), 100);
    }

    #[test]
    fn percent_rounds_instead_of_truncating() {
        // 0.59 is stored as 0.58999997
        let eq = with_volume(0.59);
        assert_eq!(eq.volume_percent(), 59);
    }

    #[test]
    fn set_volume_updates_after_success() {
        let mut eq = with_volume(0.5);
        eq.set_volume_percent(80);
        assert_eq!(eq.volume_percent(), 80);
        eq.set_volume_percent(250);
        assert_eq!(eq.volume_percent(), 100);
    }

    #[test]
    fn failed_write_keeps_old_volume() {
        let mut eq = Equalizer::new(Some(Box::new(MemoryVolume::failing(0.3))));
        eq.set_volume_percent(90);
        assert_eq!(eq.volume_percent(), 30);
    }

    #[test]
    fn gains_are_clamped_and_bounds_checked() {
        let mut eq = with_volume(1.0);
        eq.set_gain(0, 80);
        eq.set_gain(1, -80);
        eq.set_gain(NUM_BANDS, 10);
        assert_eq!(eq.gains()[0], 50);
        assert_eq!(eq.gains()[1], -50);
    }

    #[test]
    fn applying_a_preset_updates_status() {
        let mut eq = with_volume(1.0);
        eq.execute(&EqCommand::ApplyPreset("Jazz".into()), &builtin_presets());
        assert_eq!(eq.gains(), &[20, 25, 35, 25, 20, 0, -20, -25, -20, 0]);
        assert_eq!(eq.current_preset(), "Jazz");
        assert_eq!(eq.status().kind, StatusKind::PresetApplied);
        assert_eq!(eq.status().text, "Preset applied: Jazz");
    }

    #[test]
    fn unknown_preset_changes_nothing() {
        let mut eq = with_volume(1.0);
        eq.execute(&EqCommand::ApplyPreset("Polka".into()), &builtin_presets());
        assert_eq!(eq.current_preset(), "Normal");
        assert_eq!(eq.status().kind, StatusKind::Active);
    }

    #[test]
    fn reset_flattens_and_keeps_volume() {
        let mut eq = with_volume(0.5);
        eq.execute(&EqCommand::ApplyPreset("Rock".into()), &builtin_presets());
        eq.set_volume_percent(35);
        eq.execute(&EqCommand::Reset, &builtin_presets());
        assert_eq!(eq.gains(), &[0; NUM_BANDS]);
        assert_eq!(eq.current_preset(), "Normal");
        assert_eq!(eq.volume_percent(), 35);
        assert_eq!(eq.status().kind, StatusKind::Reset);
        assert_eq!(eq.status().text, "Settings reset");
    }

    #[test]
    fn reset_never_writes_an_unread_volume() {
        let os_level = Arc::new(Mutex::new(0.2));
        let mut eq = Equalizer::new(Some(Box::new(WriteOnly(os_level.clone()))));
        assert!(!eq.volume_is_known());

        eq.execute(&EqCommand::Reset, &builtin_presets());
        assert_eq!(*os_level.lock().unwrap(), 0.2);
        assert_eq!(eq.status().kind, StatusKind::Reset);

        eq.set_volume_percent(60);
        assert!(eq.volume_is_known());
        eq.execute(&EqCommand::Reset, &builtin_presets());
        assert_eq!(*os_level.lock().unwrap(), 0.6);
        assert_eq!(eq.volume_percent(), 60);
    }
}
