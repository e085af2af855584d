//! System volume of the default output endpoint.
//!
//! Only a single scalar ever reaches the OS. Backends are picked per platform;
//! where none exists [`connect_default_endpoint`] fails and callers run without
//! audio control.

#[cfg(target_os = "windows")]
mod wasapi;

use thistermination::TerminationFull;

#[derive(TerminationFull)]
pub enum AudioError {
    #[termination(msg("No default audio output device."))]
    NoDevice(),
    #[termination(msg("System volume control is not supported on this platform."))]
    Unsupported(),
    #[termination(msg("Audio API call failed: {0}"))]
    Os(String),
}

pub trait VolumeControl {
    /// Master volume as a fraction in `0.0..=1.0`.
    fn master_volume(&self) -> Result<f32, AudioError>;
    /// Sets the master volume. Values outside `0.0..=1.0` are clamped.
    fn set_master_volume(&mut self, level: f32) -> Result<(), AudioError>;
    fn name(&self) -> &str;
}

pub fn connect_default_endpoint() -> Result<Box<dyn VolumeControl>, AudioError> {
    cfg_if::cfg_if! {
        if #[cfg(target_os = "windows")] {
            let endpoint = wasapi::EndpointVolume::default_render()?;
            tracing::info!("Connected to audio endpoint {}", endpoint.name());
            Ok(Box::new(endpoint))
        } else {
            Err(AudioError::Unsupported())
        }
    }
}

pub fn clamp_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

/// Volume held in memory; stands in for an endpoint where no OS backend is wanted.
#[derive(Debug, Clone)]
pub struct MemoryVolume {
    level: f32,
    fail_writes: bool,
}

impl MemoryVolume {
    pub fn new(level: f32) -> Self {
        MemoryVolume {
            level: clamp_level(level),
            fail_writes: false,
        }
    }

    /// Every subsequent write fails, like an endpoint that went away.
    pub fn failing(level: f32) -> Self {
        MemoryVolume {
            level: clamp_level(level),
            fail_writes: true,
        }
    }
}

impl VolumeControl for MemoryVolume {
    fn master_volume(&self) -> Result<f32, AudioError> {
        Ok(self.level)
    }

    fn set_master_volume(&mut self, level: f32) -> Result<(), AudioError> {
        if self.fail_writes {
            return Err(AudioError::NoDevice());
        }
        self.level = clamp_level(level);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
