use windows::Win32::Foundation::RPC_E_CHANGED_MODE;
use windows::Win32::Media::Audio::Endpoints::IAudioEndpointVolume;
use windows::Win32::Media::Audio::{eConsole, eRender, IMMDeviceEnumerator, MMDeviceEnumerator};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CLSCTX_ALL, COINIT_APARTMENTTHREADED,
};

use super::{clamp_level, AudioError, VolumeControl};

/// `IAudioEndpointVolume` of the default render endpoint.
///
/// COM objects are bound to the apartment of the creating thread, so this
/// must stay on the thread that called [`EndpointVolume::default_render`].
pub struct EndpointVolume {
    endpoint: IAudioEndpointVolume,
}

impl EndpointVolume {
    pub fn default_render() -> Result<Self, AudioError> {
        let hr = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) };
        // another library already chose the apartment; COM is usable either way
        if hr.is_err() && hr != RPC_E_CHANGED_MODE {
            return Err(AudioError::Os(format!("CoInitializeEx failed: {hr:?}")));
        }

        let enumerator: IMMDeviceEnumerator = unsafe {
            CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL).map_err(|e| {
                AudioError::Os(format!("Failed to create device enumerator: {e}"))
            })?
        };
        let device = unsafe {
            enumerator
                .GetDefaultAudioEndpoint(eRender, eConsole)
                .map_err(|e| {
                    tracing::debug!("GetDefaultAudioEndpoint: {e}");
                    AudioError::NoDevice()
                })?
        };
        let endpoint: IAudioEndpointVolume = unsafe {
            device.Activate(CLSCTX_ALL, None).map_err(|e| {
                AudioError::Os(format!("Failed to activate endpoint volume: {e}"))
            })?
        };

        Ok(EndpointVolume { endpoint })
    }
}

impl VolumeControl for EndpointVolume {
    fn master_volume(&self) -> Result<f32, AudioError> {
        unsafe { self.endpoint.GetMasterVolumeLevelScalar() }
            .map_err(|e| AudioError::Os(format!("GetMasterVolumeLevelScalar: {e}")))
    }

    fn set_master_volume(&mut self, level: f32) -> Result<(), AudioError> {
        unsafe {
            self.endpoint
                .SetMasterVolumeLevelScalar(clamp_level(level), std::ptr::null())
        }
        .map_err(|e| AudioError::Os(format!("SetMasterVolumeLevelScalar: {e}")))
    }

    fn name(&self) -> &str {
        "default output (WASAPI)"
    }
}
