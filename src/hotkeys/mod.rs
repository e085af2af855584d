//! System wide F1-F9 hotkeys.
//!
//! Key presses are translated with [`command_for_function_key`] and sent over
//! a channel; the receiver decides what to do with them.

use std::sync::mpsc::Sender;

use thistermination::TerminationFull;

use crate::eq::EqCommand;
pub use crate::eq::presets::command_for_function_key;
use crate::eq::presets::RESET_KEY;

#[derive(TerminationFull)]
pub enum HotkeyError {
    #[termination(msg("Global hotkeys are not supported on this platform."))]
    Unsupported(),
    #[termination(msg("None of the hotkeys could be registered. Are they used by another program?"))]
    NoneRegistered(),
    #[termination(msg("Failed to start the hotkey thread: {0:?}"))]
    Thread(#[from] std::io::Error),
}

cfg_if::cfg_if! {
    if #[cfg(target_os = "windows")] {
        mod win32;
        pub use win32::HotkeyListener;
    } else {
        /// Cannot be constructed off Windows.
        pub enum HotkeyListener {}

        impl HotkeyListener {
            pub fn registered_keys(&self) -> &[u8] {
                match *self {}
            }
        }
    }
}

/// Registers F1-F9 and forwards presses to `command_tx` until the returned listener is dropped.
/// Dropping the listener unregisters every key.
pub fn register_global_hotkeys(
    command_tx: Sender<EqCommand>,
) -> Result<HotkeyListener, HotkeyError> {
    cfg_if::cfg_if! {
        if #[cfg(target_os = "windows")] {
            HotkeyListener::spawn(command_tx)
        } else {
            drop(command_tx);
            Err(HotkeyError::Unsupported())
        }
    }
}

/// F-keys the window has to handle itself because no global hotkey owns them.
pub fn keys_without_global_hotkey(listener: Option<&HotkeyListener>) -> Vec<u8> {
    let registered = listener.map(|l| l.registered_keys()).unwrap_or_default();
    unclaimed_keys(registered)
}

fn unclaimed_keys(registered: &[u8]) -> Vec<u8> {
    (1..=RESET_KEY).filter(|key| !registered.contains(key)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn unsupported_off_windows() {
        let (tx, _rx) = std::sync::mpsc::channel();
        assert!(matches!(
            register_global_hotkeys(tx),
            Err(HotkeyError::Unsupported())
        ));
    }

    #[test]
    fn f1_through_f9_are_bound() {
        for key in 1..=9 {
            assert!(command_for_function_key(key).is_some(), "F{key} unbound");
        }
    }

    #[test]
    fn window_handles_keys_no_listener_owns() {
        assert_eq!(keys_without_global_hotkey(None), (1..=9).collect::<Vec<u8>>());
        assert_eq!(unclaimed_keys(&[1, 2, 3, 4, 6, 7, 8, 9]), vec![5]);
        assert!(unclaimed_keys(&[1, 2, 3, 4, 5, 6, 7, 8, 9]).is_empty());
    }
}
