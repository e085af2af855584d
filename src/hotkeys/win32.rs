use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use windows::Win32::Foundation::{LPARAM, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    RegisterHotKey, UnregisterHotKey, MOD_NOREPEAT, VK_F1,
};
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, PostThreadMessageW, TranslateMessage, MSG, WM_HOTKEY, WM_QUIT,
};

use super::{command_for_function_key, HotkeyError};
use crate::eq::presets::RESET_KEY;
use crate::eq::EqCommand;

/// Thread owning the `RegisterHotKey` registrations and their message loop.
pub struct HotkeyListener {
    thread_id: u32,
    registered: Vec<u8>,
    thread: Option<JoinHandle<()>>,
}

impl HotkeyListener {
    pub(super) fn spawn(command_tx: Sender<EqCommand>) -> Result<Self, HotkeyError> {
        let (ready_tx, ready_rx) = mpsc::channel::<Option<(u32, Vec<u8>)>>();

        let thread = std::thread::Builder::new()
            .name("hotkeys".into())
            .spawn(move || {
                let thread_id = unsafe { GetCurrentThreadId() };
                // registering creates the thread's message queue, which WM_HOTKEY and WM_QUIT land in
                let registered: Vec<u8> = (1..=RESET_KEY)
                    .filter(|&key| {
                        let vk = u32::from(VK_F1.0) + u32::from(key - 1);
                        match unsafe { RegisterHotKey(None, i32::from(key), MOD_NOREPEAT, vk) } {
                            Ok(()) => true,
                            Err(e) => {
                                tracing::warn!("Could not register F{key}: {e}");
                                false
                            }
                        }
                    })
                    .collect();

                if registered.is_empty() {
                    let _ = ready_tx.send(None);
                    return;
                }
                tracing::info!("Registered hotkeys {:?}", registered);
                let _ = ready_tx.send(Some((thread_id, registered.clone())));

                let mut msg = MSG::default();
                while unsafe { GetMessageW(&mut msg, None, 0, 0) }.0 > 0 {
                    if msg.message == WM_HOTKEY {
                        let key = msg.wParam.0 as u8;
                        if let Some(command) = command_for_function_key(key) {
                            tracing::debug!("F{key} pressed");
                            if command_tx.send(command).is_err() {
                                break;
                            }
                        }
                        continue;
                    }
                    unsafe {
                        let _ = TranslateMessage(&msg);
                        DispatchMessageW(&msg);
                    }
                }

                for key in registered {
                    let _ = unsafe { UnregisterHotKey(None, i32::from(key)) };
                }
                tracing::debug!("Hotkeys unregistered");
            })?;

        match ready_rx.recv() {
            Ok(Some((thread_id, registered))) => Ok(HotkeyListener {
                thread_id,
                registered,
                thread: Some(thread),
            }),
            _ => {
                let _ = thread.join();
                Err(HotkeyError::NoneRegistered())
            }
        }
    }

    /// Function key numbers the OS handed to this listener.
    pub fn registered_keys(&self) -> &[u8] {
        &self.registered
    }
}

impl Drop for HotkeyListener {
    fn drop(&mut self) {
        unsafe {
            let _ = PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
        }
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}
