use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Background thread calling `tick` every interval while the running flag is set.
/// The panel uses it to wake up and drain queued hotkey commands.
pub struct Heartbeat {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Heartbeat {
    pub fn spawn<F>(interval: Duration, tick: F) -> std::io::Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let thread = std::thread::Builder::new()
            .name("heartbeat".into())
            .spawn(move || {
                while flag.load(Ordering::Acquire) {
                    std::thread::sleep(interval);
                    if flag.load(Ordering::Acquire) {
                        tick();
                    }
                }
                tracing::debug!("Heartbeat stopped");
            })?;
        Ok(Heartbeat {
            running,
            thread: Some(thread),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Clears the running flag and waits for the thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn ticks_until_stopped() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let mut heartbeat = Heartbeat::spawn(Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        assert!(heartbeat.is_running());

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while count.load(Ordering::SeqCst) < 3 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        heartbeat.stop();
        assert!(!heartbeat.is_running());

        let after_stop = count.load(Ordering::SeqCst);
        assert!(after_stop >= 3);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn drop_joins() {
        let heartbeat = Heartbeat::spawn(Duration::from_millis(1), || {}).unwrap();
        drop(heartbeat);
    }
}
