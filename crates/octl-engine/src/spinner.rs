//! The spinner collaborator (§5): "may be started on stderr after a 200 ms
//! delay around each method call and must be torn down synchronously
//! before the next stream value is produced."

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const START_DELAY: Duration = Duration::from_millis(200);
const FRAME_INTERVAL: Duration = Duration::from_millis(100);
const FRAMES: [char; 4] = ['|', '/', '-', '\\'];

/// Runs `work` while a spinner may appear on stderr after [`START_DELAY`].
/// The spinner thread is joined before this function returns, so teardown
/// is always synchronous with respect to the caller — no spinner frame can
/// be mid-write when the next stream value is produced.
pub fn with_spinner<T>(enabled: bool, label: &str, work: impl FnOnce() -> T) -> T {
    if !enabled {
        return work();
    }

    let stop = Arc::new(AtomicBool::new(false));
    let handle = spawn_spinner(Arc::clone(&stop), label.to_string());
    let result = work();
    stop.store(true, Ordering::SeqCst);
    let _ = handle.join();
    result
}

fn spawn_spinner(stop: Arc<AtomicBool>, label: String) -> JoinHandle<()> {
    thread::spawn(move || {
        thread::sleep(START_DELAY);
        if stop.load(Ordering::SeqCst) {
            return;
        }
        let mut frame = 0usize;
        while !stop.load(Ordering::SeqCst) {
            eprint!("\r{} {label}", FRAMES[frame % FRAMES.len()]);
            let _ = std::io::stderr().flush();
            frame += 1;
            thread::sleep(FRAME_INTERVAL);
        }
        eprint!("\r{}\r", " ".repeat(label.len() + 2));
        let _ = std::io::stderr().flush();
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_spinner_runs_work_synchronously() {
        let result = with_spinner(false, "loading", || 42);
        assert_eq!(result, 42);
    }

    #[test]
    fn fast_work_returns_before_spinner_ever_appears() {
        let result = with_spinner(true, "loading", || 7);
        assert_eq!(result, 7);
    }
}
