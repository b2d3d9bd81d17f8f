//! Execution loop
//!
//! Runs a core's step function back to back on a dedicated worker thread.
//! `stop` joins the worker, so once it returns no step is in flight.

use rh_core::{HostError, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Name of the worker thread
pub const WORKER_NAME: &str = "core-run";

/// Execution loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

/// Worker thread driving a core's run step
pub struct ExecutionLoop {
    running: Arc<AtomicBool>,
    steps: Arc<AtomicU64>,
    worker: Option<JoinHandle<()>>,
}

impl ExecutionLoop {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            steps: Arc::new(AtomicU64::new(0)),
            worker: None,
        }
    }

    /// Start calling `step` in a loop; a no-op when already running
    pub fn start<F>(&mut self, mut step: F) -> Result<()>
    where
        F: FnMut() + Send + 'static,
    {
        if self.worker.is_some() {
            return Ok(());
        }

        tracing::info!("Starting execution loop");
        self.running.store(true, Ordering::Release);

        let running = Arc::clone(&self.running);
        let steps = Arc::clone(&self.steps);
        let worker = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || {
                while running.load(Ordering::Acquire) {
                    step();
                    steps.fetch_add(1, Ordering::Relaxed);
                }
            })
            .map_err(|e| {
                self.running.store(false, Ordering::Release);
                tracing::error!("Failed to spawn {} thread: {}", WORKER_NAME, e);
                HostError::Thread(e)
            })?;

        self.worker = Some(worker);
        Ok(())
    }

    /// Clear the running flag and wait for the worker to exit
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        let Some(worker) = self.worker.take() else {
            return;
        };

        if worker.join().is_err() {
            tracing::error!("Execution loop worker panicked");
        }
        tracing::info!(
            "Execution loop stopped after {} steps",
            self.steps.load(Ordering::Relaxed)
        );
    }

    pub fn state(&self) -> LoopState {
        if self.is_running() {
            LoopState::Running
        } else {
            LoopState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Run steps completed since the last reset
    pub fn steps(&self) -> u64 {
        self.steps.load(Ordering::Relaxed)
    }

    pub fn reset_steps(&self) {
        self.steps.store(0, Ordering::Relaxed);
    }
}

impl Default for ExecutionLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ExecutionLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_for_steps(exec: &ExecutionLoop, n: u64) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while exec.steps() < n {
            assert!(Instant::now() < deadline, "worker made no progress");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_state_transitions() {
        let mut exec = ExecutionLoop::new();
        assert_eq!(exec.state(), LoopState::Stopped);

        exec.start(|| thread::sleep(Duration::from_micros(100))).unwrap();
        assert_eq!(exec.state(), LoopState::Running);
        wait_for_steps(&exec, 3);

        exec.stop();
        assert_eq!(exec.state(), LoopState::Stopped);
    }

    #[test]
    fn test_stop_joins_worker() {
        let in_step = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&in_step);

        let mut exec = ExecutionLoop::new();
        exec.start(move || {
            flag.store(true, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(2));
            flag.store(false, Ordering::SeqCst);
        })
        .unwrap();
        wait_for_steps(&exec, 1);

        exec.stop();
        assert!(!in_step.load(Ordering::SeqCst));
        let after = exec.steps();
        thread::sleep(Duration::from_millis(10));
        assert_eq!(exec.steps(), after);
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let mut exec = ExecutionLoop::new();
        exec.stop();
        exec.stop();

        let second_ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&second_ran);
        exec.start(|| thread::sleep(Duration::from_micros(50))).unwrap();
        exec.start(move || flag.store(true, Ordering::SeqCst)).unwrap();
        wait_for_steps(&exec, 2);

        exec.stop();
        exec.stop();
        assert!(!second_ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_worker_is_named() {
        let name = Arc::new(parking_lot::Mutex::new(None));
        let seen = Arc::clone(&name);

        let mut exec = ExecutionLoop::new();
        exec.start(move || {
            *seen.lock() = thread::current().name().map(str::to_string);
        })
        .unwrap();
        wait_for_steps(&exec, 1);
        exec.stop();

        assert_eq!(name.lock().as_deref(), Some(WORKER_NAME));
    }
}
