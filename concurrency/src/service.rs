use std::io;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::{Builder, JoinHandle};

use super::stop::{self, StopRx, StopTx};

/// A worker thread that can be asked to stop, and that hands back its
/// result when joined.
pub struct Service<T: Send + 'static = ()> {
    handle: Option<JoinHandle<T>>,
    stop_tx: StopTx,
    is_running: Arc<AtomicBool>,
}

impl<T: Send + 'static> Service<T> {
    pub fn spawn<F>(name: &str, f: F) -> io::Result<Self>
    where
        F: FnOnce(StopRx) -> T,
        F: Send + 'static,
    {
        let is_running = Arc::new(AtomicBool::new(true));
        let (stop_tx, stop_rx) = stop::channel();
        let handle = Builder::new().name(name.to_string()).spawn({
            let is_running = is_running.clone();
            move || {
                let output = f(stop_rx);
                is_running.store(false, Ordering::Release);
                output
            }
        })?;

        Ok(Self {
            handle: Some(handle),
            stop_tx,
            is_running,
        })
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    /// Signal the worker to stop, wait for it, and return what it
    /// produced. Returns `None` if the worker panicked.
    pub fn stop_and_join(mut self) -> Option<T> {
        self.stop_tx.stop();
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(output) => Some(output),
            Err(_) => {
                tracing::error!("service thread panicked");
                None
            }
        }
    }
}

impl<T: Send + 'static> Drop for Service<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.stop_tx.stop();
            let _ = handle.join();
        }
    }
}
