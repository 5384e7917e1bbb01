use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

/// Creates a connected pair of stop signal ends.
pub fn channel() -> (StopTx, StopRx) {
    let (tx, rx) = bounded(1);
    (StopTx { tx }, rx.into())
}

/// Sending end of a stop signal. Dropping it counts as a stop request too.
#[derive(Clone)]
pub struct StopTx {
    tx: Sender<()>,
}

impl StopTx {
    /// Request a stop. Calling this more than once is harmless.
    pub fn stop(&self) {
        let _ = self.tx.try_send(());
    }
}

/// Represents the receiver end of the channel that carries the signal
/// to indicate that the worker should stop.
///
/// # Example
///
/// A `StopRx` object will automatically be passed to a `Service`. The
/// worker usually does some work and periodically checks the `StopRx`:
///
/// ```
/// # use std::thread::sleep;
/// # use std::time::Duration;
/// # use satip_concurrency::Service;
/// let service = Service::spawn("worker", move |mut stop| {
///   while !stop.should() {
///     sleep(Duration::from_millis(10));
///   }
/// }).unwrap();
/// service.stop_and_join();
/// ```
pub struct StopRx {
    rx: Receiver<()>,
    flag: bool,
}

impl StopRx {
    /// Check whether or not to stop without blocking. If any previous
    /// call to `should` returned `true`, then any subsequent invocations
    /// will return `true` as well. The same goes for having previously
    /// called `wait`.
    ///
    /// Note: If the sending end was dropped, this function will signal
    /// the caller to stop.
    pub fn should(&mut self) -> bool {
        if self.flag {
            true
        } else {
            match self.rx.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => {
                    self.flag = true;
                    true
                }
                Err(TryRecvError::Empty) => false,
            }
        }
    }

    /// Wait until a stop signal is received. This function is the blocking
    /// equivalent of `should()`.
    pub fn wait(&mut self) {
        if !self.flag {
            let _ = self.rx.recv();
            self.flag = true;
        }
    }

    /// Like `wait`, but gives up after `timeout`. Returns whether a stop
    /// was requested.
    pub fn wait_timeout(&mut self, timeout: Duration) -> bool {
        if !self.flag {
            match self.rx.recv_timeout(timeout) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => self.flag = true,
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
        self.flag
    }
}

impl From<Receiver<()>> for StopRx {
    /// Allows for easy conversion from `Receiver<()>` to `StopRx`.
    fn from(receiver: Receiver<()>) -> Self {
        StopRx {
            rx: receiver,
            flag: false,
        }
    }
}

#[cfg(test)]
mod tests {

    use std::time::Duration;

    use super::channel;

    #[test]
    fn should_is_sticky() {
        let (tx, mut rx) = channel();
        assert!(!rx.should());
        tx.stop();
        tx.stop();
        assert!(rx.should());
        assert!(rx.should());
    }

    #[test]
    fn dropped_sender_means_stop() {
        let (tx, mut rx) = channel();
        drop(tx);
        assert!(rx.should());
    }

    #[test]
    fn wait_timeout_expires() {
        let (_tx, mut rx) = channel();
        assert!(!rx.wait_timeout(Duration::from_millis(10)));
    }
}
