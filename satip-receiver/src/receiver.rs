use std::time::{Duration, Instant};

use bytes::Bytes;

use satip_concurrency::{QueueProducer, StopRx};

use crate::control::{Controller, Schedule};
use crate::rtp::FrameReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Cancelled,
    Idle,
    ConsumerGone,
    ReceiveFailed,
}

/// Background half of a running session. Moves RTP payloads into the
/// transfer queue and keeps the RTSP session alive.
pub(crate) struct ReceiverLoop {
    pub controller: Controller,
    pub reader: FrameReader,
    pub producer: QueueProducer<Bytes>,
    pub idle_timeout: Duration,
}

impl ReceiverLoop {
    /// Runs until cancelled or until no datagram was accepted for the idle
    /// timeout. The queue is always killed on the way out, and the
    /// controller is handed back so the caller can tear the session down.
    pub fn run(mut self, mut stop: StopRx) -> Controller {
        self.controller.set_running();
        let mut keepalive = Schedule::new(self.controller.keepalive_interval(), Instant::now());
        let mut last_accepted = Instant::now();
        tracing::info!(keepalive = ?keepalive.interval(), "receiving stream");

        let exit = loop {
            if stop.should() {
                break Exit::Cancelled;
            }

            let producer = &self.producer;
            let mut consumer_gone = false;
            let polled = self.reader.poll(|payload| {
                if producer.enqueue(payload).is_err() {
                    consumer_gone = true;
                }
            });
            match polled {
                Ok(0) => {}
                Ok(_) => last_accepted = Instant::now(),
                Err(error) => {
                    tracing::error!(%error, "receiving datagrams failed");
                    break Exit::ReceiveFailed;
                }
            }
            if consumer_gone {
                break Exit::ConsumerGone;
            }

            let now = Instant::now();
            if now.duration_since(last_accepted) >= self.idle_timeout {
                tracing::info!(idle = ?self.idle_timeout, "no data received, ending stream");
                break Exit::Idle;
            }
            if keepalive.is_due(now) {
                self.controller.keepalive();
                keepalive.reschedule(Instant::now());
            }
        };

        self.producer.kill();
        self.reader.log_stats();
        tracing::debug!(?exit, "receiver loop finished");
        self.controller
    }
}
