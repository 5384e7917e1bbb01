use std::io;
use std::net::UdpSocket;
use std::time::Duration;

use bytes::Bytes;

use crate::port::PortPair;

use super::arena::{BatchArena, NonBlocking};
use super::sequence::{SequenceTracker, Verdict};

/// Size of the fixed RTP header. CSRC lists and extensions are never used
/// by SAT>IP servers.
pub const RTP_HEADER_LEN: usize = 12;
/// Datagrams received per poll in batched mode.
pub const BATCH_SIZE: usize = 100;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub received: u64,
    pub accepted: u64,
    pub duplicates: u64,
    pub out_of_order: u64,
    pub runts: u64,
    pub lost: u64,
}

/// Reads RTP datagrams and turns them into payload buffers.
pub struct FrameReader {
    rtp: UdpSocket,
    // RTCP reports are not processed, but the port stays bound for as long
    // as the stream runs so the server's reports reach a socket.
    _rtcp: UdpSocket,
    arena: BatchArena,
    framing: Framing,
}

impl FrameReader {
    pub fn new(pair: PortPair, batch: bool, poll_timeout: Duration) -> io::Result<Self> {
        // A zero read timeout would mean blocking forever.
        let poll_timeout = poll_timeout.max(Duration::from_millis(1));
        pair.rtp.set_read_timeout(Some(poll_timeout))?;

        Ok(Self {
            rtp: pair.rtp,
            _rtcp: pair.rtcp,
            arena: BatchArena::new(if batch { BATCH_SIZE } else { 1 }),
            framing: Framing::default(),
        })
    }

    pub fn stats(&self) -> Stats {
        self.framing.stats
    }

    /// Waits up to the poll timeout for a datagram, then takes whatever
    /// else is already queued up to the batch size. Every non-empty payload
    /// of an accepted datagram is passed to `emit` in order.
    ///
    /// Returns how many datagrams were accepted.
    pub fn poll<F>(&mut self, mut emit: F) -> io::Result<usize>
    where
        F: FnMut(Bytes),
    {
        let Self {
            rtp, arena, framing, ..
        } = self;

        let len = match recv(rtp, arena.prepare(0)) {
            Ok(len) => len,
            Err(error) if is_timeout(&error) => return Ok(0),
            Err(error) => return Err(error),
        };
        let mut accepted = framing.accept(arena.take(0, len), &mut emit);

        if arena.len() > 1 {
            let _non_blocking = NonBlocking::enable(rtp)?;
            for index in 1..arena.len() {
                match recv(rtp, arena.prepare(index)) {
                    Ok(len) => accepted += framing.accept(arena.take(index, len), &mut emit),
                    Err(error) if error.kind() == io::ErrorKind::WouldBlock => break,
                    Err(error) => return Err(error),
                }
            }
        }

        Ok(accepted)
    }

    pub fn log_stats(&self) {
        let Stats {
            received,
            accepted,
            duplicates,
            out_of_order,
            runts,
            lost,
        } = self.framing.stats;
        tracing::info!(
            received,
            accepted,
            duplicates,
            out_of_order,
            runts,
            lost,
            "rtp reception finished",
        );
    }
}

#[derive(Default)]
struct Framing {
    tracker: SequenceTracker,
    stats: Stats,
}

impl Framing {
    /// Returns 1 if the datagram was accepted, 0 if it was dropped.
    fn accept<F>(&mut self, datagram: Bytes, emit: &mut F) -> usize
    where
        F: FnMut(Bytes),
    {
        self.stats.received += 1;
        if datagram.len() < RTP_HEADER_LEN {
            self.stats.runts += 1;
            tracing::debug!(len = datagram.len(), "dropping runt datagram");
            return 0;
        }

        let seq = u16::from_be_bytes([datagram[2], datagram[3]]);
        match self.tracker.track(seq) {
            Verdict::Duplicate => {
                self.stats.duplicates += 1;
                tracing::debug!(seq, "dropping duplicate packet");
                return 0;
            }
            Verdict::OutOfOrder => {
                self.stats.out_of_order += 1;
                tracing::debug!(seq, "dropping out of order packet");
                return 0;
            }
            Verdict::Gap { lost } => {
                self.stats.lost += u64::from(lost);
                tracing::warn!(seq, lost, "rtp sequence gap");
            }
            Verdict::First | Verdict::Next => {}
        }

        self.stats.accepted += 1;
        let payload = datagram.slice(RTP_HEADER_LEN..);
        if !payload.is_empty() {
            emit(payload);
        }
        1
    }
}

fn recv(socket: &UdpSocket, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match socket.recv(buf) {
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            outcome => return outcome,
        }
    }
}

fn is_timeout(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
