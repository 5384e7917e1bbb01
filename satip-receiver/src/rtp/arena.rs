use std::io;
use std::net::UdpSocket;

use bytes::{Bytes, BytesMut};

/// Large enough for any datagram on an Ethernet link. SAT>IP servers send
/// seven transport stream packets per datagram, 1328 bytes with the RTP
/// header.
pub const SLOT_SIZE: usize = 1500;

/// Receive buffers, one per datagram of a batch.
///
/// A received datagram is split off the front of its slot and handed out
/// without copying. The slot grows back to full size before its next use,
/// reusing its allocation once every handed out datagram is dropped.
pub struct BatchArena {
    slots: Vec<BytesMut>,
}

impl BatchArena {
    pub fn new(len: usize) -> Self {
        let slots = (0..len.max(1))
            .map(|_| BytesMut::zeroed(SLOT_SIZE))
            .collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Full-size receive buffer for slot `index`.
    pub fn prepare(&mut self, index: usize) -> &mut [u8] {
        let slot = &mut self.slots[index];
        if slot.len() < SLOT_SIZE {
            slot.resize(SLOT_SIZE, 0);
        }
        &mut slot[..]
    }

    /// Hands out the first `len` bytes of slot `index`.
    pub fn take(&mut self, index: usize, len: usize) -> Bytes {
        self.slots[index].split_to(len).freeze()
    }
}

/// Switches a socket to non-blocking mode until dropped.
pub struct NonBlocking<'a> {
    socket: &'a UdpSocket,
}

impl<'a> NonBlocking<'a> {
    pub fn enable(socket: &'a UdpSocket) -> io::Result<Self> {
        socket.set_nonblocking(true)?;
        Ok(Self { socket })
    }
}

impl Drop for NonBlocking<'_> {
    fn drop(&mut self) {
        if let Err(error) = self.socket.set_nonblocking(false) {
            tracing::error!(%error, "failed to restore blocking mode");
        }
    }
}
