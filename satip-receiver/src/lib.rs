//! SAT>IP receiver.
//!
//! Tunes a SAT>IP server over RTSP and receives the resulting transport
//! stream over RTP/UDP. [`Session`] is the entry point: it performs the
//! handshake, runs reception on a background thread, and hands out the
//! payload as a sequence of [`Bytes`] buffers.

pub mod control;
pub mod error;
pub mod options;
pub mod port;
pub mod rtp;
pub mod target;

mod receiver;
mod session;

pub use bytes::Bytes;
pub use satip_concurrency::{stop_channel, StopRx, StopTx};

pub use control::{TeardownReport, TeardownStep};
pub use error::{Error, ErrorKind, Result};
pub use options::Options;
pub use session::Session;
