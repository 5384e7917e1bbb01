use std::error;
use std::fmt;
use std::io;

use satip_rtsp_protocol as rtsp;

pub type Result<T> = std::result::Result<T, Error>;

/// Broad classes of failure, as seen by the caller of `Session::open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connecting, binding, or the control connection itself failed.
    Connection,
    /// The server said or sent something the receiver cannot work with.
    Protocol,
    /// The operation is not available on a live SAT>IP stream.
    Unsupported,
}

#[derive(Debug)]
pub enum Error {
    /// The stream URL could not be parsed or has no host.
    UrlInvalid { url: String },
    /// Connecting the control connection failed.
    Connect { address: String, error: io::Error },
    /// Binding the multicast port pair failed.
    Bind { port: u16, error: io::Error },
    /// No adjacent even/odd UDP port pair was free.
    PortsExhausted,
    /// The server closed the control connection.
    ConnectionClosed,
    /// The server did not answer in time.
    Timeout,
    /// I/O failure on the control connection.
    Io(io::Error),
    /// The response could not be parsed, or grew beyond the read limit.
    Rtsp(rtsp::Error),
    /// The server answered with something other than 200 OK.
    StatusNotOk {
        method: rtsp::Method,
        status: rtsp::StatusCode,
        reason: String,
    },
    /// The SETUP response carried no `Session` header.
    SessionMissing,
    /// The multicast SETUP response carried no usable `Transport` header.
    TransportMissing,
    /// The multicast `Transport` header lacks a destination or port.
    MulticastDestinationMissing,
    /// A request was issued before SETUP established a session.
    NotSetUp,
    /// The handshake was interrupted by the caller.
    Interrupted,
    /// Seeking and pausing a live stream.
    Unsupported,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UrlInvalid { .. }
            | Error::Connect { .. }
            | Error::Bind { .. }
            | Error::PortsExhausted
            | Error::ConnectionClosed
            | Error::Timeout
            | Error::Io(_) => ErrorKind::Connection,
            Error::Rtsp(rtsp::Error::Io(_)) => ErrorKind::Connection,
            Error::Rtsp(_)
            | Error::StatusNotOk { .. }
            | Error::SessionMissing
            | Error::TransportMissing
            | Error::MulticastDestinationMissing
            | Error::NotSetUp
            | Error::Interrupted => ErrorKind::Protocol,
            Error::Unsupported => ErrorKind::Unsupported,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UrlInvalid { url } => write!(f, "invalid stream url: {url}"),
            Error::Connect { address, error } => {
                write!(f, "failed to connect to {address}: {error}")
            }
            Error::Bind { port, error } => write!(f, "failed to bind udp port {port}: {error}"),
            Error::PortsExhausted => write!(f, "no free rtp/rtcp port pair"),
            Error::ConnectionClosed => write!(f, "control connection closed by server"),
            Error::Timeout => write!(f, "timed out waiting for server"),
            Error::Io(error) => write!(f, "control connection i/o error: {error}"),
            Error::Rtsp(error) => write!(f, "rtsp error: {error}"),
            Error::StatusNotOk {
                method,
                status,
                reason,
            } => write!(f, "{method} failed: {status} {reason}"),
            Error::SessionMissing => write!(f, "server did not provide a session"),
            Error::TransportMissing => write!(f, "server did not provide a transport"),
            Error::MulticastDestinationMissing => {
                write!(f, "multicast transport lacks destination or port")
            }
            Error::NotSetUp => write!(f, "no session set up"),
            Error::Interrupted => write!(f, "handshake interrupted"),
            Error::Unsupported => write!(f, "operation not supported"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Connect { error, .. } | Error::Bind { error, .. } | Error::Io(error) => {
                Some(error)
            }
            Error::Rtsp(error) => Some(error),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Error::Timeout,
            _ => Error::Io(error),
        }
    }
}

impl From<rtsp::Error> for Error {
    fn from(error: rtsp::Error) -> Self {
        match error {
            rtsp::Error::Io(error) => error.into(),
            error => Error::Rtsp(error),
        }
    }
}
