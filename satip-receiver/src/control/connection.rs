use std::io::{self, Read, Write};
use std::mem;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use bytes::BytesMut;

use satip_concurrency::StopRx;
use satip_rtsp_protocol::{CSeq, ParserStatus, Request, Response, ResponseParser, Serialize};

use crate::error::{Error, Result};

/// Bound on a single blocking read or write once the caller can no longer
/// wait indefinitely: after an interrupt, and during keepalive and
/// teardown.
pub const IO_TIMEOUT: Duration = Duration::from_secs(5);

const READ_CHUNK_SIZE: usize = 4096;

/// A response together with whether the caller asked to stop while it was
/// being read.
#[derive(Debug)]
pub struct Reply {
    pub response: Response,
    pub interrupted: bool,
}

/// The RTSP control connection.
///
/// A response that is still incomplete when a read gives up stays in the
/// parser, so the next read picks up where the last one stopped.
/// Responses to earlier requests that arrive late are skipped.
pub struct Connection {
    stream: TcpStream,
    buffer: BytesMut,
    parser: ResponseParser,
    peer: String,
}

impl Connection {
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let peer = format!("{host}:{port}");
        let connect_error = |error| Error::Connect {
            address: peer.clone(),
            error,
        };

        let mut last_error = io::Error::new(io::ErrorKind::NotFound, "host did not resolve");
        for addr in (host, port).to_socket_addrs().map_err(connect_error)? {
            match TcpStream::connect_timeout(&addr, IO_TIMEOUT) {
                Ok(stream) => {
                    stream.set_nodelay(true).map_err(connect_error)?;
                    tracing::debug!(%addr, "control connection established");
                    return Ok(Self {
                        stream,
                        buffer: BytesMut::with_capacity(READ_CHUNK_SIZE),
                        parser: ResponseParser::new(),
                        peer: peer.clone(),
                    });
                }
                Err(error) => {
                    tracing::debug!(%addr, %error, "connect attempt failed");
                    last_error = error;
                }
            }
        }

        Err(connect_error(last_error))
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn send(&mut self, request: Request) -> Result<()> {
        tracing::trace!(%request, "sending request");
        let mut dst = BytesMut::new();
        request.serialize(&mut dst)?;
        self.stream.set_write_timeout(Some(IO_TIMEOUT))?;
        self.stream.write_all(&dst)?;
        Ok(())
    }

    /// Reads the response to request `cseq` without ever blocking longer
    /// than `slice` while `stop` has not fired. Gives up with
    /// [`Error::Timeout`] when nothing complete arrived within `timeout`.
    /// Once `stop` fires, the read carries on with [`IO_TIMEOUT`] per read
    /// instead of giving up, and the returned [`Reply`] is flagged as
    /// interrupted.
    pub fn read_response_interruptible(
        &mut self,
        cseq: CSeq,
        stop: &mut StopRx,
        slice: Duration,
        timeout: Duration,
    ) -> Result<Reply> {
        let deadline = Instant::now() + timeout;
        let mut interrupted = false;

        loop {
            while !self.parse()? {
                match self.probe() {
                    Ok(()) => continue,
                    Err(Error::Timeout) => {}
                    Err(error) => return Err(error),
                }

                if !interrupted && stop.should() {
                    tracing::warn!(peer = %self.peer, "interrupted while waiting for response");
                    interrupted = true;
                }

                let read_timeout = if interrupted { IO_TIMEOUT } else { slice };
                self.stream.set_read_timeout(Some(read_timeout))?;
                match self.fill() {
                    Ok(()) => {}
                    Err(Error::Timeout) if !interrupted => {
                        if Instant::now() >= deadline {
                            tracing::warn!(peer = %self.peer, ?timeout, "server did not answer");
                            return Err(Error::Timeout);
                        }
                    }
                    Err(error) => return Err(error),
                }
            }

            let response = self.take_response()?;
            if !self.is_stale(&response, cseq) {
                tracing::trace!(%response, interrupted, "received response");
                return Ok(Reply {
                    response,
                    interrupted,
                });
            }
        }
    }

    /// Reads the response to request `cseq`, allowing each read up to
    /// `timeout`.
    pub fn read_response_timeout(&mut self, cseq: CSeq, timeout: Duration) -> Result<Response> {
        self.stream.set_read_timeout(Some(timeout))?;
        loop {
            while !self.parse()? {
                self.fill()?;
            }

            let response = self.take_response()?;
            if !self.is_stale(&response, cseq) {
                tracing::trace!(%response, "received response");
                return Ok(response);
            }
        }
    }

    /// Discards buffered bytes and whatever the server has sent that was
    /// not consumed yet. Returns how many bytes were thrown away.
    pub fn drain(&mut self) -> Result<usize> {
        let mut drained = self.buffer.len();
        self.buffer.clear();
        self.parser = ResponseParser::new();

        self.stream.set_nonblocking(true)?;
        let mut chunk = [0_u8; READ_CHUNK_SIZE];
        let outcome = loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => break Ok(()),
                Ok(n) => drained += n,
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => break Ok(()),
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => break Err(error),
            }
        };
        self.stream.set_nonblocking(false)?;
        outcome?;

        if drained > 0 {
            tracing::debug!(drained, "discarded trailing control bytes");
        }
        Ok(drained)
    }

    /// Shuts the connection down in both directions. The socket itself is
    /// closed when the connection is dropped.
    pub fn shutdown(&self) -> Result<()> {
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    /// Feeds buffered bytes to the parser. `true` once a response is
    /// complete. A malformed response leaves no telling where the next one
    /// starts, so everything buffered is dropped with it.
    fn parse(&mut self) -> Result<bool> {
        match self.parser.parse(&mut self.buffer) {
            Ok(status) => Ok(status == ParserStatus::Done),
            Err(error) => {
                self.parser = ResponseParser::new();
                self.buffer.clear();
                Err(error.into())
            }
        }
    }

    fn take_response(&mut self) -> Result<Response> {
        Ok(mem::take(&mut self.parser).into_message()?)
    }

    /// A response carrying an earlier `CSeq` belongs to a request whose
    /// read already gave up.
    fn is_stale(&self, response: &Response, cseq: CSeq) -> bool {
        match response.cseq() {
            Some(received) if received < cseq => {
                tracing::debug!(peer = %self.peer, received, expected = cseq, "skipping late response");
                true
            }
            _ => false,
        }
    }

    fn probe(&mut self) -> Result<()> {
        self.stream.set_nonblocking(true)?;
        let outcome = self.fill();
        self.stream.set_nonblocking(false)?;
        outcome
    }

    fn fill(&mut self) -> Result<()> {
        let mut chunk = [0_u8; READ_CHUNK_SIZE];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => return Err(Error::ConnectionClosed),
                Ok(n) => {
                    self.buffer.extend_from_slice(&chunk[..n]);
                    return Ok(());
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return Err(error.into()),
            }
        }
    }
}
