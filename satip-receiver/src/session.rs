use std::time::Duration;

use bytes::Bytes;

use satip_concurrency::{stop_channel, QueueConsumer, Service, StopRx, TransferQueue};
use satip_rtsp_protocol::{Port, Transport};

use crate::control::{Controller, Setup, TeardownReport};
use crate::error::{Error, Result};
use crate::options::Options;
use crate::port::{self, PortPair};
use crate::receiver::ReceiverLoop;
use crate::rtp::FrameReader;
use crate::target::Target;

/// A tuned SAT>IP stream.
///
/// Opening sets up and starts the stream on the server, after which the
/// payload can be read as a sequence of buffers. The session is torn down
/// on [`Session::close`] or when dropped.
///
/// # Example
///
/// ```no_run
/// # use satip_receiver::{Options, Session};
/// let mut session = Session::open(
///     "satip://192.168.1.2/?src=1&freq=11494&pol=h&msys=dvbs2&sr=22000&pids=0,17,18",
///     &Options::default(),
/// )?;
/// while let Some(buf) = session.read() {
///     // hand `buf` to a transport stream demuxer
/// #   let _ = buf;
/// }
/// session.close();
/// # Ok::<(), satip_receiver::Error>(())
/// ```
pub struct Session {
    consumer: QueueConsumer<Bytes>,
    service: Option<Service<Controller>>,
    caching: Duration,
}

impl Session {
    pub fn open(url: &str, options: &Options) -> Result<Self> {
        let (_stop_tx, stop_rx) = stop_channel();
        Self::open_interruptible(url, options, stop_rx)
    }

    /// Like [`Session::open`], but gives up the handshake when `stop` fires
    /// while waiting for the SETUP response. Either way, a server that does
    /// not answer SETUP within [`Options::setup_timeout`] fails the open.
    pub fn open_interruptible(url: &str, options: &Options, mut stop: StopRx) -> Result<Self> {
        let target = Target::resolve(url, options.host.as_deref())?;
        tracing::info!(uri = %target.uri, multicast = options.multicast, "opening session");

        let mut controller = Controller::connect(target)?;
        let reader = match establish(&mut controller, options, &mut stop) {
            Ok(reader) => reader,
            Err(error) => {
                tracing::warn!(%error, "failed to open session");
                controller.teardown();
                return Err(error);
            }
        };

        let (producer, consumer) = TransferQueue::new();
        let receiver = ReceiverLoop {
            controller,
            reader,
            producer,
            idle_timeout: options.idle_timeout,
        };
        let service = Service::spawn("satip-receiver", move |stop| receiver.run(stop))?;

        Ok(Self {
            consumer,
            service: Some(service),
            caching: options.caching,
        })
    }

    /// Next payload buffer, in the order received. Blocks until one is
    /// available. `None` marks the end of the stream, after which every
    /// call returns `None`.
    pub fn read(&mut self) -> Option<Bytes> {
        self.consumer.dequeue()
    }

    /// Stops reception and tears the session down on the server.
    pub fn close(mut self) -> TeardownReport {
        self.shutdown()
    }

    pub fn can_seek(&self) -> bool {
        false
    }

    pub fn can_pause(&self) -> bool {
        false
    }

    pub fn seek(&mut self, _position: u64) -> Result<()> {
        Err(Error::Unsupported)
    }

    pub fn pause(&mut self, _paused: bool) -> Result<()> {
        Err(Error::Unsupported)
    }

    /// Delay the consumer should buffer before presenting the stream.
    pub fn pts_delay(&self) -> Duration {
        self.caching
    }

    fn shutdown(&mut self) -> TeardownReport {
        let report = match self.service.take().map(Service::stop_and_join) {
            Some(Some(controller)) => controller.teardown(),
            Some(None) => {
                tracing::error!("receiver thread lost the control connection");
                TeardownReport::default()
            }
            None => TeardownReport::default(),
        };

        let discarded = self.consumer.discard();
        if discarded > 0 {
            tracing::debug!(discarded, "released unread buffers");
        }
        report
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.service.is_some() {
            self.shutdown();
        }
    }
}

/// SETUP and PLAY. Returns a reader on the ports the server will send to.
fn establish(
    controller: &mut Controller,
    options: &Options,
    stop: &mut StopRx,
) -> Result<FrameReader> {
    let pair = if options.multicast {
        let setup = controller.setup(
            &Transport::multicast(),
            stop,
            options.poll_timeout,
            options.setup_timeout,
        )?;
        let setup = check_interrupted(setup)?;
        let transport = setup.transport.ok_or(Error::TransportMissing)?;
        let (group, (rtp_port, rtcp_port)) = match (transport.destination(), transport.port()) {
            (Some(group), Some(port)) => (*group, port.pair()),
            _ => return Err(Error::MulticastDestinationMissing),
        };
        port::bind_multicast_pair(group, rtp_port, rtcp_port)?
    } else {
        let pair = port::allocate()?;
        let transport = Transport::unicast(pair.rtp_port);
        let setup = controller.setup(
            &transport,
            stop,
            options.poll_timeout,
            options.setup_timeout,
        )?;
        let setup = check_interrupted(setup)?;
        confirm_client_ports(pair, setup.transport.as_ref())?
    };

    controller.play()?;
    Ok(FrameReader::new(pair, options.batch, options.poll_timeout)?)
}

fn check_interrupted(setup: Setup) -> Result<Setup> {
    if setup.interrupted {
        Err(Error::Interrupted)
    } else {
        Ok(setup)
    }
}

/// Servers may answer with other client ports than the ones requested.
/// The stream goes where the server says, so that pair is bound instead.
fn confirm_client_ports(pair: PortPair, transport: Option<&Transport>) -> Result<PortPair> {
    match transport.and_then(Transport::client_port).map(Port::pair) {
        Some((rtp_port, rtcp_port)) if rtp_port != pair.rtp_port => {
            tracing::warn!(
                requested = pair.rtp_port,
                rtp_port,
                rtcp_port,
                "server substituted client ports",
            );
            if !port::is_rtp_rtcp_pair(rtp_port, rtcp_port) {
                tracing::warn!(rtp_port, rtcp_port, "substituted ports are not an even/odd pair");
            }
            drop(pair);
            port::bind_pair(rtp_port, rtcp_port)
        }
        _ => Ok(pair),
    }
}

#[cfg(test)]
mod tests {

    use satip_rtsp_protocol::{Parameter, Port, Transport};
    use tracing_test::traced_test;

    use crate::port;

    use super::confirm_client_ports;

    fn client_ports(rtp_port: u16, rtcp_port: u16) -> Transport {
        Transport::new()
            .with_parameter(Parameter::Unicast)
            .with_parameter(Parameter::ClientPort(Port::Range(rtp_port, rtcp_port)))
    }

    #[test]
    fn requested_ports_are_kept() {
        let pair = port::allocate().unwrap();
        let rtp_port = pair.rtp_port;
        let transport = client_ports(rtp_port, rtp_port + 1);
        let pair = confirm_client_ports(pair, Some(&transport)).unwrap();
        assert_eq!(pair.rtp_port, rtp_port);
        assert_eq!(pair.rtp.local_addr().unwrap().port(), rtp_port);
    }

    #[test]
    #[traced_test]
    fn odd_substitute_is_bound_with_warning() {
        let pair = port::allocate().unwrap();
        let free = port::allocate().unwrap().rtp_port;
        // Both ports were just released, but in the wrong order.
        let transport = client_ports(free + 1, free);

        let substituted = confirm_client_ports(pair, Some(&transport)).unwrap();
        assert_eq!(substituted.rtp_port, free + 1);
        assert_eq!(substituted.rtp.local_addr().unwrap().port(), free + 1);
        assert_eq!(substituted.rtcp.local_addr().unwrap().port(), free);
        assert!(logs_contain("substituted ports are not an even/odd pair"));
    }

    #[test]
    #[traced_test]
    fn even_substitute_is_bound_quietly() {
        let pair = port::allocate().unwrap();
        let free = port::allocate().unwrap().rtp_port;
        let transport = client_ports(free, free + 1);

        let substituted = confirm_client_ports(pair, Some(&transport)).unwrap();
        assert_eq!(substituted.rtp.local_addr().unwrap().port(), free);
        assert!(logs_contain("server substituted client ports"));
        assert!(!logs_contain("not an even/odd pair"));
    }
}
