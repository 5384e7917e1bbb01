//! RTP/RTCP port pair allocation.
//!
//! RTP must arrive on an even port and RTCP on the odd port right after
//! it. Allocation starts at a random even port so that several clients
//! starting on one host at the same time do not race for the same pair.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use socket2::{Domain, Protocol, Socket, Type};

use crate::error::{Error, Result};

pub const PORT_RANGE_START: u16 = 9000;
/// Highest RTP port that still leaves room for its RTCP port.
pub const MAX_RTP_PORT: u16 = 65534;

const RECEIVE_BUFFER_SIZE: usize = 2 * 1024 * 1024;

#[derive(Debug)]
pub struct PortPair<S = UdpSocket> {
    pub rtp: S,
    pub rtcp: S,
    pub rtp_port: u16,
}

impl<S> PortPair<S> {
    pub fn rtcp_port(&self) -> u16 {
        self.rtp_port + 1
    }
}

/// Whether `rtp_port` is even and `rtcp_port` directly follows it.
pub fn is_rtp_rtcp_pair(rtp_port: u16, rtcp_port: u16) -> bool {
    rtp_port % 2 == 0 && rtp_port.checked_add(1) == Some(rtcp_port)
}

pub fn random_start_port() -> u16 {
    PORT_RANGE_START + 2 * u16::from(rand::random::<u8>())
}

/// Binds a free even/odd pair on all local IPv4 addresses.
pub fn allocate() -> Result<PortPair> {
    allocate_from(random_start_port(), bind_unicast)
}

/// Walks even ports upwards from `start` until `bind` succeeds for both
/// the port and the one after it. A port whose partner is taken is
/// released again before moving on.
pub fn allocate_from<S, F>(start: u16, mut bind: F) -> Result<PortPair<S>>
where
    F: FnMut(u16) -> io::Result<S>,
{
    let mut rtp_port = start & !1;
    while rtp_port <= MAX_RTP_PORT {
        match bind(rtp_port) {
            Ok(rtp) => match bind(rtp_port + 1) {
                Ok(rtcp) => {
                    tracing::debug!(rtp_port, rtcp_port = rtp_port + 1, "allocated port pair");
                    return Ok(PortPair {
                        rtp,
                        rtcp,
                        rtp_port,
                    });
                }
                Err(error) => {
                    tracing::trace!(port = rtp_port + 1, %error, "rtcp port unavailable");
                    drop(rtp);
                }
            },
            Err(error) => {
                tracing::trace!(port = rtp_port, %error, "rtp port unavailable");
            }
        }

        match rtp_port.checked_add(2) {
            Some(next) => rtp_port = next,
            None => break,
        }
    }

    tracing::error!(start, "no free port pair");
    Err(Error::PortsExhausted)
}

/// Binds exactly the given pair, for servers that substitute the client
/// ports we asked for. `rtp_port` is recorded as announced, even when the
/// two do not form an even/odd pair.
pub fn bind_pair(rtp_port: u16, rtcp_port: u16) -> Result<PortPair> {
    let bind = |port| bind_unicast(port).map_err(|error| Error::Bind { port, error });
    Ok(PortPair {
        rtp: bind(rtp_port)?,
        rtcp: bind(rtcp_port)?,
        rtp_port,
    })
}

/// Binds the server-announced multicast pair and joins `group` on both.
pub fn bind_multicast_pair(group: IpAddr, rtp_port: u16, rtcp_port: u16) -> Result<PortPair> {
    let bind = |port| bind_multicast(group, port).map_err(|error| Error::Bind { port, error });
    Ok(PortPair {
        rtp: bind(rtp_port)?,
        rtcp: bind(rtcp_port)?,
        rtp_port,
    })
}

pub fn bind_unicast(port: u16) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    enlarge_receive_buffer(&socket);
    let addr = SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), port);
    socket.bind(&addr.into())?;
    Ok(socket.into())
}

fn bind_multicast(group: IpAddr, port: u16) -> io::Result<UdpSocket> {
    let (domain, unspecified) = match group {
        IpAddr::V4(_) => (Domain::IPV4, IpAddr::from(Ipv4Addr::UNSPECIFIED)),
        IpAddr::V6(_) => (Domain::IPV6, IpAddr::from(Ipv6Addr::UNSPECIFIED)),
    };
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    // Other receivers on this host may be tuned to the same group.
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    if let Err(error) = socket.set_reuse_port(true) {
        tracing::debug!(%error, "could not enable port reuse");
    }
    enlarge_receive_buffer(&socket);
    socket.bind(&SocketAddr::new(unspecified, port).into())?;

    match group {
        IpAddr::V4(group) => socket.join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)?,
        IpAddr::V6(group) => socket.join_multicast_v6(&group, 0)?,
    }
    tracing::debug!(%group, port, "joined multicast group");

    Ok(socket.into())
}

fn enlarge_receive_buffer(socket: &Socket) {
    if let Err(error) = socket.set_recv_buffer_size(RECEIVE_BUFFER_SIZE) {
        tracing::debug!(%error, "could not enlarge receive buffer");
    }
}
