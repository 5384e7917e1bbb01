use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use super::{Error, Method};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transport {
    lower: Option<Lower>,
    parameters: Vec<Parameter>,
}

impl Transport {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lower: None,
            parameters: Vec::new(),
        }
    }

    /// `RTP/AVP;multicast`, asking the server to pick group and ports.
    #[must_use]
    pub fn multicast() -> Self {
        Self::new().with_parameter(Parameter::Multicast)
    }

    /// `RTP/AVP;unicast;client_port=<rtp>-<rtp+1>`.
    #[must_use]
    pub fn unicast(rtp_port: u16) -> Self {
        Self::new()
            .with_parameter(Parameter::Unicast)
            .with_parameter(Parameter::ClientPort(Port::Range(
                rtp_port,
                rtp_port.saturating_add(1),
            )))
    }

    #[must_use]
    pub const fn with_lower_protocol(mut self, lower: Lower) -> Self {
        self.lower = Some(lower);
        self
    }

    #[must_use]
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    #[must_use]
    pub const fn lower_protocol(&self) -> Option<&Lower> {
        self.lower.as_ref()
    }

    pub fn parameters_iter(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter()
    }

    #[must_use]
    pub fn is_multicast(&self) -> bool {
        self.parameters_iter()
            .any(|parameter| matches!(parameter, Parameter::Multicast))
    }

    #[must_use]
    pub fn destination(&self) -> Option<&IpAddr> {
        self.parameters_iter().find_map(|parameter| {
            if let Parameter::Destination(ip_addr) = parameter {
                Some(ip_addr)
            } else {
                None
            }
        })
    }

    #[must_use]
    pub fn source(&self) -> Option<&IpAddr> {
        self.parameters_iter().find_map(|parameter| {
            if let Parameter::Source(ip_addr) = parameter {
                Some(ip_addr)
            } else {
                None
            }
        })
    }

    #[must_use]
    pub fn port(&self) -> Option<&Port> {
        self.parameters_iter().find_map(|parameter| {
            if let Parameter::Port(port) = parameter {
                Some(port)
            } else {
                None
            }
        })
    }

    #[must_use]
    pub fn client_port(&self) -> Option<&Port> {
        self.parameters_iter().find_map(|parameter| {
            if let Parameter::ClientPort(port) = parameter {
                Some(port)
            } else {
                None
            }
        })
    }

    #[must_use]
    pub fn server_port(&self) -> Option<&Port> {
        self.parameters_iter().find_map(|parameter| {
            if let Parameter::ServerPort(port) = parameter {
                Some(port)
            } else {
                None
            }
        })
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RTP/AVP")?;
        if let Some(lower) = self.lower.as_ref() {
            write!(f, "/{lower}")?;
        }
        for parameter in &self.parameters {
            write!(f, ";{parameter}")?;
        }
        Ok(())
    }
}

impl FromStr for Transport {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (spec, params) = s
            .split_once(';')
            .map_or_else(|| (s, None), |(spec, params)| (spec, Some(params)));

        if spec.starts_with("RTP/AVP") {
            let lower = spec.split('/').nth(2).map(str::parse).transpose()?;

            let parameters = params
                .map(|params| {
                    params
                        .split(';')
                        .map(str::trim)
                        .filter(|param| !param.is_empty())
                        .map(str::parse)
                        .collect::<Result<Vec<_>, _>>()
                })
                .transpose()?
                .unwrap_or_default();

            Ok(Self { lower, parameters })
        } else {
            Err(Error::TransportProtocolProfileMissing {
                value: s.to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lower {
    Tcp,
    Udp,
}

impl fmt::Display for Lower {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "TCP"),
            Self::Udp => write!(f, "UDP"),
        }
    }
}

impl FromStr for Lower {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TCP" => Ok(Self::Tcp),
            "UDP" => Ok(Self::Udp),
            _ => Err(Error::TransportLowerUnknown {
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parameter {
    Unicast,
    Multicast,
    Destination(IpAddr),
    Source(IpAddr),
    Ttl(usize),
    Port(Port),
    ClientPort(Port),
    ServerPort(Port),
    Ssrc(String),
    Mode(Method),
    /// Parameters servers add that the receiver has no use for.
    Extension(String, Option<String>),
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Unicast => write!(f, "unicast"),
            Self::Multicast => write!(f, "multicast"),
            Self::Destination(host) => write!(f, "destination={host}"),
            Self::Source(host) => write!(f, "source={host}"),
            Self::Ttl(ttl) => write!(f, "ttl={ttl}"),
            Self::Port(port) => write!(f, "port={port}"),
            Self::ClientPort(client_port) => write!(f, "client_port={client_port}"),
            Self::ServerPort(server_port) => write!(f, "server_port={server_port}"),
            Self::Ssrc(ssrc) => write!(f, "ssrc={ssrc}"),
            Self::Mode(method) => write!(f, "mode=\"{method}\""),
            Self::Extension(var, Some(val)) => write!(f, "{var}={val}"),
            Self::Extension(var, None) => write!(f, "{var}"),
        }
    }
}

fn parse_or_err<T: FromStr>(var: &str, value: &str) -> Result<T, Error> {
    value
        .parse::<T>()
        .map_err(|_| Error::TransportParameterValueInvalid {
            var: var.to_string(),
            val: value.to_string(),
        })
}

impl FromStr for Parameter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (var, value) = s
            .split_once('=')
            .map_or((s, None), |(var, value)| (var, Some(value)));
        if var.is_empty() {
            return Err(Error::TransportParameterInvalid {
                parameter: s.to_string(),
            });
        }

        let val_or_err = || {
            value.ok_or_else(|| Error::TransportParameterValueMissing {
                var: var.to_string(),
            })
        };

        match var {
            "unicast" => Ok(Self::Unicast),
            "multicast" => Ok(Self::Multicast),
            "destination" => Ok(Self::Destination(parse_or_err(var, val_or_err()?)?)),
            "source" => Ok(Self::Source(parse_or_err(var, val_or_err()?)?)),
            "ttl" => Ok(Self::Ttl(parse_or_err(var, val_or_err()?)?)),
            "port" => Ok(Self::Port(parse_or_err(var, val_or_err()?)?)),
            "client_port" => Ok(Self::ClientPort(parse_or_err(var, val_or_err()?)?)),
            "server_port" => Ok(Self::ServerPort(parse_or_err(var, val_or_err()?)?)),
            "ssrc" => Ok(Self::Ssrc(val_or_err()?.to_string())),
            "mode" => {
                let value = val_or_err()?;
                let value = value
                    .strip_prefix('"')
                    .unwrap_or(value)
                    .strip_suffix('"')
                    .unwrap_or(value);
                Ok(Self::Mode(parse_or_err(var, value)?))
            }
            _ => Ok(Self::Extension(
                var.to_string(),
                value.map(ToString::to_string),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Port {
    Single(u16),
    Range(u16, u16),
}

impl Port {
    /// RTP and RTCP port. A single port implies RTCP on the next one.
    #[must_use]
    pub fn pair(&self) -> (u16, u16) {
        match *self {
            Self::Single(rtp_port) => (rtp_port, rtp_port.saturating_add(1)),
            Self::Range(rtp_port, rtcp_port) => (rtp_port, rtcp_port),
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Single(port) => write!(f, "{port}"),
            Self::Range(port_1, port_2) => write!(f, "{port_1}-{port_2}"),
        }
    }
}

impl FromStr for Port {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('-');
        let port_1 = parts
            .next()
            .and_then(|port| port.trim().parse::<u16>().ok())
            .ok_or_else(|| Error::TransportPortMalformed {
                value: s.to_string(),
            })?;
        let port_2 = parts.next().map(|port| {
            port.trim()
                .parse::<u16>()
                .map_err(|_| Error::TransportPortMalformed {
                    value: s.to_string(),
                })
        });

        Ok(if let Some(port_2) = port_2 {
            Self::Range(port_1, port_2?)
        } else {
            Self::Single(port_1)
        })
    }
}
