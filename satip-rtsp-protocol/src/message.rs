use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::{error::Error, parse::Parse};

pub use bytes::Bytes;
pub use http::uri::Uri;

pub trait Message: Sized {
    type Metadata: Parse;

    fn new(metadata: Self::Metadata, headers: Headers, body: Option<Bytes>) -> Self;
}

pub type Headers = BTreeMap<String, String>;

/// Request sequence number as carried by the `CSeq` header.
pub type CSeq = u32;

/// The RTSP methods a SAT>IP client issues.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Method {
    Setup,
    Play,
    Options,
    Teardown,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Method::Setup => write!(f, "SETUP"),
            Method::Play => write!(f, "PLAY"),
            Method::Options => write!(f, "OPTIONS"),
            Method::Teardown => write!(f, "TEARDOWN"),
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SETUP" => Ok(Method::Setup),
            "PLAY" => Ok(Method::Play),
            "OPTIONS" => Ok(Method::Options),
            "TEARDOWN" => Ok(Method::Teardown),
            _ => Err(Error::MethodUnknown {
                method: s.to_string(),
            }),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum Version {
    #[default]
    V1,
    V2,
    Unknown,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Version::V1 => write!(f, "1.0"),
            Version::V2 => write!(f, "2.0"),
            Version::Unknown => write!(f, "?"),
        }
    }
}

pub type StatusCode = usize;

pub const STATUS_OK: StatusCode = 200;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum StatusCategory {
    Informational,
    Success,
    Redirection,
    ClientError,
    ServerError,
    Unknown,
}

impl From<StatusCode> for StatusCategory {
    fn from(status: StatusCode) -> Self {
        match status {
            s if s >= 600 => StatusCategory::Unknown,
            s if s >= 500 => StatusCategory::ServerError,
            s if s >= 400 => StatusCategory::ClientError,
            s if s >= 300 => StatusCategory::Redirection,
            s if s >= 200 => StatusCategory::Success,
            s if s >= 100 => StatusCategory::Informational,
            _ => StatusCategory::Unknown,
        }
    }
}
