use std::fmt;
use std::str::FromStr;

use super::Error;

/// Value of the `Session` header: `<id>[;timeout=<seconds>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub timeout: Option<u64>,
}

impl Session {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timeout: None,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.id)?;
        if let Some(timeout) = self.timeout {
            write!(f, ";timeout={timeout}")?;
        }
        Ok(())
    }
}

impl FromStr for Session {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(';').map(str::trim);
        let id = parts.next().unwrap_or_default();
        if id.is_empty() {
            return Err(Error::SessionIdMissing {
                value: s.to_string(),
            });
        }

        let mut timeout = None;
        for parameter in parts {
            // Other session parameters are not used by SAT>IP and ignored.
            if let Some(value) = parameter.strip_prefix("timeout=") {
                timeout = Some(value.trim().parse::<u64>().map_err(|_| {
                    Error::SessionTimeoutInvalid {
                        value: value.to_string(),
                    }
                })?);
            }
        }

        Ok(Self {
            id: id.to_string(),
            timeout,
        })
    }
}
