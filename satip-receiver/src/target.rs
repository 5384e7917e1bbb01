//! Stream URL normalisation and control URL derivation.

use satip_rtsp_protocol::Uri;

use crate::error::{Error, Result};

pub const RTSP_DEFAULT_PORT: u16 = 554;

/// Placeholder host used by playlists generated before the server address
/// was known.
const PLACEHOLDER_HOST: &str = "sat.ip";

/// Where to send SETUP, and where to connect the control connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub uri: Uri,
    pub host: String,
    pub port: u16,
}

impl Target {
    /// Accepts `satip://` and `rtsp://` URLs. The path and query carry the
    /// tuning parameters and are kept verbatim.
    pub fn resolve(url: &str, host_override: Option<&str>) -> Result<Self> {
        let invalid = || Error::UrlInvalid {
            url: url.to_string(),
        };

        let uri = url.trim().parse::<Uri>().map_err(|_| invalid())?;
        match uri.scheme_str() {
            Some("rtsp") | Some("satip") => {}
            _ => return Err(invalid()),
        }

        let mut host = uri
            .host()
            .ok_or_else(invalid)?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        if host == PLACEHOLDER_HOST {
            if let Some(host_override) = host_override {
                tracing::debug!(%host_override, "substituting placeholder host");
                host = host_override.to_string();
            }
        }
        let port = uri.port_u16().unwrap_or(RTSP_DEFAULT_PORT);

        let path_and_query = uri
            .path_and_query()
            .map(|path_and_query| path_and_query.as_str())
            .filter(|path_and_query| !path_and_query.is_empty())
            .unwrap_or("/");

        let uri = format!("rtsp://{}:{port}{path_and_query}", host_for_uri(&host))
            .parse::<Uri>()
            .map_err(|_| invalid())?;

        Ok(Self { uri, host, port })
    }

    /// Address for the TCP control connection.
    pub fn address(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }

    /// Base used when the server does not announce a `Content-Base`.
    pub fn default_base(&self) -> String {
        format!("rtsp://{}:{}/", host_for_uri(&self.host), self.port)
    }
}

/// `<base>/stream=<id>`, or the base itself when the server did not give
/// a stream id.
pub fn control_uri(content_base: &str, stream_id: Option<u32>) -> Result<Uri> {
    let mut control = content_base.trim().to_string();
    if !control.ends_with('/') {
        control.push('/');
    }
    if let Some(stream_id) = stream_id {
        control.push_str(&format!("stream={stream_id}"));
    }

    control
        .parse::<Uri>()
        .map_err(|_| Error::UrlInvalid { url: control })
}

fn host_for_uri(host: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]")
    } else {
        host.to_string()
    }
}

#[cfg(test)]
mod tests {

    use super::{control_uri, Error, Target};

    #[test]
    fn satip_scheme_is_rewritten() {
        let target = Target::resolve("satip://192.168.1.2/?src=1&freq=11494&pol=h", None).unwrap();
        assert_eq!(
            target.uri.to_string(),
            "rtsp://192.168.1.2:554/?src=1&freq=11494&pol=h"
        );
        assert_eq!(target.address(), ("192.168.1.2", 554));
    }

    #[test]
    fn explicit_port_is_kept() {
        let target = Target::resolve("rtsp://192.168.1.2:8554/?freq=634&msys=dvbt", None).unwrap();
        assert_eq!(target.port, 8554);
        assert_eq!(target.default_base(), "rtsp://192.168.1.2:8554/");
    }

    #[test]
    fn placeholder_host_is_replaced() {
        let target = Target::resolve("rtsp://sat.ip/?src=1&freq=12188", Some("10.0.0.7")).unwrap();
        assert_eq!(target.host, "10.0.0.7");
        assert_eq!(target.uri.to_string(), "rtsp://10.0.0.7:554/?src=1&freq=12188");
    }

    #[test]
    fn placeholder_host_without_override() {
        let target = Target::resolve("rtsp://sat.ip/?src=1", None).unwrap();
        assert_eq!(target.host, "sat.ip");
    }

    #[test]
    fn other_hosts_are_not_replaced() {
        let target = Target::resolve("rtsp://192.168.1.2/", Some("10.0.0.7")).unwrap();
        assert_eq!(target.host, "192.168.1.2");
    }

    #[test]
    fn other_schemes_are_rejected() {
        assert!(matches!(
            Target::resolve("http://192.168.1.2/", None),
            Err(Error::UrlInvalid { .. })
        ));
        assert!(matches!(
            Target::resolve("not a url", None),
            Err(Error::UrlInvalid { .. })
        ));
    }

    #[test]
    fn control_uri_from_base() {
        assert_eq!(
            control_uri("rtsp://host/", Some(1)).unwrap().to_string(),
            "rtsp://host/stream=1"
        );
        assert_eq!(
            control_uri("rtsp://10.0.0.1:554", Some(12)).unwrap().to_string(),
            "rtsp://10.0.0.1:554/stream=12"
        );
        assert_eq!(
            control_uri("rtsp://10.0.0.1:554/", None).unwrap().to_string(),
            "rtsp://10.0.0.1:554/"
        );
    }
}
