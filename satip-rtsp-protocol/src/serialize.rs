use bytes::{BufMut, BytesMut};

use super::{
    error::{Error, Result},
    message::{Headers, Version},
    request::Request,
};

pub trait Serialize {
    fn serialize(self, dst: &mut BytesMut) -> Result<()>;
}

impl Serialize for Request {
    fn serialize(self, dst: &mut BytesMut) -> Result<()> {
        dst.put(self.method.to_string().as_bytes());
        dst.put_u8(b' ');
        dst.put(self.uri.to_string().as_bytes());
        dst.put_u8(b' ');
        self.version.serialize(dst)?;
        dst.put(&b"\r\n"[..]);

        serialize_headers_and_body(self.headers, self.body, dst);
        Ok(())
    }
}

impl Serialize for Version {
    fn serialize(self, dst: &mut BytesMut) -> Result<()> {
        let version = match self {
            Version::V1 => &b"RTSP/1.0"[..],
            Version::V2 => &b"RTSP/2.0"[..],
            Version::Unknown => return Err(Error::VersionUnknown),
        };

        dst.put(version);
        Ok(())
    }
}

fn serialize_headers_and_body(
    headers: Headers,
    body: Option<bytes::Bytes>,
    dst: &mut BytesMut,
) {
    for (var, val) in headers {
        dst.put(format!("{var}: {val}\r\n").as_bytes());
    }

    dst.put(&b"\r\n"[..]);

    if let Some(body) = body {
        dst.put(body);
    }
}

#[cfg(test)]
mod tests {

    use bytes::BytesMut;

    use super::Serialize;
    use crate::{Method, Request, Session, Transport, Uri, Version};

    #[test]
    fn serialize_setup_request() {
        let request = Request::new(
            Method::Setup,
            Uri::from_static("rtsp://10.0.0.1:554/?src=1&freq=11494"),
        )
        .with_cseq(1)
        .with_transport(&Transport::unicast(9002));

        let mut dst = BytesMut::new();
        request.serialize(&mut dst).unwrap();
        assert_eq!(
            &dst[..],
            &b"SETUP rtsp://10.0.0.1:554/?src=1&freq=11494 RTSP/1.0\r\n\
CSeq: 1\r\n\
Transport: RTP/AVP;unicast;client_port=9002-9003\r\n\
\r\n"[..]
        );
    }

    #[test]
    fn serialize_play_request() {
        let request = Request::new(Method::Play, Uri::from_static("rtsp://10.0.0.1/stream=1"))
            .with_cseq(2)
            .with_session(&Session::new("abc123").id);

        let mut dst = BytesMut::new();
        request.serialize(&mut dst).unwrap();
        assert_eq!(
            &dst[..],
            &b"PLAY rtsp://10.0.0.1/stream=1 RTSP/1.0\r\nCSeq: 2\r\nSession: abc123\r\n\r\n"[..]
        );
    }

    #[test]
    fn serialize_unknown_version() {
        let mut request = Request::new(Method::Options, Uri::from_static("rtsp://10.0.0.1/"));
        request.version = Version::Unknown;
        assert!(request.serialize(&mut BytesMut::new()).is_err());
    }
}
