use std::fmt;

use super::{
    message::{
        Bytes, CSeq, Headers, Message, StatusCategory, StatusCode, Version, STATUS_OK,
    },
    session::Session,
    transport::Transport,
    Error,
};

/// SAT>IP servers announce the stream they allocated in this header.
pub const STREAM_ID_HEADER: &str = "com.ses.streamID";

#[derive(Clone, Debug)]
pub struct Response {
    pub version: Version,
    pub status: StatusCode,
    pub reason: String,
    pub headers: Headers,
    pub body: Option<Bytes>,
}

impl Message for Response {
    type Metadata = ResponseMetadata;

    fn new(metadata: ResponseMetadata, headers: Headers, body: Option<Bytes>) -> Self {
        Self {
            version: metadata.version,
            status: metadata.status,
            reason: metadata.reason,
            headers,
            body,
        }
    }
}

impl Response {
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    pub fn status(&self) -> StatusCategory {
        StatusCategory::from(self.status)
    }

    pub fn cseq(&self) -> Option<CSeq> {
        self.headers.get("CSeq").and_then(|val| val.trim().parse().ok())
    }

    pub fn content_base(&self) -> Option<&str> {
        self.headers.get("Content-Base").map(String::as_str)
    }

    pub fn session(&self) -> Option<Result<Session, Error>> {
        self.headers.get("Session").map(|value| value.parse())
    }

    pub fn transport(&self) -> Option<Result<Transport, Error>> {
        self.headers.get("Transport").map(|value| value.parse())
    }

    pub fn stream_id(&self) -> Option<Result<u32, Error>> {
        self.headers.get(STREAM_ID_HEADER).map(|value| {
            value
                .trim()
                .parse::<u32>()
                .map_err(|_| Error::StreamIdInvalid {
                    value: value.clone(),
                })
        })
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Version: {}, Status Code: {}, Reason Phrase: {}",
            self.version, self.status, &self.reason
        )?;

        writeln!(f, "Headers:")?;
        for (var, val) in &self.headers {
            writeln!(f, " - {}: {}", &var, &val)?;
        }

        if let Some(body) = &self.body {
            writeln!(f, "[{} bytes]", body.len())?;
        }

        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct ResponseMetadata {
    version: Version,
    status: StatusCode,
    reason: String,
}

impl ResponseMetadata {
    pub(super) fn new(version: Version, status: StatusCode, reason: String) -> Self {
        Self {
            version,
            status,
            reason,
        }
    }
}
