use std::fmt;

use super::{
    message::{Bytes, CSeq, Headers, Method, Uri, Version},
    transport::Transport,
};

#[derive(Clone, Debug)]
pub struct Request {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: Headers,
    pub body: Option<Bytes>,
}

impl Request {
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            version: Version::default(),
            headers: Headers::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_header(mut self, var: impl Into<String>, val: impl ToString) -> Self {
        self.headers.insert(var.into(), val.to_string());
        self
    }

    #[must_use]
    pub fn with_cseq(self, cseq: CSeq) -> Self {
        self.with_header("CSeq", cseq)
    }

    #[must_use]
    pub fn with_session(self, session_id: &str) -> Self {
        self.with_header("Session", session_id)
    }

    #[must_use]
    pub fn with_transport(self, transport: &Transport) -> Self {
        self.with_header("Transport", transport)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Version: {}, Method: {}, Uri: {}",
            self.version, self.method, self.uri
        )?;

        if !self.headers.is_empty() {
            writeln!(f, "\nHeaders:")?;
            for (var, val) in &self.headers {
                writeln!(f, " - {}: {}", &var, &val)?;
            }
        }

        if let Some(body) = &self.body {
            writeln!(f, "[{} bytes]", body.len())?;
        }

        Ok(())
    }
}
