use bytes::BytesMut;

use super::{
    buffer::take_line,
    error::{Error, Result},
    message::{Bytes, Headers, Message, StatusCode, Version},
    response::{Response, ResponseMetadata},
};

/// Upper bound on the size of a message head, and on the body it may
/// announce through `Content-Length`.
pub const DEFAULT_MAX_SIZE: usize = 64 * 1024;

pub type ResponseParser = Parser<Response>;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Status {
    Hungry,
    Done,
}

/// Incremental parser. Bytes are consumed from the front of the buffer
/// passed to [`Parser::parse`] as far as they belong to the message, so
/// whatever follows the message stays in the buffer.
pub struct Parser<M: Message> {
    state: State,
    metadata: Option<M::Metadata>,
    headers: Headers,
    body: Option<Bytes>,
    head_size: usize,
    max_size: usize,
}

impl<M: Message> Parser<M> {
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_SIZE)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            state: State::Head(Head::FirstLine),
            metadata: None,
            headers: Headers::new(),
            body: None,
            head_size: 0,
            max_size,
        }
    }

    pub fn parse(&mut self, src: &mut BytesMut) -> Result<Status> {
        loop {
            match self.state {
                State::Head(head) => {
                    let before = src.len();
                    match take_line(src) {
                        Some(line) => {
                            self.head_size += before - src.len();
                            self.check_size(self.head_size)?;
                            let line = line?;
                            self.state = self.parse_head_line(head, &line)?;
                        }
                        None => {
                            // The partial line counts towards the limit too,
                            // otherwise a peer that never sends a line end
                            // makes us buffer forever.
                            self.check_size(self.head_size + src.len())?;
                            return Ok(Status::Hungry);
                        }
                    }
                }
                State::Body(need) => {
                    if src.len() < need {
                        return Ok(Status::Hungry);
                    }
                    self.body = Some(src.split_to(need).freeze());
                    self.state = State::Done;
                }
                State::Done => return Ok(Status::Done),
            }
        }
    }

    pub fn into_message(self) -> Result<M> {
        match self.state {
            State::Done => Ok(M::new(
                self.metadata.ok_or(Error::MetadataNotParsed)?,
                self.headers,
                self.body,
            )),
            _ => Err(Error::NotDone),
        }
    }

    fn parse_head_line(&mut self, head: Head, line: &str) -> Result<State> {
        let line = line.trim();
        match head {
            Head::FirstLine => {
                if line.is_empty() {
                    // Tolerate stray line ends left over from a previous
                    // message.
                    return Ok(State::Head(Head::FirstLine));
                }
                self.metadata = Some(M::Metadata::parse(line)?);
                Ok(State::Head(Head::Header))
            }
            Head::Header => {
                if line.is_empty() {
                    // Empty line signals end of head.
                    return match self.content_length()? {
                        Some(0) | None => Ok(State::Done),
                        Some(need) if need > self.max_size => Err(Error::InputTooLarge {
                            limit: self.max_size,
                        }),
                        Some(need) => Ok(State::Body(need)),
                    };
                }
                let (var, val) = parse_header(line)?;
                self.headers.insert(var, val);
                Ok(State::Head(Head::Header))
            }
        }
    }

    fn content_length(&self) -> Result<Option<usize>> {
        self.headers
            .get("Content-Length")
            .map(|content_length| {
                content_length
                    .parse::<usize>()
                    .map_err(|_| Error::ContentLengthNotInteger {
                        value: content_length.clone(),
                    })
            })
            .transpose()
    }

    fn check_size(&self, size: usize) -> Result<()> {
        if size > self.max_size {
            Err(Error::InputTooLarge {
                limit: self.max_size,
            })
        } else {
            Ok(())
        }
    }
}

impl<M: Message> Default for Parser<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum State {
    Head(Head),
    Body(usize),
    Done,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Head {
    FirstLine,
    Header,
}

pub trait Parse: Sized {
    fn parse(line: &str) -> Result<Self>;
}

impl Parse for ResponseMetadata {
    fn parse(line: &str) -> Result<ResponseMetadata> {
        let (version, rest) = line
            .split_once(' ')
            .ok_or_else(|| Error::StatusCodeMissing {
                line: line.to_string(),
            })?;

        let version = parse_version(version.trim(), line)?;

        // Some servers leave out the reason phrase.
        let (status_code, reason) = rest
            .trim_start()
            .split_once(' ')
            .unwrap_or((rest.trim(), ""));

        let status_code = status_code
            .trim()
            .parse::<StatusCode>()
            .map_err(|_| Error::StatusCodeNotInteger {
                line: line.to_string(),
                status_code: status_code.to_string(),
            })?;

        Ok(ResponseMetadata::new(
            version,
            status_code,
            reason.trim().to_string(),
        ))
    }
}

fn parse_version(part: &str, line: &str) -> Result<Version> {
    match part.strip_prefix("RTSP/") {
        Some("1.0") => Ok(Version::V1),
        Some("2.0") => Ok(Version::V2),
        Some(_) => Ok(Version::Unknown),
        None => Err(Error::VersionMalformed {
            line: line.to_string(),
            version: part.to_string(),
        }),
    }
}

fn parse_header(line: &str) -> Result<(String, String)> {
    let (var, val) = line.split_once(':').ok_or_else(|| Error::HeaderMalformed {
        line: line.to_string(),
    })?;

    Ok((var.trim().to_string(), val.trim().to_string()))
}
