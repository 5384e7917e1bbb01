use std::convert;
use std::error;
use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// An error occurred decoding the head due to incorrect usage of text
    /// encoding by the sender.
    Encoding,
    /// The response status line does have a version, but does not have a
    /// status code.
    StatusCodeMissing { line: String },
    /// The method is not one a SAT>IP client speaks.
    MethodUnknown { method: String },
    /// The version specifier should start with "RTSP/" followed by a digit,
    /// "." and another digit.
    VersionMalformed { line: String, version: String },
    /// The status code is not an unsigned integer.
    StatusCodeNotInteger { line: String, status_code: String },
    /// Header line is malformed.
    HeaderMalformed { line: String },
    /// The Content-Length header is not an integer value.
    ContentLengthNotInteger { value: String },
    /// The message head, or the body it announces, grew beyond the limit the
    /// parser was configured with.
    InputTooLarge { limit: usize },
    /// The caller tried to turn the parser into a message before it was
    /// done.
    NotDone,
    /// Metadata was not parsed for some reason.
    MetadataNotParsed,
    /// Serializing a message that does not have a known version.
    VersionUnknown,
    /// The `Session` header has an empty session identifier.
    SessionIdMissing { value: String },
    /// The `timeout` parameter of the `Session` header is not an integer.
    SessionTimeoutInvalid { value: String },
    /// The `com.ses.streamID` header is not an integer.
    StreamIdInvalid { value: String },
    /// The `Content-Base` header is not a valid URI.
    ContentBaseInvalid { value: String },
    /// The transport does not start with the `RTP/AVP` profile.
    TransportProtocolProfileMissing { value: String },
    /// The lower transport is neither TCP nor UDP.
    TransportLowerUnknown { value: String },
    /// A transport parameter could not be split into name and value.
    TransportParameterInvalid { parameter: String },
    /// A transport parameter that requires a value has none.
    TransportParameterValueMissing { var: String },
    /// A transport parameter value could not be parsed.
    TransportParameterValueInvalid { var: String, val: String },
    /// A port or port range is malformed.
    TransportPortMalformed { value: String },
    /// I/O error occurred.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Encoding => write!(f, "encoding incorrect"),
            Error::StatusCodeMissing { line } => {
                write!(f, "status code missing in response line: {line}")
            }
            Error::MethodUnknown { method } => write!(f, "method unknown: {method}"),
            Error::VersionMalformed { line, version } => {
                write!(f, "version malformed: {version} (in line: {line})")
            }
            Error::StatusCodeNotInteger { line, status_code } => write!(
                f,
                "response has invalid status code: {status_code} (in response line: {line})"
            ),
            Error::HeaderMalformed { line } => write!(f, "header line malformed: {line}"),
            Error::ContentLengthNotInteger { value } => {
                write!(f, "invalid value for Content-Length: {value}")
            }
            Error::InputTooLarge { limit } => {
                write!(f, "message larger than the limit of {limit} bytes")
            }
            Error::NotDone => write!(f, "parser not done yet"),
            Error::MetadataNotParsed => write!(f, "metadata not parsed"),
            Error::VersionUnknown => write!(f, "message has unknown version"),
            Error::SessionIdMissing { value } => {
                write!(f, "session header has no identifier: {value}")
            }
            Error::SessionTimeoutInvalid { value } => {
                write!(f, "session header has invalid timeout: {value}")
            }
            Error::StreamIdInvalid { value } => write!(f, "invalid stream id: {value}"),
            Error::ContentBaseInvalid { value } => write!(f, "invalid content base: {value}"),
            Error::TransportProtocolProfileMissing { value } => {
                write!(f, "transport protocol and profile missing: {value}")
            }
            Error::TransportLowerUnknown { value } => {
                write!(f, "transport lower protocol unknown: {value}")
            }
            Error::TransportParameterInvalid { parameter } => {
                write!(f, "transport parameter invalid: {parameter}")
            }
            Error::TransportParameterValueMissing { var } => {
                write!(f, "transport parameter value missing for: {var}")
            }
            Error::TransportParameterValueInvalid { var, val } => {
                write!(f, "transport parameter value invalid: {var}={val}")
            }
            Error::TransportPortMalformed { value } => write!(f, "transport port malformed: {value}"),
            Error::Io(err) => write!(f, "{err}"),
        }
    }
}

impl convert::From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Io(error)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}
