mod buffer;
mod error;
mod message;
mod parse;
mod request;
mod response;
mod serialize;
mod session;
mod transport;

pub use error::{Error, Result};
pub use message::{
    Bytes, CSeq, Headers, Message, Method, StatusCategory, StatusCode, Uri, Version, STATUS_OK,
};
pub use parse::{Parser, ResponseParser, Status as ParserStatus, DEFAULT_MAX_SIZE};
pub use request::Request;
pub use response::{Response, STREAM_ID_HEADER};
pub use serialize::Serialize;
pub use session::Session;
pub use transport::{Lower, Parameter, Port, Transport};
