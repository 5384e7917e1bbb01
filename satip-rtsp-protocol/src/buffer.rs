use bytes::{Buf, BytesMut};

use super::error::{Error, Result};

const LN: u8 = b'\x0a';
const CR: u8 = b'\x0d';

/// Splits the next line off the front of `buffer`.
///
/// Catches CR, LF and CRLF. Returns `None` if no complete line is
/// buffered yet, in which case `buffer` is left untouched.
pub(crate) fn take_line(buffer: &mut BytesMut) -> Option<Result<String>> {
    let end = buffer.iter().position(|b| *b == CR || *b == LN)?;
    let skip = if buffer[end] == CR {
        match buffer.get(end + 1) {
            Some(&LN) => 2,
            Some(_) => 1,
            // A CR at the very end might still be followed by LF in the
            // next read, so we cannot decide yet.
            None => return None,
        }
    } else {
        1
    };

    let line = buffer.split_to(end);
    buffer.advance(skip);
    Some(String::from_utf8(line.to_vec()).map_err(|_| Error::Encoding))
}
