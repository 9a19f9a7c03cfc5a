// Commands module - request/response surface over the set store

pub mod dispatcher;
pub mod keys;
pub mod reply;
pub mod set;

pub use dispatcher::CommandDispatcher;
pub use reply::Reply;

use bytes::Bytes;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LineError {
    #[error("unbalanced quotes in request")]
    UnbalancedQuotes,

    #[error("invalid escape sequence in request")]
    InvalidEscape,
}

/// Split one input line into arguments.
///
/// Arguments are separated by whitespace. A double-quoted argument may
/// contain spaces and the escapes `\"`, `\\`, `\n`, `\t` and `\xHH`.
pub fn split_args(line: &str) -> Result<Vec<Bytes>, LineError> {
    let mut args = Vec::new();
    let mut bytes = line.bytes().peekable();

    loop {
        while bytes.next_if(u8::is_ascii_whitespace).is_some() {}
        let Some(first) = bytes.next() else {
            return Ok(args);
        };

        let mut current = Vec::new();
        if first == b'"' {
            loop {
                match bytes.next() {
                    None => return Err(LineError::UnbalancedQuotes),
                    Some(b'"') => break,
                    Some(b'\\') => current.push(unescape(&mut bytes)?),
                    Some(b) => current.push(b),
                }
            }
            // A closing quote must end the argument.
            if bytes.peek().is_some_and(|b| !b.is_ascii_whitespace()) {
                return Err(LineError::UnbalancedQuotes);
            }
        } else {
            current.push(first);
            while let Some(b) = bytes.next_if(|b| !b.is_ascii_whitespace()) {
                current.push(b);
            }
        }
        args.push(Bytes::from(current));
    }
}

fn unescape(bytes: &mut impl Iterator<Item = u8>) -> Result<u8, LineError> {
    match bytes.next() {
        Some(b'n') => Ok(b'\n'),
        Some(b't') => Ok(b'\t'),
        Some(b'r') => Ok(b'\r'),
        Some(b'x') => {
            let hi = bytes.next().and_then(hex_value);
            let lo = bytes.next().and_then(hex_value);
            match (hi, lo) {
                (Some(hi), Some(lo)) => Ok(hi << 4 | lo),
                _ => Err(LineError::InvalidEscape),
            }
        }
        Some(b) => Ok(b),
        None => Err(LineError::UnbalancedQuotes),
    }
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}
