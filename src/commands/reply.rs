// Command replies

use crate::storage::StoreError;
use bytes::Bytes;
use std::fmt;

/// The result of one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Status reply, e.g. OK or PONG
    SimpleString(String),
    Error(String),
    Integer(i64),
    /// None is the nil reply
    BulkString(Option<Bytes>),
    Array(Vec<Reply>),
}

impl Reply {
    pub fn ok() -> Self {
        Reply::SimpleString("OK".to_string())
    }

    pub fn nil() -> Self {
        Reply::BulkString(None)
    }

    pub fn bulk(value: Bytes) -> Self {
        Reply::BulkString(Some(value))
    }

    pub fn bulks(values: impl IntoIterator<Item = Bytes>) -> Self {
        Reply::Array(values.into_iter().map(Reply::bulk).collect())
    }

    pub fn bool(value: bool) -> Self {
        Reply::Integer(value as i64)
    }

    pub fn wrong_arity(command: &str) -> Self {
        Reply::Error(format!(
            "ERR wrong number of arguments for '{}' command",
            command
        ))
    }

    pub fn as_bulk_string(&self) -> Option<&[u8]> {
        match self {
            Reply::BulkString(Some(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Reply]> {
        match self {
            Reply::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::BulkString(None))
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        match self {
            Reply::SimpleString(s) => write!(f, "{}", s),
            Reply::Error(e) => write!(f, "(error) {}", e),
            Reply::Integer(i) => write!(f, "(integer) {}", i),
            Reply::BulkString(None) => write!(f, "(nil)"),
            Reply::BulkString(Some(b)) => write!(f, "\"{}\"", b.escape_ascii()),
            Reply::Array(items) if items.is_empty() => write!(f, "(empty array)"),
            Reply::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, "\n{:width$}", "", width = depth * 3)?;
                    }
                    write!(f, "{}) ", i + 1)?;
                    item.write_indented(f, depth + 1)?;
                }
                Ok(())
            }
        }
    }
}

/// Renders the way redis-cli prints replies.
impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

impl From<StoreError> for Reply {
    fn from(err: StoreError) -> Self {
        Reply::Error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Reply::ok().to_string(), "OK");
        assert_eq!(Reply::Integer(3).to_string(), "(integer) 3");
        assert_eq!(Reply::nil().to_string(), "(nil)");
        assert_eq!(Reply::bulk(Bytes::from("a b")).to_string(), "\"a b\"");
        assert_eq!(Reply::Array(vec![]).to_string(), "(empty array)");
        assert_eq!(
            Reply::bulks([Bytes::from("a"), Bytes::from("b")]).to_string(),
            "1) \"a\"\n2) \"b\""
        );
    }

    #[test]
    fn test_display_escapes_binary() {
        assert_eq!(
            Reply::bulk(Bytes::from_static(b"\x00\"")).to_string(),
            "\"\\x00\\\"\""
        );
    }

    #[test]
    fn test_from_store_error() {
        let reply: Reply = StoreError::WrongType.into();
        assert!(reply.is_error());
        assert_eq!(
            reply.to_string(),
            "(error) WRONGTYPE Operation against a key holding the wrong kind of value"
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Reply::bool(true), Reply::Integer(1));
        assert_eq!(Reply::bulk(Bytes::from("x")).as_bulk_string(), Some(&b"x"[..]));
        assert!(Reply::nil().is_nil());
        assert_eq!(Reply::bulks([Bytes::from("x")]).as_array().map(|a| a.len()), Some(1));
    }
}
