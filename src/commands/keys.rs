// Key-space and connection commands

use super::reply::Reply;
use crate::storage::{SetStore, Value};
use bytes::Bytes;

/// PING [message]
pub fn ping(args: &[Bytes]) -> Reply {
    match args {
        [] => Reply::SimpleString("PONG".to_string()),
        [message] => Reply::bulk(message.clone()),
        _ => Reply::wrong_arity("ping"),
    }
}

/// DEL key [key ...]
pub fn del(store: &SetStore, args: &[Bytes]) -> Reply {
    if args.is_empty() {
        return Reply::wrong_arity("del");
    }
    Reply::Integer(store.del(args) as i64)
}

/// EXISTS key [key ...]
pub fn exists(store: &SetStore, args: &[Bytes]) -> Reply {
    if args.is_empty() {
        return Reply::wrong_arity("exists");
    }
    let count = args.iter().filter(|key| store.exists(key)).count();
    Reply::Integer(count as i64)
}

/// TYPE key
pub fn key_type(store: &SetStore, args: &[Bytes]) -> Reply {
    if args.len() != 1 {
        return Reply::wrong_arity("type");
    }
    let name = store.key_type(&args[0]).unwrap_or("none");
    Reply::SimpleString(name.to_string())
}

/// DBSIZE
pub fn dbsize(store: &SetStore, args: &[Bytes]) -> Reply {
    if !args.is_empty() {
        return Reply::wrong_arity("dbsize");
    }
    Reply::Integer(store.len() as i64)
}

/// FLUSHALL
pub fn flushall(store: &SetStore, args: &[Bytes]) -> Reply {
    if !args.is_empty() {
        return Reply::wrong_arity("flushall");
    }
    store.flush();
    Reply::ok()
}

/// SET key value
///
/// Only the plain form; it exists so a key can hold a non-set value.
pub fn set(store: &SetStore, args: &[Bytes]) -> Reply {
    if args.len() != 2 {
        return Reply::wrong_arity("set");
    }
    store.put(&args[0], Value::String(args[1].clone()));
    Reply::ok()
}

/// GET key
pub fn get(store: &SetStore, args: &[Bytes]) -> Reply {
    if args.len() != 1 {
        return Reply::wrong_arity("get");
    }
    match store.get_value(&args[0]) {
        Some(Value::String(s)) => Reply::bulk(s),
        Some(_) => Reply::Error(
            "WRONGTYPE Operation against a key holding the wrong kind of value".to_string(),
        ),
        None => Reply::nil(),
    }
}
