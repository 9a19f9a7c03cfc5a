// Set command handlers

use super::reply::Reply;
use crate::storage::SetStore;
use bytes::Bytes;

fn parse_i64(arg: &[u8]) -> Result<i64, Reply> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| Reply::Error("ERR value is not an integer or out of range".to_string()))
}

fn parse_positive(arg: &[u8]) -> Result<usize, Reply> {
    match parse_i64(arg)? {
        n if n < 0 => Err(Reply::Error(
            "ERR value is out of range, must be positive".to_string(),
        )),
        n => Ok(n as usize),
    }
}

/// SADD key member [member ...]
pub fn sadd(store: &SetStore, args: &[Bytes]) -> Reply {
    if args.len() < 2 {
        return Reply::wrong_arity("sadd");
    }
    match store.sadd(&args[0], args[1..].iter().cloned()) {
        Ok(added) => Reply::Integer(added as i64),
        Err(e) => e.into(),
    }
}

/// SREM key member [member ...]
pub fn srem(store: &SetStore, args: &[Bytes]) -> Reply {
    if args.len() < 2 {
        return Reply::wrong_arity("srem");
    }
    match store.srem(&args[0], &args[1..]) {
        Ok(removed) => Reply::Integer(removed as i64),
        Err(e) => e.into(),
    }
}

/// SCARD key
pub fn scard(store: &SetStore, args: &[Bytes]) -> Reply {
    if args.len() != 1 {
        return Reply::wrong_arity("scard");
    }
    match store.scard(&args[0]) {
        Ok(n) => Reply::Integer(n as i64),
        Err(e) => e.into(),
    }
}

/// SMEMBERS key
pub fn smembers(store: &SetStore, args: &[Bytes]) -> Reply {
    if args.len() != 1 {
        return Reply::wrong_arity("smembers");
    }
    match store.smembers(&args[0]) {
        Ok(members) => Reply::bulks(members),
        Err(e) => e.into(),
    }
}

/// SISMEMBER key member
pub fn sismember(store: &SetStore, args: &[Bytes]) -> Reply {
    if args.len() != 2 {
        return Reply::wrong_arity("sismember");
    }
    match store.sismember(&args[0], &args[1]) {
        Ok(found) => Reply::bool(found),
        Err(e) => e.into(),
    }
}

/// SMISMEMBER key member [member ...]
pub fn smismember(store: &SetStore, args: &[Bytes]) -> Reply {
    if args.len() < 2 {
        return Reply::wrong_arity("smismember");
    }
    match store.smismember(&args[0], &args[1..]) {
        Ok(flags) => Reply::Array(flags.into_iter().map(Reply::bool).collect()),
        Err(e) => e.into(),
    }
}

/// SMOVE source destination member
pub fn smove(store: &SetStore, args: &[Bytes]) -> Reply {
    if args.len() != 3 {
        return Reply::wrong_arity("smove");
    }
    match store.smove(&args[0], &args[1], &args[2]) {
        Ok(moved) => Reply::bool(moved),
        Err(e) => e.into(),
    }
}

/// SPOP key [count]
pub fn spop(store: &SetStore, args: &[Bytes]) -> Reply {
    match args.len() {
        1 => match store.spop(&args[0]) {
            Ok(Some(member)) => Reply::bulk(member),
            Ok(None) => Reply::nil(),
            Err(e) => e.into(),
        },
        2 => {
            let count = match parse_positive(&args[1]) {
                Ok(n) => n,
                Err(reply) => return reply,
            };
            match store.spop_count(&args[0], count) {
                Ok(popped) => Reply::bulks(popped),
                Err(e) => e.into(),
            }
        }
        _ => Reply::wrong_arity("spop"),
    }
}

/// SRANDMEMBER key [count]
///
/// A negative count returns exactly |count| members and may repeat them.
pub fn srandmember(store: &SetStore, args: &[Bytes]) -> Reply {
    match args.len() {
        1 => match store.srandmember(&args[0]) {
            Ok(Some(member)) => Reply::bulk(member),
            Ok(None) => Reply::nil(),
            Err(e) => e.into(),
        },
        2 => {
            let count = match parse_i64(&args[1]) {
                Ok(i64::MIN) => return Reply::Error("ERR value is out of range".to_string()),
                Ok(n) => n,
                Err(reply) => return reply,
            };
            match store.srandmember_count(&args[0], count) {
                Ok(picked) => Reply::bulks(picked),
                Err(e) => e.into(),
            }
        }
        _ => Reply::wrong_arity("srandmember"),
    }
}

/// SUNION key [key ...]
pub fn sunion(store: &SetStore, args: &[Bytes]) -> Reply {
    if args.is_empty() {
        return Reply::wrong_arity("sunion");
    }
    store.sunion(args).map_or_else(Reply::from, Reply::bulks)
}

/// SINTER key [key ...]
pub fn sinter(store: &SetStore, args: &[Bytes]) -> Reply {
    if args.is_empty() {
        return Reply::wrong_arity("sinter");
    }
    store.sinter(args).map_or_else(Reply::from, Reply::bulks)
}

/// SDIFF key [key ...]
pub fn sdiff(store: &SetStore, args: &[Bytes]) -> Reply {
    if args.is_empty() {
        return Reply::wrong_arity("sdiff");
    }
    store.sdiff(args).map_or_else(Reply::from, Reply::bulks)
}

/// SUNIONSTORE destination key [key ...]
pub fn sunionstore(store: &SetStore, args: &[Bytes]) -> Reply {
    if args.len() < 2 {
        return Reply::wrong_arity("sunionstore");
    }
    match store.sunionstore(&args[0], &args[1..]) {
        Ok(n) => Reply::Integer(n as i64),
        Err(e) => e.into(),
    }
}

/// SINTERSTORE destination key [key ...]
pub fn sinterstore(store: &SetStore, args: &[Bytes]) -> Reply {
    if args.len() < 2 {
        return Reply::wrong_arity("sinterstore");
    }
    match store.sinterstore(&args[0], &args[1..]) {
        Ok(n) => Reply::Integer(n as i64),
        Err(e) => e.into(),
    }
}

/// SDIFFSTORE destination key [key ...]
pub fn sdiffstore(store: &SetStore, args: &[Bytes]) -> Reply {
    if args.len() < 2 {
        return Reply::wrong_arity("sdiffstore");
    }
    match store.sdiffstore(&args[0], &args[1..]) {
        Ok(n) => Reply::Integer(n as i64),
        Err(e) => e.into(),
    }
}

/// SINTERCARD numkeys key [key ...] [LIMIT limit]
pub fn sintercard(store: &SetStore, args: &[Bytes]) -> Reply {
    if args.len() < 2 {
        return Reply::wrong_arity("sintercard");
    }

    let numkeys = match parse_i64(&args[0]) {
        Ok(n) if n > 0 => n as usize,
        Ok(_) => return Reply::Error("ERR numkeys should be greater than 0".to_string()),
        Err(reply) => return reply,
    };
    let rest = &args[1..];
    if numkeys > rest.len() {
        return Reply::Error(
            "ERR Number of keys can't be greater than number of args".to_string(),
        );
    }
    let (keys, options) = rest.split_at(numkeys);

    let limit = match options {
        [] => 0,
        [opt, value] if opt.eq_ignore_ascii_case(b"LIMIT") => match parse_i64(value) {
            Ok(n) if n >= 0 => n as usize,
            Ok(_) => return Reply::Error("ERR LIMIT can't be negative".to_string()),
            Err(reply) => return reply,
        },
        _ => return Reply::Error("ERR syntax error".to_string()),
    };

    match store.sintercard(keys, limit) {
        Ok(n) => Reply::Integer(n as i64),
        Err(e) => e.into(),
    }
}
